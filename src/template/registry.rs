// ABOUTME: Closed set of named template helpers and their call signatures
// ABOUTME: Validates the registry once and installs it into a Handlebars instance

use handlebars::{
    Context, Handlebars, Helper as HbHelper, HelperDef, HelperResult, JsonRender, Output,
    RenderContext, RenderError, Renderable, StringOutput,
};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fmt;

use super::error::{Result, TemplateError};
use super::helpers::{self, HelperError};

/// How a helper consumes its invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperKind {
    /// `{{name arg...}}`, writes a transformed value
    Inline,
    /// `{{#name}}...{{/name}}`, transforms its own rendered body
    Block,
    /// `{{#name cond [status]}}...{{else}}...{{/name}}`, picks a branch
    Conditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub kind: HelperKind,
    pub min_params: usize,
    pub max_params: usize,
    pub usage: &'static str,
}

impl Signature {
    const fn new(kind: HelperKind, min_params: usize, max_params: usize, usage: &'static str) -> Self {
        Self {
            kind,
            min_params,
            max_params,
            usage,
        }
    }

    fn accepts(&self, count: usize) -> bool {
        (self.min_params..=self.max_params).contains(&count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    Uppercase,
    Lowercase,
    TrimPrefix,
    TrimSuffix,
    Quote,
    Join,
    UppercaseFirst,
    Duration,
    Datetime,
    Success,
    Failure,
    Truncate,
    Urlencode,
    Since,
}

impl Helper {
    pub const ALL: [Helper; 14] = [
        Helper::Uppercase,
        Helper::Lowercase,
        Helper::TrimPrefix,
        Helper::TrimSuffix,
        Helper::Quote,
        Helper::Join,
        Helper::UppercaseFirst,
        Helper::Duration,
        Helper::Datetime,
        Helper::Success,
        Helper::Failure,
        Helper::Truncate,
        Helper::Urlencode,
        Helper::Since,
    ];

    /// Name used in template markup
    pub fn name(self) -> &'static str {
        match self {
            Helper::Uppercase => "uppercase",
            Helper::Lowercase => "lowercase",
            Helper::TrimPrefix => "trimPrefix",
            Helper::TrimSuffix => "trimSuffix",
            Helper::Quote => "quote",
            Helper::Join => "join",
            Helper::UppercaseFirst => "uppercasefirst",
            Helper::Duration => "duration",
            Helper::Datetime => "datetime",
            Helper::Success => "success",
            Helper::Failure => "failure",
            Helper::Truncate => "truncate",
            Helper::Urlencode => "urlencode",
            Helper::Since => "since",
        }
    }

    pub fn signature(self) -> Signature {
        use HelperKind::*;
        match self {
            Helper::Uppercase => Signature::new(Inline, 1, 1, "uppercase STRING"),
            Helper::Lowercase => Signature::new(Inline, 1, 1, "lowercase STRING"),
            Helper::TrimPrefix => Signature::new(Inline, 2, 2, "trimPrefix STRING PREFIX"),
            Helper::TrimSuffix => Signature::new(Inline, 2, 2, "trimSuffix STRING SUFFIX"),
            Helper::Quote => Signature::new(Inline, 1, 1, "quote STRING"),
            Helper::Join => Signature::new(Inline, 2, 2, "join LIST SEPARATOR"),
            Helper::UppercaseFirst => Signature::new(Inline, 1, 1, "uppercasefirst STRING"),
            Helper::Duration => Signature::new(Inline, 2, 2, "duration STARTED FINISHED"),
            Helper::Datetime => Signature::new(Inline, 2, 3, "datetime TIMESTAMP LAYOUT [ZONE]"),
            Helper::Success => {
                Signature::new(Conditional, 1, 2, "#success CONDITION [STATUS] ... else ...")
            }
            Helper::Failure => {
                Signature::new(Conditional, 1, 2, "#failure CONDITION [STATUS] ... else ...")
            }
            Helper::Truncate => Signature::new(Inline, 2, 2, "truncate STRING LENGTH"),
            Helper::Urlencode => Signature::new(Block, 0, 1, "#urlencode ... /urlencode"),
            Helper::Since => Signature::new(Inline, 1, 1, "since STARTED"),
        }
    }

    /// Status strings that open the truthy branch of a conditional helper
    fn accepted_statuses(self) -> &'static [&'static str] {
        match self {
            Helper::Success => &["success"],
            Helper::Failure => &["failure", "error", "killed"],
            _ => &[],
        }
    }

    fn inline_value(self, h: &HbHelper) -> std::result::Result<String, RenderError> {
        let name = self.name();
        let value = match self {
            Helper::Uppercase => helpers::uppercase(&string_param(h, 0, name)?),
            Helper::Lowercase => helpers::lowercase(&string_param(h, 0, name)?),
            Helper::TrimPrefix => {
                let s = string_param(h, 0, name)?;
                helpers::trim_prefix(&s, &string_param(h, 1, name)?).to_string()
            }
            Helper::TrimSuffix => {
                let s = string_param(h, 0, name)?;
                helpers::trim_suffix(&s, &string_param(h, 1, name)?).to_string()
            }
            Helper::Quote => helpers::quote(&string_param(h, 0, name)?),
            Helper::Join => {
                helpers::join(&string_list_param(h, 0, name)?, &string_param(h, 1, name)?)
            }
            Helper::UppercaseFirst => {
                helpers::uppercase_first(&string_param(h, 0, name)?).map_err(helper_error)?
            }
            Helper::Duration => {
                helpers::duration(number_param(h, 0, name)?, number_param(h, 1, name)?)
            }
            Helper::Datetime => {
                let zone = match h.param(2) {
                    Some(_) => string_param(h, 2, name)?,
                    None => String::new(),
                };
                helpers::datetime(number_param(h, 0, name)?, &string_param(h, 1, name)?, &zone)
                    .map_err(helper_error)?
            }
            Helper::Truncate => {
                helpers::truncate(&string_param(h, 0, name)?, integer_param(h, 1, name)?)
                    .map_err(helper_error)?
            }
            Helper::Urlencode => helpers::urlencode(&string_param(h, 0, name)?),
            Helper::Since => helpers::since(integer_param(h, 0, name)?),
            Helper::Success | Helper::Failure => {
                return Err(RenderError::new(format!("{} must be used as a block", name)))
            }
        };
        Ok(value)
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl HelperDef for Helper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &HbHelper<'reg, 'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let signature = self.signature();
        if !signature.accepts(h.params().len()) {
            return Err(RenderError::new(format!(
                "{} expects {} parameter(s), got {} (usage: {})",
                self.name(),
                arity_text(&signature),
                h.params().len(),
                signature.usage
            )));
        }

        match signature.kind {
            HelperKind::Inline => write_escaped(&self.inline_value(h)?, r, rc, out),
            HelperKind::Block => match h.template() {
                Some(body) => {
                    let mut buffer = StringOutput::new();
                    body.render(r, ctx, rc, &mut buffer)?;
                    let rendered = buffer
                        .into_string()
                        .map_err(|e| RenderError::new(format!("{}: {}", self.name(), e)))?;
                    out.write(&helpers::urlencode(&rendered))?;
                    Ok(())
                }
                None => write_escaped(&self.inline_value(h)?, r, rc, out),
            },
            HelperKind::Conditional => {
                let condition = h
                    .param(0)
                    .map(|p| is_truthy(p.value()))
                    .unwrap_or(false);
                let status = h
                    .param(1)
                    .or_else(|| h.param(0))
                    .map(|p| status_text(p.value()))
                    .unwrap_or_default();

                let take_truthy =
                    condition && self.accepted_statuses().contains(&status.as_str());
                let branch = if take_truthy { h.template() } else { h.inverse() };

                match branch {
                    Some(t) => t.render(r, ctx, rc, out),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Inline results go through the registry's escape function unless the
/// call site is a triple-stash.
fn write_escaped(
    value: &str,
    r: &Handlebars<'_>,
    rc: &RenderContext<'_, '_>,
    out: &mut dyn Output,
) -> HelperResult {
    if rc.is_disable_escape() {
        out.write(value)?;
    } else {
        out.write(&r.get_escape_fn()(value))?;
    }
    Ok(())
}

/// Handlebars truthiness: null, false, zero, and empty strings, lists and
/// objects are falsy.
pub(crate) fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}

fn arity_text(signature: &Signature) -> String {
    if signature.min_params == signature.max_params {
        signature.min_params.to_string()
    } else {
        format!("{}-{}", signature.min_params, signature.max_params)
    }
}

fn helper_error(e: HelperError) -> RenderError {
    RenderError::new(e.to_string())
}

fn status_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.render(),
    }
}

fn string_param(h: &HbHelper, idx: usize, helper: &str) -> std::result::Result<String, RenderError> {
    match h.param(idx).map(|p| p.value()) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Null) | None => Ok(String::new()),
        Some(other) => Err(RenderError::new(format!(
            "{} parameter {} must be a string, got {}",
            helper,
            idx + 1,
            other
        ))),
    }
}

fn string_list_param(
    h: &HbHelper,
    idx: usize,
    helper: &str,
) -> std::result::Result<Vec<String>, RenderError> {
    let items = match h.param(idx).map(|p| p.value()) {
        Some(JsonValue::Array(items)) => items,
        Some(JsonValue::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            return Err(RenderError::new(format!(
                "{} parameter {} must be a list, got {}",
                helper,
                idx + 1,
                other
            )))
        }
    };

    items
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                RenderError::new(format!("{} list elements must be strings", helper))
            })
        })
        .collect()
}

fn number_param(h: &HbHelper, idx: usize, helper: &str) -> std::result::Result<f64, RenderError> {
    h.param(idx)
        .and_then(|p| p.value().as_f64())
        .ok_or_else(|| {
            RenderError::new(format!("{} parameter {} must be a number", helper, idx + 1))
        })
}

fn integer_param(h: &HbHelper, idx: usize, helper: &str) -> std::result::Result<i64, RenderError> {
    let value = h.param(idx).map(|p| p.value());
    value
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.trunc() as i64)))
        .ok_or_else(|| {
            RenderError::new(format!("{} parameter {} must be an integer", helper, idx + 1))
        })
}

/// Immutable set of helpers available to every template a renderer compiles.
#[derive(Debug, Clone)]
pub struct HelperRegistry {
    helpers: Vec<Helper>,
}

impl HelperRegistry {
    /// Registry with every built-in helper
    pub fn builtin() -> Result<Self> {
        Self::from_helpers(Helper::ALL.to_vec())
    }

    /// Build a registry from a subset of helpers, rejecting duplicates and
    /// inconsistent signatures
    pub fn from_helpers(helpers: Vec<Helper>) -> Result<Self> {
        let mut seen = HashSet::new();
        for helper in &helpers {
            let name = helper.name();
            if name.is_empty() {
                return Err(TemplateError::Registry("helper with empty name".to_string()));
            }
            if !seen.insert(name) {
                return Err(TemplateError::Registry(format!("duplicate helper: {}", name)));
            }

            let signature = helper.signature();
            if signature.min_params > signature.max_params {
                return Err(TemplateError::Registry(format!(
                    "helper {} accepts between {} and {} parameters",
                    name, signature.min_params, signature.max_params
                )));
            }
            if signature.kind == HelperKind::Conditional && signature.min_params == 0 {
                return Err(TemplateError::Registry(format!(
                    "conditional helper {} needs a condition parameter",
                    name
                )));
            }
        }

        Ok(Self { helpers })
    }

    pub fn get(&self, name: &str) -> Option<Helper> {
        self.helpers.iter().copied().find(|h| h.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = Helper> + '_ {
        self.helpers.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Register every helper with a Handlebars instance
    pub fn install(&self, handlebars: &mut Handlebars<'static>) {
        for helper in &self.helpers {
            handlebars.register_helper(helper.name(), Box::new(*helper));
        }
    }
}
