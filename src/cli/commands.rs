// ABOUTME: Command implementations for the templar CLI
// ABOUTME: Handles render, check and helpers commands and payload assembly

use anyhow::Result;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::info;

use super::config::Config;
use crate::template::{HelperKind, Renderer};

/// Everything the render command needs besides configuration
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub template: String,
    pub data: Option<String>,
    pub vars: HashMap<String, String>,
    pub trim: bool,
    pub output: Option<PathBuf>,
    pub timeout: Option<u64>,
}

/// Render a template and write the result to stdout or a file
pub async fn render_template(request: RenderRequest, config: &Config) -> Result<()> {
    info!("Rendering template: {}", request.template);

    let payload = build_payload(request.data.as_deref(), &config.template_vars, &request.vars)
        .await?;
    let renderer = Renderer::with_options(config.renderer_options())?;

    let rendering = async {
        if request.trim {
            renderer.render_trim(&request.template, &payload).await
        } else {
            renderer.render(&request.template, &payload).await
        }
    };

    let rendered = match request.timeout {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), rendering)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Rendering '{}' timed out after {}s",
                    request.template,
                    secs
                )
            })??,
        None => rendering.await?,
    };

    match request.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &rendered).await.map_err(|e| {
                anyhow::anyhow!("Failed to write output file '{}': {}", path.display(), e)
            })?;
            info!("Output written to: {} ({} bytes)", path.display(), rendered.len());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Resolve and compile a template without rendering it
pub async fn check_template(template: String, config: &Config) -> Result<()> {
    info!("Checking template: {}", template);

    let renderer = Renderer::with_options(config.renderer_options())?;
    renderer
        .check(&template)
        .await
        .map_err(|e| anyhow::anyhow!("Template check failed: {}", e))?;

    println!("✓ Template '{}' is valid", template);
    Ok(())
}

/// Print every registered helper with its usage
pub fn list_helpers(config: &Config) -> Result<()> {
    let renderer = Renderer::with_options(config.renderer_options())?;

    for helper in renderer.registry().iter() {
        let signature = helper.signature();
        let kind = match signature.kind {
            HelperKind::Inline => "inline",
            HelperKind::Block => "block",
            HelperKind::Conditional => "conditional",
        };
        println!("{:<16} {:<12} {}", helper.name(), kind, signature.usage);
    }

    Ok(())
}

/// Assemble the payload: the data file (or an empty object), then config
/// defaults for keys the data leaves unset, then command line variables.
pub async fn build_payload(
    data: Option<&str>,
    defaults: &HashMap<String, String>,
    vars: &HashMap<String, String>,
) -> Result<JsonValue> {
    let mut payload = match data {
        Some(source) => load_data(source).await?,
        None => JsonValue::Object(Map::new()),
    };

    if defaults.is_empty() && vars.is_empty() {
        return Ok(payload);
    }

    if !payload.is_object() {
        return Err(anyhow::anyhow!(
            "Cannot set variables on a payload that is not an object"
        ));
    }

    let defaults: BTreeMap<_, _> = defaults.iter().collect();
    for (key, value) in defaults {
        if lookup_path(&payload, key).is_none() {
            set_path(&mut payload, key, value)?;
        }
    }

    let vars: BTreeMap<_, _> = vars.iter().collect();
    for (key, value) in vars {
        set_path(&mut payload, key, value)?;
    }

    Ok(payload)
}

async fn load_data(source: &str) -> Result<JsonValue> {
    if source == "-" {
        let mut contents = String::new();
        tokio::io::stdin().read_to_string(&mut contents).await?;
        return parse_data(&contents, None);
    }

    let path = Path::new(source);
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read data file '{}': {}", source, e))?;
    parse_data(&contents, path.extension().and_then(|e| e.to_str()))
}

/// JSON for `.json` files, YAML (a JSON superset) for everything else
fn parse_data(contents: &str, extension: Option<&str>) -> Result<JsonValue> {
    let value = match extension {
        Some("json") => serde_json::from_str(contents)?,
        _ if contents.trim().is_empty() => JsonValue::Object(Map::new()),
        _ => serde_yaml::from_str(contents)?,
    };
    Ok(value)
}

fn lookup_path<'a>(payload: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    key.split('.')
        .try_fold(payload, |current, segment| current.get(segment))
}

fn set_path(payload: &mut JsonValue, key: &str, value: &str) -> Result<()> {
    let mut current = payload;
    let mut segments = key.split('.').peekable();

    while let Some(segment) = segments.next() {
        let map = current.as_object_mut().ok_or_else(|| {
            anyhow::anyhow!("Cannot set '{}': '{}' is not an object", key, segment)
        })?;

        if segments.peek().is_none() {
            map.insert(segment.to_string(), JsonValue::String(value.to_string()));
            return Ok(());
        }

        current = map
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
    }

    Ok(())
}
