// ABOUTME: Integration tests for the render pipeline
// ABOUTME: Covers local and remote template sources, helpers, trimming and error kinds

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

mod common;
use common::{build_payload, TestEnvironment};

use templar::template::{
    HelperRegistry, Renderer, RendererOptions, SourceLoader, TemplateError, TemplateSource,
};

const BUILD_TEMPLATE: &str = "\
{{#success build.status}}build {{build.number}} succeeded{{else}}build {{build.number}} did not succeed{{/success}}
{{#failure build.status}}FAILED{{else}}ok{{/failure}}
branch: {{trimPrefix build.branch \"refs/heads/\"}}
commit: {{truncate build.commit 8}}
author: {{uppercasefirst build.author}}
tags: {{join build.tags \",\"}}
repo: {{#urlencode}}{{repo.owner}}/{{repo.name}}{{/urlencode}}
took: {{duration build.started build.finished}}";

#[tokio::test]
async fn test_render_local_template_with_helpers() {
    let env = TestEnvironment::new();
    let template = env.create_template("build", BUILD_TEMPLATE).await;

    let out = templar::render(template.to_str().unwrap(), &build_payload("success"))
        .await
        .unwrap();

    assert_eq!(
        out,
        "build 42 succeeded\n\
         ok\n\
         branch: main\n\
         commit: 7fd1a60b\n\
         author: Octocat\n\
         tags: ci,nightly\n\
         repo: octocat%2Fhello-world\n\
         took: 2m5s\n"
    );
}

#[tokio::test]
async fn test_render_failed_build() {
    let env = TestEnvironment::new();
    let template = env.create_template("build", BUILD_TEMPLATE).await;

    let out = templar::render(template.to_str().unwrap(), &build_payload("killed"))
        .await
        .unwrap();

    assert!(out.starts_with("build 42 did not succeed\nFAILED\n"));
}

#[tokio::test]
async fn test_render_trim_strips_spaces_and_newlines() {
    let env = TestEnvironment::new();
    let template = env.create_template("padded", "  \n{{greeting}}\n  ").await;

    let out = templar::render_trim(template.to_str().unwrap(), &json!({"greeting": "Hello"}))
        .await
        .unwrap();
    assert_eq!(out, "Hello");

    let empty = env.create_template("empty", "").await;
    let out = templar::render_trim(empty.to_str().unwrap(), &json!({}))
        .await
        .unwrap();
    assert_eq!(out, "");
}

#[tokio::test]
async fn test_literal_template_round_trips() {
    let env = TestEnvironment::new();
    let text = "  no helpers here\nnor payload\n\n";
    let template = env.create_template("literal", text).await;

    let out = templar::render(template.to_str().unwrap(), &json!({"ignored": true}))
        .await
        .unwrap();
    assert_eq!(out, text);
}

#[tokio::test]
async fn test_file_url_reads_decoded_path() {
    let env = TestEnvironment::new();
    let path = env.path().join("my template.hbs");
    tokio::fs::write(&path, "hi {{name}}").await.unwrap();

    let reference = format!("file://{}", path.display()).replace(' ', "%20");
    let out = templar::render(&reference, &json!({"name": "there"}))
        .await
        .unwrap();
    assert_eq!(out, "hi there");
}

#[tokio::test]
async fn test_scheme_less_reference_is_percent_decoded() {
    let env = TestEnvironment::new();
    let path = env.path().join("my file.hbs");
    tokio::fs::write(&path, "hi {{name}}").await.unwrap();

    let reference = format!("{}/my%20file.hbs", env.path().display());
    let out = templar::render(&reference, &json!({"name": "there"}))
        .await
        .unwrap();
    assert_eq!(out, "hi there");

    let with_query = format!("{}?v=2", reference);
    let out = templar::render(&with_query, &json!({"name": "again"}))
        .await
        .unwrap();
    assert_eq!(out, "hi again");
}

#[tokio::test]
async fn test_output_is_html_escaped_by_default() {
    let env = TestEnvironment::new();
    let template = env
        .create_template("escaped", "{{name}}|{{quote name}}|{{{name}}}")
        .await;

    let out = templar::render(template.to_str().unwrap(), &json!({"name": "<O'B>"}))
        .await
        .unwrap();
    assert_eq!(out, "&lt;O&#x27;B&gt;|&quot;&lt;O&#x27;B&gt;&quot;|<O'B>");
}

#[tokio::test]
async fn test_urlencode_block_uses_query_escaping() {
    let env = TestEnvironment::new();
    let template = env
        .create_template("query", "{{#urlencode}}{{{q}}}{{/urlencode}}")
        .await;

    let out = templar::render(template.to_str().unwrap(), &json!({"q": "a~b*c d"}))
        .await
        .unwrap();
    assert_eq!(out, "a~b%2Ac+d");
}

#[tokio::test]
async fn test_render_remote_template() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/templates/status.hbs")
        .with_status(200)
        .with_body("{{uppercase build.status}}")
        .create_async()
        .await;

    let url = format!("{}/templates/status.hbs", server.url());
    let out = templar::render(&url, &build_payload("success")).await.unwrap();

    assert_eq!(out, "SUCCESS");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_error_status_body_is_the_template() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/missing.hbs")
        .with_status(404)
        .with_body("not found")
        .create_async()
        .await;

    let url = format!("{}/missing.hbs", server.url());
    let out = templar::render(&url, &json!({})).await.unwrap();

    assert_eq!(out, "not found");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_remote_is_source_error() {
    let err = templar::render("http://127.0.0.1:1/nothing.hbs", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::Fetch { .. }));
    assert!(err.is_source_error());
}

#[tokio::test]
async fn test_missing_file_is_source_error() {
    let env = TestEnvironment::new();
    let missing = env.template_file("does-not-exist");

    let err = templar::render(missing.to_str().unwrap(), &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::FileRead { .. }));

    let err = templar::render_trim(missing.to_str().unwrap(), &json!({}))
        .await
        .unwrap_err();
    assert!(err.is_source_error());
}

#[tokio::test]
async fn test_invalid_syntax_is_compile_error() {
    let env = TestEnvironment::new();
    let template = env
        .create_template("broken", "{{#success build.status}}never closed")
        .await;

    let err = templar::render(template.to_str().unwrap(), &build_payload("success"))
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::Compile(_)));
}

#[tokio::test]
async fn test_helper_failures_are_render_errors() {
    let env = TestEnvironment::new();

    let unknown = env.create_template("unknown", "{{shout build.status}}").await;
    let err = templar::render(unknown.to_str().unwrap(), &build_payload("success"))
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::Render(_)));

    let empty = env
        .create_template("empty_first", "{{uppercasefirst build.author}}")
        .await;
    let err = templar::render(empty.to_str().unwrap(), &json!({"build": {"author": ""}}))
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::Render(_)));
}

#[tokio::test]
async fn test_datetime_invalid_zone_matches_local() {
    let env = TestEnvironment::new();
    let local = env
        .create_template("local", "{{datetime ts \"2006-01-02 15:04\" \"\"}}")
        .await;
    let bogus = env
        .create_template("bogus", "{{datetime ts \"2006-01-02 15:04\" \"Mars/Olympus\"}}")
        .await;
    let utc = env
        .create_template("utc", "{{datetime ts \"2006-01-02 15:04\" \"UTC\"}}")
        .await;

    let payload = json!({"ts": 0});
    let local_out = templar::render(local.to_str().unwrap(), &payload).await.unwrap();
    let bogus_out = templar::render(bogus.to_str().unwrap(), &payload).await.unwrap();
    let utc_out = templar::render(utc.to_str().unwrap(), &payload).await.unwrap();

    assert_eq!(local_out, bogus_out);
    assert_eq!(utc_out, "1970-01-01 00:00");
}

#[tokio::test]
async fn test_concurrent_renders_share_renderer() {
    let env = TestEnvironment::new();
    let template = env
        .create_template("shared", "{{#success build.status}}yes{{else}}no{{/success}}")
        .await;
    let reference = template.to_string_lossy().to_string();

    let renderer = Arc::new(Renderer::new().unwrap());
    let mut handles = Vec::new();
    for i in 0..8 {
        let renderer = Arc::clone(&renderer);
        let reference = reference.clone();
        handles.push(tokio::spawn(async move {
            let status = if i % 2 == 0 { "success" } else { "failure" };
            let out = renderer
                .render(&reference, &build_payload(status))
                .await
                .unwrap();
            (i, out)
        }));
    }

    for handle in handles {
        let (i, out) = handle.await.unwrap();
        assert_eq!(out, if i % 2 == 0 { "yes" } else { "no" });
    }
}

struct InMemoryLoader {
    templates: HashMap<String, String>,
}

#[async_trait]
impl SourceLoader for InMemoryLoader {
    async fn load(&self, source: &TemplateSource) -> templar::template::Result<String> {
        let key = source.to_string();
        self.templates.get(&key).cloned().ok_or_else(|| {
            TemplateError::FileRead {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory"),
            }
        })
    }
}

#[tokio::test]
async fn test_custom_loader_with_escaping_disabled() {
    let loader = InMemoryLoader {
        templates: HashMap::from([(
            "greeting.hbs".to_string(),
            "{{msg}} {{{msg}}}".to_string(),
        )]),
    };

    let renderer = Renderer::with_loader(
        RendererOptions {
            escape_html: false,
            ..Default::default()
        },
        HelperRegistry::builtin().unwrap(),
        Arc::new(loader),
    )
    .unwrap();

    let out = renderer
        .render("greeting.hbs", &json!({"msg": "a<b"}))
        .await
        .unwrap();
    assert_eq!(out, "a<b a<b");

    assert!(renderer.render("other.hbs", &json!({})).await.is_err());
}

#[tokio::test]
async fn test_check_validates_without_rendering() {
    let env = TestEnvironment::new();
    let good = env.create_template("good", "{{uppercasefirst name}}").await;
    let bad = env.create_template("bad", "{{#failure x}}").await;

    let renderer = Renderer::new().unwrap();
    // an empty name would fail at render time, but check only compiles
    assert!(renderer.check(good.to_str().unwrap()).await.is_ok());
    assert!(matches!(
        renderer.check(bad.to_str().unwrap()).await,
        Err(TemplateError::Compile(_))
    ));
}
