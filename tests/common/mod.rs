// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides temporary template files and a canned build payload

#![allow(dead_code)]

use serde_json::{json, Value as JsonValue};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn template_file(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}.hbs", name))
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.path().join(format!("{}_output.txt", name))
    }

    pub async fn create_template(&self, name: &str, content: &str) -> PathBuf {
        let template_file = self.template_file(name);
        fs::write(&template_file, content)
            .await
            .expect("Failed to write template file");
        template_file
    }

    pub async fn create_data_file(&self, file_name: &str, content: &str) -> PathBuf {
        let data_file = self.path().join(file_name);
        fs::write(&data_file, content)
            .await
            .expect("Failed to write data file");
        data_file
    }
}

/// A CI build notification payload
pub fn build_payload(status: &str) -> JsonValue {
    json!({
        "repo": {
            "owner": "octocat",
            "name": "hello-world",
        },
        "build": {
            "number": 42,
            "status": status,
            "branch": "refs/heads/main",
            "commit": "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d",
            "message": "fix the thing\n\nlong description",
            "author": "octocat",
            "started": 1_700_000_000,
            "finished": 1_700_000_125.6,
            "tags": ["ci", "nightly"],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_setup() {
        let env = TestEnvironment::new();
        assert!(env.path().exists());

        let template_file = env.template_file("test");
        assert!(template_file.to_string_lossy().ends_with("test.hbs"));
    }

    #[test]
    fn test_build_payload() {
        let payload = build_payload("success");
        assert_eq!(payload["build"]["status"], "success");
        assert_eq!(payload["build"]["number"], 42);
    }
}
