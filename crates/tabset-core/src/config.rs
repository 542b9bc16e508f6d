//! Project configuration
//!
//! # Configuration Files
//!
//! - `tabset.yaml` - Project root configuration
//! - `datasets/*.yaml` - Individual dataset definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::function::DatasetDefinition;

/// Name of the project file
pub const CONFIG_FILE: &str = "tabset.yaml";

/// Port the server API listens on unless told otherwise
pub const DEFAULT_API_PORT: u16 = 2457;

/// Root project configuration from `tabset.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Server the project talks to
    #[serde(default)]
    pub server: ServerConfig,

    /// Free-form project variables
    #[serde(default)]
    pub vars: HashMap<String, serde_yaml::Value>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server address, with or without scheme and port
    #[serde(default = "default_server_url")]
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

fn default_server_url() -> String {
    "localhost".to_string()
}

impl ServerConfig {
    /// Base URL of the API: `http://` is added when missing, and so is the
    /// default port when the address has none
    pub fn endpoint(&self) -> String {
        let url = if self.url.starts_with("http://") {
            self.url.clone()
        } else {
            format!("http://{}", self.url)
        };
        let authority = url
            .trim_start_matches("http://")
            .split('/')
            .next()
            .unwrap_or_default();
        if authority.contains(':') {
            url
        } else {
            format!("{}:{}", url, DEFAULT_API_PORT)
        }
    }
}

/// Main configuration container
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Base path of the project
    pub base_path: PathBuf,
}

impl Config {
    /// Load configuration from a directory
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the project directory or tabset.yaml file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = Config::load("./my-project")?;
    /// println!("Project: {}", config.project.name);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let (config_path, base_path) = if path.is_dir() {
            (path.join(CONFIG_FILE), path.to_path_buf())
        } else {
            (
                path.to_path_buf(),
                path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            )
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let project: ProjectConfig = serde_yaml::from_str(&contents)?;

        Ok(Self { project, base_path })
    }

    /// Load and validate all dataset definitions from `datasets/*.yaml`
    pub fn load_datasets(&self) -> Result<Vec<DatasetDefinition>> {
        let datasets_dir = self.base_path.join("datasets");
        if !datasets_dir.exists() {
            return Ok(vec![]);
        }

        let mut entries: Vec<_> = std::fs::read_dir(&datasets_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        entries.sort_by_key(|e| e.path());

        let mut datasets = Vec::new();
        for entry in entries {
            tracing::debug!(path = %entry.path().display(), "Loading dataset definition");
            datasets.push(DatasetDefinition::load(entry.path())?);
        }
        Ok(datasets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
name: test-project
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "test-project");
        assert_eq!(config.version, "0.1.0");
        assert_eq!(config.server.url, "localhost");
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
name: test-project
version: "1.0.0"
server:
  url: tabset.internal:9000
vars:
  environment: production
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.server.endpoint(), "http://tabset.internal:9000");
        assert_eq!(
            config.vars.get("environment"),
            Some(&serde_yaml::Value::from("production"))
        );
    }

    #[rstest]
    #[case("localhost", "http://localhost:2457")]
    #[case("http://localhost", "http://localhost:2457")]
    #[case("10.0.0.5:8080", "http://10.0.0.5:8080")]
    #[case("http://server:2457/api", "http://server:2457/api")]
    fn test_endpoint(#[case] url: &str, #[case] expected: &str) {
        let server = ServerConfig {
            url: url.to_string(),
        };
        assert_eq!(server.endpoint(), expected);
    }

    #[test]
    fn test_load_datasets_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("datasets")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "name: test\n").unwrap();
        std::fs::write(
            dir.path().join("datasets/b.yml"),
            "name: second\noutput:\n  table-output:\n    table: t\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("datasets/a.yaml"), "name: first\n").unwrap();
        std::fs::write(dir.path().join("datasets/notes.txt"), "ignored").unwrap();

        let config = Config::load(dir.path()).unwrap();
        let datasets = config.load_datasets().unwrap();
        let names: Vec<_> = datasets.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }
}
