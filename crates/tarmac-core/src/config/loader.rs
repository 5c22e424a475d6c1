//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }

    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `tarmac.toml`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/tarmac.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load the explicit file when given, otherwise search from `dir`, falling
/// back to defaults when nothing is found.
///
/// An explicit path that does not exist or fails to parse is an error; a
/// discovered file that fails to parse is an error too.
pub fn resolve_config(explicit: Option<&Path>, dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }

    load_discovered(find_config(dir))
}

fn load_discovered(found: Option<PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    match found {
        Some(path) => Ok((load_config(&path)?, Some(path))),
        None => {
            debug!("no config found, using defaults");
            Ok((Config::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TarmacError;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("tarmac.toml");
        std::fs::write(&config_path, "[output]\ndir = \"build\"").unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("tarmac.toml");
        let yaml_path = temp.path().join("tarmac.yaml");
        std::fs::write(&toml_path, "[output]\ndir = \"build\"").unwrap();
        std::fs::write(&yaml_path, "output:\n  dir: build").unwrap();

        let found = find_config(temp.path()).unwrap();
        assert_eq!(found, toml_path);
    }

    #[test]
    fn test_find_config_in_github_dir_of_parent() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        let nested = temp.path().join("ios").join("App");
        std::fs::create_dir_all(&github_dir).unwrap();
        std::fs::create_dir_all(&nested).unwrap();
        let config_path = github_dir.join("tarmac.yaml");
        std::fs::write(&config_path, "output:\n  dir: build").unwrap();

        let found = find_config(&nested);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("tarmac.toml");
        std::fs::write(
            &config_path,
            "[project]\nworkspace = \"Together.xcworkspace\"\n\n[timeouts]\narchive = 900\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.project.workspace, "Together.xcworkspace");
        assert_eq!(config.timeouts.archive, 900);
        assert_eq!(config.timeouts.export, 1200);
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("tarmac.yaml");
        std::fs::write(
            &config_path,
            "github:\n  repository: acme/ios-app\nrelease_notes:\n  max_lines: 200\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.github.repository.as_deref(), Some("acme/ios-app"));
        assert_eq!(config.release_notes.max_lines, 200);
    }

    #[test]
    fn test_resolve_config_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");

        let err = resolve_config(Some(&missing), temp.path()).unwrap_err();
        assert!(matches!(err, TarmacError::Config(ConfigError::NotFound(_))));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_resolve_config_without_file_uses_defaults() {
        let (config, path) = load_discovered(None).unwrap();
        assert!(path.is_none());
        assert_eq!(config.output.dir, PathBuf::from("output"));
        assert_eq!(config.timeouts.history, 30);
    }

    #[test]
    fn test_resolve_config_discovers_nearest_file() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("ios").join("App");
        std::fs::create_dir_all(&nested).unwrap();
        let config_path = temp.path().join("tarmac.toml");
        std::fs::write(&config_path, "[output]\ndir = \"build\"\n").unwrap();

        let (config, path) = resolve_config(None, &nested).unwrap();
        assert_eq!(path, Some(config_path));
        assert_eq!(config.output.dir, PathBuf::from("build"));
    }
}
