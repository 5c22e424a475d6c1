//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_project(config)?;
    validate_github(config)?;
    validate_release_notes(config)?;
    validate_timeouts(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate_project(config: &Config) -> Result<()> {
    if !config.project.workspace.ends_with(".xcworkspace") {
        return Err(invalid("project.workspace", "must name an .xcworkspace").into());
    }

    if config.output.dir.as_os_str().is_empty() {
        return Err(invalid("output.dir", "output directory cannot be empty").into());
    }

    if config.signing.keychain.is_empty() {
        return Err(invalid("signing.keychain", "keychain cannot be empty").into());
    }

    Ok(())
}

fn validate_github(config: &Config) -> Result<()> {
    if let Some(repository) = &config.github.repository {
        let mut parts = repository.split('/');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !valid {
            return Err(invalid("github.repository", "must be in owner/name form").into());
        }
    }

    if !config.github.api_url.starts_with("http") {
        return Err(invalid("github.api_url", "must be an http(s) URL").into());
    }

    if !config.crash_reporting.endpoint.starts_with("http") {
        return Err(invalid("crash_reporting.endpoint", "must be an http(s) URL").into());
    }

    Ok(())
}

fn validate_release_notes(config: &Config) -> Result<()> {
    if config.release_notes.max_lines == 0 {
        return Err(invalid("release_notes.max_lines", "must be greater than zero").into());
    }
    Ok(())
}

fn validate_timeouts(config: &Config) -> Result<()> {
    let t = &config.timeouts;
    for (field, value) in [
        ("timeouts.query", t.query),
        ("timeouts.secrets", t.secrets),
        ("timeouts.archive", t.archive),
        ("timeouts.export", t.export),
        ("timeouts.upload", t.upload),
        ("timeouts.publish", t.publish),
        ("timeouts.history", t.history),
    ] {
        if value == 0 {
            return Err(invalid(field, "timeout must be at least one second").into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_repository_slug() {
        let mut config = Config::default();
        config.github.repository = Some("acme".to_string());
        assert!(validate_config(&config).is_err());

        config.github.repository = Some("acme/ios-app".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.timeouts.archive = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("timeouts.archive"));
    }

    #[test]
    fn test_validate_workspace_extension() {
        let mut config = Config::default();
        config.project.workspace = "App.xcodeproj".to_string();
        assert!(validate_config(&config).is_err());
    }
}
