//! Configuration loading

use std::path::Path;

use crate::{Config, Error, Result};

/// Load and validate configuration
///
/// Config file search order:
/// 1. `explicit` path (from the command line); it must exist
/// 2. `BIRDSONG_CONFIG_PATH` environment variable
/// 3. ./config.yaml (current working directory)
/// 4. Environment variables only
///
/// Runs before logging is initialized, so progress goes to stderr.
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    if let Some(path) = explicit {
        if !Path::new(path).exists() {
            return Err(Error::Configuration(format!(
                "config file {path} does not exist"
            )));
        }
    }

    let config_path = explicit
        .map(ToString::to_string)
        .or_else(|| {
            std::env::var("BIRDSONG_CONFIG_PATH")
                .ok()
                .filter(|p| Path::new(p).exists())
        })
        .or_else(|| {
            let cwd = "config.yaml";
            Path::new(cwd).exists().then(|| cwd.to_string())
        });

    let config = if let Some(path) = config_path {
        eprintln!("Loading config from {path}");
        Config::from_file(&path)?
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env()?
    };

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(Error::Configuration(format!(
            "validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        )));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path_is_fatal() {
        let err = load_config(Some("/nonexistent/birdsong.yaml")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_incomplete_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "twitter:\n  consumer_key: ck\n").unwrap();

        let err = load_config(path.to_str()).unwrap_err();
        match err {
            Error::Configuration(msg) => {
                assert!(msg.contains("consumer_secret"));
                assert!(msg.contains("twitter.follow"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_complete_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "twitter:\n  consumer_key: ck\n  consumer_secret: cs\n  access_token_key: ak\n  access_token_secret: as\n  follow: [\"42\"]\n",
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.twitter.follow, vec!["42"]);
    }
}
