//! Configuration file loading with environment substitution
//!
//! Supports `${VAR}` (required) and `${VAR:default}` (optional) placeholders
//! anywhere in the TOML text. The server password additionally falls back to
//! the `GRAPHSWAP_PASSWORD` environment variable so it never has to live in
//! the file at all.

use crate::config::{Config, ConfigError};
use std::path::Path;

const PASSWORD_ENV_VAR: &str = "GRAPHSWAP_PASSWORD";

/// Load, substitute, parse, and env-complete a configuration file
pub async fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let substituted = substitute_env_vars(&raw)?;

    let mut config: Config =
        toml::from_str(&substituted).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    // Password may be omitted from the file entirely
    if config.server.password.is_empty() {
        match std::env::var(PASSWORD_ENV_VAR) {
            Ok(password) if !password.is_empty() => config.server.password = password,
            _ => {
                return Err(ConfigError::MissingEnvVar {
                    name: PASSWORD_ENV_VAR.to_string(),
                })
            }
        }
    }

    Ok(config)
}

/// Substitute `${VAR}` and `${VAR:default}` placeholders in raw file content
pub fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder passes through untouched
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };

        let expr = &after[..end];
        let (name, default) = match expr.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (expr, None),
        };

        match std::env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => match default {
                Some(default) => out.push_str(default),
                None => {
                    return Err(ConfigError::MissingEnvVar {
                        name: name.to_string(),
                    })
                }
            },
        }

        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_substitute_with_value_set() {
        std::env::set_var("GRAPHSWAP_TEST_HOST", "db.internal");
        let result = substitute_env_vars("host = \"${GRAPHSWAP_TEST_HOST}\"").unwrap();
        assert_eq!(result, "host = \"db.internal\"");
        std::env::remove_var("GRAPHSWAP_TEST_HOST");
    }

    #[test]
    #[serial]
    fn test_substitute_with_default() {
        std::env::remove_var("GRAPHSWAP_TEST_PORT");
        let result = substitute_env_vars("port = ${GRAPHSWAP_TEST_PORT:7474}").unwrap();
        assert_eq!(result, "port = 7474");
    }

    #[test]
    #[serial]
    fn test_substitute_missing_required_fails() {
        std::env::remove_var("GRAPHSWAP_TEST_MISSING");
        let err = substitute_env_vars("user = \"${GRAPHSWAP_TEST_MISSING}\"").unwrap_err();
        assert!(err.to_string().contains("GRAPHSWAP_TEST_MISSING"));
    }

    #[test]
    fn test_substitute_leaves_plain_content_alone() {
        let content = "host = \"localhost\"\nworkers = 2\n";
        assert_eq!(substitute_env_vars(content).unwrap(), content);
    }

    #[test]
    fn test_unterminated_placeholder_passes_through() {
        let content = "note = \"${UNTERMINATED\"";
        assert_eq!(substitute_env_vars(content).unwrap(), content);
    }

    #[tokio::test]
    #[serial]
    async fn test_load_config_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "localhost"
user = "neo4j"
password = "plaintext-for-test"

[snapshots]
root = "/data/snapshots"

[supervisor]
workers = 2
scan_interval = 10
"#
        )
        .unwrap();

        let config = load_config(file.path()).await.unwrap();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.supervisor.workers, 2);
        assert_eq!(config.supervisor.scan_interval, 10);
        // Unspecified options take their defaults
        assert_eq!(config.supervisor.max_retries, 3);
        assert_eq!(config.supervisor.retention_keep, 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_load_config_password_from_environment() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "localhost"
user = "neo4j"

[snapshots]
root = "/data/snapshots"
"#
        )
        .unwrap();

        std::env::set_var("GRAPHSWAP_PASSWORD", "from-env");
        let config = load_config(file.path()).await.unwrap();
        std::env::remove_var("GRAPHSWAP_PASSWORD");

        assert_eq!(config.server.password, "from-env");
    }

    #[tokio::test]
    #[serial]
    async fn test_load_config_missing_password_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
host = "localhost"
user = "neo4j"

[snapshots]
root = "/data/snapshots"
"#
        )
        .unwrap();

        std::env::remove_var("GRAPHSWAP_PASSWORD");
        let err = load_config(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("GRAPHSWAP_PASSWORD"));
    }

    #[tokio::test]
    async fn test_load_config_missing_file_fails() {
        let err = load_config(Path::new("/nonexistent/graphswap.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
