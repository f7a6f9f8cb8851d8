//! Backend configuration and factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examkit_core::traits::ExamBackend;

use crate::http::HttpBackend;
use crate::memory::InMemoryBackend;

/// Which backend to talk to.
///
/// Note: Custom Debug impl masks the auth token to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Http {
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default)]
        auth_token: Option<String>,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    /// Process-local storage; nothing survives the process.
    Memory,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Http {
                base_url,
                auth_token,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("auth_token", &auth_token.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            BackendConfig::Memory => f.write_str("Memory"),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Http {
            base_url: default_base_url(),
            auth_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Top-level examkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamkitConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Owner whose question bank is listed by default.
    #[serde(default)]
    pub owner: Option<String>,
    /// Where grade records are written.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("./examkit-results")
}

impl Default for ExamkitConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            owner: None,
            results_dir: default_results_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied as-is and never expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_backend_config(config: &BackendConfig) -> BackendConfig {
    match config {
        BackendConfig::Http {
            base_url,
            auth_token,
            timeout_secs,
        } => BackendConfig::Http {
            base_url: resolve_env_vars(base_url),
            auth_token: auth_token
                .as_deref()
                .map(resolve_env_vars)
                .filter(|t| !t.is_empty()),
            timeout_secs: *timeout_secs,
        },
        BackendConfig::Memory => BackendConfig::Memory,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examkit.toml` in the current directory
/// 2. `~/.config/examkit/config.toml`
///
/// Environment variable overrides: `EXAMKIT_BASE_URL`, `EXAMKIT_TOKEN`,
/// `EXAMKIT_OWNER`.
pub fn load_config() -> Result<ExamkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamkitConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examkit.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamkitConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamkitConfig::default(),
    };

    apply_env_overrides(&mut config);
    config.backend = resolve_backend_config(&config.backend);
    config.owner = config.owner.as_deref().map(resolve_env_vars);

    tracing::debug!(backend = ?config.backend, "configuration loaded");
    Ok(config)
}

fn apply_env_overrides(config: &mut ExamkitConfig) {
    if let Ok(url) = std::env::var("EXAMKIT_BASE_URL") {
        let (auth_token, timeout_secs) = match &config.backend {
            BackendConfig::Http {
                auth_token,
                timeout_secs,
                ..
            } => (auth_token.clone(), *timeout_secs),
            BackendConfig::Memory => (None, default_timeout()),
        };
        config.backend = BackendConfig::Http {
            base_url: url,
            auth_token,
            timeout_secs,
        };
    }

    if let Ok(token) = std::env::var("EXAMKIT_TOKEN") {
        if let BackendConfig::Http { auth_token, .. } = &mut config.backend {
            *auth_token = Some(token);
        }
    }

    if let Ok(owner) = std::env::var("EXAMKIT_OWNER") {
        config.owner = Some(owner);
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examkit"))
}

/// Create a backend instance from its configuration.
pub fn create_backend(config: &ExamkitConfig) -> Result<Box<dyn ExamBackend>> {
    match &config.backend {
        BackendConfig::Http {
            base_url,
            auth_token,
            timeout_secs,
        } => Ok(Box::new(HttpBackend::new(
            base_url,
            auth_token.clone(),
            *timeout_secs,
        )?)),
        BackendConfig::Memory => Ok(Box::new(InMemoryBackend::new(
            config.owner.as_deref().unwrap_or("local"),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_EXAMKIT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_EXAMKIT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_EXAMKIT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("no vars"), "no vars");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_EXAMKIT_TEST_VAR");
    }

    #[test]
    fn resolved_values_are_not_expanded_again() {
        std::env::set_var("_EXAMKIT_SELF_REF", "${_EXAMKIT_SELF_REF}");
        std::env::set_var("_EXAMKIT_NESTED", "${_EXAMKIT_TEST_OTHER}");
        std::env::set_var("_EXAMKIT_TEST_OTHER", "leaked");

        assert_eq!(
            resolve_env_vars("${_EXAMKIT_SELF_REF}"),
            "${_EXAMKIT_SELF_REF}"
        );
        assert_eq!(
            resolve_env_vars("a${_EXAMKIT_NESTED}b${_EXAMKIT_TEST_OTHER}"),
            "a${_EXAMKIT_TEST_OTHER}bleaked"
        );

        std::env::remove_var("_EXAMKIT_SELF_REF");
        std::env::remove_var("_EXAMKIT_NESTED");
        std::env::remove_var("_EXAMKIT_TEST_OTHER");
    }

    #[test]
    fn default_config() {
        let config = ExamkitConfig::default();
        assert!(config.owner.is_none());
        assert_eq!(config.results_dir, PathBuf::from("./examkit-results"));
        assert!(matches!(
            config.backend,
            BackendConfig::Http { ref base_url, timeout_secs: 30, .. } if base_url == "http://localhost:8080"
        ));
    }

    #[test]
    fn parse_backend_config() {
        let toml_str = r#"
owner = "prof@example.com"
results_dir = "out"

[backend]
type = "http"
base_url = "https://exams.example.com"
auth_token = "secret"
"#;
        let config: ExamkitConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.owner.as_deref(), Some("prof@example.com"));
        assert!(matches!(
            config.backend,
            BackendConfig::Http { timeout_secs: 30, .. }
        ));

        let memory: ExamkitConfig = toml::from_str("[backend]\ntype = \"memory\"\n").unwrap();
        assert!(matches!(memory.backend, BackendConfig::Memory));
    }

    #[test]
    fn debug_masks_token() {
        let config = BackendConfig::Http {
            base_url: "http://x".into(),
            auth_token: Some("super-secret".into()),
            timeout_secs: 5,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn load_explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/nonexistent/examkit.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examkit.toml");
        std::fs::write(&path, "[backend]\ntype = \"memory\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.name(), "memory");
    }
}
