//! Configuration loading (spec.md §6).
//!
//! Two independent config files are read: the ArgoCD CLI's own YAML config
//! (contexts/servers/users), which supplies the server Argonaut connects
//! to, and Argonaut's own TOML app config (appearance/k9s/diff/etc). Path
//! resolution follows the env var precedence tables verbatim; grounded on
//! the teacher's `secrets.rs` "env var, then file, then fallback" chain,
//! generalized here into a precedence list over candidate paths instead of
//! a precedence list over secret sources.

mod argocd;

pub use argocd::{ArgoCdConfig, Context, Server as ArgoCdServer, User};

use std::path::{Path, PathBuf};

use crate::adapters::{AppConfig, ConfigAdapter};
use crate::errors::{Result, StructuredError};

/// Resolves the ArgoCD CLI config path per spec.md §6: `ARGOCD_CONFIG` >
/// `ARGOCD_CONFIG_DIR`/config.yaml > legacy `$HOME/.argocd/config` (if it
/// exists) > XDG `$XDG_CONFIG_HOME|$HOME/.config/argocd/config`.
pub fn resolve_argocd_config_path(env: &impl EnvSource) -> Option<PathBuf> {
    if let Some(path) = env.var("ARGOCD_CONFIG") {
        return Some(PathBuf::from(path));
    }
    if let Some(dir) = env.var("ARGOCD_CONFIG_DIR") {
        return Some(PathBuf::from(dir).join("config"));
    }
    if let Some(home) = env.var("HOME") {
        let legacy = PathBuf::from(&home).join(".argocd").join("config");
        if env.path_exists(&legacy) {
            return Some(legacy);
        }
    }
    if let Some(xdg) = env.var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("argocd").join("config"));
    }
    env.var("HOME").map(|home| PathBuf::from(home).join(".config").join("argocd").join("config"))
}

/// Resolves the Argonaut app config path per spec.md §6: `ARGONAUT_CONFIG`
/// > `XDG_CONFIG_HOME` > `APPDATA` (Windows) > `HOME`.
pub fn resolve_app_config_path(env: &impl EnvSource) -> Option<PathBuf> {
    if let Some(path) = env.var("ARGONAUT_CONFIG") {
        return Some(PathBuf::from(path));
    }
    if let Some(xdg) = env.var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("argonaut").join("config.toml"));
    }
    if let Some(appdata) = env.var("APPDATA") {
        return Some(PathBuf::from(appdata).join("argonaut").join("config.toml"));
    }
    env.var("HOME").map(|home| PathBuf::from(home).join(".config").join("argonaut").join("config.toml"))
}

/// Abstracts environment lookups so precedence logic is unit-testable
/// without mutating process-global env vars (spec.md §6, SPEC_FULL.md C.3).
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
    fn path_exists(&self, path: &Path) -> bool;
}

pub struct RealEnv;

impl EnvSource for RealEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Secondary trust-pool sources, colon-separated (spec.md §6).
pub fn ssl_cert_files(env: &impl EnvSource) -> Vec<PathBuf> {
    split_colon_list(env.var("SSL_CERT_FILE"))
}

pub fn ssl_cert_dirs(env: &impl EnvSource) -> Vec<PathBuf> {
    split_colon_list(env.var("SSL_CERT_DIR"))
}

fn split_colon_list(value: Option<String>) -> Vec<PathBuf> {
    value
        .map(|v| v.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect())
        .unwrap_or_default()
}

/// Loads/saves `AppConfig` as TOML at the resolved app-config path.
pub struct TomlConfigAdapter {
    path: PathBuf,
}

impl TomlConfigAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn resolved(env: &impl EnvSource) -> Result<Self> {
        let path = resolve_app_config_path(env)
            .ok_or_else(|| StructuredError::config("could not resolve app config path: no HOME or config env var set"))?;
        Ok(Self::new(path))
    }
}

impl ConfigAdapter for TomlConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| StructuredError::config(format!("reading {}: {e}", self.path.display())))?;
        toml::from_str(&text).map_err(|e| StructuredError::config(format!("parsing {}: {e}", self.path.display())))
    }

    fn save(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StructuredError::config(format!("creating {}: {e}", parent.display())))?;
        }
        let text = toml::to_string_pretty(config)
            .map_err(|e| StructuredError::internal(format!("serializing app config: {e}")))?;
        std::fs::write(&self.path, text)
            .map_err(|e| StructuredError::config(format!("writing {}: {e}", self.path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeEnv {
        vars: HashMap<String, String>,
        existing_paths: Vec<PathBuf>,
    }

    impl EnvSource for FakeEnv {
        fn var(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }

        fn path_exists(&self, path: &Path) -> bool {
            self.existing_paths.contains(&path.to_path_buf())
        }
    }

    #[test]
    fn argocd_config_prefers_explicit_override() {
        let env = FakeEnv {
            vars: HashMap::from([
                ("ARGOCD_CONFIG".to_string(), "/tmp/explicit".to_string()),
                ("HOME".to_string(), "/home/u".to_string()),
            ]),
            existing_paths: vec![],
        };
        assert_eq!(resolve_argocd_config_path(&env), Some(PathBuf::from("/tmp/explicit")));
    }

    #[test]
    fn argocd_config_legacy_path_wins_over_xdg_when_present() {
        let legacy = PathBuf::from("/home/u/.argocd/config");
        let env = FakeEnv {
            vars: HashMap::from([
                ("HOME".to_string(), "/home/u".to_string()),
                ("XDG_CONFIG_HOME".to_string(), "/home/u/.config".to_string()),
            ]),
            existing_paths: vec![legacy.clone()],
        };
        assert_eq!(resolve_argocd_config_path(&env), Some(legacy));
    }

    #[test]
    fn argocd_config_falls_back_to_xdg_when_legacy_absent() {
        let env = FakeEnv {
            vars: HashMap::from([
                ("HOME".to_string(), "/home/u".to_string()),
                ("XDG_CONFIG_HOME".to_string(), "/home/u/.config".to_string()),
            ]),
            existing_paths: vec![],
        };
        assert_eq!(
            resolve_argocd_config_path(&env),
            Some(PathBuf::from("/home/u/.config/argocd/config"))
        );
    }

    #[test]
    fn argocd_config_falls_back_to_home_dot_config_without_xdg() {
        let env = FakeEnv {
            vars: HashMap::from([("HOME".to_string(), "/home/u".to_string())]),
            existing_paths: vec![],
        };
        assert_eq!(
            resolve_argocd_config_path(&env),
            Some(PathBuf::from("/home/u/.config/argocd/config"))
        );
    }

    #[test]
    fn app_config_path_prefers_argonaut_config_env() {
        let env = FakeEnv {
            vars: HashMap::from([("ARGONAUT_CONFIG".to_string(), "/tmp/app.toml".to_string())]),
            existing_paths: vec![],
        };
        assert_eq!(resolve_app_config_path(&env), Some(PathBuf::from("/tmp/app.toml")));
    }

    #[test]
    fn ssl_cert_dirs_splits_on_colon() {
        let env = FakeEnv {
            vars: HashMap::from([("SSL_CERT_DIR".to_string(), "/a:/b:/c".to_string())]),
            existing_paths: vec![],
        };
        assert_eq!(ssl_cert_dirs(&env), vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]);
    }

    #[test]
    fn toml_config_adapter_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = TomlConfigAdapter::new(dir.path().join("app.toml"));
        let loaded = adapter.load().unwrap();
        assert_eq!(loaded.appearance.theme, "dark");
    }

    #[test]
    fn toml_config_adapter_round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = TomlConfigAdapter::new(dir.path().join("nested").join("app.toml"));

        let mut config = AppConfig::default();
        config.appearance.theme = "light".to_string();
        config.k9s = Some(crate::adapters::K9sConfig { command: "k9s".to_string(), context: None });
        adapter.save(&config).unwrap();

        let loaded = adapter.load().unwrap();
        assert_eq!(loaded.appearance.theme, "light");
        assert_eq!(loaded.k9s.unwrap().command, "k9s");
    }
}
