//! ArgoCD CLI config schema (spec.md §6, YAML).
//!
//! Mirrors the on-disk shape the `argocd` CLI itself writes; Argonaut only
//! reads it to find the active server/token, never writes it back.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Server as DomainServer;
use crate::errors::{Result, StructuredError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgoCdConfig {
    #[serde(default)]
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(rename = "current-context", default)]
    pub current_context: Option<String>,
    #[serde(rename = "prompts-enabled", default)]
    pub prompts_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub server: String,
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub server: String,
    #[serde(default)]
    pub core: Option<bool>,
    #[serde(rename = "grpc-web", default)]
    pub grpc_web: Option<bool>,
    #[serde(rename = "grpc-web-root-path", default)]
    pub grpc_web_root_path: Option<String>,
    #[serde(default)]
    pub insecure: Option<bool>,
    #[serde(rename = "plain-text", default)]
    pub plain_text: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(rename = "auth-token", default)]
    pub auth_token: Option<String>,
}

/// Server value that switches a context into port-forward mode (spec.md
/// §6: "A server value equal to the literal `port-forward`").
pub const PORT_FORWARD_SENTINEL: &str = "port-forward";

impl ArgoCdConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StructuredError::config(format!("reading {}: {e}", path.display())))?;
        serde_yaml::from_str(&text).map_err(|e| StructuredError::config(format!("parsing {}: {e}", path.display())))
    }

    /// Resolves the effective `Server` domain value for `current-context`,
    /// or the context named in `context_override` if given.
    pub fn resolve_server(&self, context_override: Option<&str>) -> Result<DomainServer> {
        let context_name = context_override
            .map(str::to_string)
            .or_else(|| self.current_context.clone())
            .ok_or_else(|| StructuredError::config("no current-context set and none requested"))?;

        let context = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| StructuredError::config(format!("context '{context_name}' not found")))?;

        let server_entry = self
            .servers
            .iter()
            .find(|s| s.server == context.server)
            .ok_or_else(|| StructuredError::config(format!("server '{}' not found", context.server)))?;

        let token = context
            .user
            .as_ref()
            .and_then(|user_name| self.users.iter().find(|u| &u.name == user_name))
            .and_then(|u| u.auth_token.clone())
            .unwrap_or_default();

        let is_port_forward = context.server == PORT_FORWARD_SENTINEL;
        let base_url = if is_port_forward {
            String::new()
        } else {
            let scheme = if server_entry.plain_text.unwrap_or(false) { "http" } else { "https" };
            format!("{scheme}://{}", context.server)
        };

        let mut server = DomainServer::new(base_url, token);
        server.insecure = server_entry.insecure.unwrap_or(false);
        server.grpc_web_root_path = server_entry.grpc_web_root_path.clone();
        Ok(server)
    }
}
