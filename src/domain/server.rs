//! Server connection descriptor (spec.md §3). Immutable for the life of a
//! watch; the watch coordinator (C4) is handed one at construction.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Server {
    pub base_url: String,
    pub token: String,
    pub insecure: bool,
    pub grpc_web_root_path: Option<String>,
    pub http_timeout: Option<Duration>,
}

impl Server {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            insecure: false,
            grpc_web_root_path: None,
            http_timeout: None,
        }
    }
}
