//! Live-reload subsystem
//!
//! Tells connected development clients that a fresh bundle is available.
//! The transport is a WebSocket broadcast: every client connected to the
//! reload endpoint gets one message per rebuild.

mod server;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use server::ReloadServer;

/// Options forwarded to the notifier by whoever starts a bundle.
///
/// The orchestrator never inspects these; their meaning belongs to the
/// notifier implementation.
#[derive(Debug, Clone, Default)]
pub struct ReloadOptions {
    /// Public URL prefix clients load the bundle from
    pub public_url: Option<String>,
}

/// Message sent to connected reload clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReloadMessage {
    /// Connection established
    Connected,

    /// A fresh bundle landed on disk
    BundleUpdate {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        public_url: Option<String>,
    },

    /// Ask clients to reload outright
    FullReload {
        reason: String,
    },
}

/// A live-reload notifier
#[async_trait]
pub trait LiveReload: Send + Sync {
    /// Announce a fresh bundle to connected clients.
    async fn notify(&self, bundle: &Path, options: &ReloadOptions) -> Result<()>;

    /// Print the usage tips shown once per rebuild cycle.
    fn print_command_tips(&self);
}

/// Notifier used when no reload endpoint is running.
///
/// One-shot builds never reach the notifier; this keeps the wiring
/// uniform for them.
pub struct Disconnected;

#[async_trait]
impl LiveReload for Disconnected {
    async fn notify(&self, _bundle: &Path, _options: &ReloadOptions) -> Result<()> {
        Ok(())
    }

    fn print_command_tips(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_serialize_with_kebab_case_tags() {
        let msg = ReloadMessage::BundleUpdate {
            path: "/app/dist/bundle.js".to_string(),
            public_url: None,
        };
        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains(r#""type":"bundle-update""#));
        assert!(!json.contains("public_url"));

        let msg = ReloadMessage::FullReload {
            reason: "manual".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"full-reload""#));
    }
}
