//! Shared types: session configuration and session state snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FtpError, FtpResult};

// ─── Configuration ───────────────────────────────────────────────────

/// Data-connection negotiation strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransferMode {
    /// Server opens a port, client connects (PASV).
    Passive,
    /// Client opens a port, server connects (PORT).
    Active,
}

impl Default for TransferMode {
    fn default() -> Self {
        Self::Passive
    }
}

/// TLS applied to the session's channels.
///
/// `Try` attempts AUTH TLS and falls back to plaintext when the server
/// rejects the command. With the embedded engine, `Control` and `All`
/// both protect the data channel as well (PROT P) once the control
/// channel is secured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TlsPolicy {
    None,
    Try,
    Control,
    All,
}

impl Default for TlsPolicy {
    fn default() -> Self {
        Self::None
    }
}

/// Direction of a file transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransferDirection {
    Upload,
    Download,
}

/// Configuration for a single client session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    /// Empty username means anonymous login.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mode: TransferMode,
    #[serde(default)]
    pub tls: TlsPolicy,
    /// Validate the peer certificate and hostname.
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    /// Control-socket read/write deadline in seconds (0 = no deadline).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Connect deadline in seconds (0 = no deadline).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Elevate per-operation diagnostics to debug level.
    #[serde(default)]
    pub verbose: bool,
}

fn default_true() -> bool {
    true
}
fn default_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    15
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 21,
            username: String::new(),
            password: String::new(),
            mode: TransferMode::Passive,
            tls: TlsPolicy::None,
            verify_tls: true,
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            verbose: false,
        }
    }
}

impl SessionConfig {
    /// Check that the connection target is fully specified.
    pub(crate) fn validate(&self) -> FtpResult<()> {
        if self.host.trim().is_empty() {
            return Err(FtpError::invalid_param("host is not configured"));
        }
        if self.port == 0 {
            return Err(FtpError::invalid_param("port must be non-zero"));
        }
        Ok(())
    }

    /// Credentials to present at login; empty username maps to anonymous.
    pub(crate) fn login_credentials(&self) -> (&str, &str) {
        if self.username.is_empty() {
            ("anonymous", "anonymous@")
        } else {
            (&self.username, &self.password)
        }
    }
}

// ─── Session info ────────────────────────────────────────────────────

/// Snapshot of a session's connection state and transfer statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Server welcome banner captured at connect.
    pub banner: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub bytes_uploaded: u64,
    pub bytes_downloaded: u64,
}
