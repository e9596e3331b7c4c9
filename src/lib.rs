//! # ftpclient — Embeddable FTP/FTPS client
//!
//! Session lifecycle, authenticated streaming transfers with
//! cancellable progress reporting, directory management, and a uniform
//! error-reporting contract. The wire protocol (command sequencing,
//! PASV/PORT negotiation, TLS handshakes, socket I/O) is delegated to
//! the `suppaftp` engine; this crate is the session layer embedding
//! applications program against.
//!
//! Architecture:
//! - `types` — session configuration, enums, state snapshots
//! - `error` — categorised error type + embedder result codes
//! - `engine` — transfer-engine binding (connect, TLS policy, login)
//! - `progress` — cancellable progress-event contract
//! - `session` — stateful client session and error-state plumbing
//! - `transfer` — chunked streaming upload/download
//! - `ops` — listing, directory/file management, raw commands
//!
//! Sessions are synchronous and blocking: one operation at a time per
//! session (`&mut self`), with cross-session independence.
//!
//! ## Usage
//!
//! ```no_run
//! use ftpclient::{FtpSession, TransferMode};
//!
//! ftpclient::global_init().unwrap();
//!
//! let mut session = FtpSession::new();
//! session.set_host("ftp.example.com", 21).unwrap();
//! session.set_credentials("demo", "password").unwrap();
//! session.set_mode(TransferMode::Passive).unwrap();
//! session.connect().unwrap();
//!
//! session.upload("/tmp/a.bin", "/remote/a.bin").unwrap();
//! let listing = session.list_dir("/remote").unwrap();
//! println!("{listing}");
//!
//! session.destroy();
//! ftpclient::global_cleanup();
//! ```

pub mod error;
pub mod progress;
pub mod session;
pub mod types;

mod engine;
mod ops;
mod transfer;

pub use error::{FtpError, FtpErrorKind, FtpResult, ResultCode};
pub use progress::ProgressHandler;
pub use session::FtpSession;
pub use types::{SessionConfig, SessionInfo, TlsPolicy, TransferDirection, TransferMode};

use lazy_static::lazy_static;
use std::sync::Mutex as StdMutex;

// ─── Global library state ────────────────────────────────────────────

#[derive(Debug, Default)]
struct GlobalState {
    initialized: bool,
}

lazy_static! {
    /// Process-wide engine lifecycle flag, toggled by `global_init` /
    /// `global_cleanup`.
    static ref GLOBAL_STATE: StdMutex<GlobalState> = StdMutex::new(GlobalState::default());
}

/// Bring up process-wide engine state. Must be called before any
/// session performs network I/O and balanced by [`global_cleanup`] at
/// shutdown; the ordering is the caller's responsibility and is not
/// re-validated per operation. Calling it again is harmless.
pub fn global_init() -> FtpResult<()> {
    let mut state = GLOBAL_STATE
        .lock()
        .map_err(|_| FtpError::init("global state is poisoned"))?;
    if !state.initialized {
        state.initialized = true;
        log::debug!("ftp client library initialized");
    }
    Ok(())
}

/// Tear down process-wide engine state. Call once at shutdown, after
/// all sessions have been destroyed.
pub fn global_cleanup() {
    if let Ok(mut state) = GLOBAL_STATE.lock() {
        if state.initialized {
            state.initialized = false;
            log::debug!("ftp client library cleaned up");
        }
    }
}

/// Whether [`global_init`] has been called without a matching
/// [`global_cleanup`].
pub fn global_is_initialized() -> bool {
    GLOBAL_STATE.lock().map(|s| s.initialized).unwrap_or(false)
}
