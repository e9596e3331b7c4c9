//! Stateful client session: configuration, connection lifecycle, and
//! the error-state contract shared by every operation.
//!
//! Lifecycle: `new()` → setters → `connect()` → operations →
//! `destroy()`. Every operation records its outcome in `last_error`
//! (cleared on success) and returns a [`FtpResult`]. A destroyed
//! session fails every subsequent operation instead of crashing, and a
//! session is only ever driven by one caller at a time (`&mut self`).

use chrono::Utc;
use log::debug;
use suppaftp::NativeTlsFtpStream;
use uuid::Uuid;

use crate::engine;
use crate::error::{FtpError, FtpResult};
use crate::progress::ProgressHandler;
use crate::types::{SessionConfig, SessionInfo, TlsPolicy, TransferMode};

/// An FTP client session.
pub struct FtpSession {
    pub(crate) config: SessionConfig,
    pub(crate) stream: Option<NativeTlsFtpStream>,
    pub(crate) progress: Option<Box<dyn ProgressHandler>>,
    pub(crate) last_error: String,
    pub(crate) closed: bool,
    pub(crate) info: SessionInfo,
}

impl FtpSession {
    /// Create an unconfigured session.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            stream: None,
            progress: None,
            last_error: String::new(),
            closed: false,
            info: SessionInfo {
                id: Uuid::new_v4().to_string(),
                ..SessionInfo::default()
            },
        }
    }

    // ─── Accessors ───────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Connection-state snapshot and transfer statistics.
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn is_connected(&self) -> bool {
        !self.closed && self.stream.is_some()
    }

    /// Diagnostic text recorded by the most recent operation; empty
    /// when it succeeded. Callable at any time, including after
    /// `destroy()`.
    pub fn error(&self) -> &str {
        &self.last_error
    }

    // ─── Configuration setters ───────────────────────────────────

    /// Set the server address. Required before `connect()`.
    pub fn set_host(&mut self, host: &str, port: u16) -> FtpResult<()> {
        self.run(|s| {
            if host.trim().is_empty() {
                return Err(FtpError::invalid_param("host must not be empty"));
            }
            if port == 0 {
                return Err(FtpError::invalid_param("port must be non-zero"));
            }
            s.config.host = host.to_string();
            s.config.port = port;
            Ok(())
        })
    }

    /// Set login credentials. An empty username selects anonymous
    /// login at connect time.
    pub fn set_credentials(&mut self, username: &str, password: &str) -> FtpResult<()> {
        self.run(|s| {
            if username.is_empty() && !password.is_empty() {
                return Err(FtpError::invalid_param(
                    "username is required when a password is supplied",
                ));
            }
            s.config.username = username.to_string();
            s.config.password = password.to_string();
            Ok(())
        })
    }

    /// Select the data-connection negotiation strategy.
    pub fn set_mode(&mut self, mode: TransferMode) -> FtpResult<()> {
        self.run(|s| {
            s.config.mode = mode;
            Ok(())
        })
    }

    /// Select the TLS policy and peer-verification behavior.
    pub fn set_tls(&mut self, policy: TlsPolicy, verify: bool) -> FtpResult<()> {
        self.run(|s| {
            s.config.tls = policy;
            s.config.verify_tls = verify;
            Ok(())
        })
    }

    /// Set the operation and connect deadlines in seconds; 0 disables
    /// the respective deadline.
    pub fn set_timeout(&mut self, timeout_secs: u64, connect_timeout_secs: u64) -> FtpResult<()> {
        self.run(|s| {
            s.config.timeout_secs = timeout_secs;
            s.config.connect_timeout_secs = connect_timeout_secs;
            Ok(())
        })
    }

    /// Toggle per-operation diagnostics.
    pub fn set_verbose(&mut self, verbose: bool) -> FtpResult<()> {
        self.run(|s| {
            s.config.verbose = verbose;
            Ok(())
        })
    }

    /// Attach a progress handler, replacing (and releasing) any
    /// previous one. At most one handler is attached at a time.
    pub fn set_progress_handler<H>(&mut self, handler: H) -> FtpResult<()>
    where
        H: ProgressHandler + 'static,
    {
        self.run(|s| {
            s.progress = Some(Box::new(handler));
            Ok(())
        })
    }

    /// Detach the progress handler, if any.
    pub fn clear_progress_handler(&mut self) -> FtpResult<()> {
        self.run(|s| {
            s.progress = None;
            Ok(())
        })
    }

    // ─── Connect / destroy ───────────────────────────────────────

    /// Establish the control connection and authenticate. Calling this
    /// on an already-connected session releases the previous
    /// connection first and connects afresh; a failure leaves the
    /// session disconnected but reusable.
    pub fn connect(&mut self) -> FtpResult<()> {
        self.run(|s| {
            if let Some(mut old) = s.stream.take() {
                engine::teardown(&mut old);
            }

            let stream = engine::establish(&s.config)?;

            s.info.host = s.config.host.clone();
            s.info.port = s.config.port;
            s.info.username = s.config.username.clone();
            s.info.banner = stream.get_welcome_msg().map(str::to_string);
            s.info.connected_at = Some(Utc::now());
            s.info.last_activity = Some(Utc::now());
            s.stream = Some(stream);
            Ok(())
        })
    }

    /// Release the connection and the progress handler and mark the
    /// session unusable. Every subsequent operation fails with the
    /// closed-session error. Also runs on drop.
    pub fn destroy(&mut self) {
        if self.closed {
            return;
        }
        if let Some(mut stream) = self.stream.take() {
            engine::teardown(&mut stream);
        }
        self.progress = None;
        self.closed = true;
        debug!("session {} destroyed", self.info.id);
    }

    // ─── Shared plumbing ─────────────────────────────────────────

    /// Run one operation: reject closed sessions, then record the
    /// outcome in `last_error`.
    pub(crate) fn run<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> FtpResult<T>,
    ) -> FtpResult<T> {
        let result = if self.closed {
            Err(FtpError::closed())
        } else {
            op(self)
        };
        match &result {
            Ok(_) => self.last_error.clear(),
            Err(err) => {
                self.last_error = err.to_string();
                if self.config.verbose {
                    debug!("session {}: {}", self.info.id, err);
                }
            }
        }
        result
    }

    /// Mutable engine handle, or the not-connected error.
    pub(crate) fn engine_mut(&mut self) -> FtpResult<&mut NativeTlsFtpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| FtpError::connection("session is not connected"))
    }

    pub(crate) fn touch(&mut self) {
        self.info.last_activity = Some(Utc::now());
    }
}

impl Default for FtpSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        self.destroy();
    }
}
