//! Categorised error type and the result-code constants exposed to
//! embedding layers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised client error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpError {
    pub kind: FtpErrorKind,
    pub message: String,
    /// FTP reply code that triggered the error, if any.
    pub reply: Option<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FtpErrorKind {
    /// Library bring-up failure.
    Init,
    /// TCP / DNS failure, dropped control connection, or session not
    /// connected.
    Connection,
    /// TLS negotiation or handshake failure.
    Tls,
    /// Wrong username/password.
    Auth,
    /// Transfer rejected, aborted, or incomplete.
    Transfer,
    /// File or directory not found (local or remote).
    NotFound,
    /// Allocation failure (reserved for embedder parity).
    Memory,
    /// Argument validation failure.
    InvalidParam,
    /// Unclassifiable engine failure (unparseable response, internal
    /// state error).
    Engine,
    /// Local file read/write failure.
    FileIo,
    /// Connect or socket deadline exceeded.
    Timeout,
    /// Transfer aborted by the progress callback.
    Cancelled,
    /// Session has been destroyed.
    Closed,
}

/// Integer result codes for embedding layers that branch on numbers
/// rather than on [`FtpErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ResultCode {
    Ok = 0,
    Init = -1,
    Connection = -2,
    Auth = -3,
    Transfer = -4,
    FileNotFound = -5,
    Memory = -6,
    InvalidParam = -7,
    Engine = -8,
    FileIo = -9,
    Timeout = -10,
    Cancelled = -11,
}

impl ResultCode {
    pub fn value(self) -> i32 {
        self as i32
    }
}

impl FtpErrorKind {
    /// Result code reported for this kind.
    pub fn code(self) -> ResultCode {
        match self {
            Self::Init => ResultCode::Init,
            Self::Connection | Self::Tls => ResultCode::Connection,
            Self::Auth => ResultCode::Auth,
            Self::Transfer => ResultCode::Transfer,
            Self::NotFound => ResultCode::FileNotFound,
            Self::Memory => ResultCode::Memory,
            Self::InvalidParam | Self::Closed => ResultCode::InvalidParam,
            Self::Engine => ResultCode::Engine,
            Self::FileIo => ResultCode::FileIo,
            Self::Timeout => ResultCode::Timeout,
            Self::Cancelled => ResultCode::Cancelled,
        }
    }
}

pub type FtpResult<T> = Result<T, FtpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl FtpError {
    pub fn new(kind: FtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            reply: None,
        }
    }

    pub fn with_reply(mut self, code: u16) -> Self {
        self.reply = Some(code);
        self
    }

    /// Result code for this error.
    pub fn code(&self) -> ResultCode {
        self.kind.code()
    }

    // ── Convenience constructors ─────────────────────────────────

    pub fn init(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Init, msg)
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Connection, msg)
    }

    pub fn tls(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Tls, msg)
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Auth, msg)
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Transfer, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::NotFound, msg)
    }

    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::InvalidParam, msg)
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Engine, msg)
    }

    pub fn file_io(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::FileIo, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Timeout, msg)
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Cancelled, msg)
    }

    pub fn closed() -> Self {
        Self::new(FtpErrorKind::Closed, "session has been destroyed")
    }

    /// Classify an FTP reply code into the most appropriate error kind.
    pub fn from_reply(code: u16, text: &str) -> Self {
        let kind = match code {
            421 => FtpErrorKind::Connection,
            425 | 426 => FtpErrorKind::Transfer,
            430 | 530 | 332 => FtpErrorKind::Auth,
            450 | 550 => {
                let lower = text.to_lowercase();
                if lower.contains("permission") || lower.contains("denied") {
                    FtpErrorKind::Transfer
                } else {
                    FtpErrorKind::NotFound
                }
            }
            _ if code >= 400 => FtpErrorKind::Transfer,
            _ => FtpErrorKind::Engine,
        };
        Self {
            kind,
            message: text.to_string(),
            reply: Some(code),
        }
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reply) = self.reply {
            write!(f, "[{:?} {}] {}", self.kind, reply, self.message)
        } else {
            write!(f, "[{:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FtpError {}

impl From<std::io::Error> for FtpError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                Self::timeout(format!("I/O timeout: {}", e))
            }
            std::io::ErrorKind::NotFound => Self::not_found(e.to_string()),
            _ => Self::file_io(e.to_string()),
        }
    }
}

// ── Engine error mapping ─────────────────────────────────────────────

/// Full response text carried by an engine reply.
pub(crate) fn response_text(response: &suppaftp::types::Response) -> String {
    String::from_utf8_lossy(&response.body)
        .trim_end()
        .to_string()
}

/// Reply code parsed from the first three characters of a response line.
pub(crate) fn reply_code(text: &str) -> u16 {
    text.get(..3).and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Map an engine error into the library taxonomy, prefixing local I/O
/// failures with the operation name.
pub(crate) fn map_engine(err: suppaftp::FtpError, what: &str) -> FtpError {
    match err {
        suppaftp::FtpError::ConnectionError(io) => match io.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                FtpError::timeout(format!("{} timed out: {}", what, io))
            }
            _ => FtpError::connection(format!("{}: {}", what, io)),
        },
        suppaftp::FtpError::SecureError(msg) => FtpError::tls(format!("{}: {}", what, msg)),
        suppaftp::FtpError::UnexpectedResponse(response) => {
            let text = response_text(&response);
            FtpError::from_reply(reply_code(&text), &text)
        }
        suppaftp::FtpError::BadResponse => {
            FtpError::engine(format!("{}: unparseable server response", what))
        }
        other => FtpError::engine(format!("{}: {}", what, other)),
    }
}
