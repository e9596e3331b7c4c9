//! Transfer-engine binding: adapts the session configuration to the
//! underlying FTP engine.
//!
//! Handles address resolution, the connect deadline, the TLS policy
//! (with plaintext fallback for [`TlsPolicy::Try`]), login, binary
//! transfer type, data-connection mode, and control-socket deadlines.
//! Protocol command sequencing, PASV/PORT negotiation, and TLS
//! handshakes are the engine's concern.

use std::net::ToSocketAddrs;
use std::time::Duration;

use log::{debug, trace};
use suppaftp::native_tls::TlsConnector;
use suppaftp::types::FileType;
use suppaftp::{Mode, NativeTlsConnector, NativeTlsFtpStream};

use crate::error::{map_engine, FtpError, FtpResult};
use crate::types::{SessionConfig, TlsPolicy, TransferMode};

/// Establish a ready-to-use control connection: connect, apply the TLS
/// policy, authenticate, switch to binary type, and arm the deadlines.
pub(crate) fn establish(config: &SessionConfig) -> FtpResult<NativeTlsFtpStream> {
    config.validate()?;

    let stream = open_control(config)?;
    let mut stream = secure(stream, config)?;

    let (user, password) = config.login_credentials();
    stream
        .login(user, password)
        .map_err(|e| map_engine(e, "login"))?;

    stream
        .transfer_type(FileType::Binary)
        .map_err(|e| map_engine(e, "TYPE"))?;

    stream.set_mode(match config.mode {
        TransferMode::Passive => Mode::Passive,
        TransferMode::Active => Mode::Active,
    });

    if config.timeout_secs > 0 {
        let deadline = Duration::from_secs(config.timeout_secs);
        stream
            .get_ref()
            .set_read_timeout(Some(deadline))
            .map_err(|e| FtpError::connection(format!("set read deadline: {}", e)))?;
        stream
            .get_ref()
            .set_write_timeout(Some(deadline))
            .map_err(|e| FtpError::connection(format!("set write deadline: {}", e)))?;
    }

    debug!(
        "connected to {}:{} (mode {:?}, tls {:?})",
        config.host, config.port, config.mode, config.tls
    );
    Ok(stream)
}

/// Quit the control connection, ignoring failures on an already-dead
/// link.
pub(crate) fn teardown(stream: &mut NativeTlsFtpStream) {
    let _ = stream.quit();
}

fn open_control(config: &SessionConfig) -> FtpResult<NativeTlsFtpStream> {
    let target = format!("{}:{}", config.host, config.port);
    trace!("opening control connection to {}", target);

    if config.connect_timeout_secs > 0 {
        let addr = target
            .to_socket_addrs()
            .map_err(|e| FtpError::connection(format!("cannot resolve {}: {}", target, e)))?
            .next()
            .ok_or_else(|| FtpError::connection(format!("cannot resolve {}", target)))?;
        NativeTlsFtpStream::connect_timeout(
            addr,
            Duration::from_secs(config.connect_timeout_secs),
        )
        .map_err(|e| map_engine(e, "connect"))
    } else {
        NativeTlsFtpStream::connect(&target).map_err(|e| map_engine(e, "connect"))
    }
}

/// Apply the configured TLS policy to a freshly opened control
/// connection.
fn secure(
    stream: NativeTlsFtpStream,
    config: &SessionConfig,
) -> FtpResult<NativeTlsFtpStream> {
    match config.tls {
        TlsPolicy::None => Ok(stream),
        TlsPolicy::Try => match stream.into_secure(connector(config)?, &config.host) {
            Ok(secured) => Ok(secured),
            Err(suppaftp::FtpError::UnexpectedResponse(response)) => {
                // Server refused AUTH TLS; the engine consumed the
                // connection, so start over in plaintext.
                debug!(
                    "server rejected AUTH TLS ({}), continuing in plaintext",
                    crate::error::response_text(&response)
                );
                open_control(config)
            }
            Err(e) => Err(map_engine(e, "TLS negotiation")),
        },
        TlsPolicy::Control | TlsPolicy::All => stream
            .into_secure(connector(config)?, &config.host)
            .map_err(|e| map_engine(e, "TLS negotiation")),
    }
}

fn connector(config: &SessionConfig) -> FtpResult<NativeTlsConnector> {
    let mut builder = TlsConnector::builder();
    if !config.verify_tls {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    let connector = builder
        .build()
        .map_err(|e| FtpError::tls(format!("TLS connector: {}", e)))?;
    Ok(NativeTlsConnector::from(connector))
}
