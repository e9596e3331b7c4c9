//! Directory and file management plus raw command execution.
//!
//! Each operation is a single control-channel round trip, except
//! listing, which opens a data channel for the listing body.

use log::{debug, trace};
use suppaftp::Status;

use crate::error::{map_engine, reply_code, response_text, FtpError, FtpResult};
use crate::session::FtpSession;

impl FtpSession {
    // ─── Listing ─────────────────────────────────────────────────

    /// Retrieve the raw directory listing for a remote path. The text
    /// is server-format dependent and returned unparsed; an empty
    /// directory yields an empty string (distinguished from failures
    /// by the `Result`).
    pub fn list_dir(&mut self, remote_path: &str) -> FtpResult<String> {
        self.run(|s| {
            check_remote(remote_path)?;
            s.log_op("LIST", remote_path);
            let lines = s
                .engine_mut()?
                .list(Some(remote_path))
                .map_err(|e| map_engine(e, "LIST"))?;
            s.touch();
            Ok(lines.join("\n"))
        })
    }

    // ─── Directory management ────────────────────────────────────

    /// Create a directory on the remote server.
    pub fn mkdir(&mut self, remote_path: &str) -> FtpResult<()> {
        self.run(|s| {
            check_remote(remote_path)?;
            s.log_op("MKD", remote_path);
            s.engine_mut()?
                .mkdir(remote_path)
                .map_err(|e| map_engine(e, "MKD"))?;
            s.touch();
            Ok(())
        })
    }

    /// Remove an empty remote directory.
    pub fn rmdir(&mut self, remote_path: &str) -> FtpResult<()> {
        self.run(|s| {
            check_remote(remote_path)?;
            s.log_op("RMD", remote_path);
            s.engine_mut()?
                .rmdir(remote_path)
                .map_err(|e| map_engine(e, "RMD"))?;
            s.touch();
            Ok(())
        })
    }

    /// Delete a remote file.
    pub fn delete(&mut self, remote_path: &str) -> FtpResult<()> {
        self.run(|s| {
            check_remote(remote_path)?;
            s.log_op("DELE", remote_path);
            s.engine_mut()?
                .rm(remote_path)
                .map_err(|e| map_engine(e, "DELE"))?;
            s.touch();
            Ok(())
        })
    }

    /// Rename (or move) a remote file or directory. Server-side and
    /// atomic when the server supports RNFR/RNTO.
    pub fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        self.run(|s| {
            check_remote(from)?;
            check_remote(to)?;
            s.log_op("RNFR/RNTO", from);
            s.engine_mut()?
                .rename(from, to)
                .map_err(|e| map_engine(e, "rename"))?;
            s.touch();
            Ok(())
        })
    }

    // ─── File info ───────────────────────────────────────────────

    /// Size of a remote file in bytes (SIZE). Binding layers that need
    /// the legacy sentinel map `Err` to -1; a real file never has a
    /// negative size.
    pub fn filesize(&mut self, remote_path: &str) -> FtpResult<i64> {
        self.run(|s| {
            check_remote(remote_path)?;
            s.log_op("SIZE", remote_path);
            let size = s
                .engine_mut()?
                .size(remote_path)
                .map_err(|e| map_engine(e, "SIZE"))?;
            s.touch();
            Ok(size as i64)
        })
    }

    // ─── Raw command ─────────────────────────────────────────────

    /// Send an arbitrary control-channel command and return the
    /// server's raw response text. Escape hatch for operations not
    /// otherwise exposed; replies of 400 and above are reported as
    /// errors carrying the server's rejection text.
    pub fn execute_command(&mut self, command: &str) -> FtpResult<String> {
        self.run(|s| {
            if command.trim().is_empty() {
                return Err(FtpError::invalid_param("command must not be empty"));
            }
            s.log_op("raw command", command);
            let response = match s
                .engine_mut()?
                .custom_command(command, &[Status::CommandOk])
            {
                Ok(response) => response,
                Err(suppaftp::FtpError::UnexpectedResponse(response)) => {
                    // The engine only expected 200; accept any reply
                    // below 400 as success for arbitrary commands.
                    let text = response_text(&response);
                    let code = reply_code(&text);
                    if code == 0 || code >= 400 {
                        return Err(FtpError::from_reply(code, &text));
                    }
                    response
                }
                Err(e) => return Err(map_engine(e, "command")),
            };
            s.touch();
            Ok(response_text(&response))
        })
    }

    // ─── Helpers ─────────────────────────────────────────────────

    fn log_op(&self, what: &str, arg: &str) {
        if self.config.verbose {
            debug!("session {}: {} {}", self.info.id, what, arg);
        } else {
            trace!("session {}: {} {}", self.info.id, what, arg);
        }
    }
}

fn check_remote(remote_path: &str) -> FtpResult<()> {
    if remote_path.is_empty() {
        return Err(FtpError::invalid_param("remote path must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FtpErrorKind;

    #[test]
    fn remote_paths_are_validated_at_the_boundary() {
        let mut session = FtpSession::new();
        for err in [
            session.list_dir("").unwrap_err(),
            session.mkdir("").unwrap_err(),
            session.rmdir("").unwrap_err(),
            session.delete("").unwrap_err(),
            session.rename("", "/b").unwrap_err(),
            session.rename("/a", "").unwrap_err(),
            session.filesize("").unwrap_err(),
            session.execute_command("  ").unwrap_err(),
        ] {
            assert_eq!(err.kind, FtpErrorKind::InvalidParam);
        }
    }
}
