//! Streaming upload and download.
//!
//! Files move through the engine's data streams in fixed-size chunks,
//! never fully buffered. Every chunk ticks the progress reporter; an
//! abort sends ABOR and surfaces the cancelled error instead of a
//! silent partial success.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use log::{debug, trace};

use crate::error::{map_engine, FtpError, FtpResult};
use crate::progress::ProgressReporter;
use crate::session::FtpSession;
use crate::types::TransferDirection;

/// Chunk size for streaming transfers (64 KiB).
const TRANSFER_CHUNK: usize = 65_536;

impl FtpSession {
    // ─── Upload (STOR) ───────────────────────────────────────────

    /// Upload a local file to a remote path. Returns the number of
    /// bytes sent.
    pub fn upload(&mut self, local_path: &str, remote_path: &str) -> FtpResult<u64> {
        self.run(|s| s.upload_inner(local_path, remote_path))
    }

    fn upload_inner(&mut self, local_path: &str, remote_path: &str) -> FtpResult<u64> {
        check_paths(local_path, remote_path)?;
        if self.config.verbose {
            debug!("session {}: upload {} -> {}", self.info.id, local_path, remote_path);
        } else {
            trace!("session {}: upload {} -> {}", self.info.id, local_path, remote_path);
        }

        let mut file = File::open(local_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                FtpError::not_found(format!("local file {}: {}", local_path, e))
            }
            _ => FtpError::file_io(format!("open {}: {}", local_path, e)),
        })?;
        let total = file
            .metadata()
            .map_err(|e| FtpError::file_io(format!("stat {}: {}", local_path, e)))?
            .len();

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| FtpError::connection("session is not connected"))?;
        let mut reporter =
            ProgressReporter::new(self.progress.as_mut(), TransferDirection::Upload, total);

        // The remote file is untouched when the handler aborts before
        // the data channel opens.
        if !reporter.tick(0) {
            return Err(cancel_error(&mut reporter));
        }

        let mut data = stream
            .put_with_stream(remote_path)
            .map_err(|e| map_engine(e, "STOR"))?;

        let mut buf = vec![0u8; TRANSFER_CHUNK];
        let mut sent: u64 = 0;
        loop {
            let n = file
                .read(&mut buf)
                .map_err(|e| FtpError::file_io(format!("read {}: {}", local_path, e)))?;
            if n == 0 {
                break;
            }
            data.write_all(&buf[..n])
                .map_err(|e| FtpError::transfer(format!("data channel write: {}", e)))?;
            sent += n as u64;

            if !reporter.tick(sent) {
                let err = cancel_error(&mut reporter);
                let _ = stream.abort(data);
                return Err(err);
            }
        }

        stream
            .finalize_put_stream(data)
            .map_err(|e| map_engine(e, "STOR"))?;

        self.info.bytes_uploaded += sent;
        self.touch();
        Ok(sent)
    }

    // ─── Download (RETR) ─────────────────────────────────────────

    /// Download a remote file to a local path, creating missing parent
    /// directories. Returns the number of bytes received.
    pub fn download(&mut self, remote_path: &str, local_path: &str) -> FtpResult<u64> {
        self.run(|s| s.download_inner(remote_path, local_path))
    }

    fn download_inner(&mut self, remote_path: &str, local_path: &str) -> FtpResult<u64> {
        check_paths(local_path, remote_path)?;
        if self.config.verbose {
            debug!("session {}: download {} -> {}", self.info.id, remote_path, local_path);
        } else {
            trace!("session {}: download {} -> {}", self.info.id, remote_path, local_path);
        }

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| FtpError::connection("session is not connected"))?;

        // Best-effort SIZE; servers without it leave the total unknown.
        let total = stream.size(remote_path).map(|s| s as u64).unwrap_or(0);

        let mut reporter =
            ProgressReporter::new(self.progress.as_mut(), TransferDirection::Download, total);
        if !reporter.tick(0) {
            return Err(cancel_error(&mut reporter));
        }

        let mut data = stream
            .retr_as_stream(remote_path)
            .map_err(|e| map_engine(e, "RETR"))?;

        if let Some(parent) = Path::new(local_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| FtpError::file_io(format!("create {}: {}", parent.display(), e)))?;
            }
        }
        let mut file = File::create(local_path)
            .map_err(|e| FtpError::file_io(format!("create {}: {}", local_path, e)))?;

        let mut buf = vec![0u8; TRANSFER_CHUNK];
        let mut received: u64 = 0;
        loop {
            let n = data
                .read(&mut buf)
                .map_err(|e| FtpError::transfer(format!("data channel read: {}", e)))?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])
                .map_err(|e| FtpError::file_io(format!("write {}: {}", local_path, e)))?;
            received += n as u64;

            if !reporter.tick(received) {
                let err = cancel_error(&mut reporter);
                let _ = stream.abort(data);
                return Err(err);
            }
        }

        file.flush()
            .map_err(|e| FtpError::file_io(format!("flush {}: {}", local_path, e)))?;
        drop(file);

        stream
            .finalize_retr_stream(data)
            .map_err(|e| map_engine(e, "RETR"))?;

        self.info.bytes_downloaded += received;
        self.touch();
        Ok(received)
    }
}

fn check_paths(local_path: &str, remote_path: &str) -> FtpResult<()> {
    if local_path.is_empty() {
        return Err(FtpError::invalid_param("local path must not be empty"));
    }
    if remote_path.is_empty() {
        return Err(FtpError::invalid_param("remote path must not be empty"));
    }
    Ok(())
}

fn cancel_error(reporter: &mut ProgressReporter<'_>) -> FtpError {
    match reporter.take_hook_error() {
        Some(detail) => FtpError::cancelled(detail),
        None => FtpError::cancelled("transfer cancelled by progress callback"),
    }
}
