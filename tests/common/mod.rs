//! Scripted in-process FTP server for integration tests.
//!
//! Speaks just enough of the control/data protocol to exercise the
//! client end-to-end over loopback: login, passive data connections,
//! LIST/RETR/STOR (with ABOR detection), SIZE, DELE, MKD/RMD,
//! RNFR/RNTO, and raw commands. Remote state is an in-memory map the
//! tests can inspect.

use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub type RemoteFiles = Arc<Mutex<HashMap<String, Vec<u8>>>>;
pub type RemoteDirs = Arc<Mutex<HashSet<String>>>;

#[derive(Clone, Copy, Default)]
pub struct ServerOptions {
    /// Reject PASS with 530.
    pub fail_login: bool,
}

pub struct MockFtpServer {
    addr: SocketAddr,
    files: RemoteFiles,
    dirs: RemoteDirs,
}

impl MockFtpServer {
    pub fn start() -> Self {
        Self::start_with(ServerOptions::default())
    }

    pub fn start_with(options: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().unwrap();
        let files: RemoteFiles = Arc::new(Mutex::new(HashMap::new()));
        let dirs: RemoteDirs = Arc::new(Mutex::new(HashSet::new()));
        dirs.lock().unwrap().insert("/".to_string());

        {
            let files = Arc::clone(&files);
            let dirs = Arc::clone(&dirs);
            // Control connections are served one after another; the
            // thread dies with the test process.
            thread::spawn(move || {
                for conn in listener.incoming() {
                    match conn {
                        Ok(stream) => {
                            let _ = handle_control(stream, &files, &dirs, options);
                        }
                        Err(_) => break,
                    }
                }
            });
        }

        Self { addr, files, dirs }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn put_file(&self, path: &str, data: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }
}

fn handle_control(
    stream: TcpStream,
    files: &RemoteFiles,
    dirs: &RemoteDirs,
    options: ServerOptions,
) -> io::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    writer.write_all(b"220 mockftp ready\r\n")?;

    let mut pending_data: Option<TcpListener> = None;
    let mut pending_rename: Option<String> = None;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let line = line.trim_end();
        let (verb, arg) = split_command(line);

        match verb.as_str() {
            "USER" => writer.write_all(b"331 password required\r\n")?,
            "PASS" => {
                if options.fail_login {
                    writer.write_all(b"530 Login incorrect.\r\n")?;
                } else {
                    writer.write_all(b"230 logged in\r\n")?;
                }
            }
            "AUTH" => writer.write_all(b"502 AUTH not implemented\r\n")?,
            "TYPE" => writer.write_all(b"200 type set\r\n")?,
            "NOOP" => writer.write_all(b"200 NOOP ok\r\n")?,
            "SYST" => writer.write_all(b"215 UNIX Type: L8\r\n")?,
            "PWD" => writer.write_all(b"257 \"/\" is the current directory\r\n")?,
            "QUIT" => {
                writer.write_all(b"221 goodbye\r\n")?;
                return Ok(());
            }
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0")?;
                let port = listener.local_addr()?.port();
                pending_data = Some(listener);
                let reply = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{})\r\n",
                    port / 256,
                    port % 256
                );
                writer.write_all(reply.as_bytes())?;
            }
            "LIST" => match pending_data.take() {
                Some(listener) => {
                    let (mut data, _) = listener.accept()?;
                    writer.write_all(b"150 here comes the listing\r\n")?;
                    let listing = render_listing(files, arg);
                    data.write_all(listing.as_bytes())?;
                    drop(data);
                    writer.write_all(b"226 directory send ok\r\n")?;
                }
                None => writer.write_all(b"425 Use PASV first.\r\n")?,
            },
            "RETR" => {
                let listener = pending_data.take();
                let content = files.lock().unwrap().get(arg).cloned();
                match (listener, content) {
                    (Some(listener), Some(bytes)) => {
                        let (mut data, _) = listener.accept()?;
                        writer.write_all(b"150 opening data connection\r\n")?;
                        data.write_all(&bytes)?;
                        drop(data);
                        writer.write_all(b"226 transfer complete\r\n")?;
                    }
                    (_, None) => writer.write_all(b"550 No such file or directory\r\n")?,
                    (None, _) => writer.write_all(b"425 Use PASV first.\r\n")?,
                }
            }
            "STOR" => match pending_data.take() {
                Some(listener) => {
                    let (mut data, _) = listener.accept()?;
                    writer.write_all(b"150 ok to send data\r\n")?;
                    let mut body = Vec::new();
                    data.read_to_end(&mut body)?;
                    drop(data);

                    if aborted_after_transfer(&mut reader)? {
                        writer.write_all(b"426 transfer aborted\r\n")?;
                        writer.write_all(b"226 abort successful\r\n")?;
                    } else {
                        files.lock().unwrap().insert(arg.to_string(), body);
                        writer.write_all(b"226 transfer complete\r\n")?;
                    }
                }
                None => writer.write_all(b"425 Use PASV first.\r\n")?,
            },
            "SIZE" => {
                let size = files.lock().unwrap().get(arg).map(|b| b.len());
                match size {
                    Some(size) => {
                        writer.write_all(format!("213 {}\r\n", size).as_bytes())?;
                    }
                    None => writer.write_all(b"550 Could not get file size.\r\n")?,
                }
            }
            "DELE" => {
                if files.lock().unwrap().remove(arg).is_some() {
                    writer.write_all(b"250 file deleted\r\n")?;
                } else {
                    writer.write_all(b"550 No such file or directory\r\n")?;
                }
            }
            "MKD" => {
                let created = dirs.lock().unwrap().insert(arg.to_string());
                if created {
                    writer.write_all(format!("257 \"{}\" created\r\n", arg).as_bytes())?;
                } else {
                    writer.write_all(b"550 Directory already exists\r\n")?;
                }
            }
            "RMD" => {
                if dirs.lock().unwrap().remove(arg) {
                    writer.write_all(b"250 directory removed\r\n")?;
                } else {
                    writer.write_all(b"550 No such directory\r\n")?;
                }
            }
            "RNFR" => {
                let known = files.lock().unwrap().contains_key(arg)
                    || dirs.lock().unwrap().contains(arg);
                if known {
                    pending_rename = Some(arg.to_string());
                    writer.write_all(b"350 ready for RNTO\r\n")?;
                } else {
                    writer.write_all(b"550 No such file or directory\r\n")?;
                }
            }
            "RNTO" => match pending_rename.take() {
                Some(from) => {
                    let mut files = files.lock().unwrap();
                    if let Some(bytes) = files.remove(&from) {
                        files.insert(arg.to_string(), bytes);
                    } else {
                        let mut dirs = dirs.lock().unwrap();
                        dirs.remove(&from);
                        dirs.insert(arg.to_string());
                    }
                    writer.write_all(b"250 rename successful\r\n")?;
                }
                None => writer.write_all(b"503 RNFR required first\r\n")?,
            },
            "ABOR" => writer.write_all(b"226 nothing to abort\r\n")?,
            _ => writer.write_all(b"502 command not implemented\r\n")?,
        }
    }
}

/// After the data channel hits EOF, give the client a short window to
/// deliver an ABOR before treating the upload as complete.
fn aborted_after_transfer(reader: &mut BufReader<TcpStream>) -> io::Result<bool> {
    reader
        .get_ref()
        .set_read_timeout(Some(Duration::from_millis(150)))?;
    let mut extra = String::new();
    let aborted = match reader.read_line(&mut extra) {
        Ok(0) => false,
        Ok(_) => extra.trim_end().eq_ignore_ascii_case("ABOR"),
        Err(ref e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
            false
        }
        Err(e) => return Err(e),
    };
    reader.get_ref().set_read_timeout(None)?;
    Ok(aborted)
}

fn split_command(line: &str) -> (String, &str) {
    match line.split_once(' ') {
        Some((verb, arg)) => (verb.to_uppercase(), arg.trim()),
        None => (line.to_uppercase(), ""),
    }
}

fn render_listing(files: &RemoteFiles, dir: &str) -> String {
    let prefix = if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{}/", dir)
    };
    let files = files.lock().unwrap();
    let mut out = String::new();
    for (path, bytes) in files.iter() {
        if let Some(rest) = path.strip_prefix(&prefix) {
            if !rest.is_empty() && !rest.contains('/') {
                out.push_str(&format!(
                    "-rw-r--r--    1 ftp      ftp      {:>8} Jan  1 00:00 {}\r\n",
                    bytes.len(),
                    rest
                ));
            }
        }
    }
    out
}
