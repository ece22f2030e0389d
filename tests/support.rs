use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

/// Server-side delay before every `/api/v1/*` response.
pub const API_LATENCY_MS: u32 = 5;

/// Requests the fake gateway received: `(path, body)`.
pub type PushLog = Arc<Mutex<Vec<(String, String)>>>;

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    pushes: PushLog,
}

impl ServerHandle {
    #[must_use]
    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a fake inference API that also accepts Pushgateway pushes.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_inference_server() -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let pushes: PushLog = Arc::new(Mutex::new(Vec::new()));
    let server_pushes = Arc::clone(&pushes);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let pushes = Arc::clone(&server_pushes);
                    thread::spawn(move || handle_client(stream, &pushes));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
            pushes,
        },
    ))
}

/// An address nothing listens on.
///
/// # Errors
///
/// Returns an error if a probe listener cannot be bound.
pub fn closed_port_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind probe listener failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

fn handle_client(mut stream: TcpStream, pushes: &PushLog) {
    if stream.set_nonblocking(false).is_err()
        || stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .is_err()
    {
        return;
    }
    let Some((request_line, body)) = read_request(&mut stream) else {
        return;
    };
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();

    let (status, payload) = if path.starts_with("/metrics/job/") && method == "POST" {
        pushes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((path.clone(), body));
        ("200 OK", String::new())
    } else {
        if path.starts_with("/api/v1/") {
            thread::sleep(Duration::from_millis(u64::from(API_LATENCY_MS)));
        }
        match path.as_str() {
            "/api/v1/health" => ("200 OK", r#"{"status":"healthy"}"#.to_owned()),
            "/api/v1/predict" => (
                "200 OK",
                r#"{"prediction":"positive","confidence":0.9}"#.to_owned(),
            ),
            "/api/v1/status" | "/api/v1/models" | "/api/v1/metrics" => {
                ("200 OK", r#"{"ok":true}"#.to_owned())
            }
            _ => ("404 Not Found", String::new()),
        }
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        payload.len(),
        payload
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut raw = Vec::new();
    let mut buffer = [0u8; 1024];
    loop {
        let read = stream.read(&mut buffer).ok()?;
        if read == 0 {
            break;
        }
        raw.extend_from_slice(buffer.get(..read)?);
        if let Some(parsed) = parse_complete(&raw) {
            return Some(parsed);
        }
    }
    parse_complete(&raw)
}

fn parse_complete(raw: &[u8]) -> Option<(String, String)> {
    let text = String::from_utf8_lossy(raw);
    let (head, body) = text.split_once("\r\n\r\n")?;
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    if body.len() < content_length {
        return None;
    }
    let request_line = head.lines().next()?.to_owned();
    Some((request_line, body.to_owned()))
}

/// Run the `inferload` binary with a clean environment and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_inferload<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = inferload_bin()?;
    Command::new(bin)
        .args(args)
        .env_remove("BASE_URL")
        .env_remove("PROMETHEUS_PUSHGATEWAY_URL")
        .env_remove("INFERLOAD_JOB_NAME")
        .env_remove("INFERLOAD_LOG")
        .env("RUST_LOG", "error")
        .output()
        .map_err(|err| format!("run inferload failed: {}", err))
}

fn inferload_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_inferload").map_or_else(
        || Err("CARGO_BIN_EXE_inferload missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
