pub mod inference;
pub mod relay;
pub mod server;
pub mod settings;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub use inference::{InferenceClient, InferenceError};
pub use relay::ChatRelay;
pub use server::{create_router, PageInfo, ServerState};
pub use settings::{AppSettings, SettingsError};

/// Return the platform-standard data directory for Chatfront.
///
/// - macOS: `~/Library/Application Support/chatfront/`
/// - Windows: `{FOLDERID_RoamingAppData}\chatfront\`
/// - Linux: `$XDG_DATA_HOME/chatfront/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.chatfront/` only if none of the above can be resolved.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("chatfront");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chatfront")
}

/// Default location of the log file when file logging is requested
/// without an explicit path.
pub fn default_log_path() -> PathBuf {
    data_dir().join("chatfront.log")
}

/// Where and how to write logs.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Write to this file (rotated on startup) instead of stderr.
    pub file: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

/// Initialize the tracing subscriber.
///
/// Logs go to stderr unless `options.file` is set. In that case, on each
/// startup:
/// 1. Rotates existing logs (chatfront.log → .1 → .2 → .3, keeps last 3).
/// 2. Opens a fresh log with a line-flushing writer for crash resilience.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(options: &LogOptions) -> io::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chatfront=info,tower_http=info,warn"));

    match &options.file {
        Some(log_path) => {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            // Rotate: .2 → .3, .1 → .2, current → .1
            rotate_log_file(log_path, 3);

            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;

            let builder = fmt::fmt()
                .with_env_filter(filter)
                .with_writer(FlushingWriter::new(log_file))
                .with_ansi(false)
                .with_target(true);
            if options.json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
        None => {
            let builder = fmt::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .with_target(true);
            if options.json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %options
            .file
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stderr".to_string()),
        pid = std::process::id(),
        "=== Chatfront starting ==="
    );

    Ok(())
}

/// `chatfront.log` plus a generation suffix, e.g. `chatfront.log.2`.
fn rotated_path(base_path: &Path, generation: u32) -> PathBuf {
    let mut name = base_path.as_os_str().to_owned();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

/// Shift the previous runs' logs up one generation so each launch of the
/// front-end starts a fresh file. Only `keep` old runs survive.
///
/// Best effort: a gap in the chain or a failed rename never blocks startup.
fn rotate_log_file(base_path: &Path, keep: u32) {
    if keep == 0 {
        return;
    }
    let _ = std::fs::remove_file(rotated_path(base_path, keep));

    for generation in (1..keep).rev() {
        let _ = std::fs::rename(
            rotated_path(base_path, generation),
            rotated_path(base_path, generation + 1),
        );
    }

    if base_path.exists() {
        let _ = std::fs::rename(base_path, rotated_path(base_path, 1));
    }
}

/// Shared log file handle that pushes every record straight to disk.
///
/// Turns can stream for minutes; flushing per record means `tail -f` on the
/// log shows a turn's start and failure lines while it is still open.
#[derive(Clone)]
struct FlushingWriter {
    file: Arc<Mutex<File>>,
}

impl FlushingWriter {
    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }

    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        op(&mut file)
    }
}

impl Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| {
            file.write_all(buf)?;
            file.flush()?;
            Ok(buf.len())
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
