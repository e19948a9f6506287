//! Following a growing log file.
//!
//! [`LogTailer`] attaches at the end of the file and yields complete lines
//! as they are appended. It survives truncation (reads from the start
//! again) and rotation (reopens the new file at the same path).

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tracing::{debug, info};

/// Idle poll interval for local filesystems.
pub const FAST_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Idle poll interval when `POLL_LOG` is set (network filesystems).
pub const SLOW_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll interval for the given `POLL_LOG` setting.
pub fn poll_interval(poll_log: bool) -> Duration {
    if poll_log {
        SLOW_POLL_INTERVAL
    } else {
        FAST_POLL_INTERVAL
    }
}

/// Identity of the file behind a path, used to detect rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileId(u64, u64);

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> Option<FileId> {
    use std::os::unix::fs::MetadataExt;
    Some(FileId(meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> Option<FileId> {
    None
}

/// Follows a single log file line by line.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    poll_interval: Duration,
    reader: BufReader<File>,
    id: Option<FileId>,
    /// Bytes consumed from the current file.
    position: u64,
    /// Bytes of a line whose newline has not been written yet.
    pending: Vec<u8>,
}

impl LogTailer {
    /// Open `path` and position at its end. The file must exist.
    pub async fn open(path: impl AsRef<Path>, poll_interval: Duration) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).await?;
        let meta = file.metadata().await?;
        let position = file.seek(SeekFrom::End(0)).await?;

        info!(path = %path.display(), "Tailing log file from offset {}", position);

        Ok(Self {
            path,
            poll_interval,
            reader: BufReader::new(file),
            id: file_id(&meta),
            position,
            pending: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wait for and return the next complete line, without its line ending.
    pub async fn next_line(&mut self) -> io::Result<String> {
        loop {
            let before = self.pending.len();
            let read = self.reader.read_until(b'\n', &mut self.pending).await?;
            self.position += (self.pending.len() - before) as u64;

            if read > 0 && self.pending.last() == Some(&b'\n') {
                return Ok(self.take_line());
            }
            if read > 0 {
                // Partial line; keep reading until EOF.
                continue;
            }

            self.check_file().await?;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn take_line(&mut self) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        if bytes.last() == Some(&b'\n') {
            bytes.pop();
        }
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Handle truncation and rotation at end of file.
    async fn check_file(&mut self) -> io::Result<()> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Rotated away and not recreated yet; keep the old handle.
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let id = file_id(&meta);
        if id.is_some() && id != self.id {
            info!(path = %self.path.display(), "Log file rotated, reopening");
            let file = File::open(&self.path).await?;
            self.reader = BufReader::new(file);
            self.id = id;
            self.restart();
            return Ok(());
        }

        if meta.len() < self.position {
            info!(path = %self.path.display(), "Log file truncated, reading from start");
            self.reader.seek(SeekFrom::Start(0)).await?;
            self.restart();
        }
        Ok(())
    }

    fn restart(&mut self) {
        if !self.pending.is_empty() {
            debug!("Discarding {} bytes of unfinished line", self.pending.len());
        }
        self.position = 0;
        self.pending.clear();
    }
}
