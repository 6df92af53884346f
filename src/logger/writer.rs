//! Size-rotating file writer
//!
//! The active file is `relay.log`; on rotation it becomes `relay.log.1`,
//! older files shift up by one and anything past `max_files` is removed.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::FileConfig;
use crate::logger::error::LoggerError;

/// File writer with size-based rotation.
///
/// Write failures switch the writer to stderr so a full disk never takes
/// the process down with it.
#[derive(Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<WriterState>>,
}

struct WriterState {
    file: BufWriter<File>,
    path: PathBuf,
    current_size: u64,
    max_size: u64,
    max_files: usize,
    fallback_mode: bool,
}

impl RotatingFileWriter {
    pub fn new(config: &FileConfig) -> Result<Self, LoggerError> {
        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            std::fs::metadata(&config.path).map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                file,
                path: config.path.clone(),
                current_size,
                max_size: config.max_size,
                max_files: config.max_files,
                fallback_mode: false,
            })),
        })
    }

    pub fn is_in_fallback_mode(&self) -> bool {
        self.state.lock().map(|s| s.fallback_mode).unwrap_or(false)
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            state: self.state.clone(),
        }
    }
}

pub struct RotatingWriterGuard {
    state: Arc<Mutex<WriterState>>,
}

impl Write for RotatingWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().write(buf);
        }

        if state.current_size > 0 && state.current_size + buf.len() as u64 > state.max_size {
            if let Err(e) = state.rotate() {
                return state.fall_back(buf, e);
            }
        }

        match state.file.write(buf) {
            Ok(written) => {
                state.current_size += written as u64;
                Ok(written)
            }
            Err(e) => state.fall_back(buf, e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("Failed to acquire writer lock"))?;

        if state.fallback_mode {
            return io::stderr().flush();
        }
        state.file.flush()
    }
}

// tracing-subscriber makes one guard per event
impl Drop for RotatingWriterGuard {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl WriterState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        shift_rotated_files(&self.path, self.max_files)?;
        self.file = open_log_file(&self.path, false)?;
        self.current_size = 0;
        Ok(())
    }

    fn fall_back(&mut self, buf: &[u8], error: io::Error) -> io::Result<usize> {
        eprintln!(
            "[logger] Failed to write to {}: {}. Falling back to stderr.",
            self.path.display(),
            error
        );
        self.fallback_mode = true;
        io::stderr().write(buf)
    }
}

/// `relay.log.{index}`
fn rotated_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

fn shift_rotated_files(path: &Path, max_files: usize) -> io::Result<()> {
    let oldest = rotated_path(path, max_files);
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }

    for index in (1..max_files).rev() {
        let from = rotated_path(path, index);
        if from.exists() {
            std::fs::rename(&from, rotated_path(path, index + 1))?;
        }
    }

    std::fs::rename(path, rotated_path(path, 1))
}

fn open_log_file(path: &Path, append: bool) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::LogFormat;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir, max_size: u64, max_files: usize) -> FileConfig {
        FileConfig {
            enabled: true,
            path: dir.path().join("relay.log"),
            append: true,
            format: LogFormat::Full,
            max_size,
            max_files,
        }
    }

    fn write_line(writer: &RotatingFileWriter, line: &str) {
        let mut guard = writer.make_writer();
        guard.write_all(line.as_bytes()).unwrap();
        guard.flush().unwrap();
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let config = FileConfig {
            path: dir.path().join("nested/deeper/relay.log"),
            ..file_config(&dir, 1024, 2)
        };
        let writer = RotatingFileWriter::new(&config).unwrap();
        write_line(&writer, "hello\n");

        let content = std::fs::read_to_string(&config.path).unwrap();
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn test_rotates_when_size_exceeded() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, 10, 3);
        let writer = RotatingFileWriter::new(&config).unwrap();

        write_line(&writer, "first-123\n");
        write_line(&writer, "second-12\n");

        assert_eq!(std::fs::read_to_string(&config.path).unwrap(), "second-12\n");
        assert_eq!(
            std::fs::read_to_string(rotated_path(&config.path, 1)).unwrap(),
            "first-123\n"
        );
        assert!(!writer.is_in_fallback_mode());
    }

    #[test]
    fn test_keeps_at_most_max_files_backups() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, 4, 2);
        let writer = RotatingFileWriter::new(&config).unwrap();

        for line in ["aaa\n", "bbb\n", "ccc\n", "ddd\n"] {
            write_line(&writer, line);
        }

        assert_eq!(std::fs::read_to_string(&config.path).unwrap(), "ddd\n");
        assert_eq!(
            std::fs::read_to_string(rotated_path(&config.path, 1)).unwrap(),
            "ccc\n"
        );
        assert_eq!(
            std::fs::read_to_string(rotated_path(&config.path, 2)).unwrap(),
            "bbb\n"
        );
        assert!(!rotated_path(&config.path, 3).exists());
    }

    #[test]
    fn test_truncates_when_append_disabled() {
        let dir = TempDir::new().unwrap();
        let config = FileConfig {
            append: false,
            ..file_config(&dir, 1024, 2)
        };
        std::fs::write(&config.path, "stale\n").unwrap();

        let writer = RotatingFileWriter::new(&config).unwrap();
        write_line(&writer, "fresh\n");

        assert_eq!(std::fs::read_to_string(&config.path).unwrap(), "fresh\n");
    }
}
