//! Size-rotating file writer used by the file layer

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::{FileConfig, RotationConfig};

/// Cloneable handle over a shared log file. Every clone writes to the same file.
#[derive(Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<WriterState>>,
}

struct WriterState {
    path: PathBuf,
    file: File,
    current_size: u64,
    rotation: RotationConfig,
}

impl RotatingFileWriter {
    pub fn new(config: &FileConfig) -> io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = open_log_file(&config.path, config.append)?;
        let current_size = if config.append {
            file.metadata().map(|m| m.len()).unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            state: Arc::new(Mutex::new(WriterState {
                path: config.path.clone(),
                file,
                current_size,
                rotation: config.rotation.clone(),
            })),
        })
    }
}

impl WriterState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        let max_files = self.rotation.max_files;
        let oldest = rotated_path(&self.path, max_files, self.rotation.compress);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..max_files).rev() {
            let from = rotated_path(&self.path, index, self.rotation.compress);
            if from.exists() {
                fs::rename(&from, rotated_path(&self.path, index + 1, self.rotation.compress))?;
            }
        }

        let first = rotated_path(&self.path, 1, false);
        fs::rename(&self.path, &first)?;
        if self.rotation.compress {
            compress_file(&first)?;
        }

        self.file = open_log_file(&self.path, false)?;
        self.current_size = 0;
        Ok(())
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log writer lock poisoned"))?;

        if state.current_size > 0
            && state.current_size + buf.len() as u64 > state.rotation.max_size
        {
            state.rotate()?;
        }

        let written = state.file.write(buf)?;
        state.current_size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log writer lock poisoned"))?;
        state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn open_log_file(path: &Path, append: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).write(true);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options.open(path)
}

fn rotated_path(path: &Path, index: usize, compressed: bool) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", index));
    if compressed {
        name.push(".gz");
    }
    PathBuf::from(name)
}

fn compress_file(path: &Path) -> io::Result<()> {
    let mut target = path.as_os_str().to_owned();
    target.push(".gz");

    let mut input = File::open(path)?;
    let mut encoder = GzEncoder::new(File::create(PathBuf::from(target))?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir, compress: bool) -> FileConfig {
        FileConfig {
            enabled: true,
            path: dir.path().join("nested").join("app.log"),
            append: true,
            rotation: RotationConfig {
                max_size: 1024,
                max_files: 2,
                compress,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, false);
        let mut writer = RotatingFileWriter::new(&config).unwrap();

        writer.write_all(b"hello\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&config.path).unwrap(), "hello\n");
    }

    #[test]
    fn test_rotates_when_size_exceeded() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, false);
        let mut writer = RotatingFileWriter::new(&config).unwrap();

        let line = vec![b'a'; 600];
        writer.write_all(&line).unwrap();
        writer.write_all(&line).unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::metadata(&config.path).unwrap().len(), 600);
        assert_eq!(fs::metadata(rotated_path(&config.path, 1, false)).unwrap().len(), 600);
    }

    #[test]
    fn test_keeps_at_most_max_files() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, false);
        let mut writer = RotatingFileWriter::new(&config).unwrap();

        for byte in [b'a', b'b', b'c', b'd'] {
            writer.write_all(&[byte; 600]).unwrap();
        }

        assert!(rotated_path(&config.path, 1, false).exists());
        assert!(rotated_path(&config.path, 2, false).exists());
        assert!(!rotated_path(&config.path, 3, false).exists());
        assert_eq!(fs::read(rotated_path(&config.path, 2, false)).unwrap()[0], b'b');
    }

    #[test]
    fn test_compresses_rotated_files() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, true);
        let mut writer = RotatingFileWriter::new(&config).unwrap();

        writer.write_all(&[b'x'; 700]).unwrap();
        writer.write_all(&[b'y'; 700]).unwrap();

        let gz = rotated_path(&config.path, 1, true);
        assert!(gz.exists());
        assert!(!rotated_path(&config.path, 1, false).exists());

        let mut decoded = Vec::new();
        GzDecoder::new(File::open(gz).unwrap())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, vec![b'x'; 700]);
    }
}
