//! File sinks.
//!
//! The composition layer never opens files itself; it asks a
//! [`WriteSinkFactory`] for a consumer node. [`FsSinkFactory`] is the
//! filesystem-backed default.

use crate::error::{ResultExt, StreamResult};
use crate::pipeline::nodes::write_sink::WriteSink;
use crate::stream::{Mode, Sink, StreamRef};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

/// How output files are opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSinkOptions {
    /// Append to an existing file instead of truncating it.
    pub append: bool,
    /// Create missing parent directories.
    pub create_dirs: bool,
    /// Size of the write buffer in bytes.
    pub buffer_capacity: usize,
}

impl Default for FileSinkOptions {
    fn default() -> Self {
        Self {
            append: false,
            create_dirs: true,
            buffer_capacity: 8 * 1024,
        }
    }
}

/// Creates consumer-only nodes that write to a path.
#[cfg_attr(test, mockall::automock)]
pub trait WriteSinkFactory {
    fn create_write_sink(&self, path: &Path, options: &FileSinkOptions) -> StreamResult<StreamRef>;
}

/// Opens real files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSinkFactory;

impl WriteSinkFactory for FsSinkFactory {
    fn create_write_sink(&self, path: &Path, options: &FileSinkOptions) -> StreamResult<StreamRef> {
        if options.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory {}", parent.display())
                })?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(options.append)
            .truncate(!options.append)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        tracing::info!("Writing to {}", path.display());
        let writer = BufWriter::with_capacity(options.buffer_capacity.max(1), file);
        let name = format!("File({})", path.display());
        Ok(Sink::new(name, WriteSink::new(Box::new(writer)), Mode::data()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{scheduler, Chunk, Source};
    use tempfile::tempdir;

    fn write_through(sink: &StreamRef, chunks: Vec<&'static str>) {
        let source: StreamRef = Source::from_chunks("src", false, chunks.into_iter().map(Chunk::from));
        source.core().native_pipe(sink).unwrap();
        scheduler::run();
    }

    #[test]
    fn test_creates_parent_dirs_and_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        let sink = FsSinkFactory
            .create_write_sink(&path, &FileSinkOptions::default())
            .unwrap();
        write_through(&sink, vec!["hello ", "world"]);

        assert!(sink.core().is_complete());
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn test_append_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "a").unwrap();

        let options = FileSinkOptions {
            append: true,
            ..Default::default()
        };
        let sink = FsSinkFactory.create_write_sink(&path, &options).unwrap();
        write_through(&sink, vec!["b"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "ab");
    }

    #[test]
    fn test_missing_dir_without_create_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent/out.txt");
        let options = FileSinkOptions {
            create_dirs: false,
            ..Default::default()
        };
        let err = FsSinkFactory.create_write_sink(&path, &options).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }

    #[test]
    fn test_options_from_toml_use_defaults() {
        let options: FileSinkOptions = toml::from_str("append = true").unwrap();
        assert!(options.append);
        assert!(options.create_dirs);
        assert_eq!(options.buffer_capacity, 8 * 1024);
    }
}
