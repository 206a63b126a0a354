//! Byte sinks that annotation records are written to.
//!
//! The collector detects new annotations by watching its device file, so
//! after every record the sink is flushed and then forced to storage.
//! A flush alone only empties the user-space buffer.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for encoded annotation records.
///
/// Each method maps to one step of emitting a record; the annotator calls
/// them in order while holding its writer lock.
pub trait AnnotationSink: Send {
    /// Append one complete encoded record.
    fn write_record(&mut self, record: &[u8]) -> io::Result<()>;

    /// Push buffered bytes to the underlying file.
    fn flush(&mut self) -> io::Result<()>;

    /// Force written bytes past OS buffering.
    fn sync(&mut self) -> io::Result<()>;
}

/// Buffered, append-only file sink.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Open `path` for appending.
    ///
    /// The file is never created: a missing path means the collector is not
    /// running and the caller should treat annotations as disabled.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// Path this sink was opened on.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AnnotationSink for FileSink {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.writer.write_all(record)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Character devices such as the collector's annotate file have no
    /// fsync handler and report `EINVAL`; once flushed, the bytes have
    /// already reached them.
    fn sync(&mut self) -> io::Result<()> {
        match self.writer.get_ref().sync_all() {
            Err(e) if matches!(e.kind(), ErrorKind::InvalidInput | ErrorKind::Unsupported) => {
                Ok(())
            }
            result => result,
        }
    }
}

/// In-memory sink whose handle can be cloned and inspected.
///
/// Useful for capturing the exact bytes an [`crate::Annotator`] emits.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Take everything written so far, leaving the sink empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buf.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl AnnotationSink for MemorySink {
    fn write_record(&mut self, record: &[u8]) -> io::Result<()> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(record);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}
