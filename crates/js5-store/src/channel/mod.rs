//! Positional byte channels backing the store.
//!
//! The store never keeps a shared seek position: every access names its
//! offset. Reads only need `&self`, so lookups can proceed while the store
//! is borrowed immutably.
//!
//! ## Platform support
//!
//! - Unix: `pread`/`pwrite` through `std::os::unix::fs::FileExt`
//! - Windows: `seek_read`/`seek_write` through `std::os::windows::fs::FileExt`

#[cfg(unix)]
mod platform_unix;
#[cfg(windows)]
mod platform_windows;

#[cfg(unix)]
use platform_unix::{read_at, write_all_at};
#[cfg(windows)]
use platform_windows::{read_at, write_all_at};

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Random-access byte storage
pub trait Channel {
    /// Current length in bytes
    fn len(&self) -> io::Result<u64>;

    /// Whether the channel holds no bytes
    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read into `buf` starting at `offset`, returning the number of bytes
    /// read. Fewer than `buf.len()` bytes are returned only at end of data.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Write all of `buf` at `offset`, extending the channel if needed
    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()>;

    /// Flush buffered writes to the backing storage
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Channel over a file on disk
#[derive(Debug)]
pub struct FileChannel {
    file: File,
    path: PathBuf,
}

impl FileChannel {
    /// Open an existing file for reading and writing
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Ok(Self { file, path })
    }

    /// Create a new empty file, failing if it already exists
    pub fn create_new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        Ok(Self { file, path })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Channel for FileChannel {
    fn len(&self) -> io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match read_at(&self.file, &mut buf[total..], offset + total as u64) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        write_all_at(&self.file, buf, offset)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.sync_data()
    }
}

/// Channel over an in-memory buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryChannel {
    data: Vec<u8>,
}

impl MemoryChannel {
    /// Create an empty channel
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create a channel holding `data`
    pub const fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Borrow the contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the channel, returning its contents
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Channel for MemoryChannel {
    fn len(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let available = self.data.get(start..).unwrap_or_default();
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
        let end = start + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        Ok(())
    }
}
