//! # Signature File Locking
//!
//! Two signers appending to the same signature file would interleave
//! records and break every later block. The signer holds an exclusive
//! advisory lock on the file for as long as it is open.
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on Windows).

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "locking")]
use fs2::FileExt;

use crate::domain::errors::{Result, SigError};

/// Signature file opened for appending, exclusively locked.
///
/// Released on drop (RAII).
#[derive(Debug)]
pub struct LockedSigFile {
    file: File,
    path: PathBuf,
    /// Bytes accepted before writes start failing.
    #[cfg(test)]
    write_budget: Option<usize>,
}

impl LockedSigFile {
    /// Open (creating if needed) and lock the file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be opened or another handle holds the lock.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| SigError::io(e, format!("opening {}", path.display())))?;

        #[cfg(feature = "locking")]
        file.try_lock_exclusive().map_err(|e| {
            SigError::io(
                e,
                format!("{} is locked by another signer", path.display()),
            )
        })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            #[cfg(test)]
            write_budget: None,
        })
    }

    /// Path of the locked file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file length.
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// True for a zero-length file.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Read the whole file from the start.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Cut the file back to `len` bytes; later writes still append.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file
            .set_len(len)
            .map_err(|e| SigError::io(e, format!("truncating {}", self.path.display())))
    }

    /// Flush file data to the device.
    pub fn sync(&self) -> Result<()> {
        self.file
            .sync_data()
            .map_err(|e| SigError::io(e, format!("syncing {}", self.path.display())))
    }

    /// Accept `budget` more bytes, then fail every write; `None` lifts the limit.
    #[cfg(test)]
    pub(crate) fn set_write_budget(&mut self, budget: Option<usize>) {
        self.write_budget = budget;
    }
}

impl Write for LockedSigFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        #[cfg(test)]
        {
            if let Some(budget) = self.write_budget.as_mut() {
                if *budget == 0 {
                    return Err(io::Error::other("device full"));
                }
                let n = self.file.write(&buf[..buf.len().min(*budget)])?;
                *budget -= n;
                return Ok(n);
            }
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Drop for LockedSigFile {
    fn drop(&mut self) {
        #[cfg(feature = "locking")]
        #[allow(clippy::incompatible_msrv)]
        let _ = FileExt::unlock(&self.file);
    }
}
