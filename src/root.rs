//! Locates the project root: the nearest directory at or above a starting
//! path that contains the metadata store file ([`crate::layout::DB_FILE`]).
//!
//! The search is a pure function of a start path and a [`Probe`], which
//! answers existence questions. [`OsProbe`] asks the real filesystem; tests
//! substitute an in-memory probe.

use std::io;
use std::path::{Path, PathBuf};

use crate::layout::DB_FILE;

/// Answers whether a file exists. Anything other than a clean "yes" or "no"
/// is an error and is reported to the caller without retrying.
pub trait Probe {
    fn is_file(&self, path: &Path) -> io::Result<bool>;
}

/// A [`Probe`] backed by [`std::fs::metadata`].
pub struct OsProbe;

impl Probe for OsProbe {
    fn is_file(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) => match e.kind() {
                io::ErrorKind::NotFound => Ok(false),
                _ => Err(e),
            },
        }
    }
}

/// Walks upward from `start` (inclusive) and returns the first directory
/// containing the store file, or `None` once the filesystem root has been
/// checked. `start` should be absolute; a relative path stops at its first
/// component.
pub fn find_root<P: Probe + ?Sized>(probe: &P, start: &Path) -> io::Result<Option<PathBuf>> {
    let mut dir = start;
    loop {
        if probe.is_file(&dir.join(DB_FILE))? {
            return Ok(Some(dir.to_owned()));
        }
        match dir.parent() {
            Some(parent) if parent != dir => dir = parent,
            _ => return Ok(None),
        }
    }
}
