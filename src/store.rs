//! Defines the metadata store: a JSON file at the project root that records
//! the root path, snapshots of the shipped default configs taken at `init`,
//! and the ordered list of published posts.
//!
//! The store is always read and written whole. There is no locking; a single
//! writer is assumed.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::layout::DB_FILE;

/// One published post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEntry {
    /// The post's name, i.e. its file stem in `posts/`.
    pub file_name: String,

    /// The title taken from the post's front matter at publish time.
    pub title: String,

    /// Publication time in milliseconds since the Unix epoch.
    pub date: i64,
}

/// The full contents of the metadata store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub root_path: PathBuf,
    pub default_site_config: serde_json::Value,
    pub default_theme_config: serde_json::Value,

    /// Published posts in publish order.
    #[serde(default)]
    pub post_data: Vec<PostEntry>,
}

impl Record {
    /// Creates an empty record for a freshly initialized root.
    pub fn new(
        root_path: PathBuf,
        default_site_config: serde_json::Value,
        default_theme_config: serde_json::Value,
    ) -> Record {
        Record {
            root_path,
            default_site_config,
            default_theme_config,
            post_data: Vec::new(),
        }
    }

    /// Reports whether a published entry named `file_name` exists.
    pub fn is_duplicate(&self, file_name: &str) -> bool {
        self.post_data.iter().any(|p| p.file_name == file_name)
    }

    /// Appends an entry. Callers check [`Record::is_duplicate`] first.
    pub fn push(&mut self, entry: PostEntry) {
        self.post_data.push(entry);
    }

    /// Removes and returns the entry named `file_name`, if any.
    pub fn remove(&mut self, file_name: &str) -> Option<PostEntry> {
        let i = self.post_data.iter().position(|p| p.file_name == file_name)?;
        Some(self.post_data.remove(i))
    }

    /// The names of all published posts, in publish order.
    pub fn file_names(&self) -> Vec<String> {
        self.post_data.iter().map(|p| p.file_name.clone()).collect()
    }
}

/// Reads the store file in `root`.
pub fn load(root: &Path) -> Result<Record> {
    let file = File::open(root.join(DB_FILE))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Overwrites the store file in `root` with `record`.
pub fn save(root: &Path, record: &Record) -> Result<()> {
    let mut w = BufWriter::new(File::create(root.join(DB_FILE))?);
    serde_json::to_writer_pretty(&mut w, record)?;
    w.flush()?;
    Ok(())
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading or writing the store.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for I/O errors on the store file.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Returned when the store isn't valid JSON or doesn't match [`Record`].
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
