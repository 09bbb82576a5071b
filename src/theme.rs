//! Fetches a theme into `themes/<name>/` while a project is initialized.
//!
//! [`GitFetcher`] clones a repository with the `git` command-line tool. The
//! engine takes any [`ThemeFetcher`], so tests can install a theme without a
//! network or a `git` binary.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// The theme `init` installs.
pub const DEFAULT_THEME: &str = "notes";

/// Where the default theme is cloned from.
pub const DEFAULT_THEME_REPO: &str = "https://github.com/ritsu-blog/theme-notes.git";

/// Installs a theme into a destination directory that doesn't exist yet.
pub trait ThemeFetcher {
    fn fetch(&self, dest: &Path) -> Result<()>;
}

/// Clones a theme repository with `git`.
pub struct GitFetcher {
    pub repo: String,
}

impl GitFetcher {
    const GIT: &'static str = "git";

    pub fn new(repo: impl Into<String>) -> GitFetcher {
        GitFetcher { repo: repo.into() }
    }
}

impl Default for GitFetcher {
    fn default() -> Self {
        GitFetcher::new(DEFAULT_THEME_REPO)
    }
}

impl ThemeFetcher for GitFetcher {
    fn fetch(&self, dest: &Path) -> Result<()> {
        let git = which::which(Self::GIT).map_err(|_| Error::MissingTool(Self::GIT.to_owned()))?;
        tracing::debug!("cloning {} into {}", self.repo, dest.display());

        let output = Command::new(git)
            .arg("clone")
            .arg("--depth=1")
            .arg(&self.repo)
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::io("running git", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ThemeFetch(
                stderr
                    .lines()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("git clone failed")
                    .trim()
                    .to_owned(),
            ));
        }
        Ok(())
    }
}
