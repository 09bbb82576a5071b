//! Defines the crate-level [`Error`] type returned by every lifecycle
//! operation in [`crate::engine`].

use std::path::PathBuf;
use thiserror::Error;

/// The result of a lifecycle operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed lifecycle operation. Each variant renders as a single
/// human-readable line.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when no project root is found at or above the working
    /// directory.
    #[error(
        "not inside a blog directory; run this command in a blog directory or run `ritsu init` first"
    )]
    NotInitialized,

    /// Returned when `init` or `generate` would create a directory that is
    /// already there. The existing directory is never rolled back.
    #[error("`{}` already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Returned when a post name is already used by a draft, a published
    /// post, a trashed post, or a metadata entry.
    #[error("duplicate post name `{0}`")]
    DuplicateName(String),

    /// Returned when a post name or a directory name passed to `init` or
    /// `generate` is empty, `.`, `..`, or contains a path separator.
    #[error("invalid name `{0}`")]
    InvalidName(String),

    /// Returned when the referenced draft or published post is absent.
    #[error("post `{0}` does not exist")]
    NotFound(String),

    /// Returned when `new --template` names a template that doesn't exist.
    #[error("template `{0}` does not exist")]
    TemplateNotFound(String),

    /// Returned when deleting a post whose name is already taken in the
    /// trash directory.
    #[error("a post named `{0}` already exists in the trash directory")]
    TrashCollision(String),

    /// Returned when a post's front matter is started but malformed.
    #[error("malformed front matter in `{}`: {err}", path.display())]
    MalformedFrontMatter {
        path: PathBuf,
        err: crate::frontmatter::Error,
    },

    /// Returned when a required external command is not installed.
    #[error("`{0}` is not installed; see https://git-scm.com/downloads")]
    MissingTool(String),

    /// Returned when the external theme fetch fails. `init` reports it as a
    /// warning and keeps the new project.
    #[error("fetching theme: {0}")]
    ThemeFetch(String),

    /// Returned when `publish --date` can't be parsed.
    #[error("invalid date `{0}`; expected YYYY-MM-DD or RFC 3339")]
    InvalidDate(String),

    /// Returned when a user config file is missing or can't be parsed.
    #[error("config file `{}`: {err}", path.display())]
    Config {
        path: PathBuf,
        err: crate::config::Error,
    },

    /// Returned when the metadata store can't be read or written.
    #[error("metadata store `{}`: {err}", path.display())]
    Store {
        path: PathBuf,
        err: crate::store::Error,
    },

    /// Returned for errors rendering the site.
    #[error(transparent)]
    Render(crate::render::Error),

    /// Returned for other I/O errors.
    #[error("{context}: {err}")]
    Io {
        context: String,
        err: std::io::Error,
    },
}

impl Error {
    /// Annotates an [`std::io::Error`] with what was being done.
    pub fn io(context: impl Into<String>, err: std::io::Error) -> Error {
        Error::Io {
            context: context.into(),
            err,
        }
    }

    /// Reports whether this is the expected path collision that must not
    /// trigger a rollback.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists(_))
    }

    /// Classifies a failure to parse the post at `path`. Read failures stay
    /// I/O errors; everything else is malformed front matter.
    pub fn front_matter(path: PathBuf, err: crate::frontmatter::Error) -> Error {
        match err {
            crate::frontmatter::Error::Io(err) => Error::Io {
                context: format!("reading `{}`", path.display()),
                err,
            },
            err => Error::MalformedFrontMatter { path, err },
        }
    }
}

impl From<crate::render::Error> for Error {
    /// Converts render errors into [`Error`], lifting post parse failures
    /// into [`Error::MalformedFrontMatter`].
    fn from(err: crate::render::Error) -> Error {
        match err {
            crate::render::Error::Parse { path, err } => Error::front_matter(path, err),
            err => Error::Render(err),
        }
    }
}
