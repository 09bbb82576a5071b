//! Defines the [`Layout`] of a project root: where drafts, published posts,
//! templates, themes, trashed posts, the two user config files, and the
//! metadata store live relative to the root directory.

use std::path::{Path, PathBuf};

/// The name of the metadata store file at the project root.
pub const DB_FILE: &str = ".db.json";

/// The name of the user-editable site configuration file.
pub const SITE_CONFIG_FILE: &str = "site-config.yaml";

/// The name of the user-editable theme configuration file.
pub const THEME_CONFIG_FILE: &str = "theme-config.yaml";

/// The directory `init` creates when no name is given.
pub const DEFAULT_DIR_NAME: &str = "blog";

/// The directory `generate` writes to when no name is given.
pub const DEFAULT_GENERATE_DIR: &str = "public";

/// The static resources subdirectory of a generated site.
pub const RESOURCES_DIR: &str = "resources";

/// The template used by `new` when none is named.
pub const DEFAULT_TEMPLATE: &str = "default";

/// The placeholder draft `init` creates.
pub const FIRST_POST: &str = "ritsu";

/// The file extension of drafts, posts, and post templates.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Resolves the standard paths below a project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Layout {
        Layout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn drafts(&self) -> PathBuf {
        self.root.join("drafts")
    }

    pub fn posts(&self) -> PathBuf {
        self.root.join("posts")
    }

    pub fn templates(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn themes(&self) -> PathBuf {
        self.root.join("themes")
    }

    pub fn trash(&self) -> PathBuf {
        self.root.join("trash")
    }

    /// All content directories, in the order `init` creates them.
    pub fn content_dirs(&self) -> [PathBuf; 5] {
        [
            self.drafts(),
            self.posts(),
            self.templates(),
            self.themes(),
            self.trash(),
        ]
    }

    pub fn db_file(&self) -> PathBuf {
        self.root.join(DB_FILE)
    }

    pub fn site_config_file(&self) -> PathBuf {
        self.root.join(SITE_CONFIG_FILE)
    }

    pub fn theme_config_file(&self) -> PathBuf {
        self.root.join(THEME_CONFIG_FILE)
    }

    pub fn draft(&self, name: &str) -> PathBuf {
        markdown_file(&self.drafts(), name)
    }

    pub fn post(&self, name: &str) -> PathBuf {
        markdown_file(&self.posts(), name)
    }

    pub fn trashed(&self, name: &str) -> PathBuf {
        markdown_file(&self.trash(), name)
    }

    pub fn template(&self, name: &str) -> PathBuf {
        markdown_file(&self.templates(), name)
    }

    pub fn theme(&self, name: &str) -> PathBuf {
        self.themes().join(name)
    }
}

fn markdown_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, MARKDOWN_EXTENSION))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_post_paths() {
        let layout = Layout::new("/blog");
        assert_eq!(layout.draft("hello"), PathBuf::from("/blog/drafts/hello.md"));
        assert_eq!(layout.post("hello"), PathBuf::from("/blog/posts/hello.md"));
        assert_eq!(layout.trashed("hello"), PathBuf::from("/blog/trash/hello.md"));
        assert_eq!(
            layout.template("default"),
            PathBuf::from("/blog/templates/default.md")
        );
        assert_eq!(layout.db_file(), PathBuf::from("/blog/.db.json"));
    }
}
