//! The lifecycle operations: [`init`], [`new_post`], [`publish`], [`delete`],
//! and [`generate`].
//!
//! Every operation but `init` starts by opening a [`Project`]: it resolves the
//! project root from the caller's working directory and loads the metadata
//! store from disk. That context is the single source of truth for the rest
//! of the operation and is passed along explicitly; nothing is cached between
//! operations.
//!
//! A post lives in exactly one of `drafts/`, `posts/`, or `trash/`. `publish`
//! moves it from drafts to posts and appends a store entry; `delete` moves it
//! from posts to trash and removes the entry. Only `init` and `generate`,
//! which create a new top-level directory, roll back on failure, by removing
//! that directory.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{self, DEFAULT_POST_TEMPLATE, DEFAULT_SITE_CONFIG, DEFAULT_THEME_CONFIG};
use crate::error::{Error, Result};
use crate::frontmatter;
use crate::layout::{self, Layout};
use crate::render::Renderer;
use crate::root::{self, OsProbe};
use crate::store::{self, PostEntry, Record};
use crate::theme::{ThemeFetcher, DEFAULT_THEME};

/// The state of one operation on an initialized project: where its root is
/// and what its metadata store held when the operation began.
#[derive(Debug)]
pub struct Project {
    pub layout: Layout,
    pub record: Record,
}

impl Project {
    /// Finds the project enclosing `cwd` and loads its metadata store.
    pub fn open(cwd: &Path) -> Result<Project> {
        let root = root::find_root(&OsProbe, cwd)
            .map_err(|e| Error::io("searching for the blog directory", e))?
            .ok_or(Error::NotInitialized)?;
        let layout = Layout::new(root);
        let record = store::load(layout.root()).map_err(|err| Error::Store {
            path: layout.db_file(),
            err,
        })?;
        Ok(Project { layout, record })
    }

    /// Writes the record back to the metadata store, replacing it.
    pub fn save(&self) -> Result<()> {
        store::save(self.layout.root(), &self.record).map_err(|err| Error::Store {
            path: self.layout.db_file(),
            err,
        })
    }
}

/// Creates a new blog in `cwd/dir_name` (default [`layout::DEFAULT_DIR_NAME`])
/// and returns its root. Anything created is removed again if a step fails,
/// except when the directory already existed. A theme that can't be fetched
/// is only a warning; a missing `git` is an error.
pub fn init(cwd: &Path, dir_name: Option<&str>, fetcher: &dyn ThemeFetcher) -> Result<PathBuf> {
    let dir_name = dir_name.unwrap_or(layout::DEFAULT_DIR_NAME);
    validate_name(dir_name)?;
    let root = cwd.join(dir_name);
    if root.exists() {
        return Err(Error::AlreadyExists(root));
    }

    info!("Initializing...");
    if let Err(e) = scaffold(&root, fetcher) {
        abort(&root, &e);
        return Err(e);
    }
    info!("Blog successfully initialized! You can start writing :)");
    Ok(root)
}

fn scaffold(root: &Path, fetcher: &dyn ThemeFetcher) -> Result<()> {
    let layout = Layout::new(root);
    create_dir(root)?;
    for dir in layout.content_dirs() {
        create_dir(&dir)?;
    }
    write(&layout.site_config_file(), DEFAULT_SITE_CONFIG)?;
    write(&layout.theme_config_file(), DEFAULT_THEME_CONFIG)?;
    write(
        &layout.template(layout::DEFAULT_TEMPLATE),
        DEFAULT_POST_TEMPLATE,
    )?;

    let (site, theme) = config::default_snapshots().map_err(|err| Error::Config {
        path: PathBuf::from(layout::SITE_CONFIG_FILE),
        err,
    })?;
    let project = Project {
        record: Record::new(root.to_owned(), site, theme),
        layout,
    };
    project.save()?;

    create_draft(&project, layout::FIRST_POST, None)?;

    info!("Fetching theme...");
    match fetcher.fetch(&project.layout.theme(DEFAULT_THEME)) {
        Err(Error::ThemeFetch(msg)) => {
            warn!("could not fetch the `{}` theme: {}", DEFAULT_THEME, msg);
            warn!(
                "install a theme under {} before running `ritsu generate`",
                project.layout.themes().display()
            );
            Ok(())
        }
        result => result,
    }
}

/// Creates the draft `drafts/<name>.md` from `template` (or the default
/// template) and returns its path.
pub fn new_post(cwd: &Path, name: &str, template: Option<&str>) -> Result<PathBuf> {
    let project = Project::open(cwd)?;
    info!("Creating new post...");
    let draft = create_draft(&project, name, template)?;
    info!("New post `{}` created at {}.", name, draft.display());
    info!("Run `ritsu publish {}` when you finish writing.", name);
    Ok(draft)
}

fn create_draft(project: &Project, name: &str, template: Option<&str>) -> Result<PathBuf> {
    validate_name(name)?;
    let layout = &project.layout;
    if layout.draft(name).exists()
        || layout.post(name).exists()
        || layout.trashed(name).exists()
        || project.record.is_duplicate(name)
    {
        return Err(Error::DuplicateName(name.to_owned()));
    }

    let source = match template {
        Some(template) => {
            let path = layout.template(template);
            if validate_name(template).is_err() || !path.is_file() {
                return Err(Error::TemplateNotFound(template.to_owned()));
            }
            path
        }
        None => {
            let path = layout.template(layout::DEFAULT_TEMPLATE);
            if !path.exists() {
                create_dir(&layout.templates())?;
                write(&path, DEFAULT_POST_TEMPLATE)?;
            }
            path
        }
    };

    let draft = layout.draft(name);
    create_dir(&layout.drafts())?;
    fs::copy(&source, &draft).map_err(|e| {
        Error::io(
            format!("copying `{}` to `{}`", source.display(), draft.display()),
            e,
        )
    })?;
    Ok(draft)
}

/// Moves the draft `name` into `posts/` and records it as published at
/// `date` (default: now). The draft's front matter is checked before
/// anything moves.
pub fn publish(cwd: &Path, name: &str, date: Option<&str>) -> Result<PostEntry> {
    let mut project = Project::open(cwd)?;
    validate_name(name)?;
    let draft = project.layout.draft(name);
    if !draft.is_file() {
        return Err(Error::NotFound(name.to_owned()));
    }
    let published = project.layout.post(name);
    if published.exists()
        || project.layout.trashed(name).exists()
        || project.record.is_duplicate(name)
    {
        return Err(Error::DuplicateName(name.to_owned()));
    }
    let date = parse_date(date)?;

    info!("Processing...");
    let post = frontmatter::parse_post(&draft).map_err(|err| Error::front_matter(draft.clone(), err))?;
    let entry = PostEntry {
        file_name: name.to_owned(),
        title: post.title().unwrap_or(name).to_owned(),
        date,
    };

    create_dir(&project.layout.posts())?;
    rename(&draft, &published)?;
    project.record.push(entry.clone());
    project.save()?;

    info!("Successfully published your post `{}`.", name);
    info!("Run `ritsu generate` to build your blog.");
    Ok(entry)
}

/// Moves the published post `name` into `trash/` and drops its store entry.
pub fn delete(cwd: &Path, name: &str) -> Result<()> {
    let mut project = Project::open(cwd)?;
    validate_name(name)?;
    let published = project.layout.post(name);
    if !published.is_file() {
        return Err(Error::NotFound(name.to_owned()));
    }
    let trashed = project.layout.trashed(name);
    if trashed.exists() {
        return Err(Error::TrashCollision(name.to_owned()));
    }
    if !project.record.is_duplicate(name) {
        return Err(Error::NotFound(name.to_owned()));
    }

    info!("Deleting...");
    create_dir(&project.layout.trash())?;
    rename(&published, &trashed)?;
    project.record.remove(name);
    project.save()?;

    info!(
        "Successfully deleted your post `{}`; you can still find it in {}.",
        name,
        project.layout.trash().display()
    );
    info!(
        "To restore it, move it to {} and publish it again.",
        project.layout.drafts().display()
    );
    Ok(())
}

/// Renders every published post into a new directory `dir_name` (default
/// [`layout::DEFAULT_GENERATE_DIR`]) under the project root and returns its
/// path. The directory is removed again if rendering fails.
pub fn generate(cwd: &Path, dir_name: Option<&str>) -> Result<PathBuf> {
    let project = Project::open(cwd)?;
    let dir_name = dir_name.unwrap_or(layout::DEFAULT_GENERATE_DIR);
    validate_name(dir_name)?;
    let config = config::resolve(&project.layout)?;
    let output = project.layout.root().join(dir_name);
    if output.exists() {
        return Err(Error::AlreadyExists(output));
    }

    info!("Generating...");
    let result = (|| -> Result<()> {
        create_dir(&output)?;
        create_dir(&output.join(layout::RESOURCES_DIR))?;
        let theme = project.layout.theme(&config.site.theme);
        Renderer {
            config: &config,
            posts_source_directory: &project.layout.posts(),
            theme_directory: &theme,
            output_directory: &output,
        }
        .render(&project.record.file_names())?;
        Ok(())
    })();
    if let Err(e) = result {
        abort(&output, &e);
        return Err(e);
    }

    info!("Blog successfully generated in {}.", output.display());
    Ok(output)
}

// Removes a directory this invocation created. A pre-existing directory
// (`AlreadyExists`) is never touched.
fn abort(created: &Path, err: &Error) {
    if err.is_already_exists() || !created.exists() {
        return;
    }
    warn!("Reverting changes...");
    if let Err(e) = fs::remove_dir_all(created) {
        warn!("could not remove {}: {}", created.display(), e);
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| c == '/' || c == '\\')
    {
        return Err(Error::InvalidName(name.to_owned()));
    }
    Ok(())
}

// Accepts RFC 3339 or a plain `YYYY-MM-DD` (midnight UTC). Returns epoch
// milliseconds.
fn parse_date(date: Option<&str>) -> Result<i64> {
    let date = match date {
        None => return Ok(Utc::now().timestamp_millis()),
        Some(date) => date.trim(),
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Ok(dt.timestamp_millis());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp_millis())
        .ok_or_else(|| Error::InvalidDate(date.to_owned()))
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(format!("creating `{}`", path.display()), e))
}

fn write(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| Error::io(format!("writing `{}`", path.display()), e))
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| {
        Error::io(
            format!("moving `{}` to `{}`", from.display(), to.display()),
            e,
        )
    })
}
