//! Renders published posts into a static site. The pipeline is:
//!
//! 1. Load the theme's templates ([`Theme::load`])
//! 2. Parse every published post (front matter and Markdown body)
//! 3. Write one page per post, then the index pages if the theme has them
//! 4. Copy the theme's static resources
//!
//! Every post is parsed before anything is written, and the first failure
//! aborts the whole render. Cleaning up a partially written output directory
//! is the caller's job.
//!
//! Templates use Go template syntax ([`gtmpl`]). A page template is composed
//! by concatenating the theme's shell (`layout.html`) with a partial
//! (`post.html` or `index.html`) that defines `content`. See [`Page::to_value`]
//! for the values available to templates.

use gtmpl::{Template, Value};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::EffectiveConfig;
use crate::frontmatter;
use crate::layout::{MARKDOWN_EXTENSION, RESOURCES_DIR};
use crate::markdown;

/// The parsed templates and resource directory of a theme.
pub struct Theme {
    /// Shell + post partial.
    post: Template,

    /// Shell + index partial, if the theme ships one.
    index: Option<Template>,

    /// The theme's static resources directory (may not exist).
    resources: PathBuf,
}

impl Theme {
    const TEMPLATES_DIR: &'static str = "templates";
    const LAYOUT: &'static str = "layout.html";
    const POST: &'static str = "post.html";
    const INDEX: &'static str = "index.html";

    /// Loads the theme rooted at `dir`.
    pub fn load(dir: &Path) -> Result<Theme> {
        if !dir.is_dir() {
            return Err(Error::MissingTheme(dir.to_owned()));
        }
        let templates = dir.join(Self::TEMPLATES_DIR);
        let layout = templates.join(Self::LAYOUT);
        let index = templates.join(Self::INDEX);
        Ok(Theme {
            post: parse_template([&layout, &templates.join(Self::POST)].iter())?,
            index: match index.is_file() {
                true => Some(parse_template([&layout, &index].iter())?),
                false => None,
            },
            resources: dir.join(RESOURCES_DIR),
        })
    }
}

/// Renders a set of published posts with a theme.
pub struct Renderer<'a> {
    /// The configuration exposed to templates and used for output paths.
    pub config: &'a EffectiveConfig,

    /// The directory holding the published post sources.
    pub posts_source_directory: &'a Path,

    /// The theme to render with.
    pub theme_directory: &'a Path,

    /// The site output directory. It must already exist, as must its
    /// resources subdirectory.
    pub output_directory: &'a Path,
}

impl Renderer<'_> {
    /// Renders the posts named in `file_names`, in that order.
    pub fn render(&self, file_names: &[String]) -> Result<()> {
        let theme = Theme::load(self.theme_directory)?;
        let posts = file_names
            .iter()
            .map(|name| self.parse(name))
            .collect::<Result<Vec<Post>>>()?;

        let mut pages: Vec<Page> = post_pages(&posts, &theme.post).collect();
        if let Some(index_template) = &theme.index {
            let page_size = self.config.theme.posts_per_page();
            pages.extend(index_pages(
                &posts,
                &self.config.site.page_dir,
                page_size,
                index_template,
            ));
        }
        check_collisions(&pages)?;

        let globals = self.globals()?;
        for page in &pages {
            self.write_page(page, &globals)?;
        }

        if theme.resources.is_dir() {
            copy_dir(&theme.resources, &self.output_directory.join(RESOURCES_DIR))?;
        }
        Ok(())
    }

    fn parse(&self, name: &str) -> Result<Post> {
        let path = self
            .posts_source_directory
            .join(format!("{}.{}", name, MARKDOWN_EXTENSION));
        let source = frontmatter::parse_post(&path).map_err(|err| Error::Parse {
            path: path.clone(),
            err,
        })?;

        let mut body = String::new();
        markdown::to_html(&mut body, &source.body);

        let front_matter = source.front_matter.unwrap_or_else(|| frontmatter::FrontMatter {
            title: None,
            date: None,
            tags: Vec::new(),
            extra: Default::default(),
        });
        Ok(Post {
            name: name.to_owned(),
            title: front_matter.title.unwrap_or_else(|| name.to_owned()),
            date: front_matter.date.unwrap_or_default(),
            url: join_url(&self.config.site.post_dir, &format!("{}.html", name)),
            tags: front_matter.tags,
            meta: front_matter.extra,
            body,
        })
    }

    // The values shared by every page: `site` and `theme`.
    fn globals(&self) -> Result<HashMap<String, Value>> {
        let mut m = HashMap::new();
        m.insert(
            "site".to_owned(),
            yaml_to_value(&serde_yaml::to_value(&self.config.site)?),
        );
        m.insert(
            "theme".to_owned(),
            yaml_to_value(&serde_yaml::to_value(&self.config.theme)?),
        );
        Ok(m)
    }

    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page, globals: &HashMap<String, Value>) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.extend(globals.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let file_path = self.output_directory.join(&page.url);
        if let Some(dir) = file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        tracing::debug!("writing {}", file_path.display());

        let context = gtmpl::Context::from(value).map_err(|e| Error::Template(e.to_string()))?;
        page.template
            .execute(&mut File::create(&file_path)?, &context)
            .map_err(|e| Error::Template(format!("rendering `{}`: {}", page.url, e)))
    }
}

/// A published post, parsed and converted to HTML.
struct Post {
    name: String,
    title: String,
    date: String,
    tags: Vec<String>,
    meta: std::collections::BTreeMap<String, serde_yaml::Value>,

    /// The rendered HTML body.
    body: String,

    /// The page's location relative to the output root.
    url: String,
}

impl Post {
    /// Converts the post into a template [`Value`] with fields `name`,
    /// `title`, `date`, `url`, `tags`, `meta`, and `body`.
    fn to_value(&self) -> Value {
        let mut m = self.common_fields();
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        Value::Object(m)
    }

    /// Like [`Post::to_value`], but `body` is replaced by `summary` (the
    /// body up to the fold) and `summarized` (whether there was a fold).
    fn summarize(&self) -> Value {
        let (summary, summarized) = markdown::summary(&self.body);
        let mut m = self.common_fields();
        m.insert("summary".to_owned(), Value::String(summary.to_owned()));
        m.insert("summarized".to_owned(), Value::Bool(summarized));
        Value::Object(m)
    }

    fn common_fields(&self) -> HashMap<String, Value> {
        let mut m = HashMap::new();
        m.insert("name".to_owned(), Value::String(self.name.clone()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("date".to_owned(), Value::String(self.date.clone()));
        m.insert("url".to_owned(), Value::String(self.url.clone()));
        m.insert(
            "tags".to_owned(),
            Value::Array(self.tags.iter().map(|t| tag_to_value(t)).collect()),
        );
        m.insert(
            "meta".to_owned(),
            Value::Object(
                self.meta
                    .iter()
                    .map(|(k, v)| (k.clone(), yaml_to_value(v)))
                    .collect(),
            ),
        );
        m
    }
}

fn tag_to_value(tag: &str) -> Value {
    let mut m = HashMap::new();
    m.insert("tag".to_owned(), Value::String(tag.to_owned()));
    m.insert("slug".to_owned(), Value::String(slug::slugify(tag)));
    Value::Object(m)
}

/// An output HTML file. A [`Page`] can be converted to a [`Value`] and thus
/// rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page, exposed under `key`.
    key: &'static str,
    item: Value,

    /// The page's location relative to the output root.
    url: String,

    /// The URL for the previous page, if any.
    prev: Option<String>,

    /// The URL for the next page, if any.
    next: Option<String>,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value::Object`] with the item under its
    /// key (`post` or `posts`), `url`, `prev`, `next`, `root` (the relative
    /// path from this page back to the output root, e.g. `../`), and
    /// `resources` (the relative path to the resources directory). `url`,
    /// `prev`, and `next` are relative to the output root.
    fn to_value(&self) -> Value {
        let option_to_value = |opt: &Option<String>| match opt {
            Some(url) => Value::String(url.to_owned()),
            None => Value::Nil,
        };
        let root = relative_root(&self.url);

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(self.key.to_owned(), self.item.clone());
        m.insert("url".to_owned(), Value::String(self.url.clone()));
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        m.insert(
            "resources".to_owned(),
            Value::String(format!("{}{}/", root, RESOURCES_DIR)),
        );
        m.insert("root".to_owned(), Value::String(root));
        Value::Object(m)
    }
}

/// Creates a post [`Page`] for each post, linked to its neighbours in
/// publish order.
fn post_pages<'a>(posts: &'a [Post], template: &'a Template) -> impl Iterator<Item = Page<'a>> {
    posts.iter().enumerate().map(move |(i, post)| Page {
        key: "post",
        item: post.to_value(),
        url: post.url.clone(),
        prev: match i < 1 {
            true => None,
            false => Some(posts[i - 1].url.clone()),
        },
        next: posts.get(i + 1).map(|p| p.url.clone()),
        template,
    })
}

/// Splits the posts into index pages of `page_size` posts each. The first
/// page is `index.html`; page `n` is `{page_dir}/{n}.html`. A site with no
/// posts still gets an (empty) `index.html`.
fn index_pages<'a>(
    posts: &[Post],
    page_dir: &str,
    page_size: usize,
    template: &'a Template,
) -> Vec<Page<'a>> {
    let page_url = |i: usize| match i {
        0 => String::from("index.html"),
        _ => join_url(page_dir, &format!("{}.html", i)),
    };

    let chunks: Vec<&[Post]> = match posts.is_empty() {
        true => vec![posts],
        false => posts.chunks(page_size).collect(),
    };
    let total_pages = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| Page {
            key: "posts",
            item: Value::Array(chunk.iter().map(Post::summarize).collect()),
            url: page_url(i),
            prev: match i {
                0 => None,
                _ => Some(page_url(i - 1)),
            },
            next: match i + 1 < total_pages {
                true => Some(page_url(i + 1)),
                false => None,
            },
            template,
        })
        .collect()
}

// Two pages with the same URL would overwrite each other, e.g. post `1` and
// the second index page when `postDir` and `pageDir` are the same.
fn check_collisions(pages: &[Page]) -> Result<()> {
    let mut seen = HashSet::new();
    for page in pages {
        if !seen.insert(page.url.as_str()) {
            return Err(Error::DuplicateOutput(page.url.clone()));
        }
    }
    Ok(())
}

fn join_url(dir: &str, file: &str) -> String {
    let dir = dir.trim_matches('/');
    match dir.is_empty() {
        true => file.to_owned(),
        false => format!("{}/{}", dir, file),
    }
}

// `a/b/page.html` -> `../../`
fn relative_root(url: &str) -> String {
    "../".repeat(url.matches('/').count())
}

/// Converts YAML into a template [`Value`]. Numbers become strings, since
/// templates only print them.
fn yaml_to_value(v: &serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match v {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => Value::String(n.to_string()),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => Value::Array(items.iter().map(yaml_to_value).collect()),
        Yaml::Mapping(m) => Value::Object(
            m.iter()
                .filter_map(|(k, v)| match k {
                    Yaml::String(k) => Some((k.clone(), yaml_to_value(v))),
                    Yaml::Number(n) => Some((n.to_string(), yaml_to_value(v))),
                    _ => None,
                })
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

// Loads the template file contents, concatenates them in order, and parses
// the result into a single template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        let text = std::fs::read_to_string(template_file).map_err(|e| Error::OpenTemplateFile {
            path: template_file.to_owned(),
            err: e,
        })?;
        contents.push_str(&text);
        contents.push('\n');
    }

    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|e| Error::Template(e.to_string()))?;
    Ok(template)
}

// Copies the contents of `src` into `dst`, creating `dst` if needed.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    use walkdir::WalkDir;
    for result in WalkDir::new(src) {
        let entry = result?;
        // strip_prefix shouldn't fail since `src` is always an ancestor of
        // `entry`
        let target = match entry.path().strip_prefix(src) {
            Ok(relative) => dst.join(relative),
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// The result of a fallible render operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering the site.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a published post can't be parsed.
    #[error("parsing post `{}`: {err}", path.display())]
    Parse {
        path: PathBuf,
        err: frontmatter::Error,
    },

    /// Returned when two pages would be written to the same output path.
    #[error("more than one page would be written to `{0}`")]
    DuplicateOutput(String),

    /// Returned when the configured theme directory doesn't exist.
    #[error("theme directory `{}` not found", .0.display())]
    MissingTheme(PathBuf),

    /// Returned for I/O problems while opening template files.
    #[error("opening template file `{}`: {err}", path.display())]
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing or executing templates.
    #[error("template: {0}")]
    Template(String),

    /// Returned when the configuration can't be exposed to templates.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] io::Error),
}
