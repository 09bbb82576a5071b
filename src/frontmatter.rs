//! Splits a post source file into its YAML front matter and its Markdown
//! body. A post is structured as follows:
//!
//! 1. Initial front matter fence (`---` on a line of its own)
//! 2. YAML front matter with a required `title` and optionally `date`,
//!    `tags`, and any other keys
//! 3. Terminal front matter fence (`---`)
//! 4. Post body
//!
//! For example:
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16
//! tags: [greet]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! The front matter is optional: a file whose first line isn't a fence is
//! all body. Once started, though, it must be terminated and must carry a
//! title.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// The structured metadata at the head of a post.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FrontMatter {
    /// The title of the post. Never empty.
    #[serde(default, deserialize_with = "scalar")]
    pub title: Option<String>,

    /// The date of the post, as written.
    #[serde(default, deserialize_with = "scalar")]
    pub date: Option<String>,

    /// The tags associated with the post.
    #[serde(default, deserialize_with = "tags")]
    pub tags: Vec<String>,

    /// Every other key, passed through to the templates.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}

/// A post split into its metadata and its untouched Markdown body.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// `None` when the file has no front matter block.
    pub front_matter: Option<FrontMatter>,
    pub body: String,
}

impl Post {
    /// The front matter title, if there is front matter.
    pub fn title(&self) -> Option<&str> {
        self.front_matter.as_ref().map(FrontMatter::title)
    }
}

/// Reads and parses the post at `path`.
pub fn parse_post(path: &Path) -> Result<Post> {
    parse_str(&std::fs::read_to_string(path)?)
}

/// Parses a post from its source text.
pub fn parse_str(input: &str) -> Result<Post> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    match split(input)? {
        None => Ok(Post {
            front_matter: None,
            body: input.to_owned(),
        }),
        Some((yaml, body)) => {
            if yaml.trim().is_empty() {
                return Err(Error::MissingTitle);
            }
            let front_matter: FrontMatter = serde_yaml::from_str(yaml)?;
            if front_matter.title().trim().is_empty() {
                return Err(Error::MissingTitle);
            }
            Ok(Post {
                front_matter: Some(front_matter),
                body: body.to_owned(),
            })
        }
    }
}

// Returns the YAML block and the body, or `None` if the input doesn't open
// with a fence.
fn split(input: &str) -> Result<Option<(&str, &str)>> {
    const FENCE: &str = "---";

    let mut lines = input.split_inclusive('\n');
    let yaml_start = match lines.next() {
        Some(first) if first.trim_end() == FENCE => first.len(),
        _ => return Ok(None),
    };

    let mut yaml_stop = yaml_start;
    for line in lines {
        if line.trim_end() == FENCE {
            let body_start = yaml_stop + line.len();
            return Ok(Some((&input[yaml_start..yaml_stop], &input[body_start..])));
        }
        yaml_stop += line.len();
    }
    Err(Error::MissingEndFence)
}

// Accepts any YAML scalar as a string so `date: 2021` or `title: 1984` work.
fn scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::String(s) => Ok(Some(s)),
        serde_yaml::Value::Number(n) => Ok(Some(n.to_string())),
        serde_yaml::Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!(
            "expected a scalar, found {:?}",
            other
        ))),
    }
}

// Accepts `tags: [a, b]`, `tags: a`, or an empty `tags:`.
fn tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(Vec::new()),
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .filter_map(|item| scalar(item).transpose())
            .collect::<std::result::Result<Vec<String>, serde_yaml::Error>>()
            .map_err(D::Error::custom),
        single => Ok(scalar(single)
            .map_err(D::Error::custom)?
            .into_iter()
            .collect()),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a post.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the opening fence was found but the closing one wasn't.
    #[error("missing closing `---`")]
    MissingEndFence,

    /// Returned when the front matter has no `title`, or an empty one.
    #[error("missing required field `title`")]
    MissingTitle,

    /// Returned when the front matter isn't valid YAML.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Returned when the post file can't be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
