//! Loads the user-editable site and theme configuration files into an
//! [`EffectiveConfig`], and carries the shipped defaults that `init` seeds
//! those files with.
//!
//! The shipped defaults are only ever used to seed a new project and to take
//! the snapshots kept in the metadata store. A missing or broken user config
//! file is an error, never a silent fallback.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::layout::Layout;

/// The shipped site configuration, written to `site-config.yaml` by `init`.
pub const DEFAULT_SITE_CONFIG: &str = include_str!("../assets/site-config.yaml");

/// The shipped theme configuration, written to `theme-config.yaml` by `init`.
pub const DEFAULT_THEME_CONFIG: &str = include_str!("../assets/theme-config.yaml");

/// The shipped post template, materialized as `templates/default.md`.
pub const DEFAULT_POST_TEMPLATE: &str = include_str!("../assets/default.md");

/// Site-level configuration (`site-config.yaml`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub site_name: String,

    #[serde(default)]
    pub site_description: Option<String>,

    pub author: String,

    #[serde(default)]
    pub site_icon: Option<String>,

    #[serde(default)]
    pub create_time: String,

    #[serde(default)]
    pub avatar: Option<String>,

    #[serde(default)]
    pub personal_page: Option<String>,

    /// The directory under `themes/` to render with.
    pub theme: String,

    #[serde(default)]
    pub root_dir: String,

    /// Output subdirectory for index pages after the first.
    #[serde(default = "default_page_dir")]
    pub page_dir: String,

    #[serde(default = "default_archive_dir")]
    pub archive_dir: String,

    /// Output subdirectory for post pages.
    #[serde(default = "default_post_dir")]
    pub post_dir: String,

    #[serde(default = "default_template_dir")]
    pub template_dir: String,

    #[serde(default, rename = "repoURL")]
    pub repo_url: Option<String>,

    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub commit_msg: Option<String>,

    /// Any other keys, passed through to templates untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_page_dir() -> String {
    "page".to_owned()
}

fn default_archive_dir() -> String {
    "archive".to_owned()
}

fn default_post_dir() -> String {
    "post".to_owned()
}

fn default_template_dir() -> String {
    "template".to_owned()
}

/// Theme-level configuration (`theme-config.yaml`). Its keys are defined by
/// the theme, so it stays an open map.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeConfig(pub BTreeMap<String, serde_yaml::Value>);

impl ThemeConfig {
    const DEFAULT_POSTS_PER_PAGE: usize = 10;

    /// The number of posts per index page (`postsPerPage`).
    pub fn posts_per_page(&self) -> usize {
        self.0
            .get("postsPerPage")
            .and_then(serde_yaml::Value::as_u64)
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(Self::DEFAULT_POSTS_PER_PAGE)
    }
}

/// The configuration handed to the render pipeline. Built fresh for each
/// `generate` and never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveConfig {
    pub site: SiteConfig,
    pub theme: ThemeConfig,
}

/// Reads and parses both user config files under the project root.
pub fn resolve(layout: &Layout) -> crate::error::Result<EffectiveConfig> {
    Ok(EffectiveConfig {
        site: load(&layout.site_config_file())?,
        theme: load::<Option<ThemeConfig>>(&layout.theme_config_file())?.unwrap_or_default(),
    })
}

fn load<T: serde::de::DeserializeOwned>(path: &Path) -> crate::error::Result<T> {
    read_yaml(path).map_err(|err| crate::error::Error::Config {
        path: path.to_owned(),
        err,
    })
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(serde_yaml::from_str("~")?);
    }
    Ok(serde_yaml::from_str(&contents)?)
}

/// Parses the shipped defaults into the JSON snapshots kept in the metadata
/// store.
pub fn default_snapshots() -> Result<(serde_json::Value, serde_json::Value)> {
    let site: serde_yaml::Value = serde_yaml::from_str(DEFAULT_SITE_CONFIG)?;
    let theme: serde_yaml::Value = serde_yaml::from_str(DEFAULT_THEME_CONFIG)?;
    Ok((serde_json::to_value(site)?, serde_json::to_value(theme)?))
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a config file.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the file can't be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned when the file isn't valid YAML or is missing required keys.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Returned when a default can't be represented as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
