//! The library code for the `ritsu` static blog generator. The architecture
//! can be generally broken down into two parts:
//!
//! 1. Managing posts through their lifecycle on disk ([`crate::engine`])
//! 2. Rendering the published posts into a static site ([`crate::render`])
//!
//! The first part owns the project directory. A project root is any
//! directory holding a metadata store ([`crate::store`]); commands run from
//! anywhere below it find it by searching upward ([`crate::root`]). Posts are
//! Markdown files that start out in `drafts/`, move to `posts/` when
//! published, and to `trash/` when deleted. The store keeps the ordered list
//! of published posts.
//!
//! The second part runs on `generate`. It reads the user's site and theme
//! configuration ([`crate::config`]), splits each published post into front
//! matter and body ([`crate::frontmatter`]), converts the body to HTML
//! ([`crate::markdown`]), and applies the theme's templates. The output
//! directory is always created fresh, and it is removed again if any post
//! fails to render.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod config;
pub mod engine;
pub mod error;
pub mod frontmatter;
pub mod layout;
pub mod markdown;
pub mod render;
pub mod root;
pub mod store;
pub mod theme;

pub use error::{Error, Result};
