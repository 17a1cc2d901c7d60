//! # dockmeta-template
//!
//! A deliberately small template language for deriving metadata values
//! from container inspection documents.
//!
//! Handles:
//! - **Lexer**: Splits template source into literal text and action tokens.
//! - **Parser**: Builds the node list for a template, reporting syntax errors.
//! - **Exec**: Walks the nodes against a JSON document and renders text.
//!
//! Supported actions: `{{ . }}`, `{{ .Config.Image }}`,
//! `{{ index .Config.Labels "com.example.team" }}`, string and integer
//! literals, `{{/* comments */}}`, and `{{-`/`-}}` whitespace trimming.
//!
//! ```rust
//! use dockmeta_template::Template;
//!
//! let template = Template::compile("image", "{{ .Config.Image }}").unwrap();
//! let doc = serde_json::json!({ "Config": { "Image": "nginx:1.27" } });
//! assert_eq!(template.render(&doc).unwrap(), "nginx:1.27");
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod exec;
pub mod parser;
mod template;

pub use template::Template;
