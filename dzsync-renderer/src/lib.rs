//! # dzsync-renderer
//!
//! Tera-based engine that renders configured sync commands with the data of
//! the current sync cycle.
//!
//! ## Usage
//!
//! ```rust
//! use dzsync_core::CommandSpec;
//! use dzsync_renderer::{CommandTemplateData, TemplateEngine};
//!
//! let install = CommandSpec {
//!     name: "install".into(),
//!     cmd: "apt-get".into(),
//!     args: vec!["install".into(), "doublezero={{ PackageVersionTo }}".into()],
//!     environment: Default::default(),
//!     allow_failure: false,
//!     stream_output: false,
//!     disabled: false,
//! };
//! let engine = TemplateEngine::new(&[install]).unwrap();
//! let rendered = engine.render(0, &CommandTemplateData::sample()).unwrap();
//! assert_eq!(rendered.args[1], "doublezero=0.7.1-1");
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::CommandTemplateData;
pub use engine::{RenderedCommand, TemplateEngine};
pub use error::RenderError;
