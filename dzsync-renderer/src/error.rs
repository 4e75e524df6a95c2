//! Error types for dzsync-renderer.

use thiserror::Error;

/// All errors that can arise from command template compilation and rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// A command's template failed to compile or render.
    #[error("invalid template in command '{command}' ({field}): {}", describe(.source))]
    Template {
        command: String,
        field: String,
        #[source]
        source: tera::Error,
    },

    /// Render requested for a command index that was never compiled.
    #[error("no command at index {index} ({count} configured)")]
    UnknownCommand { index: usize, count: usize },
}

/// Tera's top-level message only names the template; the cause is one level
/// down the source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut cause = std::error::Error::source(err);
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}
