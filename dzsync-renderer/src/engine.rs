//! Tera rendering engine for configured sync commands.
//!
//! # Template naming
//!
//! Every templated field of command `i` is registered as its own Tera
//! template:
//!
//! | Field               | Template name     |
//! |---------------------|-------------------|
//! | `cmd`               | `{i}/cmd`         |
//! | `args[j]`           | `{i}/args/{j}`    |
//! | `environment[KEY]`  | `{i}/env/{KEY}`   |

use std::collections::BTreeMap;

use tera::Tera;

use dzsync_core::CommandSpec;

use crate::context::CommandTemplateData;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Template naming helpers
// ---------------------------------------------------------------------------

fn cmd_template(index: usize) -> String {
    format!("{index}/cmd")
}

fn arg_template(index: usize, arg: usize) -> String {
    format!("{index}/args/{arg}")
}

fn env_template(index: usize, key: &str) -> String {
    format!("{index}/env/{key}")
}

/// `(template name, human field label, source)` for every templated field.
fn command_fields(index: usize, spec: &CommandSpec) -> Vec<(String, String, &str)> {
    let mut fields = vec![(cmd_template(index), "cmd".to_string(), spec.cmd.as_str())];
    for (j, arg) in spec.args.iter().enumerate() {
        fields.push((arg_template(index, j), format!("args[{j}]"), arg.as_str()));
    }
    for (key, value) in &spec.environment {
        fields.push((env_template(index, key), format!("environment.{key}"), value.as_str()));
    }
    fields
}

// ---------------------------------------------------------------------------
// RenderedCommand
// ---------------------------------------------------------------------------

/// A command with every template substituted, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub name: String,
    pub program: String,
    pub args: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub allow_failure: bool,
    pub stream_output: bool,
}

impl RenderedCommand {
    /// `program arg1 arg2 ...` for log lines.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Compiled templates for a fixed command list.
///
/// Construction compiles every field and renders it once with
/// [`CommandTemplateData::sample`], so syntax errors and unknown variables
/// surface at startup instead of in the middle of a sync.
pub struct TemplateEngine {
    tera: Tera,
    commands: Vec<CommandSpec>,
}

impl TemplateEngine {
    pub fn new(commands: &[CommandSpec]) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        for (i, spec) in commands.iter().enumerate() {
            for (name, field, template) in command_fields(i, spec) {
                tera.add_raw_template(&name, template)
                    .map_err(|source| RenderError::Template {
                        command: spec.name.clone(),
                        field,
                        source,
                    })?;
            }
        }

        let engine = TemplateEngine {
            tera,
            commands: commands.to_vec(),
        };
        let sample = CommandTemplateData::sample();
        for i in 0..engine.commands.len() {
            engine.render(i, &sample)?;
        }
        Ok(engine)
    }

    /// The command list this engine was built from, in declared order.
    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Render command `index` with `data`.
    pub fn render(
        &self,
        index: usize,
        data: &CommandTemplateData,
    ) -> Result<RenderedCommand, RenderError> {
        let spec = self
            .commands
            .get(index)
            .ok_or(RenderError::UnknownCommand {
                index,
                count: self.commands.len(),
            })?;
        let ctx = data.to_tera_context()?;
        let render = |name: String, field: String| {
            self.tera
                .render(&name, &ctx)
                .map_err(|source| RenderError::Template {
                    command: spec.name.clone(),
                    field,
                    source,
                })
        };

        let program = render(cmd_template(index), "cmd".to_string())?;
        let args = (0..spec.args.len())
            .map(|j| render(arg_template(index, j), format!("args[{j}]")))
            .collect::<Result<Vec<_>, _>>()?;
        let environment = spec
            .environment
            .keys()
            .map(|key| {
                render(env_template(index, key), format!("environment.{key}"))
                    .map(|value| (key.clone(), value))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(RenderedCommand {
            name: spec.name.clone(),
            program,
            args,
            environment,
            allow_failure: spec.allow_failure,
            stream_output: spec.stream_output,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
