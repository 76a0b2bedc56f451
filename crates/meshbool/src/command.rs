//! User-facing command dispatch.

use meshbool_scene::BooleanOperator;
use tracing::{info_span, warn};

use crate::context::BoolContext;
use crate::error::{BoolError, Result};
use crate::immediate::ImmediateOutcome;
use crate::kernel::GeometryKernel;
use crate::live::BooleanParams;
use crate::mirror::MirrorParams;

/// A one-shot command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Attach the trailing selected mesh as a live boolean.
    LiveAdd(BooleanParams),
    /// Bake a boolean right away.
    ImmediateBoolean(BooleanOperator),
    /// Show or hide the boolean group.
    ToggleVisibility,
    /// Bake live booleans of the selected meshes.
    Apply,
    /// Add a local or world mirror to the active mesh.
    AddMirror(MirrorParams),
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::LiveAdd(_) => "live_add",
            Command::ImmediateBoolean(_) => "immediate_boolean",
            Command::ToggleVisibility => "toggle_visibility",
            Command::Apply => "apply",
            Command::AddMirror(_) => "add_mirror",
        }
    }
}

/// How a command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// Ran to completion.
    Finished,
    /// Stopped by the user; nothing changed.
    Cancelled,
    /// Could not run; nothing changed. Carries the message for the user.
    Warning(String),
}

impl<K: GeometryKernel> BoolContext<K> {
    /// Run `command`.
    ///
    /// Unmet preconditions come back as [`CommandStatus::Warning`]; only
    /// scene consistency failures are errors.
    pub fn execute(&mut self, command: Command) -> Result<CommandStatus> {
        let span = info_span!("command", name = command.name());
        let _enter = span.enter();

        let result = match command {
            Command::LiveAdd(params) => self.live_add(params).map(|_| CommandStatus::Finished),
            Command::ImmediateBoolean(operator) => {
                self.immediate_boolean(operator).map(|outcome| match outcome {
                    ImmediateOutcome::Edit(Err(err)) => CommandStatus::Warning(err.to_string()),
                    ImmediateOutcome::Edit(Ok(())) | ImmediateOutcome::Object { .. } => {
                        CommandStatus::Finished
                    }
                })
            }
            Command::ToggleVisibility => self.toggle_visibility().map(|_| CommandStatus::Finished),
            Command::Apply => self.apply().map(|_| CommandStatus::Finished),
            Command::AddMirror(params) => self.add_mirror(params).map(|_| CommandStatus::Finished),
        };

        let status = match result {
            Ok(status) => status,
            Err(BoolError::Precondition(reason)) => {
                warn!(%reason, "command not run");
                CommandStatus::Warning(reason.to_string())
            }
            Err(err) => return Err(err),
        };
        debug_assert!(self.scene.validate().is_ok(), "scene left inconsistent");
        Ok(status)
    }
}
