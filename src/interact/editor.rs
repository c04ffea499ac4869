//! Launching the operator's text editor on a draft.

use std::{path::Path, process::Command};

use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorStatus
{
    /// The editor ran and exited successfully.
    Edited,
    /// No editor is configured.
    Unset,
    /// The editor could not be started or exited with a failure.
    Failed
    {
        editor: String, reason: String
    },
}

pub trait Editor
{
    fn edit(
        &mut self,
        path: &Path,
    ) -> EditorStatus;
}

/// Runs `$VISUAL` or `$EDITOR`. The command may carry arguments
/// (`"code --wait"`); the draft path is appended as the last one.
#[derive(Debug, Clone, Default)]
pub struct ExternalEditor
{
    command: Option<String>,
}

impl ExternalEditor
{
    pub fn new(command: Option<String>) -> Self
    {
        let command = command.filter(|c| {
            !c.trim()
                .is_empty()
        });
        Self { command }
    }

    pub fn from_env() -> Self
    {
        let command = ["VISUAL", "EDITOR"]
            .into_iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|c| {
                !c.trim()
                    .is_empty()
            });
        Self::new(command)
    }

    pub fn command(&self) -> Option<&str>
    {
        self.command
            .as_deref()
    }
}

impl Editor for ExternalEditor
{
    fn edit(
        &mut self,
        path: &Path,
    ) -> EditorStatus
    {
        let Some(command) = &self.command
        else
        {
            return EditorStatus::Unset;
        };

        let mut words = command.split_whitespace();
        let Some(program) = words.next()
        else
        {
            return EditorStatus::Unset;
        };
        let program = shellexpand::tilde(program).into_owned();

        debug!(editor = %command, path = %path.display(), "launching editor");
        let status = Command::new(&program)
            .args(words)
            .arg(path)
            .status();

        match status
        {
            Ok(status) if status.success() => EditorStatus::Edited,
            Ok(status) =>
            {
                let reason = match status.code()
                {
                    Some(code) => format!("return code {code}"),
                    None => "a signal".to_string(),
                };
                warn!(editor = %command, %reason, "editor failed");
                EditorStatus::Failed { editor: command.clone(), reason }
            }
            Err(e) =>
            {
                warn!(editor = %command, error = %e, "editor could not be started");
                EditorStatus::Failed { editor: command.clone(), reason: e.to_string() }
            }
        }
    }
}
