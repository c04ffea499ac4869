//! Workflow failures and process exit statuses.
//!
//! Exit codes:
//! - 0: success
//! - 2: bad invocation (arguments, configuration, templates)
//! - 3: cancelled at the confirmation prompt
//! - 4: bind failed
//! - 7: search, parse or directory operation failed

use std::{io, path::PathBuf, process::ExitCode};

use crate::{core::ldif::MalformedLdif, directory::DirectoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus
{
    Ok,
    BadInvocation,
    Cancelled,
    ConnectFailed,
    OperationFailed,
}

impl ExitStatus
{
    pub fn code(self) -> u8
    {
        match self
        {
            ExitStatus::Ok => 0,
            ExitStatus::BadInvocation => 2,
            ExitStatus::Cancelled => 3,
            ExitStatus::ConnectFailed => 4,
            ExitStatus::OperationFailed => 7,
        }
    }
}

impl From<ExitStatus> for ExitCode
{
    fn from(status: ExitStatus) -> Self
    {
        ExitCode::from(status.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError
{
    #[error(transparent)]
    Connect(DirectoryError),

    #[error(transparent)]
    Search(DirectoryError),

    #[error("{source}\nLDIF draft saved in {}", .draft.display())]
    Malformed
    {
        source: MalformedLdif, draft: PathBuf
    },

    #[error("{} operation(s) failed\nLDIF saved in {}", .failures.len(), .draft.display())]
    OperationsFailed
    {
        failures: Vec<DirectoryError>,
        draft: PathBuf,
    },

    #[error("{}", cancelled_message(.draft, .kept))]
    Cancelled
    {
        draft: PathBuf, kept: bool
    },

    #[error("{context}: {source}{}", draft_note(.draft))]
    Io
    {
        context: &'static str,
        source: io::Error,
        /// Set once the draft exists; it stays on disk for the operator.
        draft: Option<PathBuf>,
    },
}

fn draft_note(draft: &Option<PathBuf>) -> String
{
    draft
        .as_ref()
        .map(|d| format!("\nLDIF draft saved in {}", d.display()))
        .unwrap_or_default()
}

fn cancelled_message(
    draft: &std::path::Path,
    kept: &bool,
) -> String
{
    if *kept
    {
        format!("LDIF draft saved in {}", draft.display())
    }
    else
    {
        format!("LDIF draft {} discarded", draft.display())
    }
}

impl WorkflowError
{
    pub fn io(context: &'static str) -> impl FnOnce(io::Error) -> WorkflowError
    {
        move |source| WorkflowError::Io { context, source, draft: None }
    }

    /// Like [`WorkflowError::io`], for failures that leave `draft` behind.
    pub fn io_keeping(
        context: &'static str,
        draft: &std::path::Path,
    ) -> impl FnOnce(io::Error) -> WorkflowError
    {
        let draft = draft.to_path_buf();
        move |source| WorkflowError::Io { context, source, draft: Some(draft) }
    }

    pub fn exit_status(&self) -> ExitStatus
    {
        match self
        {
            WorkflowError::Connect(_) => ExitStatus::ConnectFailed,
            WorkflowError::Cancelled { .. } => ExitStatus::Cancelled,
            WorkflowError::Search(_)
            | WorkflowError::Malformed { .. }
            | WorkflowError::OperationsFailed { .. }
            | WorkflowError::Io { .. } => ExitStatus::OperationFailed,
        }
    }

    /// The draft left on disk for the operator, if any.
    pub fn draft(&self) -> Option<&std::path::Path>
    {
        match self
        {
            WorkflowError::Malformed { draft, .. }
            | WorkflowError::OperationsFailed { draft, .. }
            | WorkflowError::Cancelled { draft, kept: true } => Some(draft.as_path()),
            WorkflowError::Io { draft: Some(draft), .. } => Some(draft.as_path()),
            _ => None,
        }
    }
}

/// Exit status for any error reaching `main`. Errors that are not workflow or
/// directory failures come from arguments, configuration or templates.
pub fn exit_status_for(err: &anyhow::Error) -> ExitStatus
{
    for cause in err.chain()
    {
        if let Some(e) = cause.downcast_ref::<WorkflowError>()
        {
            return e.exit_status();
        }
        if let Some(e) = cause.downcast_ref::<DirectoryError>()
        {
            return match e
            {
                DirectoryError::Connect { .. } => ExitStatus::ConnectFailed,
                _ => ExitStatus::OperationFailed,
            };
        }
        if cause
            .downcast_ref::<MalformedLdif>()
            .is_some()
        {
            return ExitStatus::OperationFailed;
        }
    }
    ExitStatus::BadInvocation
}
