//! One run of the fetch, edit, diff, confirm and apply cycle.
//!
//! States, in order: `Connecting`, `Fetching`, `Rendering` or `Loading`,
//! `AwaitingEdit`, `Parsing`, `Diffing`, `AwaitingConfirmation`, `Applying`,
//! then `Done`. Any step before `Applying` may end the run in `Failed` or
//! `Cancelled`; nothing is written to the directory before `Applying`.

use std::{io::Write, path::PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::{
    core::{
        diff::{ChangeSet, ChangeSummary, diff},
        draft::Draft,
        entry::Snapshot,
        error::WorkflowError,
        ldif::{LdifOptions, ParseOptions, Parser, Writer},
        order::{deletion_order, order, order_entries},
    },
    directory::{BindTarget, Connector, Directory, DirectoryError, SearchRequest},
    interact::{
        editor::{Editor, EditorStatus},
        prompt::{Confirmation, Prompter},
    },
};

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action
{
    /// Print the matching entries as LDIF.
    List,
    /// Edit the matching entries and apply the difference.
    Edit,
    /// Edit `seed` (usually a template) and add what comes out.
    New
    {
        seed: String
    },
    /// Make the matching entries look like `ldif`.
    Apply
    {
        ldif: String
    },
}

impl Action
{
    pub fn name(&self) -> &'static str
    {
        match self
        {
            Action::List => "list",
            Action::Edit => "edit",
            Action::New { .. } => "new",
            Action::Apply { .. } => "apply",
        }
    }

    fn fetches(&self) -> bool
    {
        !matches!(self, Action::New { .. })
    }

    fn edits(&self) -> bool
    {
        matches!(self, Action::Edit | Action::New { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State
{
    Connecting,
    Fetching,
    Rendering,
    Loading,
    AwaitingEdit,
    Parsing,
    Diffing,
    AwaitingConfirmation,
    Applying,
    Done,
    Cancelled,
    Failed,
}

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct WorkflowSettings
{
    pub bind: BindTarget,
    pub search: SearchRequest,
    pub ldif: LdifOptions,
    pub parse: ParseOptions,
    /// Where drafts are created; the system temp directory when `None`.
    pub draft_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report
{
    Listed
    {
        entries: usize
    },
    NothingChanged,
    Applied
    {
        summary: ChangeSummary
    },
}

pub struct Workflow
{
    settings: WorkflowSettings,
    connector: Box<dyn Connector>,
    editor: Box<dyn Editor>,
    prompter: Box<dyn Prompter>,
    trail: Vec<State>,
}

impl Workflow
{
    pub fn new(
        settings: WorkflowSettings,
        connector: Box<dyn Connector>,
        editor: Box<dyn Editor>,
        prompter: Box<dyn Prompter>,
    ) -> Self
    {
        Self { settings, connector, editor, prompter, trail: Vec::new() }
    }

    /// States visited by the last run, in order.
    pub fn trail(&self) -> &[State]
    {
        &self.trail
    }

    /// Run `action` to completion. `list` output goes to `out`.
    #[instrument(skip_all, fields(action = action.name(), base = %self.settings.search.base))]
    pub fn run(
        &mut self,
        action: &Action,
        out: &mut dyn Write,
    ) -> Result<Report, WorkflowError>
    {
        self.trail
            .clear();
        let result = self.drive(action, out);
        let last = match &result
        {
            Ok(_) => State::Done,
            Err(WorkflowError::Cancelled { .. }) => State::Cancelled,
            Err(_) => State::Failed,
        };
        self.enter(last);
        result
    }

    fn enter(
        &mut self,
        state: State,
    )
    {
        debug!(?state, "workflow state");
        self.trail
            .push(state);
    }

    fn drive(
        &mut self,
        action: &Action,
        out: &mut dyn Write,
    ) -> Result<Report, WorkflowError>
    {
        self.enter(State::Connecting);
        let mut dir = self
            .connector
            .bind(&self.settings.bind)
            .map_err(WorkflowError::Connect)?;

        let old = if action.fetches()
        {
            self.enter(State::Fetching);
            let found = dir
                .search(&self.settings.search)
                .map_err(WorkflowError::Search)?;
            Snapshot::from_entries(order_entries(found))
        }
        else
        {
            Snapshot::new()
        };

        let writer = Writer::new(self.settings.ldif);
        let text = match action
        {
            Action::List =>
            {
                self.enter(State::Rendering);
                writer
                    .write_to(&old, out)
                    .map_err(WorkflowError::io("writing LDIF"))?;
                return Ok(Report::Listed { entries: old.len() });
            }
            Action::Edit =>
            {
                self.enter(State::Rendering);
                writer.render_snapshot(&old)
            }
            Action::New { seed: text } | Action::Apply { ldif: text } =>
            {
                self.enter(State::Loading);
                text.clone()
            }
        };

        let draft = Draft::create(
            self.settings
                .draft_dir
                .as_deref(),
            &text,
        )
        .map_err(WorkflowError::io("creating draft"))?;

        let edited = if action.edits()
        {
            self.enter(State::AwaitingEdit);
            self.edit(&draft)?;
            draft
                .read()
                .map_err(WorkflowError::io_keeping("reading draft", draft.path()))?
        }
        else
        {
            text
        };

        self.enter(State::Parsing);
        let new = match Parser::new(self.settings.parse).parse(&edited)
        {
            Ok(parsed) => order(&parsed),
            Err(source) => return Err(WorkflowError::Malformed { source, draft: draft.keep() }),
        };

        self.enter(State::Diffing);
        let changes = diff(&old, &new);
        if changes.is_empty()
        {
            info!("nothing changed");
            let path = draft
                .path()
                .to_path_buf();
            draft
                .discard()
                .map_err(WorkflowError::io_keeping("removing draft", &path))?;
            return Ok(Report::NothingChanged);
        }

        self.enter(State::AwaitingConfirmation);
        let summary = changes.summary();
        let answer = self
            .prompter
            .confirm(summary)
            .map_err(WorkflowError::io_keeping("reading confirmation", draft.path()))?;
        match answer
        {
            Confirmation::Proceed => {}
            Confirmation::KeepDraft =>
            {
                return Err(WorkflowError::Cancelled { draft: draft.keep(), kept: true });
            }
            Confirmation::DiscardDraft =>
            {
                let path = draft
                    .path()
                    .to_path_buf();
                draft
                    .discard()
                    .map_err(WorkflowError::io_keeping("removing draft", &path))?;
                return Err(WorkflowError::Cancelled { draft: path, kept: false });
            }
        }

        self.enter(State::Applying);
        let failures = apply(dir.as_mut(), changes);
        if failures.is_empty()
        {
            info!(%summary, "applied");
            let path = draft
                .path()
                .to_path_buf();
            if let Err(e) = draft.discard()
            {
                warn!(error = %e, draft = %path.display(), "could not remove draft");
            }
            Ok(Report::Applied { summary })
        }
        else
        {
            Err(WorkflowError::OperationsFailed { failures, draft: draft.keep() })
        }
    }

    /// Hand the draft to the editor; fall back to asking the operator to edit
    /// it by hand when that does not work.
    fn edit(
        &mut self,
        draft: &Draft,
    ) -> Result<(), WorkflowError>
    {
        let path = draft.path();
        let manual = format!("Now modify {}, and press Enter when you are done", path.display());
        let notice = match self
            .editor
            .edit(path)
        {
            EditorStatus::Edited => return Ok(()),
            EditorStatus::Unset =>
            {
                format!("{manual}\n(Hint: set environment variable $EDITOR to launch automatically)")
            }
            EditorStatus::Failed { editor, reason } =>
            {
                format!("Editor {editor} failed with {reason}, falling back to manual mode\n{manual}")
            }
        };

        self.prompter
            .pause(&notice)
            .map_err(WorkflowError::io_keeping("waiting for manual edit", path))
    }
}

/// Additions, then modifications, then deletions children first. Every
/// operation is attempted; failures are collected rather than stopping the
/// run.
fn apply(
    dir: &mut dyn Directory,
    changes: ChangeSet,
) -> Vec<DirectoryError>
{
    let mut failures = Vec::new();
    let mut record = |result: Result<(), DirectoryError>| {
        if let Err(e) = result
        {
            warn!(error = %e, "operation failed");
            failures.push(e);
        }
    };

    for (dn, attrs) in &changes.additions
    {
        record(dir.add(dn, attrs));
    }
    for (dn, deltas) in &changes.modifications
    {
        record(dir.modify(dn, deltas));
    }
    for dn in deletion_order(changes.deletions)
    {
        record(dir.delete(&dn));
    }

    failures
}
