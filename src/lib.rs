//! **ldapvi** - Edit a slice of an LDAP directory as LDIF in your text editor
//!
//! Entries are fetched, rendered as LDIF, handed to `$EDITOR`, parsed back and
//! diffed against what was fetched; only the resulting adds, modifies and
//! deletes are sent to the server. Failed runs keep the draft on disk.

/// Command-line interface with clap integration
pub mod cli;

/// Command handlers wiring configuration, collaborators and the workflow
pub mod commands;

/// Core engine - data model, LDIF codec, diffing and the edit workflow
pub mod core {
    /// DNs, attribute values, attribute sets and snapshots
    pub mod entry;
    pub use entry::{AttributeSet, Dn, Entry, Snapshot, Value};

    /// Parent-before-child ordering
    pub mod order;

    /// LDIF writer and parser with width-aware folding
    pub mod ldif;

    /// Snapshot diffing into add/modify/delete operations
    pub mod diff;
    pub use diff::{ChangeSet, ChangeSummary, Delta, diff};

    /// Draft file lifecycle
    pub mod draft;

    /// Workflow errors and exit statuses
    pub mod error;
    pub use error::{ExitStatus, WorkflowError};

    /// Unit/entity addressing
    pub mod target;

    /// Templates for new entries
    pub mod template;

    /// Fetch, edit, diff, confirm, apply
    pub mod workflow;
    pub use workflow::{Action, Report, State, Workflow, WorkflowSettings};
}

/// Directory access - traits, LDAP backend and in-memory directory
pub mod directory;

/// Operator interaction - editor launch and confirmation prompts
pub mod interact {
    /// `$VISUAL`/`$EDITOR` launcher
    pub mod editor;

    /// Y/n/q confirmation and manual-edit pause
    pub mod prompt;
}

/// Infrastructure - configuration and logging
pub mod infra {
    /// Layered TOML/environment configuration and `init`
    pub mod config;
    pub use config::{Config, Profile, load_config};

    /// tracing subscriber setup
    pub mod logging;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use infra::{Config, load_config};
