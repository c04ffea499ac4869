use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::directory::Scope;

/// Shared application context for global flags
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub yes: bool,      // global --yes
}

#[derive(Parser)]
#[command(name = "ldapvi")]
#[command(about = "Edit a slice of an LDAP directory as LDIF in your text editor")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub conn: ConnectionArgs,

    /// Configuration file (default: ldapvi.toml, .ldapvi.toml, ~/.ldapvi.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Apply changes without asking for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// More diagnostics on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn context(&self) -> AppContext {
        AppContext {
            quiet: self.quiet,
            no_color: self.no_color,
            yes: self.yes,
        }
    }
}

/// Connection and rendering overrides; each one beats the profile.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Profile from the configuration file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Server URI, e.g. ldap://ldap.example.org
    #[arg(short = 'H', long, global = true)]
    pub uri: Option<String>,

    /// Bind DN
    #[arg(short = 'D', long, global = true, visible_alias = "user")]
    pub bind_dn: Option<String>,

    /// Bind password
    #[arg(short = 'w', long, global = true, conflicts_with = "ask_pw")]
    pub bind_pw: Option<String>,

    /// Prompt for the bind password
    #[arg(short = 'W', long, global = true)]
    pub ask_pw: bool,

    /// Upgrade the connection with StartTLS
    #[arg(short = 'Z', long, global = true)]
    pub starttls: bool,

    /// Fold LDIF lines wider than N columns (0 disables folding)
    #[arg(long, global = true, value_name = "N")]
    pub fold_width: Option<usize>,

    /// Directory for draft files
    #[arg(long, global = true, value_name = "DIR")]
    pub draft_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print matching entries as LDIF
    List(SelectArgs),

    /// Edit matching entries and apply the changes
    Edit(SelectArgs),

    /// Create entries from a template
    New(NewArgs),

    /// Make matching entries look like an LDIF file
    Apply(ApplyArgs),

    /// Print entries under an explicit base (plumbing)
    Search(SearchArgs),

    /// Initialize an ldapvi.toml config file
    Init(InitArgs),
}

/// Which entries to work on: a unit (`ou=<unit>`) and optionally one entity in it.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Organizational unit under the profile's base DN (people, hosts, ...)
    pub unit: Option<String>,

    /// Single entry inside the unit
    pub entity: Option<String>,

    /// Include everything below the selected entries
    #[arg(short, long, visible_short_alias = 'R')]
    pub recursive: bool,

    /// Search base, replacing the unit/entity addressing
    #[arg(short, long)]
    pub base: Option<String>,

    /// Search scope
    #[arg(short, long, value_enum)]
    pub scope: Option<Scope>,

    /// Search filter
    #[arg(short, long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Template file (default: <templates_dir>/<unit>.ldif)
    #[arg(short, long, value_name = "FILE")]
    pub template: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// LDIF file holding the desired entries ("-" for stdin)
    pub file: PathBuf,

    #[command(flatten)]
    pub select: SelectArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search scope
    #[arg(short, long, value_enum, default_value_t = Scope::Sub)]
    pub scope: Scope,

    /// Search base
    pub base: String,

    /// Search filter
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Directory to create ldapvi.toml in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}
