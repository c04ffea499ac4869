//! Command handlers: turn parsed arguments plus configuration into a
//! [`Workflow`] run and report the outcome.

use std::{
    io::{self, IsTerminal, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use dialoguer::{Confirm, Input, Password};
use owo_colors::OwoColorize;
use tracing::{debug, info};

use crate::{
    cli::{AppContext, ApplyArgs, ConnectionArgs, NewArgs, SearchArgs, SelectArgs},
    core::{
        error::WorkflowError,
        target::{Target, TargetError},
        template::TemplateSource,
        workflow::{Action, Report, Workflow, WorkflowSettings},
    },
    directory::{BindTarget, Scope, SearchRequest, ldap::LdapConnector},
    infra::config::{Config, Profile, config_path, load_config, store_credentials},
    interact::{
        editor::ExternalEditor,
        prompt::{Prompter, TerminalPrompter},
    },
};

/// Global options every handler needs.
pub struct Invocation<'a> {
    pub config: Option<&'a Path>,
    pub conn: &'a ConnectionArgs,
    pub ctx: &'a AppContext,
}

fn interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Ask for a missing value on a terminal; fail otherwise.
fn ask(
    prompt: &str,
    flag: &str,
) -> Result<String> {
    if !interactive() {
        bail!("no {prompt} given (use {flag} or set it in a profile)");
    }
    Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .with_context(|| format!("Failed to read {prompt}"))
}

fn ask_password() -> Result<String> {
    Password::new()
        .with_prompt("Password (one time)")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read password")
}

/// The profile typed-in credentials can be saved into.
pub struct CredentialStore {
    pub path: PathBuf,
    pub profile: String,
}

impl CredentialStore {
    fn new(
        inv: &Invocation<'_>,
        cfg: &Config,
    ) -> Self {
        let profile = inv
            .conn
            .profile
            .clone()
            .or_else(|| cfg.default_profile.clone())
            .unwrap_or_else(|| "default".to_string());
        Self { path: config_path(inv.config), profile }
    }
}

/// Offer to keep what was typed at the prompts for next time. The password
/// is only saved on a second, explicit yes.
fn offer_to_save(
    store: &CredentialStore,
    bind_dn: &str,
    typed_pw: Option<&str>,
) -> Result<()> {
    let save = Confirm::new()
        .with_prompt(format!(
            "Save bind DN in profile {:?} of {}?",
            store.profile,
            store.path.display()
        ))
        .default(true)
        .interact()
        .context("Failed to read answer")?;
    if !save {
        return Ok(());
    }

    let bind_pw = match typed_pw {
        Some(pw) => Confirm::new()
            .with_prompt("Save the password too? It is only base64-encoded; say no on shared machines")
            .default(false)
            .interact()
            .context("Failed to read answer")?
            .then_some(pw),
        None => None,
    };

    store_credentials(&store.path, &store.profile, bind_dn, bind_pw)?;
    info!(path = %store.path.display(), profile = %store.profile, password = bind_pw.is_some(), "credentials saved");
    eprintln!("Saved in {}. Read the warning at the top of that file.", store.path.display());
    Ok(())
}

/// Flags beat the profile; whatever is still missing is asked for, and on a
/// terminal the answers can be saved into `store`.
pub fn bind_target(
    conn: &ConnectionArgs,
    profile: &Profile,
    store: Option<&CredentialStore>,
) -> Result<BindTarget> {
    let uri = match conn.uri.clone().or_else(|| profile.uri.clone()) {
        Some(uri) => uri,
        None => ask("URI", "-H")?,
    };
    let (bind_dn, typed_dn) = match conn.bind_dn.clone().or_else(|| profile.bind_dn.clone()) {
        Some(dn) => (dn, false),
        None => (ask("bind DN", "-D")?, true),
    };

    let mut typed_pw = None;
    let bind_pw = if conn.ask_pw {
        Some(ask_password()?)
    } else if let Some(pw) = &conn.bind_pw {
        Some(pw.clone())
    } else if let Some(pw) = profile.password()? {
        Some(pw)
    } else if interactive() {
        let pw = ask_password()?;
        typed_pw = Some(pw.clone());
        Some(pw)
    } else {
        bail!("no password for {bind_dn} (use -w, -W or bind_pw in the profile)");
    };

    // A DN given with -D is not the profile's to keep.
    if let Some(store) = store
        && conn.bind_dn.is_none()
        && (typed_dn || typed_pw.is_some())
        && interactive()
    {
        offer_to_save(store, &bind_dn, typed_pw.as_deref())?;
    }

    Ok(BindTarget {
        uri,
        bind_dn: Some(bind_dn),
        bind_pw,
        starttls: conn.starttls || profile.starttls,
        tls_verify: profile.tls_verify,
    })
}

fn settings(
    inv: &Invocation<'_>,
    cfg: &Config,
    profile: &Profile,
    search: SearchRequest,
) -> Result<WorkflowSettings> {
    let mut ldif = cfg.ldif.writer_options();
    if let Some(width) = inv.conn.fold_width {
        ldif.fold_width = width;
    }

    Ok(WorkflowSettings {
        bind: bind_target(inv.conn, profile, Some(&CredentialStore::new(inv, cfg)))?,
        search,
        ldif,
        parse: cfg.ldif.parse_options(),
        draft_dir: inv.conn.draft_dir.clone().or_else(|| cfg.draft_dir()),
    })
}

fn target(select: &SelectArgs) -> Target<'_> {
    Target {
        unit: select.unit.as_deref(),
        entity: select.entity.as_deref(),
        recursive: select.recursive,
        base: select.base.as_deref(),
        scope: select.scope,
        filter: select.filter.as_deref(),
    }
}

/// Run `action` against the entries `select` addresses.
fn run_selected(
    inv: &Invocation<'_>,
    cfg: &Config,
    select: &SelectArgs,
    action: Action,
    prompter: Option<Box<dyn Prompter>>,
) -> Result<()> {
    let profile = cfg.profile(inv.conn.profile.as_deref())?;
    let search = target(select).resolve(profile.base_dn.as_deref(), &profile.rdn_attributes)?;
    let settings = settings(inv, cfg, &profile, search)?;
    run_workflow(settings, &action, inv.ctx, prompter)
}

/// Where confirmations are read from. Once stdin has been drained for the
/// LDIF only the controlling terminal can answer, and without one the run
/// needs `--yes`. Stdin is locked by the returned prompter, so build it only
/// after every other prompt.
fn open_prompter(
    ctx: &AppContext,
    stdin_drained: bool,
    open_terminal: impl FnOnce() -> io::Result<Box<dyn Prompter>>,
) -> Result<Box<dyn Prompter>> {
    if ctx.yes {
        return Ok(Box::new(TerminalPrompter::new(io::empty(), io::stderr()).assume_yes(true)));
    }
    if !stdin_drained {
        return Ok(Box::new(TerminalPrompter::stdio()));
    }
    open_terminal().map_err(|e| {
        anyhow!("LDIF was read from stdin and no terminal is available to confirm ({e}); pass --yes to apply without asking")
    })
}

fn controlling_terminal() -> io::Result<Box<dyn Prompter>> {
    Ok(Box::new(TerminalPrompter::controlling_terminal()?))
}

fn run_workflow(
    settings: WorkflowSettings,
    action: &Action,
    ctx: &AppContext,
    prompter: Option<Box<dyn Prompter>>,
) -> Result<()> {
    debug!(action = action.name(), search = ?settings.search, "starting");

    let prompter = match prompter {
        Some(prompter) => prompter,
        None => open_prompter(ctx, false, controlling_terminal)?,
    };
    let mut workflow = Workflow::new(
        settings,
        Box::new(LdapConnector),
        Box::new(ExternalEditor::from_env()),
        prompter,
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = workflow.run(action, &mut out)?;

    if !ctx.quiet {
        match report {
            Report::Listed { .. } => {}
            Report::NothingChanged => println!("Nothing changed."),
            Report::Applied { .. } => println!("Done."),
        }
    }
    Ok(())
}

pub fn list(
    args: SelectArgs,
    inv: &Invocation<'_>,
) -> Result<()> {
    run_selected(inv, &load_config(inv.config)?, &args, Action::List, None)
}

pub fn edit(
    args: SelectArgs,
    inv: &Invocation<'_>,
) -> Result<()> {
    run_selected(inv, &load_config(inv.config)?, &args, Action::Edit, None)
}

pub fn new(
    args: NewArgs,
    inv: &Invocation<'_>,
) -> Result<()> {
    let cfg = load_config(inv.config)?;
    let source = TemplateSource::pick(
        args.template.as_deref(),
        &cfg.templates_dir(),
        args.select.unit.as_deref(),
    );
    let seed = source.load(args.select.entity.as_deref())?;

    // Nothing is fetched for `new`, so a missing unit is fine here.
    let profile = cfg.profile(inv.conn.profile.as_deref())?;
    let search = match target(&args.select).resolve(profile.base_dn.as_deref(), &profile.rdn_attributes) {
        Err(TargetError::NoBase) => {
            SearchRequest::new(profile.base_dn.clone().unwrap_or_default(), Scope::Base)
        }
        other => other?,
    };
    let settings = settings(inv, &cfg, &profile, search)?;
    run_workflow(settings, &Action::New { seed }, inv.ctx, None)
}

pub fn apply(
    args: ApplyArgs,
    inv: &Invocation<'_>,
) -> Result<()> {
    let from_stdin = args.file.as_os_str() == "-";
    // Checked before stdin is read, so a pipeline without a terminal fails early.
    let prompter = if from_stdin {
        Some(open_prompter(inv.ctx, true, controlling_terminal)?)
    } else {
        None
    };
    let ldif = if from_stdin {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read LDIF from stdin")?;
        text
    } else {
        std::fs::read_to_string(&args.file)
            .with_context(|| format!("Failed to read {}", args.file.display()))?
    };
    run_selected(inv, &load_config(inv.config)?, &args.select, Action::Apply { ldif }, prompter)
}

pub fn search(
    args: SearchArgs,
    inv: &Invocation<'_>,
) -> Result<()> {
    let cfg = load_config(inv.config)?;
    let profile = cfg.profile(inv.conn.profile.as_deref())?;
    let mut request = SearchRequest::new(args.base, args.scope);
    if let Some(filter) = args.filter.filter(|f| !f.trim().is_empty()) {
        request = request.with_filter(filter);
    }
    let settings = settings(inv, &cfg, &profile, request)?;
    run_workflow(settings, &Action::List, inv.ctx, None)
}

/// Print a failed run for the operator.
pub fn report_error(
    err: &anyhow::Error,
    ctx: &AppContext,
) {
    let paint = |text: &str| -> String {
        if ctx.no_color {
            text.to_string()
        } else {
            text.red().to_string()
        }
    };

    match err.downcast_ref::<WorkflowError>() {
        Some(WorkflowError::Cancelled { .. }) => {
            if !ctx.quiet {
                println!("{err}");
            }
        }
        Some(WorkflowError::OperationsFailed { failures, .. }) => {
            for failure in failures {
                eprintln!("{}", paint(&failure.to_string()));
            }
            eprintln!("{err}");
        }
        _ => eprintln!("{} {err:#}", paint("error:")),
    }
}
