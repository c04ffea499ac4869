use std::process::ExitCode;

use clap::Parser;
use ldapvi::{
    cli::{Cli, Commands},
    commands::{self, Invocation},
    core::error::{ExitStatus, exit_status_for},
    infra::{config, logging},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    // Build a context once, pass everywhere
    let ctx = cli.context();
    let inv = Invocation {
        config: cli.config.as_deref(),
        conn: &cli.conn,
        ctx: &ctx,
    };

    let result = match cli.command {
        Commands::List(args) => commands::list(args, &inv),
        Commands::Edit(args) => commands::edit(args, &inv),
        Commands::New(args) => commands::new(args, &inv),
        Commands::Apply(args) => commands::apply(args, &inv),
        Commands::Search(args) => commands::search(args, &inv),
        Commands::Init(args) => config::init(args, &ctx),
    };

    match result {
        Ok(()) => ExitStatus::Ok.into(),
        Err(err) => {
            commands::report_error(&err, &ctx);
            exit_status_for(&err).into()
        }
    }
}
