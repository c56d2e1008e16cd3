use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use canonlink::logging::LogSink;
use canonlink::types::{LinkTask, MigrationPlan, Selections};
use canonlink::{
    exit_code_for, id_str, ApiError, BackupSession, Client, Config, Linker, Options, Roots, Scope,
};

#[derive(Parser, Debug)]
#[command(name = "canonlink")]
#[command(author, version, about = "Link one canonical agent configuration tree into every client's layout")]
struct Cli {
    /// Where the canonical tree lives: under the home directory or a project
    #[arg(long, default_value = "global")]
    scope: Scope,

    /// Project directory for --scope project (default: current directory)
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Home directory override for --scope global
    #[arg(long)]
    home: Option<PathBuf>,

    /// Limit to these clients (repeatable; default: config.toml or all)
    #[arg(long = "client")]
    clients: Vec<Client>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show what linking would do
    Plan,
    /// Create and update links
    Link {
        /// Replace conflicting targets (they are backed up first)
        #[arg(long)]
        force: bool,
    },
    /// Copy existing client content into the canonical tree, then link
    Migrate {
        /// Resolve a conflict: canonical path (relative or absolute) = candidate index
        #[arg(long = "select", value_name = "TARGET=INDEX")]
        selections: Vec<String>,
    },
    /// Reverse the most recent link or migrate run
    Undo,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {e}", id_str(e.id()));
            ExitCode::from(u8::try_from(exit_code_for(e.id())).unwrap_or(1))
        }
    }
}

fn options(cli: &Cli) -> Result<Options, ApiError> {
    let project_root = match (cli.scope, &cli.project_root) {
        (Scope::Project, None) => Some(std::env::current_dir().map_err(|e| {
            ApiError::InvalidInput(format!("cannot determine current directory: {e}"))
        })?),
        (_, p) => p.clone(),
    };
    let home = cli.home.clone().or_else(dirs::home_dir);
    let roots = Roots::resolve(cli.scope, project_root.as_deref(), home.as_deref())?;
    let config = Config::load(&roots.canonical);
    let options = Options::from_config(roots, &config);
    if cli.clients.is_empty() {
        Ok(options)
    } else {
        let backups = options.backups;
        Ok(Options::new(options.roots, cli.clients.iter().copied()).with_backups(backups))
    }
}

fn run(cli: Cli) -> Result<(), ApiError> {
    let options = options(&cli)?;
    let linker = Linker::new(LogSink, LogSink, options);
    match cli.command {
        Command::Plan => {
            let names: Vec<&str> = linker
                .options()
                .clients
                .iter()
                .map(|c| c.display_name())
                .collect();
            println!(
                "{} -> {}",
                linker.options().canonical_root().display(),
                names.join(", ")
            );
            let plan = linker.build_link_plan()?;
            for task in &plan.tasks {
                print_task(task);
            }
            println!(
                "{} changes, {} conflicts",
                plan.changes.len(),
                plan.conflicts.len()
            );
        }
        Command::Link { force } => {
            let plan = linker.build_link_plan()?;
            let mut session = linker.open_session()?;
            let result = linker.apply_link_plan(&plan, force, &mut session);
            let (report, kept) = settle(&linker, &mut session, result)?;
            println!(
                "{} applied, {} skipped, {} conflicts, {} backed up",
                report.applied, report.skipped, report.conflicts, report.backed_up
            );
            if report.conflicts > 0 && !force {
                for task in &plan.conflicts {
                    print_task(task);
                }
            }
            if let Some(dir) = kept {
                println!("backups: {}", dir.display());
            }
        }
        Command::Migrate { selections } => {
            let plan = linker.scan_migration();
            let selections = parse_selections(&plan, &selections)?;
            print_unresolved(&plan, &selections);
            let mut session = linker.open_session()?;
            let result = linker.apply_migration(&plan, &selections, &mut session);
            let (report, kept) = settle(&linker, &mut session, result)?;
            println!(
                "{} copied, {} skipped; links: {} applied, {} skipped, {} conflicts, {} backed up",
                report.copied,
                report.skipped,
                report.links.applied,
                report.links.skipped,
                report.links.conflicts,
                report.links.backed_up
            );
            if let Some(dir) = kept {
                println!("backups: {}", dir.display());
            }
        }
        Command::Undo => {
            let report = linker.undo_last_change()?;
            match report.backup_dir {
                Some(dir) => println!(
                    "undid {}: {} restored, {} removed, {} links removed",
                    dir.display(),
                    report.restored_backups,
                    report.removed_created,
                    report.removed_symlinks
                ),
                None => println!("nothing to undo"),
            }
        }
    }
    Ok(())
}

/// Finalize `session` whether or not the operation succeeded, so whatever it
/// journaled before failing can be undone. The operation's error wins.
fn settle<T>(
    linker: &Linker<LogSink, LogSink>,
    session: &mut BackupSession,
    result: Result<T, ApiError>,
) -> Result<(T, Option<PathBuf>), ApiError> {
    match result {
        Ok(report) => Ok((report, linker.finalize(session)?)),
        Err(e) => {
            match linker.finalize(session) {
                Ok(Some(dir)) => eprintln!("partial changes recorded in {}", dir.display()),
                Ok(None) => {}
                Err(fe) => log::warn!("finalizing after failure: {fe}"),
            }
            Err(e)
        }
    }
}

fn print_task(task: &LinkTask) {
    match task {
        LinkTask::Conflict { reason, kind, .. } => println!(
            "{:<13} {}  ({reason}{})",
            task.label(),
            task.path().display(),
            if kind.is_some() { "" } else { "; not forceable" }
        ),
        _ => println!("{:<13} {}", task.label(), task.path().display()),
    }
}

fn parse_selections(plan: &MigrationPlan, raw: &[String]) -> Result<Selections, ApiError> {
    let mut out = Selections::new();
    for item in raw {
        let (target, index) = item
            .rsplit_once('=')
            .ok_or_else(|| ApiError::InvalidInput(format!("expected TARGET=INDEX, got {item}")))?;
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| ApiError::InvalidInput(format!("bad candidate index in {item}")))?;
        out.insert(plan.canonical_root.join(target.trim()), index);
    }
    Ok(out)
}

fn print_unresolved(plan: &MigrationPlan, selections: &Selections) {
    for conflict in &plan.conflicts {
        if selections.contains_key(&conflict.target_path) {
            continue;
        }
        println!("unresolved: {} (choose with --select {}=N)", conflict.label, conflict.label);
        for (i, c) in conflict.candidates.iter().enumerate() {
            println!("  [{i}] {}", c.label);
        }
    }
}
