//! # CLI Layer
//!
//! One possible UI client for csm. This is the only place that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Reads the environment (`CSM_HOME`, `CSM_PASSPHRASE`, `CSM_LOG`)
//! - Parses arguments
//! - Formats output for humans
//!
//! ## Structure
//!
//! - `run()`: parse, set up logging and context, dispatch
//! - `init_context()`: resolves directories, loads the config, builds the API
//! - `handle_*()`: one per command, calls the API and prints the result

use super::logging;
use super::render::{print_messages, render_full_records, render_record_list, render_text_list};
use super::setup::{Cli, Commands, SortArg};
use clap::Parser;
use csm::api::CsmApi;
use csm::cipher::EnvPassphrase;
use csm::commands::{find::FindScope, parse_field_pairs, CmdResult, RecordEdit};
use csm::config::CsmConfig;
use csm::error::{CsmError, Result};
use csm::search::SearchType;
use csm::service::ToolKit;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

pub const HOME_ENV: &str = "CSM_HOME";

struct AppContext {
    api: CsmApi,
    verbose: bool,
}

/// Where the configuration and the sources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsmDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

/// `CSM_HOME` holds both when set; otherwise the platform directories are
/// used. `config_override` replaces the configuration directory only.
pub fn resolve_dirs(home: Option<PathBuf>, config_override: Option<&Path>) -> Result<CsmDirs> {
    let mut dirs = match home {
        Some(home) => CsmDirs {
            config_dir: home.clone(),
            data_dir: home,
        },
        None => {
            let proj = ProjectDirs::from("org", "csm", "csm").ok_or_else(|| {
                CsmError::Fatal("could not determine the configuration directory".to_string())
            })?;
            CsmDirs {
                config_dir: proj.config_dir().to_path_buf(),
                data_dir: proj.data_dir().to_path_buf(),
            }
        }
    };
    if let Some(dir) = config_override {
        dirs.config_dir = dir.to_path_buf();
    }
    Ok(dirs)
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let home = std::env::var_os(HOME_ENV).map(PathBuf::from);
    let dirs = resolve_dirs(home, cli.config.as_deref())?;
    let mut config = CsmConfig::load(&dirs.config_dir)?;

    logging::init(cli.verbose, &config.log_level, config.log_file.as_deref());
    debug!(config = %dirs.config_dir.display(), data = %dirs.data_dir.display(), "Starting");

    if cli.user.is_some() {
        config.user_name = cli.user.clone();
    }
    if cli.key.is_some() {
        config.user_key = cli.key.clone();
    }
    config.brute_force |= cli.force;

    let mut ctx = init_context(&dirs, config, cli.verbose > 0)?;

    match cli.command {
        Some(Commands::Create { locator }) => handle_create(&mut ctx, &cli.sources, &locator),
        Some(Commands::Open { locator }) => handle_open(&mut ctx, &cli.sources, &locator),
        Some(command) => {
            ctx.api.use_sources(&cli.sources)?;
            dispatch(&mut ctx, command)
        }
        None => {
            ctx.api.use_sources(&cli.sources)?;
            match cli.pattern {
                Some(pattern) => handle_find(&mut ctx, &pattern, None, FindScope::All),
                None => handle_list(&mut ctx, SortArg::Name),
            }
        }
    }
}

fn init_context(dirs: &CsmDirs, config: CsmConfig, verbose: bool) -> Result<AppContext> {
    let tools = ToolKit::new(Rc::new(EnvPassphrase::default()))
        .with_file_root(&dirs.data_dir)
        .with_separators(config.separators())?
        .with_kdf(config.kdf.clone());
    let api = CsmApi::new(Rc::new(tools), config);
    Ok(AppContext { api, verbose })
}

fn dispatch(ctx: &mut AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Sources => {
            let result = ctx.api.sources();
            print!("{}", render_text_list(&result.sources, "No sources."));
            Ok(())
        }
        Commands::Find {
            pattern,
            kind,
            name,
            label,
        } => {
            let scope = match (name, label) {
                (true, _) => FindScope::Name,
                (_, true) => FindScope::Label,
                _ => FindScope::All,
            };
            handle_find(ctx, &pattern, kind, scope)
        }
        Commands::List { sort } => handle_list(ctx, sort),
        Commands::Show { ids } => {
            let result = ctx.api.show(&ids)?;
            print!("{}", render_full_records(&result.records));
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Add {
            name,
            template,
            fields,
            labels,
            essentials,
        } => {
            let edit = RecordEdit {
                fields: parse_field_pairs(&fields)?,
                labels,
                essentials,
                ..Default::default()
            };
            let result = ctx.api.add(&name, template.as_deref(), &edit)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Update {
            id,
            name,
            fields,
            remove_fields,
            labels,
            essentials,
        } => {
            let edit = RecordEdit {
                name,
                fields: parse_field_pairs(&fields)?,
                remove_fields,
                labels,
                essentials,
            };
            let result = ctx.api.update(id, &edit)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Remove { ids } => {
            let result = ctx.api.remove(&ids)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Labels => {
            let result = ctx.api.labels()?;
            print!("{}", render_text_list(&result.labels, "No labels."));
            Ok(())
        }
        Commands::Export { path } => {
            let result = ctx.api.export(&path)?;
            print_messages(&result.messages);
            Ok(())
        }
        Commands::Create { .. } | Commands::Open { .. } => {
            Err(CsmError::Api("source commands are handled before dispatch".to_string()))
        }
    }
}

/// Extra `-s` sources are managed first so the created one ends up as default.
fn handle_create(ctx: &mut AppContext, sources: &[String], locator: &str) -> Result<()> {
    if !sources.is_empty() {
        ctx.api.use_sources(sources)?;
    }
    let result = ctx.api.create_source(locator, None)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_open(ctx: &mut AppContext, sources: &[String], locator: &str) -> Result<()> {
    if !sources.is_empty() {
        ctx.api.use_sources(sources)?;
    }
    let result = ctx.api.open_source(locator)?;
    print!("{}", render_text_list(&result.sources, "No sources."));
    print_messages(&result.messages);
    Ok(())
}

fn handle_find(
    ctx: &mut AppContext,
    pattern: &str,
    kind: Option<SearchType>,
    scope: FindScope,
) -> Result<()> {
    let result = ctx.api.find(pattern, kind, scope)?;
    print_records(ctx, &result);
    Ok(())
}

fn handle_list(ctx: &mut AppContext, sort: SortArg) -> Result<()> {
    let result = ctx.api.list(sort.into())?;
    print_records(ctx, &result);
    Ok(())
}

fn print_records(ctx: &AppContext, result: &CmdResult) {
    print!("{}", render_record_list(&result.records, ctx.verbose));
    print_messages(&result.messages);
}
