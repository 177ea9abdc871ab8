use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;

use crate::auth::provider::StaticTokenProvider;
use crate::auth::session::SessionGate;
use crate::cli::commands::*;
use crate::engine::state::ViewState;
use crate::engine::sync::Engine;
use crate::io::config_io::{self, ConfigError};
use crate::model::config::Config;
use crate::model::filter::ViewFilter;
use crate::remote::http::HttpGateway;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let json = cli.json;
    let path = config_path(cli.config.as_deref())?;

    match cli.command {
        // no subcommand is routed to the TUI in main.rs
        None => Ok(()),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(&path, args),
            Commands::Login(args) => cmd_login(&path, args),
            Commands::Logout => cmd_logout(&path),
            Commands::List(args) => cmd_list(&path, args, json),
            Commands::Add(args) => cmd_add(&path, args, json),
            Commands::Toggle(args) => cmd_toggle(&path, args, json),
            Commands::Edit(args) => cmd_edit(&path, args, json),
            Commands::Rm(args) => cmd_rm(&path, args, json),
        },
    }
}

pub fn config_path(flag: Option<&str>) -> Result<PathBuf, ConfigError> {
    match flag {
        Some(path) => Ok(PathBuf::from(path)),
        None => config_io::default_config_path(),
    }
}

/// Config file plus `TK_API_URL` / `TK_TOKEN` environment overrides.
pub fn load_config(path: &std::path::Path) -> Result<Config, ConfigError> {
    let mut config = config_io::read_config(path)?;
    config.apply_overrides(env_nonempty("TK_API_URL"), env_nonempty("TK_TOKEN"));
    Ok(config)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Config commands (no backend involved)
// ---------------------------------------------------------------------------

fn cmd_init(path: &std::path::Path, args: InitArgs) -> Result<(), Box<dyn Error>> {
    if path.exists() && !args.force {
        return Err(Box::new(ConfigError::AlreadyExists(path.to_path_buf())));
    }
    config_io::write_config(path, &Config::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn cmd_login(path: &std::path::Path, args: LoginArgs) -> Result<(), Box<dyn Error>> {
    let token = args
        .token
        .or_else(|| env_nonempty("TK_TOKEN"))
        .ok_or("no token given (pass one as an argument or set $TK_TOKEN)")?;
    let mut config = config_io::read_config(path)?;
    config.auth.token = Some(token);
    config_io::write_config(path, &config)?;
    println!("token stored in {}", path.display());
    Ok(())
}

fn cmd_logout(path: &std::path::Path) -> Result<(), Box<dyn Error>> {
    let mut config = config_io::read_config(path)?;
    config.auth.token = None;
    config_io::write_config(path, &config)?;
    println!("signed out");
    Ok(())
}

// ---------------------------------------------------------------------------
// List commands (one-shot engine runs)
// ---------------------------------------------------------------------------

/// Build the session gate and engine for a one-shot command.
pub fn connect(config: &Config) -> Result<(Engine, Rc<SessionGate>), Box<dyn Error>> {
    let provider = Rc::new(StaticTokenProvider::new(config.auth.token.clone()));
    let session = Rc::new(SessionGate::new(provider));
    let gateway = Rc::new(HttpGateway::new(&config.api, session.clone())?);
    Ok((Engine::new(gateway, session.clone()), session))
}

fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn Error>> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn cmd_list(path: &std::path::Path, args: ListArgs, json: bool) -> Result<(), Box<dyn Error>> {
    let filter: ViewFilter = args.filter.parse()?;
    let config = load_config(path)?;
    let (engine, session) = connect(&config)?;
    runtime()?.block_on(async {
        session.init().await;
        engine.initialize().await?;
        engine.set_filter(filter);
        Ok::<_, Box<dyn Error>>(())
    })?;
    let view = engine.snapshot();
    print_view(&view, json)?;
    surface_failures(&view)
}

fn cmd_add(path: &std::path::Path, args: AddArgs, json: bool) -> Result<(), Box<dyn Error>> {
    run_mutation(path, json, |engine| {
        let text = args.text.join(" ");
        async move { engine.add_todo(&text).await }
    })
}

fn cmd_toggle(path: &std::path::Path, args: IdArgs, json: bool) -> Result<(), Box<dyn Error>> {
    run_mutation(path, json, |engine| async move {
        engine.toggle_todo(args.id).await
    })
}

fn cmd_edit(path: &std::path::Path, args: EditArgs, json: bool) -> Result<(), Box<dyn Error>> {
    run_mutation(path, json, |engine| {
        let text = args.text.join(" ");
        async move { engine.edit_todo(args.id, &text).await }
    })
}

fn cmd_rm(path: &std::path::Path, args: IdArgs, json: bool) -> Result<(), Box<dyn Error>> {
    run_mutation(path, json, |engine| async move {
        engine.delete_todo(args.id).await
    })
}

/// Fetch, run one mutating operation, then print the resulting list.
fn run_mutation<F, Fut>(
    path: &std::path::Path,
    json: bool,
    op: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnOnce(Engine) -> Fut,
    Fut: Future<Output = Result<(), crate::remote::error::SyncError>>,
{
    let config = load_config(path)?;
    let (engine, session) = connect(&config)?;
    runtime()?.block_on(async {
        session.init().await;
        engine.initialize().await?;
        // a failed fetch leaves an empty errored list; mutating against
        // that would always miss, so stop here
        let view = engine.snapshot();
        if view.global_error.is_some() {
            return Ok(());
        }
        op(engine.clone()).await?;
        Ok::<_, Box<dyn Error>>(())
    })?;
    let view = engine.snapshot();
    print_view(&view, json)?;
    surface_failures(&view)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_view(view: &ViewState, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }
    if view.items.is_empty() && view.global_error.is_none() {
        println!("no todos ({})", view.filter);
        return Ok(());
    }
    for todo in &view.items {
        let mark = if todo.is_done { 'x' } else { ' ' };
        println!("{:>6} [{}] {}", todo.id, mark, todo.text);
    }
    Ok(())
}

/// Turn recorded state flags into a nonzero exit for scripting.
fn surface_failures(view: &ViewState) -> Result<(), Box<dyn Error>> {
    if let Some(err) = &view.global_error {
        return Err(err.clone().into());
    }
    if let Some((id, err)) = view.item_errors.iter().next() {
        return Err(format!("todo {}: {}", id, err).into());
    }
    Ok(())
}
