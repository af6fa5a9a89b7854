use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::{config_io, editor, store_io};
use crate::model::action::Action;
use crate::model::config::Config;
use crate::ops::executor::{self, ExecutionReport};
use crate::ops::session::{EditSession, ExtendedSession};
use crate::remote::{BoardClient, LocalBoardStore};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let ctx = Context::load(&cli)?;
    debug!(config = %ctx.config_path.display(), store = %ctx.store_path.display(), "loaded settings");

    match cli.command {
        Commands::Init(args) => cmd_init(ctx, args),
        Commands::Boards => cmd_boards(&ctx),
        Commands::Render(args) => cmd_render(&ctx, args),
        Commands::Plan(args) => cmd_plan(&ctx, args),
        Commands::Apply(args) => cmd_apply(&ctx, args),
        Commands::Edit => cmd_edit(&ctx),
        Commands::Config(cmd) => cmd_config(ctx, cmd.action),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Settings resolved from flags and the config file
struct Context {
    config_path: PathBuf,
    config: Config,
    doc: toml_edit::DocumentMut,
    store_path: PathBuf,
    board_override: Option<String>,
    json: bool,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self, Box<dyn Error>> {
        let config_path = match &cli.config {
            Some(path) => path.clone(),
            None => config_io::default_config_path()?,
        };
        let (config, doc) = config_io::read_config(&config_path)?;
        let store_path = match (&cli.store, &config.store) {
            (Some(path), _) | (None, Some(path)) => path.clone(),
            (None, None) => config_io::default_store_path()?,
        };
        Ok(Context {
            config_path,
            config,
            doc,
            store_path,
            board_override: cli.board.clone(),
            json: cli.json,
        })
    }

    fn board_id(&self) -> Result<String, Box<dyn Error>> {
        self.board_override
            .clone()
            .or_else(|| self.config.board.clone())
            .ok_or_else(|| "no board selected (run `mdb init <NAME>` or `mdb config board <ID>`)".into())
    }

    fn save_config(&self) -> Result<(), Box<dyn Error>> {
        config_io::write_config(&self.config_path, &self.doc)?;
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<String, Box<dyn Error>> {
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e).into())
}

/// Apply actions and persist the store. The store is saved even when an
/// action fails, since the ones before it were already applied.
fn apply_and_save(
    ctx: &Context,
    store: &mut LocalBoardStore,
    board_id: &str,
    actions: &[Action],
) -> Result<ExecutionReport, Box<dyn Error>> {
    let json = ctx.json;
    let outcome = executor::execute(store, board_id, actions, |action| {
        if !json {
            println!("{}", format_change(action));
        }
    });
    store_io::save_store(&ctx.store_path, store)?;
    Ok(outcome?)
}

// ---------------------------------------------------------------------------
// Board commands
// ---------------------------------------------------------------------------

fn cmd_init(mut ctx: Context, args: InitArgs) -> Result<(), Box<dyn Error>> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err("board name cannot be empty".into());
    }
    let mut store = store_io::load_store(&ctx.store_path)?;
    let id = store.add_board(name);
    store_io::save_store(&ctx.store_path, &store)?;

    config_io::set_board(&mut ctx.doc, &id);
    ctx.save_config()?;

    if ctx.json {
        let board = BoardJson {
            id,
            name: name.to_string(),
            selected: true,
        };
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        println!("Created board \"{}\" {{{}}}", name, id);
    }
    Ok(())
}

fn cmd_boards(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let store = store_io::load_store(&ctx.store_path)?;
    let selected = ctx.board_override.as_ref().or(ctx.config.board.as_ref());

    let mut boards = Vec::new();
    for id in store.board_ids() {
        let board = store.fetch_board(id)?;
        boards.push(BoardJson {
            selected: selected.is_some_and(|s| *s == board.id),
            id: board.id,
            name: board.name,
        });
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&boards)?);
    } else if boards.is_empty() {
        println!("No boards. Create one with `mdb init <NAME>`.");
    } else {
        for board in &boards {
            println!("{}", format_board_line(board));
        }
    }
    Ok(())
}

fn cmd_render(ctx: &Context, args: RenderArgs) -> Result<(), Box<dyn Error>> {
    let store = store_io::load_store(&ctx.store_path)?;
    let board_id = ctx.board_id()?;
    let session = EditSession::open(&store, &board_id, ctx.config.date_format)?;

    match args.output {
        Some(path) => {
            fs::write(&path, session.text())
                .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
            if !ctx.json {
                println!("Wrote {}", path.display());
            }
        }
        None if ctx.json => {
            let out = serde_json::json!({ "board": board_id, "document": session.text() });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        None => print!("{}", session.text()),
    }
    Ok(())
}

fn cmd_plan(ctx: &Context, args: DocumentArgs) -> Result<(), Box<dyn Error>> {
    let edited = read_document(&args.file)?;
    let store = store_io::load_store(&ctx.store_path)?;
    let board_id = ctx.board_id()?;
    let mut session = EditSession::open(&store, &board_id, ctx.config.date_format)?;
    let result = session.reconcile(&edited)?;
    let ordered = executor::plan(&result.actions);

    if ctx.json {
        let out = PlanJson {
            actions: &ordered,
            extended: &result.extended,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_plan(&ordered, &result.extended) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_apply(ctx: &Context, args: DocumentArgs) -> Result<(), Box<dyn Error>> {
    let edited = read_document(&args.file)?;
    let mut store = store_io::load_store(&ctx.store_path)?;
    let board_id = ctx.board_id()?;
    let mut session = EditSession::open(&store, &board_id, ctx.config.date_format)?;
    let result = session.reconcile(&edited)?;

    if result.is_empty() {
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&ApplyJson {
                applied: Vec::new(),
                extended: Vec::new(),
            })?);
        } else {
            println!("No changes.");
        }
        return Ok(());
    }

    let report = apply_and_save(ctx, &mut store, &board_id, &result.actions)?;

    if ctx.json {
        let out = ApplyJson {
            applied: report.applied,
            extended: result.extended,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if !result.extended.is_empty() {
        for target in &result.extended {
            println!("{}", format_target(target));
        }
        eprintln!("Extended fields are edited interactively; run `mdb edit` and mark the objects with `!`.");
    }
    Ok(())
}

fn cmd_edit(ctx: &Context) -> Result<(), Box<dyn Error>> {
    let mut store = store_io::load_store(&ctx.store_path)?;
    let board_id = ctx.board_id()?;
    let format = ctx.config.date_format;

    let mut session = EditSession::open(&store, &board_id, format)?;
    let edited = editor::edit_text(session.text(), "mdboard-")?;
    let result = session.reconcile(&edited)?;
    if result.is_empty() {
        println!("No changes.");
        return Ok(());
    }

    apply_and_save(ctx, &mut store, &board_id, &result.actions)?;

    if !result.extended.is_empty() {
        let extended = ExtendedSession::open(&store, &result.extended, format)?;
        let edited = editor::edit_text(extended.text(), "mdboard-extended-")?;
        let actions = extended.reconcile(&edited)?;
        if actions.is_empty() {
            println!("No extended changes.");
        } else {
            apply_and_save(ctx, &mut store, &board_id, &actions)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(mut ctx: Context, action: ConfigAction) -> Result<(), Box<dyn Error>> {
    match action {
        ConfigAction::Show => {
            if ctx.json {
                let out = config_to_json(&ctx.config, &ctx.config_path, &ctx.store_path);
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for line in format_config(&ctx.config, &ctx.config_path, &ctx.store_path) {
                    println!("{}", line);
                }
            }
            return Ok(());
        }
        ConfigAction::Board { id } => {
            config_io::set_board(&mut ctx.doc, &id);
            println!("Selected board {}", id);
        }
        ConfigAction::DateFormat { format } => {
            config_io::set_date_format(&mut ctx.doc, format);
            println!("Date format set to {}", format.label());
        }
        ConfigAction::Store { path } => {
            config_io::set_store(&mut ctx.doc, &path);
            println!("Board store set to {}", path.display());
        }
    }
    ctx.save_config()
}
