pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod kanban_board;
pub mod seed;
pub mod storage;
pub mod task;
pub mod ui;
pub mod view;

use anyhow::Context;
use tracing::info;

use crate::app::App;
use crate::kanban_board::KanbanBoard;
use crate::storage::FileStore;

/// Loads config, starts logging and opens the board the terminal UI will drive.
pub fn open_app(cli: &cli::Cli) -> anyhow::Result<App<FileStore>> {
    let cfg = config::Config::load(cli.config.as_deref())?;
    let log_path = cli::init_tracing(cli.verbose, cli.quiet, &config::resolve_log_dir(&cfg))?;
    info!(
        log = %log_path.display(),
        config = ?cfg.loaded_from,
        "starting taskboard"
    );

    let data_file = config::resolve_data_file(&cfg, cli.data.as_deref())?;
    let store = FileStore::open(&data_file)
        .with_context(|| format!("failed to open storage at {}", data_file.display()))?;

    let mut board = KanbanBoard::new(store);
    if cli.reset {
        board.reset(cfg.seed_on_first_run)?;
    } else {
        board.initialize(cfg.seed_on_first_run)?;
    }

    let app = App::load(board, cfg.default_status()?)?;
    Ok(app)
}
