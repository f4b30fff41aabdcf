//! `taskzenith` kanban board client.
//!
//! ```bash
//! # Built-in demo project, no server needed
//! cargo run --bin taskzenith -- --offline board --project proj-1
//!
//! # Against a running taskzenith-server
//! cargo run --bin taskzenith -- --server-url http://127.0.0.1:9100 \
//!     move --project proj-1 --task task-4 --to in-progress
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskzenith::board::{
    BoardError, BoardEvent, BoardHandle, BoardSynchronizer, LoadOutcome, MoveOutcome,
};
use taskzenith::config::{CliArgs, ClientConfig, Command};
use taskzenith::render::{self, RenderOptions};
use taskzenith::store::http::HttpTaskStore;
use taskzenith::store::memory::InMemoryTaskStore;
use taskzenith::store::{StoreError, TaskStore};
use taskzenith_proto::task::TaskId;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no project given; pass --project or set [board] default_project")]
    NoProject,
    #[error("task {0} is not on the board")]
    TaskNotFound(TaskId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Board(#[from] BoardError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file so stdout carries only the rendered board.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let command = cli.command.clone().unwrap_or_default();
    tracing::info!(?command, offline = config.offline, "taskzenith starting");

    let result = if config.offline {
        run(InMemoryTaskStore::demo(), &config, command).await
    } else {
        match HttpTaskStore::new(&config.server_url, config.request_timeout) {
            Ok(store) => run(store, &config, command).await,
            Err(e) => Err(e.into()),
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskzenith.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run<S: TaskStore>(
    store: S,
    config: &ClientConfig,
    command: Command,
) -> Result<(), CliError> {
    let (board, mut events) = BoardSynchronizer::spawn(store, config.sync);
    let result = execute(&board, config, command).await;
    board.shutdown().await;
    print_notices(&mut events);
    result
}

async fn execute(
    board: &BoardHandle,
    config: &ClientConfig,
    command: Command,
) -> Result<(), CliError> {
    let options = RenderOptions {
        show_descriptions: config.show_descriptions,
    };
    let (project, task) = match &command {
        Command::Board { project } => (project.as_deref(), None),
        Command::Move { project, task, .. } | Command::Show { project, task } => {
            (project.as_deref(), Some(TaskId::new(task.as_str())))
        }
    };
    let project = config
        .project(project)
        .ok_or(CliError::NoProject)?
        .to_string();

    let hidden = match board.load(&project).await? {
        LoadOutcome::Applied { dropped, .. } => dropped.len(),
        LoadOutcome::Superseded => 0,
    };
    if hidden > 0 {
        eprintln!("note: {hidden} task(s) hidden because of an unrecognized status");
    }

    match (command, task) {
        (Command::Move { to, .. }, Some(task_id)) => {
            let outcome = board.move_task(&task_id, to).await;
            match outcome {
                Ok(MoveOutcome::Committed(record)) => {
                    println!("Moved \"{}\" to {}", record.title, record.status);
                }
                Ok(MoveOutcome::NotFound) => return Err(CliError::TaskNotFound(task_id)),
                Err(e) => {
                    print!("{}", render::board(&project, &board.columns(), options));
                    return Err(e.into());
                }
            }
            print!("{}", render::board(&project, &board.columns(), options));
        }
        (Command::Show { .. }, Some(task_id)) => {
            let found = board
                .select_task(&task_id)
                .ok_or(CliError::TaskNotFound(task_id))?;
            print!("{}", render::task(&found));
        }
        _ => print!("{}", render::board(&project, &board.columns(), options)),
    }
    Ok(())
}

fn print_notices(events: &mut mpsc::Receiver<BoardEvent>) {
    while let Ok(event) = events.try_recv() {
        if let BoardEvent::Notice(notice) = event {
            eprintln!("{notice}");
        }
    }
}
