//! The board synchronizer actor.
//!
//! A single tokio task owns the [`Board`] and applies every mutation in the
//! order its commands arrive. Store calls run in their own tasks and report
//! back into the same command channel, so a slow store never blocks reads or
//! further moves.
//!
//! ```text
//! BoardHandle ── Command ──▶ actor ── spawn ──▶ TaskStore
//!      ▲                      │  ▲                 │
//!      │ watch<BoardView>     │  └── Fetched / Updated
//!      └──────────────────────┤
//!                             └── BoardEvent ──▶ presentation
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use taskzenith_proto::task::{StatusValue, Task, TaskId, TaskPatch, TaskStatus};

use super::columns::Columns;
use super::state::{Board, LoadTicket, MoveId, MoveStart, PendingMove};
use super::{BoardError, LoadOutcome, MoveOutcome};
use crate::store::{StoreError, TaskStore};

/// Default capacity of the command channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Default capacity of the [`BoardEvent`] channel.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Channel sizing for [`BoardSynchronizer::spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Capacity of the command channel.
    pub channel_capacity: usize,
    /// Capacity of the event channel. Events are dropped when it is full.
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Everything a renderer needs, published after each mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardView {
    /// Project of the last applied load.
    pub project_id: Option<String>,
    /// Current columns, including optimistic moves.
    pub columns: Columns,
    /// Whether a load is outstanding.
    pub loading: bool,
    /// Moves not yet confirmed by the store.
    pub pending_moves: usize,
}

impl BoardView {
    fn of(board: &Board) -> Self {
        Self {
            project_id: board.project_id().map(str::to_string),
            columns: board.columns().clone(),
            loading: board.loading(),
            pending_moves: board.pending_moves(),
        }
    }
}

/// User-visible notification of a recovered failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A load failed; the previous board is still shown.
    FetchFailed {
        /// Project that could not be loaded.
        project_id: String,
        /// Store error, rendered.
        reason: String,
    },
    /// A move could not be saved and was undone.
    MoveReverted {
        /// Task whose move was undone.
        task_id: TaskId,
        /// Task title, if the task is still on the board.
        title: Option<String>,
        /// Store error, rendered.
        reason: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed { project_id, reason } => {
                write!(f, "could not load tasks for {project_id}: {reason}")
            }
            Self::MoveReverted {
                task_id,
                title,
                reason,
            } => {
                let name = title.as_deref().unwrap_or_else(|| task_id.as_str());
                write!(f, "change to \"{name}\" was reverted: {reason}")
            }
        }
    }
}

/// Events emitted by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// A load replaced the board.
    Loaded {
        /// Loaded project.
        project_id: String,
        /// Tasks placed on the board.
        task_count: usize,
        /// Tasks left out because of an unrecognized status.
        dropped: Vec<TaskId>,
    },
    /// The store accepted a move.
    MoveCommitted {
        /// Moved task.
        task_id: TaskId,
        /// Status reported by the store.
        status: StatusValue,
    },
    /// Something failed and was recovered from.
    Notice(Notice),
}

type LoadReply = oneshot::Sender<Result<LoadOutcome, BoardError>>;
type MoveReply = oneshot::Sender<Result<MoveOutcome, BoardError>>;

#[derive(Debug)]
enum Command {
    Load {
        project_id: String,
        reply: LoadReply,
    },
    Move {
        task_id: TaskId,
        target: TaskStatus,
        ack: oneshot::Sender<MoveTicket>,
    },
    Fetched {
        ticket: LoadTicket,
        result: Result<Vec<Task>, StoreError>,
        reply: LoadReply,
    },
    Updated {
        pending: PendingMove,
        result: Result<Task, StoreError>,
    },
    Shutdown,
}

/// A move that has been applied to the board and awaits the store.
#[derive(Debug)]
pub struct MoveTicket {
    state: TicketState,
}

#[derive(Debug)]
enum TicketState {
    NotFound,
    Pending(oneshot::Receiver<Result<MoveOutcome, BoardError>>),
}

impl MoveTicket {
    /// Whether the move was applied. `false` means the task was not on the board.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self.state, TicketState::Pending(_))
    }

    /// Waits for the store's verdict.
    ///
    /// # Errors
    ///
    /// [`BoardError::UpdateFailed`] if the move was reverted, or
    /// [`BoardError::Closed`] if the synchronizer stopped first.
    pub async fn settled(self) -> Result<MoveOutcome, BoardError> {
        match self.state {
            TicketState::NotFound => Ok(MoveOutcome::NotFound),
            TicketState::Pending(rx) => rx.await.map_err(|_| BoardError::Closed)?,
        }
    }
}

/// Cloneable handle to a running synchronizer.
#[derive(Debug, Clone)]
pub struct BoardHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<BoardView>,
}

impl BoardHandle {
    /// Fetches `project_id` and replaces the board with it.
    ///
    /// # Errors
    ///
    /// [`BoardError::FetchFailed`] if the fetch failed (the previous board is
    /// kept), or [`BoardError::Closed`].
    pub async fn load(&self, project_id: &str) -> Result<LoadOutcome, BoardError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Load {
            project_id: project_id.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| BoardError::Closed)?
    }

    /// Applies a move optimistically and returns once it is visible.
    ///
    /// # Errors
    ///
    /// [`BoardError::Closed`] if the synchronizer has stopped.
    pub async fn begin_move(
        &self,
        task_id: &TaskId,
        target: TaskStatus,
    ) -> Result<MoveTicket, BoardError> {
        let (ack, rx) = oneshot::channel();
        self.send(Command::Move {
            task_id: task_id.clone(),
            target,
            ack,
        })
        .await?;
        rx.await.map_err(|_| BoardError::Closed)
    }

    /// Moves a task and waits until the store confirms or the move is reverted.
    ///
    /// # Errors
    ///
    /// See [`MoveTicket::settled`].
    pub async fn move_task(
        &self,
        task_id: &TaskId,
        target: TaskStatus,
    ) -> Result<MoveOutcome, BoardError> {
        self.begin_move(task_id, target).await?.settled().await
    }

    /// Looks up a task on the current board.
    #[must_use]
    pub fn select_task(&self, task_id: &TaskId) -> Option<Task> {
        self.view.borrow().columns.task(task_id).cloned()
    }

    /// The current columns.
    #[must_use]
    pub fn columns(&self) -> Columns {
        self.view.borrow().columns.clone()
    }

    /// The current view.
    #[must_use]
    pub fn view(&self) -> BoardView {
        self.view.borrow().clone()
    }

    /// A receiver notified after every published mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BoardView> {
        self.view.clone()
    }

    /// Stops the synchronizer. Outstanding calls resolve to [`BoardError::Closed`].
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn send(&self, command: Command) -> Result<(), BoardError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| BoardError::Closed)
    }
}

/// The actor owning a [`Board`].
pub struct BoardSynchronizer<S> {
    board: Board,
    store: Arc<S>,
    commands: mpsc::WeakSender<Command>,
    view: watch::Sender<BoardView>,
    events: mpsc::Sender<BoardEvent>,
    moves: HashMap<MoveId, MoveReply>,
}

impl<S: TaskStore> BoardSynchronizer<S> {
    /// Spawns the actor on the current tokio runtime.
    ///
    /// The actor stops on [`BoardHandle::shutdown`] or once every handle is
    /// dropped and no store call is outstanding.
    #[must_use]
    pub fn spawn(store: S, config: SyncConfig) -> (BoardHandle, mpsc::Receiver<BoardEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let (view_tx, view_rx) = watch::channel(BoardView::default());

        let actor = Self {
            board: Board::new(),
            store: Arc::new(store),
            commands: cmd_tx.downgrade(),
            view: view_tx,
            events: event_tx,
            moves: HashMap::new(),
        };
        tokio::spawn(actor.run(cmd_rx));

        let handle = BoardHandle {
            commands: cmd_tx,
            view: view_rx,
        };
        (handle, event_rx)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::debug!("board synchronizer started");
        while let Some(command) = rx.recv().await {
            match command {
                Command::Load { project_id, reply } => self.on_load(project_id, reply),
                Command::Move {
                    task_id,
                    target,
                    ack,
                } => self.on_move(&task_id, target, ack),
                Command::Fetched {
                    ticket,
                    result,
                    reply,
                } => self.on_fetched(ticket, result, reply),
                Command::Updated { pending, result } => self.on_updated(pending, result),
                Command::Shutdown => break,
            }
        }
        tracing::debug!(
            unresolved = self.moves.len(),
            "board synchronizer stopped"
        );
    }

    fn on_load(&mut self, project_id: String, reply: LoadReply) {
        let ticket = self.board.begin_load(&project_id);
        self.publish();
        let Some(commands) = self.commands.upgrade() else {
            return;
        };
        let store = Arc::clone(&self.store);
        tracing::debug!(project_id = %project_id, "loading board");
        tokio::spawn(async move {
            let result = store.fetch_by_project(&project_id).await;
            let _ = commands
                .send(Command::Fetched {
                    ticket,
                    result,
                    reply,
                })
                .await;
        });
    }

    fn on_fetched(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Task>, StoreError>,
        reply: LoadReply,
    ) {
        let project_id = ticket.project_id().to_string();
        let outcome = match self.board.finish_load(ticket, result) {
            Ok(LoadOutcome::Superseded) => {
                tracing::debug!(project_id = %project_id, "discarding superseded load");
                Ok(LoadOutcome::Superseded)
            }
            Ok(LoadOutcome::Applied {
                task_count,
                dropped,
            }) => {
                self.publish();
                for task_id in &dropped {
                    tracing::warn!(
                        project_id = %project_id,
                        task_id = %task_id,
                        "dropping task with unrecognized status"
                    );
                }
                tracing::info!(project_id = %project_id, task_count, "board loaded");
                self.emit(BoardEvent::Loaded {
                    project_id,
                    task_count,
                    dropped: dropped.clone(),
                });
                Ok(LoadOutcome::Applied {
                    task_count,
                    dropped,
                })
            }
            Err(source) => {
                self.publish();
                tracing::warn!(project_id = %project_id, error = %source, "board load failed");
                self.emit(BoardEvent::Notice(Notice::FetchFailed {
                    project_id: project_id.clone(),
                    reason: source.to_string(),
                }));
                Err(BoardError::FetchFailed { project_id, source })
            }
        };
        let _ = reply.send(outcome);
    }

    fn on_move(&mut self, task_id: &TaskId, target: TaskStatus, ack: oneshot::Sender<MoveTicket>) {
        let (reply, rx) = oneshot::channel();
        let ticket = match self.board.begin_move(task_id, target) {
            MoveStart::NotFound => {
                tracing::debug!(task_id = %task_id, "move ignored, task not on board");
                let _ = ack.send(MoveTicket {
                    state: TicketState::NotFound,
                });
                return;
            }
            MoveStart::Dispatch(pending) => {
                self.moves.insert(pending.move_id, reply);
                self.publish();
                self.dispatch(pending);
                MoveTicket {
                    state: TicketState::Pending(rx),
                }
            }
            MoveStart::Queued(move_id) => {
                tracing::debug!(task_id = %task_id, %move_id, "move queued behind earlier move");
                self.moves.insert(move_id, reply);
                self.publish();
                MoveTicket {
                    state: TicketState::Pending(rx),
                }
            }
        };
        let _ = ack.send(ticket);
    }

    fn on_updated(&mut self, pending: PendingMove, result: Result<Task, StoreError>) {
        let reply = self.moves.remove(&pending.move_id);
        let next = match result {
            Ok(record) => {
                let status = record.status.clone();
                let next = self.board.commit_move(pending.move_id, record.clone());
                self.publish();
                tracing::info!(task_id = %pending.task_id, %status, "move committed");
                self.emit(BoardEvent::MoveCommitted {
                    task_id: pending.task_id,
                    status,
                });
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(MoveOutcome::Committed(record)));
                }
                next
            }
            Err(source) => {
                let resolution = self.board.fail_move(pending.move_id);
                self.publish();
                tracing::warn!(
                    task_id = %pending.task_id,
                    target = %pending.target,
                    error = %source,
                    "move reverted"
                );
                let (title, next) = resolution.map_or((None, None), |r| (r.title, r.next));
                self.emit(BoardEvent::Notice(Notice::MoveReverted {
                    task_id: pending.task_id.clone(),
                    title,
                    reason: source.to_string(),
                }));
                if let Some(reply) = reply {
                    let _ = reply.send(Err(BoardError::UpdateFailed {
                        task_id: pending.task_id,
                        source,
                    }));
                }
                next
            }
        };
        if let Some(next) = next {
            self.dispatch(next);
        }
    }

    fn dispatch(&self, pending: PendingMove) {
        let Some(commands) = self.commands.upgrade() else {
            return;
        };
        let store = Arc::clone(&self.store);
        tracing::debug!(task_id = %pending.task_id, target = %pending.target, "persisting move");
        tokio::spawn(async move {
            let patch = TaskPatch::status(pending.target);
            let result = store.update(&pending.task_id, &patch).await;
            let _ = commands.send(Command::Updated { pending, result }).await;
        });
    }

    fn publish(&self) {
        self.view.send_replace(BoardView::of(&self.board));
    }

    fn emit(&self, event: BoardEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.events.try_send(event) {
            tracing::warn!(?event, "event channel full, dropping event");
        }
    }
}
