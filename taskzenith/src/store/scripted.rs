//! Hand-driven task store for tests.
//!
//! Every call is forwarded over an [`mpsc`] channel as a [`ScriptedCall`]
//! and suspends until the test answers it. Tests therefore decide both the
//! result and the completion order of concurrent store calls, e.g. to let a
//! newer fetch finish before an older one.

use tokio::sync::{mpsc, oneshot};

use taskzenith_proto::task::{Task, TaskId, TaskPatch};

use super::{StoreError, TaskStore};

/// A store call waiting for the test to answer.
#[derive(Debug)]
pub enum ScriptedCall {
    /// `fetch_by_project` was called.
    Fetch {
        /// Requested project.
        project_id: String,
        /// Completes the call.
        reply: oneshot::Sender<Result<Vec<Task>, StoreError>>,
    },
    /// `update` was called.
    Update {
        /// Target task.
        task_id: TaskId,
        /// Submitted patch.
        patch: TaskPatch,
        /// Completes the call.
        reply: oneshot::Sender<Result<Task, StoreError>>,
    },
}

/// [`TaskStore`] whose calls are answered by the test through [`ScriptedCall`]s.
#[derive(Debug, Clone)]
pub struct ScriptedTaskStore {
    calls: mpsc::Sender<ScriptedCall>,
}

impl ScriptedTaskStore {
    /// Creates a store and the receiver its calls arrive on.
    #[must_use]
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<ScriptedCall>) {
        let (calls, rx) = mpsc::channel(buffer);
        (Self { calls }, rx)
    }

    async fn forward<T>(
        &self,
        call: ScriptedCall,
        rx: oneshot::Receiver<Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        self.calls
            .send(call)
            .await
            .map_err(|_| StoreError::Unavailable("script receiver dropped".to_string()))?;
        rx.await
            .map_err(|_| StoreError::Unavailable("call dropped without reply".to_string()))?
    }
}

impl TaskStore for ScriptedTaskStore {
    async fn fetch_by_project(&self, project_id: &str) -> Result<Vec<Task>, StoreError> {
        let (reply, rx) = oneshot::channel();
        let call = ScriptedCall::Fetch {
            project_id: project_id.to_string(),
            reply,
        };
        self.forward(call, rx).await
    }

    async fn update(&self, task_id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let (reply, rx) = oneshot::channel();
        let call = ScriptedCall::Update {
            task_id: task_id.clone(),
            patch: patch.clone(),
            reply,
        };
        self.forward(call, rx).await
    }
}
