//! Task manager — maps A2A task requests onto a sample agent
//!
//! Tasks live in memory for the life of the process. Requests are validated
//! against the agent's content types before anything is stored.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use scout_core::{RunEvent, SampleAgent};

use crate::protocol::*;

/// Handles the task methods of the A2A protocol
#[async_trait]
pub trait TaskManager: Send + Sync {
    async fn on_send_task(&self, params: TaskSendParams) -> Result<Task, A2aError>;

    async fn on_send_task_subscribe(
        &self,
        params: TaskSendParams,
    ) -> Result<mpsc::Receiver<TaskEvent>, A2aError>;

    async fn on_get_task(&self, params: TaskQueryParams) -> Result<Task, A2aError>;

    async fn on_cancel_task(&self, params: TaskIdParams) -> Result<Task, A2aError>;

    async fn on_resubscribe_to_task(
        &self,
        _params: TaskQueryParams,
    ) -> Result<mpsc::Receiver<TaskEvent>, A2aError> {
        Err(A2aError::UnsupportedOperation)
    }
}

type TaskStore = Arc<RwLock<HashMap<String, Task>>>;

/// In-memory task manager backed by a [`SampleAgent`]
pub struct AgentTaskManager<A> {
    agent: Arc<A>,
    tasks: TaskStore,
}

impl<A: SampleAgent> AgentTaskManager<A> {
    pub fn new(agent: A) -> Self {
        Self::from_arc(Arc::new(agent))
    }

    pub fn from_arc(agent: Arc<A>) -> Self {
        Self {
            agent,
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn agent(&self) -> &Arc<A> {
        &self.agent
    }

    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Check the request against what the agent can serve and pull out the query text
    fn validate(&self, params: &TaskSendParams) -> Result<String, A2aError> {
        if !modes_compatible(
            self.agent.supported_content_types(),
            params.accepted_output_modes.as_deref(),
        ) {
            warn!(
                "Unsupported output mode. Received {:?}, support {:?}",
                params.accepted_output_modes,
                self.agent.supported_content_types()
            );
            return Err(A2aError::ContentTypeNotSupported);
        }

        if params.push_notification.is_some() {
            return Err(A2aError::PushNotificationNotSupported);
        }

        let texts: Vec<&str> = params.message.parts.iter().filter_map(Part::as_text).collect();
        if texts.is_empty() || texts.len() != params.message.parts.len() {
            return Err(A2aError::InvalidParams(
                "Only text parts are supported".to_string(),
            ));
        }
        Ok(texts.join("\n"))
    }

    async fn upsert_task(&self, params: &TaskSendParams) {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&params.id) {
            Some(task) => {
                task.history
                    .get_or_insert_with(Vec::new)
                    .push(params.message.clone());
            }
            None => {
                debug!("Creating task {}", params.id);
                tasks.insert(
                    params.id.clone(),
                    Task {
                        id: params.id.clone(),
                        session_id: Some(params.session_id.clone()),
                        status: TaskStatus::new(TaskState::Submitted, None),
                        artifacts: None,
                        history: Some(vec![params.message.clone()]),
                        metadata: params.metadata.clone(),
                    },
                );
            }
        }
    }
}

/// Empty or missing client modes accept anything
fn modes_compatible(server: &[&str], client: Option<&[String]>) -> bool {
    match client {
        None => true,
        Some([]) => true,
        Some(client) => client.iter().any(|mode| server.contains(&mode.as_str())),
    }
}

/// Copy of a task with history cut to the most recent `history_length` messages
fn with_history(task: &Task, history_length: Option<usize>) -> Task {
    let mut task = task.clone();
    task.history = Some(match (task.history.take(), history_length) {
        (Some(history), Some(n)) if n > 0 => {
            let skip = history.len().saturating_sub(n);
            history.into_iter().skip(skip).collect()
        }
        _ => Vec::new(),
    });
    task
}

/// Record a status change (and optional artifact) against a stored task
async fn update_store(
    tasks: &TaskStore,
    task_id: &str,
    status: TaskStatus,
    artifacts: Option<Vec<Artifact>>,
) -> Result<Task, A2aError> {
    let mut tasks = tasks.write().await;
    let task = tasks.get_mut(task_id).ok_or(A2aError::TaskNotFound)?;
    if let Some(message) = &status.message {
        task.history
            .get_or_insert_with(Vec::new)
            .push(message.clone());
    }
    task.status = status;
    if let Some(new) = artifacts {
        task.artifacts.get_or_insert_with(Vec::new).extend(new);
    }
    Ok(task.clone())
}

#[async_trait]
impl<A: SampleAgent> TaskManager for AgentTaskManager<A> {
    async fn on_send_task(&self, params: TaskSendParams) -> Result<Task, A2aError> {
        let query = self.validate(&params)?;
        self.upsert_task(&params).await;
        update_store(
            &self.tasks,
            &params.id,
            TaskStatus::new(TaskState::Working, None),
            None,
        )
        .await?;

        info!("Task {} sent to {}", params.id, self.agent.agent().name);
        let task = match self.agent.invoke(&query, &params.session_id).await {
            Ok(text) => {
                let parts = vec![Part::text(text)];
                let message = Message {
                    role: Role::Agent,
                    parts: parts.clone(),
                    metadata: None,
                };
                update_store(
                    &self.tasks,
                    &params.id,
                    TaskStatus::new(TaskState::Completed, Some(message)),
                    Some(vec![Artifact::from_parts(parts)]),
                )
                .await?
            }
            Err(e) => {
                error!("Error invoking agent for task {}: {}", params.id, e);
                update_store(
                    &self.tasks,
                    &params.id,
                    TaskStatus::new(
                        TaskState::Failed,
                        Some(Message::agent_text(format!("Error invoking agent: {}", e))),
                    ),
                    None,
                )
                .await?
            }
        };

        Ok(with_history(&task, params.history_length))
    }

    async fn on_send_task_subscribe(
        &self,
        params: TaskSendParams,
    ) -> Result<mpsc::Receiver<TaskEvent>, A2aError> {
        let query = self.validate(&params)?;
        self.upsert_task(&params).await;

        let mut runs = self.agent.stream(&query, &params.session_id);
        let (tx, rx) = mpsc::channel(16);
        let tasks = Arc::clone(&self.tasks);
        let task_id = params.id.clone();

        tokio::spawn(async move {
            while let Some(event) = runs.recv().await {
                let mut events = Vec::new();
                let status = match event {
                    RunEvent::Working { message } => {
                        TaskStatus::new(TaskState::Working, Some(Message::agent_text(message)))
                    }
                    RunEvent::Completed { text } => {
                        let artifact = Artifact::from_parts(vec![Part::text(text.clone())]);
                        events.push(TaskEvent::Artifact(TaskArtifactUpdateEvent {
                            id: task_id.clone(),
                            artifact: artifact.clone(),
                            metadata: None,
                        }));
                        if let Err(e) = update_store(
                            &tasks,
                            &task_id,
                            TaskStatus::new(TaskState::Working, None),
                            Some(vec![artifact]),
                        )
                        .await
                        {
                            warn!("Task {} vanished while streaming: {}", task_id, e);
                        }
                        TaskStatus::new(TaskState::Completed, Some(Message::agent_text(text)))
                    }
                    RunEvent::Failed { error } => {
                        error!("Streaming task {} failed: {}", task_id, error);
                        TaskStatus::new(
                            TaskState::Failed,
                            Some(Message::agent_text(format!("Error invoking agent: {}", error))),
                        )
                    }
                };

                let is_final = status.state.is_terminal();
                if let Err(e) = update_store(&tasks, &task_id, status.clone(), None).await {
                    warn!("Task {} vanished while streaming: {}", task_id, e);
                }
                events.push(TaskEvent::Status(TaskStatusUpdateEvent {
                    id: task_id.clone(),
                    status,
                    is_final,
                    metadata: None,
                }));

                for event in events {
                    if tx.send(event).await.is_err() {
                        debug!("Subscriber for task {} went away", task_id);
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn on_get_task(&self, params: TaskQueryParams) -> Result<Task, A2aError> {
        debug!("Getting task {}", params.id);
        let tasks = self.tasks.read().await;
        let task = tasks.get(&params.id).ok_or(A2aError::TaskNotFound)?;
        Ok(with_history(task, params.history_length))
    }

    async fn on_cancel_task(&self, params: TaskIdParams) -> Result<Task, A2aError> {
        debug!("Cancelling task {}", params.id);
        if !self.tasks.read().await.contains_key(&params.id) {
            return Err(A2aError::TaskNotFound);
        }
        Err(A2aError::TaskNotCancelable)
    }
}
