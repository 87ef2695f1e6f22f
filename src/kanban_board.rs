use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{BoardError, Result};
use crate::seed;
use crate::storage::{KeyValueStore, ACTIVE_BOARD_KEY, SIDEBAR_KEY, TASKS_KEY, THEME_KEY};
use crate::task::{NewTask, Status, Task, TaskId, TaskPatch};

/// Task list and UI flags read from and written back to a key-value store.
///
/// Every operation loads the whole task list, changes it and writes the whole
/// list back; nothing is cached between calls.
#[derive(Debug)]
pub struct KanbanBoard<S> {
    store: S,
}

impl<S: KeyValueStore> KanbanBoard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes first-run data when no task list has been stored yet.
    ///
    /// Returns `true` when storage was initialized by this call.
    #[tracing::instrument(skip(self))]
    pub fn initialize(&mut self, with_seed: bool) -> Result<bool> {
        if self.store.get_item(TASKS_KEY)?.is_some() {
            debug!("data already exists in storage");
            return Ok(false);
        }

        let tasks = if with_seed {
            seed::initial_tasks()
        } else {
            Vec::new()
        };
        self.save(&tasks)?;
        self.set_sidebar_visible(true)?;
        self.set_light_theme(false)?;
        info!(tasks = tasks.len(), "initialized storage");
        Ok(true)
    }

    #[tracing::instrument(skip(self))]
    pub fn reset(&mut self, with_seed: bool) -> Result<()> {
        warn!("discarding stored board data");
        self.store.clear()?;
        self.initialize(with_seed)?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<Task>> {
        let Some(raw) = self.store.get_item(TASKS_KEY)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|source| BoardError::Corrupt {
            key: TASKS_KEY.to_string(),
            source,
        })
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let raw = serde_json::to_string(tasks)?;
        self.store.set_item(TASKS_KEY, &raw)
    }

    pub fn get(&self, id: TaskId) -> Result<Task> {
        self.list()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(BoardError::TaskNotFound(id))
    }

    #[tracing::instrument(skip(self, new_task), fields(board = %new_task.board, status = %new_task.status))]
    pub fn create(&mut self, new_task: NewTask) -> Result<Task> {
        let mut tasks = self.list()?;
        let id = next_id(&tasks, Utc::now().timestamp_millis());
        let task = new_task.into_task(id);
        tasks.push(task.clone());
        self.save(&tasks)?;
        info!(id, "created task");
        Ok(task)
    }

    #[tracing::instrument(skip(self, patch))]
    pub fn patch(&mut self, id: TaskId, patch: &TaskPatch) -> Result<()> {
        let mut tasks = self.list()?;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            warn!(id, "patch skipped, task not found");
            return Ok(());
        };
        task.apply(patch);
        self.save(&tasks)?;
        info!(id, "patched task");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, id: TaskId) -> Result<()> {
        let mut tasks = self.list()?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            warn!(id, "delete skipped, task not found");
            return Ok(());
        }
        self.save(&tasks)?;
        info!(id, "deleted task");
        Ok(())
    }

    pub fn boards(&self) -> Result<Vec<String>> {
        Ok(distinct_boards(&self.list()?))
    }

    pub fn tasks_for(&self, board: &str, status: Status) -> Result<Vec<Task>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|t| t.is_on(board, status))
            .collect())
    }

    pub fn active_board(&self) -> Result<Option<String>> {
        let Some(raw) = self.store.get_item(ACTIVE_BOARD_KEY)? else {
            return Ok(None);
        };
        let name: Option<String> =
            serde_json::from_str(&raw).map_err(|source| BoardError::Corrupt {
                key: ACTIVE_BOARD_KEY.to_string(),
                source,
            })?;
        Ok(name.filter(|n| !n.is_empty()))
    }

    pub fn set_active_board(&mut self, name: &str) -> Result<()> {
        let raw = serde_json::to_string(name)?;
        self.store.set_item(ACTIVE_BOARD_KEY, &raw)
    }

    pub fn sidebar_visible(&self) -> Result<bool> {
        Ok(self.store.get_item(SIDEBAR_KEY)?.as_deref() != Some("false"))
    }

    pub fn set_sidebar_visible(&mut self, show: bool) -> Result<()> {
        self.store
            .set_item(SIDEBAR_KEY, if show { "true" } else { "false" })
    }

    pub fn light_theme(&self) -> Result<bool> {
        Ok(self.store.get_item(THEME_KEY)?.as_deref() == Some("enabled"))
    }

    pub fn set_light_theme(&mut self, enabled: bool) -> Result<()> {
        self.store
            .set_item(THEME_KEY, if enabled { "enabled" } else { "disabled" })
    }
}

/// Distinct non-empty board names in order of first appearance.
pub fn distinct_boards(tasks: &[Task]) -> Vec<String> {
    let mut boards: Vec<String> = Vec::new();
    for task in tasks {
        if !task.board.is_empty() && !boards.contains(&task.board) {
            boards.push(task.board.clone());
        }
    }
    boards
}

/// Clock-derived id, bumped past the largest stored id. Once the id space is
/// exhausted at the top, the smallest free id is reused.
fn next_id(tasks: &[Task], now_millis: i64) -> TaskId {
    let now = TaskId::try_from(now_millis).unwrap_or(0);
    match tasks.iter().map(|t| t.id).max() {
        Some(max) if now <= max => max
            .checked_add(1)
            .unwrap_or_else(|| smallest_free_id(tasks)),
        _ => now,
    }
}

fn smallest_free_id(tasks: &[Task]) -> TaskId {
    let used: HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();
    (0..).find(|id| !used.contains(id)).unwrap_or_default()
}
