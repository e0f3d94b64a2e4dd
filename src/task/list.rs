use super::{IconHandle, TaskId, TaskRecord};
use crate::error::RecentsError;

/// Ordered in-memory mirror of the running task stack.
///
/// Every structural change bumps the generation, so indices handed out under an older generation
/// can be detected as stale.
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<TaskRecord>,
    generation: u64,
}

/// Copy of the list at one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskListSnapshot {
    pub tasks: Vec<TaskRecord>,
    pub generation: u64,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn get(&self, idx: usize) -> Option<&TaskRecord> {
        self.tasks.get(idx)
    }

    pub fn index_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index_of(id).is_some()
    }

    /// Looks up a task by index, validating the caller's generation first.
    pub fn task_at(&self, idx: usize, generation: u64) -> Result<&TaskRecord, RecentsError> {
        if generation != self.generation {
            return Err(RecentsError::StaleGeneration {
                held: generation,
                current: self.generation,
            });
        }

        self.tasks.get(idx).ok_or(RecentsError::NoSuchIndex(idx))
    }

    /// Replaces the whole list, returning the new generation.
    pub fn replace(&mut self, tasks: Vec<TaskRecord>) -> u64 {
        self.tasks = tasks;
        self.bump()
    }

    pub fn remove(&mut self, id: TaskId) -> Option<(usize, TaskRecord)> {
        let idx = self.index_of(id)?;
        let task = self.tasks.remove(idx);
        self.bump();
        Some((idx, task))
    }

    pub fn move_task(&mut self, from: usize, to: usize) -> Result<(), RecentsError> {
        if from >= self.tasks.len() {
            return Err(RecentsError::NoSuchIndex(from));
        }
        if to >= self.tasks.len() {
            return Err(RecentsError::NoSuchIndex(to));
        }

        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        self.bump();
        Ok(())
    }

    /// Updates the icon of a task in place. Not a structural change.
    pub fn set_icon(&mut self, id: TaskId, icon: IconHandle) -> Result<(), RecentsError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(RecentsError::NoSuchTask(id))?;
        task.icon = Some(icon);
        Ok(())
    }

    pub fn snapshot(&self) -> TaskListSnapshot {
        TaskListSnapshot {
            tasks: self.tasks.clone(),
            generation: self.generation,
        }
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}
