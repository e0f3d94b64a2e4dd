use crate::overview::pool::TileId;
use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecentsError {
    #[error("task view pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },
    #[error("stale task list generation {held}, current is {current}")]
    StaleGeneration { held: u64, current: u64 },
    #[error("tile {0:?} is not bound to a task")]
    UnknownTile(TileId),
    #[error("no task with id {0}")]
    NoSuchTask(TaskId),
    #[error("no task at index {0}")]
    NoSuchIndex(usize),
}
