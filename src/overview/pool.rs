//! Bounded arena of recyclable tiles.
//!
//! Tiles live in the pool for its whole lifetime and are addressed by [`TileId`]. Releasing a
//! tile bumps its slot generation, so a `TileId` held by an animation or callback after the tile
//! was recycled simply stops resolving instead of pointing at whatever got bound next.

use std::fmt;

use crate::error::RecentsError;

/// Reset hook invoked when a tile goes back to the free list.
pub trait Poolable {
    fn recycle(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    index: u32,
    generation: u32,
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Entry<T> {
    item: T,
    generation: u32,
    live: bool,
}

#[derive(Debug)]
pub struct TaskViewPool<T> {
    entries: Vec<Entry<T>>,
    /// Indices of released entries, most recently released last.
    free: Vec<u32>,
    capacity: usize,
}

impl<T: Poolable> TaskViewPool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of tiles currently handed out.
    pub fn live_count(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// How many more tiles can be acquired before the pool is exhausted.
    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.live_count())
    }

    /// Hands out a free tile, creating one with `create` if none is free and there's room.
    pub fn acquire(&mut self, create: impl FnOnce() -> T) -> Result<TileId, RecentsError> {
        if self.live_count() >= self.capacity {
            warn!("tile pool exhausted at {} tiles", self.capacity);
            return Err(RecentsError::PoolExhausted {
                capacity: self.capacity,
            });
        }

        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.live = true;
            return Ok(TileId {
                index,
                generation: entry.generation,
            });
        }

        let index = self.entries.len() as u32;
        trace!("allocating tile {index}");
        self.entries.push(Entry {
            item: create(),
            generation: 0,
            live: true,
        });
        Ok(TileId {
            index,
            generation: 0,
        })
    }

    /// Recycles a tile and returns it to the free list.
    ///
    /// Returns `false` if `id` was already stale.
    pub fn release(&mut self, id: TileId) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            debug!("ignoring release of stale tile {id}");
            return false;
        };

        entry.item.recycle();
        entry.live = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        true
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: TileId) -> Option<&T> {
        self.entries
            .get(id.index as usize)
            .filter(|entry| entry.live && entry.generation == id.generation)
            .map(|entry| &entry.item)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut T> {
        self.entry_mut(id).map(|entry| &mut entry.item)
    }

    /// Live tiles in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &T)> + '_ {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            entry.live.then_some((
                TileId {
                    index: index as u32,
                    generation: entry.generation,
                },
                &entry.item,
            ))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TileId, &mut T)> + '_ {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(index, entry)| {
                let id = TileId {
                    index: index as u32,
                    generation: entry.generation,
                };
                entry.live.then_some((id, &mut entry.item))
            })
    }

    fn entry_mut(&mut self, id: TileId) -> Option<&mut Entry<T>> {
        self.entries
            .get_mut(id.index as usize)
            .filter(|entry| entry.live && entry.generation == id.generation)
    }
}
