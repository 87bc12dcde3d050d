//! Replay memory shared by parallel producers.
use super::ReplayMemory;
use crate::error::ArmRlError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A [`ReplayMemory`] behind a single lock.
///
/// Cloning gives another handle to the same buffer. The lock covers both the
/// cursor and the storage, so concurrent pushes never race on a slot.
pub struct SharedReplayMemory<T> {
    inner: Arc<Mutex<ReplayMemory<T>>>,
}

impl<T> Clone for SharedReplayMemory<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> SharedReplayMemory<T> {
    /// Creates an empty shared buffer.
    pub fn new(capacity: usize, seed: u64) -> Result<Self, ArmRlError> {
        Ok(Self {
            inner: Arc::new(Mutex::new(ReplayMemory::new(capacity, seed)?)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ReplayMemory<T>> {
        // push writes a single slot, so a poisoned buffer is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts an item.
    pub fn push(&self, item: T) {
        self.lock().push(item);
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Slot written by the next push.
    pub fn cursor(&self) -> usize {
        self.lock().cursor()
    }
}

impl<T: Clone> SharedReplayMemory<T> {
    /// Samples `k` distinct items and returns their copies.
    pub fn sample(&self, k: usize) -> Result<Vec<T>, ArmRlError> {
        let mut memory = self.lock();
        Ok(memory.sample(k)?.into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_parallel_producers() {
        let memory = SharedReplayMemory::new(1000, 42).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let memory = memory.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        memory.push(t * 100 + i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(memory.len(), 400);
        assert_eq!(memory.cursor(), 400);

        let mut items = memory.sample(400).unwrap();
        items.sort();
        assert_eq!(items, (0..400).collect::<Vec<_>>());
    }
}
