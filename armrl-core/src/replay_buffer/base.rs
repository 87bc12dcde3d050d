//! Ring-buffer replay memory.
use super::{ReplayMemoryConfig, Transition, TransitionBatch};
use crate::{error::ArmRlError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};

/// Draws `k` distinct indices out of `0..n`.
fn sample_indices<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    k: usize,
) -> Result<Vec<usize>, ArmRlError> {
    if k == 0 {
        return Err(ArmRlError::EmptySample);
    }
    if k > n {
        return Err(ArmRlError::InsufficientData {
            requested: k,
            available: n,
        });
    }
    Ok(index::sample(rng, n, k).into_vec())
}

/// Fixed-capacity ring buffer with uniform sampling without replacement.
///
/// Until the buffer is full, items are appended. After that, the item at the
/// cursor is overwritten, so the oldest item is always evicted first.
pub struct ReplayMemory<T> {
    capacity: usize,
    cursor: usize,
    memory: Vec<T>,
    rng: StdRng,
}

impl<T> ReplayMemory<T> {
    /// Creates an empty buffer.
    ///
    /// `seed` initializes the random number generator used by [`ReplayMemory::sample`].
    pub fn new(capacity: usize, seed: u64) -> Result<Self, ArmRlError> {
        if capacity == 0 {
            return Err(ArmRlError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            cursor: 0,
            memory: Vec::with_capacity(capacity),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Inserts an item, overwriting the oldest one if the buffer is full.
    pub fn push(&mut self, item: T) {
        if self.memory.len() < self.capacity {
            self.memory.push(item);
        } else {
            self.memory[self.cursor] = item;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
    }

    /// Samples `k` distinct slot indices with the internal generator.
    pub fn sample_indices(&mut self, k: usize) -> Result<Vec<usize>, ArmRlError> {
        sample_indices(&mut self.rng, self.memory.len(), k)
    }

    /// Samples `k` distinct items with the internal generator.
    ///
    /// The order of the returned items is unspecified.
    pub fn sample(&mut self, k: usize) -> Result<Vec<&T>, ArmRlError> {
        let ixs = sample_indices(&mut self.rng, self.memory.len(), k)?;
        Ok(ixs.into_iter().map(|ix| &self.memory[ix]).collect())
    }

    /// Samples `k` distinct items with the given generator.
    pub fn sample_with<R: Rng + ?Sized>(
        &self,
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<&T>, ArmRlError> {
        let ixs = sample_indices(rng, self.memory.len(), k)?;
        Ok(ixs.into_iter().map(|ix| &self.memory[ix]).collect())
    }

    /// Returns the item stored in the given slot.
    pub fn get(&self, ix: usize) -> Option<&T> {
        self.memory.get(ix)
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns `true` if nothing has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Returns `true` if the next push evicts an item.
    pub fn is_full(&self) -> bool {
        self.memory.len() == self.capacity
    }

    /// Maximum number of stored items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot written by the next push.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Iterates over items in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.memory.iter()
    }
}

impl<O, A> ExperienceBufferBase for ReplayMemory<Transition<O, A>> {
    type Item = Transition<O, A>;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        ReplayMemory::push(self, tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.memory.len()
    }
}

impl<O: Clone, A: Clone> ReplayBufferBase for ReplayMemory<Transition<O, A>> {
    type Config = ReplayMemoryConfig;
    type Batch = TransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self::new(config.capacity, config.seed)?)
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let ixs = self.sample_indices(size)?;
        let batch = TransitionBatch::from_indexed(
            ixs.iter().map(|&ix| (ix, &self.memory[ix])),
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, n: usize) -> ReplayMemory<usize> {
        let mut memory = ReplayMemory::new(capacity, 42).unwrap();
        (0..n).for_each(|i| memory.push(i));
        memory
    }

    #[test]
    fn test_zero_capacity() {
        assert_eq!(
            ReplayMemory::<usize>::new(0, 42).err(),
            Some(ArmRlError::InvalidCapacity(0))
        );
    }

    #[test]
    fn test_capacity_bound() {
        let memory = filled(4, 5);
        assert_eq!(memory.len(), 4);
        assert!(memory.is_full());
        assert_eq!(memory.cursor(), 1);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut memory = ReplayMemory::new(3, 42).unwrap();
        for c in ['A', 'B', 'C', 'D'] {
            memory.push(c);
        }
        let mut items: Vec<char> = memory.iter().copied().collect();
        items.sort();
        assert_eq!(items, vec!['B', 'C', 'D']);

        // the slot of 'A' was reused
        assert_eq!(memory.get(0), Some(&'D'));
    }

    #[test]
    fn test_cursor_before_full() {
        let memory = filled(10, 3);
        assert_eq!(memory.cursor(), 3);
        assert!(!memory.is_full());
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut memory = filled(100, 100);
        for _ in 0..50 {
            let mut ixs = memory.sample_indices(32).unwrap();
            ixs.sort();
            ixs.dedup();
            assert_eq!(ixs.len(), 32);
        }
        let mut all: Vec<usize> = memory.sample(100).unwrap().into_iter().copied().collect();
        all.sort();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_insufficient_data() {
        let mut memory = filled(10, 3);
        assert_eq!(
            memory.sample(5).err(),
            Some(ArmRlError::InsufficientData {
                requested: 5,
                available: 3
            })
        );
        assert_eq!(memory.sample(0).err(), Some(ArmRlError::EmptySample));
        assert_eq!(memory.sample(3).unwrap().len(), 3);
    }

    #[test]
    fn test_sample_does_not_mutate() {
        let mut memory = filled(5, 7);
        let before: Vec<usize> = memory.iter().copied().collect();
        let (len, cursor) = (memory.len(), memory.cursor());
        for _ in 0..20 {
            let _ = memory.sample(3).unwrap();
        }
        assert_eq!(memory.len(), len);
        assert_eq!(memory.cursor(), cursor);
        assert_eq!(memory.iter().copied().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_uniformity() {
        let n = 10;
        let n_draws = 100_000;
        let mut memory = filled(n, n);
        let mut counts = vec![0usize; n];
        for _ in 0..n_draws {
            counts[*memory.sample(1).unwrap()[0]] += 1;
        }
        for c in counts {
            let freq = c as f64 / n_draws as f64;
            assert!((freq - 0.1).abs() < 0.01, "frequency {} is not close to 0.1", freq);
        }
    }

    #[test]
    fn test_sample_with_external_rng() {
        let memory = filled(10, 10);
        let mut rng1 = StdRng::seed_from_u64(7);
        let mut rng2 = StdRng::seed_from_u64(7);
        let s1 = memory.sample_with(4, &mut rng1).unwrap();
        let s2 = memory.sample_with(4, &mut rng2).unwrap();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_transitions_end_to_end() {
        let config = ReplayMemoryConfig::default().capacity(2);
        let mut memory = ReplayMemory::<Transition<i32, i32>>::build(&config).unwrap();
        memory.push(Transition::new(0, 0, Some(1), 0.0));
        memory.push(Transition::new(1, 1, Some(2), 1.0));
        memory.push(Transition::new(2, 0, None, 2.0));
        assert_eq!(ExperienceBufferBase::len(&memory), 2);

        let batch = memory.batch(2).unwrap();
        let mut states = batch.state.clone();
        states.sort();
        assert_eq!(states, vec![1, 2]);
        for (i, s) in batch.state.iter().enumerate() {
            assert_eq!(batch.next_state[i].is_none(), *s == 2);
        }

        assert!(memory.batch(3).is_err());
    }
}
