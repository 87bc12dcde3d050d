//! Buffers of experiences.
use anyhow::Result;

/// A buffer that transitions are pushed into.
///
/// [`ReplayMemory`](crate::ReplayMemory) keeps the most recent `capacity`
/// transitions, [`EpisodeBuffer`](crate::EpisodeBuffer) keeps one episode.
pub trait ExperienceBufferBase {
    /// Stored item, usually a [`Transition`](crate::Transition).
    type Item;

    /// Appends an item, evicting the oldest one if the buffer is full.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Number of stored items.
    fn len(&self) -> usize;

    /// `true` if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A buffer handing out batches to [`Agent::opt`](crate::Agent::opt).
pub trait ReplayBufferBase {
    /// Configuration.
    type Config: Clone;

    /// Batch consumed by agents, e.g. [`TransitionBatch`](crate::TransitionBatch).
    type Batch;

    /// Constructs an empty buffer.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Takes `size` items.
    ///
    /// [`ReplayMemory`](crate::ReplayMemory) samples them uniformly without
    /// replacement and leaves the contents untouched, while
    /// [`EpisodeBuffer`](crate::EpisodeBuffer) drains the episode in order.
    ///
    /// Fails with [`ArmRlError::InsufficientData`](crate::error::ArmRlError::InsufficientData)
    /// if the buffer holds fewer than `size` experiences.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
