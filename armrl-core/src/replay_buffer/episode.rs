//! Episode storage for on-policy learning.
use super::{Transition, TransitionBatch};
use crate::{error::ArmRlError, ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;

/// Transitions of a single episode, in the order they happened.
#[derive(Clone, Debug)]
pub struct Episode<O, A> {
    transitions: Vec<Transition<O, A>>,
}

impl<O, A> Default for Episode<O, A> {
    fn default() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }
}

impl<O, A> Episode<O, A> {
    /// Appends a transition.
    pub fn push(&mut self, tr: Transition<O, A>) {
        self.transitions.push(tr);
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the episode has no transition.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Undiscounted sum of rewards.
    pub fn total_reward(&self) -> f32 {
        self.transitions.iter().map(|tr| tr.reward).sum()
    }

    /// Iterates over transitions in order.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O, A>> {
        self.transitions.iter()
    }

    /// Converts into a batch, keeping the order.
    pub fn into_batch(self) -> TransitionBatch<O, A> {
        TransitionBatch::from_transitions(self.transitions)
    }
}

/// Buffer collecting the transitions of the running episode.
///
/// [`ReplayBufferBase::batch`] drains the oldest `size` transitions in order,
/// so an on-policy agent consumes the episode exactly once.
pub struct EpisodeBuffer<O, A> {
    episode: Episode<O, A>,
}

impl<O, A> EpisodeBuffer<O, A> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            episode: Episode::default(),
        }
    }

    /// Takes the stored episode, leaving the buffer empty.
    pub fn take(&mut self) -> Episode<O, A> {
        std::mem::take(&mut self.episode)
    }
}

impl<O, A> Default for EpisodeBuffer<O, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, A> ExperienceBufferBase for EpisodeBuffer<O, A> {
    type Item = Transition<O, A>;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.episode.push(tr);
        Ok(())
    }

    fn len(&self) -> usize {
        self.episode.len()
    }
}

impl<O, A> ReplayBufferBase for EpisodeBuffer<O, A> {
    type Config = ();
    type Batch = TransitionBatch<O, A>;

    fn build(_config: &Self::Config) -> Result<Self> {
        Ok(Self::new())
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        let available = self.episode.len();
        if size == 0 {
            return Err(ArmRlError::EmptySample.into());
        }
        if size > available {
            return Err(ArmRlError::InsufficientData {
                requested: size,
                available,
            }
            .into());
        }
        let rest = self.episode.transitions.split_off(size);
        let head = std::mem::replace(&mut self.episode.transitions, rest);
        Ok(TransitionBatch::from_transitions(head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_buffer_drains_in_order() -> Result<()> {
        let mut buffer = EpisodeBuffer::<usize, usize>::build(&())?;
        for i in 0..5 {
            let next = if i == 4 { None } else { Some(i + 1) };
            buffer.push(Transition::new(i, 0, next, i as f32))?;
        }
        assert_eq!(buffer.episode.total_reward(), 10.0);

        let batch = buffer.batch(3)?;
        assert_eq!(batch.state, vec![0, 1, 2]);
        assert_eq!(buffer.len(), 2);

        let err = buffer.batch(3).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ArmRlError>(),
            Some(&ArmRlError::InsufficientData {
                requested: 3,
                available: 2
            })
        );

        let batch = buffer.batch(2)?;
        assert_eq!(batch.terminal_mask(), vec![0.0, 1.0]);
        assert!(buffer.is_empty());
        Ok(())
    }
}
