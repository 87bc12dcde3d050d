//! Struct-of-vectors batch of transitions.
use super::Transition;

/// A batch of transitions, split by field.
///
/// Agents convert each field into a tensor.
#[derive(Clone, Debug)]
pub struct TransitionBatch<O, A> {
    /// Observations before the actions.
    pub state: Vec<O>,

    /// Actions.
    pub action: Vec<A>,

    /// Observations after the actions, `None` on termination.
    pub next_state: Vec<Option<O>>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Slot indices of the transitions in the buffer they were taken from.
    pub ix_sample: Vec<usize>,
}

impl<O: Clone, A: Clone> TransitionBatch<O, A> {
    /// Builds a batch from `(slot index, transition)` pairs, keeping their order.
    pub fn from_indexed<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = (usize, &'a Transition<O, A>)>,
        O: 'a,
        A: 'a,
    {
        let items = items.into_iter();
        let n = items.size_hint().0;
        let mut batch = Self {
            state: Vec::with_capacity(n),
            action: Vec::with_capacity(n),
            next_state: Vec::with_capacity(n),
            reward: Vec::with_capacity(n),
            ix_sample: Vec::with_capacity(n),
        };
        for (ix, tr) in items {
            batch.state.push(tr.state.clone());
            batch.action.push(tr.action.clone());
            batch.next_state.push(tr.next_state.clone());
            batch.reward.push(tr.reward);
            batch.ix_sample.push(ix);
        }
        batch
    }
}

impl<O, A> TransitionBatch<O, A> {
    /// Builds a batch from owned transitions, keeping their order.
    pub fn from_transitions(transitions: Vec<Transition<O, A>>) -> Self {
        let n = transitions.len();
        let mut batch = Self {
            state: Vec::with_capacity(n),
            action: Vec::with_capacity(n),
            next_state: Vec::with_capacity(n),
            reward: Vec::with_capacity(n),
            ix_sample: (0..n).collect(),
        };
        for tr in transitions {
            batch.state.push(tr.state);
            batch.action.push(tr.action);
            batch.next_state.push(tr.next_state);
            batch.reward.push(tr.reward);
        }
        batch
    }

    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// `1.0` for terminal transitions, `0.0` otherwise.
    pub fn terminal_mask(&self) -> Vec<f32> {
        self.next_state
            .iter()
            .map(|s| if s.is_none() { 1.0 } else { 0.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transitions_keeps_order() {
        let batch = TransitionBatch::from_transitions(vec![
            Transition::new(0, 'a', Some(1), 1.0),
            Transition::new(1, 'b', Some(2), 2.0),
            Transition::new(2, 'c', None, 3.0),
        ]);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.action, vec!['a', 'b', 'c']);
        assert_eq!(batch.reward, vec![1.0, 2.0, 3.0]);
        assert_eq!(batch.terminal_mask(), vec![0.0, 0.0, 1.0]);
    }
}
