//! Exploration strategies of DQN.
use crate::util::argmax_first;
use anyhow::Result;
use candle_core::{Tensor, D};
use candle_nn::ops::softmax;
use rand::{distributions::WeightedIndex, Rng};
use serde::{Deserialize, Serialize};

/// Explorers for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum DqnExplorer {
    /// Softmax action selection.
    Softmax(Softmax),

    /// Epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),
}

impl Default for DqnExplorer {
    fn default() -> Self {
        Self::EpsilonGreedy(EpsilonGreedy::default())
    }
}

impl DqnExplorer {
    /// Selects an action index given the action values `[1, n_actions]` of an observation.
    pub fn action(&mut self, q: &Tensor, rng: &mut impl Rng) -> Result<usize> {
        match self {
            Self::Softmax(softmax) => softmax.action(q, rng),
            Self::EpsilonGreedy(egreedy) => egreedy.action(q, rng),
        }
    }

    /// Current epsilon, if applicable.
    pub fn eps(&self) -> Option<f64> {
        match self {
            Self::Softmax(_) => None,
            Self::EpsilonGreedy(egreedy) => Some(egreedy.eps()),
        }
    }
}

/// Softmax explorer for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct Softmax {}

impl Softmax {
    /// Constructs softmax explorer.
    pub fn new() -> Self {
        Self {}
    }

    /// Draws an action with probabilities proportional to `exp(q)`.
    pub fn action(&mut self, q: &Tensor, rng: &mut impl Rng) -> Result<usize> {
        let probs = softmax(q, D::Minus1)?.flatten_all()?.to_vec1::<f32>()?;
        Ok(rng.sample(WeightedIndex::new(&probs)?))
    }
}

/// Epsilon-greedy explorer for DQN.
///
/// Epsilon decays linearly from `eps_start` to `eps_final` over `final_step`
/// action selections, then stays at `eps_final`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Number of action selections so far.
    pub n_steps: usize,

    /// Epsilon at the start.
    pub eps_start: f64,

    /// Epsilon after `final_step` selections.
    pub eps_final: f64,

    /// Number of selections over which epsilon decays.
    pub final_step: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            n_steps: 0,
            eps_start: 0.9,
            eps_final: 0.1,
            final_step: 10_000,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs epsilon-greedy explorer decaying over `final_step` selections.
    pub fn with_final_step(final_step: usize) -> DqnExplorer {
        DqnExplorer::EpsilonGreedy(Self {
            final_step,
            ..Self::default()
        })
    }

    /// Current epsilon.
    pub fn eps(&self) -> f64 {
        if self.final_step == 0 {
            return self.eps_final;
        }
        let d = (self.eps_start - self.eps_final) / (self.final_step as f64);
        (self.eps_start - d * self.n_steps as f64).max(self.eps_final)
    }

    /// Takes a random action with probability epsilon, the greedy action otherwise.
    pub fn action(&mut self, q: &Tensor, rng: &mut impl Rng) -> Result<usize> {
        let is_random = rng.gen::<f64>() < self.eps();
        self.n_steps += 1;

        if is_random {
            let n_actions = q.dims().last().copied().unwrap_or(1);
            Ok(rng.gen_range(0..n_actions))
        } else {
            argmax_first(q)
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Set the number of selections over which epsilon decays.
    pub fn final_step(mut self, v: usize) -> Self {
        self.final_step = v;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_eps_decay() {
        let mut explorer = EpsilonGreedy::new().eps_start(1.0).eps_final(0.1).final_step(10);
        assert_eq!(explorer.eps(), 1.0);
        explorer.n_steps = 5;
        assert!((explorer.eps() - 0.55).abs() < 1e-9);
        explorer.n_steps = 100;
        assert!((explorer.eps() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_greedy_when_eps_zero() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut explorer = EpsilonGreedy::new().eps_start(0.0).eps_final(0.0);
        let q = Tensor::from_slice(&[0.1f32, 0.7, 0.2], (1, 3), &Device::Cpu)?;
        for _ in 0..10 {
            assert_eq!(explorer.action(&q, &mut rng)?, 1);
        }
        assert_eq!(explorer.n_steps, 10);
        Ok(())
    }

    #[test]
    fn test_softmax_prefers_large_values() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(0);
        let mut explorer = Softmax::new();
        let q = Tensor::from_slice(&[0.0f32, 10.0], (1, 2), &Device::Cpu)?;
        let n = (0..100)
            .filter(|_| explorer.action(&q, &mut rng).unwrap() == 1)
            .count();
        assert!(n > 95);
        Ok(())
    }
}
