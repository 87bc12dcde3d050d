//! Runs a fixed number of episodes and reports the average return.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Policy,
};
use anyhow::Result;
use log::info;

/// Runs `n_episodes` episodes and reports the average return as `episode_return`.
///
/// Episode `i` starts from [`Env::reset_with_index`] with `i`, so evaluations
/// of different models see the same initial states.
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record> {
        let mut returns = Vec::with_capacity(self.n_episodes);

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut r_total = 0f32;

            loop {
                let act = policy.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act);
                r_total += step.reward;
                if step.is_done() {
                    info!(
                        "Evaluation episode {}: final reward {}, return {}",
                        ix, step.reward, r_total
                    );
                    break;
                }
                prev_obs = step.obs;
            }
            returns.push(r_total);
        }

        let mean = returns.iter().sum::<f32>() / self.n_episodes.max(1) as f32;
        let mut record = Record::from_scalar("episode_return", mean);
        record.insert("episode_returns", RecordValue::Array1(returns));
        Ok(record)
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs an evaluator with its own environment.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{DummyEnv, DummyEnvConfig, DummyPolicy};

    #[test]
    fn test_default_evaluator() -> Result<()> {
        let config = DummyEnvConfig::default().length(3);
        let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&config, 0, 4)?;
        let mut policy = DummyPolicy::right();
        let record = evaluator.evaluate(&mut policy)?;

        // moving right reaches the goal at the third step
        assert_eq!(record.get_scalar("episode_return")?, 1.0);
        assert_eq!(record.get_array1("episode_returns")?, vec![1.0; 4]);
        Ok(())
    }
}
