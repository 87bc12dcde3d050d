//! Environment interaction for the off-policy trainer.
use crate::{
    record::{Record, RecordValue},
    Env, ExperienceBufferBase, Policy, StepProcessor,
};
use anyhow::{Context, Result};
use std::time::Instant;

/// Runs the environment with a policy and pushes the produced items into a buffer.
///
/// It keeps the previous observation across calls, resets the environment
/// at the end of episodes, and measures environment steps per second.
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,
    prev_obs: Option<E::Obs>,
    step_processor: P,
    episode_return: f32,
    n_env_steps_for_fps: usize,
    timer: Instant,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a new sampler.
    pub fn new(env: E, step_processor: P) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
            episode_return: 0.0,
            n_env_steps_for_fps: 0,
            timer: Instant::now(),
        }
    }

    /// Environment steps per second since the last call, then resets the counter.
    pub fn fps(&mut self) -> f32 {
        let secs = self.timer.elapsed().as_secs_f32();
        let fps = if secs > 0.0 {
            self.n_env_steps_for_fps as f32 / secs
        } else {
            0.0
        };
        self.n_env_steps_for_fps = 0;
        self.timer = Instant::now();
        fps
    }

    /// Takes an environment step and pushes the produced item to `buffer`.
    ///
    /// When an episode ends, the returned record holds its undiscounted return
    /// as `episode_return`.
    pub fn sample_and_push<A, R>(&mut self, policy: &mut A, buffer: &mut R) -> Result<Record>
    where
        A: Policy<E>,
        R: ExperienceBufferBase<Item = P::Output>,
    {
        let prev_obs = match self.prev_obs.take() {
            Some(obs) => obs,
            None => {
                let obs = self.env.reset()?;
                self.step_processor.reset(obs.clone());
                obs
            }
        };

        let act = policy.sample(&prev_obs)?;
        let (step, mut record) = self.env.step_with_reset(&act)?;
        self.n_env_steps_for_fps += 1;
        self.episode_return += step.reward;

        let is_done = step.is_done();
        self.prev_obs = match is_done {
            true => Some(step.init_obs.clone().context("init_obs was not set")?),
            false => Some(step.obs.clone()),
        };

        let item = self.step_processor.process(step)?;
        buffer.push(item)?;

        if is_done {
            record.insert("episode_return", RecordValue::Scalar(self.episode_return));
            self.episode_return = 0.0;
        }

        Ok(record)
    }
}
