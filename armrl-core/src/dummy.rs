//! Deterministic environment and agent used in tests and doc examples.
//!
//! [`DummyEnv`] is a corridor `0..=length`. The agent starts at `0`, action `0`
//! moves left and action `1` moves right. Reaching `length` gives reward `1`
//! and terminates the episode.
use crate::{
    record::{Record, RecordValue},
    Agent, ArrayObs, DiscreteAct, Env, ExperienceBufferBase, Policy, ReplayBufferBase, Space,
    Step,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DummyEnvConfig {
    /// Position of the goal.
    pub length: usize,

    /// Episodes are truncated after this number of steps.
    pub max_steps: usize,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            length: 5,
            max_steps: 20,
        }
    }
}

impl DummyEnvConfig {
    /// Sets the position of the goal.
    pub fn length(mut self, v: usize) -> Self {
        self.length = v;
        self
    }

    /// Sets the step limit.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }
}

/// Corridor environment.
pub struct DummyEnv {
    config: DummyEnvConfig,
    pos: usize,
    n_steps: usize,
}

impl DummyEnv {
    fn obs(&self) -> ArrayObs {
        ArrayObs(vec![self.pos as f32])
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = ArrayObs;
    type Act = DiscreteAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            pos: 0,
            n_steps: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        match a.0 {
            0 => self.pos = self.pos.saturating_sub(1),
            _ => self.pos = (self.pos + 1).min(self.config.length),
        }
        self.n_steps += 1;

        let is_terminated = self.pos == self.config.length;
        let is_truncated = !is_terminated && self.n_steps >= self.config.max_steps;
        let reward = if is_terminated { 1.0 } else { 0.0 };
        let step = Step::new(self.obs(), *a, reward, is_terminated, is_truncated, (), None);
        let record = Record::from_slice(&[("pos", RecordValue::Scalar(self.pos as f32))]);
        (step, record)
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.pos = 0;
        self.n_steps = 0;
        Ok(self.obs())
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }

    fn observation_space(&self) -> Space {
        Space::uniform_box(1, 0.0, self.config.length as f32)
    }

    fn action_space(&self) -> Space {
        Space::Discrete(2)
    }
}

/// Policy taking the same action in every state.
pub struct DummyPolicy {
    act: DiscreteAct,
}

impl DummyPolicy {
    /// Always moves right.
    pub fn right() -> Self {
        Self {
            act: DiscreteAct(1),
        }
    }

    /// Always moves left.
    pub fn left() -> Self {
        Self {
            act: DiscreteAct(0),
        }
    }
}

impl Policy<DummyEnv> for DummyPolicy {
    fn sample(&mut self, _obs: &ArrayObs) -> Result<DiscreteAct> {
        Ok(self.act)
    }
}

/// Agent moving right and counting optimization steps.
///
/// An optimization step takes a batch of `batch_size` items and is skipped
/// while the buffer holds fewer items.
pub struct DummyAgent {
    batch_size: usize,
    n_opts: usize,
    train: bool,
}

impl DummyAgent {
    /// Constructs the agent.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            n_opts: 0,
            train: false,
        }
    }

    /// Number of optimization steps done.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }
}

impl Policy<DummyEnv> for DummyAgent {
    fn sample(&mut self, _obs: &ArrayObs) -> Result<DiscreteAct> {
        Ok(DiscreteAct(1))
    }
}

impl<R> Agent<DummyEnv, R> for DummyAgent
where
    R: ReplayBufferBase + ExperienceBufferBase,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() < self.batch_size {
            return Ok(None);
        }
        buffer.batch(self.batch_size)?;
        self.n_opts += 1;
        Ok(Some(Record::from_scalar("loss", 1.0 / self.n_opts as f32)))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        fs::write(path.join("n_opts.txt"), self.n_opts.to_string())?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.n_opts = fs::read_to_string(path.join("n_opts.txt"))?.trim().parse()?;
        Ok(())
    }
}
