//! Stacking of consecutive observations.
//!
//! [`FrameStack`] keeps the last `n_stack` frames and concatenates them into
//! one observation. [`FrameStackEnv`] applies it to every observation of an
//! environment, so one composite state is pushed per transition.
use crate::{error::ArmRlError, record::Record, ArrayObs, Env, Space, Step};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The last `n_stack` frames, oldest first.
#[derive(Clone, Debug)]
pub struct FrameStack {
    n_stack: usize,
    frames: VecDeque<Vec<f32>>,
}

impl FrameStack {
    /// Creates an empty stack holding `n_stack` frames.
    pub fn new(n_stack: usize) -> Result<Self, ArmRlError> {
        if n_stack == 0 {
            return Err(ArmRlError::InvalidConfig(
                "n_stack must be positive".to_string(),
            ));
        }
        Ok(Self {
            n_stack,
            frames: VecDeque::with_capacity(n_stack),
        })
    }

    /// Fills every slot with `frame`.
    pub fn reset(&mut self, frame: &[f32]) {
        self.frames.clear();
        for _ in 0..self.n_stack {
            self.frames.push_back(frame.to_vec());
        }
    }

    /// Appends `frame`, dropping the oldest one.
    pub fn push(&mut self, frame: &[f32]) {
        if self.frames.len() == self.n_stack {
            self.frames.pop_front();
        }
        self.frames.push_back(frame.to_vec());
    }

    /// Concatenation of the frames from the oldest to the newest.
    pub fn stacked(&self) -> ArrayObs {
        ArrayObs(self.frames.iter().flatten().copied().collect())
    }

    /// Number of frames in a stacked observation.
    pub fn n_stack(&self) -> usize {
        self.n_stack
    }
}

/// Configuration of [`FrameStackEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FrameStackEnvConfig<C> {
    /// Configuration of the wrapped environment.
    pub env: C,

    /// Number of stacked frames.
    pub n_stack: usize,
}

/// Environment wrapper emitting stacked observations.
pub struct FrameStackEnv<E> {
    env: E,
    stack: FrameStack,
}

impl<E> FrameStackEnv<E> {
    /// Returns the wrapped environment.
    pub fn inner(&self) -> &E {
        &self.env
    }
}

impl<E> Env for FrameStackEnv<E>
where
    E: Env<Obs = ArrayObs>,
{
    type Config = FrameStackEnvConfig<E::Config>;
    type Obs = ArrayObs;
    type Act = E::Act;
    type Info = E::Info;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self {
            env: E::build(&config.env, seed)?,
            stack: FrameStack::new(config.n_stack)?,
        })
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let (step, record) = self.env.step(a);
        self.stack.push(&step.obs.0);
        let step = Step::new(
            self.stack.stacked(),
            step.act,
            step.reward,
            step.is_terminated,
            step.is_truncated,
            step.info,
            None,
        );
        (step, record)
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        let obs = self.env.reset()?;
        self.stack.reset(&obs.0);
        Ok(self.stack.stacked())
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        let obs = self.env.reset_with_index(ix)?;
        self.stack.reset(&obs.0);
        Ok(self.stack.stacked())
    }

    fn observation_space(&self) -> Space {
        let n = self.stack.n_stack();
        match self.env.observation_space() {
            Space::Box { low, high, shape } => Space::Box {
                low: low.repeat(n),
                high: high.repeat(n),
                shape: vec![shape.iter().product::<usize>() * n],
            },
            space => space,
        }
    }

    fn action_space(&self) -> Space {
        self.env.action_space()
    }
}
