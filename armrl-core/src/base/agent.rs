//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters. Returns `None` if the step was skipped,
    /// typically because the buffer does not hold enough transitions yet.
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>>;

    /// Save the parameters of the agent in the given directory.
    ///
    /// This method commonly creates a number of files consisting the agent
    /// in the directory. For example, the DQN agent in `armrl-candle-agent` crate saves
    /// two Q-networks corresponding to the policy and target networks.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
