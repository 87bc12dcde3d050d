//! Environment.
use super::{Act, Info, Obs, Space, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Environments are not vectorized: every method deals with a single
/// observation and a single action.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [self::Step] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record)
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way. For example, it can be used as a random seed,
    /// which is useful when evaluation of a trained agent. Actually, this method is called
    /// in [`DefaultEvaluator`](crate::DefaultEvaluator) for evaluation.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;

    /// Describes the observations emitted by the environment.
    fn observation_space(&self) -> Space;

    /// Describes the actions accepted by the environment.
    fn action_space(&self) -> Space;

    /// Performes an environment step and reset the environment if an episode ends.
    ///
    /// The initial observation of the new episode is stored in [`Step::init_obs`].
    fn step_with_reset(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized,
    {
        let (mut step, record) = self.step(a);
        if step.is_done() {
            step.init_obs = Some(self.reset()?);
        }
        Ok((step, record))
    }
}
