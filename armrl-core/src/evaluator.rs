//! Evaluate a [`Policy`].
use crate::{record::Record, Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate a [`Policy`].
pub trait Evaluator<E: Env> {
    /// Runs the policy and returns the results.
    ///
    /// The record must hold the mean return of evaluation episodes under
    /// `episode_return`, which [`Trainer`](crate::Trainer) uses to keep the best model.
    /// The caller of this method needs to handle the internal state of the policy,
    /// like training/evaluation mode.
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record>;
}
