//! Conversion of environment steps into transitions.
use super::Transition;
use crate::{Env, Step, StepProcessor};
use anyhow::{Context, Result};
use std::marker::PhantomData;

/// Configuration of [`TransitionProcessor`].
#[derive(Clone, Debug, Default)]
pub struct TransitionProcessorConfig {}

/// Produces [`Transition`]s from [`Step`]s, remembering the previous observation.
pub struct TransitionProcessor<E: Env> {
    prev_obs: Option<E::Obs>,
    phantom: PhantomData<E>,
}

impl<E: Env> StepProcessor<E> for TransitionProcessor<E> {
    type Config = TransitionProcessorConfig;
    type Output = Transition<E::Obs, E::Act>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs);
    }

    fn process(&mut self, step: Step<E>) -> Result<Self::Output> {
        let state = self
            .prev_obs
            .take()
            .context("No previous observation, reset() must be called first")?;

        // After the episode ends, the next transition starts from the reset observation
        self.prev_obs = match step.is_done() {
            true => step.init_obs,
            false => Some(step.obs.clone()),
        };
        let next_state = match step.is_terminated {
            true => None,
            false => Some(step.obs),
        };

        Ok(Transition::new(state, step.act, next_state, step.reward))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dummy::DummyEnv, ArrayObs, DiscreteAct};

    fn obs(v: f32) -> ArrayObs {
        ArrayObs(vec![v])
    }

    fn step(o: f32, terminated: bool, truncated: bool, init: Option<f32>) -> Step<DummyEnv> {
        Step::new(obs(o), DiscreteAct(1), 1.0, terminated, truncated, (), init.map(obs))
    }

    #[test]
    fn test_next_state_none_on_termination() -> Result<()> {
        let mut p = TransitionProcessor::<DummyEnv>::build(&Default::default());
        p.reset(obs(0.0));

        let tr = p.process(step(1.0, false, false, None))?;
        assert_eq!(tr.state, obs(0.0));
        assert_eq!(tr.next_state, Some(obs(1.0)));

        let tr = p.process(step(2.0, true, false, Some(10.0)))?;
        assert_eq!(tr.state, obs(1.0));
        assert!(tr.is_terminal());

        // continues from the reset observation
        let tr = p.process(step(11.0, false, true, Some(20.0)))?;
        assert_eq!(tr.state, obs(10.0));
        assert_eq!(tr.next_state, Some(obs(11.0)));

        let tr = p.process(step(21.0, false, false, None))?;
        assert_eq!(tr.state, obs(20.0));
        Ok(())
    }

    #[test]
    fn test_process_without_reset() {
        let mut p = TransitionProcessor::<DummyEnv>::build(&Default::default());
        assert!(p.process(step(1.0, false, false, None)).is_err());
    }
}
