//! Environment step.
use super::Env;

/// Environment specific data attached to a [`Step`].
pub trait Info {}

impl Info for () {}

/// Outcome `(a_t, o_t+1, r_t)` of one call of [`Env::step`].
///
/// [`TransitionProcessor`](crate::TransitionProcessor) pairs it with the
/// previous observation `o_t` into a [`Transition`](crate::Transition).
pub struct Step<E: Env> {
    /// Action `a_t` that was applied.
    pub act: E::Act,

    /// Observation `o_t+1` after the action.
    pub obs: E::Obs,

    /// Reward `r_t`.
    pub reward: f32,

    /// The episode reached a terminal state, e.g. the object was placed.
    pub is_terminated: bool,

    /// The episode hit the step limit.
    pub is_truncated: bool,

    /// Environment specific data.
    pub info: E::Info,

    /// First observation of the next episode, set by [`Env::step_with_reset`]
    /// when this step ended the episode.
    pub init_obs: Option<E::Obs>,
}

impl<E: Env> Step<E> {
    /// Constructs a step.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
        init_obs: Option<E::Obs>,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
            init_obs,
        }
    }

    /// The episode ended, by termination or truncation.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// Turns [`Step`]s into items of a buffer.
///
/// The processor remembers the last observation so that each output can hold
/// `o_t` as well as `o_t+1`. [`Sampler`](crate::Sampler) calls
/// [`reset`](StepProcessor::reset) with the first observation of every episode.
pub trait StepProcessor<E: Env> {
    /// Configuration.
    type Config: Clone;

    /// Produced item, pushed as [`ExperienceBufferBase::Item`](crate::ExperienceBufferBase::Item).
    type Output;

    /// Constructs a processor.
    fn build(config: &Self::Config) -> Self;

    /// Starts a new episode from `init_obs`.
    fn reset(&mut self, init_obs: E::Obs);

    /// Produces the item of one step.
    fn process(&mut self, step: Step<E>) -> anyhow::Result<Self::Output>;
}
