//! Transition record.

/// One environment step `(s_t, a_t, s_t+1, r_t)`.
///
/// `next_state` is `None` if the episode terminated at this step. A truncated
/// episode still carries its last observation, since the value of that state
/// is bootstrapped.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<O, A> {
    /// Observation before the action.
    pub state: O,

    /// Selected action.
    pub action: A,

    /// Observation after the action, `None` on termination.
    pub next_state: Option<O>,

    /// Reward.
    pub reward: f32,
}

impl<O, A> Transition<O, A> {
    /// Constructs a transition.
    pub fn new(state: O, action: A, next_state: Option<O>, reward: f32) -> Self {
        Self {
            state,
            action,
            next_state,
            reward,
        }
    }

    /// Returns `true` if the episode terminated at this transition.
    pub fn is_terminal(&self) -> bool {
        self.next_state.is_none()
    }
}
