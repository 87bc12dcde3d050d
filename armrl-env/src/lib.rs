//! Simulated environments of robotic manipulation tasks.
//!
//! * [`PickPlaceEnv`], a gripper on a grid picking up an object and releasing
//!   it on a goal cell, with discrete actions.
//! * [`ReachEnv`], a planar two-link arm moving its end effector to a target.
//!
//! Both emit [`ArrayObs`](armrl_core::ArrayObs) feature vectors and take
//! [`DiscreteAct`](armrl_core::DiscreteAct) actions. Their random initial
//! states come from a seeded [`StdRng`](rand::rngs::StdRng).
mod pick_place;
mod reach;
pub use pick_place::{PickPlaceEnv, PickPlaceEnvConfig};
pub use reach::{ReachEnv, ReachEnvConfig};
