//! Reinforcement learning experiments for robotic manipulation.
//!
//! armrl consists of the following crates:
//!
//! * Core and utility
//!   * `armrl-core` provides the replay memory, the environment and agent
//!     traits, the training loops, frame stacking, metric records and
//!     learning-curve utilities.
//!   * `armrl-tensorboard` has `TensorboardRecorder` struct to write records
//!     which can be shown in Tensorboard. It is based on
//!     [tensorboard-rs](https://crates.io/crates/tensorboard-rs).
//!   * `armrl` re-exports the crates and holds the experiment drivers under
//!     `examples/`.
//! * Environment
//!   * `armrl-env` includes `PickPlaceEnv`, a gripper moving an object on a
//!     grid, and `ReachEnv`, a planar two-link arm reaching a target.
//! * Agent
//!   * `armrl-candle-agent` includes DQN and PPO agents based on
//!     [candle](https://crates.io/crates/candle-core).
//!
//! The drivers are run as
//!
//! ```bash
//! cargo run --example dqn_pick_place -- --train --max-opts 20000
//! cargo run --example ppo_reach -- --train --csv
//! cargo run --example compare_curves -- --smooth 10 ppo=ppo.csv dqn=dqn.csv
//! ```
pub use armrl_candle_agent;
pub use armrl_core;
pub use armrl_env;
pub use armrl_tensorboard;
