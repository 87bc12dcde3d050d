#![warn(missing_docs)]
//! Core components of armrl, reinforcement learning experiments for robotic manipulation.
//!
//! * [`ReplayMemory`] is a fixed-capacity ring buffer of transitions with
//!   uniform sampling without replacement.
//! * [`Env`], [`Policy`] and [`Agent`] are the interfaces of environments and agents.
//! * [`Trainer`] runs the off-policy training loop (DQN), [`OnPolicyTrainer`]
//!   runs the episode-wise loop (PPO).
//! * [`record`] holds metrics and their destinations, [`curve`] reads and
//!   compares learning curves exported as CSV.
pub mod curve;
pub mod dummy;
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, ArrayObs, DiscreteAct, DiscreteAction, Env, ExperienceBufferBase,
    Info, Obs, Policy, ReplayBufferBase, Space, Step, StepProcessor,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod frame_stack;
pub use frame_stack::{FrameStack, FrameStackEnv, FrameStackEnvConfig};

pub use replay_buffer::{
    Episode, EpisodeBuffer, ReplayMemory, ReplayMemoryConfig, SharedReplayMemory, Transition,
    TransitionBatch, TransitionProcessor,
};

mod trainer;
pub use trainer::{OnPolicyTrainer, OnPolicyTrainerConfig, Sampler, Trainer, TrainerConfig};
