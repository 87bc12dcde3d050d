//! PPO agent with a clipped surrogate objective.
mod actor;
mod base;
mod config;
mod critic;
mod gae;
pub use actor::{CategoricalActor, CategoricalActorConfig};
pub use base::Ppo;
pub use config::PpoConfig;
pub use critic::{Critic, CriticConfig};
pub use gae::compute_gae;
