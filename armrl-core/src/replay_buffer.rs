//! Experience replay.
//!
//! [`ReplayMemory`] is a fixed-capacity ring buffer. Once full, every push
//! overwrites the oldest item. Batches are drawn uniformly at random without
//! replacement and drawing never changes the stored items or the cursor.
//!
//! ```rust
//! use armrl_core::replay_buffer::{ReplayMemory, Transition};
//!
//! let mut memory = ReplayMemory::new(2, 42).unwrap();
//! memory.push(Transition::new(0, 0, Some(1), 0.0));
//! memory.push(Transition::new(1, 1, Some(2), 1.0));
//! memory.push(Transition::new(2, 0, None, 2.0));
//! assert_eq!(memory.len(), 2);
//!
//! let batch = memory.sample(2).unwrap();
//! assert_eq!(batch.len(), 2);
//! ```
mod base;
mod batch;
mod config;
mod episode;
mod shared;
mod step_proc;
mod transition;
pub use base::ReplayMemory;
pub use batch::TransitionBatch;
pub use config::ReplayMemoryConfig;
pub use episode::{Episode, EpisodeBuffer};
pub use shared::SharedReplayMemory;
pub use step_proc::{TransitionProcessor, TransitionProcessorConfig};
pub use transition::Transition;
