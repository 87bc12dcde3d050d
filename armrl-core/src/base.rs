//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod space;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use policy::Policy;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use serde::{Deserialize, Serialize};
pub use space::Space;
use std::fmt::Debug;
pub use step::{Info, Step, StepProcessor};

/// An observation of an environment.
///
/// Agents in this workspace consume observations as flat feature vectors,
/// so the only requirement is a view of the features.
pub trait Obs: Clone + Debug {
    /// Returns the features of the observation.
    fn features(&self) -> &[f32];

    /// Returns the number of features.
    fn dim(&self) -> usize {
        self.features().len()
    }
}

/// An action of an environment.
pub trait Act: Clone + Debug {}

/// An action selected from a finite set, identified by its index.
pub trait DiscreteAction: Act {
    /// Constructs the action with the given index.
    fn from_index(ix: usize) -> Self;

    /// Returns the index of the action.
    fn index(&self) -> usize;
}

/// Observation represented by a feature vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayObs(pub Vec<f32>);

impl Obs for ArrayObs {
    fn features(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for ArrayObs {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

/// Discrete action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscreteAct(pub usize);

impl Act for DiscreteAct {}

impl DiscreteAction for DiscreteAct {
    fn from_index(ix: usize) -> Self {
        Self(ix)
    }

    fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for DiscreteAct {
    fn from(ix: usize) -> Self {
        Self(ix)
    }
}
