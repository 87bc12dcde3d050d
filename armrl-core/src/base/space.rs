//! Observation and action spaces.
use serde::{Deserialize, Serialize};

/// Describes the set of valid observations or actions of an environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Space {
    /// `n` actions (or states) indexed by `0..n`.
    Discrete(usize),

    /// A box in `R^shape` bounded element-wise by `low` and `high`.
    Box {
        /// Lower bounds, flattened.
        low: Vec<f32>,
        /// Upper bounds, flattened.
        high: Vec<f32>,
        /// Shape of an element.
        shape: Vec<usize>,
    },
}

impl Space {
    /// Constructs a box space with the same bounds on every element of a flat vector.
    pub fn uniform_box(dim: usize, low: f32, high: f32) -> Self {
        Self::Box {
            low: vec![low; dim],
            high: vec![high; dim],
            shape: vec![dim],
        }
    }

    /// Returns `true` if the space is discrete.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Self::Discrete(_))
    }

    /// Returns the number of elements of a discrete space, or the flattened
    /// dimension of a box space.
    pub fn flat_dim(&self) -> usize {
        match self {
            Self::Discrete(n) => *n,
            Self::Box { shape, .. } => shape.iter().product(),
        }
    }

    /// Returns `true` if `x` lies in the box. Always `false` for discrete spaces.
    pub fn contains(&self, x: &[f32]) -> bool {
        match self {
            Self::Discrete(_) => false,
            Self::Box { low, high, .. } => {
                x.len() == low.len()
                    && x
                        .iter()
                        .zip(low.iter().zip(high.iter()))
                        .all(|(v, (l, h))| l <= v && v <= h)
            }
        }
    }
}
