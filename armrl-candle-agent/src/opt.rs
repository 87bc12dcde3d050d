//! Optimizers of the networks in DQN and PPO.
use anyhow::Result;
use candle_core::{backprop::GradStore, Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Optimizer and its learning rate.
///
/// In YAML, `Adam: { lr: 0.0001 }` or `AdamW: { lr: 0.001, weight_decay: 0.01 }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam without weight decay.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// Adam with decoupled weight decay.
    AdamW {
        /// Learning rate.
        lr: f64,

        /// Weight decay.
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 1e-4 }
    }
}

impl OptimizerConfig {
    /// Learning rate.
    pub fn lr(&self) -> f64 {
        match self {
            Self::Adam { lr } | Self::AdamW { lr, .. } => *lr,
        }
    }

    /// Overrides the learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::Adam { .. } => Self::Adam { lr },
            Self::AdamW { weight_decay, .. } => Self::AdamW { lr, weight_decay },
        }
    }

    /// Constructs an optimizer updating `vars`.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        Ok(match *self {
            Self::Adam { lr } => Optimizer::Adam(Adam::new(
                vars,
                ParamsAdam {
                    lr,
                    ..ParamsAdam::default()
                },
            )?),
            Self::AdamW { lr, weight_decay } => Optimizer::AdamW(AdamW::new(
                vars,
                ParamsAdamW {
                    lr,
                    weight_decay,
                    ..ParamsAdamW::default()
                },
            )?),
        })
    }
}

/// An optimizer built from [`OptimizerConfig`].
pub enum Optimizer {
    /// Adam.
    Adam(Adam),

    /// AdamW.
    AdamW(AdamW),
}

impl Optimizer {
    /// Computes gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.step(&loss.backward()?)
    }

    /// Updates the variables with precomputed gradients, e.g. after clipping.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.step(grads)?,
            Self::AdamW(opt) => opt.step(grads)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn minimize(config: &OptimizerConfig) -> Result<f32> {
        let x = Var::new(&[2f32], &Device::Cpu)?;
        let mut opt = config.build(vec![x.clone()])?;
        for _ in 0..10 {
            let loss = x.as_tensor().sqr()?.sum_all()?;
            opt.backward_step(&loss)?;
        }
        Ok(x.as_tensor().to_vec1::<f32>()?[0])
    }

    #[test]
    fn test_optimizers_decrease_loss() -> Result<()> {
        assert!(minimize(&OptimizerConfig::Adam { lr: 0.1 })? < 2.0);
        assert!(minimize(&OptimizerConfig::AdamW {
            lr: 0.1,
            weight_decay: 0.0
        })? < 2.0);
        Ok(())
    }

    #[test]
    fn test_learning_rate_and_yaml() -> Result<()> {
        let config = OptimizerConfig::AdamW {
            lr: 1e-3,
            weight_decay: 0.01,
        }
        .learning_rate(1e-2);
        assert_eq!(config.lr(), 1e-2);

        let de: OptimizerConfig = serde_yaml::from_str("AdamW:\n  lr: 0.5\n")?;
        assert_eq!(
            de,
            OptimizerConfig::AdamW {
                lr: 0.5,
                weight_decay: default_weight_decay()
            }
        );
        Ok(())
    }
}
