//! Actor with a categorical policy.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
    CandleAgentError,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{ops::log_softmax, ops::softmax, VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`CategoricalActor`].
pub struct CategoricalActorConfig<P: OutDim> {
    /// Configuration of the network outputting action logits.
    pub pi_config: Option<P>,

    /// Optimizer of the policy network.
    pub opt_config: OptimizerConfig,
}

impl<P: OutDim> Default for CategoricalActorConfig<P> {
    fn default() -> Self {
        Self {
            pi_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-3 },
        }
    }
}

impl<P> CategoricalActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for the policy network.
    pub fn pi_config(mut self, v: P) -> Self {
        self.pi_config = Some(v);
        self
    }

    /// Sets the number of actions.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(pi_config) = &mut self.pi_config {
            pi_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }
}

/// Policy network giving a categorical distribution over discrete actions.
pub struct CategoricalActor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    varmap: VarMap,
    out_dim: usize,
    pi: P,
    opt: Optimizer,
}

impl<P> CategoricalActor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`CategoricalActor`].
    pub fn build(config: CategoricalActorConfig<P::Config>, device: &Device) -> Result<Self> {
        let pi_config = config
            .pi_config
            .ok_or(CandleAgentError::MissingConfig("pi_config"))?;
        let out_dim = pi_config.get_out_dim();
        let varmap = VarMap::new();
        let pi = P::build(VarBuilder::from_varmap(&varmap, DType::F32, device), pi_config)?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            out_dim,
            pi,
            opt,
        })
    }

    /// Number of actions.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Action probabilities, `[n, out_dim]`.
    pub fn probs(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(softmax(&self.pi.forward(obs)?, D::Minus1)?)
    }

    /// Log probabilities of the given actions, `[n]`.
    ///
    /// `act` holds u32 action indices of shape `[n, 1]`.
    pub fn log_prob(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        let log_p = log_softmax(&self.pi.forward(obs)?, D::Minus1)?;
        Ok(log_p.gather(act, D::Minus1)?.squeeze(D::Minus1)?)
    }

    /// Updates the parameters to decrease `loss`.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Parameters of the policy network.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters in a safetensors file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save actor parameters to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from a safetensors file.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load actor parameters from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::{Mlp, MlpConfig};

    #[test]
    fn test_probs_and_log_prob() -> Result<()> {
        let config = CategoricalActorConfig::default()
            .pi_config(MlpConfig::new(2, vec![8], 0, false))
            .out_dim(3);
        let actor = CategoricalActor::<Mlp>::build(config, &Device::Cpu)?;
        let obs = Tensor::from_slice(&[0.1f32, 0.2, 0.3, 0.4], (2, 2), &Device::Cpu)?;

        let probs = actor.probs(&obs)?;
        assert_eq!(probs.dims(), &[2, 3]);
        for row in probs.sum(D::Minus1)?.to_vec1::<f32>()? {
            assert!((row - 1.0).abs() < 1e-5);
        }

        let act = Tensor::from_slice(&[2u32, 0], (2, 1), &Device::Cpu)?;
        let log_p = actor.log_prob(&obs, &act)?.to_vec1::<f32>()?;
        let probs = probs.to_vec2::<f32>()?;
        assert!((log_p[0] - probs[0][2].ln()).abs() < 1e-5);
        assert!((log_p[1] - probs[1][0].ln()).abs() < 1e-5);
        Ok(())
    }
}
