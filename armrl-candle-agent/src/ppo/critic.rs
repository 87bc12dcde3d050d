//! State-value function.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
    CandleAgentError,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Critic`].
pub struct CriticConfig<V: OutDim> {
    /// Configuration of the value network, its output dimension is set to 1.
    pub v_config: Option<V>,

    /// Optimizer of the value network.
    pub opt_config: OptimizerConfig,
}

impl<V: OutDim> Default for CriticConfig<V> {
    fn default() -> Self {
        Self {
            v_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-2 },
        }
    }
}

impl<V> CriticConfig<V>
where
    V: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for the value network.
    pub fn v_config(mut self, mut v: V) -> Self {
        v.set_out_dim(1);
        self.v_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }
}

/// State-value network `V(s)`.
pub struct Critic<V>
where
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    varmap: VarMap,
    v: V,
    opt: Optimizer,
}

impl<V> Critic<V>
where
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`Critic`].
    pub fn build(config: CriticConfig<V::Config>, device: &Device) -> Result<Self> {
        let v_config = config
            .v_config
            .ok_or(CandleAgentError::MissingConfig("v_config"))?;
        let varmap = VarMap::new();
        let v = V::build(VarBuilder::from_varmap(&varmap, DType::F32, device), v_config)?;
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self { varmap, v, opt })
    }

    /// State values, `[n]`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.v.forward(obs)?.squeeze(D::Minus1)?)
    }

    /// Updates the parameters to decrease `loss`.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Parameters of the value network.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters in a safetensors file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save critic parameters to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from a safetensors file.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load critic parameters from {:?}", path.as_ref());
        Ok(())
    }
}
