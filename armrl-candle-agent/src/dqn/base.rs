//! DQN agent implemented with candle.
use super::{
    config::DqnConfig,
    explorer::DqnExplorer,
    model::DqnModel,
};
use crate::{
    model::SubModel1,
    util::{
        act_to_tensor, argmax_first, obs_to_tensor, smooth_l1_loss, track, vec_to_tensor,
        CriticLoss, OutDim,
    },
};
use anyhow::Result;
use armrl_core::{
    error::ArmRlError,
    record::{Record, RecordValue},
    Agent, DiscreteAction, Env, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
use candle_core::{Device, Tensor, D};
use candle_nn::loss::mse;
use log::debug;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// The target network is a copy of the action-value network, updated every
/// `target_sync_interval` optimization steps and frozen in between.
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    target_sync_interval: usize,
    min_transitions_warmup: usize,
    batch_size: usize,
    qnet: DqnModel<Q>,
    qnet_tgt: DqnModel<Q>,
    train: bool,
    phantom: PhantomData<(E, R)>,
    discount_factor: f64,
    tau: f64,
    explorer: DqnExplorer,
    device: Device,
    n_opts: usize,
    double_dqn: bool,
    clip_grad: Option<f64>,
    critic_loss: CriticLoss,
    rng: SmallRng,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    E::Act: DiscreteAction,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
{
    /// Constructs DQN agent.
    ///
    /// The target network starts as an exact copy of the action-value network.
    pub fn build(config: DqnConfig<Q::Config>) -> Result<Self> {
        if config.target_sync_interval == 0 || config.batch_size == 0 {
            return Err(ArmRlError::InvalidConfig(
                "target_sync_interval and batch_size must be positive".to_string(),
            )
            .into());
        }
        let device: Device = config.device.try_into()?;
        let qnet = DqnModel::build(config.model_config.clone(), &device)?;
        let qnet_tgt = DqnModel::build_copy_of(config.model_config, &device, &qnet)?;

        Ok(Dqn {
            qnet,
            qnet_tgt,
            target_sync_interval: config.target_sync_interval,
            min_transitions_warmup: config.min_transitions_warmup,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            tau: config.tau,
            train: false,
            explorer: config.explorer,
            device,
            n_opts: 0,
            double_dqn: config.double_dqn,
            clip_grad: config.clip_grad,
            critic_loss: config.critic_loss,
            phantom: PhantomData,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    /// Number of optimization steps done.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// The action-value network.
    pub fn qnet(&self) -> &DqnModel<Q> {
        &self.qnet
    }

    /// The target network.
    pub fn qnet_tgt(&self) -> &DqnModel<Q> {
        &self.qnet_tgt
    }

    fn update_critic(&mut self, buffer: &mut R) -> Result<f32> {
        let batch = buffer.batch(self.batch_size)?;
        let obs = obs_to_tensor(batch.state.iter(), &self.device)?;
        // Terminal transitions take the current state as a placeholder, masked out below.
        let next_obs = obs_to_tensor(
            batch
                .next_state
                .iter()
                .zip(batch.state.iter())
                .map(|(next, obs)| next.as_ref().unwrap_or(obs)),
            &self.device,
        )?;
        let act = act_to_tensor(&batch.action, &self.device)?;
        let is_not_done = {
            let mask = batch.terminal_mask().into_iter().map(|d| 1.0 - d).collect();
            vec_to_tensor(mask, &self.device)?
        };
        let reward = vec_to_tensor(batch.reward, &self.device)?;

        let pred = self
            .qnet
            .forward(&obs)?
            .gather(&act, D::Minus1)?
            .squeeze(D::Minus1)?;

        let tgt = {
            let x = self.qnet_tgt.forward(&next_obs)?;
            let q = if self.double_dqn {
                let y = self.qnet.forward(&next_obs)?.argmax_keepdim(D::Minus1)?;
                x.gather(&y, D::Minus1)?.squeeze(D::Minus1)?
            } else {
                x.max(D::Minus1)?
            };
            (reward + ((is_not_done * self.discount_factor)? * q)?)?
        }
        .detach();

        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&pred, &tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&pred, &tgt)?,
        };
        self.qnet.backward_step(&loss, self.clip_grad)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    fn opt_(&mut self, buffer: &mut R) -> Result<Record> {
        let loss_critic = self.update_critic(buffer)?;
        self.n_opts += 1;

        if self.n_opts % self.target_sync_interval == 0 {
            track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), self.tau)?;
            debug!("Updated the target network, n_opts = {}", self.n_opts);
        }

        let mut record = Record::from_scalar("loss_critic", loss_critic);
        if let Some(eps) = self.explorer.eps() {
            record.insert("eps", RecordValue::Scalar(eps as f32));
        }
        Ok(record)
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    E::Act: DiscreteAction,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
{
    /// In evaluation mode, take a random action with probability 0.01.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let obs = obs_to_tensor(std::iter::once(obs), &self.device)?;
        let q = self.qnet.forward(&obs)?;
        let ix = if self.train {
            self.explorer.action(&q, &mut self.rng)?
        } else if self.rng.gen::<f32>() < 0.01 {
            self.rng.gen_range(0..self.qnet.out_dim())
        } else {
            argmax_first(&q)?
        };
        Ok(E::Act::from_index(ix))
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    E::Act: DiscreteAction,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>> + ExperienceBufferBase,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() < self.min_transitions_warmup.max(self.batch_size) {
            return Ok(None);
        }
        Ok(Some(self.opt_(buffer)?))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        Ok(())
    }
}
