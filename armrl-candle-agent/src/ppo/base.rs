//! PPO agent implemented with candle.
use super::{compute_gae, CategoricalActor, Critic, PpoConfig};
use crate::{
    model::SubModel1,
    util::{act_to_tensor, argmax_first, obs_to_tensor, vec_to_tensor, OutDim},
};
use anyhow::Result;
use armrl_core::{
    record::{Record, RecordValue},
    Agent, DiscreteAction, Env, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
use candle_core::{Device, Tensor};
use candle_nn::loss::mse;
use rand::{distributions::WeightedIndex, rngs::SmallRng, Rng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, marker::PhantomData, path::Path};

/// PPO agent with a categorical policy, updated on whole episodes.
///
/// [`Agent::opt`] consumes every transition in the buffer as one episode.
pub struct Ppo<E, P, V, R>
where
    E: Env,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    actor: CategoricalActor<P>,
    critic: Critic<V>,
    gamma: f32,
    lambda: f32,
    epochs: usize,
    eps_clip: f64,
    train: bool,
    device: Device,
    n_opts: usize,
    rng: SmallRng,
    phantom: PhantomData<(E, R)>,
}

impl<E, P, V, R> Ppo<E, P, V, R>
where
    E: Env,
    E::Act: DiscreteAction,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
{
    /// Constructs PPO agent.
    pub fn build(config: PpoConfig<P::Config, V::Config>) -> Result<Self> {
        let device: Device = config.device.try_into()?;
        let actor = CategoricalActor::build(config.actor_config, &device)?;
        let critic = Critic::build(config.critic_config, &device)?;

        Ok(Self {
            actor,
            critic,
            gamma: config.gamma,
            lambda: config.lambda,
            epochs: config.epochs,
            eps_clip: config.eps_clip,
            train: false,
            device,
            n_opts: 0,
            rng: SmallRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        })
    }

    /// Number of updates done, one per episode.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// The actor.
    pub fn actor(&self) -> &CategoricalActor<P> {
        &self.actor
    }

    /// The critic.
    pub fn critic(&self) -> &Critic<V> {
        &self.critic
    }

    fn update(&mut self, batch: TransitionBatch<E::Obs, E::Act>) -> Result<Record> {
        let obs = obs_to_tensor(batch.state.iter(), &self.device)?;
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

        let td_target = {
            let v_next = self.critic.forward(&next_obs)?;
            (reward + ((is_not_done * self.gamma as f64)? * v_next)?)?
        }
        .detach();
        let td_delta = (&td_target - self.critic.forward(&obs)?)?
            .detach()
            .to_vec1::<f32>()?;
        let advantage = vec_to_tensor(
            compute_gae(&td_delta, self.gamma, self.lambda),
            &self.device,
        )?;
        let old_log_p = self.actor.log_prob(&obs, &act)?.detach();

        let mut loss_actor = 0f32;
        let mut loss_critic = 0f32;
        for _ in 0..self.epochs {
            let log_p = self.actor.log_prob(&obs, &act)?;
            let ratio = (log_p - &old_log_p)?.exp()?;
            let surr1 = (&ratio * &advantage)?;
            let surr2 = (ratio.clamp(1.0 - self.eps_clip, 1.0 + self.eps_clip)? * &advantage)?;
            let actor_loss = surr1.minimum(&surr2)?.mean_all()?.neg()?;
            let critic_loss = mse(&self.critic.forward(&obs)?, &td_target)?;

            self.actor.backward_step(&actor_loss)?;
            self.critic.backward_step(&critic_loss)?;
            loss_actor += actor_loss.to_scalar::<f32>()?;
            loss_critic += critic_loss.to_scalar::<f32>()?;
        }

        let epochs = self.epochs.max(1) as f32;
        Ok(Record::from_slice(&[
            ("loss_actor", RecordValue::Scalar(loss_actor / epochs)),
            ("loss_critic", RecordValue::Scalar(loss_critic / epochs)),
        ]))
    }
}

impl<E, P, V, R> Policy<E> for Ppo<E, P, V, R>
where
    E: Env,
    E::Act: DiscreteAction,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
{
    /// Samples from the categorical distribution in training mode, takes the
    /// most probable action in evaluation mode.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let obs = obs_to_tensor(std::iter::once(obs), &self.device)?;
        let probs = self.actor.probs(&obs)?;
        let ix = if self.train {
            let probs = probs.flatten_all()?.to_vec1::<f32>()?;
            self.rng.sample(WeightedIndex::new(&probs)?)
        } else {
            argmax_first(&probs)?
        };
        Ok(E::Act::from_index(ix))
    }
}

impl<E, P, V, R> Agent<E, R> for Ppo<E, P, V, R>
where
    E: Env,
    E::Act: DiscreteAction,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
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
        if buffer.is_empty() {
            return Ok(None);
        }
        let batch = buffer.batch(buffer.len())?;
        let record = self.update(batch)?;
        self.n_opts += 1;
        Ok(Some(record))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.actor.save(path.join("actor.safetensors"))?;
        self.critic.save(path.join("critic.safetensors"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(path.join("actor.safetensors"))?;
        self.critic.load(path.join("critic.safetensors"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mlp::{Mlp, MlpConfig},
        ppo::{CategoricalActorConfig, CriticConfig},
        util::varmap_distance,
    };
    use armrl_core::{dummy::DummyEnv, ArrayObs, DiscreteAct, EpisodeBuffer, Transition};
    use tempdir::TempDir;

    type Buffer = EpisodeBuffer<ArrayObs, DiscreteAct>;
    type TestPpo = Ppo<DummyEnv, Mlp, Mlp, Buffer>;

    fn config() -> PpoConfig<MlpConfig, MlpConfig> {
        PpoConfig::default()
            .actor_config(
                CategoricalActorConfig::default().pi_config(MlpConfig::new(1, vec![16], 2, false)),
            )
            .critic_config(CriticConfig::default().v_config(MlpConfig::new(1, vec![16], 0, false)))
            .epochs(3)
    }

    fn episode() -> Result<Buffer> {
        let mut buffer = Buffer::new();
        for i in 0..4 {
            let s = ArrayObs(vec![i as f32]);
            let next = (i < 3).then(|| ArrayObs(vec![i as f32 + 1.0]));
            let r = if i == 3 { 1.0 } else { 0.0 };
            buffer.push(Transition::new(s, DiscreteAct(1), next, r))?;
        }
        Ok(buffer)
    }

    #[test]
    fn test_opt_consumes_episode() -> Result<()> {
        let mut ppo = TestPpo::build(config())?;
        let mut buffer = episode()?;
        let record = ppo.opt(&mut buffer)?.unwrap();

        assert!(record.get_scalar("loss_actor")?.is_finite());
        assert!(record.get_scalar("loss_critic")?.is_finite());
        assert_eq!(buffer.len(), 0);
        assert_eq!(ppo.n_opts(), 1);
        assert!(ppo.opt(&mut buffer)?.is_none());
        Ok(())
    }

    #[test]
    fn test_sample_modes() -> Result<()> {
        let mut ppo = TestPpo::build(config())?;
        ppo.train();
        for i in 0..10 {
            assert!(ppo.sample(&ArrayObs(vec![i as f32]))?.0 < 2);
        }
        // greedy actions are deterministic
        ppo.eval();
        let obs = ArrayObs(vec![2.0]);
        let a = ppo.sample(&obs)?;
        for _ in 0..5 {
            assert_eq!(ppo.sample(&obs)?, a);
        }
        Ok(())
    }

    #[test]
    fn test_save_load_params() -> Result<()> {
        let dir = TempDir::new("ppo")?;
        let ppo = TestPpo::build(config())?;
        ppo.save_params(dir.path())?;
        assert!(dir.path().join("actor.safetensors").exists());

        let mut other = TestPpo::build(config())?;
        other.load_params(dir.path())?;
        assert_eq!(
            varmap_distance(other.actor().get_varmap(), ppo.actor().get_varmap())?,
            0.0
        );
        assert_eq!(
            varmap_distance(other.critic().get_varmap(), ppo.critic().get_varmap())?,
            0.0
        );
        Ok(())
    }
}
