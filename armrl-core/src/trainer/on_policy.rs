//! Episode-wise training loop for on-policy agents.
use super::save_agent;
use crate::{
    error::ArmRlError,
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    Agent, Env, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`OnPolicyTrainer`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct OnPolicyTrainerConfig {
    /// Number of training episodes.
    pub n_episodes: usize,

    /// Interval of recording the average return, in episodes.
    pub record_interval: usize,

    /// Interval of saving model parameters, in episodes.
    pub save_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for OnPolicyTrainerConfig {
    fn default() -> Self {
        Self {
            n_episodes: 500,
            record_interval: 10,
            save_interval: usize::MAX,
            model_dir: None,
        }
    }
}

impl OnPolicyTrainerConfig {
    /// Sets the number of training episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the interval of recording the average return.
    pub fn record_interval(mut self, v: usize) -> Self {
        self.record_interval = v;
        self
    }

    /// Sets the interval of saving.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the directory where the trained model is saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Constructs [`OnPolicyTrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`OnPolicyTrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Runs whole episodes and optimizes the agent once per episode.
///
/// Transitions of an episode are pushed into a fresh buffer, which is handed
/// to [`Agent::opt`] when the episode ends. Every `record_interval` episodes,
/// the average return of the last `record_interval` episodes is recorded as
/// `ten_episodes_average_reward` and the recorder is flushed with the number
/// of episodes as the step.
pub struct OnPolicyTrainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    env_config: E::Config,
    step_proc_config: P::Config,
    buffer_config: R::Config,
    n_episodes: usize,
    record_interval: usize,
    save_interval: usize,
    model_dir: Option<PathBuf>,
}

impl<E, P, R> OnPolicyTrainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: OnPolicyTrainerConfig,
        env_config: E::Config,
        step_proc_config: P::Config,
        buffer_config: R::Config,
    ) -> Result<Self> {
        if config.record_interval == 0 || config.save_interval == 0 {
            return Err(ArmRlError::InvalidConfig(
                "record_interval and save_interval must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            env_config,
            step_proc_config,
            buffer_config,
            n_episodes: config.n_episodes,
            record_interval: config.record_interval,
            save_interval: config.save_interval,
            model_dir: config.model_dir.map(PathBuf::from),
        })
    }

    /// Runs one episode, pushing transitions into `buffer`. Returns the undiscounted return.
    fn run_episode<A>(
        &self,
        env: &mut E,
        processor: &mut P,
        agent: &mut A,
        buffer: &mut R,
    ) -> Result<f32>
    where
        A: Agent<E, R>,
    {
        let mut obs = env.reset()?;
        processor.reset(obs.clone());
        let mut episode_return = 0.0;

        loop {
            let act = agent.sample(&obs)?;
            let (step, _) = env.step(&act);
            episode_return += step.reward;
            let is_done = step.is_done();
            let next_obs = step.obs.clone();
            buffer.push(processor.process(step)?)?;
            if is_done {
                return Ok(episode_return);
            }
            obs = next_obs;
        }
    }

    /// Train the agent.
    ///
    /// Returns the undiscounted return of every episode.
    pub fn train<A>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<Vec<f32>>
    where
        A: Agent<E, R>,
    {
        let mut env = E::build(&self.env_config, 0)?;
        let mut processor = P::build(&self.step_proc_config);
        let mut recent = VecDeque::with_capacity(self.record_interval);
        let mut returns = Vec::with_capacity(self.n_episodes);
        agent.train();

        for episode in 1..=self.n_episodes {
            let mut buffer = R::build(&self.buffer_config)?;
            let episode_return = self.run_episode(&mut env, &mut processor, agent, &mut buffer)?;
            returns.push(episode_return);

            let mut record = agent.opt(&mut buffer)?.unwrap_or_else(Record::empty);
            record.insert("episode_return", Scalar(episode_return));
            recorder.store(record);

            if recent.len() == self.record_interval {
                recent.pop_front();
            }
            recent.push_back(episode_return);

            if episode % self.record_interval == 0 {
                let average = recent.iter().sum::<f32>() / recent.len() as f32;
                info!("episode = {}, average return = {}", episode, average);
                recorder.store(Record::from_scalar("ten_episodes_average_reward", average));
                recorder.flush(episode as _);
            }

            if episode % self.save_interval == 0 {
                if let Some(model_dir) = &self.model_dir {
                    save_agent::<E, R, A>(agent, &model_dir.join(episode.to_string()));
                }
            }
        }

        recorder.flush(self.n_episodes as _);
        if let Some(model_dir) = &self.model_dir {
            save_agent::<E, R, A>(agent, &model_dir.join("final"));
        }

        Ok(returns)
    }
}
