//! Train [`Agent`].
mod config;
mod on_policy;
mod sampler;
use crate::{
    error::ArmRlError,
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
pub use on_policy::{OnPolicyTrainer, OnPolicyTrainerConfig};
pub use sampler::Sampler;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

/// Saves the parameters of `agent` in `dir`, logging the outcome.
pub(crate) fn save_agent<E, R, A>(agent: &A, dir: &Path)
where
    E: Env,
    R: ReplayBufferBase,
    A: Agent<E, R>,
{
    match agent.save_params(dir) {
        Ok(()) => info!("Saved the model in {:?}", dir),
        Err(e) => warn!("Failed to save the model in {:?}: {}", dir, e),
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the off-policy training loop.
///
/// # Training loop
///
/// 1. Build the environment, the step processor and the replay buffer.
///    Reset the counters `env_steps = 0` and `opt_steps = 0`.
/// 2. Do an environment step and push a transition to the replay buffer.
///    `env_steps += 1`.
/// 3. If `env_steps < warmup_period` or `env_steps % opt_interval != 0`, go back to 2.
/// 4. Do an optimization step with [`Agent::opt`]. The agent can skip it, for
///    example while the buffer holds fewer transitions than a batch. In that case,
///    go back to 2. Otherwise `opt_steps += 1`.
/// 5. If `opt_steps % record_compute_cost_interval == 0`, record
///    `env_steps_per_sec` and `opt_steps_per_sec`.
/// 6. If `opt_steps % eval_interval == 0`, evaluate the agent and record
///    `eval_reward`. The best model so far is saved in `(model_dir)/best`.
/// 7. If `opt_steps % save_interval == 0`, save the model in `(model_dir)/(opt_steps)`.
/// 8. If `opt_steps % flush_record_interval == 0`, flush the recorder.
/// 9. Stop if `opt_steps == max_opts`, otherwise go back to 2.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[StepProcessor]
///     C -->|Transition|D[ReplayMemory]
///     D -->|TransitionBatch|A
/// ```
///
/// * [`Agent`] emits an action `a_t` for the observation `o_t`. Given `a_t`, [`Env`]
///   changes its state and returns `o_t+1` and `r_t` in a [`Step`](crate::Step).
/// * [`StepProcessor`] turns the step into a transition `(o_t, a_t, o_t+1, r_t)`,
///   keeping `o_t` from the previous step.
/// * Transitions in the replay buffer are sampled into batches, which the agent
///   uses in its optimization steps.
pub struct Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    env_config_train: E::Config,
    step_proc_config: P::Config,
    replay_buffer_config: R::Config,
    model_dir: Option<PathBuf>,
    opt_interval: usize,
    record_compute_cost_interval: usize,
    flush_records_interval: usize,
    eval_interval: usize,
    save_interval: usize,
    max_opts: usize,
    warmup_period: usize,

    /// Optimization steps for computing optimization steps per second.
    opt_steps_for_ops: usize,

    /// Time spent in optimization steps for computing optimization steps per second.
    timer_for_ops: Duration,

    /// Buffer length when the agent last skipped an optimization step.
    len_at_skip: Option<usize>,
}

impl<E, P, R> Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config_train: E::Config,
        step_proc_config: P::Config,
        replay_buffer_config: R::Config,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            env_config_train,
            step_proc_config,
            replay_buffer_config,
            model_dir: config.model_dir.map(PathBuf::from),
            opt_interval: config.opt_interval,
            record_compute_cost_interval: config.record_compute_cost_interval,
            flush_records_interval: config.flush_record_interval,
            eval_interval: config.eval_interval,
            save_interval: config.save_interval,
            max_opts: config.max_opts,
            warmup_period: config.warmup_period,
            opt_steps_for_ops: 0,
            timer_for_ops: Duration::new(0, 0),
            len_at_skip: None,
        })
    }

    /// Returns optimization steps per second, then reset the internal counter.
    fn opt_steps_per_sec(&mut self) -> f32 {
        let secs = self.timer_for_ops.as_secs_f32();
        let osps = if secs > 0.0 {
            self.opt_steps_for_ops as f32 / secs
        } else {
            0.0
        };
        self.opt_steps_for_ops = 0;
        self.timer_for_ops = Duration::new(0, 0);
        osps
    }

    /// Performs a training step.
    ///
    /// First, it performs an environment step and pushes a transition into the
    /// buffer with [`Sampler`]. Then, if the number of environment steps reaches
    /// the optimization interval `opt_interval`, performs an optimization step.
    ///
    /// The second return value is `true` if an optimization step was done.
    ///
    /// Fails with [`ArmRlError::InvalidConfig`] if the agent skips the step
    /// while the buffer has stopped growing since the previous skip. The buffer
    /// is full then, so the agent would never be ready, e.g. when its batch
    /// size exceeds the capacity of the buffer.
    pub fn train_step<A>(
        &mut self,
        agent: &mut A,
        buffer: &mut R,
        sampler: &mut Sampler<E, P>,
        env_steps: &mut usize,
        opt_steps: &mut usize,
    ) -> Result<(Record, bool)>
    where
        A: Agent<E, R>,
    {
        let record = sampler.sample_and_push(agent, buffer)?;
        *env_steps += 1;

        if *env_steps < self.warmup_period || *env_steps % self.opt_interval != 0 {
            return Ok((record, false));
        }

        let timer = Instant::now();
        match agent.opt(buffer)? {
            Some(record_agent) => {
                self.len_at_skip = None;
                *opt_steps += 1;
                self.timer_for_ops += timer.elapsed();
                self.opt_steps_for_ops += 1;
                Ok((record.merge(record_agent), true))
            }
            None => {
                let len = buffer.len();
                if self.len_at_skip == Some(len) {
                    return Err(ArmRlError::InvalidConfig(format!(
                        "The agent skipped optimization with {} transitions in a full buffer",
                        len
                    ))
                    .into());
                }
                self.len_at_skip = Some(len);
                Ok((record, false))
            }
        }
    }

    /// Train the agent.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        A: Agent<E, R>,
        D: Evaluator<E>,
    {
        let env = E::build(&self.env_config_train, 0)?;
        let producer = P::build(&self.step_proc_config);
        let mut buffer = R::build(&self.replay_buffer_config)?;
        let mut sampler = Sampler::new(env, producer);
        let mut max_eval_reward = f32::MIN;
        let mut env_steps: usize = 0;
        let mut opt_steps: usize = 0;
        self.len_at_skip = None;
        agent.train();

        while opt_steps < self.max_opts {
            let (mut record, is_opt) = self.train_step(
                agent,
                &mut buffer,
                &mut sampler,
                &mut env_steps,
                &mut opt_steps,
            )?;

            if is_opt {
                if opt_steps % self.record_compute_cost_interval == 0 {
                    record.insert("env_steps_per_sec", Scalar(sampler.fps()));
                    record.insert("opt_steps_per_sec", Scalar(self.opt_steps_per_sec()));
                }

                if opt_steps % self.eval_interval == 0 {
                    info!("Starts evaluation of the trained model");
                    agent.eval();
                    let eval_reward = evaluator.evaluate(agent)?.get_scalar("episode_return")?;
                    agent.train();
                    info!("opt_steps = {}, eval_reward = {}", opt_steps, eval_reward);
                    record.insert("eval_reward", Scalar(eval_reward));

                    if eval_reward > max_eval_reward {
                        max_eval_reward = eval_reward;
                        if let Some(model_dir) = &self.model_dir {
                            save_agent::<E, R, A>(agent, &model_dir.join("best"));
                        }
                    }
                }

                if opt_steps % self.save_interval == 0 {
                    if let Some(model_dir) = &self.model_dir {
                        save_agent::<E, R, A>(agent, &model_dir.join(opt_steps.to_string()));
                    }
                }

                record.insert("env_steps", Scalar(env_steps as f32));
            }

            if !record.is_empty() {
                recorder.store(record);
            }

            if is_opt && opt_steps % self.flush_records_interval == 0 {
                recorder.flush(opt_steps as _);
            }
        }
        recorder.flush(opt_steps as _);

        Ok(())
    }
}
