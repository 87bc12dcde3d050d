use anyhow::Result;
use armrl_candle_agent::{
    dqn::{Dqn, DqnConfig, DqnModelConfig, EpsilonGreedy},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    util::CriticLoss,
};
use armrl_core::{
    record::{AggregateRecorder, CsvRecorder},
    Agent as _, ArrayObs, DefaultEvaluator, DiscreteAct, Evaluator as _, FrameStackEnv,
    FrameStackEnvConfig, ReplayMemory, ReplayMemoryConfig, Trainer, TrainerConfig, Transition,
    TransitionProcessor,
};
use armrl_env::{PickPlaceEnv, PickPlaceEnvConfig};
use armrl_tensorboard::TensorboardRecorder;
use clap::Parser;
use log::info;
use std::path::Path;

const N_STACK: usize = 2;
const DIM_OBS: usize = 7 * N_STACK;
const DIM_ACT: usize = 6;
const LR_CRITIC: f64 = 1e-4;
const DISCOUNT_FACTOR: f64 = 0.99;
const BATCH_SIZE: usize = 32;
const WARMUP_PERIOD: usize = 100;
const TARGET_SYNC_INTERVAL: usize = 1000;
const EPS_FINAL_STEP: usize = 10_000;
const OPT_INTERVAL: usize = 1;
const MAX_OPTS: usize = 30000;
const EVAL_INTERVAL: usize = 1000;
const REPLAY_BUFFER_CAPACITY: usize = 10000;
const N_EPISODES_PER_EVAL: usize = 5;
const CRITIC_LOSS: CriticLoss = CriticLoss::SmoothL1;
const MODEL_DIR: &str = "./armrl/examples/model/dqn_pick_place";

type Env = FrameStackEnv<PickPlaceEnv>;
type EnvConfig = FrameStackEnvConfig<PickPlaceEnvConfig>;
type StepProc = TransitionProcessor<Env>;
type ReplayBuffer = ReplayMemory<Transition<ArrayObs, DiscreteAct>>;
type DqnAgent = Dqn<Env, Mlp, ReplayBuffer>;

mod config {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::{
        fs::File,
        io::{BufReader, Write},
    };

    #[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
    pub struct DqnPickPlaceConfig {
        pub env_config: EnvConfig,
        pub agent_config: DqnConfig<MlpConfig>,
        pub trainer_config: TrainerConfig,
        pub replay_buffer_config: ReplayMemoryConfig,
    }

    impl DqnPickPlaceConfig {
        pub fn new(max_opts: usize, model_dir: &str, eval_interval: usize) -> Self {
            let trainer_config = TrainerConfig::default()
                .max_opts(max_opts)
                .opt_interval(OPT_INTERVAL)
                .eval_interval(eval_interval)
                .record_compute_cost_interval(eval_interval)
                .flush_record_interval(eval_interval)
                .save_interval(eval_interval)
                .warmup_period(WARMUP_PERIOD)
                .model_dir(model_dir);
            Self {
                env_config: create_env_config(),
                agent_config: create_agent_config(DIM_OBS, DIM_ACT),
                trainer_config,
                replay_buffer_config: ReplayMemoryConfig::default()
                    .capacity(REPLAY_BUFFER_CAPACITY),
            }
        }

        pub fn load(path: impl AsRef<Path>) -> Result<Self> {
            let rdr = BufReader::new(File::open(path)?);
            Ok(serde_yaml::from_reader(rdr)?)
        }

        pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
            let mut file = File::create(path)?;
            file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
            Ok(())
        }
    }

    pub fn create_env_config() -> EnvConfig {
        FrameStackEnvConfig {
            env: PickPlaceEnvConfig::default(),
            n_stack: N_STACK,
        }
    }

    pub fn create_agent_config(in_dim: usize, out_dim: usize) -> DqnConfig<MlpConfig> {
        let opt_config = OptimizerConfig::Adam { lr: LR_CRITIC };
        let mlp_config = MlpConfig::new(in_dim, vec![128, 128], out_dim, false);
        let model_config = DqnModelConfig::default()
            .q_config(mlp_config)
            .out_dim(out_dim)
            .opt_config(opt_config);
        DqnConfig::default()
            .model_config(model_config)
            .batch_size(BATCH_SIZE)
            .discount_factor(DISCOUNT_FACTOR)
            .target_sync_interval(TARGET_SYNC_INTERVAL)
            .explorer(EpsilonGreedy::with_final_step(EPS_FINAL_STEP))
            .critic_loss(CRITIC_LOSS)
    }
}

use config::DqnPickPlaceConfig;

mod utils {
    use super::*;

    pub fn create_recorder(csv: bool, model_dir: &str) -> Result<Box<dyn AggregateRecorder>> {
        match csv {
            true => Ok(Box::new(CsvRecorder::new(model_dir)?)),
            false => Ok(Box::new(TensorboardRecorder::new(model_dir))),
        }
    }
}

/// Train/eval DQN agent in pick-and-place environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train DQN agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate DQN agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// YAML file of the experiment configuration, overriding the defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Directory of model parameters and metrics, overriding the configuration
    #[arg(long)]
    model_dir: Option<String>,

    /// Number of optimization steps, overriding the configuration
    #[arg(long)]
    max_opts: Option<usize>,

    /// Write metrics as CSV files instead of TFRecord
    #[arg(long, default_value_t = false)]
    csv: bool,
}

/// Builds the configuration from `--config` or the defaults, then applies the
/// command line overrides. Every output path is taken from the result.
fn load_config(args: &Args) -> Result<DqnPickPlaceConfig> {
    let mut config = match &args.config {
        Some(path) => DqnPickPlaceConfig::load(path)?,
        None => DqnPickPlaceConfig::new(MAX_OPTS, MODEL_DIR, EVAL_INTERVAL),
    };
    if let Some(model_dir) = &args.model_dir {
        config.trainer_config = config.trainer_config.model_dir(model_dir.clone());
    }
    if config.trainer_config.model_dir.is_none() {
        config.trainer_config = config.trainer_config.model_dir(MODEL_DIR);
    }
    if let Some(max_opts) = args.max_opts {
        config.trainer_config = config.trainer_config.max_opts(max_opts);
    }
    Ok(config)
}

fn model_dir(config: &DqnPickPlaceConfig) -> &str {
    config.trainer_config.model_dir.as_deref().unwrap_or(MODEL_DIR)
}

fn train(config: &DqnPickPlaceConfig, csv: bool) -> Result<()> {
    let model_dir = model_dir(config);
    std::fs::create_dir_all(model_dir)?;
    config.save(Path::new(model_dir).join("config.yaml"))?;

    let mut recorder = utils::create_recorder(csv, model_dir)?;
    let mut trainer = Trainer::<Env, StepProc, ReplayBuffer>::build(
        config.trainer_config.clone(),
        config.env_config.clone(),
        Default::default(),
        config.replay_buffer_config.clone(),
    )?;
    let mut agent = DqnAgent::build(config.agent_config.clone())?;
    let mut evaluator =
        DefaultEvaluator::<Env>::new(&config.env_config, 0, N_EPISODES_PER_EVAL)?;

    trainer.train(&mut agent, recorder.as_mut(), &mut evaluator)?;

    Ok(())
}

fn eval(config: &DqnPickPlaceConfig) -> Result<f32> {
    let mut agent = {
        let mut agent = DqnAgent::build(config.agent_config.clone())?;
        agent.load_params(&Path::new(model_dir(config)).join("best"))?;
        agent.eval();
        agent
    };

    let eval_reward = DefaultEvaluator::<Env>::new(&config.env_config, 0, N_EPISODES_PER_EVAL)?
        .evaluate(&mut agent)?
        .get_scalar("episode_return")?;
    info!("Mean return over {} episodes: {}", N_EPISODES_PER_EVAL, eval_reward);

    Ok(eval_reward)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if args.train {
        train(&config, args.csv)?;
    } else if args.eval {
        eval(&config)?;
    } else {
        train(&config, args.csv)?;
        eval(&config)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{eval, load_config, train, Args, DqnPickPlaceConfig};
    use anyhow::Result;
    use std::path::Path;
    use tempdir::TempDir;

    #[test]
    fn test_dqn_pick_place() -> Result<()> {
        let tmp_dir = TempDir::new("dqn_pick_place")?;
        let model_dir = match tmp_dir.as_ref().to_str() {
            Some(s) => s,
            None => panic!("Failed to get string of temporary directory"),
        };
        let config = DqnPickPlaceConfig::new(100, model_dir, 50);
        train(&config, true)?;

        let loaded = DqnPickPlaceConfig::load(Path::new(model_dir).join("config.yaml"))?;
        assert_eq!(loaded, config);
        assert!(Path::new(model_dir).join("eval_reward.csv").exists());

        let eval_reward = eval(&loaded)?;
        assert!(eval_reward.is_finite());
        Ok(())
    }

    #[test]
    fn test_command_line_overrides_config_file() -> Result<()> {
        let tmp_dir = TempDir::new("dqn_pick_place_config")?;
        let path = tmp_dir.path().join("config.yaml");
        DqnPickPlaceConfig::new(500, "from_yaml", 50).save(&path)?;
        let args = |model_dir: Option<&str>, max_opts: Option<usize>| Args {
            train: false,
            eval: false,
            config: Some(path.to_string_lossy().to_string()),
            model_dir: model_dir.map(str::to_string),
            max_opts,
            csv: false,
        };

        let config = load_config(&args(None, None))?;
        assert_eq!(config.trainer_config.model_dir.as_deref(), Some("from_yaml"));
        assert_eq!(config.trainer_config.max_opts, 500);

        let config = load_config(&args(Some("from_cli"), Some(7)))?;
        assert_eq!(config.trainer_config.model_dir.as_deref(), Some("from_cli"));
        assert_eq!(config.trainer_config.max_opts, 7);
        Ok(())
    }
}
