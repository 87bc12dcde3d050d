use anyhow::Result;
use armrl_candle_agent::{
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    ppo::{CategoricalActorConfig, CriticConfig, Ppo, PpoConfig},
};
use armrl_core::{
    record::{AggregateRecorder, CsvRecorder},
    Agent as _, ArrayObs, DefaultEvaluator, DiscreteAct, EpisodeBuffer, Evaluator as _,
    OnPolicyTrainer, OnPolicyTrainerConfig, TransitionProcessor,
};
use armrl_env::{ReachEnv, ReachEnvConfig};
use armrl_tensorboard::TensorboardRecorder;
use clap::Parser;
use log::info;
use std::path::Path;

const DIM_OBS: usize = 8;
const DIM_ACT: usize = 5;
const LR_ACTOR: f64 = 1e-3;
const LR_CRITIC: f64 = 1e-2;
const GAMMA: f32 = 0.98;
const LAMBDA: f32 = 0.95;
const EPOCHS: usize = 10;
const EPS_CLIP: f64 = 0.2;
const N_EPISODES: usize = 500;
const RECORD_INTERVAL: usize = 10;
const SAVE_INTERVAL: usize = 100;
const N_EPISODES_PER_EVAL: usize = 5;
const MODEL_DIR: &str = "./armrl/examples/model/ppo_reach";

type Env = ReachEnv;
type StepProc = TransitionProcessor<Env>;
type Buffer = EpisodeBuffer<ArrayObs, DiscreteAct>;
type PpoAgent = Ppo<Env, Mlp, Mlp, Buffer>;

mod config {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::{
        fs::File,
        io::{BufReader, Write},
    };

    #[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
    pub struct PpoReachConfig {
        pub env_config: ReachEnvConfig,
        pub agent_config: PpoConfig<MlpConfig, MlpConfig>,
        pub trainer_config: OnPolicyTrainerConfig,
    }

    impl PpoReachConfig {
        pub fn new(n_episodes: usize, model_dir: &str) -> Self {
            let trainer_config = OnPolicyTrainerConfig::default()
                .n_episodes(n_episodes)
                .record_interval(RECORD_INTERVAL)
                .save_interval(SAVE_INTERVAL)
                .model_dir(model_dir);
            Self {
                env_config: ReachEnvConfig::default(),
                agent_config: create_agent_config(DIM_OBS, DIM_ACT),
                trainer_config,
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

    pub fn create_agent_config(in_dim: usize, out_dim: usize) -> PpoConfig<MlpConfig, MlpConfig> {
        let actor_config = CategoricalActorConfig::default()
            .pi_config(MlpConfig::new(in_dim, vec![128], out_dim, false))
            .opt_config(OptimizerConfig::Adam { lr: LR_ACTOR });
        let critic_config = CriticConfig::default()
            .v_config(MlpConfig::new(in_dim, vec![128], 1, false))
            .opt_config(OptimizerConfig::Adam { lr: LR_CRITIC });
        PpoConfig::default()
            .actor_config(actor_config)
            .critic_config(critic_config)
            .gamma(GAMMA)
            .lambda(LAMBDA)
            .epochs(EPOCHS)
            .eps_clip(EPS_CLIP)
    }
}

use config::PpoReachConfig;

mod utils {
    use super::*;

    pub fn create_recorder(csv: bool, model_dir: &str) -> Result<Box<dyn AggregateRecorder>> {
        match csv {
            true => Ok(Box::new(CsvRecorder::new(model_dir)?)),
            false => Ok(Box::new(TensorboardRecorder::new(model_dir))),
        }
    }
}

/// Train/eval PPO agent in reaching environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Train PPO agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate PPO agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// YAML file of the experiment configuration, overriding the defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Directory of model parameters and metrics, overriding the configuration
    #[arg(long)]
    model_dir: Option<String>,

    /// Number of training episodes, overriding the configuration
    #[arg(long)]
    n_episodes: Option<usize>,

    /// Write metrics as CSV files instead of TFRecord
    #[arg(long, default_value_t = false)]
    csv: bool,
}

/// Builds the configuration from `--config` or the defaults, then applies the
/// command line overrides. Every output path is taken from the result.
fn load_config(args: &Args) -> Result<PpoReachConfig> {
    let mut config = match &args.config {
        Some(path) => PpoReachConfig::load(path)?,
        None => PpoReachConfig::new(N_EPISODES, MODEL_DIR),
    };
    if let Some(model_dir) = &args.model_dir {
        config.trainer_config = config.trainer_config.model_dir(model_dir.clone());
    }
    if config.trainer_config.model_dir.is_none() {
        config.trainer_config = config.trainer_config.model_dir(MODEL_DIR);
    }
    if let Some(n_episodes) = args.n_episodes {
        config.trainer_config = config.trainer_config.n_episodes(n_episodes);
    }
    Ok(config)
}

fn model_dir(config: &PpoReachConfig) -> &str {
    config.trainer_config.model_dir.as_deref().unwrap_or(MODEL_DIR)
}

fn train(config: &PpoReachConfig, csv: bool) -> Result<Vec<f32>> {
    let model_dir = model_dir(config);
    std::fs::create_dir_all(model_dir)?;
    config.save(Path::new(model_dir).join("config.yaml"))?;

    let mut recorder = utils::create_recorder(csv, model_dir)?;
    let mut trainer = OnPolicyTrainer::<Env, StepProc, Buffer>::build(
        config.trainer_config.clone(),
        config.env_config.clone(),
        Default::default(),
        (),
    )?;
    let mut agent = PpoAgent::build(config.agent_config.clone())?;

    trainer.train(&mut agent, recorder.as_mut())
}

fn eval(config: &PpoReachConfig) -> Result<f32> {
    let mut agent = {
        let mut agent = PpoAgent::build(config.agent_config.clone())?;
        agent.load_params(&Path::new(model_dir(config)).join("final"))?;
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
    use super::{eval, load_config, train, Args, PpoReachConfig};
    use anyhow::Result;
    use armrl_core::curve::LearningCurve;
    use std::path::Path;
    use tempdir::TempDir;

    #[test]
    fn test_ppo_reach() -> Result<()> {
        let tmp_dir = TempDir::new("ppo_reach")?;
        let model_dir = match tmp_dir.as_ref().to_str() {
            Some(s) => s,
            None => panic!("Failed to get string of temporary directory"),
        };
        let mut config = PpoReachConfig::new(20, model_dir);
        config.env_config = config.env_config.max_steps(20);
        config.agent_config = config.agent_config.epochs(2);

        let returns = train(&config, true)?;
        assert_eq!(returns.len(), 20);

        // two records, one per 10 episodes
        let curve = LearningCurve::from_csv(
            Path::new(model_dir).join("ten_episodes_average_reward.csv"),
            "PPO",
        )?;
        assert_eq!(curve.steps(), &[10, 20]);

        let eval_reward = eval(&config)?;
        assert!(eval_reward.is_finite());
        Ok(())
    }

    #[test]
    fn test_command_line_overrides_config_file() -> Result<()> {
        let tmp_dir = TempDir::new("ppo_reach_config")?;
        let path = tmp_dir.path().join("config.yaml");
        PpoReachConfig::new(300, "from_yaml").save(&path)?;
        let args = |model_dir: Option<&str>, n_episodes: Option<usize>| Args {
            train: false,
            eval: false,
            config: Some(path.to_string_lossy().to_string()),
            model_dir: model_dir.map(str::to_string),
            n_episodes,
            csv: false,
        };

        let config = load_config(&args(None, None))?;
        assert_eq!(config.trainer_config.model_dir.as_deref(), Some("from_yaml"));
        assert_eq!(config.trainer_config.n_episodes, 300);

        let config = load_config(&args(Some("from_cli"), Some(4)))?;
        assert_eq!(config.trainer_config.model_dir.as_deref(), Some("from_cli"));
        assert_eq!(config.trainer_config.n_episodes, 4);
        Ok(())
    }
}
