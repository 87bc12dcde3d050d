//! Pick-and-place on a grid.
use anyhow::Result;
use armrl_core::{
    error::ArmRlError,
    record::{Record, RecordValue},
    ArrayObs, DiscreteAct, Env, Space, Step,
};
use log::warn;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`PickPlaceEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PickPlaceEnvConfig {
    /// Number of cells along each side of the grid.
    pub grid_size: usize,

    /// Episodes are truncated after this number of steps.
    pub max_steps: usize,
}

impl Default for PickPlaceEnvConfig {
    fn default() -> Self {
        Self {
            grid_size: 5,
            max_steps: 50,
        }
    }
}

impl PickPlaceEnvConfig {
    /// Sets the size of the grid.
    pub fn grid_size(mut self, v: usize) -> Self {
        self.grid_size = v;
        self
    }

    /// Sets the step limit.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Constructs [`PickPlaceEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PickPlaceEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

type Cell = (usize, usize);

/// A gripper moving on an `N x N` grid, which must grasp an object and release
/// it on the goal cell.
///
/// Actions are `0`: down, `1`: up, `2`: right, `3`: left, `4`: grasp and
/// `5`: release. Every step costs `-1`. Grasping away from the object or
/// while holding it, and releasing away from the goal or with an empty
/// gripper, cost `-10` instead. Releasing the object on the goal gives `+20`
/// and terminates the episode.
///
/// The observation is `[gx, gy, ox, oy, tx, ty, holding]`, where the cells of
/// the gripper, the object and the goal are divided by `N - 1`.
pub struct PickPlaceEnv {
    config: PickPlaceEnvConfig,
    rng: StdRng,
    gripper: Cell,
    object: Cell,
    goal: Cell,
    holding: bool,
    n_steps: usize,
}

impl PickPlaceEnv {
    /// Actions in the order of their indices.
    pub const ACTIONS: [&'static str; 6] = ["DOWN", "UP", "RIGHT", "LEFT", "GRASP", "RELEASE"];

    fn random_cell(&mut self) -> Cell {
        let n = self.config.grid_size;
        (self.rng.gen_range(0..n), self.rng.gen_range(0..n))
    }

    fn obs(&self) -> ArrayObs {
        let scale = (self.config.grid_size - 1) as f32;
        let f = |v: usize| v as f32 / scale;
        ArrayObs(vec![
            f(self.gripper.0),
            f(self.gripper.1),
            f(self.object.0),
            f(self.object.1),
            f(self.goal.0),
            f(self.goal.1),
            if self.holding { 1.0 } else { 0.0 },
        ])
    }

    /// Moves the gripper, returns the reward and whether the object was placed.
    fn transition(&mut self, a: usize) -> (f32, bool) {
        let last = self.config.grid_size - 1;
        let (x, y) = self.gripper;
        match a {
            0 => self.gripper = (x, (y + 1).min(last)),
            1 => self.gripper = (x, y.saturating_sub(1)),
            2 => self.gripper = ((x + 1).min(last), y),
            3 => self.gripper = (x.saturating_sub(1), y),
            4 => {
                if self.holding || self.gripper != self.object {
                    return (-10.0, false);
                }
                self.holding = true;
            }
            5 => {
                if !self.holding || self.gripper != self.goal {
                    return (-10.0, false);
                }
                self.holding = false;
                return (20.0, true);
            }
            _ => warn!("Unknown action {} was ignored", a),
        }
        if self.holding {
            self.object = self.gripper;
        }
        (-1.0, false)
    }
}

impl Env for PickPlaceEnv {
    type Config = PickPlaceEnvConfig;
    type Obs = ArrayObs;
    type Act = DiscreteAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.grid_size < 2 {
            return Err(ArmRlError::InvalidConfig(format!(
                "grid_size must be at least 2, got {}",
                config.grid_size
            ))
            .into());
        }
        let mut env = Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(seed as u64),
            gripper: (0, 0),
            object: (0, 0),
            goal: (0, 1),
            holding: false,
            n_steps: 0,
        };
        env.reset()?;
        Ok(env)
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let (reward, is_terminated) = self.transition(a.0);
        self.n_steps += 1;
        let is_truncated = !is_terminated && self.n_steps >= self.config.max_steps;

        let step = Step::new(self.obs(), *a, reward, is_terminated, is_truncated, (), None);
        let record = Record::from_slice(&[(
            "holding",
            RecordValue::Scalar(if self.holding { 1.0 } else { 0.0 }),
        )]);
        (step, record)
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.gripper = self.random_cell();
        self.object = self.random_cell();
        self.goal = loop {
            let cell = self.random_cell();
            if cell != self.object {
                break cell;
            }
        };
        self.holding = false;
        self.n_steps = 0;
        Ok(self.obs())
    }

    /// Resets with the random number generator seeded by `ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = StdRng::seed_from_u64(ix as u64);
        self.reset()
    }

    fn observation_space(&self) -> Space {
        Space::uniform_box(7, 0.0, 1.0)
    }

    fn action_space(&self) -> Space {
        Space::Discrete(Self::ACTIONS.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn env_with(gripper: Cell, object: Cell, goal: Cell) -> Result<PickPlaceEnv> {
        let mut env = PickPlaceEnv::build(&PickPlaceEnvConfig::default(), 0)?;
        env.gripper = gripper;
        env.object = object;
        env.goal = goal;
        Ok(env)
    }

    fn step(env: &mut PickPlaceEnv, a: usize) -> Step<PickPlaceEnv> {
        env.step(&DiscreteAct(a)).0
    }

    #[test]
    fn test_pick_and_place() -> Result<()> {
        let mut env = env_with((0, 0), (1, 0), (1, 2))?;
        assert_eq!(step(&mut env, 2).reward, -1.0);
        assert_eq!(env.gripper, (1, 0));

        assert_eq!(step(&mut env, 4).reward, -1.0);
        assert!(env.holding);

        // the object moves with the gripper
        step(&mut env, 0);
        let s = step(&mut env, 0);
        assert_eq!(env.object, (1, 2));
        assert_eq!(s.obs.0[6], 1.0);

        let s = step(&mut env, 5);
        assert_eq!(s.reward, 20.0);
        assert!(s.is_terminated);
        assert!(!env.holding);
        Ok(())
    }

    #[test]
    fn test_illegal_grasp_and_release() -> Result<()> {
        let mut env = env_with((0, 0), (3, 3), (4, 4))?;
        assert_eq!(step(&mut env, 4).reward, -10.0);
        assert_eq!(step(&mut env, 5).reward, -10.0);
        assert!(!env.holding);

        // releasing away from the goal keeps the object in the gripper
        let mut env = env_with((3, 3), (3, 3), (4, 4))?;
        step(&mut env, 4);
        let s = step(&mut env, 5);
        assert_eq!(s.reward, -10.0);
        assert!(!s.is_terminated);
        assert!(env.holding);
        Ok(())
    }

    #[test]
    fn test_walls_and_truncation() -> Result<()> {
        let config = PickPlaceEnvConfig::default().max_steps(3);
        let mut env = PickPlaceEnv::build(&config, 0)?;
        env.gripper = (0, 0);
        step(&mut env, 1);
        step(&mut env, 3);
        assert_eq!(env.gripper, (0, 0));
        let s = step(&mut env, 1);
        assert!(s.is_truncated);
        assert!(s.is_done());
        Ok(())
    }

    #[test]
    fn test_reset() -> Result<()> {
        let mut env = PickPlaceEnv::build(&PickPlaceEnvConfig::default(), 42)?;
        let space = env.observation_space();
        for _ in 0..100 {
            let obs = env.reset()?;
            assert!(space.contains(&obs.0));
            assert_ne!(env.object, env.goal);
            assert_eq!(obs.0[6], 0.0);
        }

        let obs1 = env.reset_with_index(7)?;
        env.reset()?;
        let obs2 = env.reset_with_index(7)?;
        assert_eq!(obs1, obs2);
        Ok(())
    }

    #[test]
    fn test_config() -> Result<()> {
        assert!(PickPlaceEnv::build(&PickPlaceEnvConfig::default().grid_size(1), 0).is_err());

        let config = PickPlaceEnvConfig::default().grid_size(6).max_steps(30);
        let dir = TempDir::new("pick_place")?;
        let path = dir.path().join("env.yaml");
        config.save(&path)?;
        assert_eq!(PickPlaceEnvConfig::load(&path)?, config);
        Ok(())
    }
}
