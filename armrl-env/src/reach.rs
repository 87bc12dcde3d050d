//! Reaching with a planar two-link arm.
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
    f32::consts::PI,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

const LINK1: f32 = 1.0;
const LINK2: f32 = 0.8;
const JOINT_STEP: f32 = 0.1;

/// Configuration of [`ReachEnv`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ReachEnvConfig {
    /// The target is reached within this distance.
    pub tolerance: f32,

    /// Episodes are truncated after this number of steps.
    pub max_steps: usize,
}

impl Default for ReachEnvConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.1,
            max_steps: 100,
        }
    }
}

impl ReachEnvConfig {
    /// Sets the tolerance.
    pub fn tolerance(mut self, v: f32) -> Self {
        self.tolerance = v;
        self
    }

    /// Sets the step limit.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Constructs [`ReachEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ReachEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

fn wrap(angle: f32) -> f32 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// A planar arm with two revolute joints, link lengths 1.0 and 0.8.
///
/// Actions `0` to `3` rotate joint 1 by `+0.1`, joint 1 by `-0.1`, joint 2 by
/// `+0.1` and joint 2 by `-0.1` radians. Action `4` does nothing. The reward is
/// the negative distance between the end effector and the target, with a bonus
/// of `10` when the distance falls within the tolerance, which terminates the
/// episode.
///
/// The observation is `[cos q1, sin q1, cos q2, sin q2, tx, ty, ex - tx, ey - ty]`.
pub struct ReachEnv {
    config: ReachEnvConfig,
    rng: StdRng,
    q: [f32; 2],
    target: [f32; 2],
    n_steps: usize,
}

impl ReachEnv {
    /// Position of the end effector.
    pub fn end_effector(&self) -> [f32; 2] {
        let [q1, q2] = self.q;
        [
            LINK1 * q1.cos() + LINK2 * (q1 + q2).cos(),
            LINK1 * q1.sin() + LINK2 * (q1 + q2).sin(),
        ]
    }

    /// Distance between the end effector and the target.
    pub fn distance(&self) -> f32 {
        let [ex, ey] = self.end_effector();
        let [tx, ty] = self.target;
        ((ex - tx).powi(2) + (ey - ty).powi(2)).sqrt()
    }

    fn obs(&self) -> ArrayObs {
        let [q1, q2] = self.q;
        let [tx, ty] = self.target;
        let [ex, ey] = self.end_effector();
        ArrayObs(vec![
            q1.cos(),
            q1.sin(),
            q2.cos(),
            q2.sin(),
            tx,
            ty,
            ex - tx,
            ey - ty,
        ])
    }
}

impl Env for ReachEnv {
    type Config = ReachEnvConfig;
    type Obs = ArrayObs;
    type Act = DiscreteAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.tolerance <= 0.0 {
            return Err(ArmRlError::InvalidConfig("tolerance must be positive".to_string()).into());
        }
        let mut env = Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(seed as u64),
            q: [0.0; 2],
            target: [LINK1 + LINK2, 0.0],
            n_steps: 0,
        };
        env.reset()?;
        Ok(env)
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        match a.0 {
            0 => self.q[0] += JOINT_STEP,
            1 => self.q[0] -= JOINT_STEP,
            2 => self.q[1] += JOINT_STEP,
            3 => self.q[1] -= JOINT_STEP,
            4 => {}
            _ => warn!("Unknown action {} was ignored", a.0),
        }
        self.q = [wrap(self.q[0]), wrap(self.q[1])];
        self.n_steps += 1;

        let distance = self.distance();
        let is_terminated = distance < self.config.tolerance;
        let is_truncated = !is_terminated && self.n_steps >= self.config.max_steps;
        let reward = if is_terminated { 10.0 - distance } else { -distance };

        let step = Step::new(self.obs(), *a, reward, is_terminated, is_truncated, (), None);
        let record = Record::from_slice(&[("distance", RecordValue::Scalar(distance))]);
        (step, record)
    }

    /// Samples joint angles and a reachable target away from the end effector.
    fn reset(&mut self) -> Result<Self::Obs> {
        self.n_steps = 0;
        loop {
            self.q = [self.rng.gen_range(-PI..PI), self.rng.gen_range(-PI..PI)];
            let r = self.rng.gen_range(0.3..(LINK1 + LINK2 - 0.1));
            let theta = self.rng.gen_range(-PI..PI);
            self.target = [r * theta.cos(), r * theta.sin()];
            if self.distance() >= self.config.tolerance {
                return Ok(self.obs());
            }
        }
    }

    /// Resets with the random number generator seeded by `ix`.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = StdRng::seed_from_u64(ix as u64);
        self.reset()
    }

    fn observation_space(&self) -> Space {
        let reach = LINK1 + LINK2;
        let mut low = vec![-1.0; 4];
        low.extend([-reach, -reach, -2.0 * reach, -2.0 * reach]);
        let high = low.iter().map(|v| -v).collect();
        Space::Box {
            low,
            high,
            shape: vec![8],
        }
    }

    fn action_space(&self) -> Space {
        Space::Discrete(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_kinematics() -> Result<()> {
        let mut env = ReachEnv::build(&ReachEnvConfig::default(), 0)?;
        env.q = [0.0, 0.0];
        let [ex, ey] = env.end_effector();
        assert!((ex - 1.8).abs() < 1e-6 && ey.abs() < 1e-6);

        env.q = [PI / 2.0, -PI / 2.0];
        let [ex, ey] = env.end_effector();
        assert!((ex - 0.8).abs() < 1e-5 && (ey - 1.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_reward_and_termination() -> Result<()> {
        let mut env = ReachEnv::build(&ReachEnvConfig::default(), 0)?;
        env.q = [0.0, 0.0];
        env.target = [-1.0, 0.0];
        let (s, record) = env.step(&DiscreteAct(4));
        assert!((s.reward + 2.8).abs() < 1e-5);
        assert_eq!(record.get_scalar("distance")?, -s.reward);
        assert!(!s.is_done());

        // one joint step away from the target
        env.q = [0.0, 0.0];
        env.target = env.end_effector();
        env.q = [-JOINT_STEP, 0.0];
        let (s, _) = env.step(&DiscreteAct(0));
        assert!(s.is_terminated);
        assert!(s.reward > 9.9);
        Ok(())
    }

    #[test]
    fn test_truncation_and_wrap() -> Result<()> {
        let mut env = ReachEnv::build(&ReachEnvConfig::default().max_steps(2), 0)?;
        env.q = [PI - 0.05, 0.0];
        env.target = [-1.0, -1.0];
        let (s, _) = env.step(&DiscreteAct(0));
        assert!(env.q[0] < 0.0);
        assert!(!s.is_done());
        let (s, _) = env.step(&DiscreteAct(4));
        assert!(s.is_truncated);
        Ok(())
    }

    #[test]
    fn test_reset_with_index() -> Result<()> {
        let mut env = ReachEnv::build(&ReachEnvConfig::default(), 3)?;
        let space = env.observation_space();
        let obs1 = env.reset_with_index(5)?;
        env.reset()?;
        assert_eq!(env.reset_with_index(5)?, obs1);
        assert!(space.contains(&obs1.0));
        assert!(env.distance() >= 0.1);
        Ok(())
    }
}
