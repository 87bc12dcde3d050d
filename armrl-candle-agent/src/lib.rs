//! RL agents implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`dqn::Dqn`], deep Q-network with a periodically synchronized target network.
//! * [`ppo::Ppo`], proximal policy optimization with a categorical policy.
pub mod dqn;
mod error;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod ppo;
pub mod util;
pub use error::CandleAgentError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
