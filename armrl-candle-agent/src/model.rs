//! Interface of neural networks used in RL agents.
use candle_nn::VarBuilder;

/// Neural network model not owning its [`VarMap`] internally.
///
/// Parameters are created through the given [`VarBuilder`], so several models
/// can share a [`VarMap`], and a model can be rebuilt on another one, e.g., for
/// a target network.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait SubModel1: Sized {
    /// Configuration from which [`SubModel1`] is constructed.
    type Config;

    /// Input of the [`SubModel1`].
    type Input;

    /// Output of the [`SubModel1`].
    type Output;

    /// Builds [`SubModel1`] with [`VarBuilder`] and [`SubModel1::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> candle_core::Result<Self>;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> candle_core::Result<Self::Output>;
}
