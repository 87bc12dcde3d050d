//! Utilities.
use anyhow::{Context, Result};
use armrl_core::{DiscreteAction, Obs};
use candle_core::{backprop::GradStore, DType, Device, Tensor, Var, D};
use candle_nn::VarMap;
use log::trace;
use serde::{Deserialize, Serialize};
use std::sync::PoisonError;

/// Critic loss type.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
///
/// With `tau = 1.0`, `dest` becomes an exact copy of `src`.
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("dest");
    let dest = dest.data().lock().unwrap_or_else(PoisonError::into_inner);
    trace!("src");
    let src = src.data().lock().unwrap_or_else(PoisonError::into_inner);

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .with_context(|| format!("Variable {} was not found in the source", k_dest))?;
        let t_src = v_src.as_tensor();
        let t_dest = if tau == 1.0 {
            t_src.copy()?
        } else {
            ((tau * t_src)? + ((1.0 - tau) * v_dest.as_tensor())?)?
        };
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?;
    let m2 = (1.0 - &m1)?;
    (((0.5 * m1)? * d.powf(2.0))? + (m2 * (d - 0.5)?)?)?.mean_all()
}

/// Stacks the features of observations into a `[n, dim]` tensor.
pub fn obs_to_tensor<'a, O, I>(obs: I, device: &Device) -> Result<Tensor>
where
    O: Obs + 'a,
    I: IntoIterator<Item = &'a O>,
{
    let mut data = vec![];
    let mut n = 0;
    let mut dim = None;
    for o in obs {
        let fs = o.features();
        match dim {
            None => dim = Some(fs.len()),
            Some(d) if d != fs.len() => {
                anyhow::bail!("Observations of dimensions {} and {} were mixed", d, fs.len())
            }
            _ => {}
        }
        data.extend_from_slice(fs);
        n += 1;
    }
    let dim = dim.context("No observation was given")?;
    Ok(Tensor::from_vec(data, (n, dim), device)?)
}

/// Indices of discrete actions as a `[n, 1]` u32 tensor, to be used in `gather`.
pub fn act_to_tensor<A: DiscreteAction>(act: &[A], device: &Device) -> Result<Tensor> {
    let data = act.iter().map(|a| a.index() as u32).collect::<Vec<_>>();
    Ok(Tensor::from_vec(data, (act.len(), 1), device)?)
}

/// A `[n]` f32 tensor.
pub fn vec_to_tensor(v: Vec<f32>, device: &Device) -> Result<Tensor> {
    let n = v.len();
    Ok(Tensor::from_vec(v, (n,), device)?)
}

/// Index of the maximum along the last dimension of the first row.
pub fn argmax_first(xs: &Tensor) -> Result<usize> {
    let ix = xs.argmax(D::Minus1)?.flatten_all()?.to_vec1::<u32>()?;
    Ok(ix.first().copied().context("Empty tensor")? as usize)
}

/// Clamps the gradients of `vars` element-wise into `[-clip, clip]`.
pub fn clamp_grads(grads: &mut GradStore, vars: &[Var], clip: f64) -> Result<()> {
    for var in vars {
        if let Some(g) = grads.remove(var) {
            grads.insert(var, g.clamp(-clip, clip)?);
        }
    }
    Ok(())
}

/// Sum of absolute differences of the variables with the same names.
pub fn varmap_distance(a: &VarMap, b: &VarMap) -> Result<f32> {
    let a = a.data().lock().unwrap_or_else(PoisonError::into_inner);
    let b = b.data().lock().unwrap_or_else(PoisonError::into_inner);
    let mut d = 0f32;
    for (k, va) in a.iter() {
        let vb = b.get(k).with_context(|| format!("Variable {} was not found", k))?;
        d += (va.as_tensor() - vb.as_tensor())?
            .abs()?
            .sum_all()?
            .to_scalar::<f32>()?;
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use armrl_core::{ArrayObs, DiscreteAct};
    use candle_nn::Init;

    fn varmap_with(t: &Tensor) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((3,), "var1", init, DType::F32, &Device::Cpu)?;
        vm.data()
            .lock()
            .unwrap()
            .get("var1")
            .unwrap()
            .set(t)?;
        Ok(vm)
    }

    #[test]
    fn test_track() -> Result<()> {
        let tau = 0.7;
        let t_src = Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?;
        let t_dest = Tensor::from_slice(&[4.0f32, 5.0, 6.0], (3,), &Device::Cpu)?;
        let t = ((tau * &t_src)? + ((1.0 - tau) * &t_dest)?)?;

        let vm_src = varmap_with(&t_src)?;
        let vm_dest = varmap_with(&t_dest)?;
        track(&vm_dest, &vm_src, tau)?;

        let t_ = vm_dest
            .data()
            .lock()
            .unwrap()
            .get("var1")
            .unwrap()
            .as_tensor()
            .clone();
        assert!((t - t_)?.abs()?.sum(0)?.to_scalar::<f32>()? < 1e-6);
        Ok(())
    }

    #[test]
    fn test_hard_update_copies() -> Result<()> {
        let vm_src = varmap_with(&Tensor::from_slice(&[1.0f32, 2.0, 3.0], (3,), &Device::Cpu)?)?;
        let vm_dest = varmap_with(&Tensor::from_slice(&[0.0f32, 0.0, 0.0], (3,), &Device::Cpu)?)?;
        assert!(varmap_distance(&vm_dest, &vm_src)? > 0.0);
        track(&vm_dest, &vm_src, 1.0)?;
        assert_eq!(varmap_distance(&vm_dest, &vm_src)?, 0.0);
        Ok(())
    }

    #[test]
    fn test_smooth_l1_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0.0f32, 0.0], (2,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[0.5f32, 3.0], (2,), &Device::Cpu)?;
        // (0.5 * 0.25 + (3.0 - 0.5)) / 2
        let loss = smooth_l1_loss(&x, &y)?.to_scalar::<f32>()?;
        assert!((loss - 1.3125).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_to_tensor() -> Result<()> {
        let obs = vec![ArrayObs(vec![1.0, 2.0]), ArrayObs(vec![3.0, 4.0])];
        let t = obs_to_tensor(obs.iter(), &Device::Cpu)?;
        assert_eq!(t.dims(), &[2, 2]);
        assert_eq!(t.to_vec2::<f32>()?, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);

        let mixed = vec![ArrayObs(vec![1.0]), ArrayObs(vec![3.0, 4.0])];
        assert!(obs_to_tensor(mixed.iter(), &Device::Cpu).is_err());

        let a = act_to_tensor(&[DiscreteAct(2), DiscreteAct(0)], &Device::Cpu)?;
        assert_eq!(a.to_vec2::<u32>()?, vec![vec![2], vec![0]]);
        Ok(())
    }
}
