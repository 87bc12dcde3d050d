/// Generalized advantage estimation over the TD errors of one episode.
///
/// Computed backwards as `A_t = gamma * lambda * A_{t+1} + delta_t`, with
/// `A_T = 0` after the last step.
pub fn compute_gae(deltas: &[f32], gamma: f32, lambda: f32) -> Vec<f32> {
    let mut advantages = vec![0.0; deltas.len()];
    let mut advantage = 0.0;
    for (t, delta) in deltas.iter().enumerate().rev() {
        advantage = gamma * lambda * advantage + delta;
        advantages[t] = advantage;
    }
    advantages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_gae() {
        let deltas = [1.0, 0.5, -1.0];
        let (gamma, lambda) = (0.9, 0.5);
        let c = gamma * lambda;
        let a2 = -1.0;
        let a1 = 0.5 + c * a2;
        let a0 = 1.0 + c * a1;

        let advantages = compute_gae(&deltas, gamma, lambda);
        assert_eq!(advantages.len(), 3);
        for (a, b) in advantages.iter().zip([a0, a1, a2]) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_compute_gae_lambda_zero() {
        // reduces to the TD errors
        assert_eq!(compute_gae(&[0.1, 0.2, 0.3], 0.98, 0.0), vec![0.1, 0.2, 0.3]);
        assert!(compute_gae(&[], 0.98, 0.95).is_empty());
    }
}
