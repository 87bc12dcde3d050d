//! Learning curves exported as `Step,Value` CSV files.
//!
//! Curves of several runs can be smoothed and concatenated into a long-format
//! table `(algo, Step, Value)`, which plotting tools consume directly.
//!
//! ```rust
//! use armrl_core::curve::LearningCurve;
//!
//! let curve = LearningCurve::new("ppo", vec![0, 1, 2, 3], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
//! let smoothed = curve.smooth(3);
//! assert_eq!(smoothed.values(), &[0.5, 1.0, 2.0, 2.5]);
//! ```
use crate::error::ArmRlError;
use anyhow::Result;
use csv::{Reader, Writer};
use std::path::Path;

/// A sequence of `(step, value)` pairs with a label.
#[derive(Clone, Debug, PartialEq)]
pub struct LearningCurve {
    label: String,
    steps: Vec<i64>,
    values: Vec<f32>,
}

/// Summary statistics of a [`LearningCurve`].
#[derive(Clone, Debug, PartialEq)]
pub struct CurveSummary {
    /// Label of the curve.
    pub label: String,

    /// Number of points.
    pub count: usize,

    /// Last value.
    pub last: f32,

    /// Maximum value.
    pub max: f32,

    /// Mean over the last 10% of the points (at least one point).
    pub tail_mean: f32,
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, ArmRlError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| ArmRlError::CurveFormat(format!("Column {} was not found", name)))
}

fn parse_step(s: &str) -> Result<i64, ArmRlError> {
    let s = s.trim();
    s.parse::<i64>()
        .or_else(|_| s.parse::<f64>().map(|v| v as i64))
        .map_err(|_| ArmRlError::CurveFormat(format!("Invalid step: {}", s)))
}

impl LearningCurve {
    /// Constructs a curve. `steps` and `values` must have the same length.
    pub fn new(label: impl Into<String>, steps: Vec<i64>, values: Vec<f32>) -> Result<Self> {
        if steps.len() != values.len() {
            return Err(ArmRlError::CurveFormat(format!(
                "{} steps and {} values",
                steps.len(),
                values.len()
            ))
            .into());
        }
        Ok(Self {
            label: label.into(),
            steps,
            values,
        })
    }

    /// Reads the `Step` and `Value` columns of a CSV file. Other columns are ignored.
    pub fn from_csv(path: impl AsRef<Path>, label: impl Into<String>) -> Result<Self> {
        let mut rdr = Reader::from_path(path.as_ref())?;
        let headers = rdr.headers()?.clone();
        let ix_step = column(&headers, "Step")?;
        let ix_value = column(&headers, "Value")?;

        let mut steps = vec![];
        let mut values = vec![];
        for row in rdr.records() {
            let row = row?;
            let (step, value) = match (row.get(ix_step), row.get(ix_value)) {
                (Some(s), Some(v)) => (s, v),
                _ => {
                    return Err(ArmRlError::CurveFormat(format!(
                        "Short row at line {:?}",
                        row.position().map(|p| p.line())
                    ))
                    .into())
                }
            };
            steps.push(parse_step(step)?);
            values.push(
                value
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| ArmRlError::CurveFormat(format!("Invalid value: {}", value)))?,
            );
        }

        Self::new(label, steps, values)
    }

    /// Writes the curve as a `Step,Value` CSV file.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = Writer::from_path(path)?;
        wtr.write_record(["Step", "Value"])?;
        for (s, v) in self.steps.iter().zip(self.values.iter()) {
            wtr.write_record(&[s.to_string(), v.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Label of the curve.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Steps.
    pub fn steps(&self) -> &[i64] {
        &self.steps
    }

    /// Values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the curve has no point.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Centered moving average over `window` points.
    ///
    /// Each average is divided by the number of points inside the curve, so
    /// the ends are not pulled towards zero. `window <= 1` returns a copy.
    pub fn smooth(&self, window: usize) -> Self {
        if window <= 1 {
            return self.clone();
        }
        let n = self.values.len();
        let values = (0..n)
            .map(|i| {
                let lo = i.saturating_sub(window / 2);
                let hi = (i + (window - 1) / 2).min(n - 1);
                let vs = &self.values[lo..=hi];
                vs.iter().sum::<f32>() / vs.len() as f32
            })
            .collect();
        Self {
            label: self.label.clone(),
            steps: self.steps.clone(),
            values,
        }
    }

    /// Summary statistics. Returns `None` for an empty curve.
    pub fn summary(&self) -> Option<CurveSummary> {
        let last = *self.values.last()?;
        let n_tail = (self.values.len() / 10).max(1);
        let tail = &self.values[self.values.len() - n_tail..];
        Some(CurveSummary {
            label: self.label.clone(),
            count: self.values.len(),
            last,
            max: self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            tail_mean: tail.iter().sum::<f32>() / n_tail as f32,
        })
    }
}

/// Concatenates curves into rows of `(algo, step, value)`, curve by curve.
pub fn concat_long(curves: &[LearningCurve]) -> Vec<(String, i64, f32)> {
    curves
        .iter()
        .flat_map(|c| {
            c.steps
                .iter()
                .zip(c.values.iter())
                .map(move |(s, v)| (c.label.clone(), *s, *v))
        })
        .collect()
}

/// Writes curves as a long-format CSV file with columns `algo,Step,Value`.
pub fn write_long_csv(curves: &[LearningCurve], path: impl AsRef<Path>) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["algo", "Step", "Value"])?;
    for (algo, step, value) in concat_long(curves) {
        wtr.write_record(&[algo, step.to_string(), value.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn test_from_csv_ignores_other_columns() -> Result<()> {
        let dir = TempDir::new("curve")?;
        let path = dir.path().join("PPO.csv");
        let mut file = std::fs::File::create(&path)?;
        file.write_all(b"Wall time,Step,Value\n1.5,0,-10.0\n2.5,1,-8.5\n3.5,2.0,-7\n")?;

        let curve = LearningCurve::from_csv(&path, "PPO")?;
        assert_eq!(curve.label(), "PPO");
        assert_eq!(curve.steps(), &[0, 1, 2]);
        assert_eq!(curve.values(), &[-10.0, -8.5, -7.0]);
        Ok(())
    }

    #[test]
    fn test_from_csv_missing_column() -> Result<()> {
        let dir = TempDir::new("curve")?;
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "Step,Reward\n0,1.0\n")?;

        let err = LearningCurve::from_csv(&path, "bad").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArmRlError>(),
            Some(ArmRlError::CurveFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn test_smooth_normalized_at_ends() -> Result<()> {
        let curve = LearningCurve::new("a", vec![0, 1, 2, 3, 4], vec![1.0, 1.0, 1.0, 1.0, 1.0])?;
        assert_eq!(curve.smooth(4).values(), &[1.0; 5]);

        let curve = LearningCurve::new("a", vec![0, 1, 2, 3], vec![0.0, 2.0, 4.0, 6.0])?;
        // window 2 averages each point with its predecessor
        assert_eq!(curve.smooth(2).values(), &[0.0, 1.0, 3.0, 5.0]);
        assert_eq!(curve.smooth(1), curve);
        Ok(())
    }

    #[test]
    fn test_concat_long_and_roundtrip() -> Result<()> {
        let dqn = LearningCurve::new("DQN", vec![0, 10], vec![1.0, 2.0])?;
        let ppo = LearningCurve::new("PPO", vec![0], vec![3.0])?;
        let rows = concat_long(&[dqn.clone(), ppo]);
        assert_eq!(
            rows,
            vec![
                ("DQN".to_string(), 0, 1.0),
                ("DQN".to_string(), 10, 2.0),
                ("PPO".to_string(), 0, 3.0),
            ]
        );

        let dir = TempDir::new("curve")?;
        let path = dir.path().join("dqn.csv");
        dqn.to_csv(&path)?;
        assert_eq!(LearningCurve::from_csv(&path, "DQN")?, dqn);

        let long = dir.path().join("long.csv");
        write_long_csv(&[dqn], &long)?;
        let text = std::fs::read_to_string(&long)?;
        assert_eq!(text, "algo,Step,Value\nDQN,0,1\nDQN,10,2\n");
        Ok(())
    }

    #[test]
    fn test_summary() -> Result<()> {
        let values: Vec<f32> = (0..20).map(|v| v as f32).collect();
        let curve = LearningCurve::new("a", (0..20).collect(), values)?;
        let s = curve.summary().unwrap();
        assert_eq!(s.count, 20);
        assert_eq!(s.last, 19.0);
        assert_eq!(s.max, 19.0);
        assert_eq!(s.tail_mean, 18.5);
        assert!(LearningCurve::new("e", vec![], vec![])?.summary().is_none());
        Ok(())
    }
}
