use anyhow::{anyhow, Result};
use armrl_core::curve::{write_long_csv, LearningCurve};
use clap::Parser;
use log::info;
use std::path::Path;

/// Compare learning curves exported as `Step,Value` CSV files
///
/// Curves are smoothed, summarized and written into one long-format CSV file
/// with columns `algo,Step,Value`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Curves given as `label=path`, e.g. `PPO=PPO.csv`
    #[arg(required = true)]
    curves: Vec<String>,

    /// Window of the centered moving average, 1 for no smoothing
    #[arg(short, long, default_value_t = 1)]
    smooth: usize,

    /// Output file of the long-format table
    #[arg(short, long, default_value = "curves.csv")]
    out: String,
}

fn parse_curve_arg(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((label, path)) if !label.is_empty() && !path.is_empty() => Ok((label, path)),
        _ => Err(anyhow!("Expected label=path, got {}", arg)),
    }
}

fn compare(args: &Args) -> Result<Vec<LearningCurve>> {
    let curves = args
        .curves
        .iter()
        .map(|arg| {
            let (label, path) = parse_curve_arg(arg)?;
            Ok(LearningCurve::from_csv(path, label)?.smooth(args.smooth))
        })
        .collect::<Result<Vec<_>>>()?;

    for curve in curves.iter() {
        match curve.summary() {
            Some(s) => info!(
                "{}: {} points, last = {}, max = {}, tail mean = {}",
                s.label, s.count, s.last, s.max, s.tail_mean
            ),
            None => info!("{}: empty", curve.label()),
        }
    }

    write_long_csv(&curves, Path::new(&args.out))?;
    info!("Wrote {}", args.out);

    Ok(curves)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    compare(&args)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{compare, parse_curve_arg, Args};
    use anyhow::Result;
    use tempdir::TempDir;

    #[test]
    fn test_compare_curves() -> Result<()> {
        let tmp_dir = TempDir::new("compare_curves")?;
        let ppo = tmp_dir.path().join("PPO.csv");
        let dqn = tmp_dir.path().join("DQN.csv");
        std::fs::write(&ppo, "Wall time,Step,Value\n0.1,10,-5.0\n0.2,20,-3.0\n0.3,30,-1.0\n")?;
        std::fs::write(&dqn, "Step,Value\n10,-8.0\n20,-6.0\n")?;
        let out = tmp_dir.path().join("curves.csv");

        let args = Args {
            curves: vec![
                format!("PPO={}", ppo.display()),
                format!("DQN={}", dqn.display()),
            ],
            smooth: 3,
            out: out.to_string_lossy().to_string(),
        };
        let curves = compare(&args)?;
        assert_eq!(curves[0].values(), &[-4.0, -3.0, -2.0]);
        assert_eq!(curves[1].values(), &[-7.0, -7.0]);

        let table = std::fs::read_to_string(&out)?;
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "algo,Step,Value");
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[4], "DQN,10,-7");
        Ok(())
    }

    #[test]
    fn test_parse_curve_arg() {
        assert_eq!(parse_curve_arg("PPO=a/b.csv").unwrap(), ("PPO", "a/b.csv"));
        assert!(parse_curve_arg("a/b.csv").is_err());
        assert!(parse_curve_arg("=a.csv").is_err());
    }
}
