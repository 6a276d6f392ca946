use std::path::PathBuf;

use clap::{Parser, Subcommand};
use neurotempo_core::{
    Calibrator, NeurotempoConfig, Pipeline, Scenario, ScriptStep, SimulatedHeadset, TickOutcome,
};

#[derive(Parser)]
#[command(name = "neurotempo", version, about = "Run the neurotempo pipeline against a simulated headset")]
struct Cli {
    /// TOML config; NEUROTEMPO_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a session and print its summary as JSON
    Simulate {
        /// Script steps as `scenario:seconds`, e.g. `focused:300 drowsy:600`
        #[arg(value_parser = parse_step, default_values = ["focused:600"])]
        script: Vec<ScriptStep>,
        /// Session length in seconds
        #[arg(long, default_value_t = 600)]
        duration: u32,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        /// Calibrated baseline; defaults to calibration.default_baseline
        #[arg(long)]
        baseline: Option<f32>,
        /// Print every tick report as a JSON line
        #[arg(long)]
        ticks: bool,
    },
    /// Collect a baseline from a simulated calibration run
    Calibrate {
        #[arg(long, value_parser = parse_scenario, default_value = "focused")]
        scenario: Scenario,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        /// Give up after this many seconds
        #[arg(long, default_value_t = 120)]
        timeout: u32,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn parse_scenario(s: &str) -> Result<Scenario, String> {
    match s.to_ascii_lowercase().as_str() {
        "focused" => Ok(Scenario::Focused),
        "drowsy" => Ok(Scenario::Drowsy),
        "off_head" | "offhead" => Ok(Scenario::OffHead),
        "flatline" => Ok(Scenario::Flatline),
        "motion" | "motion_artifact" => Ok(Scenario::MotionArtifact),
        "dropout" => Ok(Scenario::Dropout),
        other => Err(format!("unknown scenario '{}'", other)),
    }
}

fn parse_step(s: &str) -> Result<ScriptStep, String> {
    let (name, secs) = s
        .split_once(':')
        .ok_or_else(|| format!("expected scenario:seconds, got '{}'", s))?;
    let duration_s: f64 = secs
        .parse()
        .map_err(|_| format!("invalid duration '{}'", secs))?;
    if !(duration_s > 0.0) {
        return Err(format!("duration must be positive, got {}", duration_s));
    }
    Ok(ScriptStep::new(parse_scenario(name)?, duration_s))
}

fn load_config(path: Option<&PathBuf>) -> Result<NeurotempoConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => NeurotempoConfig::from_file_with_env(path)?,
        None => NeurotempoConfig::load_layered(None, None)?,
    };
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.cmd {
        Commands::Simulate {
            script,
            duration,
            seed,
            baseline,
            ticks,
        } => {
            let baseline = baseline.unwrap_or(config.calibration.default_baseline);
            let tick_s = config.acquisition.tick_s as f64;
            let mut pipeline = Pipeline::new(config, baseline)?;
            let mut headset = SimulatedHeadset::new(seed, script)?;

            let n_ticks = (duration as f64 / tick_s).floor() as u64;
            let mut now = 0.0;
            for i in 0..=n_ticks {
                if i > 0 {
                    headset.advance(tick_s)?;
                    now += tick_s;
                }
                let report = pipeline.tick(&mut headset, now);
                if ticks {
                    println!("{}", serde_json::to_string(&report)?);
                }
            }

            let summary = pipeline.summary(now);
            log::info!(
                "session done: {}s, {} break(s), avg focus {:.2}",
                summary.duration_s,
                summary.breaks,
                summary.avg_focus
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Calibrate {
            scenario,
            seed,
            timeout,
        } => {
            let tick_s = config.acquisition.tick_s as f64;
            let mut calibrator = Calibrator::new(config.calibration.duration_s);
            let fallback = config.calibration.default_baseline;
            let mut pipeline = Pipeline::new(config, fallback)?;
            let mut headset =
                SimulatedHeadset::new(seed, vec![ScriptStep::new(scenario, timeout as f64)])?;

            let mut now = 0.0;
            while now < timeout as f64 && !calibrator.is_complete() {
                headset.advance(tick_s)?;
                now += tick_s;
                let report = pipeline.tick(&mut headset, now);
                if report.outcome == TickOutcome::Accepted {
                    calibrator.push(report.metrics.focus);
                    log::debug!("calibration {:.0}%", calibrator.progress() * 100.0);
                }
            }

            match calibrator.baseline().or_else(|| calibrator.current_mean()) {
                Some(baseline) => {
                    if !calibrator.is_complete() {
                        log::warn!(
                            "calibration stopped early at {:.0}%",
                            calibrator.progress() * 100.0
                        );
                    }
                    println!("{:.3}", baseline);
                }
                None => {
                    log::warn!("no accepted samples; using default baseline");
                    println!("{:.3}", fallback);
                }
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step() {
        let step = parse_step("drowsy:90").unwrap();
        assert_eq!(step.scenario, Scenario::Drowsy);
        assert_eq!(step.duration_s, 90.0);
        assert!(parse_step("drowsy").is_err());
        assert!(parse_step("sleepy:10").is_err());
        assert!(parse_step("focused:-1").is_err());
    }

    #[test]
    fn test_cli_parses_simulate() {
        let cli = Cli::try_parse_from([
            "neurotempo",
            "simulate",
            "focused:10",
            "off_head:5",
            "--duration",
            "15",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Simulate {
                script, duration, ..
            } => {
                assert_eq!(script.len(), 2);
                assert_eq!(script[1].scenario, Scenario::OffHead);
                assert_eq!(duration, 15);
            }
            _ => panic!("expected simulate"),
        }
    }
}
