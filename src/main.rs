use std::path::PathBuf;
use std::process::ExitCode;

use tinsel::prelude::*;

const USAGE: &str = "\
Usage: tinsel [OPTIONS]

Options:
  --config <FILE>      Load settings from a JSON file
  --landmarks <FILE>   Drive the tree from recorded hand landmarks (JSON lines)
  --manual             Skip hand detection and use pointer controls only
  --seed <N>           Fixed seed for the particle layout
  -h, --help           Print this help

Controls:
  Hold mouse / touch / Space   Scatter (manual control)
  Open palm                    Scatter (gesture control)
  Right drag, wheel            Orbit and zoom
  R / M                        Retry detection / proceed with manual controls
  Esc                          Quit";

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    landmarks: Option<PathBuf>,
    manual: bool,
    seed: Option<u64>,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config = Some(value(&mut args, &arg)?.into()),
            "--landmarks" => parsed.landmarks = Some(value(&mut args, &arg)?.into()),
            "--manual" => parsed.manual = true,
            "--seed" => {
                let raw = value(&mut args, &arg)?;
                let seed = raw.parse().map_err(|_| format!("invalid seed: {}", raw))?;
                parsed.seed = Some(seed);
            }
            "-h" | "--help" => parsed.help = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    if parsed.manual && parsed.landmarks.is_some() {
        return Err("--manual and --landmarks cannot be combined".into());
    }
    Ok(parsed)
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{} needs a value", flag))
}

fn provider_factory(args: &Args, config: &TinselConfig) -> Option<ProviderFactory> {
    if args.manual {
        return None;
    }
    let interval = config.detection.frame_interval();
    let factory: ProviderFactory = match args.landmarks.clone() {
        Some(path) => Box::new(move || {
            Box::new(ReplayProvider::new(path.clone()).with_interval(interval)) as Box<dyn LandmarkProvider>
        }),
        None => Box::new(|| {
            Box::new(UnavailableProvider::new("no camera landmark backend in this build"))
                as Box<dyn LandmarkProvider>
        }),
    };
    Some(factory)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let mut config = match &args.config {
        Some(path) => match TinselConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => TinselConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let factory = provider_factory(&args, &config);
    match tinsel::run(config, factory) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_args() {
        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn test_all_flags() {
        let parsed = args(&["--config", "a.json", "--landmarks", "hands.jsonl", "--seed", "42"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("a.json")));
        assert_eq!(parsed.landmarks, Some(PathBuf::from("hands.jsonl")));
        assert_eq!(parsed.seed, Some(42));
        assert!(!parsed.manual);
    }

    #[test]
    fn test_errors() {
        assert!(args(&["--seed"]).is_err());
        assert!(args(&["--seed", "abc"]).is_err());
        assert!(args(&["--bogus"]).is_err());
        assert!(args(&["--manual", "--landmarks", "x"]).is_err());
    }

    #[test]
    fn test_manual_has_no_provider() {
        let parsed = args(&["--manual"]).unwrap();
        assert!(provider_factory(&parsed, &TinselConfig::default()).is_none());
        assert!(provider_factory(&Args::default(), &TinselConfig::default()).is_some());
    }
}
