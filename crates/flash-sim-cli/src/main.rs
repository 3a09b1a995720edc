//! CLI entry point for the `flash-sim` host exerciser.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use flash_sim_core::{FlashConfig, FlashSimulator};
#[cfg(test)]
use tempfile as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod soak;

const USAGE_TEXT: &str = "\
Usage: flash-sim <command> [options]

Commands:
  info [--config <file>]                     Print device geometry and fault settings
  soak [--config <file>] [--iterations <n>]  Erase/program/verify every unit in turn

Options:
  -c, --config <file>      JSON device configuration (default: built-in geometry)
  -n, --iterations <n>     Soak iterations (default: 100)
  -h, --help               Show this help message

Environment:
  RUST_LOG                 Log filter (default: flash_sim=info,flash_sim_core=info)

Examples:
  flash-sim info
  flash-sim soak --config faulty.json --iterations 500
";

const DEFAULT_ITERATIONS: u32 = 100;
const DEFAULT_LOG_FILTER: &str = "flash_sim=info,flash_sim_core=info";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Info(InfoArgs),
    Soak(SoakArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct InfoArgs {
    config: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
struct SoakArgs {
    config: Option<PathBuf>,
    iterations: u32,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "info" => parse_info_args(args)
            .map(Command::Info)
            .map(ParseResult::Command),
        "soak" => parse_soak_args(args)
            .map(Command::Soak)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn parse_info_args(args: impl Iterator<Item = OsString>) -> Result<InfoArgs, String> {
    let (config, iterations) = parse_options(args)?;
    if iterations.is_some() {
        return Err("--iterations only applies to soak".to_string());
    }
    Ok(InfoArgs { config })
}

fn parse_soak_args(args: impl Iterator<Item = OsString>) -> Result<SoakArgs, String> {
    let (config, iterations) = parse_options(args)?;
    Ok(SoakArgs {
        config,
        iterations: iterations.unwrap_or(DEFAULT_ITERATIONS),
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_options(
    mut args: impl Iterator<Item = OsString>,
) -> Result<(Option<PathBuf>, Option<u32>), String> {
    let mut config: Option<PathBuf> = None;
    let mut iterations: Option<u32> = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "-c" || arg == "--config" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --config".to_string())?;
            config = Some(PathBuf::from(value));
            continue;
        }

        if arg == "-n" || arg == "--iterations" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --iterations".to_string())?;
            let value = value.to_string_lossy();
            let count = value
                .parse()
                .map_err(|_| format!("invalid iteration count: {value}"))?;
            iterations = Some(count);
            continue;
        }

        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }

    Ok((config, iterations))
}

fn load_config(path: Option<&Path>) -> Result<FlashConfig, String> {
    let Some(path) = path else {
        return Ok(FlashConfig::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid config {}: {e}", path.display()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_info(args: &InfoArgs) -> Result<(), i32> {
    let config = load_config(args.config.as_deref()).map_err(|error| {
        eprintln!("error: {error}");
        1
    })?;

    match soak::describe(&config) {
        Ok(text) => {
            print!("{text}");
            Ok(())
        }
        Err(error) => {
            eprintln!("error: invalid device configuration: {error}");
            Err(1)
        }
    }
}

fn run_soak(args: &SoakArgs) -> Result<(), i32> {
    let config = load_config(args.config.as_deref()).map_err(|error| {
        eprintln!("error: {error}");
        1
    })?;

    let mut sim = FlashSimulator::new(config).map_err(|error| {
        eprintln!("error: invalid device configuration: {error}");
        1
    })?;

    soak::run(&mut sim, args.iterations);
    info!(
        api_faults = sim.stats().api_faults,
        hardware_faults = sim.stats().hardware_faults,
        "soak statistics"
    );
    print!("{}", soak::stats_table(&sim));
    Ok(())
}

fn main() {
    init_logging();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Info(args))) => match run_info(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParseResult::Command(Command::Soak(args))) => match run_soak(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter().map(OsString::from).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_soak_command() {
        let result = parse_soak_args(os(&["--config", "dev.json", "-n", "7"]))
            .expect("valid soak args should parse");

        assert_eq!(
            result,
            SoakArgs {
                config: Some(PathBuf::from("dev.json")),
                iterations: 7,
            }
        );
    }

    #[test]
    fn soak_defaults_iterations() {
        let result = parse_soak_args(std::iter::empty()).expect("no args should parse");
        assert_eq!(result.iterations, DEFAULT_ITERATIONS);
        assert_eq!(result.config, None);
    }

    #[test]
    fn parses_info_command() {
        let result = parse_args(os(&["info", "-c", "dev.json"])).expect("info should parse");
        assert!(matches!(
            result,
            ParseResult::Command(Command::Info(InfoArgs { config: Some(_) }))
        ));
    }

    #[test]
    fn info_rejects_iterations() {
        let error = parse_args(os(&["info", "--iterations", "100"]))
            .expect_err("iterations belong to soak");
        assert!(error.contains("only applies to soak"));
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os(&["-h"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os(&["format"])).expect_err("unknown command should fail parse");
        assert!(error.contains("unknown command"));
    }

    #[test]
    fn rejects_bad_iteration_count() {
        let error = parse_soak_args(os(&["--iterations", "many"]))
            .expect_err("non-numeric count should fail");
        assert!(error.contains("invalid iteration count"));

        let error = parse_soak_args(os(&["--iterations"])).expect_err("missing value");
        assert!(error.contains("missing value"));
    }

    #[test]
    fn rejects_positional_arguments() {
        let error = parse_soak_args(os(&["dev.json"])).expect_err("positional argument");
        assert!(error.contains("unknown option"));
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config, FlashConfig::default());
    }

    #[test]
    fn partial_json_config_fills_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "unit_count": 8, "max_erase_cycles": 1000 }"#).expect("write");

        let config = load_config(Some(&path)).expect("partial config parses");
        assert_eq!(config.unit_count, 8);
        assert_eq!(config.max_erase_cycles, Some(1000));
        assert_eq!(config.erase_unit_size, FlashConfig::default().erase_unit_size);
    }
}
