use anyhow::Result;
use log::{debug, info};

use memvis::config::HarnessConfig;
use memvis::harness::Harness;
use memvis::options::Options;

const DEFAULT_CONFIG_PATH: &str = "memvis.toml";

fn main() {
    if std::env::var("MEMVIS_LOG").is_ok() {
        let env = env_logger::Env::new()
            .filter("MEMVIS_LOG")
            .write_style("MEMVIS_LOG_STYLE");
        env_logger::init_from_env(env);
    }

    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("memvis: {err:#}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = if args.is_empty() {
        // Flags can also arrive through the environment, for wrappers
        // that cannot pass arguments directly.
        Options::parse_from_str(&std::env::var("MEMVIS_FLAGS").unwrap_or_default())?
    } else {
        Options::parse_from_args(&args)?
    };
    debug!("memvis options: {:?}", options);

    // A path the user named must exist; only the implicit probe for the
    // default file may fall back to built-in defaults.
    let config = match options.config.as_deref() {
        Some(path) => HarnessConfig::load_from_required_file(path)?,
        None => HarnessConfig::load_from_file(DEFAULT_CONFIG_PATH)?,
    };
    let output = options.output.clone();

    let plan = options.into_plan(&config)?;
    let report = Harness::new(plan).run()?;
    print!("{report}");

    if let Some(path) = output {
        report.save_to_file(&path)?;
        info!("report written to {path}");
    }

    // Exit 1 signals a broken atomic or ordering primitive somewhere
    // between the harness and the host, never a flaky run.
    Ok(if report.has_violation() { 1 } else { 0 })
}
