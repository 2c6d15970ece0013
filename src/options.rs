//! Parsing options.
//! `run-trials --workers N --increments K --repeats R [--kind {kind}]`

use clap::error::ErrorKind;
use clap::{Arg, ArgMatches, Command};

use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::harness::TrialPlan;
use crate::trial::TrialKind;

fn make_options_parser() -> Command {
    Command::new("memvis")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Empirical memory-visibility demonstration harness")
        .subcommand_required(true)
        .subcommand(
            Command::new("run-trials")
                .about("Run repeated concurrent trials under each memory-access discipline")
                .arg(
                    Arg::new("workers")
                        .short('w')
                        .long("workers")
                        .value_name("N")
                        .allow_hyphen_values(true)
                        .help("Concurrent workers per trial (consumers for the flagged kind)"),
                )
                .arg(
                    Arg::new("increments")
                        .short('i')
                        .long("increments")
                        .value_name("K")
                        .allow_hyphen_values(true)
                        .help("Increments performed by each worker"),
                )
                .arg(
                    Arg::new("repeats")
                        .short('r')
                        .long("repeats")
                        .value_name("R")
                        .allow_hyphen_values(true)
                        .help("Repetitions of each trial kind"),
                )
                .arg(
                    Arg::new("kind")
                        .short('k')
                        .long("kind")
                        .help("The trial kind (defaults to the kinds enabled in the config file)")
                        .value_parser(["plain", "flagged", "atomic", "mutex", "all"]),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Path to file where the JSON report will be stored"),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Path to a TOML file with workload defaults"),
                ),
        )
}

/// Raw command-line options. Workload values stay optional here so that
/// file-level configuration can fill the gaps; see [`Options::into_plan`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub workers: Option<usize>,
    pub increments: Option<u64>,
    pub repeats: Option<usize>,
    /// `None` when `--kind` was not given; the config file's per-kind
    /// enable flags decide then.
    pub kinds: Option<Vec<TrialKind>>,
    pub output: Option<String>,
    pub config: Option<String>,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, HarnessError> {
        let flags = shellwords::split(s)
            .map_err(|err| HarnessError::Configuration(err.to_string()))?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, HarnessError> {
        let app = make_options_parser();
        let matches = app
            .try_get_matches_from(flags.iter())
            .map_err(|err| match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
                _ => HarnessError::Configuration(err.to_string()),
            })?;
        let Some(("run-trials", sub)) = matches.subcommand() else {
            return Err(HarnessError::Configuration(
                "expected the run-trials subcommand".to_string(),
            ));
        };

        let kinds = sub
            .get_one::<String>("kind")
            .map(|kind| match kind.as_str() {
                "plain" => vec![TrialKind::Plain],
                "flagged" => vec![TrialKind::Flagged],
                "atomic" => vec![TrialKind::Atomic],
                "mutex" => vec![TrialKind::Mutex],
                _ => TrialKind::ALL.to_vec(),
            });

        Ok(Options {
            workers: parse_non_negative(sub, "workers", "worker count")?.map(|v| v as usize),
            increments: parse_non_negative(sub, "increments", "increments per worker")?,
            repeats: parse_non_negative(sub, "repeats", "repeat count")?.map(|v| v as usize),
            kinds,
            output: sub.get_one::<String>("output").cloned(),
            config: sub.get_one::<String>("config").cloned(),
        })
    }

    /// Resolves CLI options against file-level defaults and validates the
    /// result. All configuration errors surface here, before any trial
    /// thread is spawned.
    pub fn into_plan(self, config: &HarnessConfig) -> Result<TrialPlan, HarnessError> {
        let plan = TrialPlan {
            workers: self.workers.unwrap_or(config.workers),
            increments: self.increments.unwrap_or(config.increments),
            repeats: self.repeats.unwrap_or(config.repeats),
            kinds: self.kinds.unwrap_or_else(|| config.enabled_kinds()),
            payload: config.payload,
            spin_budget: config.spin_budget,
        };
        if plan.workers == 0 {
            return Err(HarnessError::Configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        if plan.repeats == 0 {
            return Err(HarnessError::Configuration(
                "repeat count must be at least 1".to_string(),
            ));
        }
        if plan.spin_budget == 0 {
            return Err(HarnessError::Configuration(
                "spin budget must be at least 1".to_string(),
            ));
        }
        if plan.kinds.is_empty() {
            return Err(HarnessError::Configuration(
                "at least one trial kind must be selected".to_string(),
            ));
        }
        Ok(plan)
    }
}

/// Rejects negative workload values up front; the trial code itself works
/// in unsigned arithmetic.
fn parse_non_negative(
    matches: &ArgMatches,
    name: &str,
    what: &str,
) -> Result<Option<u64>, HarnessError> {
    let Some(raw) = matches.get_one::<String>(name) else {
        return Ok(None);
    };
    let value: i64 = raw.parse().map_err(|_| {
        HarnessError::Configuration(format!("{what} must be an integer, got {raw:?}"))
    })?;
    if value < 0 {
        return Err(HarnessError::Configuration(format!(
            "{what} must not be negative, got {value}"
        )));
    }
    Ok(Some(value as u64))
}
