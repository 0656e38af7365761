//! CLI argument parsing using clap.
//!
//! The run-mode flags are derived; every user-settable option adds one more
//! flag at runtime, named after its `option_name`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, CommandFactory, FromArgMatches, Parser};

use super::ConfigError;
use super::defaults;
use crate::options::{FlagStyle, OptionRegistry, RunMode, help};

/// DBNode node configuration
///
/// Collects, validates and persists the settings of one database node,
/// then prints the command that configures the next node the same way.
#[derive(Debug, Parser)]
#[command(name = "dbnode-config")]
#[command(version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are naturally boolean
pub struct Cli {
    /// Walk through every setting interactively
    #[arg(long, short)]
    pub wizard: bool,

    /// Assume yes for confirmations
    #[arg(long, short)]
    pub yes: bool,

    /// Accept best-effort values instead of asking again (implies --yes)
    #[arg(long, short)]
    pub force: bool,

    /// Start from the values in the existing config file
    #[arg(long = "load-config")]
    pub load_config: bool,

    /// Reconfigure an installed node; its service is stopped meanwhile
    /// (implies --load-config)
    #[arg(long)]
    pub reconfigure: bool,

    /// Print the flags that configure another node like this one and exit
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Path to the config file
    #[arg(long = "config-file", value_name = "PATH", default_value = defaults::CONFIG_FILE_PATH)]
    pub config_file: PathBuf,

    /// Service job stopped while reconfiguring
    #[arg(long, value_name = "JOB", default_value = defaults::SERVICE_JOB)]
    pub service: String,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// A per-option flag found on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// Presence-only flag.
    Toggle,
    /// Flag with an argument, not yet parsed.
    Value(String),
}

/// Per-option flag assignment, in registry order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Config file key of the option
    pub variable: String,
    /// What was given
    pub value: FlagValue,
}

/// Parsed command line.
#[derive(Debug)]
pub struct Invocation {
    /// Run-mode flags.
    pub cli: Cli,
    /// Option flags that were given.
    pub assignments: Vec<Assignment>,
    /// Number of arguments after the program name.
    pub arg_count: usize,
}

/// Builds the full command: run-mode flags plus one flag per settable
/// option of `registry`.
///
/// # Errors
///
/// Returns [`ConfigError::FlagClash`] if an option flag reuses a built-in
/// flag name.
pub fn command(registry: &OptionRegistry) -> Result<Command, ConfigError> {
    let mut command = Cli::command();
    for option in registry.iter() {
        let meta = option.meta();
        let Some(flag) = meta.option_name.as_deref() else {
            continue;
        };
        if command.get_arguments().any(|arg| arg.get_long() == Some(flag)) {
            return Err(ConfigError::FlagClash {
                flag: flag.to_string(),
                variable: meta.variable_name.clone(),
            });
        }
        let arg = Arg::new(meta.variable_name.clone())
            .long(flag.to_string())
            .help(help::render(option));
        let arg = match option.flag_style() {
            FlagStyle::Toggle => arg.action(ArgAction::SetTrue),
            FlagStyle::Value => arg
                .action(ArgAction::Set)
                .value_name(meta.variable_name.clone()),
        };
        command = command.arg(arg);
    }
    Ok(command)
}

impl Invocation {
    /// Parses `args` (program name first) against `command`.
    ///
    /// # Errors
    ///
    /// Returns the clap error for unknown flags, missing values, `--help`
    /// and `--version`.
    pub fn parse_from<I, T>(
        command: Command,
        registry: &OptionRegistry,
        args: I,
    ) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let arg_count = args.len().saturating_sub(1);
        let matches = command.try_get_matches_from(args)?;
        let cli = Cli::from_arg_matches(&matches)?;
        Ok(Self {
            cli,
            assignments: assignments(&matches, registry),
            arg_count,
        })
    }

    /// Run mode implied by the flags.
    ///
    /// Without any argument on a terminal, or with `--reconfigure` alone,
    /// the wizard runs.
    #[must_use]
    pub const fn run_mode(&self, stdout_is_terminal: bool) -> RunMode {
        let cli = &self.cli;
        let implicit_wizard = (self.arg_count == 0 && stdout_is_terminal)
            || (self.arg_count == 1 && cli.reconfigure);
        RunMode {
            wizard: cli.wizard || implicit_wizard,
            yes: cli.yes,
            force: cli.force,
            load_config: cli.load_config,
            reconfigure: cli.reconfigure,
            print_config: cli.print_config,
        }
        .normalized()
    }
}

fn assignments(matches: &ArgMatches, registry: &OptionRegistry) -> Vec<Assignment> {
    registry
        .iter()
        .filter(|option| option.meta().option_name.is_some())
        .filter_map(|option| {
            let variable = option.meta().variable_name.clone();
            let value = match option.flag_style() {
                FlagStyle::Toggle => matches.get_flag(&variable).then_some(FlagValue::Toggle),
                FlagStyle::Value => matches
                    .get_one::<String>(&variable)
                    .map(|raw| FlagValue::Value(raw.clone())),
            }?;
            Some(Assignment { variable, value })
        })
        .collect()
}
