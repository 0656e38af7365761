//! Ordered option registry and the check/re-prompt loop.

use thiserror::Error;

use super::{ConfigOption, Env, OptionState, PromptError, References, Verdict};

/// Error registering an option.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Another option already uses this config file key.
    #[error("Option variable {variable} registered twice")]
    Duplicate {
        /// Config file key
        variable: String,
    },

    /// Another option already uses this command-line flag.
    #[error("Command-line flag --{flag} registered twice")]
    DuplicateFlag {
        /// Flag name without dashes
        flag: String,
    },
}

/// Error ending a check or wizard pass.
#[derive(Debug, Error)]
pub enum CheckError {
    /// An option cannot reach a usable value.
    #[error("{variable}: {reason}")]
    Fatal {
        /// Config file key of the failing option
        variable: String,
        /// Explanation shown to the user
        reason: String,
    },

    /// Input ended while asking for a value.
    #[error("No value entered for {variable}")]
    Prompt {
        /// Config file key of the option being asked for
        variable: String,
        /// Underlying input failure
        #[source]
        source: PromptError,
    },
}

/// Options in declaration order.
///
/// The order is the order of the config file sections and of the wizard.
#[derive(Debug, Default)]
pub struct OptionRegistry {
    options: Vec<Box<dyn ConfigOption>>,
}

impl OptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `option`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if its variable or flag name is taken.
    pub fn register(&mut self, option: Box<dyn ConfigOption>) -> Result<(), RegistryError> {
        let meta = option.meta();
        if self.get(&meta.variable_name).is_some() {
            return Err(RegistryError::Duplicate {
                variable: meta.variable_name.clone(),
            });
        }
        if let Some(flag) = meta
            .option_name
            .as_deref()
            .filter(|flag| self.by_flag(flag).is_some())
        {
            return Err(RegistryError::DuplicateFlag {
                flag: flag.to_string(),
            });
        }
        self.options.push(option);
        Ok(())
    }

    /// Option stored under config key `variable`.
    #[must_use]
    pub fn get(&self, variable: &str) -> Option<&dyn ConfigOption> {
        self.options
            .iter()
            .find(|option| option.meta().variable_name == variable)
            .map(|option| &**option)
    }

    /// Mutable option stored under config key `variable`.
    pub fn get_mut(&mut self, variable: &str) -> Option<&mut dyn ConfigOption> {
        self.options
            .iter_mut()
            .find(|option| option.meta().variable_name == variable)
            .map(|option| &mut **option as &mut dyn ConfigOption)
    }

    /// Option exposed as `--flag`.
    #[must_use]
    pub fn by_flag(&self, flag: &str) -> Option<&dyn ConfigOption> {
        self.options
            .iter()
            .find(|option| option.meta().option_name.as_deref() == Some(flag))
            .map(|option| &**option)
    }

    /// Options in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ConfigOption> + '_ {
        self.options.iter().map(|option| &**option)
    }

    /// Number of registered options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Snapshot of what every option publishes for the others.
    #[must_use]
    pub fn references(&self) -> References {
        let mut refs = References::default();
        for option in &self.options {
            option.publish(&mut refs);
        }
        refs
    }

    /// Asks for every user-settable option once, in order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Prompt`] when input ends.
    pub fn prompt_all(&mut self, env: &mut Env<'_>) -> Result<(), CheckError> {
        for index in 0..self.options.len() {
            if self.options[index].meta().option_name.is_none() {
                continue;
            }
            let refs = self.references();
            let option = &mut self.options[index];
            option
                .prompt(env, &refs)
                .map_err(|source| CheckError::Prompt {
                    variable: option.meta().variable_name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Validates every option in order, re-prompting on rejection.
    ///
    /// Under force mode rejections are logged and the value kept, or reset
    /// to the default if it never parsed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Fatal`] on the first unrecoverable option, or
    /// [`CheckError::Prompt`] when input ends during a re-prompt.
    pub fn check_all(&mut self, env: &mut Env<'_>) -> Result<(), CheckError> {
        for index in 0..self.options.len() {
            self.check_at(index, env)?;
        }
        Ok(())
    }

    fn check_at(&mut self, index: usize, env: &mut Env<'_>) -> Result<(), CheckError> {
        loop {
            let refs = self.references();
            let option = &mut self.options[index];
            let variable = option.meta().variable_name.clone();

            let verdict = match option.status().invalid.clone() {
                Some(reason) => Verdict::Reject(reason),
                None => option.check(env, &refs),
            };

            match verdict {
                Verdict::Accepted => {
                    tracing::debug!("{variable}: accepted {}", option.human_value());
                    option.status_mut().state = OptionState::Checked;
                    return Ok(());
                }
                Verdict::Fatal(reason) => {
                    option.status_mut().state = OptionState::Fatal;
                    return Err(CheckError::Fatal { variable, reason });
                }
                Verdict::Reject(reason) if env.mode.force => {
                    tracing::warn!("{reason}");
                    if option.status().invalid.is_some() {
                        option.reset_to_default();
                        option.status_mut().invalid = None;
                        tracing::warn!("{variable}: using default {}", option.human_default());
                    }
                    option.status_mut().state = OptionState::Checked;
                    return Ok(());
                }
                Verdict::Reject(reason) => {
                    env.prompter.notify(&format!("Error: {reason}"));
                    let status = option.status_mut();
                    status.state = OptionState::Reprompt;
                    status.invalid = None;
                    option
                        .prompt(env, &refs)
                        .map_err(|source| CheckError::Prompt { variable, source })?;
                }
            }
        }
    }

    /// Flags that reproduce this configuration on another node.
    ///
    /// `omit_defaults` skips options still at their default;
    /// `loaded_from_file` tells options whose emission depends on it that
    /// the values came from an existing config file.
    #[must_use]
    pub fn join_args(&self, omit_defaults: bool, loaded_from_file: bool) -> Vec<String> {
        self.options
            .iter()
            .filter_map(|option| option.mkarg(omit_defaults, loaded_from_file))
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
