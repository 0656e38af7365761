//! Yes/no options.
//!
//! In a config file only the presence of a boolean key matters: any value
//! means "changed from default". On the command line a boolean is a flag
//! without an argument that does the same.

use super::{
    ConfigOption, Env, FlagStyle, OptionMeta, PromptError, References, Status, ValueError, Verdict,
};

fn english(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

fn file_literal(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn ask(
    meta: &OptionMeta,
    default: bool,
    env: &mut Env<'_>,
) -> Result<bool, PromptError> {
    env.prompter
        .confirm(&format!("{}?", meta.long_description), default)
}

/// A plain yes/no option.
#[derive(Debug, Clone)]
pub struct BooleanOption {
    meta: OptionMeta,
    status: Status,
    default: bool,
    value: bool,
}

impl BooleanOption {
    /// Creates the option at `default`.
    #[must_use]
    pub fn new(meta: OptionMeta, default: bool) -> Self {
        Self {
            meta,
            status: Status::default(),
            default,
            value: default,
        }
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> bool {
        self.value
    }
}

impl ConfigOption for BooleanOption {
    fn meta(&self) -> &OptionMeta {
        &self.meta
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn set_value(&mut self, _raw: &str, _env: &mut Env<'_>) -> Result<(), ValueError> {
        self.toggle();
        Ok(())
    }

    fn reset_to_default(&mut self) {
        self.value = self.default;
    }

    fn is_default(&self) -> bool {
        self.value == self.default
    }

    fn value_string(&self) -> String {
        file_literal(self.value)
    }

    fn default_string(&self) -> String {
        file_literal(self.default)
    }

    fn human_value(&self) -> String {
        english(self.value)
    }

    fn human_default(&self) -> String {
        english(self.default)
    }

    fn flag_style(&self) -> FlagStyle {
        FlagStyle::Toggle
    }

    fn toggle(&mut self) {
        self.value = !self.default;
        self.status.mark_set();
    }

    fn prompt_text(&self, _env: &mut Env<'_>, _refs: &References) -> String {
        format!("{}?", self.meta.long_description)
    }

    fn prompt(&mut self, env: &mut Env<'_>, _refs: &References) -> Result<(), PromptError> {
        self.value = ask(&self.meta, self.default, env)?;
        self.status.mark_set();
        Ok(())
    }

    fn mkarg(&self, _omit_defaults: bool, _loaded_from_file: bool) -> Option<String> {
        let flag = self.meta.option_name.as_deref()?;
        (self.value != self.default).then(|| format!("--{flag}"))
    }
}

/// Huge page allocation switch.
///
/// Unlike [`BooleanOption`], a key present in the config file always means
/// enabled, and the option counts as default whenever it is disabled. The
/// default comes from hypervisor detection; enabling it against a disabled
/// default asks for confirmation unless `--yes` was given.
#[derive(Debug, Clone)]
pub struct HugeTlbOption {
    meta: OptionMeta,
    status: Status,
    default: bool,
    value: bool,
}

impl HugeTlbOption {
    /// Creates the option with the platform-derived default.
    #[must_use]
    pub fn new(meta: OptionMeta, default: bool) -> Self {
        Self {
            meta,
            status: Status::default(),
            default,
            value: default,
        }
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> bool {
        self.value
    }
}

impl ConfigOption for HugeTlbOption {
    fn meta(&self) -> &OptionMeta {
        &self.meta
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn set_value(&mut self, _raw: &str, _env: &mut Env<'_>) -> Result<(), ValueError> {
        self.value = true;
        self.status.mark_set();
        Ok(())
    }

    fn reset_to_default(&mut self) {
        self.value = self.default;
    }

    fn is_default(&self) -> bool {
        !self.value
    }

    fn value_string(&self) -> String {
        file_literal(self.value)
    }

    fn default_string(&self) -> String {
        file_literal(self.default)
    }

    fn human_value(&self) -> String {
        english(self.value)
    }

    fn human_default(&self) -> String {
        english(self.default)
    }

    fn check(&mut self, env: &mut Env<'_>, _refs: &References) -> Verdict {
        if !env.mode.yes && !self.default && self.value {
            let question = "Enabling HugeTLB on this system is not recommended, as it may \
                            cause instability. Please confirm that you want to run an \
                            unstable configuration";
            self.value = env.prompter.confirm(question, false).unwrap_or_else(|e| {
                tracing::debug!("No HugeTLB confirmation: {e}");
                false
            });
        }
        Verdict::Accepted
    }

    fn flag_style(&self) -> FlagStyle {
        FlagStyle::Toggle
    }

    fn toggle(&mut self) {
        self.value = !self.default;
        self.status.mark_set();
    }

    fn prompt_text(&self, _env: &mut Env<'_>, _refs: &References) -> String {
        format!("{}?", self.meta.long_description)
    }

    fn prompt(&mut self, env: &mut Env<'_>, _refs: &References) -> Result<(), PromptError> {
        self.value = ask(&self.meta, self.default, env)?;
        self.status.mark_set();
        Ok(())
    }

    fn mkarg(&self, _omit_defaults: bool, loaded_from_file: bool) -> Option<String> {
        let flag = self.meta.option_name.as_deref()?;
        let missing_from_file = loaded_from_file && !self.status.is_set && self.default;
        let changed = self.status.is_set && self.value != self.default;
        (missing_from_file || changed).then(|| format!("--{flag}"))
    }
}
