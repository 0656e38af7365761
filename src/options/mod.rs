//! Typed configuration options and their validation lifecycle.
//!
//! Every option moves through the same states:
//!
//! ```text
//! Default ──set_value──▶ Set ──check──▶ Checked
//!                         ▲               │
//!                         │            Reject
//!                       prompt            ▼
//!                         └────────── Reprompt
//!                                         │ Fatal
//!                                         ▼
//!                                       Fatal
//! ```
//!
//! [`ConfigOption::check`] never prompts by itself. It returns a
//! [`Verdict`] and the [`OptionRegistry`] decides whether to re-prompt,
//! downgrade to a warning under force mode, or abort.

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::network::{Address, InterfaceResolver, ResolveError};
use crate::system::{DiskProbe, PortProbe};

mod boolean;
pub mod catalog;
mod cores;
pub mod help;
mod interface;
mod memory;
mod path;
mod port;
pub mod prompt;
mod registry;
mod text;

pub use boolean::{BooleanOption, HugeTlbOption};
pub use cores::CoresOption;
pub use interface::InterfaceOption;
pub use memory::{MemoryBudget, MemoryOption};
pub use path::{PathError, PathKind, PathOption, PathRequirements, resolve_path};
pub use port::{PortOption, PortSpec};
pub use prompt::{PromptError, Prompter, StdioPrompter};
pub use registry::{CheckError, OptionRegistry, RegistryError};
pub use text::TextOption;

/// Product name prefixed to option descriptions.
pub const PRODUCT_NAME: &str = "DBNode";

/// Lifecycle position of one option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptionState {
    /// Untouched since construction.
    #[default]
    Default,
    /// A value was assigned from a flag, the file or a prompt.
    Set,
    /// Validated and accepted.
    Checked,
    /// Rejected; waiting for interactive re-entry.
    Reprompt,
    /// Rejected with no possible recovery.
    Fatal,
}

/// Mutable bookkeeping shared by every option kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    /// Current lifecycle state.
    pub state: OptionState,
    /// True once any source assigned a value.
    pub is_set: bool,
    /// Why the last assignment could not be parsed; caught by the next check.
    pub invalid: Option<String>,
}

impl Status {
    /// Records a successful assignment.
    pub fn mark_set(&mut self) {
        self.state = OptionState::Set;
        self.is_set = true;
        self.invalid = None;
    }

    /// Records an assignment that could not be parsed.
    pub fn mark_invalid(&mut self, reason: impl Into<String>) {
        self.state = OptionState::Set;
        self.invalid = Some(reason.into());
    }
}

/// Result of validating one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Safe to persist.
    Accepted,
    /// Recoverable: re-prompt, or warn and continue under force mode.
    Reject(String),
    /// Unrecoverable: abort the run.
    Fatal(String),
}

impl Verdict {
    /// Shorthand for a rejection.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject(reason.into())
    }
}

/// How an option is exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagStyle {
    /// Presence toggles the value away from its default.
    Toggle,
    /// Takes a string argument passed to [`ConfigOption::set_value`].
    Value,
}

/// Error parsing a raw value into an option's type.
#[derive(Debug, Error)]
pub enum ValueError {
    /// The text does not parse as the expected kind of value.
    #[error("'{value}' is not a valid {expected}")]
    Invalid {
        /// Offending text
        value: String,
        /// What was expected, e.g. "TCP port number"
        expected: String,
    },

    /// The text could not be resolved to a host interface.
    #[error("'{value}' could not be resolved: {source}")]
    Unresolved {
        /// Offending text
        value: String,
        /// Resolver failure
        #[source]
        source: ResolveError,
    },
}

impl ValueError {
    pub(crate) fn invalid(value: &str, expected: impl Into<String>) -> Self {
        Self::Invalid {
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Which of the flags that shape a run are in effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunMode {
    /// Walk every settable option interactively before checking.
    pub wizard: bool,
    /// Assume "yes" for confirmations.
    pub yes: bool,
    /// Accept best-effort values instead of re-prompting.
    pub force: bool,
    /// Populate options from the existing config file.
    pub load_config: bool,
    /// Reconfigure an installed node; the service is stopped meanwhile.
    pub reconfigure: bool,
    /// Print the join arguments and exit.
    pub print_config: bool,
}

impl RunMode {
    /// Applies the implications between flags: force ⇒ yes and
    /// reconfigure ⇒ load-config.
    #[must_use]
    pub const fn normalized(mut self) -> Self {
        if self.force {
            self.yes = true;
        }
        if self.reconfigure {
            self.load_config = true;
        }
        self
    }
}

/// Everything an option may consult while being set, checked or prompted.
///
/// Owned by the driver; options only borrow it for one operation.
pub struct Env<'a> {
    /// Active run mode.
    pub mode: RunMode,
    /// Where questions and diagnostics go.
    pub prompter: &'a mut dyn Prompter,
    /// Interface and route cache.
    pub resolver: &'a mut InterfaceResolver,
    /// Socket availability.
    pub ports: &'a dyn PortProbe,
    /// Filesystem statistics.
    pub disks: &'a dyn DiskProbe,
}

impl fmt::Debug for Env<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("mode", &self.mode)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

/// Snapshot of the values options refer to by variable name.
///
/// Rebuilt by the registry before each check so that a path can expand
/// `$DATA_PATH` or a port can find the address of its interface option
/// without holding a borrow on another option.
#[derive(Debug, Clone, Default)]
pub struct References {
    paths: HashMap<String, String>,
    created_dirs: HashSet<String>,
    interfaces: HashMap<String, Address>,
}

impl References {
    /// Publishes a path option's raw value.
    pub fn add_path(&mut self, variable: &str, raw: &str, created_dir: bool) {
        self.paths.insert(variable.to_string(), raw.to_string());
        if created_dir {
            self.created_dirs.insert(variable.to_string());
        }
    }

    /// Raw value of the path option `variable`.
    #[must_use]
    pub fn path(&self, variable: &str) -> Option<&str> {
        self.paths.get(variable).map(String::as_str)
    }

    /// True if the user already approved creating `variable`'s directory.
    #[must_use]
    pub fn created_dir(&self, variable: &str) -> bool {
        self.created_dirs.contains(variable)
    }

    /// Publishes an interface option's address.
    pub fn add_interface(&mut self, variable: &str, address: Address) {
        self.interfaces.insert(variable.to_string(), address);
    }

    /// Address of the interface option `variable`.
    #[must_use]
    pub fn interface(&self, variable: &str) -> Option<Address> {
        self.interfaces.get(variable).copied()
    }
}

/// Identity and presentation of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMeta {
    /// Key in the config file; unique within a registry.
    pub variable_name: String,
    /// Short human description.
    pub description: String,
    /// Description used in prompts and file comments.
    pub long_description: String,
    /// Command-line flag name; `None` means not user-settable.
    pub option_name: Option<String>,
    /// Host-specific; never copied literally into join arguments.
    pub per_node: bool,
    /// Handlebars help template, see [`help`].
    pub help: Option<String>,
}

impl OptionMeta {
    /// Creates metadata for `variable_name` with the product-prefixed long
    /// description.
    #[must_use]
    pub fn new(variable_name: &str, description: &str) -> Self {
        let long_description = if description.contains(PRODUCT_NAME) {
            description.to_string()
        } else {
            format!("{PRODUCT_NAME} {description}")
        };
        Self {
            variable_name: variable_name.to_string(),
            description: description.to_string(),
            long_description,
            option_name: None,
            per_node: false,
            help: None,
        }
    }

    /// Exposes the option as `--name`.
    #[must_use]
    pub fn flag(mut self, name: &str) -> Self {
        self.option_name = Some(name.to_string());
        self
    }

    /// Marks the option host-specific.
    #[must_use]
    pub const fn per_node(mut self) -> Self {
        self.per_node = true;
        self
    }

    /// Sets the help template.
    #[must_use]
    pub fn help(mut self, template: &str) -> Self {
        self.help = Some(template.to_string());
        self
    }

    /// Appends `suffix` to both descriptions.
    pub(crate) fn suffix(&mut self, suffix: &str) {
        self.description = format!("{} {suffix}", self.description);
        self.long_description = format!("{} {suffix}", self.long_description);
    }
}

/// One named, typed, validated configuration value.
///
/// Kinds override what differs; everything else falls back to the
/// provided methods.
pub trait ConfigOption: fmt::Debug {
    /// Identity and presentation.
    fn meta(&self) -> &OptionMeta;

    /// Lifecycle bookkeeping.
    fn status(&self) -> &Status;

    /// Mutable lifecycle bookkeeping.
    fn status_mut(&mut self) -> &mut Status;

    /// Parses and stores `raw`, marking the option set.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`] when `raw` cannot be coerced; the stored
    /// value is left unchanged.
    fn set_value(&mut self, raw: &str, env: &mut Env<'_>) -> Result<(), ValueError>;

    /// Restores the default value.
    fn reset_to_default(&mut self);

    /// True while the value equals the default.
    fn is_default(&self) -> bool;

    /// Current value as a flag argument.
    fn value_string(&self) -> String;

    /// Default value as text.
    fn default_string(&self) -> String;

    /// Current value for display.
    fn human_value(&self) -> String {
        self.value_string()
    }

    /// Default value for display.
    fn human_default(&self) -> String {
        self.default_string()
    }

    /// Validates the current value.
    fn check(&mut self, _env: &mut Env<'_>, _refs: &References) -> Verdict {
        Verdict::Accepted
    }

    /// Value as written to the config file.
    fn config_string(&self, _refs: &References) -> String {
        self.value_string()
    }

    /// Command-line exposure.
    fn flag_style(&self) -> FlagStyle {
        FlagStyle::Value
    }

    /// Applies a presence-only flag.
    fn toggle(&mut self) {}

    /// Contributes to the cross-option reference snapshot.
    fn publish(&self, _refs: &mut References) {}

    /// Text shown when asking for a new value.
    fn prompt_text(&self, _env: &mut Env<'_>, _refs: &References) -> String {
        format!(
            "Please enter choice for {} [Default: {}]: ",
            self.meta().long_description,
            self.human_default()
        )
    }

    /// Asks for a new value until one parses.
    ///
    /// An empty answer selects the default.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError`] when input is closed or unreadable.
    fn prompt(&mut self, env: &mut Env<'_>, refs: &References) -> Result<(), PromptError> {
        loop {
            let text = self.prompt_text(env, refs);
            let answer = env.prompter.read_line(&text)?;
            let answer = answer.trim();
            if answer.is_empty() {
                self.reset_to_default();
                self.status_mut().mark_set();
                return Ok(());
            }
            match self.set_value(answer, env) {
                Ok(()) => return Ok(()),
                Err(e) => env.prompter.notify(&format!("Error: {e}")),
            }
        }
    }

    /// Flag that reproduces the current value on another host.
    ///
    /// `None` for options without a flag, or at default when
    /// `omit_defaults` is set. Per-node values become a `<VARIABLE>`
    /// placeholder.
    fn mkarg(&self, omit_defaults: bool, _loaded_from_file: bool) -> Option<String> {
        let meta = self.meta();
        let flag = meta.option_name.as_deref()?;
        if omit_defaults && self.is_default() {
            return None;
        }
        if meta.per_node {
            return Some(format!("--{flag}=<{}>", meta.variable_name));
        }
        Some(format!("--{flag}={}", self.value_string()))
    }
}

/// Sets `raw` on `option`, recording a parse failure for the next check.
///
/// Used for values from flags and the config file, where there is nobody
/// to ask again right away.
pub fn assign(option: &mut dyn ConfigOption, raw: &str, env: &mut Env<'_>) {
    if let Err(e) = option.set_value(raw, env) {
        let variable = option.meta().variable_name.clone();
        tracing::debug!("{variable}: rejected assignment: {e}");
        env.prompter.notify(&format!("Error: {e}"));
        option.status_mut().mark_invalid(e.to_string());
    }
}
