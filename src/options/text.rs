//! Free-form string option.

use super::{ConfigOption, Env, OptionMeta, Status, ValueError};

/// Option whose value is stored verbatim.
#[derive(Debug, Clone)]
pub struct TextOption {
    meta: OptionMeta,
    status: Status,
    default: String,
    value: String,
}

impl TextOption {
    /// Creates the option at `default`.
    #[must_use]
    pub fn new(meta: OptionMeta, default: &str) -> Self {
        Self {
            meta,
            status: Status::default(),
            default: default.to_string(),
            value: default.to_string(),
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl ConfigOption for TextOption {
    fn meta(&self) -> &OptionMeta {
        &self.meta
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn set_value(&mut self, raw: &str, _env: &mut Env<'_>) -> Result<(), ValueError> {
        raw.clone_into(&mut self.value);
        self.status.mark_set();
        Ok(())
    }

    fn reset_to_default(&mut self) {
        self.value.clone_from(&self.default);
    }

    fn is_default(&self) -> bool {
        self.value == self.default
    }

    fn value_string(&self) -> String {
        self.value.clone()
    }

    fn default_string(&self) -> String {
        self.default.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::fixture::Host;

    #[test]
    fn stores_value_verbatim() {
        let mut host = Host::new(&[]);
        let mut option = TextOption::new(OptionMeta::new("MAX_REDO", "Redo"), "1024");

        option.set_value("2048", &mut host.env()).unwrap();

        assert_eq!(option.value(), "2048");
        assert!(!option.is_default());
        assert!(option.status().is_set);
    }

    #[test]
    fn empty_prompt_answer_restores_default() {
        let mut host = Host::new(&[""]);
        let mut option = TextOption::new(OptionMeta::new("MAX_REDO", "Redo"), "1024");
        option.set_value("9", &mut host.env()).unwrap();

        option
            .prompt(&mut host.env(), &crate::options::References::default())
            .unwrap();

        assert!(option.is_default());
        assert_eq!(
            host.prompter.prompts,
            ["Please enter choice for DBNode Redo [Default: 1024]: "]
        );
    }

    #[test]
    fn mkarg_skips_options_without_flag() {
        let option = TextOption::new(OptionMeta::new("MAX_REDO", "Redo"), "1024");
        assert_eq!(option.mkarg(false, false), None);
    }

    #[test]
    fn mkarg_uses_placeholder_for_per_node_values() {
        let mut host = Host::new(&[]);
        let meta = OptionMeta::new("NODE_NAME", "Name").flag("node-name").per_node();
        let mut option = TextOption::new(meta, "a");
        option.set_value("b", &mut host.env()).unwrap();

        assert_eq!(option.mkarg(true, false).as_deref(), Some("--node-name=<NODE_NAME>"));
    }

    #[test]
    fn mkarg_omits_defaults_on_request() {
        let option = TextOption::new(OptionMeta::new("X", "X").flag("x"), "1");
        assert_eq!(option.mkarg(true, false), None);
        assert_eq!(option.mkarg(false, false).as_deref(), Some("--x=1"));
    }
}
