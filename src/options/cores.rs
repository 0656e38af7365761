//! CPU core limit option.

use super::{ConfigOption, Env, OptionMeta, Status, ValueError};

/// Number of CPU cores the node may use; 0 means no limit.
#[derive(Debug, Clone)]
pub struct CoresOption {
    meta: OptionMeta,
    status: Status,
    value: u32,
}

impl CoresOption {
    /// Creates the option unrestricted.
    #[must_use]
    pub fn new(meta: OptionMeta) -> Self {
        Self {
            meta,
            status: Status::default(),
            value: 0,
        }
    }

    /// Current limit; 0 is unrestricted.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    fn display(count: u32) -> String {
        if count == 0 {
            "All".to_string()
        } else {
            count.to_string()
        }
    }
}

impl ConfigOption for CoresOption {
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
        let raw = raw.trim();
        self.value = match raw.to_ascii_lowercase().as_str() {
            "all" | "max" | "maximum" => 0,
            other => other
                .parse()
                .map_err(|_| ValueError::invalid(raw, "number of cores"))?,
        };
        self.status.mark_set();
        Ok(())
    }

    fn reset_to_default(&mut self) {
        self.value = 0;
    }

    fn is_default(&self) -> bool {
        self.value == 0
    }

    fn value_string(&self) -> String {
        self.value.to_string()
    }

    fn default_string(&self) -> String {
        "0".to_string()
    }

    fn human_value(&self) -> String {
        Self::display(self.value)
    }

    fn human_default(&self) -> String {
        Self::display(0)
    }
}
