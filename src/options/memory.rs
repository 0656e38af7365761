//! Node memory allocation option.

use super::{ConfigOption, Env, OptionMeta, PRODUCT_NAME, References, Status, ValueError, Verdict};

/// Memory left to the operating system, in MiB.
pub const OS_RESERVE_MIB: u64 = 1024;

/// Default redo space, in MiB.
pub const REDO_RESERVE_MIB: u64 = 1024;

/// Smallest allocation the node runs with, in MiB.
pub const NODE_MINIMUM_MIB: u64 = 3 * 1024;

/// How host memory is split between the node and everything else. All MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBudget {
    /// Installed memory.
    pub total: u64,
    /// Kept back for the operating system.
    pub os_reserve: u64,
    /// Kept back for redo space.
    pub redo_reserve: u64,
    /// Smallest node allocation.
    pub node_minimum: u64,
}

impl MemoryBudget {
    /// Budget with the standard reserves.
    #[must_use]
    pub const fn new(total: u64) -> Self {
        Self {
            total,
            os_reserve: OS_RESERVE_MIB,
            redo_reserve: REDO_RESERVE_MIB,
            node_minimum: NODE_MINIMUM_MIB,
        }
    }

    /// Memory never given to the node.
    #[must_use]
    pub const fn reserve(&self) -> u64 {
        self.os_reserve + self.redo_reserve
    }

    /// Installed memory needed to run at all.
    #[must_use]
    pub const fn required(&self) -> u64 {
        self.node_minimum + self.reserve()
    }

    /// Largest node allocation; also the default.
    #[must_use]
    pub const fn ceiling(&self) -> u64 {
        self.total.saturating_sub(self.reserve())
    }

    /// True if the host can run a node.
    #[must_use]
    pub const fn is_sufficient(&self) -> bool {
        self.total >= self.required()
    }
}

/// Memory, in MiB, the node may allocate.
///
/// The default is everything not reserved. A shortfall of installed memory
/// is the one fatal condition that no run mode can recover from.
#[derive(Debug, Clone)]
pub struct MemoryOption {
    meta: OptionMeta,
    status: Status,
    budget: MemoryBudget,
    value: i64,
}

impl MemoryOption {
    /// Creates the option with its default computed from `budget`.
    #[must_use]
    pub fn new(meta: OptionMeta, budget: MemoryBudget) -> Self {
        Self {
            meta,
            status: Status::default(),
            budget,
            value: Self::as_value(budget.ceiling()),
        }
    }

    /// Current allocation in MiB; negative only if set so by the user.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }

    /// The host budget.
    #[must_use]
    pub const fn budget(&self) -> &MemoryBudget {
        &self.budget
    }

    fn as_value(mib: u64) -> i64 {
        i64::try_from(mib).unwrap_or(i64::MAX)
    }

    fn default_value(&self) -> i64 {
        Self::as_value(self.budget.ceiling())
    }
}

impl ConfigOption for MemoryOption {
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
        self.value = raw
            .trim()
            .parse()
            .map_err(|_| ValueError::invalid(raw, "quantity of memory"))?;
        self.status.mark_set();
        Ok(())
    }

    fn reset_to_default(&mut self) {
        self.value = self.default_value();
    }

    fn is_default(&self) -> bool {
        self.value == self.default_value()
    }

    fn value_string(&self) -> String {
        self.value.to_string()
    }

    fn default_string(&self) -> String {
        self.budget.ceiling().to_string()
    }

    fn human_value(&self) -> String {
        format!("{} MiB", self.value)
    }

    fn human_default(&self) -> String {
        format!("{} MiB", self.budget.ceiling())
    }

    fn check(&mut self, env: &mut Env<'_>, _refs: &References) -> Verdict {
        let budget = self.budget;
        if !budget.is_sufficient() {
            return Verdict::Fatal(format!(
                "This system does not have enough memory to run {PRODUCT_NAME} software. \
                 Required minimum memory is {} MiB, system has only {} MiB.",
                budget.required(),
                budget.total
            ));
        }

        let minimum = Self::as_value(budget.node_minimum);
        if self.value < minimum {
            let reason = format!(
                "{} MiB is less than the minimum memory requirement of {minimum} MiB.",
                self.value
            );
            if !env.mode.force {
                return Verdict::Reject(reason);
            }
            tracing::warn!("{reason} Using {minimum} MiB.");
            self.value = minimum;
        }

        let ceiling = self.default_value();
        if self.value > ceiling {
            let reason = format!(
                "System memory ({} MiB) is not sufficient to allocate {} MiB to {PRODUCT_NAME}. \
                 Please enter a new value no greater than {ceiling} MiB.",
                budget.total, self.value
            );
            if !env.mode.force {
                return Verdict::Reject(reason);
            }
            tracing::warn!("{reason} Using {ceiling} MiB.");
            self.value = ceiling;
        }
        Verdict::Accepted
    }
}
