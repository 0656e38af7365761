//! Network interface (listen address) option.

use super::{ConfigOption, Env, OptionMeta, References, Status, ValueError, Verdict};
use crate::network::Interface;

/// An IP address assigned to this host, or the wildcard.
///
/// Input may be an address, an interface name or a subnet in CIDR form;
/// a subnet is narrowed to the single host interface inside it at check
/// time.
#[derive(Debug, Clone)]
pub struct InterfaceOption {
    meta: OptionMeta,
    status: Status,
    requires_address: bool,
    default: Interface,
    value: Interface,
}

impl InterfaceOption {
    /// Creates the option. With `requires_address` the wildcard is refused.
    #[must_use]
    pub fn new(mut meta: OptionMeta, default: Interface, requires_address: bool) -> Self {
        meta.long_description = format!("{} Interface", meta.long_description);
        Self {
            meta,
            status: Status::default(),
            requires_address,
            value: default.clone(),
            default,
        }
    }

    /// Current interface.
    #[must_use]
    pub const fn value(&self) -> &Interface {
        &self.value
    }
}

impl ConfigOption for InterfaceOption {
    fn meta(&self) -> &OptionMeta {
        &self.meta
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn set_value(&mut self, raw: &str, env: &mut Env<'_>) -> Result<(), ValueError> {
        let raw = raw.trim();
        self.value = env
            .resolver
            .resolve(raw)
            .map_err(|source| ValueError::Unresolved {
                value: raw.to_string(),
                source,
            })?;
        self.status.mark_set();
        Ok(())
    }

    fn reset_to_default(&mut self) {
        self.value = self.default.clone();
    }

    fn is_default(&self) -> bool {
        self.value.address == self.default.address
    }

    fn value_string(&self) -> String {
        self.value.address.to_string()
    }

    fn default_string(&self) -> String {
        self.default.address.to_string()
    }

    fn human_value(&self) -> String {
        if self.value.is_wildcard() {
            format!("{} (Listen on all available interfaces)", self.value)
        } else {
            self.value.to_string()
        }
    }

    fn check(&mut self, env: &mut Env<'_>, _refs: &References) -> Verdict {
        if self.value.name.is_none() && self.value.mask.is_some() && !self.value.is_wildcard() {
            match env.resolver.find_interface_in_subnet(&self.value) {
                Ok(Some(found)) => {
                    tracing::debug!(
                        "{}: subnet {} narrowed to {found}",
                        self.meta.variable_name,
                        self.value
                    );
                    self.value = found;
                }
                Ok(None) => {
                    return Verdict::reject(format!(
                        "Unable to find interface in subnet `{}`.",
                        self.value
                    ));
                }
                Err(e) => return Verdict::reject(e.to_string()),
            }
        }

        if !self.value.is_wildcard() && self.value.name.is_none() {
            return Verdict::reject(format!(
                "`{}` is not associated with any available network device. \
                 Please enter a valid address.",
                self.value.address
            ));
        }
        if self.requires_address && self.value.is_wildcard() {
            return Verdict::reject(format!(
                "{} requires an IP which is currently assigned to a network interface.",
                self.meta.description
            ));
        }
        Verdict::Accepted
    }

    fn config_string(&self, _refs: &References) -> String {
        self.value.address.to_string()
    }

    fn publish(&self, refs: &mut References) {
        refs.add_interface(&self.meta.variable_name, self.value.address);
    }

    fn prompt_text(&self, env: &mut Env<'_>, _refs: &References) -> String {
        let available = env
            .resolver
            .available_addresses(!self.requires_address)
            .map_or_else(
                |e| format!("unknown ({e})"),
                |addresses| {
                    addresses
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                },
            );
        format!(
            "Available IP Addresses on this node: {available}\n\
             Please enter an IP address to use for {} [Default: {}]: ",
            self.meta.long_description, self.default.address
        )
    }
}
