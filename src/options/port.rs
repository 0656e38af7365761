//! TCP/UDP port options.

use super::{ConfigOption, Env, OptionMeta, References, Status, ValueError, Verdict};
use crate::network::Address;
use crate::system::Protocol;

/// What a port is used for and how it may be validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    /// Protocols that must all be bindable.
    pub protocols: Vec<Protocol>,
    /// Variable name of the interface option the port listens on; the
    /// wildcard when `None` or unknown.
    pub interface: Option<String>,
    /// False for ports the node always uses; a busy fixed port is fatal.
    pub configurable: bool,
}

impl PortSpec {
    /// A configurable TCP port on all interfaces.
    #[must_use]
    pub fn tcp() -> Self {
        Self {
            protocols: vec![Protocol::Tcp],
            interface: None,
            configurable: true,
        }
    }

    /// A configurable port needing both TCP and UDP.
    #[must_use]
    pub fn tcp_udp() -> Self {
        Self {
            protocols: vec![Protocol::Tcp, Protocol::Udp],
            ..Self::tcp()
        }
    }

    /// Listens on the address of interface option `variable`.
    #[must_use]
    pub fn bound_to(mut self, variable: &str) -> Self {
        self.interface = Some(variable.to_string());
        self
    }

    /// Marks the port fixed.
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.configurable = false;
        self
    }

    fn protocol_text(&self) -> String {
        self.protocols
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// A port number that must be free on the host.
#[derive(Debug, Clone)]
pub struct PortOption {
    meta: OptionMeta,
    status: Status,
    spec: PortSpec,
    default: i64,
    value: i64,
}

impl PortOption {
    /// Creates the option at `default`.
    #[must_use]
    pub fn new(mut meta: OptionMeta, default: u16, spec: PortSpec) -> Self {
        meta.description = format!("{} {} Port", meta.description, spec.protocol_text());
        meta.long_description = format!("{} Port", meta.long_description);
        Self {
            meta,
            status: Status::default(),
            spec,
            default: i64::from(default),
            value: i64::from(default),
        }
    }

    /// Current port number, possibly out of range.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }

    fn display(port: i64) -> String {
        if port == 0 {
            "Not set".to_string()
        } else {
            port.to_string()
        }
    }
}

impl ConfigOption for PortOption {
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
        self.value = raw.trim().parse().map_err(|_| {
            ValueError::invalid(raw, format!("{} port number", self.spec.protocol_text()))
        })?;
        self.status.mark_set();
        Ok(())
    }

    fn reset_to_default(&mut self) {
        self.value = self.default;
    }

    fn is_default(&self) -> bool {
        self.value == self.default
    }

    fn value_string(&self) -> String {
        self.value.to_string()
    }

    fn default_string(&self) -> String {
        self.default.to_string()
    }

    fn human_value(&self) -> String {
        Self::display(self.value)
    }

    fn human_default(&self) -> String {
        Self::display(self.default)
    }

    fn check(&mut self, env: &mut Env<'_>, refs: &References) -> Verdict {
        let protocols = self.spec.protocol_text();
        let Some(port) = u16::try_from(self.value).ok().filter(|p| *p != 0) else {
            let reason = format!("{} is not a valid {protocols} port number.", self.value);
            if !env.mode.force && self.spec.configurable {
                return Verdict::Reject(reason);
            }
            tracing::warn!(
                "{reason} Config using port {} for {} is invalid.",
                self.value,
                self.meta.long_description
            );
            return Verdict::Accepted;
        };

        let address = self
            .spec
            .interface
            .as_deref()
            .and_then(|variable| refs.interface(variable))
            .unwrap_or(Address::WILDCARD);

        for &protocol in &self.spec.protocols {
            let Err(e) = env.ports.try_bind(protocol, address, port) else {
                continue;
            };
            let reason = format!(
                "Unable to bind to {protocol} port {port} on {address} for {}: {e}",
                self.meta.description
            );
            if env.mode.force {
                tracing::warn!("{reason}");
                continue;
            }
            if self.spec.configurable {
                return Verdict::Reject(reason);
            }
            return Verdict::Fatal(format!(
                "{reason}. Disable the service using {protocol} port {port} \
                 and re-run to continue."
            ));
        }
        tracing::debug!("{}: port {port} available on {address}", self.meta.variable_name);
        Verdict::Accepted
    }

    fn prompt_text(&self, _env: &mut Env<'_>, _refs: &References) -> String {
        format!(
            "Please enter a {} port for {} [Default: {}]: ",
            self.spec.protocol_text(),
            self.meta.long_description,
            self.default
        )
    }
}
