//! Command-line help text for options.
//!
//! An option may carry a handlebars template naming its own fields, e.g.
//! `"Use {{variable_name}} to pick the port"`. Options without one get a
//! generic sentence built from the long description.

use handlebars::Handlebars;
use serde::Serialize;

use super::ConfigOption;

/// Fields a help template may reference.
#[derive(Debug, Serialize)]
struct HelpContext<'a> {
    variable_name: &'a str,
    option_name: Option<&'a str>,
    description: &'a str,
    long_description: &'a str,
    default: String,
}

/// Help text for `option`, ending with its default.
#[must_use]
pub fn render(option: &dyn ConfigOption) -> String {
    let meta = option.meta();
    let context = HelpContext {
        variable_name: &meta.variable_name,
        option_name: meta.option_name.as_deref(),
        description: &meta.description,
        long_description: &meta.long_description,
        default: option.human_default(),
    };
    let generic = || {
        format!(
            "Use {} for {}",
            context.variable_name, context.long_description
        )
    };

    let body = match meta.help.as_deref() {
        Some(template) => {
            let mut engine = Handlebars::new();
            engine.register_escape_fn(handlebars::no_escape);
            engine
                .render_template(template, &context)
                .unwrap_or_else(|e| {
                    tracing::warn!("Bad help template for {}: {e}", meta.variable_name);
                    generic()
                })
        }
        None => generic(),
    };
    format!("{body} [Default: {}]", context.default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CoresOption, OptionMeta, TextOption};

    #[test]
    fn generic_text_without_template() {
        let option = TextOption::new(OptionMeta::new("MAX_REDO", "Redo"), "1024");

        assert_eq!(render(&option), "Use MAX_REDO for DBNode Redo [Default: 1024]");
    }

    #[test]
    fn template_fields_are_substituted() {
        let option = TextOption::new(
            OptionMeta::new("LISTEN_ADDR", "Listen Address")
                .flag("listen-addr")
                .help("Use --{{option_name}} ({{variable_name}}) for the {{description}}"),
            "0.0.0.0",
        );

        assert_eq!(
            render(&option),
            "Use --listen-addr (LISTEN_ADDR) for the Listen Address [Default: 0.0.0.0]"
        );
    }

    #[test]
    fn default_is_human_readable() {
        let option = CoresOption::new(
            OptionMeta::new("CPU_CORES", "CPU cores").help("Limit {{long_description}}"),
        );

        assert_eq!(render(&option), "Limit DBNode CPU cores [Default: All]");
    }

    #[test]
    fn markup_is_not_escaped() {
        let option = TextOption::new(
            OptionMeta::new("UI_LOGDIR", "WebUI Logs").help("Logs go to <{{default}}> & co"),
            "/var/log",
        );

        assert_eq!(render(&option), "Logs go to </var/log> & co [Default: /var/log]");
    }

    #[test]
    fn broken_template_falls_back_to_generic_text() {
        let option = TextOption::new(
            OptionMeta::new("MAX_REDO", "Redo").help("Use {{#if}}"),
            "1024",
        );

        assert_eq!(render(&option), "Use MAX_REDO for DBNode Redo [Default: 1024]");
    }
}
