//! Tests for the option registry.

use super::*;
use crate::options::fixture::{FORCE, Host};
use crate::options::{
    MemoryBudget, MemoryOption, OptionMeta, PortOption, PortSpec, TextOption, assign,
};
use crate::system::Protocol;
use crate::system::mock::FakePorts;

fn redo() -> Box<dyn ConfigOption> {
    Box::new(TextOption::new(OptionMeta::new("MAX_REDO", "Redo"), "1024"))
}

fn memory(total: u64) -> Box<dyn ConfigOption> {
    Box::new(MemoryOption::new(
        OptionMeta::new("NODE_MEMORY", "Memory").flag("node-mem"),
        MemoryBudget::new(total),
    ))
}

fn mysql() -> Box<dyn ConfigOption> {
    Box::new(PortOption::new(
        OptionMeta::new("MYSQL_PORT", "Database MySQL").flag("mysql-port"),
        3306,
        PortSpec::tcp(),
    ))
}

fn registry(options: Vec<Box<dyn ConfigOption>>) -> OptionRegistry {
    let mut registry = OptionRegistry::new();
    for option in options {
        registry.register(option).unwrap();
    }
    registry
}

mod registration {
    use super::*;

    #[test]
    fn keeps_declaration_order() {
        let registry = registry(vec![memory(8192), redo(), mysql()]);

        let names: Vec<_> = registry
            .iter()
            .map(|option| option.meta().variable_name.as_str())
            .collect();

        assert_eq!(names, ["NODE_MEMORY", "MAX_REDO", "MYSQL_PORT"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_variable_is_refused() {
        let mut registry = registry(vec![redo()]);

        let err = registry.register(redo()).unwrap_err();

        assert_eq!(
            err,
            RegistryError::Duplicate {
                variable: "MAX_REDO".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_flag_is_refused() {
        let mut registry = registry(vec![mysql()]);
        let clash = Box::new(PortOption::new(
            OptionMeta::new("OTHER_PORT", "Other").flag("mysql-port"),
            1,
            PortSpec::tcp(),
        ));

        let err = registry.register(clash).unwrap_err();

        assert!(matches!(err, RegistryError::DuplicateFlag { ref flag } if flag == "mysql-port"));
    }

    #[test]
    fn lookup_by_variable_and_flag() {
        let mut registry = registry(vec![redo(), mysql()]);

        assert!(registry.get("MYSQL_PORT").is_some());
        assert!(registry.get("NOPE").is_none());
        assert_eq!(
            registry.by_flag("mysql-port").map(|o| o.meta().variable_name.clone()),
            Some("MYSQL_PORT".to_string())
        );
        assert!(registry.get_mut("MAX_REDO").is_some());
    }
}

mod checking {
    use super::*;

    #[test]
    fn all_accepted_marks_checked() {
        let mut host = Host::new(&[]);
        let mut registry = registry(vec![memory(8192), redo(), mysql()]);

        registry.check_all(&mut host.env()).unwrap();

        assert!(
            registry
                .iter()
                .all(|option| option.status().state == OptionState::Checked)
        );
    }

    #[test]
    fn rejection_reprompts_until_accepted() {
        let mut host = Host::new(&["9000", "4096"]);
        let mut registry = registry(vec![memory(8192)]);
        {
            let mut env = host.env();
            assign(registry.get_mut("NODE_MEMORY").unwrap(), "100", &mut env);
        }

        registry.check_all(&mut host.env()).unwrap();

        assert_eq!(registry.get("NODE_MEMORY").unwrap().value_string(), "4096");
        assert_eq!(host.prompter.remaining(), 0);
        assert_eq!(host.prompter.messages.len(), 2);
        assert!(host.prompter.messages[0].starts_with("Error: "));
    }

    #[test]
    fn unparsable_assignment_is_caught_by_check() {
        let mut host = Host::new(&["3307"]);
        let mut registry = registry(vec![mysql()]);
        {
            let mut env = host.env();
            assign(registry.get_mut("MYSQL_PORT").unwrap(), "mysql", &mut env);
        }
        assert!(registry.get("MYSQL_PORT").unwrap().status().invalid.is_some());

        registry.check_all(&mut host.env()).unwrap();

        let option = registry.get("MYSQL_PORT").unwrap();
        assert_eq!(option.value_string(), "3307");
        assert_eq!(option.status().invalid, None);
        assert!(host.prompter.saw("'mysql' is not a valid TCP port number"));
    }

    #[test]
    fn unparsable_assignment_falls_back_to_default_under_force() {
        let mut host = Host::new(&[]).with_mode(FORCE);
        let mut registry = registry(vec![mysql()]);
        {
            let mut env = host.env();
            let option = registry.get_mut("MYSQL_PORT").unwrap();
            assign(option, "8080", &mut env);
            assign(option, "mysql", &mut env);
        }

        registry.check_all(&mut host.env()).unwrap();

        let option = registry.get("MYSQL_PORT").unwrap();
        assert_eq!(option.value_string(), "3306");
        assert_eq!(option.status().state, OptionState::Checked);
    }

    #[test]
    fn rejection_is_kept_under_force() {
        let mut host = Host::new(&[]).with_mode(FORCE);
        host.ports = FakePorts::busy(&[(Protocol::Tcp, 3306)]);
        let mut registry = registry(vec![mysql()]);

        registry.check_all(&mut host.env()).unwrap();

        assert_eq!(registry.get("MYSQL_PORT").unwrap().value_string(), "3306");
        assert!(host.prompter.prompts.is_empty());
    }

    #[test]
    fn fatal_stops_the_pass() {
        let mut host = Host::new(&[]);
        let mut registry = registry(vec![memory(3000), redo()]);

        let err = registry.check_all(&mut host.env()).unwrap_err();

        assert!(matches!(err, CheckError::Fatal { ref variable, .. } if variable == "NODE_MEMORY"));
        assert_eq!(
            registry.get("NODE_MEMORY").unwrap().status().state,
            OptionState::Fatal
        );
        assert_eq!(
            registry.get("MAX_REDO").unwrap().status().state,
            OptionState::Default
        );
    }

    #[test]
    fn closed_input_during_reprompt_is_an_error() {
        let mut host = Host::new(&[]);
        host.ports = FakePorts::busy(&[(Protocol::Tcp, 3306)]);
        let mut registry = registry(vec![mysql()]);

        let err = registry.check_all(&mut host.env()).unwrap_err();

        assert!(matches!(
            err,
            CheckError::Prompt {
                source: PromptError::Closed,
                ..
            }
        ));
    }
}

mod wizard {
    use super::*;

    #[test]
    fn prompts_only_user_settable_options() {
        let mut host = Host::new(&["4096", ""]);
        let mut registry = registry(vec![memory(8192), redo(), mysql()]);

        registry.prompt_all(&mut host.env()).unwrap();

        assert_eq!(host.prompter.prompts.len(), 2);
        assert_eq!(registry.get("NODE_MEMORY").unwrap().value_string(), "4096");
        assert!(registry.get("MYSQL_PORT").unwrap().is_default());
        assert!(!registry.get("MAX_REDO").unwrap().status().is_set);
    }
}

mod join_args {
    use super::*;

    #[test]
    fn omits_defaults_when_asked() {
        let mut host = Host::new(&[]);
        let mut registry = registry(vec![memory(8192), redo(), mysql()]);
        {
            let mut env = host.env();
            assign(registry.get_mut("MYSQL_PORT").unwrap(), "3307", &mut env);
        }

        assert_eq!(registry.join_args(true, false), ["--mysql-port=3307"]);
        assert_eq!(
            registry.join_args(false, false),
            ["--node-mem=6144", "--mysql-port=3307"]
        );
    }
}

#[test]
fn references_collect_published_values() {
    use crate::network::{Address, Interface};
    use crate::options::InterfaceOption;

    let listen: Box<dyn ConfigOption> = Box::new(InterfaceOption::new(
        OptionMeta::new("LISTEN_ADDR", "Listen Address"),
        Interface::wildcard(),
        false,
    ));
    let registry = registry(vec![listen]);

    assert_eq!(
        registry.references().interface("LISTEN_ADDR"),
        Some(Address::WILDCARD)
    );
}
