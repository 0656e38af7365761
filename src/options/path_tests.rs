//! Tests for path options.

use super::*;
use crate::options::fixture::{FORCE, Host, YES};
use crate::options::RunMode;
use crate::system::mock::FakeDisks;

fn refs(pairs: &[(&str, &str)]) -> References {
    let mut refs = References::default();
    for (name, raw) in pairs {
        refs.add_path(name, raw, false);
    }
    refs
}

fn dir_option(name: &str, default: &str) -> PathOption {
    PathOption::new(
        OptionMeta::new(name, "Logs"),
        PathKind::Directory,
        default,
        PathRequirements::default(),
    )
}

fn file_option(name: &str, default: &str) -> PathOption {
    PathOption::new(
        OptionMeta::new(name, "Socket"),
        PathKind::File,
        default,
        PathRequirements::default(),
    )
}

fn check(option: &mut PathOption, host: &mut Host, refs: &References) -> Verdict {
    let mut refs = refs.clone();
    option.publish(&mut refs);
    option.check(&mut host.env(), &refs)
}

mod resolution {
    use super::*;

    #[test]
    fn plain_path_is_unchanged() {
        assert_eq!(resolve_path("/data/x", "A", &refs(&[])).unwrap(), "/data/x");
    }

    #[test]
    fn references_expand_transitively() {
        let refs = refs(&[
            ("DATA_PATH", "/data/dbnode"),
            ("LOG_PATH", "$DATA_PATH/log"),
            ("UI_LOGDIR", "$LOG_PATH/ui"),
        ]);

        assert_eq!(
            resolve_path("$UI_LOGDIR/x", "OTHER", &refs).unwrap(),
            "/data/dbnode/log/ui/x"
        );
    }

    #[test]
    fn several_references_in_one_value() {
        let refs = refs(&[("A", "/a"), ("B", "b")]);
        assert_eq!(resolve_path("$A/$B/c", "C", &refs).unwrap(), "/a/b/c");
    }

    #[test]
    fn mutual_reference_is_circular() {
        let refs = refs(&[("A", "$B/x"), ("B", "$A/y")]);

        let err = resolve_path("$B/x", "A", &refs).unwrap_err();

        match err {
            PathError::Circular { variable, within } => {
                assert_eq!(variable, "A");
                assert_eq!(within, "B");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_reference_is_circular() {
        let refs = refs(&[("A", "$A/x")]);
        assert!(matches!(
            resolve_path("$A/x", "A", &refs),
            Err(PathError::Circular { .. })
        ));
    }

    #[test]
    fn unknown_reference_is_unresolved() {
        let err = resolve_path("$NOPE/x", "LOG_PATH", &refs(&[])).unwrap_err();

        assert!(matches!(err, PathError::Unresolved { .. }));
        assert_eq!(err.to_string(), "Reference to $NOPE in $LOG_PATH cannot be resolved");
    }

    #[test]
    fn overly_deep_chain_fails_closed() {
        let names: Vec<String> = (0..12).map(|i| format!("V{i}")).collect();
        let mut pairs: Vec<(String, String)> = names
            .windows(2)
            .map(|w| (w[0].clone(), format!("${}", w[1])))
            .collect();
        pairs.push((names[11].clone(), "/end".to_string()));
        let mut refs = References::default();
        for (name, raw) in &pairs {
            refs.add_path(name, raw, false);
        }

        assert!(matches!(
            resolve_path("$V0", "TOP", &refs),
            Err(PathError::Circular { .. })
        ));
    }

    #[test]
    fn short_chain_within_limit_resolves() {
        let refs = refs(&[("V0", "$V1"), ("V1", "$V2"), ("V2", "/end")]);
        assert_eq!(resolve_path("$V0", "TOP", &refs).unwrap(), "/end");
    }
}

mod set_value {
    use super::*;

    #[test]
    fn absolute_path_is_normalized() {
        let mut host = Host::new(&[]);
        let mut option = dir_option("LOG_PATH", "/var/log");

        option.set_value("/data/./x/../y", &mut host.env()).unwrap();

        assert_eq!(option.raw(), "/data/y");
    }

    #[test]
    fn relative_path_is_made_absolute() {
        let mut host = Host::new(&[]);
        let mut option = dir_option("LOG_PATH", "/var/log");

        option.set_value("logs", &mut host.env()).unwrap();

        let expected = std::env::current_dir().unwrap().join("logs");
        assert_eq!(Path::new(option.raw()), expected);
    }

    #[test]
    fn tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let mut host = Host::new(&[]);
        let mut option = dir_option("LOG_PATH", "/var/log");

        option.set_value("~/dbnode", &mut host.env()).unwrap();

        assert_eq!(Path::new(option.raw()), normalize(&home.join("dbnode")));
    }

    #[test]
    fn leading_reference_is_stored_verbatim() {
        let mut host = Host::new(&[]);
        let mut option = dir_option("LOG_PATH", "/var/log");

        option.set_value("$DATA_PATH/log", &mut host.env()).unwrap();

        assert_eq!(option.raw(), "$DATA_PATH/log");
    }

    #[test]
    fn empty_value_is_rejected() {
        let mut host = Host::new(&[]);
        let mut option = dir_option("LOG_PATH", "/var/log");

        assert!(option.set_value("  ", &mut host.env()).is_err());
        assert!(option.is_default());
    }

    #[test]
    fn directories_get_path_suffix() {
        let dir = dir_option("LOG_PATH", "/var/log");
        let file = file_option("SOCK", "/tmp/x.sock");

        assert_eq!(dir.meta().long_description, "DBNode Logs Path");
        assert_eq!(file.meta().long_description, "DBNode Socket");
    }

    #[test]
    fn config_string_is_expanded() {
        let option = dir_option("LOG_PATH", "$DATA_PATH/log");
        let refs = refs(&[("DATA_PATH", "/data")]);

        assert_eq!(option.config_string(&refs), "/data/log");
        assert_eq!(option.value_string(), "$DATA_PATH/log");
    }
}

mod directories {
    use super::*;

    #[test]
    fn missing_directory_is_created_with_yes() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a/b");
        let mut host = Host::new(&[]).with_mode(YES);
        let mut option = dir_option("LOG_PATH", target.to_str().unwrap());

        assert_eq!(check(&mut option, &mut host, &refs(&[])), Verdict::Accepted);
        assert!(target.is_dir());
    }

    #[test]
    fn missing_directory_is_created_after_confirmation() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("new");
        let mut host = Host::new(&[""]);
        let mut option = dir_option("LOG_PATH", target.to_str().unwrap());

        assert_eq!(check(&mut option, &mut host, &refs(&[])), Verdict::Accepted);
        assert!(target.is_dir());
        assert!(host.prompter.prompts[0].contains("not found, attempt to create?"));
    }

    #[test]
    fn declined_creation_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("new");
        let mut host = Host::new(&["n"]);
        let mut option = dir_option("LOG_PATH", target.to_str().unwrap());

        assert!(matches!(
            check(&mut option, &mut host, &refs(&[])),
            Verdict::Reject(_)
        ));
        assert!(!target.exists());
    }

    #[test]
    fn creation_is_inherited_from_approved_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("data");
        let mut host = Host::new(&["y"]);
        let mut data_option = dir_option("DATA_PATH", data.to_str().unwrap());
        let mut log_option = dir_option("LOG_PATH", "$DATA_PATH/log");

        let mut refs = References::default();
        assert_eq!(check(&mut data_option, &mut host, &refs), Verdict::Accepted);
        data_option.publish(&mut refs);
        assert_eq!(check(&mut log_option, &mut host, &refs), Verdict::Accepted);

        assert!(data.join("log").is_dir());
        assert_eq!(host.prompter.prompts.len(), 1);
    }

    #[test]
    fn file_where_directory_expected_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("plain");
        std::fs::write(&target, "x").unwrap();
        let mut host = Host::new(&[]).with_mode(YES);
        let mut option = dir_option("LOG_PATH", target.to_str().unwrap());

        let verdict = check(&mut option, &mut host, &refs(&[]));

        assert!(matches!(verdict, Verdict::Reject(ref r) if r.contains("instead of a directory")));
    }

    #[test]
    fn circular_reference_is_rejected_not_fatal() {
        let mut host = Host::new(&[]);
        let mut option = dir_option("A", "$B/x");

        let verdict = check(&mut option, &mut host, &refs(&[("B", "$A/y")]));

        assert!(matches!(verdict, Verdict::Reject(ref r) if r.contains("Circular")));
    }
}

mod files {
    use super::*;

    #[test]
    fn directory_where_file_expected_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut host = Host::new(&[]).with_mode(YES);
        let mut option = file_option("SOCK", tmp.path().to_str().unwrap());

        let verdict = check(&mut option, &mut host, &refs(&[]));

        assert!(matches!(verdict, Verdict::Reject(ref r) if r.contains("instead of a file")));
    }

    #[test]
    fn existing_file_needs_overwrite_confirmation() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("mysql.sock");
        std::fs::write(&target, "").unwrap();
        let mut host = Host::new(&["n"]);
        let mut option = file_option("SOCK", target.to_str().unwrap());

        assert!(matches!(
            check(&mut option, &mut host, &refs(&[])),
            Verdict::Reject(_)
        ));
        assert!(host.prompter.prompts[0].contains("overwrite?"));
    }

    #[test]
    fn existing_file_overwrite_confirmed() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("mysql.sock");
        std::fs::write(&target, "").unwrap();
        let mut host = Host::new(&["yes"]);
        let mut option = file_option("SOCK", target.to_str().unwrap());

        assert_eq!(check(&mut option, &mut host, &refs(&[])), Verdict::Accepted);
    }

    #[test]
    fn missing_parent_of_file_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("run/mysql.sock");
        let mut host = Host::new(&[]).with_mode(YES);
        let mut option = file_option("SOCK", target.to_str().unwrap());

        assert_eq!(check(&mut option, &mut host, &refs(&[])), Verdict::Accepted);
        assert!(tmp.path().join("run").is_dir());
        assert!(!target.exists());
    }
}

mod requirements {
    use super::*;

    fn data_option(path: &Path) -> PathOption {
        PathOption::new(
            OptionMeta::new("DATA_PATH", "Database Storage"),
            PathKind::Directory,
            path.to_str().unwrap(),
            PathRequirements {
                min_free_gib: Some(20),
                valid_fs: vec!["ext4".to_string(), "xfs".to_string()],
            },
        )
    }

    #[test]
    fn enough_space_on_recommended_fs_is_accepted() {
        let tmp = tempfile::tempdir().unwrap();
        let mut host = Host::new(&[]);
        let mut option = data_option(tmp.path());

        assert_eq!(check(&mut option, &mut host, &refs(&[])), Verdict::Accepted);
    }

    #[test]
    fn insufficient_space_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut host = Host::new(&[]);
        host.disks = FakeDisks::new(5, "xfs");
        let mut option = data_option(tmp.path());

        let verdict = check(&mut option, &mut host, &refs(&[]));

        assert!(matches!(verdict, Verdict::Reject(ref r) if r.contains("at least 20 GiB")));
    }

    #[test]
    fn insufficient_space_is_accepted_under_force() {
        let tmp = tempfile::tempdir().unwrap();
        let mut host = Host::new(&[]).with_mode(FORCE);
        host.disks = FakeDisks::new(5, "xfs");
        let mut option = data_option(tmp.path());

        assert_eq!(check(&mut option, &mut host, &refs(&[])), Verdict::Accepted);
    }

    #[test]
    fn unrecommended_fs_only_warns_outside_wizard() {
        let tmp = tempfile::tempdir().unwrap();
        let mut host = Host::new(&[]);
        host.disks = FakeDisks::new(100, "tmpfs");
        let mut option = data_option(tmp.path());

        assert_eq!(check(&mut option, &mut host, &refs(&[])), Verdict::Accepted);
        assert!(host.prompter.prompts.is_empty());
    }

    #[test]
    fn wizard_asks_to_accept_unrecommended_fs() {
        let tmp = tempfile::tempdir().unwrap();
        let wizard = RunMode {
            wizard: true,
            ..RunMode::default()
        };
        let mut host = Host::new(&["n"]).with_mode(wizard);
        host.disks = FakeDisks::new(100, "tmpfs");
        let mut option = data_option(tmp.path());

        let verdict = check(&mut option, &mut host, &refs(&[]));

        assert!(matches!(verdict, Verdict::Reject(ref r) if r.contains("tmpfs")));
        assert!(host.prompter.prompts[0].starts_with("Accept current settings?"));
    }

    #[test]
    fn wizard_can_accept_unrecommended_fs() {
        let tmp = tempfile::tempdir().unwrap();
        let wizard = RunMode {
            wizard: true,
            ..RunMode::default()
        };
        let mut host = Host::new(&["y"]).with_mode(wizard);
        host.disks = FakeDisks::new(100, "tmpfs");
        let mut option = data_option(tmp.path());

        assert_eq!(check(&mut option, &mut host, &refs(&[])), Verdict::Accepted);
    }
}
