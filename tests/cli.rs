use assert_cmd::Command;
use assert_fs::prelude::*;
use clap::Parser;
use ldapvi::{
    cli::{ApplyArgs, Cli, Commands, NewArgs, SearchArgs},
    directory::Scope,
};
use predicates::prelude::*;

#[test]
fn list_takes_unit_entity_and_recursion() {
    // Given
    let argv = ["ldapvi", "list", "people", "alice", "-R"];

    // When
    let cli = Cli::parse_from(argv);

    // Then
    match cli.command {
        Commands::List(select) => {
            assert_eq!(select.unit.as_deref(), Some("people"));
            assert_eq!(select.entity.as_deref(), Some("alice"));
            assert!(select.recursive);
            assert!(select.scope.is_none());
        }
        _ => panic!("expected List command"),
    }
}

#[test]
fn connection_flags_are_global() {
    let cli = Cli::parse_from([
        "ldapvi",
        "edit",
        "hosts",
        "-H",
        "ldaps://ldap.tuna",
        "-D",
        "cn=admin,o=tuna",
        "-W",
        "-Z",
        "--fold-width",
        "0",
        "-y",
    ]);

    assert_eq!(cli.conn.uri.as_deref(), Some("ldaps://ldap.tuna"));
    assert_eq!(cli.conn.bind_dn.as_deref(), Some("cn=admin,o=tuna"));
    assert!(cli.conn.ask_pw);
    assert!(cli.conn.starttls);
    assert_eq!(cli.conn.fold_width, Some(0));
    assert!(cli.context().yes);
    assert!(matches!(cli.command, Commands::Edit(_)));
}

#[test]
fn password_flag_conflicts_with_prompting() {
    let res = Cli::try_parse_from(["ldapvi", "-w", "pw", "-W", "list", "people"]);
    assert!(res.is_err());
}

#[test]
fn new_accepts_a_template() {
    let cli = Cli::parse_from(["ldapvi", "new", "hosts", "web", "-t", "host.ldif"]);
    match cli.command {
        Commands::New(NewArgs { select, template }) => {
            assert_eq!(select.unit.as_deref(), Some("hosts"));
            assert_eq!(select.entity.as_deref(), Some("web"));
            assert!(template.is_some_and(|p| p.ends_with("host.ldif")));
        }
        _ => panic!("expected New command"),
    }
}

#[test]
fn apply_reads_a_file_and_an_explicit_base() {
    let cli = Cli::parse_from(["ldapvi", "apply", "-", "-b", "ou=people,o=tuna", "-s", "one"]);
    match cli.command {
        Commands::Apply(ApplyArgs { file, select }) => {
            assert_eq!(file.as_os_str(), "-");
            assert_eq!(select.base.as_deref(), Some("ou=people,o=tuna"));
            assert_eq!(select.scope, Some(Scope::One));
        }
        _ => panic!("expected Apply command"),
    }
}

#[test]
fn search_defaults_to_subtree() {
    let cli = Cli::parse_from(["ldapvi", "search", "o=tuna", "(uid=alice)"]);
    match cli.command {
        Commands::Search(SearchArgs { scope, base, filter }) => {
            assert_eq!(scope, Scope::Sub);
            assert_eq!(base, "o=tuna");
            assert_eq!(filter.as_deref(), Some("(uid=alice)"));
        }
        _ => panic!("expected Search command"),
    }
}

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("ldapvi")
        .expect("bin")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LDIF"));
}

#[test]
fn init_writes_config_once() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    Command::cargo_bin("ldapvi")
        .expect("bin")
        .args(["init", tmp.path().to_str().unwrap()])
        .assert()
        .success();
    tmp.child("ldapvi.toml")
        .assert(predicate::str::contains("[profiles.example]"));

    Command::cargo_bin("ldapvi")
        .expect("bin")
        .args(["init", tmp.path().to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    Command::cargo_bin("ldapvi")
        .expect("bin")
        .args(["init", "--force", tmp.path().to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn missing_uri_without_terminal_is_a_bad_invocation() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    let cfg = tmp.child("empty.toml");
    cfg.write_str("").expect("write config");

    Command::cargo_bin("ldapvi")
        .expect("bin")
        .env_remove("LDAPVI_LOG")
        .args(["--config", cfg.path().to_str().unwrap(), "list", "people"])
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no URI given"));
}

#[test]
fn list_without_a_target_is_a_bad_invocation() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    let cfg = tmp.child("empty.toml");
    cfg.write_str("").expect("write config");

    Command::cargo_bin("ldapvi")
        .expect("bin")
        .args(["--config", cfg.path().to_str().unwrap(), "-H", "ldap://127.0.0.1:1", "list"])
        .write_stdin("")
        .assert()
        .code(2);
}

#[test]
fn unreachable_server_exits_with_connect_failure() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    let cfg = tmp.child("empty.toml");
    cfg.write_str("").expect("write config");
    let ldif = tmp.child("wanted.ldif");
    ldif.write_str("dn: o=tuna\no: tuna\n").expect("write ldif");

    Command::cargo_bin("ldapvi")
        .expect("bin")
        .args([
            "--config",
            cfg.path().to_str().unwrap(),
            "-H",
            "ldap://127.0.0.1:1",
            "-D",
            "cn=admin,o=tuna",
            "-w",
            "secret",
            "--draft-dir",
            tmp.path().to_str().unwrap(),
            "apply",
            ldif.path().to_str().unwrap(),
            "-b",
            "o=tuna",
        ])
        .write_stdin("")
        .assert()
        .code(4);
}

#[test]
fn piped_ldif_with_yes_reaches_the_server() {
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    let cfg = tmp.child("empty.toml");
    cfg.write_str("").expect("write config");

    Command::cargo_bin("ldapvi")
        .expect("bin")
        .args([
            "--config",
            cfg.path().to_str().unwrap(),
            "-H",
            "ldap://127.0.0.1:1",
            "-D",
            "cn=admin,o=tuna",
            "-w",
            "secret",
            "--yes",
            "apply",
            "-",
            "-b",
            "o=tuna",
        ])
        .write_stdin("dn: o=tuna\no: tuna\n")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .code(4);
}
