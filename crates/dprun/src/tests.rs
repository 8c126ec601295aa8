//! Tests for argument parsing and session id output.

use dplay::guid;
use dplay::guid::Guid;
use dplay::session::SessionDescriptor;
use dplay::session::SessionMode;
use dplay::session::SessionOption;

use crate::cli::Cli;
use crate::cli::DEFAULT_RUNTIME_ADDR;

const APP: &str = "{5BFDB060-06A4-11D0-9C4F-00A0C905425E}";
const SESSION: &str = "{0F1D6860-88D9-11CF-9C4E-00A0C905425E}";

fn parse(args: &[&str]) -> (Cli, Vec<SessionOption>) {
    Cli::try_parse_options(std::iter::once("dprun").chain(args.iter().copied())).unwrap()
}

fn descriptor(args: &[&str]) -> SessionDescriptor {
    parse(args).1.into_iter().collect()
}

#[test]
fn test_host_with_all_options() {
    let (cli, options) = parse(&[
        "-H", SESSION, "-p", "alice", "-A", APP, "-s", "TCPIP", "-n", "game", "-q", "secret",
    ]);
    assert_eq!(cli.runtime, DEFAULT_RUNTIME_ADDR);
    assert_eq!(cli.session_id_file, None);

    let session: Guid = SESSION.parse().unwrap();
    assert_eq!(options[0], SessionOption::Host(Some(session)));

    let desc: SessionDescriptor = options.into_iter().collect();
    assert!(desc.validate().is_ok());
    assert_eq!(desc.session_id, session);
    assert_eq!(desc.service_provider, guid::DPSPGUID_TCPIP);
    assert_eq!(desc.session_name.as_deref(), Some("game"));
    assert_eq!(desc.session_password.as_deref(), Some("secret"));
}

#[test]
fn test_host_without_session_generates_one() {
    let (_, options) = parse(&["--host", "--player", "alice"]);
    assert_eq!(options[0], SessionOption::Host(None));
    assert_eq!(options[1], SessionOption::Player("alice".into()));
}

#[test]
fn test_join_needs_a_session() {
    let desc = descriptor(&["-J", SESSION, "-p", "bob", "-A", APP, "-s", "IPX"]);
    assert_eq!(desc.mode, Some(SessionMode::Join));
    assert!(desc.validate().is_ok());

    let argv = ["dprun", "-J"];
    assert!(Cli::try_parse_options(argv).is_err());
}

#[test]
fn test_host_and_join_conflict() {
    let argv = ["dprun", "-H", "-J", SESSION];
    assert!(Cli::try_parse_options(argv).is_err());
}

#[test]
fn test_mode_may_come_after_other_flags() {
    let desc = descriptor(&["-p", "alice", "-A", APP, "-s", "DPRUN", "-H"]);
    assert!(desc.is_host());
    assert!(desc.validate().is_ok());
}

#[test]
fn test_last_scalar_wins() {
    let desc = descriptor(&["-p", "first", "-p", "second"]);
    assert_eq!(desc.player_name.as_deref(), Some("second"));
}

#[test]
fn test_providers_and_addresses_keep_command_line_order() {
    let desc = descriptor(&[
        "-a", "INet=10.0.0.1", "-s", "TCPIP", "-a", "INetPort=i:2300", "-s", "IPX", "-a", "Phone=555",
    ]);

    let types: Vec<Guid> = desc.address.elements().iter().map(|e| e.data_type()).collect();
    assert_eq!(
        types,
        vec![
            guid::DPAID_INET,
            guid::DPAID_SERVICE_PROVIDER,
            guid::DPAID_INET_PORT,
            guid::DPAID_SERVICE_PROVIDER,
            guid::DPAID_PHONE,
        ]
    );
    assert_eq!(desc.address.elements()[2].payload(), &2300u32.to_le_bytes());
    assert_eq!(desc.address.elements()[3].payload(), &guid::DPSPGUID_IPX.to_bytes());
    assert_eq!(desc.service_provider, guid::DPSPGUID_IPX);
}

#[test]
fn test_bad_values_are_usage_errors() {
    for args in [
        ["dprun", "-a", "INet"],
        ["dprun", "-a", "inet=x"],
        ["dprun", "-a", "INet=b:XYZ"],
        ["dprun", "-s", "tcpip"],
        ["dprun", "-A", "5BFDB060"],
    ] {
        let err = Cli::try_parse_options(args).unwrap_err();
        assert!(err.use_stderr(), "accepted {:?}", args);
    }
}

#[test]
fn test_missing_fields_are_reported_together() {
    let err = descriptor(&["-H"]).validate().unwrap_err();
    assert_eq!(err.to_string(), "missing --player, --application, --service-provider");
}

#[test]
fn test_runtime_and_session_file_flags() {
    let (cli, _) = parse(&["--runtime", "192.168.1.5:9000", "--session-id-file", "sid.txt"]);
    assert_eq!(cli.runtime, "192.168.1.5:9000");
    assert_eq!(cli.session_id_file.as_deref(), Some(std::path::Path::new("sid.txt")));
}

#[test]
fn test_session_id_file_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.txt");
    let session: Guid = SESSION.parse().unwrap();

    crate::write_session_id(&path, session).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), SESSION);

    let missing = dir.path().join("no/such/dir/session.txt");
    assert!(crate::write_session_id(&missing, session).is_err());
}
