// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::{tempdir, NamedTempFile};
use xbot::config::{load_and_validate, load_or_default, parse_duration, ConfigFile};
use xbot::errors::XbotError;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(body: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{body}")?;
    Ok(file)
}

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let file = write_config("")?;
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg, ConfigFile::default());
    assert_eq!(cfg.scheduler.initial_delay, Duration::from_secs(3));
    assert_eq!(cfg.scheduler.period, Duration::from_secs(60));
    assert_eq!(cfg.log.capacity, 100);
    assert!(cfg.client.is_none());
    Ok(())
}

#[test]
fn full_file_is_parsed() -> TestResult {
    let file = write_config(
        r#"
[scheduler]
initial_delay = "250ms"
period = "2m"

[log]
capacity = 20

[client]
inbox = "queue/in"
outbox = "queue/out"
"#,
    )?;
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.scheduler.initial_delay, Duration::from_millis(250));
    assert_eq!(cfg.scheduler.period, Duration::from_secs(120));
    assert_eq!(cfg.log.capacity, 20);
    let client = cfg.client.expect("client section");
    assert_eq!(client.inbox, PathBuf::from("queue/in"));
    assert_eq!(client.outbox, PathBuf::from("queue/out"));
    Ok(())
}

#[test]
fn zero_period_is_rejected() -> TestResult {
    let file = write_config("[scheduler]\nperiod = \"0s\"\n")?;

    match load_and_validate(file.path()) {
        Err(XbotError::ConfigError(msg)) => assert!(msg.contains("period")),
        other => panic!("expected config error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn zero_log_capacity_is_rejected() -> TestResult {
    let file = write_config("[log]\ncapacity = 0\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(XbotError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn bad_duration_is_rejected() -> TestResult {
    let file = write_config("[scheduler]\ninitial_delay = \"soon\"\n")?;

    match load_and_validate(file.path()) {
        Err(XbotError::ConfigError(msg)) => assert!(msg.contains("initial_delay")),
        other => panic!("expected config error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn empty_client_path_is_rejected() -> TestResult {
    let file = write_config("[client]\ninbox = \"\"\noutbox = \"out\"\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(XbotError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn invalid_toml_is_a_toml_error() -> TestResult {
    let file = write_config("[scheduler\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(XbotError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn missing_explicit_file_is_an_error_but_default_location_is_not() -> TestResult {
    let dir = tempdir()?;
    let missing = dir.path().join("xbot.toml");

    assert!(matches!(
        load_and_validate(&missing),
        Err(XbotError::IoError(_))
    ));
    assert_eq!(load_or_default(&missing)?, ConfigFile::default());
    Ok(())
}

#[test]
fn duration_units() {
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
    assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7200)));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("5d").is_err());
}

#[test]
fn oversized_durations_are_rejected_not_wrapped() {
    assert!(parse_duration("6000000000000000h").is_err());
    assert!(parse_duration("18446744073709551615s").is_err());
    assert_eq!(
        parse_duration("18446744073709551615ms"),
        Ok(Duration::from_millis(u64::MAX))
    );
}

#[test]
fn oversized_period_is_a_config_error() -> TestResult {
    let file = write_config("[scheduler]\nperiod = \"6000000000000000h\"\n")?;

    match load_and_validate(file.path()) {
        Err(XbotError::ConfigError(msg)) => assert!(msg.contains("too large")),
        other => panic!("expected config error, got {other:?}"),
    }
    Ok(())
}
