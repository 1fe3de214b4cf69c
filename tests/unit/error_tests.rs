//! Unit tests for the application error type.

use pdb_relay::{AppError, GlobalConfig};

#[test]
fn display_prefixes_identify_the_domain() {
    let cases = [
        (
            AppError::AlreadyActive("session busy".into()),
            "already active: session busy",
        ),
        (
            AppError::NoActiveSession("nothing running".into()),
            "no active session: nothing running",
        ),
        (AppError::Spawn("boom".into()), "spawn: boom"),
        (AppError::Write("pipe closed".into()), "write: pipe closed"),
        (AppError::Config("bad value".into()), "config: bad value"),
        (AppError::Io("denied".into()), "io: denied"),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn io_errors_convert_to_io_variant() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: AppError = io.into();
    assert!(matches!(err, AppError::Io(_)));
}

#[test]
fn toml_errors_convert_to_config_variant() {
    let err = GlobalConfig::from_toml_str("][").unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.to_string().starts_with("config:"));
}
