use std::io;

use j2subst::error::Error;

#[test]
fn test_error_conversion() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();

    match err {
        Error::IoError(_) => (),
        _ => panic!("Expected IoError variant"),
    }

    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(Error::from(json_err), Error::JsonError(_)));
}

#[test]
fn test_error_display() {
    let err = Error::ConfigError("invalid config".to_string());
    assert_eq!(err.to_string(), "Configuration error: invalid config.");

    let err = Error::RenderError("template not found".to_string());
    assert_eq!(err.to_string(), "Render error: template not found.");

    let err = Error::StrictModeError("op: odd".to_string());
    assert_eq!(err.to_string(), "Strict mode: op: odd.");

    let err = Error::InvalidDictName("a-b".to_string());
    assert_eq!(err.to_string(), "Invalid dictionary name: \"a-b\".");
}
