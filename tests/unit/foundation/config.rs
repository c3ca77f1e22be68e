use super::*;

#[test]
fn empty_object_uses_defaults() {
    let cfg = BuildConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, BuildConfig::default());
    assert!(cfg.loader.parallel);
    assert_eq!(cfg.loader.threads, None);
    assert_eq!(cfg.loader.placeholder.to_string(), "builtin:missing");
    assert_eq!(cfg.sprites.mip_levels, 4);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg = BuildConfig::from_json_str(
        r#"{"loader": {"threads": 3, "placeholder": "demo:missingno"}}"#,
    )
    .unwrap();
    assert!(cfg.loader.parallel);
    assert_eq!(cfg.loader.threads, Some(3));
    assert_eq!(cfg.loader.placeholder.to_string(), "demo:missingno");
    assert_eq!(cfg.sprites, SpriteOpts::default());
}

#[test]
fn zero_threads_and_zero_mips_are_rejected() {
    let err = BuildConfig::from_json_str(r#"{"loader": {"threads": 0}}"#).unwrap_err();
    assert!(err.to_string().contains("threads"));

    let err = BuildConfig::from_json_str(r#"{"sprites": {"mip_levels": 0}}"#).unwrap_err();
    assert!(err.to_string().contains("mip_levels"));
}

#[test]
fn unknown_fields_and_bad_ids_are_validation_errors() {
    let err = BuildConfig::from_json_str(r#"{"loader": {"paralel": false}}"#).unwrap_err();
    assert!(matches!(err, AtlasError::Validation(_)));

    let err = BuildConfig::from_json_str(r#"{"loader": {"placeholder": "Not Valid"}}"#)
        .unwrap_err();
    assert!(matches!(err, AtlasError::Validation(_)));
}

#[test]
fn from_path_reports_missing_file() {
    let err = BuildConfig::from_path("/definitely/not/here/atlasbake.json").unwrap_err();
    assert!(err.to_string().contains("open build config"));
}
