use std::fs;

use pinpoint_core::model::Architecture;
use pinpoint_core::services::ResolveError;
use pinpoint_core::signatures::SignatureError;
use pinpoint_core::SignatureCatalog;

#[test]
fn yaml_catalog_accepts_short_architecture_names() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("signatures.yaml");
    fs::write(
        &path,
        "arm:\n  - \"2D E9 F. 4. D0 F8 00 80\"\nx86:\n  - \"55 41 57\"\n  - \"55 48 89 E5\"\n",
    )
    .unwrap();
    let catalog = SignatureCatalog::from_path(&path).unwrap();
    assert_eq!(catalog.lookup(Architecture::Arm32).unwrap().len(), 1);
    assert_eq!(catalog.lookup(Architecture::X86_64).unwrap()[1].to_string(), "55 48 89 E5");
    assert!(matches!(
        catalog.lookup(Architecture::Arm64),
        Err(ResolveError::NoPatternsForArchitecture(Architecture::Arm64))
    ));
}

#[test]
fn json_catalog_is_parsed_by_extension() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("signatures.json");
    fs::write(&path, r#"{"arm64": ["F. 0F 1C F8", "FF 43 01 D1"]}"#).unwrap();
    let catalog = SignatureCatalog::from_path(&path).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.architectures().collect::<Vec<_>>(), vec![Architecture::Arm64]);
}

#[test]
fn empty_list_in_file_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("signatures.yaml");
    fs::write(&path, "arm64: []\n").unwrap();
    assert!(matches!(
        SignatureCatalog::from_path(&path),
        Err(SignatureError::EmptyList(Architecture::Arm64))
    ));
}

#[test]
fn unknown_architecture_and_bad_tokens_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("signatures.yaml");
    fs::write(&path, "mips:\n  - \"27 BD FF E0\"\n").unwrap();
    assert!(matches!(
        SignatureCatalog::from_path(&path),
        Err(SignatureError::UnknownArchitecture(tag)) if tag == "mips"
    ));

    fs::write(&path, "arm64:\n  - \"F. 0F XZ\"\n").unwrap();
    assert!(matches!(
        SignatureCatalog::from_path(&path),
        Err(SignatureError::InvalidToken { position: 2, .. })
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = SignatureCatalog::from_path(std::path::Path::new("does/not/exist.yaml")).unwrap_err();
    assert!(matches!(err, SignatureError::Io { .. }));
}
