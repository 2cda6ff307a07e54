mod helpers;

use camino::Utf8Path;
use tempfile::tempdir;
use vmnoop::VmnoopError;
use vmnoop::cli::{LogLevel, ManifestArgs};
use vmnoop::config::{DEFAULT_BOOT_TIMEOUT, load_manifest};
use vmnoop::registry::DuplicatePolicy;
use vmnoop::run_validate;

#[test]
fn load_manifest_full() {
    let dir = tempdir().unwrap();
    let path = helpers::write_manifest(
        &dir,
        r#"---
defaults:
  communicator: winrm
  guest: windows
  boot_timeout: 60
registry:
  duplicate_policy: replace
machines:
  - name: solar-dev1
    address: 10.0.0.2
  - name: solar-dev2
    boot_timeout: -1
"#,
    );

    let manifest = load_manifest(&path).unwrap();
    assert_eq!(manifest.defaults.communicator, "winrm");
    assert_eq!(manifest.defaults.guest, "windows");
    assert_eq!(manifest.registry.duplicate_policy, DuplicatePolicy::Replace);
    assert_eq!(manifest.machines.len(), 2);

    let first = manifest.machines[0].selection(&manifest.defaults);
    assert_eq!((first.communicator.as_str(), first.guest.as_str()), ("winrm", "windows"));
    assert_eq!(first.boot_timeout, 60);

    let second = manifest.machines[1].selection(&manifest.defaults);
    assert_eq!((second.communicator.as_str(), second.guest.as_str()), ("noop", "noop_guest"));
    assert_eq!(second.boot_timeout, -1);
}

#[test]
fn load_manifest_defaults() {
    let dir = tempdir().unwrap();
    let path = helpers::write_manifest(&dir, "machines: []\n");

    let manifest = load_manifest(&path).unwrap();
    assert_eq!(manifest.defaults.communicator, "ssh");
    assert_eq!(manifest.defaults.guest, "linux");
    assert_eq!(manifest.defaults.boot_timeout, DEFAULT_BOOT_TIMEOUT);
    assert_eq!(manifest.registry.duplicate_policy, DuplicatePolicy::Reject);
    assert!(manifest.validate().is_ok());
}

#[test]
fn load_manifest_missing_file_is_io_error() {
    let err = load_manifest(Utf8Path::new("/nonexistent/machines.yml")).unwrap_err();
    match err {
        VmnoopError::Io { context, source, .. } => {
            assert_eq!(context, "/nonexistent/machines.yml");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn load_manifest_rejects_unknown_fields() {
    let dir = tempdir().unwrap();
    let path = helpers::write_manifest(
        &dir,
        r#"
machines:
  - name: solar-dev1
    ip: 10.0.0.2
"#,
    );

    let err = load_manifest(&path).unwrap_err();
    assert!(matches!(err, VmnoopError::Config(_)), "unexpected error: {:?}", err);
    assert!(err.to_string().contains("unknown field"), "{}", err);
}

#[test]
fn load_manifest_rejects_unknown_policy() {
    let dir = tempdir().unwrap();
    let path = helpers::write_manifest(&dir, "registry:\n  duplicate_policy: merge\n");
    assert!(matches!(load_manifest(&path), Err(VmnoopError::Config(_))));
}

#[test]
fn run_validate_reports_duplicate_machines() {
    let dir = tempdir().unwrap();
    let file = helpers::write_manifest(
        &dir,
        r#"
machines:
  - name: solar-dev1
  - name: solar-dev1
"#,
    );

    let err = run_validate(&ManifestArgs {
        file,
        log_level: LogLevel::Error,
    })
    .unwrap_err();
    assert!(
        matches!(err.downcast_ref::<VmnoopError>(), Some(VmnoopError::Validation(_))),
        "unexpected error: {:#}",
        err
    );
}

#[test]
fn run_validate_accepts_valid_manifest() {
    let dir = tempdir().unwrap();
    let file = helpers::write_manifest(&dir, "machines:\n  - name: solar-dev1\n");
    run_validate(&ManifestArgs {
        file,
        log_level: LogLevel::Error,
    })
    .expect("manifest should validate");
}
