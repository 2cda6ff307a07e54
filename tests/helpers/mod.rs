use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// Writes `yaml` to `machines.yml` inside `dir` and returns the path.
///
/// # Panics
/// Panics if the temp dir path is not UTF-8 or the file cannot be written.
#[allow(dead_code)]
pub fn write_manifest(dir: &TempDir, yaml: &str) -> Utf8PathBuf {
    let path = Utf8Path::from_path(dir.path())
        .expect("temp dir path should be UTF-8")
        .join("machines.yml");
    std::fs::write(&path, yaml).expect("failed to write manifest");
    path
}

/// Returns the number of entries in a directory.
#[allow(dead_code)]
pub fn entry_count(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path())
        .expect("failed to read temp dir")
        .count()
}
