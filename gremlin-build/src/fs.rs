//! Finding proto sources and writing generated output.

use std::io;
use std::path::{Path, PathBuf};

/// Directory names skipped by [`find_proto_files`] unless told otherwise.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["node_modules", "vendor", "test_data", ".git"];

/// Recursively collects the `.proto` files below `root`, sorted.
///
/// Any entry below `root` whose name equals one of `ignore` is skipped, and a
/// skipped directory is not entered. Components of `root` itself are never
/// matched, so a root that lives under e.g. `vendor/` is still searched.
pub fn find_proto_files(root: impl AsRef<Path>, ignore: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    visit(root.as_ref(), ignore, &mut found)?;
    found.sort();
    Ok(found)
}

fn visit(dir: &Path, ignore: &[&str], found: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name().to_str().is_some_and(|name| ignore.contains(&name)) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            visit(&path, ignore, found)?;
        } else if path.extension().is_some_and(|ext| ext == "proto") {
            found.push(path);
        }
    }
    Ok(())
}

/// Writes `contents` to `path`, creating missing parent directories.
pub fn write_file(path: impl AsRef<Path>, contents: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}
