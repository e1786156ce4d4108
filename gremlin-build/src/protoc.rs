//! Running `protoc` to obtain a descriptor set.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::descriptor::{decode_file_descriptor_set, FileDescriptorSet};
use crate::Error;

/// Locates protoc: the `PROTOC` env var first, then `PATH`.
pub fn find_protoc() -> Result<PathBuf, Error> {
    if let Some(path) = std::env::var_os("PROTOC").map(PathBuf::from) {
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "PROTOC points at a missing file, searching PATH");
    }

    which::which("protoc").map_err(|_| Error::ProtocNotFound)
}

/// Runs protoc over `protos` and decodes the descriptor set it writes.
pub fn invoke_protoc(
    protoc: &Path,
    protos: &[impl AsRef<Path>],
    includes: &[impl AsRef<Path>],
    extra_args: &[String],
) -> Result<FileDescriptorSet, Error> {
    let tempdir = tempfile::tempdir()?;
    let descriptor_path = tempdir.path().join("descriptor.bin");

    let mut cmd = Command::new(protoc);
    for include in includes {
        cmd.arg("-I").arg(include.as_ref());
    }
    cmd.arg("--descriptor_set_out").arg(&descriptor_path);
    // Imports are needed to resolve every referenced type.
    cmd.arg("--include_imports");
    cmd.args(extra_args);
    for proto in protos {
        cmd.arg(proto.as_ref());
    }

    tracing::debug!(protoc = %protoc.display(), files = protos.len(), "invoking protoc");
    let output = cmd.output()?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.into_owned(),
            (false, true) => stdout.into_owned(),
            (false, false) => format!("{stdout}\n{stderr}"),
        };
        return Err(Error::ProtocFailed(combined));
    }

    let bytes = std::fs::read(&descriptor_path)?;
    decode_file_descriptor_set(&bytes)
}

/// Reads a descriptor set written by an earlier protoc run.
pub fn read_file_descriptor_set(path: &Path) -> Result<FileDescriptorSet, Error> {
    let bytes = std::fs::read(path)?;
    decode_file_descriptor_set(&bytes)
}
