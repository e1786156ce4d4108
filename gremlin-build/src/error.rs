//! Error types for gremlin-build.

use std::io;

/// Errors that can occur during protobuf code generation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("protoc not found. Set PROTOC env var or install protoc.")]
    ProtocNotFound,
    #[error("protoc failed: {}", truncate(.0))]
    ProtocFailed(String),
    #[error("failed to decode FileDescriptorSet: {0}")]
    Descriptor(#[from] gremlin::DecodeError),
    #[error("OUT_DIR not set. Run from build.rs or set out_dir().")]
    MissingOutDir,
    #[error("file_descriptor_set_path required when skip_protoc is set")]
    MissingDescriptorPath,
    /// A required descriptor attribute (name, number, ...) was missing.
    #[error("missing {0} in descriptor")]
    MissingAttribute(&'static str),
    #[error("invalid field type: {0} (expected 1-18)")]
    InvalidFieldType(i32),
    #[error("invalid field label: {0} (expected 1-3)")]
    InvalidLabel(i32),
    #[error("group fields are not supported: '{0}'")]
    UnsupportedGroup(String),
    #[error("failed to parse generated code: {0}")]
    SynParse(String),
    /// Every problem found in the schema, across all files.
    #[error("code generation failed with {} error(s):{}", .0.len(), list(.0))]
    Generation(Vec<GenerationError>),
}

/// A problem with one field or message of the schema.
///
/// These are collected for the whole schema before generation stops, so one
/// run reports all of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("{file}: field '{message}.{field}' references unknown type '{type_name}'")]
    UnresolvableType {
        file: String,
        message: String,
        field: String,
        type_name: String,
    },
    #[error("{file}: fields '{first}' and '{second}' of '{message}' share tag {tag}")]
    TagCollision {
        file: String,
        message: String,
        tag: u32,
        first: String,
        second: String,
    },
    #[error("{file}: field '{message}.{field}' has tag {tag} outside the valid range")]
    InvalidTag {
        file: String,
        message: String,
        field: String,
        tag: u32,
    },
    #[error("{file}: map field '{message}.{field}' has a key type that cannot be a map key")]
    InvalidMapKey {
        file: String,
        message: String,
        field: String,
    },
    #[error("{file}: field '{message}.{field}' has an unusable default '{value}'")]
    InvalidDefault {
        file: String,
        message: String,
        field: String,
        value: String,
    },
}

impl GenerationError {
    /// The proto file the problem was found in.
    pub fn file(&self) -> &str {
        match self {
            GenerationError::UnresolvableType { file, .. }
            | GenerationError::TagCollision { file, .. }
            | GenerationError::InvalidTag { file, .. }
            | GenerationError::InvalidMapKey { file, .. }
            | GenerationError::InvalidDefault { file, .. } => file,
        }
    }
}

fn truncate(msg: &str) -> String {
    const MAX_LEN: usize = 1000;
    match msg.char_indices().nth(MAX_LEN) {
        Some((idx, _)) => format!("{}... (truncated)", &msg[..idx]),
        None => msg.to_string(),
    }
}

fn list(errors: &[GenerationError]) -> String {
    errors.iter().map(|err| format!("\n  {err}")).collect()
}

impl From<GenerationError> for Error {
    fn from(err: GenerationError) -> Self {
        Error::Generation(vec![err])
    }
}
