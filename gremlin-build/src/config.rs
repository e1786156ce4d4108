//! Configuration for protobuf code generation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::codegen;
use crate::context::GenerationContext;
use crate::descriptor::{into_schema, FileDescriptorSet};
use crate::protoc;
use crate::schema::Schema;
use crate::Error;

/// Configuration for protobuf code generation.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Output directory for generated files.
    pub(crate) out_dir: Option<PathBuf>,

    /// Path to the protoc executable.
    pub(crate) protoc_path: Option<PathBuf>,

    /// Additional arguments for protoc.
    pub(crate) protoc_args: Vec<String>,

    /// Skip running protoc, use pre-existing FileDescriptorSet.
    pub(crate) skip_protoc: bool,

    /// Path to read the FileDescriptorSet from when protoc is skipped.
    pub(crate) file_descriptor_set_path: Option<PathBuf>,

    /// Disable formatting with prettyplease.
    pub(crate) skip_format: bool,

    /// Reject undeclared enum numbers in reader accessors.
    pub(crate) strict_enums: bool,
}

impl Config {
    /// Create a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory for generated Rust files.
    pub fn out_dir(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.out_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set path to the protoc executable.
    pub fn protoc_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.protoc_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add an argument to pass to protoc.
    pub fn protoc_arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.protoc_args.push(arg.into());
        self
    }

    /// Skip running protoc; use an existing FileDescriptorSet instead.
    pub fn skip_protoc_run(&mut self) -> &mut Self {
        self.skip_protoc = true;
        self
    }

    /// Path of the FileDescriptorSet read when protoc is skipped.
    pub fn file_descriptor_set_path(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.file_descriptor_set_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Skip formatting with prettyplease.
    pub fn skip_format(&mut self) -> &mut Self {
        self.skip_format = true;
        self
    }

    /// Make enum accessors fail with `UnknownEnumValue` for numbers the
    /// enum doesn't declare. By default the raw `i32` passes through.
    pub fn strict_enums(&mut self) -> &mut Self {
        self.strict_enums = true;
        self
    }

    /// Compile `.proto` files into Rust files.
    pub fn compile_protos(&self, protos: &[impl AsRef<Path>], includes: &[impl AsRef<Path>]) -> Result<(), Error> {
        let fds = if self.skip_protoc {
            let path = self
                .file_descriptor_set_path
                .as_ref()
                .ok_or(Error::MissingDescriptorPath)?;
            protoc::read_file_descriptor_set(path)?
        } else {
            let protoc_path = match &self.protoc_path {
                Some(path) => path.clone(),
                None => protoc::find_protoc()?,
            };
            protoc::invoke_protoc(&protoc_path, protos, includes, &self.protoc_args)?
        };

        self.compile_fds(&fds)
    }

    /// Compile from an existing FileDescriptorSet.
    pub fn compile_fds(&self, fds: &FileDescriptorSet) -> Result<(), Error> {
        let schema = into_schema(fds)?;
        self.generate(&schema)
    }

    /// Generate code for `schema` and write it to the output directory.
    pub fn generate(&self, schema: &Schema) -> Result<(), Error> {
        let out_dir = self
            .out_dir
            .clone()
            .or_else(|| std::env::var_os("OUT_DIR").map(Into::into))
            .ok_or(Error::MissingOutDir)?;

        let ctx = GenerationContext::new(self, schema);
        tracing::info!(files = schema.files.len(), out_dir = %out_dir.display(), "generating code");
        let modules = codegen::generate(&ctx, schema)?;
        codegen::write_modules(&out_dir, &modules, self.skip_format)
    }

    /// Generate code for `schema` without touching the file system.
    ///
    /// Keys are file names (`<module>.rs` plus `mod.rs`).
    pub fn generate_to_strings(&self, schema: &Schema) -> Result<BTreeMap<String, String>, Error> {
        let ctx = GenerationContext::new(self, schema);
        let modules = codegen::generate(&ctx, schema)?;
        codegen::render_modules(&modules, self.skip_format)
    }
}
