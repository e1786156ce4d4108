//! `gremlin-build` turns protobuf schemas into Rust code for the gremlin
//! runtime: an owned struct per message plus a lazy `<Name>Reader` that
//! decodes fields only when they are accessed.
//!
//! # Example
//!
//! ```rust,no_run
//! // In build.rs
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     gremlin_build::compile_protos(&["proto/messages.proto"], &["proto/"])?;
//!     Ok(())
//! }
//! ```
//!
//! Every package becomes one `<module>.rs` file, and a `mod.rs` declares them
//! all. Generated modules refer to each other as siblings (`super::other`),
//! so include them side by side:
//!
//! ```rust,ignore
//! pub mod proto {
//!     pub mod common {
//!         include!(concat!(env!("OUT_DIR"), "/common.rs"));
//!     }
//!     pub mod example {
//!         include!(concat!(env!("OUT_DIR"), "/example.rs"));
//!     }
//! }
//! ```
//!
//! # Schemas without protoc
//!
//! A [`schema::Schema`] can also be assembled in code and generated
//! directly, which needs no external tools:
//!
//! ```rust,no_run
//! use gremlin_build::schema::*;
//!
//! fn main() -> Result<(), gremlin_build::Error> {
//!     let schema = Schema::new().file(
//!         ProtoFile::new("node.proto").package("tree").message(
//!             MessageDefinition::new("Node")
//!                 .field(FieldDefinition::new("value", 1, ScalarType::Int64))
//!                 .field(FieldDefinition::new("next", 2, FieldType::message(".tree.Node"))),
//!         ),
//!     );
//!     gremlin_build::Config::new().strict_enums().generate(&schema)
//! }
//! ```
//!
//! # Recursive Types
//!
//! Singular message fields that close a cycle (`Node.next` above) are boxed:
//! `Option<Box<Node>>` in the owned struct and `BoxedMsg` in the reader.
//! Repeated and map fields already live on the heap and are left alone.
//!
//! # Errors
//!
//! The whole schema is validated before anything is written. Unknown type
//! references, tag collisions, out-of-range tags, invalid map keys and
//! unusable defaults are all collected into one [`Error::Generation`].

mod codegen;
mod config;
mod context;
pub mod descriptor;
mod error;
pub mod fs;
mod protoc;
pub mod schema;

pub use config::Config;
pub use error::{Error, GenerationError};

use std::path::Path;

/// Compile `.proto` files into Rust with default settings.
///
/// # Arguments
/// * `protos` - Paths to `.proto` files to compile
/// * `includes` - Include paths for resolving imports
pub fn compile_protos(protos: &[impl AsRef<Path>], includes: &[impl AsRef<Path>]) -> Result<(), Error> {
    Config::new().compile_protos(protos, includes)
}
