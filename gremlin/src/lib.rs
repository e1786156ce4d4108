//! Runtime for protobuf code generated by `gremlin-build`.
//!
//! Generated messages come in pairs: an owned, mutable struct implementing
//! [`Message`] and a lazy reader implementing [`MessageReader`]. Unmarshalling
//! only scans the input and records where each field lives. Fields are decoded
//! the first time they are accessed and then cached, and nested readers are
//! views into the parent's buffer.
//!
//! ```ignore
//! let reader = UserReader::unmarshal(bytes)?;
//! let city = reader.get_profile()?.get_address()?.get_city()?;
//! let user: User = reader.materialize()?;
//! let bytes = user.marshal();
//! ```

pub mod codec;
pub mod error;
pub mod leb128;
pub mod reader;
pub mod wire;

mod util;

pub use bytes;

pub use codec::{Message, MessageReader};
pub use error::DecodeError;
