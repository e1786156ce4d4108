//! Code generated by `build.rs` from the conformance schemas.

#![allow(clippy::all)]

/// Default settings: enum numbers pass through unchecked.
pub mod proto {
    pub mod common {
        include!(concat!(env!("OUT_DIR"), "/lenient/common.rs"));
    }
    pub mod example {
        include!(concat!(env!("OUT_DIR"), "/lenient/example.rs"));
    }
    pub mod legacy {
        include!(concat!(env!("OUT_DIR"), "/lenient/legacy.rs"));
    }
}

/// Generated with strict enum checking.
pub mod strict {
    pub mod paint {
        include!(concat!(env!("OUT_DIR"), "/strict/paint.rs"));
    }
}
