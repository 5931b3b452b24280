//! # frugal-json
//!
//! Allocation-frugal JSON document engine. Parsing is zero-copy: every
//! scalar in a parsed tree is a span into the caller's input. Building a
//! tree encodes values into a per-document arena backed by a pool of
//! fixed-size chunks, so steady-state construction rarely reaches the
//! system allocator.
//!
//! ```
//! use frugal_json::{Node, try_parse};
//!
//! let root = try_parse(br#"{"a":1,"b":[true,null,"x"]}"#).unwrap();
//! assert_eq!(root.get("a").and_then(|a| a.int32()), Some(1));
//!
//! let mut built = Node::default();
//! built.make_object();
//! assert!(built.write_kv("k", &42));
//! assert_eq!(built.to_string(), r#"{"k":42}"#);
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod document;
pub mod error;
pub mod flags;
pub mod memory;

pub use config::{EngineConfig, ParseConfig, PoolConfig};
pub use document::{
    Children, DepthTracker, Encode, Kind, Node, Null, ParseError, ParseErrorKind, ParseStats,
    Parser, Span, parse, parse_prefix, try_parse,
};
pub use error::{Error, Result};
pub use flags::NodeFlags;
pub use memory::{
    Arena, ArenaSlice, BufferChain, ChainWriter, Chunk, CursorBuffer, Fill, PoolAllocator,
    PoolStats, SharedArena, SharedBuffer, default_pool,
};

/// Re-export commonly used types
pub mod prelude {
    pub use super::{
        Arena, Encode, Error, Kind, Node, Null, ParseError, Parser, PoolAllocator, Result,
        SharedArena, parse, try_parse, write_kv, write_vals,
    };
}
