//! # streamchain: composable push-based stream pipelines
//!
//! A composition layer over a small push-based stream primitive. Pipelines
//! are built by chaining constructors on a producer; every wire goes through
//! one connection primitive that tracks each producer's downstream fanout and
//! invalidates cached chain views when the wiring changes.
//!
//! ## Architecture
//!
//! - **Stream**: the primitive. Nodes buffer, flow, end and complete on a
//!   cooperative single-threaded scheduler
//! - **Convert**: adapts collections, text, readers and writers into nodes
//! - **Pipeline**: connection primitive, fanout tracking, chain views and the
//!   [`StreamExt`] convenience constructors
//! - **Config**: TOML settings for the `streamchain` binary
//!
//! ## Example
//!
//! ```ignore
//! use streamchain::{convert, StreamExt};
//!
//! convert("a\nb\nc")
//!     .split(None)?
//!     .into_array(|res| println!("{:?}", res))?;
//!
//! // Nothing moves until the scheduler runs.
//! streamchain::run();
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod stream;

// Re-export commonly used types
pub use config::StreamConfig;
pub use convert::{convert, Endpoint, IntoStream, Reader, Writer};
pub use error::{ResultExt, StreamError, StreamResult};
pub use pipeline::{
    chain_view, connect, disconnect, tee, BatchSize, ChainView, ConnectOptions, Delimiter,
    FileSinkOptions, StageOptions, StreamExt, ThroughFn, Verdict,
};
pub use stream::scheduler::run;
pub use stream::{Chunk, Done, Encoding, Mode, NodeId, StreamNode, StreamRef};
