//! Pipeline composition on top of the stream primitive.
//!
//! Stages are wired producer → consumer through a single connection
//! primitive, which keeps each producer's fanout list and invalidates cached
//! chain views whenever the wiring changes.
//!
//! # Architecture
//!
//! ```text
//! [Source] ──► [Split] ──► [Through] ──► [IntoArray]
//!                                   └──► [IntoFile]
//! ```
//!
//! - [`connection`]: `connect`, `disconnect` and `tee`, the only code that
//!   mutates fanout.
//! - [`chain`]: cached topology views with a dirty flag. Replacing a view
//!   marks the displaced one dirty.
//! - [`compose`]: the [`StreamExt`] convenience constructors.
//! - [`nodes`]: the concrete stage logic.

pub mod chain;
pub mod compose;
pub mod connection;
pub mod nodes;

pub use chain::{chain_view, ChainView};
pub use compose::{stage_mode, StageOptions, StreamExt};
pub use connection::{connect, disconnect, tee, ConnectOptions};
pub use nodes::{
    BatchSize, Delimiter, FileSinkOptions, FsSinkFactory, ThroughFn, Verdict, WriteSinkFactory,
};
