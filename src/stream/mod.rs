//! Push-based stream primitive.
//!
//! Nodes buffer pushed chunks, deliver them to piped consumers when flowing,
//! signal end of stream, and report a single completion outcome. All
//! delivery runs on the cooperative [`scheduler`].
//!
//! # Node kinds
//!
//! ```text
//! [Source] ──► [Transform] ──► [Transform] ──► [Sink]
//!    readable    writable+readable              writable
//! ```
//!
//! The composition layer in [`crate::pipeline`] builds on these through the
//! [`StreamNode`] trait only.

pub mod chunk;
pub mod core;
pub mod done;
pub mod emitter;
pub mod id;
mod inbox;
pub mod node;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod transform;

pub use chunk::{Chunk, Encoding, Mode};
pub use self::core::NodeCore;
pub use done::Done;
pub use emitter::ErrorListenerKind;
pub use id::{ListenerId, NodeId};
pub use node::{same_node, StreamNode, StreamRef};
pub use sink::{Sink, SinkLogic};
pub use source::{Pull, Source};
pub use transform::{Outlet, Transform, TransformLogic};
