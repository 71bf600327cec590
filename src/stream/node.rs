//! The stream-node capability interface.
//!
//! Every producer and consumer implements [`StreamNode`]. The connection layer
//! works purely against this trait and never against a concrete node type.

use crate::stream::chunk::Chunk;
use crate::stream::core::NodeCore;
use std::rc::Rc;

/// Capability set shared by all pipeline participants.
pub trait StreamNode {
    /// Shared bookkeeping: buffer, listeners, routes, fanout and chain view.
    fn core(&self) -> &NodeCore;

    /// Capability marker. Foreign values never implement this trait.
    fn is_stream_node(&self) -> bool {
        true
    }

    /// Whether this node can act as a producer.
    fn is_readable(&self) -> bool;

    /// Whether this node can act as a consumer.
    fn is_writable(&self) -> bool;

    /// Deliver a chunk to the writable half.
    fn write(&self, chunk: Chunk);

    /// Signal that no more chunks will be written.
    fn end(&self);

    /// Called when the readable buffer has run dry while data is flowing.
    fn on_read(&self) {}
}

/// Shared handle to any stream node.
pub type StreamRef = Rc<dyn StreamNode>;

/// Identity comparison between two node handles.
#[inline]
pub fn same_node(a: &StreamRef, b: &StreamRef) -> bool {
    a.core().id() == b.core().id()
}

impl std::fmt::Debug for dyn StreamNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.core(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Source;

    #[test]
    fn test_node_handles_debug_through_core() {
        let node: StreamRef = Source::new("numbers", true);
        let rendered = format!("{:?}", node);
        assert!(rendered.starts_with("NodeCore"));
        assert!(rendered.contains("numbers"));
    }

    #[test]
    fn test_unwrap_err_on_node_results() {
        let result: crate::error::StreamResult<StreamRef> =
            Err(crate::error::StreamError::NotAStream);
        assert!(matches!(result.unwrap_err(), crate::error::StreamError::NotAStream));
    }
}
