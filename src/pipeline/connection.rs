//! The connection primitive: the single choke point for wiring nodes.
//!
//! Every producer → consumer wire in the crate is created by [`connect`] (or
//! [`tee`]) and removed by [`disconnect`]. Both delegate the data flow to the
//! stream primitive's native pipe/unpipe and then update the bookkeeping the
//! rest of the pipeline layer relies on.
//!
//! # Contract of `connect`
//!
//! After the native pipe succeeds, in the same call and before any data can
//! move:
//!
//! 1. The first default error listener on the consumer is removed. The native
//!    pipe attaches one per wire; errors are instead carried along the tracked
//!    fanout to the pipeline's sinks. Exactly one listener is removed per
//!    connection, never more.
//! 2. The consumer is appended to the producer's fanout.
//! 3. The producer's chain view, if any, is marked dirty.
//! 4. The consumer's chain view, if any, is marked dirty.
//!
//! Failures of the native operation are returned unchanged and leave the
//! bookkeeping untouched.

use crate::convert::Endpoint;
use crate::error::{StreamError, StreamResult};
use crate::stream::StreamRef;

/// Options for [`connect`] and [`tee`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectOptions {
    /// Hand foreign targets to the primitive unconverted.
    pub no_convert: bool,
}

impl ConnectOptions {
    pub fn no_convert() -> Self {
        Self { no_convert: true }
    }
}

fn resolve(target: Endpoint, options: ConnectOptions) -> StreamResult<StreamRef> {
    match target {
        Endpoint::Node(node) => Ok(node),
        Endpoint::Foreign(convert) if !options.no_convert => Ok(convert()),
        // The primitive cannot pipe into something that is not a stream node.
        Endpoint::Foreign(_) => Err(StreamError::NotAStream),
    }
}

/// Wire `producer` to `target` and return the consumer.
pub fn connect(
    producer: &StreamRef,
    target: impl Into<Endpoint>,
    options: ConnectOptions,
) -> StreamResult<StreamRef> {
    let consumer = resolve(target.into(), options)?;
    producer.core().native_pipe(&consumer)?;

    consumer.core().remove_first_default_error_listener();
    producer.core().push_downstream(consumer.clone());
    producer.core().mark_chain_dirty();
    consumer.core().mark_chain_dirty();

    tracing::debug!(
        "Connected {} ({}) -> {} ({})",
        producer.core().name(),
        producer.core().id(),
        consumer.core().name(),
        consumer.core().id()
    );
    Ok(consumer)
}

/// Remove the wire to `consumer`, or every wire from `producer` when `None`.
///
/// Only the producer's chain view is marked dirty: a consumer that was part
/// of that chain shares the same view, and any other consumer never had one
/// covering this wire.
pub fn disconnect(producer: &StreamRef, consumer: Option<&StreamRef>) -> StreamResult<()> {
    producer.core().native_unpipe(consumer)?;

    producer.core().remove_downstream(consumer);
    producer.core().mark_chain_dirty();

    match consumer {
        Some(c) => tracing::debug!("Disconnected {} -> {}", producer.core().id(), c.core().id()),
        None => tracing::debug!("Disconnected all consumers of {}", producer.core().id()),
    }
    Ok(())
}

/// Like [`connect`], but return the producer so chaining continues on the
/// original stream rather than the new branch.
pub fn tee(
    producer: &StreamRef,
    target: impl Into<Endpoint>,
    options: ConnectOptions,
) -> StreamResult<StreamRef> {
    connect(producer, target, options)?;
    Ok(producer.clone())
}
