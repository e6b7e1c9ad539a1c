//! # Frame Publishing
//!
//! After the end-of-frame barrier the coordinator publishes one immutable
//! [`FrameSnapshot`] of the frame's active entities to every registered
//! sink. Cached entities are omitted; downstream collaborators keep using
//! the last snapshot that contained them.
//!
//! [`ChannelSink`] is the standard sink: a bounded crossbeam channel into a
//! render/net thread. Publishing never blocks the frame; if the consumer
//! falls behind, the snapshot is dropped and the consumer catches up on the
//! next one.

use crossbeam_channel::{Receiver, Sender, TrySendError};

use veldra_core::EntityId;
use veldra_shared::Vec2;

/// One active entity's published state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PublishedEntity {
    /// The entity.
    pub id: EntityId,
    /// Its position after this frame's tasks ran.
    pub position: Vec2,
}

/// Immutable view of one completed frame.
#[derive(Clone, Debug, Default)]
pub struct FrameSnapshot {
    /// The frame that produced this snapshot.
    pub frame: u64,
    /// Every entity stepped this frame.
    pub entities: Vec<PublishedEntity>,
}

/// Receives each completed frame's snapshot.
pub trait FrameSink: Send {
    /// Delivers a snapshot. Must not block the frame.
    fn publish(&self, snapshot: &FrameSnapshot);
}

/// Bounded-channel sink for cross-thread consumers.
pub struct ChannelSink {
    sender: Sender<FrameSnapshot>,
}

impl ChannelSink {
    /// Creates a sink and its consumer end with the given backlog capacity.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<FrameSnapshot>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl FrameSink for ChannelSink {
    fn publish(&self, snapshot: &FrameSnapshot) {
        match self.sender.try_send(snapshot.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::debug!(frame = dropped.frame, "frame sink full, snapshot dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!(frame = snapshot.frame, "frame sink disconnected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(frame: u64) -> FrameSnapshot {
        FrameSnapshot {
            frame,
            entities: vec![PublishedEntity {
                id: EntityId::new(0, 0),
                position: Vec2::new(1.0, 2.0),
            }],
        }
    }

    #[test]
    fn test_channel_sink_delivers() {
        let (sink, receiver) = ChannelSink::bounded(4);
        sink.publish(&snapshot(7));

        let received = receiver.recv().unwrap();
        assert_eq!(received.frame, 7);
        assert_eq!(received.entities.len(), 1);
    }

    #[test]
    fn test_full_sink_drops_without_blocking() {
        let (sink, receiver) = ChannelSink::bounded(1);
        sink.publish(&snapshot(0));
        sink.publish(&snapshot(1)); // dropped, must not block

        assert_eq!(receiver.recv().unwrap().frame, 0);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_sink_is_harmless() {
        let (sink, receiver) = ChannelSink::bounded(1);
        drop(receiver);
        sink.publish(&snapshot(0));
    }
}
