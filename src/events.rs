//! Typed editor event bus
//!
//! The viewport talks to the surrounding editor chrome through two queues:
//! inbound [`SceneRequest`]s (add a primitive, add a light, insert a loaded
//! model) and outbound [`EditorEvent`]s (selection changes, removals). Both
//! sides are enums rather than string topics so a bad topic name is a compile
//! error instead of a silently dead subscription.

use std::collections::VecDeque;

use crate::gfx::{
    geometry::PrimitiveKind,
    scene::{LightKind, NodeId, SceneNode},
};

/// Inbound request for the viewport to mutate the scene.
#[derive(Debug)]
pub enum SceneRequest {
    AddPrimitive(PrimitiveKind),
    AddLight(LightKind),
    /// An externally loaded node, ready to insert.
    ModelLoaded(Box<SceneNode>),
}

/// Outbound notification published by the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorEvent {
    MeshSelected(NodeId),
    LightSelected(NodeId),
    ObjectRemoved,
}

/// FIFO event bus connecting the viewport and the editor chrome.
///
/// Single-threaded: requests are drained at the top of each frame, events
/// are drained after input handling. Order is preserved on both sides.
#[derive(Debug, Default)]
pub struct EventBus {
    requests: VecDeque<SceneRequest>,
    events: VecDeque<EditorEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request for the viewport.
    pub fn submit(&mut self, request: SceneRequest) {
        self.requests.push_back(request);
    }

    /// Takes all pending requests in submission order.
    pub fn drain_requests(&mut self) -> Vec<SceneRequest> {
        self.requests.drain(..).collect()
    }

    /// Publishes an event to the editor chrome.
    pub fn publish(&mut self, event: EditorEvent) {
        self.events.push_back(event);
    }

    /// Takes all pending events in publish order.
    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain(..).collect()
    }

    /// Pending event count, mostly useful in tests.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_drain_in_publish_order() {
        let mut bus = EventBus::new();
        bus.publish(EditorEvent::MeshSelected(NodeId(3)));
        bus.publish(EditorEvent::ObjectRemoved);
        bus.publish(EditorEvent::LightSelected(NodeId(7)));

        let events = bus.drain_events();
        assert_eq!(
            events,
            vec![
                EditorEvent::MeshSelected(NodeId(3)),
                EditorEvent::ObjectRemoved,
                EditorEvent::LightSelected(NodeId(7)),
            ]
        );
        assert!(bus.drain_events().is_empty());
    }

    #[test]
    fn test_requests_drain_in_submission_order() {
        let mut bus = EventBus::new();
        bus.submit(SceneRequest::AddPrimitive(PrimitiveKind::Torus));
        bus.submit(SceneRequest::AddLight(LightKind::Spot));

        let requests = bus.drain_requests();
        assert_eq!(requests.len(), 2);
        assert!(matches!(
            requests[0],
            SceneRequest::AddPrimitive(PrimitiveKind::Torus)
        ));
        assert!(matches!(requests[1], SceneRequest::AddLight(LightKind::Spot)));
    }
}
