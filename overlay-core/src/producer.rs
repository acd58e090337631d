//! Editor-side model of the canvas.
//!
//! A [`Producer`] keeps the editor's local copy of the elements, folds user
//! edits into it and yields the `replace-state` envelope to put on the wire.
//! Every edit is sent as the whole document. Continuous gestures pass through
//! an [`UpdateThrottle`] first; discrete edits are sent immediately.

use std::time::Instant;

use crate::state::current_timestamp;
use crate::throttle::UpdateThrottle;
use crate::{
    CanvasError, CanvasResult, CanvasState, Element, Envelope, MessageKind, Position, Size,
};

/// A continuous pointer interaction on one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// The element is being moved.
    Drag {
        /// New top-left corner.
        position: Position,
    },
    /// The element is being resized; resizing from a top or left handle
    /// also moves it.
    Resize {
        /// New top-left corner.
        position: Position,
        /// New extent.
        size: Size,
    },
}

impl Gesture {
    fn apply(&self, element: &mut Element) {
        match *self {
            Self::Drag { position } => element.position = position,
            Self::Resize { position, size } => {
                element.position = position;
                element.size = size;
            }
        }
    }
}

/// One pointer event of a gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    /// Element being manipulated.
    pub element_id: String,
    /// The new geometry.
    pub gesture: Gesture,
    /// Set on pointer release.
    pub is_final: bool,
}

impl GestureEvent {
    /// An intermediate drag event.
    #[must_use]
    pub fn drag(element_id: impl Into<String>, position: Position) -> Self {
        Self {
            element_id: element_id.into(),
            gesture: Gesture::Drag { position },
            is_final: false,
        }
    }

    /// An intermediate resize event.
    #[must_use]
    pub fn resize(element_id: impl Into<String>, position: Position, size: Size) -> Self {
        Self {
            element_id: element_id.into(),
            gesture: Gesture::Resize { position, size },
            is_final: false,
        }
    }

    /// Mark as the last event of the gesture.
    #[must_use]
    pub fn finished(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// Local editor state plus the outbound throttle.
#[derive(Debug, Clone, Default)]
pub struct Producer {
    elements: Vec<Element>,
    throttle: UpdateThrottle,
    last_version: u64,
}

impl Producer {
    /// Create a producer with an empty canvas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a producer with a custom throttle.
    #[must_use]
    pub fn with_throttle(throttle: UpdateThrottle) -> Self {
        Self {
            throttle,
            ..Self::default()
        }
    }

    /// The local element sequence.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The gesture throttle.
    #[must_use]
    pub fn throttle(&self) -> &UpdateThrottle {
        &self.throttle
    }

    /// Handle a frame received from the server.
    ///
    /// Snapshots overwrite the local elements; other kinds are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame or its snapshot payload is malformed.
    pub fn receive(&mut self, text: &str) -> CanvasResult<()> {
        let envelope = Envelope::decode(text)?;
        if envelope.kind == MessageKind::Snapshot {
            let state = envelope.state_payload()?;
            self.apply_snapshot(state);
        } else {
            tracing::debug!(kind = %envelope.kind, "Ignoring non-snapshot frame");
        }
        Ok(())
    }

    /// Replace the local elements with a server snapshot.
    pub fn apply_snapshot(&mut self, state: CanvasState) {
        self.elements = state.elements;
    }

    /// Feed one gesture event observed at `now`.
    ///
    /// Returns the envelope to send, or `None` when the event was throttled
    /// or targets an element this producer does not have.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if the state cannot be encoded.
    pub fn on_gesture(
        &mut self,
        event: &GestureEvent,
        now: Instant,
    ) -> CanvasResult<Option<Envelope>> {
        let Some(index) = self.elements.iter().position(|e| e.id == event.element_id) else {
            tracing::debug!(element_id = %event.element_id, "Gesture on unknown element");
            return Ok(None);
        };
        if !self.throttle.admit(now, event.is_final) {
            return Ok(None);
        }
        event.gesture.apply(&mut self.elements[index]);
        self.emit().map(Some)
    }

    /// Append an element and emit the new state.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::DuplicateElement`] if the ID is already used.
    pub fn add_element(&mut self, element: Element) -> CanvasResult<Envelope> {
        if self.elements.iter().any(|e| e.id == element.id) {
            return Err(CanvasError::DuplicateElement(element.id));
        }
        self.elements.push(element);
        self.emit()
    }

    /// Modify one element in place and emit the new state.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has that ID.
    pub fn update_element<F>(&mut self, id: &str, f: F) -> CanvasResult<Envelope>
    where
        F: FnOnce(&mut Element),
    {
        let element = self
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        f(element);
        self.emit()
    }

    /// Remove an element and emit the new state.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] if no element has that ID.
    pub fn remove_element(&mut self, id: &str) -> CanvasResult<Envelope> {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        if self.elements.len() == before {
            return Err(CanvasError::ElementNotFound(id.to_string()));
        }
        self.emit()
    }

    /// Remove every element and emit the empty state.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] if the state cannot be encoded.
    pub fn clear(&mut self) -> CanvasResult<Envelope> {
        self.elements.clear();
        self.emit()
    }

    /// Next version on this producer's clock; never repeats.
    fn next_version(&mut self) -> u64 {
        self.last_version = current_timestamp().max(self.last_version + 1);
        self.last_version
    }

    fn emit(&mut self) -> CanvasResult<Envelope> {
        let state = CanvasState::with_elements(self.next_version(), self.elements.clone());
        Envelope::replace_state(&state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StateDocument;
    use std::time::Duration;

    fn producer_with(elements: Vec<Element>) -> Producer {
        let mut producer = Producer::new();
        producer.apply_snapshot(CanvasState::with_elements(1, elements));
        producer
    }

    fn payload(envelope: &Envelope) -> CanvasState {
        assert_eq!(envelope.kind, MessageKind::ReplaceState);
        envelope.state_payload().expect("payload should parse")
    }

    #[test]
    fn test_drag_folds_into_full_state() {
        let mut producer = producer_with(vec![
            Element::image("a", "/a.png"),
            Element::image("b", "/b.png"),
        ]);

        let envelope = producer
            .on_gesture(&GestureEvent::drag("b", Position::new(50.0, 60.0)), Instant::now())
            .expect("should encode")
            .expect("first event passes");

        let state = payload(&envelope);
        assert_eq!(state.len(), 2);
        assert_eq!(state.elements[0].position, Position::default());
        assert_eq!(state.elements[1].position, Position::new(50.0, 60.0));
    }

    #[test]
    fn test_resize_sets_position_and_size() {
        let mut producer = producer_with(vec![Element::text("t", "hi")]);
        let event =
            GestureEvent::resize("t", Position::new(5.0, 5.0), Size::new(10.0, 20.0)).finished();

        let envelope = producer
            .on_gesture(&event, Instant::now())
            .expect("should encode")
            .expect("final passes");

        let element = &payload(&envelope).elements[0];
        assert_eq!(element.position, Position::new(5.0, 5.0));
        assert_eq!(element.size, Size::new(10.0, 20.0));
    }

    #[test]
    fn test_drag_and_resize_share_one_window() {
        let base = Instant::now();
        let mut producer = producer_with(vec![Element::image("a", "/a.png")]);

        let drag = GestureEvent::drag("a", Position::new(1.0, 1.0));
        let resize = GestureEvent::resize("a", Position::new(1.0, 1.0), Size::new(9.0, 9.0));

        assert!(producer.on_gesture(&drag, base).expect("encode").is_some());
        assert!(producer
            .on_gesture(&resize, base + Duration::from_millis(10))
            .expect("encode")
            .is_none());
    }

    #[test]
    fn test_throttled_event_leaves_local_state_untouched() {
        let base = Instant::now();
        let mut producer = producer_with(vec![Element::image("a", "/a.png")]);

        producer
            .on_gesture(&GestureEvent::drag("a", Position::new(1.0, 1.0)), base)
            .expect("encode");
        let dropped = producer
            .on_gesture(
                &GestureEvent::drag("a", Position::new(2.0, 2.0)),
                base + Duration::from_millis(5),
            )
            .expect("encode");

        assert!(dropped.is_none());
        assert_eq!(producer.elements()[0].position, Position::new(1.0, 1.0));
    }

    #[test]
    fn test_synthetic_drag_bound_and_exact_final_position() {
        let base = Instant::now();
        let mut producer = producer_with(vec![Element::image("img1", "/a.png")]);
        let mut sent = Vec::new();

        for i in 0..100u32 {
            let t = base + Duration::from_millis(u64::from(i) * 10);
            let position = Position::new(f64::from(i), f64::from(i) * 2.0);
            if let Some(envelope) = producer
                .on_gesture(&GestureEvent::drag("img1", position), t)
                .expect("encode")
            {
                sent.push(envelope);
            }
        }

        let release = GestureEvent::drag("img1", Position::new(1234.5, 678.0)).finished();
        let last = producer
            .on_gesture(&release, base + Duration::from_millis(995))
            .expect("encode")
            .expect("final event always sent");
        sent.push(last);

        assert!(sent.len() <= 35, "sent {}", sent.len());
        let final_state = payload(sent.last().expect("at least one"));
        assert_eq!(final_state.elements[0].position, Position::new(1234.5, 678.0));
    }

    #[test]
    fn test_versions_strictly_increase() {
        let mut producer = producer_with(vec![]);
        let first = payload(&producer.add_element(Element::image("a", "/a.png")).expect("add"));
        let second = payload(&producer.add_element(Element::image("b", "/b.png")).expect("add"));
        let third = payload(&producer.clear().expect("clear"));
        assert!(second.version > first.version);
        assert!(third.version > second.version);
    }

    #[test]
    fn test_discrete_edits_are_not_throttled() {
        let mut producer = producer_with(vec![]);
        for i in 0..10 {
            producer
                .add_element(Element::image(format!("e{i}"), "/a.png"))
                .expect("add never throttled");
        }
        assert_eq!(producer.elements().len(), 10);
        assert_eq!(producer.throttle().admitted(), 0);
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let mut producer = producer_with(vec![Element::image("a", "/a.png")]);
        assert!(matches!(
            producer.add_element(Element::text("a", "dup")),
            Err(CanvasError::DuplicateElement(_))
        ));
    }

    #[test]
    fn test_remove_and_update() {
        let mut producer = producer_with(vec![
            Element::image("a", "/a.png"),
            Element::text("t", "hi"),
        ]);

        let state = payload(&producer.update_element("a", |e| e.opacity = 0.5).expect("update"));
        assert!((state.elements[0].opacity - 0.5).abs() < f64::EPSILON);

        let state = payload(&producer.remove_element("a").expect("remove"));
        assert_eq!(state.len(), 1);
        assert_eq!(state.elements[0].id, "t");

        assert!(matches!(
            producer.remove_element("a"),
            Err(CanvasError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_gesture_on_unknown_element_sends_nothing() {
        let mut producer = producer_with(vec![]);
        let release = GestureEvent::drag("ghost", Position::new(1.0, 1.0)).finished();
        let out = producer
            .on_gesture(&release, Instant::now())
            .expect("encode");
        assert!(out.is_none());
    }

    #[test]
    fn test_receive_snapshot_overwrites_local_state() {
        let mut producer = producer_with(vec![Element::image("mine", "/a.png")]);
        let remote = CanvasState::with_elements(9, vec![Element::text("theirs", "hola")]);
        let frame = StateDocument::from_state(&remote)
            .and_then(|d| Envelope::snapshot(&d))
            .and_then(|e| e.encode())
            .expect("encode");

        producer.receive(&frame).expect("should apply");
        assert_eq!(producer.elements().len(), 1);
        assert_eq!(producer.elements()[0].id, "theirs");

        producer.receive(r#"{"kind":"heartbeat-pong"}"#).expect("ignored");
        assert!(producer.receive("garbage").is_err());
    }
}
