use alloc::vec::Vec;

use impression_tracker::ImpressionListener;

/// One callback received from an [`impression_tracker::ImpressionTracker`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImpressionEvent {
    SegmentSeen { position: usize },
    EntitySeen { parent: usize, child: usize },
    SegmentVisibility { position: usize, percentage: f64 },
    EntityVisibility { parent: usize, child: usize, percentage: f64 },
}

/// A listener that records every callback in order.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    events: Vec<ImpressionEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ImpressionEvent] {
        &self.events
    }

    /// Returns the recorded events and starts over.
    pub fn take(&mut self) -> Vec<ImpressionEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Positions of segments reported as seen, in callback order.
    pub fn segments_seen(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                ImpressionEvent::SegmentSeen { position } => Some(position),
                _ => None,
            })
            .collect()
    }

    /// `(parent, child)` pairs of entities reported as seen, in callback order.
    pub fn entities_seen(&self) -> Vec<(usize, usize)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                ImpressionEvent::EntitySeen { parent, child } => Some((parent, child)),
                _ => None,
            })
            .collect()
    }

    /// Every visibility reported for the segment at `position`, oldest first.
    pub fn segment_visibility(&self, position: usize) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                ImpressionEvent::SegmentVisibility {
                    position: p,
                    percentage,
                } if p == position => Some(percentage),
                _ => None,
            })
            .collect()
    }

    /// Every visibility reported for one entity, oldest first.
    pub fn entity_visibility(&self, parent: usize, child: usize) -> Vec<f64> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                ImpressionEvent::EntityVisibility {
                    parent: p,
                    child: c,
                    percentage,
                } if p == parent && c == child => Some(percentage),
                _ => None,
            })
            .collect()
    }
}

impl<V> ImpressionListener<V> for EventRecorder {
    fn on_vertical_item(&mut self, position: usize, _view: Option<V>) {
        self.events.push(ImpressionEvent::SegmentSeen { position });
    }

    fn on_horizontal_item(&mut self, parent_position: usize, child_position: usize) {
        self.events.push(ImpressionEvent::EntitySeen {
            parent: parent_position,
            child: child_position,
        });
    }

    fn on_vertical_item_visibility(&mut self, visibility: f64, position: usize) {
        self.events.push(ImpressionEvent::SegmentVisibility {
            position,
            percentage: visibility,
        });
    }

    fn on_horizontal_item_visibility(
        &mut self,
        visibility: f64,
        parent_position: usize,
        child_position: usize,
    ) {
        self.events.push(ImpressionEvent::EntityVisibility {
            parent: parent_position,
            child: child_position,
            percentage: visibility,
        });
    }
}
