//! A headless engine that tracks how much of each list item is visible.
//!
//! For a scrollable, virtualized vertical list (and horizontal lists nested inside its items)
//! the engine computes, on each relevant scroll event, what percentage of every realized item
//! lies inside its container's visible bounds. It reports that raw percentage on every scan,
//! and reports each item once per tracking session when it first reaches a configurable
//! threshold.
//!
//! It is UI-agnostic. A host UI layer is expected to provide, via [`ScrollHost`]:
//! - the visible rect of each scroll container and the range of laid-out positions
//! - per-item rects and measured sizes
//! - listener registration, and forwarding of scroll-state / scroll-delta / layout callbacks
//!
//! For host-side utilities (list layout model, recycling host simulator, event recorder), see
//! the `impression-tracker-adapter` crate.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod geometry;
mod host;
mod key;
mod listener;
mod nested;
mod options;
mod scan;
mod tracker;
mod types;


pub use error::TrackerError;
pub use geometry::{item_visible_percentage, visible_percentage};
pub use host::ScrollHost;
pub use listener::ImpressionListener;
pub use options::{SegmentKey, SegmentKeyFn, TrackerOptions};
pub use scan::{for_each_visibility, scan_visibility};
pub use tracker::ImpressionTracker;
pub use types::{
    Axis, ItemContent, ItemGeometry, LaidOutRange, ListenerId, Rect, ScrollState, Size,
    TrackingStatus, VisibilityRecord,
};

#[doc(hidden)]
pub use key::TrackerKey;
