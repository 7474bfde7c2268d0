use core::sync::atomic::{AtomicUsize, Ordering};

/// The axis a container scrolls along, which is also the axis visibility is measured on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Measures heights (an outer list of segments).
    Vertical,
    /// Measures widths (a nested list of entities).
    Horizontal,
}

/// Axis-aligned rectangle in a shared screen coordinate space.
///
/// Edges are half-open: a rect with `left == right` has zero width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Builds a rect from its top-left corner and size.
    pub fn from_origin_size(left: i32, top: i32, size: Size) -> Self {
        Self {
            left,
            top,
            right: left.saturating_add_unsigned(size.width),
            bottom: top.saturating_add_unsigned(size.height),
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top).max(0) as u32
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn extent(&self, axis: Axis) -> u32 {
        self.size().extent(axis)
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Returns the overlapping area, or `None` when the rects do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let out = Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if out.is_empty() { None } else { Some(out) }
    }
}

/// Measured size of an item view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn extent(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Vertical => self.height,
            Axis::Horizontal => self.width,
        }
    }
}

/// Scroll state reported by the host, mirroring the usual idle/drag/fling cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollState {
    #[default]
    Idle,
    Dragging,
    Settling,
}

/// Inclusive range of positions the host currently has laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaidOutRange {
    pub first: usize,
    pub last: usize, // inclusive
}

impl LaidOutRange {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.first <= position && position <= self.last
    }
}

/// Geometry of one realized item, as read from the host during a single scan.
///
/// Never cached: positions shift as views are recycled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemGeometry {
    pub position: usize,
    pub rect: Rect,
    pub measured: Size,
}

/// Visibility of one item at the time of a scan.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibilityRecord {
    pub position: usize,
    /// Percentage in `[0, 100]`.
    pub percentage: f64,
}

/// What an outer item holds, as far as nested tracking is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemContent<C> {
    Leaf,
    Nested(C),
}

/// Identity under which a tracker registers its scroll listeners with the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

static NEXT_LISTENER_ID: AtomicUsize = AtomicUsize::new(1);

impl ListenerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

/// Lifecycle of a tracker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrackingStatus {
    #[default]
    Stopped,
    Tracking,
}
