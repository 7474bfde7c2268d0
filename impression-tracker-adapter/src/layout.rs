use alloc::vec::Vec;

use impression_tracker::{Axis, LaidOutRange, Rect, Size};

/// A headless model of one linear scroll container.
///
/// Items are stacked along `orientation` with the given main-axis extents and span the full
/// cross axis of the viewport. Only items that overlap the viewport are realized.
#[derive(Clone, Debug)]
pub struct ListLayout {
    orientation: Axis,
    left: i32,
    top: i32,
    viewport: Size,
    extents: Vec<u32>,
    starts: Vec<u64>, // starts[i] = sum(extents[..i])
    scroll_offset: u64,
    laid_out: bool,
}

impl ListLayout {
    pub fn new(orientation: Axis, viewport: Size, extents: Vec<u32>) -> Self {
        let mut layout = Self {
            orientation,
            left: 0,
            top: 0,
            viewport,
            extents: Vec::new(),
            starts: Vec::new(),
            scroll_offset: 0,
            laid_out: true,
        };
        layout.set_extents(extents);
        layout
    }

    /// `count` items of the same main-axis `extent`.
    pub fn uniform(orientation: Axis, viewport: Size, count: usize, extent: u32) -> Self {
        Self::new(orientation, viewport, alloc::vec![extent; count])
    }

    pub fn orientation(&self) -> Axis {
        self.orientation
    }

    pub fn count(&self) -> usize {
        self.extents.len()
    }

    pub fn extent(&self, index: usize) -> Option<u32> {
        self.extents.get(index).copied()
    }

    /// Replaces the item extents, keeping the scroll offset within bounds.
    pub fn set_extents(&mut self, extents: Vec<u32>) {
        let mut starts = Vec::with_capacity(extents.len());
        let mut acc = 0u64;
        for &e in &extents {
            starts.push(acc);
            acc = acc.saturating_add(u64::from(e));
        }
        self.extents = extents;
        self.starts = starts;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
    }

    pub fn total_extent(&self) -> u64 {
        match (self.starts.last(), self.extents.last()) {
            (Some(&s), Some(&e)) => s.saturating_add(u64::from(e)),
            _ => 0,
        }
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
    }

    fn viewport_main(&self) -> u32 {
        self.viewport.extent(self.orientation)
    }

    /// Moves the container's top-left corner in screen space.
    pub fn set_origin(&mut self, left: i32, top: i32) {
        self.left = left;
        self.top = top;
    }

    /// The container's own rect in screen space.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.left, self.top, self.viewport)
    }

    pub fn is_laid_out(&self) -> bool {
        self.laid_out
    }

    pub fn set_laid_out(&mut self, laid_out: bool) {
        self.laid_out = laid_out;
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.total_extent()
            .saturating_sub(u64::from(self.viewport_main()))
    }

    pub fn scroll_to(&mut self, offset: u64) {
        self.scroll_offset = offset.min(self.max_scroll_offset());
    }

    /// Scrolls by `delta` and returns the distance actually consumed.
    pub fn scroll_by(&mut self, delta: i64) -> i64 {
        let prev = self.scroll_offset;
        let target = if delta >= 0 {
            prev.saturating_add(delta.unsigned_abs())
        } else {
            prev.saturating_sub(delta.unsigned_abs())
        };
        self.scroll_to(target);
        self.scroll_offset as i64 - prev as i64
    }

    /// Items overlapping the viewport, or `None` when nothing is laid out.
    pub fn visible_range(&self) -> Option<LaidOutRange> {
        let view = u64::from(self.viewport_main());
        let total = self.total_extent();
        if !self.laid_out || view == 0 || self.scroll_offset >= total {
            return None;
        }
        let end_inclusive = self
            .scroll_offset
            .saturating_add(view)
            .min(total)
            .saturating_sub(1);
        let first = self.index_at(self.scroll_offset);
        let last = self.index_at(end_inclusive);
        Some(LaidOutRange::new(first, last))
    }

    /// Screen rect of a realized item.
    pub fn item_rect(&self, index: usize) -> Option<Rect> {
        if !self.visible_range()?.contains(index) {
            return None;
        }
        let start = *self.starts.get(index)?;
        let extent = self.extents[index];
        let shift = i32::try_from(start as i64 - self.scroll_offset as i64).ok()?;
        let rect = match self.orientation {
            Axis::Vertical => Rect::from_origin_size(
                self.left,
                self.top.saturating_add(shift),
                Size::new(self.viewport.width, extent),
            ),
            Axis::Horizontal => Rect::from_origin_size(
                self.left.saturating_add(shift),
                self.top,
                Size::new(extent, self.viewport.height),
            ),
        };
        Some(rect)
    }

    // Last item whose start is <= offset.
    fn index_at(&self, offset: u64) -> usize {
        self.starts
            .partition_point(|&s| s <= offset)
            .saturating_sub(1)
    }
}
