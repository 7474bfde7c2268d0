// Example: implementing `ScrollHost` for your own list and running the tracker against it.
use impression_tracker::{
    Axis, ImpressionListener, ImpressionTracker, LaidOutRange, ListenerId, Rect, ScrollHost,
    ScrollState, TrackerOptions,
};

/// Fixed-height rows over a scrollable viewport. One container only.
struct Rows {
    row_height: i32,
    count: usize,
    viewport_height: i32,
    offset: i32,
    listener: Option<ListenerId>,
}

impl Rows {
    fn range(&self) -> Option<LaidOutRange> {
        if self.count == 0 {
            return None;
        }
        let first = (self.offset / self.row_height) as usize;
        let last = ((self.offset + self.viewport_height - 1) / self.row_height) as usize;
        Some(LaidOutRange::new(first, last.min(self.count - 1)))
    }
}

impl ScrollHost for Rows {
    type Container = ();
    type View = usize;
    type Error = core::convert::Infallible;

    fn viewport_rect(&self, _: ()) -> Option<Rect> {
        Some(Rect::new(0, 0, 320, self.viewport_height))
    }

    fn layout_orientation(&self, _: ()) -> Option<Axis> {
        Some(Axis::Vertical)
    }

    fn laid_out_range(&self, _: ()) -> Option<LaidOutRange> {
        self.range()
    }

    fn item_rect(&self, _: (), position: usize) -> Result<Option<Rect>, Self::Error> {
        if !self.range().is_some_and(|r| r.contains(position)) {
            return Ok(None);
        }
        let top = position as i32 * self.row_height - self.offset;
        Ok(Some(Rect::new(0, top, 320, top + self.row_height)))
    }

    fn realized_view_at(&self, _: (), position: usize) -> Option<usize> {
        Some(position)
    }

    fn add_scroll_listener(&mut self, _: (), listener: ListenerId) {
        self.listener = Some(listener);
    }

    fn remove_scroll_listener(&mut self, _: (), listener: ListenerId) {
        if self.listener == Some(listener) {
            self.listener = None;
        }
    }

    fn clear_scroll_listeners(&mut self, _: ()) {
        self.listener = None;
    }
}

struct Print;

impl ImpressionListener<usize> for Print {
    fn on_vertical_item(&mut self, position: usize, view: Option<usize>) {
        println!("seen: row {position} (view {view:?})");
    }
}

fn main() -> Result<(), impression_tracker::TrackerError> {
    let mut rows = Rows {
        row_height: 100,
        count: 100,
        viewport_height: 450,
        offset: 0,
        listener: None,
    };
    let mut tracker = ImpressionTracker::new((), TrackerOptions::new(50), Print)?;
    tracker.start(&mut rows)?;

    // The host would normally call these from its own scroll callbacks.
    tracker.on_layout_complete(&mut rows, ());
    for _ in 0..5 {
        rows.offset += 130;
        tracker.on_scroll_state_changed(&mut rows, (), ScrollState::Dragging);
        tracker.on_scrolled(&mut rows, (), 0, 130);
        tracker.on_scroll_state_changed(&mut rows, (), ScrollState::Idle);
    }

    tracker.stop(&mut rows);
    println!("listener attached after stop: {}", rows.listener.is_some());
    Ok(())
}
