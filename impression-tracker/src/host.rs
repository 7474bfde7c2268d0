use core::fmt;

use crate::{Axis, ItemContent, LaidOutRange, ListenerId, Rect, Size, TrackerKey};

/// The UI layer the tracker observes.
///
/// The tracker never holds UI objects. It reads geometry through this trait while handling a
/// scroll callback, and it registers interest in scroll events by handing the host a
/// [`ListenerId`]. The host keeps that registration and forwards events for the container to
/// [`crate::ImpressionTracker::on_scroll_state_changed`],
/// [`crate::ImpressionTracker::on_scrolled`] and
/// [`crate::ImpressionTracker::on_layout_complete`].
///
/// All geometry is only valid for the duration of the callback it is read in.
pub trait ScrollHost {
    /// Handle for a scrollable container. View recycling may reuse the same handle for a
    /// different logical item.
    type Container: Copy + fmt::Debug + TrackerKey;
    /// Opaque handle to a realized item view, passed through to the listener untouched.
    type View;
    /// A fault raised while reading one item's geometry.
    type Error: fmt::Display;

    /// Visible bounds of `container`, or `None` when it has nothing on screen.
    fn viewport_rect(&self, container: Self::Container) -> Option<Rect>;

    /// Scroll axis of the container's layout, or `None` when it has no layout strategy.
    fn layout_orientation(&self, container: Self::Container) -> Option<Axis>;

    /// Positions currently laid out, or `None` when layout has not run yet.
    fn laid_out_range(&self, container: Self::Container) -> Option<LaidOutRange>;

    /// Current rect of the item at `position`, or `None` when no view is realized for it.
    fn item_rect(
        &self,
        container: Self::Container,
        position: usize,
    ) -> Result<Option<Rect>, Self::Error>;

    /// Measured size of the item at `position`.
    ///
    /// Defaults to the size of [`ScrollHost::item_rect`].
    fn measured_size(
        &self,
        container: Self::Container,
        position: usize,
    ) -> Result<Option<Size>, Self::Error> {
        Ok(self.item_rect(container, position)?.map(|r| r.size()))
    }

    fn realized_view_at(&self, container: Self::Container, position: usize) -> Option<Self::View>;

    /// Whether the item at `position` owns a nested scrollable container.
    fn item_content(
        &self,
        _container: Self::Container,
        _position: usize,
    ) -> ItemContent<Self::Container> {
        ItemContent::Leaf
    }

    fn add_scroll_listener(&mut self, container: Self::Container, listener: ListenerId);

    fn remove_scroll_listener(&mut self, container: Self::Container, listener: ListenerId);

    /// Drops every scroll listener registered on `container`, including ones left behind by a
    /// previous binding of a recycled view.
    fn clear_scroll_listeners(&mut self, container: Self::Container);

    /// Asks the host to call `on_layout_complete` for `container` once its next layout pass has
    /// been committed.
    fn request_layout_pass(&mut self, _container: Self::Container) {}
}
