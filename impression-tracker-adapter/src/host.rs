use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::fmt;

use impression_tracker::{
    Axis, ImpressionListener, ImpressionTracker, ItemContent, LaidOutRange, ListenerId, Rect,
    ScrollHost, ScrollState, Size, TrackerKey,
};

use crate::ListLayout;

/// Handle of a simulated scroll container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerId(pub u32);

impl ContainerId {
    /// The outer vertical list. Child containers are numbered from 1.
    pub const OUTER: ContainerId = ContainerId(0);
}

/// Handle of a realized item view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewHandle {
    pub container: ContainerId,
    pub position: usize,
}

/// An injected geometry failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryFault {
    pub container: ContainerId,
    pub position: usize,
}

impl fmt::Display for GeometryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "geometry query failed for item {} of container {}",
            self.position, self.container.0
        )
    }
}

#[derive(Clone, Debug)]
struct ChildView {
    id: ContainerId,
    layout: ListLayout,
    bound_to: Option<usize>,
}

/// A simulated host: an outer vertical list whose segments may each own a horizontal list.
///
/// Child containers are recycled the way a virtualized list recycles item views: when a
/// segment leaves the viewport its child goes back to a pool (remembering the child's scroll
/// offset for that segment) and the next segment that needs one reuses it. The same
/// [`ContainerId`] therefore reports for different segments over time.
///
/// The host keeps the listener registrations made by a tracker and only forwards events for
/// containers that have that tracker's listener attached. Drive it with
/// [`SimHost::scroll_outer_by`], [`SimHost::fling_outer`], [`SimHost::scroll_child_by`] and
/// [`SimHost::complete_layout`].
#[derive(Clone, Debug)]
pub struct SimHost {
    outer: ListLayout,
    nested: BTreeMap<usize, Vec<u32>>,
    children: Vec<ChildView>,
    saved_offsets: BTreeMap<usize, u64>,
    listeners: BTreeMap<ContainerId, Vec<ListenerId>>,
    pending_layout: Vec<ContainerId>,
    faults: BTreeSet<(ContainerId, usize)>,
    defer_child_layout: bool,
}

impl SimHost {
    pub fn new(outer: ListLayout) -> Self {
        let mut host = Self {
            outer,
            nested: BTreeMap::new(),
            children: Vec::new(),
            saved_offsets: BTreeMap::new(),
            listeners: BTreeMap::new(),
            pending_layout: Vec::new(),
            faults: BTreeSet::new(),
            defer_child_layout: false,
        };
        host.relayout();
        host
    }

    /// A vertical feed of `segment_count` segments of equal height.
    pub fn feed(viewport: Size, segment_count: usize, segment_height: u32) -> Self {
        Self::new(ListLayout::uniform(
            Axis::Vertical,
            viewport,
            segment_count,
            segment_height,
        ))
    }

    /// Gives the segment at `position` a horizontal list with the given cell widths.
    pub fn with_nested(mut self, position: usize, cell_widths: Vec<u32>) -> Self {
        self.nested.insert(position, cell_widths);
        self.relayout();
        self
    }

    /// Gives every segment a horizontal list of `count` cells of `width`.
    pub fn with_nested_everywhere(mut self, count: usize, width: u32) -> Self {
        for position in 0..self.outer.count() {
            self.nested.insert(position, alloc::vec![width; count]);
        }
        self.relayout();
        self
    }

    /// When set, a child container that gets bound to a segment is not laid out until the next
    /// [`SimHost::complete_layout`].
    pub fn with_deferred_child_layout(mut self, defer: bool) -> Self {
        self.defer_child_layout = defer;
        self
    }

    pub fn outer(&self) -> &ListLayout {
        &self.outer
    }

    /// The child container currently bound to the segment at `outer_position`.
    pub fn child_for(&self, outer_position: usize) -> Option<ContainerId> {
        self.children
            .iter()
            .find(|c| c.bound_to == Some(outer_position))
            .map(|c| c.id)
    }

    pub fn child_layout(&self, id: ContainerId) -> Option<&ListLayout> {
        self.child(id).map(|c| &c.layout)
    }

    /// Number of child containers ever created.
    pub fn child_pool_size(&self) -> usize {
        self.children.len()
    }

    pub fn listener_count(&self, container: ContainerId) -> usize {
        self.listeners.get(&container).map_or(0, Vec::len)
    }

    pub fn total_listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn pending_layout(&self) -> &[ContainerId] {
        &self.pending_layout
    }

    /// Makes every geometry query for `position` in `container` fail.
    pub fn inject_fault(&mut self, container: ContainerId, position: usize) {
        self.faults.insert((container, position));
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Scrolls the outer list by `delta` as one drag gesture and returns the distance consumed.
    pub fn scroll_outer_by<L, K>(
        &mut self,
        tracker: &mut ImpressionTracker<ContainerId, L, K>,
        delta: i64,
    ) -> i64
    where
        L: ImpressionListener<ViewHandle>,
        K: TrackerKey + Clone,
    {
        self.drive_outer(tracker, &[delta], false)
    }

    /// Drags the outer list, then lets it settle through `deltas`.
    pub fn fling_outer<L, K>(
        &mut self,
        tracker: &mut ImpressionTracker<ContainerId, L, K>,
        deltas: &[i64],
    ) -> i64
    where
        L: ImpressionListener<ViewHandle>,
        K: TrackerKey + Clone,
    {
        self.drive_outer(tracker, deltas, true)
    }

    fn drive_outer<L, K>(
        &mut self,
        tracker: &mut ImpressionTracker<ContainerId, L, K>,
        deltas: &[i64],
        settling: bool,
    ) -> i64
    where
        L: ImpressionListener<ViewHandle>,
        K: TrackerKey + Clone,
    {
        let outer = ContainerId::OUTER;
        self.dispatch_state(tracker, outer, ScrollState::Dragging);
        if settling {
            self.dispatch_state(tracker, outer, ScrollState::Settling);
        }
        let mut total = 0i64;
        for &delta in deltas {
            let consumed = self.outer.scroll_by(delta);
            self.relayout();
            if consumed != 0 {
                total = total.saturating_add(consumed);
                self.dispatch_scrolled(tracker, outer, 0, consumed);
            }
        }
        self.dispatch_state(tracker, outer, ScrollState::Idle);
        total
    }

    /// Scrolls the child bound to `outer_position` by `delta` as one drag gesture.
    ///
    /// Returns `None` when that segment has no realized child.
    pub fn scroll_child_by<L, K>(
        &mut self,
        tracker: &mut ImpressionTracker<ContainerId, L, K>,
        outer_position: usize,
        delta: i64,
    ) -> Option<i64>
    where
        L: ImpressionListener<ViewHandle>,
        K: TrackerKey + Clone,
    {
        let id = self.child_for(outer_position)?;
        self.dispatch_state(tracker, id, ScrollState::Dragging);
        let consumed = self.child_mut(id)?.layout.scroll_by(delta);
        if consumed != 0 {
            self.dispatch_scrolled(tracker, id, consumed, 0);
        }
        self.dispatch_state(tracker, id, ScrollState::Idle);
        Some(consumed)
    }

    /// Commits a layout pass: every child is laid out, then each container that requested a
    /// layout callback is reported to `tracker`.
    ///
    /// Returns the number of callbacks delivered.
    pub fn complete_layout<L, K>(&mut self, tracker: &mut ImpressionTracker<ContainerId, L, K>) -> usize
    where
        L: ImpressionListener<ViewHandle>,
        K: TrackerKey + Clone,
    {
        for child in &mut self.children {
            child.layout.set_laid_out(true);
        }
        let pending = core::mem::take(&mut self.pending_layout);
        for &container in &pending {
            tracker.on_layout_complete(self, container);
        }
        atrace!(delivered = pending.len(), "layout pass committed");
        pending.len()
    }

    fn dispatch_state<L, K>(
        &mut self,
        tracker: &mut ImpressionTracker<ContainerId, L, K>,
        container: ContainerId,
        state: ScrollState,
    ) where
        L: ImpressionListener<ViewHandle>,
        K: TrackerKey + Clone,
    {
        if self.is_listening(container, tracker.listener_id()) {
            tracker.on_scroll_state_changed(self, container, state);
        }
    }

    fn dispatch_scrolled<L, K>(
        &mut self,
        tracker: &mut ImpressionTracker<ContainerId, L, K>,
        container: ContainerId,
        dx: i64,
        dy: i64,
    ) where
        L: ImpressionListener<ViewHandle>,
        K: TrackerKey + Clone,
    {
        if self.is_listening(container, tracker.listener_id()) {
            tracker.on_scrolled(self, container, saturate_i32(dx), saturate_i32(dy));
        }
    }

    fn is_listening(&self, container: ContainerId, listener: ListenerId) -> bool {
        self.listeners
            .get(&container)
            .is_some_and(|l| l.contains(&listener))
    }

    fn child(&self, id: ContainerId) -> Option<&ChildView> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.children.get(index)
    }

    fn child_mut(&mut self, id: ContainerId) -> Option<&mut ChildView> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.children.get_mut(index)
    }

    /// Layout of a container that currently has content: the outer list, or a bound child.
    fn layout(&self, container: ContainerId) -> Option<&ListLayout> {
        if container == ContainerId::OUTER {
            return Some(&self.outer);
        }
        let child = self.child(container)?;
        child.bound_to.map(|_| &child.layout)
    }

    /// Recycles child containers to match the outer list's realized range.
    fn relayout(&mut self) {
        let range = self.outer.visible_range();
        let realized = |p: usize| range.is_some_and(|r| r.contains(p));

        for child in &mut self.children {
            let Some(position) = child.bound_to else {
                continue;
            };
            if !realized(position) {
                self.saved_offsets
                    .insert(position, child.layout.scroll_offset());
                child.bound_to = None;
                atrace!(child = child.id.0, position, "child recycled");
            }
        }

        if let Some(range) = range {
            for position in range.first..=range.last {
                let Some(cells) = self.nested.get(&position) else {
                    continue;
                };
                if self.children.iter().any(|c| c.bound_to == Some(position)) {
                    continue;
                }
                let size = Size::new(
                    self.outer.viewport_size().width,
                    self.outer.extent(position).unwrap_or(0),
                );
                let offset = self.saved_offsets.get(&position).copied().unwrap_or(0);

                let index = match self.children.iter().position(|c| c.bound_to.is_none()) {
                    Some(index) => index,
                    None => {
                        let id = ContainerId(self.children.len() as u32 + 1);
                        self.children.push(ChildView {
                            id,
                            layout: ListLayout::new(Axis::Horizontal, size, Vec::new()),
                            bound_to: None,
                        });
                        adebug!(child = id.0, "child container created");
                        self.children.len() - 1
                    }
                };
                let child = &mut self.children[index];
                child.layout.set_viewport_size(size);
                child.layout.set_extents(cells.clone());
                child.layout.scroll_to(offset);
                if self.defer_child_layout {
                    child.layout.set_laid_out(false);
                }
                child.bound_to = Some(position);
            }
        }

        for child in &mut self.children {
            let Some(position) = child.bound_to else {
                continue;
            };
            if let Some(rect) = self.outer.item_rect(position) {
                child.layout.set_origin(rect.left, rect.top);
            }
        }
    }
}

fn saturate_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl ScrollHost for SimHost {
    type Container = ContainerId;
    type View = ViewHandle;
    type Error = GeometryFault;

    fn viewport_rect(&self, container: ContainerId) -> Option<Rect> {
        let outer = self.outer.bounds();
        if container == ContainerId::OUTER {
            return (!outer.is_empty()).then_some(outer);
        }
        // Children are clipped by the outer list.
        self.layout(container)?.bounds().intersect(&outer)
    }

    fn layout_orientation(&self, container: ContainerId) -> Option<Axis> {
        if container == ContainerId::OUTER {
            return Some(self.outer.orientation());
        }
        self.child(container).map(|c| c.layout.orientation())
    }

    fn laid_out_range(&self, container: ContainerId) -> Option<LaidOutRange> {
        self.layout(container)?.visible_range()
    }

    fn item_rect(&self, container: ContainerId, position: usize) -> Result<Option<Rect>, GeometryFault> {
        if self.faults.contains(&(container, position)) {
            return Err(GeometryFault {
                container,
                position,
            });
        }
        Ok(self
            .layout(container)
            .and_then(|layout| layout.item_rect(position)))
    }

    fn realized_view_at(&self, container: ContainerId, position: usize) -> Option<ViewHandle> {
        self.layout(container)?.item_rect(position)?;
        Some(ViewHandle {
            container,
            position,
        })
    }

    fn item_content(&self, container: ContainerId, position: usize) -> ItemContent<ContainerId> {
        if container != ContainerId::OUTER {
            return ItemContent::Leaf;
        }
        match self.child_for(position) {
            Some(child) => ItemContent::Nested(child),
            None => ItemContent::Leaf,
        }
    }

    fn add_scroll_listener(&mut self, container: ContainerId, listener: ListenerId) {
        self.listeners.entry(container).or_default().push(listener);
    }

    fn remove_scroll_listener(&mut self, container: ContainerId, listener: ListenerId) {
        if let Some(list) = self.listeners.get_mut(&container) {
            list.retain(|l| *l != listener);
            if list.is_empty() {
                self.listeners.remove(&container);
            }
        }
    }

    fn clear_scroll_listeners(&mut self, container: ContainerId) {
        self.listeners.remove(&container);
    }

    fn request_layout_pass(&mut self, container: ContainerId) {
        if !self.pending_layout.contains(&container) {
            self.pending_layout.push(container);
        }
    }
}
