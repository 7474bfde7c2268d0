use crate::key::{KeyMap, KeySet};
use crate::scan::for_each_visibility;
use crate::{Axis, ImpressionListener, ListenerId, ScrollHost, TrackerError, TrackerKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InitialScan {
    NotRun,
    AwaitingLayout,
    Done,
}

/// Binding state for one segment, keyed by the segment's stable identity.
///
/// Outlives the child container it points at: when the outer list recycles the segment's
/// view, `child` is cleared but a completed `initial_scan` is kept, so scrolling back to the
/// segment does not replay the initial scan.
#[derive(Clone, Debug)]
struct NestedSlot<C> {
    child: Option<C>,
    position: usize,
    threshold: u8,
    initial_scan: InitialScan,
}

impl<C> NestedSlot<C> {
    /// Drops the child. A layout pass still pending for it will never be reported for this
    /// segment, so the initial scan is owed to the next child instead.
    fn detach(&mut self) {
        self.child = None;
        if self.initial_scan == InitialScan::AwaitingLayout {
            self.initial_scan = InitialScan::NotRun;
        }
    }
}

/// Binds nested horizontal containers to the segments that own them.
///
/// Entries live until the tracking session ends; nothing is evicted while tracking.
#[derive(Debug)]
pub(crate) struct NestedCoordinator<K, C> {
    slots: KeyMap<K, NestedSlot<C>>,
    // child container -> segment it currently reports for
    owners: KeyMap<C, K>,
    entities: KeySet<(K, usize)>,
}

impl<K, C> NestedCoordinator<K, C>
where
    K: TrackerKey + Clone,
    C: TrackerKey + Copy + core::fmt::Debug,
{
    pub(crate) fn new() -> Self {
        Self {
            slots: KeyMap::new(),
            owners: KeyMap::new(),
            entities: KeySet::new(),
        }
    }

    pub(crate) fn is_bound(&self, child: C) -> bool {
        self.owners.contains_key(&child)
    }

    pub(crate) fn child_for(&self, key: &K) -> Option<C> {
        self.slots.get(key).and_then(|slot| slot.child)
    }

    pub(crate) fn has_seen_entity(&self, key: &K, inner_position: usize) -> bool {
        self.entities.contains(&(key.clone(), inner_position))
    }

    /// Binds `child` to the segment `key` at `position`.
    ///
    /// Rebinding the same child to the same segment only refreshes the position and threshold.
    /// Otherwise the child's previous listeners are cleared, the segment's previous child (if a
    /// different instance) is detached, and a fresh listener is registered. The initial scan
    /// runs on the first bind of each segment only.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn bind<H, L>(
        &mut self,
        host: &mut H,
        listener_id: ListenerId,
        key: K,
        position: usize,
        child: C,
        threshold: u8,
        listener: &mut L,
    ) -> Result<(), TrackerError>
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View> + ?Sized,
    {
        match host.layout_orientation(child) {
            None => return Err(TrackerError::MissingLayout),
            Some(Axis::Horizontal) => {}
            Some(found) => {
                return Err(TrackerError::OrientationMismatch {
                    expected: Axis::Horizontal,
                    found,
                });
            }
        }

        let already_bound = self.owners.get(&child) == Some(&key)
            && self.slots.get(&key).and_then(|slot| slot.child) == Some(child);
        if already_bound {
            if let Some(slot) = self.slots.get_mut(&key) {
                slot.position = position;
                slot.threshold = threshold;
            }
        } else {
            // The recycled child may still be reporting for another segment.
            if let Some(prev_key) = self.owners.remove(&child) {
                if let Some(prev) = self.slots.get_mut(&prev_key) {
                    if prev.child == Some(child) {
                        prev.detach();
                    }
                }
            }

            let slot = self.slots.entry(key.clone()).or_insert(NestedSlot {
                child: None,
                position,
                threshold,
                initial_scan: InitialScan::NotRun,
            });
            if let Some(stale) = slot.child {
                slot.detach();
                idebug!(?stale, ?child, position, "nested: replacing child container");
                host.remove_scroll_listener(stale, listener_id);
                self.owners.remove(&stale);
            }

            host.clear_scroll_listeners(child);
            host.add_scroll_listener(child, listener_id);
            slot.child = Some(child);
            slot.position = position;
            slot.threshold = threshold;
            self.owners.insert(child, key.clone());
            itrace!(?child, position, threshold, "nested: bound");
        }

        let needs_initial = self
            .slots
            .get(&key)
            .is_some_and(|slot| slot.initial_scan == InitialScan::NotRun);
        if needs_initial {
            self.run_initial_scan(host, &key, child, listener);
        }
        Ok(())
    }

    fn run_initial_scan<H, L>(&mut self, host: &mut H, key: &K, child: C, listener: &mut L)
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View> + ?Sized,
    {
        let Some(slot) = self.slots.get_mut(key) else {
            return;
        };
        if host.laid_out_range(child).is_none() {
            idebug!(?child, "nested: layout not committed; deferring initial scan");
            slot.initial_scan = InitialScan::AwaitingLayout;
            host.request_layout_pass(child);
            return;
        }
        slot.initial_scan = InitialScan::Done;
        self.scan_child(&*host, child, listener);
    }

    /// Runs a deferred initial scan once the host has laid `child` out.
    ///
    /// Returns `false` when `child` is not bound to any segment.
    pub(crate) fn on_layout_complete<H, L>(
        &mut self,
        host: &mut H,
        outer: C,
        listener_id: ListenerId,
        child: C,
        listener: &mut L,
    ) -> bool
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View> + ?Sized,
    {
        let Some(key) = self.owners.get(&child) else {
            return false;
        };
        let awaiting = self
            .slots
            .get(key)
            .is_some_and(|slot| slot.initial_scan == InitialScan::AwaitingLayout);
        if awaiting && !self.release_if_offscreen(host, outer, listener_id, child) {
            self.scan_child(&*host, child, listener);
        }
        true
    }

    /// Handles a settle of `child`.
    ///
    /// A child whose segment has left the outer container's laid-out range has been recycled
    /// without a rebind; it is released instead of scanned.
    pub(crate) fn on_child_settled<H, L>(
        &mut self,
        host: &mut H,
        outer: C,
        listener_id: ListenerId,
        child: C,
        listener: &mut L,
    ) where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View> + ?Sized,
    {
        if !self.release_if_offscreen(host, outer, listener_id, child) {
            self.scan_child(&*host, child, listener);
        }
    }

    /// Releases `child` if it currently reports for a segment other than `key`.
    ///
    /// Called for segments that show `child` but are not being bound to it, so a recycled
    /// view stops reporting under the segment it came from.
    pub(crate) fn release_if_foreign<H>(
        &mut self,
        host: &mut H,
        listener_id: ListenerId,
        key: &K,
        child: C,
    ) where
        H: ScrollHost<Container = C> + ?Sized,
    {
        if self.owners.get(&child).is_some_and(|owner| owner != key) {
            self.release(host, listener_id, child);
        }
    }

    fn release_if_offscreen<H>(
        &mut self,
        host: &mut H,
        outer: C,
        listener_id: ListenerId,
        child: C,
    ) -> bool
    where
        H: ScrollHost<Container = C> + ?Sized,
    {
        let Some(position) = self
            .owners
            .get(&child)
            .and_then(|key| self.slots.get(key))
            .map(|slot| slot.position)
        else {
            return false;
        };
        if host
            .laid_out_range(outer)
            .is_some_and(|range| range.contains(position))
        {
            return false;
        }
        self.release(host, listener_id, child);
        true
    }

    fn release<H>(&mut self, host: &mut H, listener_id: ListenerId, child: C)
    where
        H: ScrollHost<Container = C> + ?Sized,
    {
        let Some(key) = self.owners.remove(&child) else {
            return;
        };
        if let Some(slot) = self.slots.get_mut(&key) {
            if slot.child == Some(child) {
                slot.detach();
            }
        }
        host.remove_scroll_listener(child, listener_id);
        idebug!(?child, "nested: released recycled child");
    }

    /// Scans `child` and reports through the nested event channel.
    ///
    /// Threshold crossings are deduplicated per (segment, inner position), so the same inner
    /// position under two different segments is reported for each.
    fn scan_child<H, L>(&mut self, host: &H, child: C, listener: &mut L)
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View> + ?Sized,
    {
        let Some(key) = self.owners.get(&child).cloned() else {
            return;
        };
        if host.laid_out_range(child).is_none() {
            itrace!(?child, "nested: child not laid out; scan skipped");
            return;
        }
        let Some(slot) = self.slots.get_mut(&key) else {
            return;
        };
        // A settle can arrive before the requested layout pass completes.
        slot.initial_scan = InitialScan::Done;
        let parent = slot.position;
        let threshold = f64::from(slot.threshold);

        let entities = &mut self.entities;
        for_each_visibility(host, child, Axis::Horizontal, |record| {
            listener.on_horizontal_item_visibility(record.percentage, parent, record.position);
            if record.percentage >= threshold && entities.insert((key.clone(), record.position)) {
                listener.on_horizontal_item(parent, record.position);
            }
        });
    }

    /// Detaches every child listener. Used when tracking stops.
    pub(crate) fn detach_all<H>(&mut self, host: &mut H, listener_id: ListenerId)
    where
        H: ScrollHost<Container = C> + ?Sized,
    {
        for child in self.owners.keys() {
            host.remove_scroll_listener(*child, listener_id);
        }
        self.owners.clear();
        self.slots.clear();
        self.entities.clear();
    }
}
