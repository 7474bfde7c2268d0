use crate::error::check_threshold;
use crate::key::KeySet;
use crate::nested::NestedCoordinator;
use crate::scan::scan_visibility;
use crate::{
    Axis, ImpressionListener, ItemContent, ListenerId, ScrollHost, ScrollState, SegmentKey,
    TrackerError, TrackerKey, TrackerOptions, TrackingStatus,
};

/// State that exists only while tracking. Dropped on `stop`.
#[derive(Debug)]
struct Session<K, C> {
    first_scan_done: bool,
    scroll_state: ScrollState,
    seen_segments: KeySet<K>,
    nested: NestedCoordinator<K, C>,
}

impl<K, C> Session<K, C>
where
    K: TrackerKey + Clone,
    C: TrackerKey + Copy + core::fmt::Debug,
{
    fn new() -> Self {
        Self {
            first_scan_done: false,
            scroll_state: ScrollState::Idle,
            seen_segments: KeySet::new(),
            nested: NestedCoordinator::new(),
        }
    }
}

/// Tracks item visibility in one vertical scroll container and its nested horizontal lists.
///
/// The tracker is purely event-driven. The host forwards scroll callbacks for every container
/// the tracker has registered a listener on, and each qualifying callback runs a synchronous
/// scan:
/// - every transition to [`ScrollState::Idle`] scans the container that settled;
/// - the first scroll delta (or the first completed layout pass, whichever comes first) after
///   `start` scans the outer container once, covering a list that was never scrolled.
///
/// Every scan reports raw visibility for each realized item. An item that reaches the
/// threshold is additionally reported as seen, at most once per tracking session: leaving and
/// re-entering the viewport does not re-arm it. Stopping and starting again begins a new
/// session.
///
/// All mutation happens inside host callbacks on the caller's thread.
#[derive(Debug)]
pub struct ImpressionTracker<C, L, K = SegmentKey> {
    container: C,
    options: TrackerOptions<K>,
    listener: L,
    listener_id: ListenerId,
    session: Option<Session<K, C>>,
}

impl<C, L, K> ImpressionTracker<C, L, K>
where
    C: TrackerKey + Copy + core::fmt::Debug,
    K: TrackerKey + Clone,
{
    /// Creates a stopped tracker for `container`.
    ///
    /// Fails when `options.threshold` or `options.nested_threshold` is above 100.
    pub fn new(container: C, options: TrackerOptions<K>, listener: L) -> Result<Self, TrackerError> {
        check_threshold(options.threshold)?;
        if let Some(nested) = options.nested_threshold {
            check_threshold(nested)?;
        }
        idebug!(
            ?container,
            threshold = options.threshold,
            nested_threshold = ?options.nested_threshold,
            "ImpressionTracker::new"
        );
        Ok(Self {
            container,
            options,
            listener,
            listener_id: ListenerId::next(),
            session: None,
        })
    }

    pub fn container(&self) -> C {
        self.container
    }

    pub fn options(&self) -> &TrackerOptions<K> {
        &self.options
    }

    /// The id this tracker registers its scroll listeners under.
    pub fn listener_id(&self) -> ListenerId {
        self.listener_id
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn status(&self) -> TrackingStatus {
        if self.session.is_some() {
            TrackingStatus::Tracking
        } else {
            TrackingStatus::Stopped
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// Last scroll state reported for the outer container (`Idle` when stopped).
    pub fn scroll_state(&self) -> ScrollState {
        self.session
            .as_ref()
            .map_or(ScrollState::Idle, |s| s.scroll_state)
    }

    /// Whether the segment at `position` has reached the threshold in this session.
    pub fn has_seen_segment(&self, position: usize) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        session
            .seen_segments
            .contains(&self.options.key_for(position))
    }

    /// Whether the entity at `inner_position` inside the segment at `outer_position` has reached
    /// its threshold in this session.
    pub fn has_seen_entity(&self, outer_position: usize, inner_position: usize) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        session
            .nested
            .has_seen_entity(&self.options.key_for(outer_position), inner_position)
    }

    /// The child container currently bound to the segment at `outer_position`.
    pub fn nested_container_for(&self, outer_position: usize) -> Option<C> {
        self.session
            .as_ref()?
            .nested
            .child_for(&self.options.key_for(outer_position))
    }

    /// Starts tracking.
    ///
    /// Registers a scroll listener on the container and asks the host for a layout pass so the
    /// initial viewport is scanned even if the user never scrolls. Calling this while already
    /// tracking does nothing.
    pub fn start<H>(&mut self, host: &mut H) -> Result<(), TrackerError>
    where
        H: ScrollHost<Container = C> + ?Sized,
    {
        if self.session.is_some() {
            return Ok(());
        }
        match host.layout_orientation(self.container) {
            None => return Err(TrackerError::MissingLayout),
            Some(Axis::Vertical) => {}
            Some(found) => {
                return Err(TrackerError::OrientationMismatch {
                    expected: Axis::Vertical,
                    found,
                });
            }
        }

        host.add_scroll_listener(self.container, self.listener_id);
        self.session = Some(Session::new());
        host.request_layout_pass(self.container);
        idebug!(container = ?self.container, "tracking started");
        Ok(())
    }

    /// Stops tracking.
    ///
    /// Detaches the outer listener and every nested listener before returning, and drops all
    /// session state. Calling this while stopped does nothing.
    pub fn stop<H>(&mut self, host: &mut H)
    where
        H: ScrollHost<Container = C> + ?Sized,
    {
        let Some(mut session) = self.session.take() else {
            return;
        };
        host.remove_scroll_listener(self.container, self.listener_id);
        session.nested.detach_all(host, self.listener_id);
        idebug!(container = ?self.container, "tracking stopped");
    }

    /// Host callback: the scroll state of `container` changed.
    ///
    /// Settling to idle scans that container. Events for containers this tracker is not
    /// attached to are ignored.
    pub fn on_scroll_state_changed<H>(&mut self, host: &mut H, container: C, state: ScrollState)
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View>,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if container == self.container {
            session.scroll_state = state;
            if state == ScrollState::Idle {
                self.scan_segments(host);
            }
            return;
        }
        if state == ScrollState::Idle && session.nested.is_bound(container) {
            session.nested.on_child_settled(
                host,
                self.container,
                self.listener_id,
                container,
                &mut self.listener,
            );
        }
    }

    /// Host callback: `container` scrolled by `(dx, dy)`.
    ///
    /// Only the first delta of a session matters: it scans the outer container once.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn on_scrolled<H>(&mut self, host: &mut H, container: C, dx: i32, dy: i32)
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View>,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if container != self.container || session.first_scan_done {
            return;
        }
        itrace!(?container, dx, dy, "first scroll delta");
        session.first_scan_done = true;
        self.scan_segments(host);
    }

    /// Host callback: a layout pass requested through [`ScrollHost::request_layout_pass`] has
    /// been committed for `container`.
    pub fn on_layout_complete<H>(&mut self, host: &mut H, container: C)
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View>,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if container == self.container {
            if !session.first_scan_done {
                idebug!(?container, "layout committed; running initial scan");
                session.first_scan_done = true;
                self.scan_segments(host);
            }
            return;
        }
        session.nested.on_layout_complete(
            host,
            self.container,
            self.listener_id,
            container,
            &mut self.listener,
        );
    }

    /// Binds a nested horizontal container to the segment at `outer_position`.
    ///
    /// Any previous listener on `child` is cleared first, since recycled views carry the
    /// registration of the segment they were last bound to. If the segment was bound to a
    /// different child before, that child is detached. The child is scanned right away on the
    /// first bind of each segment in the session; later binds of the same segment rely on
    /// the child's own settle events.
    pub fn bind_nested_container<H>(
        &mut self,
        host: &mut H,
        outer_position: usize,
        child: C,
        inner_threshold: u8,
    ) -> Result<(), TrackerError>
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View>,
    {
        check_threshold(inner_threshold)?;
        let Some(session) = self.session.as_mut() else {
            return Err(TrackerError::NotTracking);
        };
        let key = self.options.key_for(outer_position);
        session.nested.bind(
            host,
            self.listener_id,
            key,
            outer_position,
            child,
            inner_threshold,
            &mut self.listener,
        )
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn scan_segments<H>(&mut self, host: &mut H)
    where
        H: ScrollHost<Container = C> + ?Sized,
        L: ImpressionListener<H::View>,
    {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        // Collected up front: automatic nested binds need `host` mutably.
        let records = scan_visibility(&*host, self.container, Axis::Vertical);
        let threshold = f64::from(self.options.threshold);

        for record in records {
            self.listener
                .on_vertical_item_visibility(record.percentage, record.position);
            let key = self.options.key_for(record.position);
            let reached = record.percentage >= threshold;

            if reached && session.seen_segments.insert(key.clone()) {
                let view = host.realized_view_at(self.container, record.position);
                self.listener.on_vertical_item(record.position, view);
            }

            let ItemContent::Nested(child) = host.item_content(self.container, record.position)
            else {
                continue;
            };
            let inner_threshold = match self.options.nested_threshold {
                Some(inner) if reached => inner,
                // Not bound here, but a recycled child must stop reporting for its old segment.
                _ => {
                    session
                        .nested
                        .release_if_foreign(host, self.listener_id, &key, child);
                    continue;
                }
            };
            if let Err(err) = session.nested.bind(
                host,
                self.listener_id,
                key.clone(),
                record.position,
                child,
                inner_threshold,
                &mut self.listener,
            ) {
                iwarn!(
                    position = record.position,
                    ?child,
                    error = %err,
                    "nested: automatic bind rejected"
                );
                session
                    .nested
                    .release_if_foreign(host, self.listener_id, &key, child);
            }
        }
    }
}
