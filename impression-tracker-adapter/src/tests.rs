use crate::*;

use alloc::vec;
use alloc::vec::Vec;

use impression_tracker::{Axis, ImpressionTracker, Size, TrackerError, TrackerOptions};

type Tracker = ImpressionTracker<ContainerId, EventRecorder>;

const SEGMENTS: usize = 50;
const SEGMENT_HEIGHT: u32 = 200;
const CELLS: usize = 20;
const CELL_WIDTH: u32 = 140;

/// 300x1000 viewport over 50 segments of height 200, each with 20 cells of width 140.
///
/// Five segments fit exactly; each child shows cells 0 and 1 in full and 20px of cell 2.
fn feed() -> SimHost {
    SimHost::feed(Size::new(300, 1000), SEGMENTS, SEGMENT_HEIGHT)
        .with_nested_everywhere(CELLS, CELL_WIDTH)
}

fn tracker(threshold: u8, nested: u8) -> Tracker {
    ImpressionTracker::new(
        ContainerId::OUTER,
        TrackerOptions::new(threshold).with_nested_threshold(Some(nested)),
        EventRecorder::new(),
    )
    .unwrap()
}

fn started(host: &mut SimHost, threshold: u8, nested: u8) -> Tracker {
    let mut t = tracker(threshold, nested);
    t.start(host).unwrap();
    assert_eq!(host.complete_layout(&mut t), 1);
    t
}

fn seen_for(rec: &EventRecorder, parent: usize) -> Vec<usize> {
    rec.entities_seen()
        .into_iter()
        .filter(|&(p, _)| p == parent)
        .map(|(_, c)| c)
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn layout_visible_range_tracks_scroll_offset() {
    let mut l = ListLayout::uniform(Axis::Vertical, Size::new(300, 1000), 50, 200);
    assert_eq!(l.total_extent(), 10_000);
    assert_eq!(l.max_scroll_offset(), 9_000);

    let r = l.visible_range().unwrap();
    assert_eq!((r.first, r.last), (0, 4));

    assert_eq!(l.scroll_by(100), 100);
    let r = l.visible_range().unwrap();
    assert_eq!((r.first, r.last), (0, 5));

    assert_eq!(l.scroll_by(100_000), 8_900);
    let r = l.visible_range().unwrap();
    assert_eq!((r.first, r.last), (45, 49));

    assert_eq!(l.scroll_by(-20_000), -9_000);
    assert_eq!(l.scroll_offset(), 0);
}

#[test]
fn layout_item_rect_is_screen_space_and_realized_only() {
    let mut l = ListLayout::new(Axis::Horizontal, Size::new(300, 200), vec![140; 20]);
    l.set_origin(10, 400);
    l.scroll_to(100);

    let r = l.item_rect(0).unwrap();
    assert_eq!((r.left, r.top, r.right, r.bottom), (-90, 400, 50, 600));
    let r = l.item_rect(2).unwrap();
    assert_eq!((r.left, r.right), (190, 330));
    assert_eq!(l.item_rect(3), None);

    l.set_laid_out(false);
    assert_eq!(l.visible_range(), None);
    assert_eq!(l.item_rect(0), None);
}

#[test]
fn layout_handles_empty_and_shrinking_content() {
    let mut l = ListLayout::new(Axis::Vertical, Size::new(100, 100), Vec::new());
    assert_eq!(l.visible_range(), None);
    assert_eq!(l.scroll_by(50), 0);

    l.set_extents(vec![50; 10]);
    l.scroll_to(400);
    assert_eq!(l.scroll_offset(), 400);
    l.set_extents(vec![50; 4]);
    assert_eq!(l.scroll_offset(), 100);

    l.set_viewport_size(Size::new(100, 0));
    assert_eq!(l.visible_range(), None);
}

#[test]
fn initial_layout_reports_segments_and_entities() {
    let mut host = feed();
    let t = started(&mut host, 40, 15);
    let rec = t.listener();

    assert_eq!(rec.segments_seen(), vec![0, 1, 2, 3, 4]);
    for parent in 0..5 {
        assert_eq!(seen_for(rec, parent), vec![0, 1]);
        assert_eq!(rec.entity_visibility(parent, 0), vec![100.0]);
        let partial = rec.entity_visibility(parent, 2);
        assert_eq!(partial.len(), 1);
        assert!(approx(partial[0], 100.0 * 20.0 / 140.0));
    }
    assert_eq!(rec.segment_visibility(5), Vec::<f64>::new());

    // Per segment: its own visibility, its seen event, then the child's initial scan.
    let head = &rec.events()[..7];
    assert_eq!(
        head[..6],
        [
            ImpressionEvent::SegmentVisibility {
                position: 0,
                percentage: 100.0
            },
            ImpressionEvent::SegmentSeen { position: 0 },
            ImpressionEvent::EntityVisibility {
                parent: 0,
                child: 0,
                percentage: 100.0
            },
            ImpressionEvent::EntitySeen {
                parent: 0,
                child: 0
            },
            ImpressionEvent::EntityVisibility {
                parent: 0,
                child: 1,
                percentage: 100.0
            },
            ImpressionEvent::EntitySeen {
                parent: 0,
                child: 1
            },
        ]
    );
    assert!(matches!(
        head[6],
        ImpressionEvent::EntityVisibility {
            parent: 0,
            child: 2,
            ..
        }
    ));

    assert_eq!(host.total_listener_count(), 6);
    assert_eq!(host.child_pool_size(), 5);
}

#[test]
fn partial_segment_is_seen_once_it_crosses_the_threshold() {
    let mut host = feed();
    let mut t = started(&mut host, 60, 15);
    t.listener_mut().clear();

    assert_eq!(host.scroll_outer_by(&mut t, 100), 100);
    let rec = t.listener();
    assert!(approx(rec.segment_visibility(0)[0], 50.0));
    assert!(approx(rec.segment_visibility(5)[0], 50.0));
    assert!(rec.segments_seen().is_empty());
    assert!(!t.has_seen_segment(5));

    assert_eq!(host.scroll_outer_by(&mut t, 40), 40);
    assert_eq!(t.listener().segments_seen(), vec![5]);
    assert!(t.has_seen_segment(5));
    assert_eq!(seen_for(t.listener(), 5), vec![0, 1]);
}

#[test]
fn fling_scans_once_when_it_settles() {
    let mut host = feed();
    let mut t = started(&mut host, 40, 15);
    t.listener_mut().clear();

    assert_eq!(host.fling_outer(&mut t, &[300, 300, 400]), 1000);
    let rec = t.listener();
    assert_eq!(rec.segments_seen(), vec![5, 6, 7, 8, 9]);
    assert_eq!(rec.segment_visibility(5).len(), 1);
    assert_eq!(t.scroll_state(), impression_tracker::ScrollState::Idle);
}

#[test]
fn first_scroll_scans_without_a_layout_pass() {
    let mut host = feed();
    let mut t = tracker(40, 15);
    t.start(&mut host).unwrap();
    assert_eq!(host.pending_layout(), &[ContainerId::OUTER]);

    // Drag then settle: the first delta and the settle each scan.
    host.scroll_outer_by(&mut t, 200);
    let rec = t.listener();
    assert_eq!(rec.segments_seen(), vec![1, 2, 3, 4, 5]);
    assert_eq!(rec.segment_visibility(1).len(), 2);

    // The layout pass that lands afterwards does not scan again.
    t.listener_mut().clear();
    host.complete_layout(&mut t);
    assert!(t.listener().events().is_empty());
}

#[test]
fn scrolling_back_does_not_repeat_seen_events() {
    let mut host = feed();
    let mut t = started(&mut host, 40, 15);

    host.scroll_outer_by(&mut t, 1000);
    assert_eq!(t.listener().segments_seen(), (0..10).collect::<Vec<_>>());
    assert_eq!(seen_for(t.listener(), 7), vec![0, 1]);

    t.listener_mut().clear();
    host.scroll_outer_by(&mut t, -1000);
    let rec = t.listener();
    assert!(rec.segments_seen().is_empty());
    assert_eq!(rec.segment_visibility(0), vec![100.0]);
    // The rebound children keep their per-segment history: no initial scan replay.
    assert!(rec.entities_seen().is_empty());
    assert!(rec.entity_visibility(0, 0).is_empty());
    assert_eq!(t.nested_container_for(0), host.child_for(0));
}

#[test]
fn recycled_child_reports_for_its_new_segment() {
    let mut host = feed();
    let mut t = started(&mut host, 40, 15);
    let child = host.child_for(0).unwrap();

    host.scroll_outer_by(&mut t, 1000);
    assert_eq!(host.child_pool_size(), 5);
    assert_eq!(host.child_for(5), Some(child));
    assert_eq!(t.nested_container_for(5), Some(child));
    assert_eq!(t.nested_container_for(0), None);
    assert_eq!(host.listener_count(child), 1);

    t.listener_mut().clear();
    assert_eq!(host.scroll_child_by(&mut t, 5, 280), Some(280));
    let rec = t.listener();
    assert_eq!(rec.entities_seen(), vec![(5, 2), (5, 3)]);
    assert!(!t.has_seen_entity(0, 2));
    assert!(t.has_seen_entity(5, 3));
}

#[test]
fn inner_offset_survives_recycling() {
    let mut host = feed();
    let mut t = started(&mut host, 40, 15);

    assert_eq!(host.scroll_child_by(&mut t, 0, 280), Some(280));
    assert_eq!(seen_for(t.listener(), 0), vec![0, 1, 2, 3]);

    host.scroll_outer_by(&mut t, 1000);
    host.scroll_outer_by(&mut t, -1000);
    let child = host.child_for(0).unwrap();
    assert_eq!(host.child_layout(child).unwrap().scroll_offset(), 280);

    t.listener_mut().clear();
    assert_eq!(host.scroll_child_by(&mut t, 0, 140), Some(140));
    let rec = t.listener();
    assert_eq!(rec.entities_seen(), vec![(0, 4)]);
    assert_eq!(rec.entity_visibility(0, 3), vec![100.0]);
}

#[test]
fn deferred_child_layout_scans_after_the_layout_pass() {
    let mut host = SimHost::feed(Size::new(300, 1000), SEGMENTS, SEGMENT_HEIGHT)
        .with_deferred_child_layout(true)
        .with_nested_everywhere(CELLS, CELL_WIDTH);
    let mut t = started(&mut host, 40, 15);
    assert_eq!(seen_for(t.listener(), 0), vec![0, 1]);

    t.listener_mut().clear();
    host.scroll_outer_by(&mut t, 1000);
    let rec = t.listener();
    assert_eq!(rec.segments_seen(), vec![5, 6, 7, 8, 9]);
    assert!(rec.entities_seen().is_empty());
    assert_eq!(host.pending_layout().len(), 5);

    assert_eq!(host.complete_layout(&mut t), 5);
    let rec = t.listener();
    for parent in 5..10 {
        assert_eq!(seen_for(rec, parent), vec![0, 1]);
    }
    assert!(host.pending_layout().is_empty());
}

#[test]
fn geometry_faults_skip_only_the_failing_item() {
    let mut host = feed();
    host.inject_fault(ContainerId::OUTER, 2);
    host.inject_fault(ContainerId(1), 1);
    let mut t = started(&mut host, 40, 15);
    let rec = t.listener();

    assert_eq!(rec.segments_seen(), vec![0, 1, 3, 4]);
    assert!(rec.segment_visibility(2).is_empty());
    // Child 1 is bound to segment 0.
    assert_eq!(seen_for(rec, 0), vec![0]);
    assert_eq!(seen_for(rec, 1), vec![0, 1]);

    host.clear_faults();
    host.scroll_outer_by(&mut t, 0);
    assert!(t.has_seen_segment(2));
}

#[test]
fn stop_detaches_every_listener() {
    let mut host = feed();
    let mut t = started(&mut host, 40, 15);
    assert_eq!(host.total_listener_count(), 6);

    t.stop(&mut host);
    assert_eq!(host.total_listener_count(), 0);
    assert!(!t.is_tracking());

    t.listener_mut().clear();
    host.scroll_outer_by(&mut t, 1000);
    assert_eq!(host.scroll_child_by(&mut t, 5, 140), Some(140));
    assert!(t.listener().events().is_empty());
}

#[test]
fn restart_reports_again() {
    let mut host = feed();
    let mut t = started(&mut host, 40, 15);
    t.stop(&mut host);
    t.listener_mut().clear();

    t.start(&mut host).unwrap();
    host.complete_layout(&mut t);
    assert_eq!(t.listener().segments_seen(), vec![0, 1, 2, 3, 4]);
    assert_eq!(seen_for(t.listener(), 0), vec![0, 1]);
}

#[test]
fn start_rejects_containers_that_are_not_vertical_lists() {
    let mut host = feed();

    let mut t = ImpressionTracker::new(ContainerId(1), TrackerOptions::new(50), EventRecorder::new())
        .unwrap();
    assert_eq!(
        t.start(&mut host),
        Err(TrackerError::OrientationMismatch {
            expected: Axis::Vertical,
            found: Axis::Horizontal,
        })
    );

    let mut t = ImpressionTracker::new(ContainerId(99), TrackerOptions::new(50), EventRecorder::new())
        .unwrap();
    assert_eq!(t.start(&mut host), Err(TrackerError::MissingLayout));
    assert_eq!(host.total_listener_count(), 0);
}

#[test]
fn segments_without_children_stay_leaves() {
    let mut host = SimHost::feed(Size::new(300, 1000), 10, 200).with_nested(1, vec![100; 5]);
    let t = started(&mut host, 40, 50);
    let rec = t.listener();

    assert_eq!(host.child_pool_size(), 1);
    assert_eq!(t.nested_container_for(1), Some(ContainerId(1)));
    assert_eq!(t.nested_container_for(0), None);
    assert_eq!(rec.entities_seen(), vec![(1, 0), (1, 1), (1, 2)]);
}

#[test]
fn deferred_scan_survives_recycling_before_the_layout_pass() {
    let mut host = SimHost::feed(Size::new(300, 1000), SEGMENTS, SEGMENT_HEIGHT)
        .with_deferred_child_layout(true)
        .with_nested_everywhere(CELLS, CELL_WIDTH);
    let mut t = started(&mut host, 40, 15);

    // Segments 5..9 get children that are still waiting for layout, then lose them again.
    host.scroll_outer_by(&mut t, 1000);
    assert_eq!(host.pending_layout().len(), 5);
    host.scroll_outer_by(&mut t, -1000);
    host.complete_layout(&mut t);
    for parent in 5..10 {
        assert!(seen_for(t.listener(), parent).is_empty());
    }

    t.listener_mut().clear();
    host.scroll_outer_by(&mut t, 1000);
    assert_eq!(host.complete_layout(&mut t), 5);
    for parent in 5..10 {
        assert_eq!(seen_for(t.listener(), parent), vec![0, 1]);
        assert!(t.has_seen_entity(parent, 0));
    }
}

#[test]
fn child_recycled_below_threshold_stops_reporting_for_its_old_segment() {
    let mut host = feed();
    let mut t = started(&mut host, 60, 15);
    let child = host.child_for(0).unwrap();

    // Segment 5 is realized at 50% with segment 0's old child.
    host.scroll_outer_by(&mut t, 1100);
    assert_eq!(host.child_for(5), Some(child));
    assert!(approx(*t.listener().segment_visibility(5).last().unwrap(), 50.0));
    assert_eq!(t.nested_container_for(0), None);
    assert_eq!(t.nested_container_for(5), None);
    assert_eq!(host.listener_count(child), 0);

    t.listener_mut().clear();
    assert_eq!(host.scroll_child_by(&mut t, 5, 280), Some(280));
    assert!(t.listener().events().is_empty());
    assert!(!t.has_seen_entity(0, 2));

    // Once segment 5 crosses the threshold the child is bound to it and scanned where it is.
    host.scroll_outer_by(&mut t, -40);
    let rec = t.listener();
    assert_eq!(rec.segments_seen(), vec![5]);
    assert_eq!(rec.entities_seen(), vec![(5, 2), (5, 3)]);
    assert_eq!(t.nested_container_for(5), Some(child));
}

#[test]
fn random_scrolling_never_repeats_seen_events() {
    let mut host = feed();
    let mut t = started(&mut host, 40, 15);
    let mut all = t.listener_mut().take();
    let mut rng = 0x2545_f491_4f6c_dd1du64;

    for _ in 0..200 {
        rng = rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let pick = (rng >> 33) % 4;
        let delta = ((rng >> 40) % 1200) as i64 - 600;
        if pick == 0 {
            let first = host.outer().visible_range().map_or(0, |r| r.first);
            host.scroll_child_by(&mut t, first, delta);
        } else {
            host.scroll_outer_by(&mut t, delta);
        }

        // Nested events are only ever attributed to segments on screen.
        let range = host.outer().visible_range().unwrap();
        for e in t.listener_mut().take() {
            if let ImpressionEvent::EntitySeen { parent, .. }
            | ImpressionEvent::EntityVisibility { parent, .. } = e
            {
                assert!(range.contains(parent), "{e:?} outside {range:?}");
            }
            all.push(e);
        }
    }

    let seen = |f: fn(&ImpressionEvent) -> Option<(usize, usize)>| -> (usize, usize) {
        let mut v: Vec<_> = all.iter().filter_map(f).collect();
        let n = v.len();
        v.sort_unstable();
        v.dedup();
        (n, v.len())
    };
    let (n, unique) = seen(|e| match *e {
        ImpressionEvent::SegmentSeen { position } => Some((position, 0)),
        _ => None,
    });
    assert_eq!(n, unique);
    let (n, unique) = seen(|e| match *e {
        ImpressionEvent::EntitySeen { parent, child } => Some((parent, child)),
        _ => None,
    });
    assert_eq!(n, unique);

    for e in &all {
        let p = match *e {
            ImpressionEvent::SegmentVisibility { percentage, .. }
            | ImpressionEvent::EntityVisibility { percentage, .. } => percentage,
            _ => continue,
        };
        assert!((0.0..=100.0).contains(&p));
    }
}
