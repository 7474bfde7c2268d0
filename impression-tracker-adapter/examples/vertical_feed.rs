// Example: a plain vertical feed. Prints each segment once, when 60% of it has been on screen.
//
// RUST_LOG=impression_tracker=trace cargo run --example vertical_feed --features tracing
use impression_tracker::{ImpressionTracker, Size, TrackerOptions};
use impression_tracker_adapter::{ContainerId, EventRecorder, ImpressionEvent, SimHost};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 30 rows of 180px in an 800px viewport.
    let mut host = SimHost::feed(Size::new(400, 800), 30, 180);
    let mut tracker = ImpressionTracker::new(
        ContainerId::OUTER,
        TrackerOptions::new(60),
        EventRecorder::new(),
    )?;

    tracker.start(&mut host)?;
    host.complete_layout(&mut tracker);
    report("initial", tracker.listener_mut());

    for delta in [90, 300, 500, -200] {
        host.scroll_outer_by(&mut tracker, delta);
        report(&format!("scroll {delta:+}"), tracker.listener_mut());
    }

    host.fling_outer(&mut tracker, &[600, 400, 200, 50]);
    report("fling", tracker.listener_mut());

    tracker.stop(&mut host);
    Ok(())
}

fn report(step: &str, rec: &mut EventRecorder) {
    let events = rec.take();
    let seen: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ImpressionEvent::SegmentSeen { position } => Some(*position),
            _ => None,
        })
        .collect();
    let partial: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ImpressionEvent::SegmentVisibility {
                position,
                percentage,
            } if *percentage < 100.0 => Some(format!("{position}:{percentage:.0}%")),
            _ => None,
        })
        .collect();
    println!("{step:>12}: seen={seen:?} partial={partial:?}");
}
