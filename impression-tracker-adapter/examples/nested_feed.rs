// Example: a feed of sections, each with a horizontal carousel of cards.
//
// Sections are reported at 50% visibility and cards at 70%. Carousel views are recycled as the
// feed scrolls, and each one remembers its horizontal offset per section.
//
// RUST_LOG=impression_tracker=debug cargo run --example nested_feed --features tracing
use impression_tracker::{ImpressionTracker, Size, TrackerOptions};
use impression_tracker_adapter::{ContainerId, EventRecorder, SimHost};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut host = SimHost::feed(Size::new(360, 720), 40, 240)
        .with_deferred_child_layout(true)
        .with_nested_everywhere(12, 150);
    let mut tracker = ImpressionTracker::new(
        ContainerId::OUTER,
        TrackerOptions::new(50).with_nested_threshold(Some(70)),
        EventRecorder::new(),
    )?;

    tracker.start(&mut host)?;
    host.complete_layout(&mut tracker);
    print_step("initial", &mut tracker);

    host.scroll_child_by(&mut tracker, 0, 400);
    print_step("swipe section 0", &mut tracker);

    host.scroll_outer_by(&mut tracker, 900);
    // Carousels bound during that scroll are scanned once their layout lands.
    let delivered = host.complete_layout(&mut tracker);
    print_step(&format!("scroll down, {delivered} layouts"), &mut tracker);

    host.scroll_outer_by(&mut tracker, -900);
    host.scroll_child_by(&mut tracker, 0, 150);
    print_step("back and swipe section 0", &mut tracker);

    println!(
        "carousels created: {}, listeners: {}",
        host.child_pool_size(),
        host.total_listener_count()
    );
    tracker.stop(&mut host);
    println!("after stop, listeners: {}", host.total_listener_count());
    Ok(())
}

fn print_step(step: &str, tracker: &mut ImpressionTracker<ContainerId, EventRecorder>) {
    let rec = tracker.listener_mut();
    println!(
        "{step}: sections={:?} cards={:?}",
        rec.segments_seen(),
        rec.entities_seen()
    );
    rec.clear();
}
