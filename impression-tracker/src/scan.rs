use alloc::vec::Vec;
use core::fmt;

use crate::geometry::item_visible_percentage;
use crate::{Axis, ItemGeometry, ScrollHost, VisibilityRecord};

/// Runs one visibility scan over `container` without allocating.
///
/// `f` is called once per realized item between the first and last laid-out positions, in
/// ascending position order. Items without a realized view, items with no measured extent
/// along `axis`, and items whose geometry query fails are skipped; a failure on one item does
/// not stop the scan.
///
/// Returns the number of records emitted.
pub fn for_each_visibility<H: ScrollHost + ?Sized>(
    host: &H,
    container: H::Container,
    axis: Axis,
    mut f: impl FnMut(VisibilityRecord),
) -> usize {
    let Some(range) = host.laid_out_range(container) else {
        itrace!(?container, "scan: nothing laid out");
        return 0;
    };
    let viewport = host.viewport_rect(container);

    let mut emitted = 0usize;
    for position in range.first..=range.last {
        let Some(item) = read_geometry(host, container, position) else {
            continue;
        };
        if item.measured.extent(axis) == 0 {
            itrace!(?container, position, "scan: skipping unmeasured item");
            continue;
        }
        let percentage = item_visible_percentage(viewport, &item, axis);
        emitted = emitted.saturating_add(1);
        f(VisibilityRecord {
            position,
            percentage,
        });
    }

    itrace!(
        ?container,
        first = range.first,
        last = range.last,
        emitted,
        "scan"
    );
    emitted
}

/// Runs one visibility scan and collects the records.
///
/// See [`for_each_visibility`] for the skipping rules.
pub fn scan_visibility<H: ScrollHost + ?Sized>(
    host: &H,
    container: H::Container,
    axis: Axis,
) -> Vec<VisibilityRecord> {
    let mut out = Vec::new();
    for_each_visibility(host, container, axis, |record| out.push(record));
    out
}

fn read_geometry<H: ScrollHost + ?Sized>(
    host: &H,
    container: H::Container,
    position: usize,
) -> Option<ItemGeometry> {
    let rect = match host.item_rect(container, position) {
        Ok(Some(rect)) => rect,
        Ok(None) => return None,
        Err(err) => {
            report_fault(&container, position, &err);
            return None;
        }
    };
    let measured = match host.measured_size(container, position) {
        Ok(Some(size)) => size,
        Ok(None) => return None,
        Err(err) => {
            report_fault(&container, position, &err);
            return None;
        }
    };
    Some(ItemGeometry {
        position,
        rect,
        measured,
    })
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn report_fault(container: &dyn fmt::Debug, position: usize, err: &dyn fmt::Display) {
    iwarn!(
        container = ?container,
        position,
        error = %err,
        "scan: geometry query failed; skipping item"
    );
}
