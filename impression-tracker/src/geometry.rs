use crate::{Axis, ItemGeometry, Rect};

/// Percentage of an item that is visible along `axis`.
///
/// `intersection` is the part of the item's rect that lies inside its container's visible
/// rect (`None` when the item is fully offscreen or the container has no visible rect), and
/// `measured_extent` is the item's full size along `axis`.
///
/// The visible extent is clamped to `[0, measured_extent]`, so the result is always in
/// `[0, 100]`. An empty intersection or a zero extent (item not measured yet) yields `0.0`.
pub fn visible_percentage(intersection: Option<Rect>, measured_extent: u32, axis: Axis) -> f64 {
    let Some(visible) = intersection else {
        return 0.0;
    };
    if measured_extent == 0 {
        return 0.0;
    }
    let visible_extent = visible.extent(axis).min(measured_extent);
    100.0 * f64::from(visible_extent) / f64::from(measured_extent)
}

/// Intersects `item` with `viewport` and returns its visible percentage along `axis`.
pub fn item_visible_percentage(viewport: Option<Rect>, item: &ItemGeometry, axis: Axis) -> f64 {
    let intersection = viewport.and_then(|vp| item.rect.intersect(&vp));
    visible_percentage(intersection, item.measured.extent(axis), axis)
}
