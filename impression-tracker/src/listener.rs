/// Receives impression events from an [`crate::ImpressionTracker`].
///
/// Every method has a no-op default, so hosts implement only what they use. `V` is the host's
/// view handle ([`crate::ScrollHost::View`]).
pub trait ImpressionListener<V> {
    /// A segment reached the outer threshold for the first time in the tracking session.
    fn on_vertical_item(&mut self, _position: usize, _view: Option<V>) {}

    /// An entity inside the nested list of `parent_position` reached the inner threshold for
    /// the first time in the tracking session.
    fn on_horizontal_item(&mut self, _parent_position: usize, _child_position: usize) {}

    /// Raw visibility of a segment, reported for every item on every scan.
    fn on_vertical_item_visibility(&mut self, _visibility: f64, _position: usize) {}

    /// Raw visibility of an entity, reported for every item on every nested scan.
    fn on_horizontal_item_visibility(
        &mut self,
        _visibility: f64,
        _parent_position: usize,
        _child_position: usize,
    ) {
    }
}

impl<V> ImpressionListener<V> for () {}

impl<V, L: ImpressionListener<V> + ?Sized> ImpressionListener<V> for &mut L {
    fn on_vertical_item(&mut self, position: usize, view: Option<V>) {
        (**self).on_vertical_item(position, view);
    }

    fn on_horizontal_item(&mut self, parent_position: usize, child_position: usize) {
        (**self).on_horizontal_item(parent_position, child_position);
    }

    fn on_vertical_item_visibility(&mut self, visibility: f64, position: usize) {
        (**self).on_vertical_item_visibility(visibility, position);
    }

    fn on_horizontal_item_visibility(
        &mut self,
        visibility: f64,
        parent_position: usize,
        child_position: usize,
    ) {
        (**self).on_horizontal_item_visibility(visibility, parent_position, child_position);
    }
}
