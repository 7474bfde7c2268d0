use alloc::sync::Arc;

/// Default segment identity: the position itself.
pub type SegmentKey = u64;

/// Maps an outer position to a stable segment identity.
pub type SegmentKeyFn<K> = Arc<dyn Fn(usize) -> K + Send + Sync>;

/// Configuration for [`crate::ImpressionTracker`].
///
/// Cheap to clone: the key function is stored in an `Arc`.
pub struct TrackerOptions<K = SegmentKey> {
    /// Percentage of a segment's height that must be visible before it counts as seen.
    pub threshold: u8,

    /// When set, segments at or above `threshold` that expose a nested container are bound
    /// automatically, using this as the inner threshold.
    pub nested_threshold: Option<u8>,

    /// Stable identity for the segment at a position.
    ///
    /// Every piece of per-segment state (seen flags, nested bindings, entity deduplication) is
    /// keyed by this, so items that move between positions keep their history.
    pub get_segment_key: SegmentKeyFn<K>,
}

impl<K> Clone for TrackerOptions<K> {
    fn clone(&self) -> Self {
        Self {
            threshold: self.threshold,
            nested_threshold: self.nested_threshold,
            get_segment_key: Arc::clone(&self.get_segment_key),
        }
    }
}

impl TrackerOptions<SegmentKey> {
    /// Creates options for segments keyed by position.
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            nested_threshold: None,
            get_segment_key: Arc::new(|i| i as u64),
        }
    }
}

impl Default for TrackerOptions<SegmentKey> {
    fn default() -> Self {
        Self::new(50)
    }
}

impl<K> TrackerOptions<K> {
    /// Creates options with a caller-supplied segment identity.
    ///
    /// Use this when the data set can be reordered while it is on screen.
    pub fn new_with_key(
        threshold: u8,
        get_segment_key: impl Fn(usize) -> K + Send + Sync + 'static,
    ) -> Self {
        Self {
            threshold,
            nested_threshold: None,
            get_segment_key: Arc::new(get_segment_key),
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_nested_threshold(mut self, nested_threshold: Option<u8>) -> Self {
        self.nested_threshold = nested_threshold;
        self
    }

    pub fn with_get_segment_key(
        mut self,
        get_segment_key: impl Fn(usize) -> K + Send + Sync + 'static,
    ) -> Self {
        self.get_segment_key = Arc::new(get_segment_key);
        self
    }

    pub(crate) fn key_for(&self, position: usize) -> K {
        (self.get_segment_key)(position)
    }
}

impl<K> core::fmt::Debug for TrackerOptions<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackerOptions")
            .field("threshold", &self.threshold)
            .field("nested_threshold", &self.nested_threshold)
            .finish_non_exhaustive()
    }
}
