use crate::Axis;

/// Errors returned when a tracker or a nested binding is misconfigured.
///
/// Geometry faults raised by the host during a scan are not errors: they are logged and the
/// affected item is skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// A visibility threshold outside `[0, 100]`.
    #[error("visibility threshold {threshold} is outside 0..=100")]
    ThresholdOutOfRange { threshold: u8 },

    /// The container has no layout strategy, so there is nothing to scan.
    #[error("container has no layout strategy")]
    MissingLayout,

    /// The container scrolls along the wrong axis for its role.
    #[error("container scrolls {found:?}, expected {expected:?}")]
    OrientationMismatch { expected: Axis, found: Axis },

    /// A nested container was bound while the tracker was stopped.
    #[error("tracker is not tracking")]
    NotTracking,
}

pub(crate) fn check_threshold(threshold: u8) -> Result<u8, TrackerError> {
    if threshold > 100 {
        return Err(TrackerError::ThresholdOutOfRange { threshold });
    }
    Ok(threshold)
}
