use crate::frame::FrameLengthError;

/// Represents any error that may happen while talking to the sensor.
///
/// `E` is the error type of the underlying bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The bus transfer failed.
    #[cfg_attr(feature = "thiserror", error("bus transfer failed: {0:?}"))]
    Bus(E),
    /// The bus handle was closed and can no longer be used.
    #[cfg_attr(feature = "thiserror", error("bus unavailable: handle closed"))]
    BusClosed,
    /// A frame buffer did not have the fixed length of its frame type.
    #[cfg_attr(
        feature = "thiserror",
        error("frame length mismatch: expected {expected} bytes, got {actual}")
    )]
    FrameLength { expected: usize, actual: usize },
}

impl<E> From<FrameLengthError> for Error<E> {
    fn from(e: FrameLengthError) -> Self {
        Error::FrameLength {
            expected: e.expected,
            actual: e.actual,
        }
    }
}

#[cfg(not(feature = "thiserror"))]
impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Bus(e) => write!(f, "bus transfer failed: {e:?}"),
            Error::BusClosed => write!(f, "bus unavailable: handle closed"),
            Error::FrameLength { expected, actual } => write!(
                f,
                "frame length mismatch: expected {expected} bytes, got {actual}"
            ),
        }
    }
}
