use thiserror::Error;

/// Errors reported by the encoding and rendering APIs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrError {
    /// An argument was out of range or otherwise malformed, e.g. a non-digit
    /// character passed to the numeric segment factory, a codeword slice of
    /// the wrong length, or a zero render scale.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The payload does not fit any version in the allowed range.
    #[error(transparent)]
    DataTooLong(#[from] DataTooLong),

    /// An operation was invoked in a state that cannot satisfy it, e.g.
    /// extracting bytes from a bit buffer whose length is not a whole number
    /// of bytes.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
}

/// Raised when the supplied data does not fit the largest allowed QR Code
/// version at the requested error correction level.
///
/// Ways to handle this error include:
///
/// - Decrease the error correction level if it was greater than
///   [`QrCodeEcc::Low`](crate::QrCodeEcc::Low).
/// - Increase the `max_version` argument if it was less than
///   [`Version::MAX`](crate::Version::MAX).
/// - Split the text into better segments to reduce the number of bits
///   required.
/// - Shorten the text or binary data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataTooLong {
    /// A single segment's bit cost overflows the cost accumulator, so no
    /// version can hold it.
    #[error("segment too long")]
    SegmentTooLong,

    /// The total bit cost is known but exceeds the capacity of the largest
    /// allowed version.
    #[error("data length = {0} bits, max capacity = {1} bits")]
    DataOverCapacity(usize, usize),
}

impl QrError {
    /// Returns `true` when this error means the payload is too long, as
    /// opposed to a malformed argument.
    pub fn is_data_too_long(&self) -> bool {
        matches!(self, QrError::DataTooLong(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_too_long_messages() {
        let err = QrError::from(DataTooLong::DataOverCapacity(4860, 2952));
        assert_eq!(
            err.to_string(),
            "data length = 4860 bits, max capacity = 2952 bits"
        );
        assert!(err.is_data_too_long());
        assert!(!QrError::InvalidArgument("mask value out of range").is_data_too_long());
    }
}
