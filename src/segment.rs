//! Data segments: a mode, a character count, and a packed bit payload.

use crate::bits::BitBuffer;
use crate::error::QrError;
use crate::qrcode::Version;

/// The set of characters encodable in alphanumeric mode, in index order.
static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// A segment's data mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum QrSegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
    Eci,
}

impl QrSegmentMode {
    /// The 4-bit mode indicator written before each segment.
    pub(crate) fn mode_bits(self) -> u32 {
        use QrSegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
            Kanji => 0x8,
            Eci => 0x7,
        }
    }

    /// The width of the character count field for this mode at the given
    /// version.
    pub(crate) fn num_char_count_bits(self, ver: Version) -> u8 {
        use QrSegmentMode::*;
        (match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
            Kanji => [8, 10, 12],
            Eci => [0, 0, 0],
        })[usize::from((ver.value() + 7) / 17)]
    }
}

/// A segment of character or binary data in a QR Code symbol.
///
/// Immutable after construction. Instances are created through the factory
/// functions; the low-level [`QrSegment::new`] accepts a prepacked payload.
pub struct QrSegment {
    mode: QrSegmentMode,
    num_chars: usize,
    data: BitBuffer,
}

impl QrSegment {
    /// Creates a segment from its parts. The payload bits must already
    /// follow the packing rules of `mode`; the factory functions are the
    /// usual way to get here.
    pub fn new(mode: QrSegmentMode, num_chars: usize, data: BitBuffer) -> Self {
        Self {
            mode,
            num_chars,
            data,
        }
    }

    /// Creates a segment representing the given binary data in byte mode.
    ///
    /// For Unicode text, pass its UTF-8 encoding.
    pub fn make_bytes(data: &[u8]) -> Result<Self, QrError> {
        let mut bits = BitBuffer::new();
        for &byte in data {
            bits.append_bits(byte.into(), 8)?;
        }
        Ok(Self::new(QrSegmentMode::Byte, data.len(), bits))
    }

    /// Creates a segment representing the given string of decimal digits in
    /// numeric mode.
    ///
    /// Digits are grouped in triples of 10 bits; a trailing pair takes 7
    /// bits and a trailing single digit 4.
    pub fn make_numeric(text: &str) -> Result<Self, QrError> {
        let mut bits = BitBuffer::new();
        let mut accum_data: u32 = 0;
        let mut accum_count: u8 = 0;
        for byte in text.bytes() {
            if !byte.is_ascii_digit() {
                return Err(QrError::InvalidArgument(
                    "string contains non-numeric characters",
                ));
            }
            accum_data = accum_data * 10 + u32::from(byte - b'0');
            accum_count += 1;
            if accum_count == 3 {
                bits.append_bits(accum_data, 10)?;
                accum_data = 0;
                accum_count = 0;
            }
        }
        if accum_count > 0 {
            bits.append_bits(accum_data, accum_count * 3 + 1)?;
        }
        Ok(Self::new(QrSegmentMode::Numeric, text.len(), bits))
    }

    /// Creates a segment representing the given text in alphanumeric mode.
    ///
    /// Allowed characters: 0-9, A-Z (uppercase only), space, `$`, `%`, `*`,
    /// `+`, `-`, `.`, `/`, `:`. Pairs pack into 11 bits, a trailing
    /// singleton into 6.
    pub fn make_alphanumeric(text: &str) -> Result<Self, QrError> {
        let mut bits = BitBuffer::new();
        let mut accum_data: u32 = 0;
        let mut accum_count: u8 = 0;
        for c in text.chars() {
            let index = ALPHANUMERIC_CHARSET.find(c).ok_or(QrError::InvalidArgument(
                "string contains unencodable characters in alphanumeric mode",
            ))?;
            accum_data = accum_data * 45 + index as u32;
            accum_count += 1;
            if accum_count == 2 {
                bits.append_bits(accum_data, 11)?;
                accum_data = 0;
                accum_count = 0;
            }
        }
        if accum_count > 0 {
            bits.append_bits(accum_data, 6)?;
        }
        Ok(Self::new(QrSegmentMode::Alphanumeric, text.len(), bits))
    }

    /// Creates a segment representing the given Shift_JIS data in kanji
    /// mode.
    ///
    /// The input holds one big-endian byte pair per glyph. Every pair must
    /// lie in the QR kanji subset (0x8140-0x9FFC or 0xE040-0xEBBF); each
    /// packs into 13 bits.
    pub fn make_kanji(data: &[u8]) -> Result<Self, QrError> {
        if data.len() % 2 != 0 {
            return Err(QrError::InvalidArgument(
                "kanji data must be whole Shift_JIS byte pairs",
            ));
        }
        let mut bits = BitBuffer::new();
        for pair in data.chunks_exact(2) {
            let cp = u16::from(pair[0]) << 8 | u16::from(pair[1]);
            let offset = match cp {
                0x8140..=0x9FFC => cp - 0x8140,
                0xE040..=0xEBBF => cp - 0xC140,
                _ => {
                    return Err(QrError::InvalidArgument(
                        "byte pair outside the QR kanji subset",
                    ))
                }
            };
            let packed = u32::from(offset >> 8) * 0xC0 + u32::from(offset & 0xFF);
            debug_assert!(packed >> 13 == 0);
            bits.append_bits(packed, 13)?;
        }
        Ok(Self::new(QrSegmentMode::Kanji, data.len() / 2, bits))
    }

    /// Creates a segment representing an Extended Channel Interpretation
    /// (ECI) designator with the given assignment value.
    pub fn make_eci(assign_value: u32) -> Result<Self, QrError> {
        let mut bits = BitBuffer::new();
        if assign_value < 1 << 7 {
            bits.append_bits(assign_value, 8)?;
        } else if assign_value < 1 << 14 {
            bits.append_bits(0b10, 2)?;
            bits.append_bits(assign_value, 14)?;
        } else if assign_value < 1_000_000 {
            bits.append_bits(0b110, 3)?;
            bits.append_bits(assign_value, 21)?;
        } else {
            return Err(QrError::InvalidArgument(
                "ECI assignment value out of range",
            ));
        }
        Ok(Self::new(QrSegmentMode::Eci, 0, bits))
    }

    /// Splits text into segments using the cheapest whole-string mode:
    /// numeric if every character is a digit, alphanumeric if every
    /// character is in the alphanumeric charset, otherwise a single byte
    /// segment over the UTF-8 encoding.
    pub fn make_segments(text: &str) -> Result<Vec<Self>, QrError> {
        if text.is_empty() {
            Ok(vec![])
        } else if Self::is_numeric(text) {
            Ok(vec![Self::make_numeric(text)?])
        } else if Self::is_alphanumeric(text) {
            Ok(vec![Self::make_alphanumeric(text)?])
        } else {
            Ok(vec![Self::make_bytes(text.as_bytes())?])
        }
    }

    /// Tests whether the string can be encoded in numeric mode.
    pub fn is_numeric(text: &str) -> bool {
        text.bytes().all(|b| b.is_ascii_digit())
    }

    /// Tests whether the string can be encoded in alphanumeric mode.
    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }

    /// This segment's mode.
    pub fn mode(&self) -> QrSegmentMode {
        self.mode
    }

    /// The number of characters (not necessarily bytes or bits) this
    /// segment represents.
    pub fn num_chars(&self) -> usize {
        self.num_chars
    }

    /// The length of this segment's payload in bits.
    pub fn bit_length(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn data(&self) -> &BitBuffer {
        &self.data
    }

    /// Returns the total number of bits needed to encode the given segments
    /// at the given version: 4 mode bits, the character count field, and the
    /// payload, per segment. Returns `None` when a character count does not
    /// fit its field or the sum overflows.
    pub(crate) fn total_bits(segs: &[Self], version: Version) -> Option<usize> {
        let mut result: usize = 0;
        for seg in segs {
            let ccbits = seg.mode.num_char_count_bits(version);
            if let Some(limit) = 1usize.checked_shl(ccbits.into()) {
                if seg.num_chars >= limit {
                    return None;
                }
            }
            result = result.checked_add(4 + usize::from(ccbits))?;
            result = result.checked_add(seg.data.len())?;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_bits(seg: &QrSegment) -> Vec<u8> {
        (0..seg.bit_length()).map(|i| seg.data().get_bit(i)).collect()
    }

    fn bits_of(value: u32, count: usize) -> Vec<u8> {
        (0..count)
            .rev()
            .map(|i| ((value >> i) & 1) as u8)
            .collect()
    }

    #[test]
    fn is_numeric_cases() {
        assert!(QrSegment::is_numeric("1"));
        assert!(QrSegment::is_numeric("1234567890"));
        assert!(QrSegment::is_numeric(""));
        assert!(!QrSegment::is_numeric("-1"));
        assert!(!QrSegment::is_numeric("1\n2"));
        assert!(!QrSegment::is_numeric("1 2 "));
        assert!(!QrSegment::is_numeric("FOOBAR"));
    }

    #[test]
    fn is_alphanumeric_cases() {
        assert!(QrSegment::is_alphanumeric("A"));
        assert!(QrSegment::is_alphanumeric("FOO BAR"));
        assert!(QrSegment::is_alphanumeric("$%*+-./:"));
        assert!(QrSegment::is_alphanumeric("11 2234"));
        assert!(QrSegment::is_alphanumeric(""));
        assert!(!QrSegment::is_alphanumeric(";"));
        assert!(!QrSegment::is_alphanumeric("foobar"));
        assert!(!QrSegment::is_alphanumeric("FOO\tBAR"));
        assert!(!QrSegment::is_alphanumeric("(FOO) "));
    }

    #[test]
    fn numeric_grouping() {
        // 8 digits: 012 345 67 -> 10 + 10 + 7 bits.
        let seg = QrSegment::make_numeric("01234567").unwrap();
        assert_eq!(seg.mode(), QrSegmentMode::Numeric);
        assert_eq!(seg.num_chars(), 8);
        assert_eq!(seg.bit_length(), 27);
        let mut expected = bits_of(12, 10);
        expected.extend(bits_of(345, 10));
        expected.extend(bits_of(67, 7));
        assert_eq!(payload_bits(&seg), expected);
    }

    #[test]
    fn numeric_rejects_other_characters() {
        assert!(QrSegment::make_numeric("foo").is_err());
        assert!(QrSegment::make_numeric("12a").is_err());
    }

    #[test]
    fn alphanumeric_pairing() {
        // "AC-42": (10,12) (41,4) (2) -> 11 + 11 + 6 bits.
        let seg = QrSegment::make_alphanumeric("AC-42").unwrap();
        assert_eq!(seg.num_chars(), 5);
        assert_eq!(seg.bit_length(), 28);
        let mut expected = bits_of(10 * 45 + 12, 11);
        expected.extend(bits_of(41 * 45 + 4, 11));
        expected.extend(bits_of(2, 6));
        assert_eq!(payload_bits(&seg), expected);
    }

    #[test]
    fn alphanumeric_rejects_lowercase() {
        assert!(QrSegment::make_alphanumeric("foo").is_err());
        assert!(QrSegment::make_alphanumeric("FOO").is_ok());
    }

    #[test]
    fn byte_mode_is_verbatim() {
        let seg = QrSegment::make_bytes(&[0x00, 0xFF, 0x41]).unwrap();
        assert_eq!(seg.mode(), QrSegmentMode::Byte);
        assert_eq!(seg.num_chars(), 3);
        assert_eq!(seg.bit_length(), 24);
        let mut expected = bits_of(0x00, 8);
        expected.extend(bits_of(0xFF, 8));
        expected.extend(bits_of(0x41, 8));
        assert_eq!(payload_bits(&seg), expected);
    }

    #[test]
    fn kanji_packs_iso_example() {
        // Shift_JIS "点茗" from the symbology standard's worked example.
        let seg = QrSegment::make_kanji(b"\x93\x5f\xe4\xaa").unwrap();
        assert_eq!(seg.mode(), QrSegmentMode::Kanji);
        assert_eq!(seg.num_chars(), 2);
        assert_eq!(seg.bit_length(), 26);
        let mut expected = bits_of(0x0D9F, 13);
        expected.extend(bits_of(0x1AAA, 13));
        assert_eq!(payload_bits(&seg), expected);
    }

    #[test]
    fn kanji_subset_boundaries() {
        for (pair, packed) in [
            ([0x81u8, 0x40u8], 0u32),
            ([0x9F, 0xFC], 30 * 0xC0 + 0xBC),
            ([0xE0, 0x40], 31 * 0xC0),
            ([0xEB, 0xBF], 8191),
        ] {
            let seg = QrSegment::make_kanji(&pair).unwrap();
            assert_eq!(payload_bits(&seg), bits_of(packed, 13), "pair {:02X?}", pair);
        }
    }

    #[test]
    fn kanji_rejects_bad_input() {
        assert!(QrSegment::make_kanji(b"\x93").is_err());
        assert!(QrSegment::make_kanji(b"\x80\x40").is_err());
        assert!(QrSegment::make_kanji(b"\xA0\x00").is_err());
        assert!(QrSegment::make_kanji(b"\xEC\x40").is_err());
    }

    #[test]
    fn eci_designator_widths() {
        assert_eq!(QrSegment::make_eci(0).unwrap().bit_length(), 8);
        assert_eq!(QrSegment::make_eci(127).unwrap().bit_length(), 8);
        assert_eq!(QrSegment::make_eci(128).unwrap().bit_length(), 16);
        assert_eq!(QrSegment::make_eci(16383).unwrap().bit_length(), 16);
        assert_eq!(QrSegment::make_eci(16384).unwrap().bit_length(), 24);
        assert_eq!(QrSegment::make_eci(999_999).unwrap().bit_length(), 24);
        assert!(QrSegment::make_eci(1_000_000).is_err());
    }

    #[test]
    fn segmenter_picks_cheapest_whole_string_mode() {
        let segs = QrSegment::make_segments("0123456789").unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].mode(), QrSegmentMode::Numeric);

        let segs = QrSegment::make_segments("HELLO WORLD").unwrap();
        assert_eq!(segs[0].mode(), QrSegmentMode::Alphanumeric);

        let segs = QrSegment::make_segments("Hello, world!").unwrap();
        assert_eq!(segs[0].mode(), QrSegmentMode::Byte);

        assert!(QrSegment::make_segments("").unwrap().is_empty());
    }

    #[test]
    fn total_bits_counts_header_and_payload() {
        let segs = vec![QrSegment::make_numeric("01234567").unwrap()];
        // 4 mode bits + 10 count bits + 27 payload bits at version 1.
        assert_eq!(
            QrSegment::total_bits(&segs, Version::new(1)),
            Some(4 + 10 + 27)
        );
        // Wider count field in the top version range.
        assert_eq!(
            QrSegment::total_bits(&segs, Version::new(40)),
            Some(4 + 14 + 27)
        );
    }

    #[test]
    fn total_bits_rejects_oversized_char_count() {
        // 512 bytes cannot be described by the 8-bit byte-mode count field
        // used by versions 1-9.
        let segs = vec![QrSegment::make_bytes(&[0u8; 512]).unwrap()];
        assert_eq!(QrSegment::total_bits(&segs, Version::new(9)), None);
        assert!(QrSegment::total_bits(&segs, Version::new(10)).is_some());
    }
}
