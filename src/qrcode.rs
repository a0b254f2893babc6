//! The QR Code symbol type and the encoding pipeline: version selection,
//! bitstream assembly, error correction and interleaving, codeword drawing,
//! masking, and format information.

use tracing::debug;

use crate::bits::BitBuffer;
use crate::error::{DataTooLong, QrError};
use crate::reed_solomon::ReedSolomonGenerator;
use crate::segment::QrSegment;
use crate::template::VersionTemplate;

const PENALTY_N1: i32 = 3;
const PENALTY_N2: i32 = 3;
const PENALTY_N3: i32 = 40;
const PENALTY_N4: i32 = 10;

/// ECC codewords per block, indexed by error correction level ordinal and
/// version number (index 0 is padding, set to an illegal value).
static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

/// Number of error correction blocks, indexed like
/// [`ECC_CODEWORDS_PER_BLOCK`].
static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];

/// Error correction level for a QR Code symbol. Levels are declared in
/// ascending order of error protection.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QrCodeEcc {
    /// Tolerates about 7% erroneous codewords.
    Low,
    /// Tolerates about 15% erroneous codewords.
    Medium,
    /// Tolerates about 25% erroneous codewords.
    Quartile,
    /// Tolerates about 30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    /// Row index into the block tables, in the range 0 to 3.
    fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// The 2-bit value representing this level in the format information.
    pub(crate) fn format_bits(self) -> u8 {
        use QrCodeEcc::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }
}

/// A QR Code version number (1 to 40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.0 <= ver && ver <= Version::MAX.0,
            "version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// A mask pattern number (0 to 7).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Mask(u8);

impl Mask {
    /// Creates a mask object from the given number.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [0, 7].
    pub const fn new(mask: u8) -> Self {
        assert!(mask <= 7, "mask value out of range");
        Self(mask)
    }

    /// Returns the value, which is in the range [0, 7].
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// A QR Code symbol: an immutable square grid of dark and light modules.
///
/// This type covers the QR Code Model 2 specification: all versions (sizes)
/// from 1 to 40, all four error correction levels, and the four character
/// encoding modes.
///
/// Ways to create a QR Code:
///
/// - High level: [`QrCode::encode_text`] or [`QrCode::encode_binary`].
/// - Mid level: custom-make a list of [`QrSegment`]s and call
///   [`QrCode::encode_segments`] or [`QrCode::encode_segments_advanced`].
/// - Low level: custom-make the data codeword bytes (segment headers and
///   final padding included, error correction excluded) and call
///   [`QrCode::new`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct QrCode {
    version: Version,
    size: i32,
    ecl: QrCodeEcc,
    mask: Mask,
    /// Module grid packed bitwise: module index `i = y * size + x` is bit
    /// `i & 31` of word `i >> 5`.
    modules: Vec<u32>,
}

impl QrCode {
    /// Returns a QR Code representing the given Unicode text string at the
    /// given error correction level.
    ///
    /// The smallest possible version is automatically chosen; the ECC level
    /// of the result may be higher than requested if that does not increase
    /// the version. As a conservative upper bound, this function succeeds
    /// for strings of at most 738 Unicode code points at the low error
    /// correction level.
    pub fn encode_text(text: &str, ecl: QrCodeEcc) -> Result<Self, QrError> {
        let segs = QrSegment::make_segments(text)?;
        Self::encode_segments(&segs, ecl)
    }

    /// Returns a QR Code representing the given binary data at the given
    /// error correction level.
    ///
    /// This always encodes one byte-mode segment; the maximum data length
    /// is 2953 bytes. The smallest possible version is automatically
    /// chosen, and the ECC level may be boosted.
    pub fn encode_binary(data: &[u8], ecl: QrCodeEcc) -> Result<Self, QrError> {
        let seg = QrSegment::make_bytes(data)?;
        Self::encode_segments(&[seg], ecl)
    }

    /// Returns a QR Code representing the given segments at the given error
    /// correction level, over the full version range with automatic mask
    /// selection and ECC boosting.
    pub fn encode_segments(segs: &[QrSegment], ecl: QrCodeEcc) -> Result<Self, QrError> {
        Self::encode_segments_advanced(segs, ecl, Version::MIN, Version::MAX, None, true)
    }

    /// Returns a QR Code representing the given segments with the given
    /// encoding parameters.
    ///
    /// The smallest version in `[min_version, max_version]` that fits the
    /// data is chosen. If `boost_ecl` is true, the ECC level is raised as
    /// far as possible without increasing the chosen version. `mask` is
    /// `None` for automatic selection (slower; evaluates the penalty score
    /// of all eight patterns) or a fixed pattern.
    pub fn encode_segments_advanced(
        segs: &[QrSegment],
        ecl: QrCodeEcc,
        min_version: Version,
        max_version: Version,
        mask: Option<Mask>,
        boost_ecl: bool,
    ) -> Result<Self, QrError> {
        if min_version > max_version {
            return Err(QrError::InvalidArgument("invalid version range"));
        }

        // Find the minimal version number to use.
        let mut version = min_version;
        let data_used_bits = loop {
            let data_capacity_bits = Self::num_data_codewords(version, ecl) * 8;
            let data_used = QrSegment::total_bits(segs, version);
            match data_used {
                Some(n) if n <= data_capacity_bits => break n,
                _ if version >= max_version => {
                    return Err(match data_used {
                        None => DataTooLong::SegmentTooLong.into(),
                        Some(n) => DataTooLong::DataOverCapacity(n, data_capacity_bits).into(),
                    });
                }
                _ => version = Version::new(version.value() + 1),
            }
        };

        // Increase the error correction level while the data still fits in
        // the current version number.
        let mut ecl = ecl;
        for new_ecl in [QrCodeEcc::Medium, QrCodeEcc::Quartile, QrCodeEcc::High] {
            if boost_ecl && data_used_bits <= Self::num_data_codewords(version, new_ecl) * 8 {
                ecl = new_ecl;
            }
        }
        debug!(
            version = version.value(),
            ?ecl,
            data_used_bits,
            "selected version and error correction level"
        );

        // Concatenate all segments to create the data bit string.
        let mut bb = BitBuffer::new();
        for seg in segs {
            bb.append_bits(seg.mode().mode_bits(), 4)?;
            bb.append_bits(seg.num_chars() as u32, seg.mode().num_char_count_bits(version))?;
            bb.append_words(seg.data().words(), seg.data().len())?;
        }
        debug_assert_eq!(bb.len(), data_used_bits);

        // Add terminator and pad up to a byte if applicable.
        let data_capacity_bits = Self::num_data_codewords(version, ecl) * 8;
        debug_assert!(bb.len() <= data_capacity_bits);
        bb.append_bits(0, 4usize.min(data_capacity_bits - bb.len()) as u8)?;
        bb.append_bits(0, ((8 - bb.len() % 8) % 8) as u8)?;
        debug_assert_eq!(bb.len() % 8, 0);

        // Pad with alternating bytes until data capacity is reached.
        for &pad_byte in [0xEC, 0x11].iter().cycle() {
            if bb.len() >= data_capacity_bits {
                break;
            }
            bb.append_bits(pad_byte, 8)?;
        }

        Self::new(version, ecl, &bb.to_bytes()?, mask)
    }

    /// Creates a QR Code with the given version number, error correction
    /// level, data codeword bytes, and mask pattern (`None` for automatic
    /// choice).
    ///
    /// This is a low-level API that most users should not use directly;
    /// `data_codewords` must already contain segment headers and padding,
    /// and its length must equal `num_data_codewords(version, ecl)`.
    pub fn new(
        version: Version,
        ecl: QrCodeEcc,
        data_codewords: &[u8],
        mask: Option<Mask>,
    ) -> Result<Self, QrError> {
        if data_codewords.len() != Self::num_data_codewords(version, ecl) {
            return Err(QrError::InvalidArgument(
                "data codeword length does not match version and error correction level",
            ));
        }
        let template = VersionTemplate::for_version(version);
        let mut result = Self {
            version,
            size: template.size,
            ecl,
            mask: Mask::new(0), // Overwritten by masking below
            modules: template.template.clone(),
        };
        let all_codewords = result.add_ecc_and_interleave(data_codewords);
        result.draw_codewords(&template.data_output_indexes, &all_codewords);
        result.mask = result.handle_constructor_masking(&template.masks, mask);
        Ok(result)
    }

    /// Returns this QR Code's version number.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns this QR Code's size in modules per side, equal to
    /// version × 4 + 17 and in the range [21, 177].
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Returns the error correction level used in this QR Code.
    pub fn error_correction_level(&self) -> QrCodeEcc {
        self.ecl
    }

    /// Returns the mask pattern used in this QR Code. Even when automatic
    /// masking was requested, the result reports the concrete pattern
    /// chosen.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns the color of the module at the given coordinates: `true` for
    /// dark, `false` for light. The top left corner is (0, 0); coordinates
    /// out of bounds return light.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        (0..self.size).contains(&x) && (0..self.size).contains(&y) && self.module_at(x, y)
    }

    /// Reads a module that must be in bounds.
    fn module_at(&self, x: i32, y: i32) -> bool {
        debug_assert!((0..self.size).contains(&x) && (0..self.size).contains(&y));
        let i = (y * self.size + x) as usize;
        (self.modules[i >> 5] >> (i & 31)) & 1 != 0
    }

    /// Sets a module to the given color, clearing any previous value.
    fn set_module(&mut self, x: i32, y: i32, dark: bool) {
        debug_assert!((0..self.size).contains(&x) && (0..self.size).contains(&y));
        let i = (y * self.size + x) as usize;
        self.modules[i >> 5] &= !(1 << (i & 31));
        self.modules[i >> 5] |= u32::from(dark) << (i & 31);
    }

    /// Returns the number of 8-bit data (not error correction) codewords
    /// contained in any QR Code of the given version and error correction
    /// level, with remainder bits discarded.
    pub fn num_data_codewords(ver: Version, ecl: QrCodeEcc) -> usize {
        VersionTemplate::num_raw_data_modules(ver) / 8
            - Self::table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl)
                * Self::table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl)
    }

    fn table_get(table: &'static [[i8; 41]; 4], ver: Version, ecl: QrCodeEcc) -> usize {
        table[ecl.ordinal()][usize::from(ver.value())] as usize
    }

    /// Returns `data` with the error correction codewords of each block
    /// interleaved into the final transmission sequence.
    fn add_ecc_and_interleave(&self, data: &[u8]) -> Vec<u8> {
        assert_eq!(data.len(), Self::num_data_codewords(self.version, self.ecl));

        let num_blocks = Self::table_get(&NUM_ERROR_CORRECTION_BLOCKS, self.version, self.ecl);
        let block_ecc_len = Self::table_get(&ECC_CODEWORDS_PER_BLOCK, self.version, self.ecl);
        let raw_codewords = VersionTemplate::num_raw_data_modules(self.version) / 8;
        let num_short_blocks = num_blocks - raw_codewords % num_blocks;
        let short_block_data_len = raw_codewords / num_blocks - block_ecc_len;

        // Split the data into blocks, compute the ECC of each, and
        // interleave (not concatenate) the bytes into a single sequence.
        let mut result = vec![0u8; raw_codewords];
        let rs = ReedSolomonGenerator::for_degree(block_ecc_len);
        let mut ecc = vec![0u8; block_ecc_len];
        let mut k = 0usize;
        for i in 0..num_blocks {
            let dat_len = short_block_data_len + usize::from(i >= num_short_blocks);
            rs.remainder_into(&data[k..k + dat_len], &mut ecc);
            let mut l = i;
            for j in 0..dat_len {
                if j == short_block_data_len {
                    l -= num_short_blocks;
                }
                result[l] = data[k + j];
                l += num_blocks;
            }
            let mut l = data.len() + i;
            for &byte in &ecc {
                result[l] = byte;
                l += num_blocks;
            }
            k += dat_len;
        }
        debug_assert_eq!(k, data.len());
        result
    }

    /// Draws the given sequence of 8-bit codewords (data and error
    /// correction) onto the data area, following the template's output
    /// order.
    fn draw_codewords(&mut self, data_output_indexes: &[u32], all_codewords: &[u8]) {
        assert_eq!(all_codewords.len() * 8, data_output_indexes.len());
        for (i, &j) in data_output_indexes.iter().enumerate() {
            let bit = u32::from(all_codewords[i >> 3] >> (7 - (i & 7))) & 1;
            self.modules[j as usize >> 5] |= bit << (j & 31);
        }
    }

    /// XORs the codeword modules with the given mask overlay. Overlay bits
    /// are zero at function modules, so those are untouched; applying the
    /// same overlay twice undoes it.
    fn apply_mask(&mut self, overlay: &[u32]) {
        debug_assert_eq!(overlay.len(), self.modules.len());
        for (word, &mask_word) in self.modules.iter_mut().zip(overlay) {
            *word ^= mask_word;
        }
    }

    /// Applies the requested mask, or scores all eight and applies the one
    /// with the lowest penalty (ties go to the lowest pattern number).
    /// Returns the pattern applied. The grid must be unmasked on entry.
    fn handle_constructor_masking(&mut self, masks: &[Vec<u32>; 8], mask: Option<Mask>) -> Mask {
        let chosen = match mask {
            Some(m) => m,
            None => {
                let mut best = Mask::new(0);
                let mut min_penalty = i32::MAX;
                for i in 0..8u8 {
                    let candidate = Mask::new(i);
                    self.apply_mask(&masks[usize::from(i)]);
                    self.draw_format_bits(candidate);
                    let penalty = self.get_penalty_score();
                    if penalty < min_penalty {
                        best = candidate;
                        min_penalty = penalty;
                    }
                    self.apply_mask(&masks[usize::from(i)]); // Undoes the mask due to XOR
                }
                debug!(mask = best.value(), penalty = min_penalty, "selected mask");
                best
            }
        };
        self.apply_mask(&masks[usize::from(chosen.value())]);
        self.draw_format_bits(chosen);
        chosen
    }

    /// Draws two copies of the format bits (with their own error correction
    /// code) for the given mask and this object's error correction level.
    fn draw_format_bits(&mut self, mask: Mask) {
        // 15-bit codeword: 5 data bits, 10-bit BCH remainder with generator
        // 0x537, XORed with the fixed pattern 0x5412.
        let data = u32::from(self.ecl.format_bits() << 3 | mask.value());
        let mut rem = data;
        for _ in 0..10 {
            rem = (rem << 1) ^ ((rem >> 9) * 0x537);
        }
        let bits = (data << 10 | rem) ^ 0x5412;
        debug_assert!(bits >> 15 == 0);
        let bit = |i: i32| (bits >> i) & 1 != 0;

        // First copy, around the top-left finder.
        for i in 0..=5 {
            self.set_module(8, i, bit(i));
        }
        self.set_module(8, 7, bit(6));
        self.set_module(8, 8, bit(7));
        self.set_module(7, 8, bit(8));
        for i in 9..15 {
            self.set_module(14 - i, 8, bit(i));
        }

        // Second copy, split between the other two finders.
        let size = self.size;
        for i in 0..8 {
            self.set_module(size - 1 - i, 8, bit(i));
        }
        for i in 8..15 {
            self.set_module(8, size - 15 + i, bit(i));
        }
        self.set_module(8, size - 8, true); // Always dark
    }

    /// Calculates the penalty score of the current module state. Used by
    /// the automatic mask choice to find the pattern yielding the lowest
    /// score.
    fn get_penalty_score(&self) -> i32 {
        let mut result: i32 = 0;
        let size = self.size;

        // Adjacent modules in row having same color, and finder-like
        // patterns.
        for y in 0..size {
            let mut run_color = false;
            let mut run_x: i32 = 0;
            let mut run_history = FinderPenalty::new(size);
            for x in 0..size {
                if self.module_at(x, y) == run_color {
                    run_x += 1;
                    if run_x == 5 {
                        result += PENALTY_N1;
                    } else if run_x > 5 {
                        result += 1;
                    }
                } else {
                    run_history.add_history(run_x);
                    if !run_color {
                        result += run_history.count_patterns() * PENALTY_N3;
                    }
                    run_color = self.module_at(x, y);
                    run_x = 1;
                }
            }
            result += run_history.terminate_and_count(run_color, run_x) * PENALTY_N3;
        }

        // Adjacent modules in column having same color, and finder-like
        // patterns.
        for x in 0..size {
            let mut run_color = false;
            let mut run_y: i32 = 0;
            let mut run_history = FinderPenalty::new(size);
            for y in 0..size {
                if self.module_at(x, y) == run_color {
                    run_y += 1;
                    if run_y == 5 {
                        result += PENALTY_N1;
                    } else if run_y > 5 {
                        result += 1;
                    }
                } else {
                    run_history.add_history(run_y);
                    if !run_color {
                        result += run_history.count_patterns() * PENALTY_N3;
                    }
                    run_color = self.module_at(x, y);
                    run_y = 1;
                }
            }
            result += run_history.terminate_and_count(run_color, run_y) * PENALTY_N3;
        }

        // 2x2 blocks of modules having same color.
        for y in 0..size - 1 {
            for x in 0..size - 1 {
                let color = self.module_at(x, y);
                if color == self.module_at(x + 1, y)
                    && color == self.module_at(x, y + 1)
                    && color == self.module_at(x + 1, y + 1)
                {
                    result += PENALTY_N2;
                }
            }
        }

        // Balance of dark and light modules.
        let dark = self.modules.iter().map(|w| w.count_ones()).sum::<u32>() as i32;
        let total = size * size; // Size is odd, so dark/total != 1/2
        // Smallest k >= 0 such that (45-5k)% <= dark/total <= (55+5k)%.
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        result += k * PENALTY_N4;
        result
    }
}

/// Sliding window of run lengths along one line, for detecting the
/// 1:1:3:1:1 finder-like pattern with its light border.
struct FinderPenalty {
    qr_size: i32,
    run_history: [i32; 7],
}

impl FinderPenalty {
    fn new(size: i32) -> Self {
        Self {
            qr_size: size,
            run_history: [0; 7],
        }
    }

    /// Pushes the given run length to the front, dropping the oldest entry.
    fn add_history(&mut self, mut current_run_length: i32) {
        if self.run_history[0] == 0 {
            current_run_length += self.qr_size; // Add light border to initial run
        }
        self.run_history.copy_within(0..6, 1);
        self.run_history[0] = current_run_length;
    }

    /// Can only be called immediately after a light run is added; returns
    /// 0, 1, or 2 depending on how many sides of the core pattern carry a
    /// qualifying light border.
    fn count_patterns(&self) -> i32 {
        let rh = &self.run_history;
        let n = rh[1];
        debug_assert!(n <= self.qr_size * 3);
        let core = n > 0 && rh[2] == n && rh[3] == n * 3 && rh[4] == n && rh[5] == n;
        i32::from(core && rh[0] >= n * 4 && rh[6] >= n)
            + i32::from(core && rh[6] >= n * 4 && rh[0] >= n)
    }

    /// Terminates the line, treating the edge as a light border.
    fn terminate_and_count(mut self, current_run_color: bool, mut current_run_length: i32) -> i32 {
        if current_run_color {
            self.add_history(current_run_length);
            current_run_length = 0;
        }
        current_run_length += self.qr_size; // Add light border to final run
        self.add_history(current_run_length);
        self.count_patterns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::QrSegmentMode;

    fn all_versions() -> impl Iterator<Item = Version> {
        (Version::MIN.value()..=Version::MAX.value()).map(Version::new)
    }

    const ALL_ECLS: [QrCodeEcc; 4] = [
        QrCodeEcc::Low,
        QrCodeEcc::Medium,
        QrCodeEcc::Quartile,
        QrCodeEcc::High,
    ];

    #[test]
    fn num_data_codewords_known_values() {
        assert_eq!(QrCode::num_data_codewords(Version::new(1), QrCodeEcc::Low), 19);
        assert_eq!(QrCode::num_data_codewords(Version::new(1), QrCodeEcc::Medium), 16);
        assert_eq!(QrCode::num_data_codewords(Version::new(1), QrCodeEcc::Quartile), 13);
        assert_eq!(QrCode::num_data_codewords(Version::new(1), QrCodeEcc::High), 9);
        assert_eq!(QrCode::num_data_codewords(Version::new(40), QrCodeEcc::Low), 2956);
        assert_eq!(QrCode::num_data_codewords(Version::new(40), QrCodeEcc::High), 1276);
    }

    #[test]
    fn block_tables_are_consistent() {
        for ver in all_versions() {
            let raw_codewords = VersionTemplate::num_raw_data_modules(ver) / 8;
            for ecl in ALL_ECLS {
                let num_blocks = QrCode::table_get(&NUM_ERROR_CORRECTION_BLOCKS, ver, ecl);
                let block_ecc_len = QrCode::table_get(&ECC_CODEWORDS_PER_BLOCK, ver, ecl);
                let data = QrCode::num_data_codewords(ver, ecl);
                assert!(data >= 1);
                assert_eq!(data + num_blocks * block_ecc_len, raw_codewords);
                // Every block must hold at least one data codeword.
                assert!(raw_codewords / num_blocks > block_ecc_len);
            }
        }
    }

    #[test]
    fn hello_world_boosts_to_medium() {
        let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Low).unwrap();
        assert_eq!(qr.version(), Version::new(1));
        assert_eq!(qr.size(), 21);
        assert_eq!(qr.error_correction_level(), QrCodeEcc::Medium);
        assert!(qr.mask().value() <= 7);
        // Top-left finder corner is dark; out-of-bounds reads are light.
        assert!(qr.get_module(0, 0));
        assert!(!qr.get_module(-1, 0));
        assert!(!qr.get_module(0, 21));
    }

    #[test]
    fn pi_digits_use_numeric_mode() {
        let digits = "314159265358979323846264338327950288419716939937510";
        let segs = QrSegment::make_segments(digits).unwrap();
        assert_eq!(segs[0].mode(), QrSegmentMode::Numeric);
        let qr = QrCode::encode_text(digits, QrCodeEcc::Medium).unwrap();
        assert!(qr.version() <= Version::new(3));
    }

    #[test]
    fn empty_input_yields_version_one() {
        let qr = QrCode::encode_text("", QrCodeEcc::Low).unwrap();
        assert_eq!(qr.version(), Version::new(1));
        assert_eq!(qr.size(), 21);
    }

    #[test]
    fn mixed_segments_beat_single_byte_segment() {
        let silver0 = "THE SQUARE ROOT OF 2 IS 1.";
        let silver1 = "41421356237309504880168872420969807856967187537694807317667973799";
        let segs = vec![
            QrSegment::make_alphanumeric(silver0).unwrap(),
            QrSegment::make_numeric(silver1).unwrap(),
        ];
        let concatenated = format!("{}{}", silver0, silver1);
        let byte_seg = vec![QrSegment::make_bytes(concatenated.as_bytes()).unwrap()];

        let ver = Version::new(4);
        let mixed_bits = QrSegment::total_bits(&segs, ver).unwrap();
        let byte_bits = QrSegment::total_bits(&byte_seg, ver).unwrap();
        assert!(mixed_bits < byte_bits);

        let qr = QrCode::encode_segments(&segs, QrCodeEcc::Low).unwrap();
        assert!(qr.version() <= Version::new(3));
    }

    #[test]
    fn low_level_constructor_checks_codeword_length() {
        let err = QrCode::new(Version::new(1), QrCodeEcc::Low, &[0u8; 16], Some(Mask::new(0)));
        assert!(matches!(err, Err(QrError::InvalidArgument(_))));

        let qr =
            QrCode::new(Version::new(1), QrCodeEcc::Low, &[0u8; 19], Some(Mask::new(0))).unwrap();
        assert_eq!(qr.version(), Version::new(1));
        assert_eq!(qr.mask(), Mask::new(0));
    }

    #[test]
    fn boost_never_weakens_and_never_grows_the_version() {
        let text = "BOOST";
        for requested in ALL_ECLS {
            let unboosted = QrCode::encode_segments_advanced(
                &QrSegment::make_segments(text).unwrap(),
                requested,
                Version::MIN,
                Version::MAX,
                None,
                false,
            )
            .unwrap();
            let boosted = QrCode::encode_segments_advanced(
                &QrSegment::make_segments(text).unwrap(),
                requested,
                Version::MIN,
                Version::MAX,
                None,
                true,
            )
            .unwrap();
            assert!(boosted.error_correction_level() >= requested);
            assert_eq!(boosted.version(), unboosted.version());
        }
    }

    #[test]
    fn auto_mask_matches_forced_best_mask() {
        let segs = QrSegment::make_segments("https://www.example.com/").unwrap();
        let auto = QrCode::encode_segments(&segs, QrCodeEcc::High).unwrap();
        let forced = QrCode::encode_segments_advanced(
            &segs,
            QrCodeEcc::High,
            Version::MIN,
            Version::MAX,
            Some(auto.mask()),
            true,
        )
        .unwrap();
        assert_eq!(auto, forced);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = QrCode::encode_text("determinism", QrCodeEcc::Quartile).unwrap();
        let b = QrCode::encode_text("determinism", QrCodeEcc::Quartile).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.mask(), b.mask());
    }

    #[test]
    fn forced_masks_are_respected() {
        let segs = QrSegment::make_segments("MASKS").unwrap();
        for m in 0..8u8 {
            let qr = QrCode::encode_segments_advanced(
                &segs,
                QrCodeEcc::Low,
                Version::MIN,
                Version::MAX,
                Some(Mask::new(m)),
                true,
            )
            .unwrap();
            assert_eq!(qr.mask(), Mask::new(m));
        }
    }

    /// Reads the first copy of the format information back out of the grid.
    fn read_format_bits(qr: &QrCode) -> u32 {
        let mut bits = 0u32;
        for i in 0..=5 {
            bits |= u32::from(qr.get_module(8, i)) << i;
        }
        bits |= u32::from(qr.get_module(8, 7)) << 6;
        bits |= u32::from(qr.get_module(8, 8)) << 7;
        bits |= u32::from(qr.get_module(7, 8)) << 8;
        for i in 9..15 {
            bits |= u32::from(qr.get_module(14 - i, 8)) << i;
        }
        bits
    }

    #[test]
    fn format_information_round_trips() {
        for m in [0u8, 3, 7] {
            let qr = QrCode::encode_segments_advanced(
                &QrSegment::make_segments("FORMAT").unwrap(),
                QrCodeEcc::Quartile,
                Version::MIN,
                Version::MAX,
                Some(Mask::new(m)),
                false,
            )
            .unwrap();
            let unmasked = read_format_bits(&qr) ^ 0x5412;
            let data = unmasked >> 10;
            assert_eq!(data, u32::from(QrCodeEcc::Quartile.format_bits() << 3 | m));
            // The 10-bit remainder must check out.
            let mut rem = data;
            for _ in 0..10 {
                rem = (rem << 1) ^ ((rem >> 9) * 0x537);
            }
            assert_eq!(unmasked & 0x3FF, rem);
            // The dark module is always present.
            assert!(qr.get_module(8, qr.size() - 8));
        }
    }

    #[test]
    fn version_information_appears_at_version_seven() {
        let segs = QrSegment::make_segments("VERSION INFO").unwrap();
        let qr = QrCode::encode_segments_advanced(
            &segs,
            QrCodeEcc::Low,
            Version::new(7),
            Version::new(7),
            None,
            true,
        )
        .unwrap();
        assert_eq!(qr.version(), Version::new(7));
        let size = qr.size();
        // Published 18-bit version information codeword for version 7.
        let bits: u32 = 0x07C94;
        for i in 0..18i32 {
            let expected = (bits >> i) & 1 != 0;
            let a = size - 11 + i % 3;
            let b = i / 3;
            assert_eq!(qr.get_module(a, b), expected, "bit {}", i);
            assert_eq!(qr.get_module(b, a), expected, "bit {} transposed", i);
        }
    }

    #[test]
    fn version_forty_high_byte_capacity() {
        let qr = QrCode::encode_binary(&[0x5A; 1273], QrCodeEcc::High).unwrap();
        assert_eq!(qr.version(), Version::new(40));
        assert_eq!(qr.size(), 177);
        assert_eq!(qr.error_correction_level(), QrCodeEcc::High);

        let err = QrCode::encode_binary(&[0x5A; 1274], QrCodeEcc::High);
        assert!(matches!(err, Err(ref e) if e.is_data_too_long()));
    }

    #[test]
    fn data_too_long_reports_bits_and_capacity() {
        let err = QrCode::encode_segments_advanced(
            &[QrSegment::make_bytes(&[0u8; 20]).unwrap()],
            QrCodeEcc::Low,
            Version::new(1),
            Version::new(1),
            None,
            true,
        )
        .unwrap_err();
        match err {
            QrError::DataTooLong(DataTooLong::DataOverCapacity(used, capacity)) => {
                assert_eq!(used, 4 + 8 + 160);
                assert_eq!(capacity, 19 * 8);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejects_inverted_version_range() {
        let err = QrCode::encode_segments_advanced(
            &[],
            QrCodeEcc::Low,
            Version::new(2),
            Version::new(1),
            None,
            true,
        );
        assert!(matches!(err, Err(QrError::InvalidArgument(_))));
    }

    #[test]
    fn kanji_segments_encode_end_to_end() {
        let seg = QrSegment::make_kanji(b"\x93\x5f\xe4\xaa").unwrap();
        let qr = QrCode::encode_segments(&[seg], QrCodeEcc::Low).unwrap();
        assert_eq!(qr.version(), Version::new(1));
    }

    #[test]
    fn alignment_pattern_appears_at_version_two() {
        // Module (18, 18) is the center of the alignment pattern at version
        // 2; its immediate neighbors form the light middle ring.
        let qr = QrCode::encode_segments_advanced(
            &QrSegment::make_segments("1").unwrap(),
            QrCodeEcc::Low,
            Version::new(2),
            Version::new(2),
            None,
            true,
        )
        .unwrap();
        assert_eq!(qr.version(), Version::new(2));
        assert!(qr.get_module(18, 18));
        let ring_light = [(17, 18), (18, 17), (19, 18), (18, 19), (17, 17), (19, 19)];
        assert!(ring_light.iter().all(|&(x, y)| !qr.get_module(x, y)));
    }
}
