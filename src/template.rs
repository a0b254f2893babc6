//! Per-version precomputed artifacts: the base module grid with function
//! patterns drawn, the eight mask overlays, and the zig-zag data output
//! order. Everything here depends only on the version number, so instances
//! are built once and shared.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::memoize::Memoizer;
use crate::qrcode::Version;

static TEMPLATES: Lazy<Memoizer<Version, VersionTemplate>> =
    Lazy::new(|| Memoizer::new(|&ver| VersionTemplate::build(ver)));

/// The parts of a QR Code that depend only on the version number, not on
/// the data, error correction level, or mask.
pub(crate) struct VersionTemplate {
    /// Symbol width and height in modules, equal to version * 4 + 17.
    pub size: i32,
    /// Base module grid with all function patterns drawn. Packed bitwise:
    /// module index `i = y * size + x` is bit `i & 31` of word `i >> 5`.
    pub template: Vec<u32>,
    /// Eight mask overlays with the same packing as `template`. Overlay
    /// bits are zero at function modules, so applying a mask is a plain
    /// word-by-word XOR against the grid.
    pub masks: [Vec<u32>; 8],
    /// Module indexes to write codeword bits into, in output order. Length
    /// equals `8 * (num_raw_data_modules(version) / 8)`; the few remainder
    /// modules stay light.
    pub data_output_indexes: Vec<u32>,
}

impl VersionTemplate {
    /// Returns the shared template for the given version.
    pub fn for_version(ver: Version) -> Arc<Self> {
        TEMPLATES.get(ver)
    }

    fn build(ver: Version) -> Self {
        let mut builder = TemplateBuilder::new(ver);
        builder.draw_function_patterns();
        let masks = builder.generate_masks();
        let data_output_indexes = builder.generate_zigzag_scan();
        trace!(version = ver.value(), "built version template");
        Self {
            size: builder.size,
            template: builder.template,
            masks,
            data_output_indexes,
        }
    }

    /// Returns the number of data bits that can be stored in a QR Code of
    /// the given version, after all function modules are excluded. This
    /// includes remainder bits, so it might not be a multiple of 8. The
    /// result is in the range [208, 29648].
    pub fn num_raw_data_modules(ver: Version) -> usize {
        let ver = usize::from(ver.value());
        let mut result = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let num_align = ver / 7 + 2;
            result -= (25 * num_align - 10) * num_align - 55;
            if ver >= 7 {
                result -= 36;
            }
        }
        result
    }

    /// Returns an ascending list of positions of alignment patterns for
    /// this version. Each position is used on both axes; the list is empty
    /// for version 1.
    pub fn alignment_pattern_positions(ver: Version) -> Vec<i32> {
        let version = i32::from(ver.value());
        if version == 1 {
            return vec![];
        }
        let size = version * 4 + 17;
        let num_align = version / 7 + 2;
        // Version 32 is the one exception to the even-spacing formula.
        let step = if version == 32 {
            26
        } else {
            (version * 4 + num_align * 2 + 1) / (num_align * 2 - 2) * 2
        };
        let mut result = vec![0i32; num_align as usize];
        result[0] = 6;
        let mut pos = size - 7;
        for slot in result.iter_mut().skip(1).rev() {
            *slot = pos;
            pos -= step;
        }
        result
    }
}

/// Scratch state while drawing a template: the grid under construction plus
/// the function-module bitmap, which is discarded once the masks and scan
/// order have been derived from it.
struct TemplateBuilder {
    version: Version,
    size: i32,
    template: Vec<u32>,
    is_function: Vec<u32>,
}

impl TemplateBuilder {
    fn new(ver: Version) -> Self {
        let size = i32::from(ver.value()) * 4 + 17;
        let words = (size * size + 31) as usize / 32;
        Self {
            version: ver,
            size,
            template: vec![0u32; words],
            is_function: vec![0u32; words],
        }
    }

    /// Reads the bit at the given coordinates in `grid`.
    fn get_module(&self, grid: &[u32], x: i32, y: i32) -> u32 {
        debug_assert!(0 <= x && x < self.size && 0 <= y && y < self.size);
        let i = (y * self.size + x) as usize;
        (grid[i >> 5] >> (i & 31)) & 1
    }

    /// Marks the module at the given coordinates as a function module, and
    /// sets it dark iff `enable` is 1.
    fn darken_function_module(&mut self, x: i32, y: i32, enable: u32) {
        debug_assert!(0 <= x && x < self.size && 0 <= y && y < self.size);
        debug_assert!(enable <= 1);
        let i = (y * self.size + x) as usize;
        self.template[i >> 5] |= enable << (i & 31);
        self.is_function[i >> 5] |= 1 << (i & 31);
    }

    /// Draws and marks all function modules.
    fn draw_function_patterns(&mut self) {
        let size = self.size;

        // Horizontal and vertical timing patterns.
        for i in 0..size {
            self.darken_function_module(6, i, (!i & 1) as u32);
            self.darken_function_module(i, 6, (!i & 1) as u32);
        }

        // Three finder patterns; these overwrite some timing modules.
        self.draw_finder_pattern(3, 3);
        self.draw_finder_pattern(size - 4, 3);
        self.draw_finder_pattern(3, size - 4);

        // Alignment patterns everywhere except the three finder corners.
        let align_positions = VersionTemplate::alignment_pattern_positions(self.version);
        let num_align = align_positions.len();
        for i in 0..num_align {
            for j in 0..num_align {
                if !(i == 0 && j == 0
                    || i == 0 && j == num_align - 1
                    || i == num_align - 1 && j == 0)
                {
                    self.draw_alignment_pattern(align_positions[i], align_positions[j]);
                }
            }
        }

        self.draw_dummy_format_bits();
        self.draw_version();
    }

    /// Draws a 9x9 finder pattern including the separator ring, centered at
    /// (x, y). Modules may fall out of bounds.
    fn draw_finder_pattern(&mut self, x: i32, y: i32) {
        for dy in -4i32..=4 {
            for dx in -4i32..=4 {
                let dist = dx.abs().max(dy.abs());
                let (xx, yy) = (x + dx, y + dy);
                if (0..self.size).contains(&xx) && (0..self.size).contains(&yy) {
                    let dark = dist != 2 && dist != 4;
                    self.darken_function_module(xx, yy, u32::from(dark));
                }
            }
        }
    }

    /// Draws a 5x5 alignment pattern centered at (x, y): dark center, light
    /// middle ring, dark outer ring. All modules must be in bounds.
    fn draw_alignment_pattern(&mut self, x: i32, y: i32) {
        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let enable = (dx.abs().max(dy.abs()) - 1).unsigned_abs();
                self.darken_function_module(x + dx, y + dy, enable);
            }
        }
    }

    /// Reserves both copies of the format bits as light function modules;
    /// the real bits are drawn over them once the mask is chosen.
    fn draw_dummy_format_bits(&mut self) {
        let size = self.size;

        // First copy, around the top-left finder.
        for i in 0..=5 {
            self.darken_function_module(8, i, 0);
        }
        self.darken_function_module(8, 7, 0);
        self.darken_function_module(8, 8, 0);
        self.darken_function_module(7, 8, 0);
        for i in 9..15 {
            self.darken_function_module(14 - i, 8, 0);
        }

        // Second copy, split between the top-right and bottom-left finders.
        for i in 0..8 {
            self.darken_function_module(size - 1 - i, 8, 0);
        }
        for i in 8..15 {
            self.darken_function_module(8, size - 15 + i, 0);
        }
        self.darken_function_module(8, size - 8, 1); // Always dark
    }

    /// Draws both copies of the version information, iff version >= 7.
    fn draw_version(&mut self) {
        let version = u32::from(self.version.value());
        if version < 7 {
            return;
        }

        // 18-bit codeword: 6-bit version plus 12-bit BCH remainder with
        // generator 0x1F25.
        let mut rem = version;
        for _ in 0..12 {
            rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
        }
        let bits = version << 12 | rem;
        debug_assert!(bits >> 18 == 0);

        for i in 0..18i32 {
            let bit = (bits >> i) & 1;
            let a = self.size - 11 + i % 3;
            let b = i / 3;
            self.darken_function_module(a, b, bit);
            self.darken_function_module(b, a, bit);
        }
    }

    /// Computes the eight mask overlays. Overlay bits are forced to zero at
    /// function modules.
    fn generate_masks(&self) -> [Vec<u32>; 8] {
        let mut result: [Vec<u32>; 8] = Default::default();
        for (mask, overlay) in result.iter_mut().enumerate() {
            *overlay = vec![0u32; self.template.len()];
            let mut i = 0usize;
            for y in 0..self.size {
                for x in 0..self.size {
                    let invert = match mask {
                        0 => (x + y) % 2 == 0,
                        1 => y % 2 == 0,
                        2 => x % 3 == 0,
                        3 => (x + y) % 3 == 0,
                        4 => (x / 3 + y / 2) % 2 == 0,
                        5 => x * y % 2 + x * y % 3 == 0,
                        6 => (x * y % 2 + x * y % 3) % 2 == 0,
                        7 => ((x + y) % 2 + x * y % 3) % 2 == 0,
                        _ => unreachable!(),
                    };
                    let bit = u32::from(invert) & !self.get_module(&self.is_function, x, y);
                    overlay[i >> 5] |= bit << (i & 31);
                    i += 1;
                }
            }
        }
        result
    }

    /// Computes the order in which codeword bits are placed: column pairs
    /// from the right edge leftward (skipping the timing column), zig-zagging
    /// vertically, visiting only non-function modules.
    fn generate_zigzag_scan(&self) -> Vec<u32> {
        let capacity = VersionTemplate::num_raw_data_modules(self.version) / 8 * 8;
        let mut result = Vec::with_capacity(capacity);
        let size = self.size;
        let mut right = size - 1;
        while right >= 1 {
            if right == 6 {
                right = 5;
            }
            for vert in 0..size {
                for j in 0..2 {
                    let x = right - j;
                    let upward = ((right + 1) & 2) == 0;
                    let y = if upward { size - 1 - vert } else { vert };
                    if self.get_module(&self.is_function, x, y) == 0 && result.len() < capacity {
                        result.push((y * size + x) as u32);
                    }
                }
            }
            right -= 2;
        }
        debug_assert_eq!(result.len(), capacity);
        result
    }
}
