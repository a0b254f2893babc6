//! Reed-Solomon error correction codeword generation over GF(2⁸)/0x11D.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::trace;

use crate::gf;
use crate::memoize::Memoizer;

static GENERATORS: Lazy<Memoizer<usize, ReedSolomonGenerator>> =
    Lazy::new(|| Memoizer::new(|&degree| ReedSolomonGenerator::build(degree)));

/// Computes Reed-Solomon error correction codewords for given data
/// codewords.
///
/// Instances are immutable and keyed by polynomial degree; obtain them
/// through [`ReedSolomonGenerator::for_degree`], which shares one generator
/// per distinct degree.
pub struct ReedSolomonGenerator {
    degree: usize,
    /// Flat 256×degree table: row `v` holds `multiply(v, coefficients[j])`
    /// for each coefficient of the divisor polynomial.
    rows: Vec<u8>,
}

impl ReedSolomonGenerator {
    /// Returns the shared generator for the given degree.
    ///
    /// # Panics
    ///
    /// Panics if `degree` is not in `[1, 255]`.
    pub fn for_degree(degree: usize) -> Arc<Self> {
        assert!((1..=255).contains(&degree), "degree out of range");
        GENERATORS.get(degree)
    }

    fn build(degree: usize) -> Self {
        debug_assert!((1..=255).contains(&degree));

        // The divisor polynomial, coefficients stored from highest to lowest
        // power, dropping the leading 1x^degree term. Start with the
        // monomial x^0 and multiply by (x - r^i) for each successive power
        // of the generator element 0x02.
        let mut coefficients = vec![0u8; degree];
        coefficients[degree - 1] = 1;
        let mut root: u8 = 1;
        for _ in 0..degree {
            for j in 0..degree {
                coefficients[j] = gf::multiply(coefficients[j], root);
                if j + 1 < degree {
                    coefficients[j] ^= coefficients[j + 1];
                }
            }
            root = gf::multiply(root, 0x02);
        }

        let mut rows = vec![0u8; 256 * degree];
        for value in 0..256 {
            for (j, &coefficient) in coefficients.iter().enumerate() {
                rows[value * degree + j] = gf::multiply(value as u8, coefficient);
            }
        }
        trace!(degree, "built Reed-Solomon generator");
        Self { degree, rows }
    }

    /// The degree of the divisor polynomial, equal to the number of error
    /// correction codewords produced per block.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Returns the Reed-Solomon remainder of `data` divided by this
    /// generator's polynomial.
    pub fn remainder(&self, data: &[u8]) -> Vec<u8> {
        let mut result = vec![0u8; self.degree];
        self.remainder_into(data, &mut result);
        result
    }

    /// Computes the remainder of `data` into `result`, whose length must
    /// equal the degree.
    pub(crate) fn remainder_into(&self, data: &[u8], result: &mut [u8]) {
        assert_eq!(result.len(), self.degree);
        result.fill(0);
        for &byte in data {
            // LFSR division step: shift the remainder left by one byte and
            // subtract the scaled divisor, read from the precomputed row.
            let row = &self.rows[usize::from(byte ^ result[0]) * self.degree..][..self.degree];
            for j in 0..self.degree - 1 {
                result[j] = result[j + 1] ^ row[j];
            }
            result[self.degree - 1] = row[self.degree - 1];
        }
    }
}
