use crate::entropy::EntropySource;
use crate::error::{PhraseError, Result};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use zeroize::Zeroizing;

/// Wider draws considered beyond the minimal byte width.
const EXTRA_WIDTHS: usize = 4;

/// Unbiased integers in `[0, range)` from a byte source.
///
/// Draws are `byte_width` big-endian bytes. Anything at or above `limit`,
/// the largest multiple of `range` that fits, is rejected and redrawn, so
/// the reduction modulo `range` carries no bias. The width is the one with
/// the lowest expected number of bytes per accepted draw.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    range: BigUint,
    byte_width: usize,
    limit: BigUint,
}

impl UniformSampler {
    pub fn new(range: BigUint) -> Result<Self> {
        if range.is_zero() {
            return Err(PhraseError::EmptyRange);
        }

        let min_width = ((&range - BigUint::one()).bits() as usize).div_ceil(8);

        let mut byte_width = min_width;
        let mut limit = limit_for(&range, min_width);

        for width in min_width + 1..=min_width + EXTRA_WIDTHS {
            let candidate = limit_for(&range, width);

            // width / (candidate / 256^width) < byte_width / (limit / 256^byte_width)
            let lhs = (BigUint::from(width) << (8 * width)) * &limit;
            let rhs = (BigUint::from(byte_width) << (8 * byte_width)) * &candidate;
            if lhs < rhs {
                byte_width = width;
                limit = candidate;
            }
        }

        let sampler = Self {
            range,
            byte_width,
            limit,
        };

        log::debug!(
            "Sampling below a {}-bit range with {}-byte draws ({:.4} bytes expected)",
            sampler.range.bits(),
            sampler.byte_width,
            sampler.expected_bytes()
        );

        Ok(sampler)
    }

    pub fn range(&self) -> &BigUint {
        &self.range
    }

    pub fn byte_width(&self) -> usize {
        self.byte_width
    }

    pub fn limit(&self) -> &BigUint {
        &self.limit
    }

    /// Average number of bytes read per accepted draw.
    pub fn expected_bytes(&self) -> f64 {
        if self.byte_width == 0 {
            return 0.0;
        }

        let space = BigUint::one() << (8 * self.byte_width);
        let acceptance =
            self.limit.to_f64().unwrap_or(f64::MAX) / space.to_f64().unwrap_or(f64::MAX);
        self.byte_width as f64 / acceptance
    }

    pub fn sample<S: EntropySource + ?Sized>(&self, source: &mut S) -> Result<BigUint> {
        let mut buf = Zeroizing::new(vec![0u8; self.byte_width]);

        loop {
            source.fill_bytes(&mut buf)?;
            let draw = BigUint::from_bytes_be(&buf);

            if draw < self.limit {
                return Ok(draw % &self.range);
            }

            log::trace!("Rejected {}-byte draw", self.byte_width);
        }
    }
}

fn limit_for(range: &BigUint, width: usize) -> BigUint {
    let space = BigUint::one() << (8 * width);
    (space / range) * range
}
