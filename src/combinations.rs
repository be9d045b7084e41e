use crate::error::{PhraseError, Result};
use crate::wordlist::DictionaryIndex;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use std::fmt;

/// Number of ordered word sequences for every total cost up to the top level.
///
/// `counts[0]` is the empty sequence. Levels are only ever appended.
#[derive(Debug, Clone)]
pub struct CombinationTable {
    counts: Vec<BigUint>,
}

/// A band of consecutive cost levels pooled into one selection universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub low: usize,
    pub high: usize,
    pub total: BigUint,
}

impl Default for CombinationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CombinationTable {
    pub fn new() -> Self {
        Self {
            counts: vec![BigUint::one()],
        }
    }

    /// Grows a table until the window ending at its top level holds strictly
    /// more than `threshold` sequences.
    pub fn grow(
        index: &DictionaryIndex,
        threshold: &BigUint,
        width: usize,
    ) -> Result<(Self, Window)> {
        if width == 0 {
            return Err(PhraseError::InvalidConfig(
                "window width must be at least 1".to_string(),
            ));
        }

        // A run of `max_cost` empty levels means every later level is empty too.
        // With a positive-cost word indexed this never happens; it only bounds the loop.
        let max_cost = index.max_cost();
        if max_cost == 0 {
            return Err(PhraseError::NoViableWords);
        }

        let mut table = Self::new();
        let mut empty_run = 0usize;

        loop {
            let window = table.window(table.top(), width);
            if window.total > *threshold {
                log::debug!(
                    "Combination table stopped at cost {} (window [{}..{}], {} bits)",
                    window.high,
                    window.low,
                    window.high,
                    log2(&window.total)
                );
                return Ok((table, window));
            }

            if table.extend(index).is_zero() {
                empty_run += 1;
                if empty_run >= max_cost {
                    return Err(PhraseError::NoViableWords);
                }
            } else {
                empty_run = 0;
            }
        }
    }

    /// Appends the next cost level and returns its count.
    pub fn extend(&mut self, index: &DictionaryIndex) -> &BigUint {
        let level = self.counts.len();
        let mut total = BigUint::zero();

        for cost in index.costs().filter(|&cost| cost >= 1 && cost <= level) {
            total += BigUint::from(index.bucket_size(cost)) * &self.counts[level - cost];
        }

        log::trace!("Level {}: {} combinations", level, total);
        self.counts.push(total);
        &self.counts[level]
    }

    pub fn top(&self) -> usize {
        self.counts.len() - 1
    }

    pub fn get(&self, cost: usize) -> Option<&BigUint> {
        self.counts.get(cost)
    }

    pub fn as_slice(&self) -> &[BigUint] {
        &self.counts
    }

    /// The window of `width` levels ending at `high`. Level 0 is never
    /// included, and `high` is clamped to the top level.
    pub fn window(&self, high: usize, width: usize) -> Window {
        let high = high.min(self.top());
        let low = (high + 1).saturating_sub(width).max(1);

        let total = if low <= high {
            self.counts[low..=high].iter().sum()
        } else {
            BigUint::zero()
        };

        Window { low, high, total }
    }
}

impl Window {
    pub fn levels(&self) -> std::ops::RangeInclusive<usize> {
        self.low..=self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub bits: f64,
    pub low: usize,
    pub high: usize,
    pub bits_per_cost: f64,
}

impl Stats {
    pub fn new(window: &Window) -> Self {
        let bits = log2(&window.total);
        let bits_per_cost = if window.high == 0 {
            0.0
        } else {
            bits / window.high as f64
        };

        Self {
            bits,
            low: window.low,
            high: window.high,
            bits_per_cost,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "# bits={:.6} cost=[{}..{}] bits_per_cost={:.6}",
            self.bits, self.low, self.high, self.bits_per_cost
        )
    }
}

/// Base-2 logarithm of an arbitrarily large integer.
pub fn log2(value: &BigUint) -> f64 {
    let bits = value.bits();
    if bits == 0 {
        return f64::NEG_INFINITY;
    }

    let shift = bits.saturating_sub(64);
    let top = (value >> shift).to_u64().unwrap_or(u64::MAX);
    (top as f64).log2() + shift as f64
}
