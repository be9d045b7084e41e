use crate::error::{PhraseError, Result};
use std::fmt;

pub const MIN_BITS: u32 = 32;
pub const MAX_BITS: u32 = 512;
pub const DEFAULT_BITS: u32 = 80;

pub const MIN_COUNT: u64 = 1;
pub const MAX_COUNT: u64 = 1_000_000_000;

pub const MIN_WORD_LEN: usize = 1;
pub const MAX_WORD_LEN: usize = 256;
pub const DEFAULT_MIN_LEN: usize = 3;
pub const DEFAULT_MAX_LEN: usize = 15;

pub const MAX_WORD_COST: usize = 100;
pub const DEFAULT_WORD_COST: usize = 2;
pub const MAX_CHAR_COST: usize = 10;
pub const DEFAULT_CHAR_COST: usize = 1;

pub const MAX_COST_RANGE: usize = 100;
pub const DEFAULT_COST_RANGE: usize = 1;

/// How words are joined into a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// `correct horse` becomes `CorrectHorse`. Only lowercase words qualify.
    #[default]
    CamelCase,
    /// `correct horse` becomes `correct horse `. Any-case words qualify.
    Spaces,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::CamelCase => f.write_str("camelcase"),
            Style::Spaces => f.write_str("spaces"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub bits: u32,
    pub style: Style,
    pub count: u64,
    pub min_len: usize,
    pub max_len: usize,
    pub word_cost: usize,
    pub char_cost: usize,
    /// Accepted cost spread between solutions. The selection window is one
    /// level wider than this.
    pub cost_range: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            bits: DEFAULT_BITS,
            style: Style::default(),
            count: MIN_COUNT,
            min_len: DEFAULT_MIN_LEN,
            max_len: DEFAULT_MAX_LEN,
            word_cost: DEFAULT_WORD_COST,
            char_cost: DEFAULT_CHAR_COST,
            cost_range: DEFAULT_COST_RANGE,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("bits", self.bits as u64, MIN_BITS as u64, MAX_BITS as u64)?;
        check_range("count", self.count, MIN_COUNT, MAX_COUNT)?;
        check_range(
            "min length",
            self.min_len as u64,
            MIN_WORD_LEN as u64,
            MAX_WORD_LEN as u64,
        )?;
        check_range(
            "max length",
            self.max_len as u64,
            MIN_WORD_LEN as u64,
            MAX_WORD_LEN as u64,
        )?;
        check_range("cost per word", self.word_cost as u64, 0, MAX_WORD_COST as u64)?;
        check_range(
            "cost per character",
            self.char_cost as u64,
            0,
            MAX_CHAR_COST as u64,
        )?;
        check_range("cost range", self.cost_range as u64, 0, MAX_COST_RANGE as u64)?;

        if self.min_len > self.max_len {
            return Err(PhraseError::InvalidConfig(format!(
                "min length {} exceeds max length {}",
                self.min_len, self.max_len
            )));
        }

        Ok(())
    }

    pub fn window_width(&self) -> usize {
        self.cost_range + 1
    }

    pub fn word_cost_of(&self, word: &str) -> usize {
        self.char_cost * word.chars().count() + self.word_cost
    }
}

fn check_range(name: &str, value: u64, low: u64, high: u64) -> Result<()> {
    if value < low || value > high {
        return Err(PhraseError::InvalidConfig(format!(
            "{} needs to be an integer between {} and {}, got {}",
            name, low, high, value
        )));
    }
    Ok(())
}
