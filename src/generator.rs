use crate::combinations::{CombinationTable, Stats, Window};
use crate::config::GeneratorConfig;
use crate::decoder::decode_words;
use crate::entropy::EntropySource;
use crate::error::Result;
use crate::sampler::UniformSampler;
use crate::wordlist::DictionaryIndex;
use num_bigint::BigUint;
use zeroize::Zeroizing;

/// How much security the selection window has to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub bits: u32,
    pub count: u64,
    pub window_width: usize,
}

impl Requirement {
    /// `count * 2^bits`, the number of sequences the window has to exceed.
    pub fn threshold(&self) -> BigUint {
        BigUint::from(self.count) << self.bits
    }
}

impl From<&GeneratorConfig> for Requirement {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            bits: config.bits,
            count: config.count,
            window_width: config.window_width(),
        }
    }
}

/// Everything needed to produce phrases, frozen after construction.
///
/// Generating a phrase only reads from the generator, so one instance can
/// serve any number of threads, each with its own entropy source.
#[derive(Debug, Clone)]
pub struct PhraseGenerator {
    index: DictionaryIndex,
    table: CombinationTable,
    window: Window,
    sampler: UniformSampler,
    requirement: Requirement,
}

impl PhraseGenerator {
    pub fn new(index: DictionaryIndex, requirement: Requirement) -> Result<Self> {
        let (table, window) =
            CombinationTable::grow(&index, &requirement.threshold(), requirement.window_width)?;
        let sampler = UniformSampler::new(window.total.clone())?;

        log::info!(
            "Phrases cost {} to {} for {} bits",
            window.low,
            window.high,
            requirement.bits
        );

        Ok(Self {
            index,
            table,
            window,
            sampler,
            requirement,
        })
    }

    pub fn from_config<I, S>(words: I, config: &GeneratorConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        config.validate()?;

        let index = DictionaryIndex::build(
            words,
            config.style,
            config.min_len,
            config.max_len,
            |word| config.word_cost_of(word),
        )?;

        Self::new(index, Requirement::from(config))
    }

    /// Draws one phrase. Nothing is returned unless decoding completes.
    pub fn generate<S: EntropySource + ?Sized>(&self, source: &mut S) -> Result<Zeroizing<String>> {
        let num = self.sampler.sample(source)?;
        let words = decode_words(&self.table, &self.index, &self.window, num)?;
        Ok(Zeroizing::new(words.concat()))
    }

    pub fn stats(&self) -> Stats {
        Stats::new(&self.window)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn table(&self) -> &CombinationTable {
        &self.table
    }

    pub fn index(&self) -> &DictionaryIndex {
        &self.index
    }

    pub fn sampler(&self) -> &UniformSampler {
        &self.sampler
    }

    pub fn requirement(&self) -> Requirement {
        self.requirement
    }
}
