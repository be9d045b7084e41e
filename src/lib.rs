pub mod combinations;
pub mod config;
pub mod decoder;
pub mod entropy;
pub mod error;
pub mod generator;
pub mod sampler;
pub mod wordlist;

pub use combinations::{CombinationTable, Stats, Window};
pub use config::{GeneratorConfig, Style};
pub use decoder::{decode_at_cost, decode_words};
pub use entropy::{EntropySource, KeystreamSource, OsEntropy, ReaderSource, TimedSource};
pub use error::PhraseError;
pub use generator::{PhraseGenerator, Requirement};
pub use sampler::UniformSampler;
pub use wordlist::{load_words, DictionaryIndex};
