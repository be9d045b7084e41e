use crate::config::Style;
use crate::error::{PhraseError, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::io::BufRead;
use std::sync::OnceLock;

static LOWERCASE_WORD: OnceLock<Regex> = OnceLock::new();
static ALPHABETIC_WORD: OnceLock<Regex> = OnceLock::new();

fn lowercase_word() -> &'static Regex {
    LOWERCASE_WORD.get_or_init(|| Regex::new(r"\A[a-z]+\z").expect("static pattern"))
}

fn alphabetic_word() -> &'static Regex {
    ALPHABETIC_WORD.get_or_init(|| Regex::new(r"\A[a-zA-Z]+\z").expect("static pattern"))
}

impl Style {
    /// Camel case only takes all-lowercase words, so capitalising the first
    /// letter always marks a word boundary. Spaces take any ASCII letters.
    pub fn accepts(&self, word: &str) -> bool {
        match self {
            Style::CamelCase => lowercase_word().is_match(word),
            Style::Spaces => alphabetic_word().is_match(word),
        }
    }

    pub fn transform(&self, word: &str) -> String {
        match self {
            Style::CamelCase => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
            Style::Spaces => format!("{} ", word),
        }
    }
}

/// Reads one candidate word per line, trimming surrounding whitespace.
pub fn load_words<R: BufRead>(mut reader: R) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(PhraseError::Dictionary)?;
        if read == 0 {
            break;
        }

        let word = String::from_utf8_lossy(&line);
        let word = word.trim();
        if !word.is_empty() {
            words.push(word.to_string());
        }
    }

    Ok(words)
}

/// Transformed words grouped by cost.
///
/// Buckets keep the order in which words were first seen, so a given
/// dictionary always maps the same index to the same word.
#[derive(Debug, Clone)]
pub struct DictionaryIndex {
    buckets: BTreeMap<usize, Vec<String>>,
    style: Style,
}

impl DictionaryIndex {
    pub fn build<I, S, F>(
        words: I,
        style: Style,
        min_len: usize,
        max_len: usize,
        cost: F,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&str) -> usize,
    {
        let mut buckets: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        let mut seen: HashSet<(usize, String)> = HashSet::new();
        let mut rejected = 0usize;

        for word in words {
            let word = word.as_ref();
            let len = word.chars().count();

            if len < min_len || len > max_len || !style.accepts(word) {
                rejected += 1;
                continue;
            }

            let word_cost = cost(word);
            let transformed = style.transform(word);
            if seen.insert((word_cost, transformed.clone())) {
                buckets.entry(word_cost).or_default().push(transformed);
            }
        }

        let index = Self { buckets, style };

        log::info!(
            "Indexed {} words in {} cost buckets ({} rejected, style {})",
            index.word_count(),
            index.bucket_count(),
            rejected,
            style
        );

        if index.max_cost() == 0 {
            return Err(PhraseError::NoViableWords);
        }

        Ok(index)
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn bucket(&self, cost: usize) -> &[String] {
        self.buckets.get(&cost).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bucket_size(&self, cost: usize) -> usize {
        self.bucket(cost).len()
    }

    /// Largest cost with at least one word, or 0 when only free words exist.
    pub fn max_cost(&self) -> usize {
        self.buckets
            .iter()
            .rev()
            .find(|(cost, words)| **cost > 0 && !words.is_empty())
            .map(|(cost, _)| *cost)
            .unwrap_or(0)
    }

    pub fn word_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn costs(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.keys().copied()
    }
}
