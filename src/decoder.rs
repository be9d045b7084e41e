use crate::combinations::{CombinationTable, Window};
use crate::error::{PhraseError, Result};
use crate::wordlist::DictionaryIndex;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::ToPrimitive;

/// Decodes `num` in `[0, window.total)` into a word sequence.
///
/// The window's levels are laid out one after another in increasing cost,
/// each taking as many indices as it has sequences.
pub fn decode_words<'a>(
    table: &CombinationTable,
    index: &'a DictionaryIndex,
    window: &Window,
    num: BigUint,
) -> Result<Vec<&'a str>> {
    if num >= window.total {
        return Err(PhraseError::IndexOutOfRange);
    }

    let mut num = num;
    for cost in window.levels() {
        let level = table.get(cost).ok_or(PhraseError::IndexOutOfRange)?;
        if num < *level {
            return decode_at_cost(table, index, cost, num);
        }
        num -= level;
    }

    Err(PhraseError::IndexOutOfRange)
}

/// Maps `[0, combinations[cost])` one-to-one onto the word sequences of
/// exactly `cost`.
pub fn decode_at_cost<'a>(
    table: &CombinationTable,
    index: &'a DictionaryIndex,
    cost: usize,
    num: BigUint,
) -> Result<Vec<&'a str>> {
    let level = table.get(cost).ok_or(PhraseError::IndexOutOfRange)?;
    if num >= *level {
        return Err(PhraseError::IndexOutOfRange);
    }

    let mut num = num;
    let mut remaining = cost;
    let mut words = Vec::new();

    while remaining > 0 {
        let (word_cost, word) = next_word(table, index, remaining, &mut num);
        words.push(word);
        remaining -= word_cost;
    }

    Ok(words)
}

/// Splits off the first word of a sequence costing `remaining`.
///
/// Sequences are ordered by the cost of their first word; within one first
/// cost, the low digit of `num` picks the word and the rest indexes the tail.
fn next_word<'a>(
    table: &CombinationTable,
    index: &'a DictionaryIndex,
    remaining: usize,
    num: &mut BigUint,
) -> (usize, &'a str) {
    let counts = table.as_slice();

    for word_cost in index.costs().filter(|&c| c >= 1 && c <= remaining) {
        let bucket = index.bucket(word_cost);
        let size = BigUint::from(bucket.len());
        let segment = &size * &counts[remaining - word_cost];

        if *num < segment {
            let (rest, word_index) = num.div_rem(&size);
            *num = rest;
            let word = word_index
                .to_usize()
                .and_then(|i| bucket.get(i))
                .expect("digit is below its bucket size");
            return (word_cost, word.as_str());
        }

        *num -= segment;
    }

    unreachable!("index exceeds the sequences of cost {}", remaining)
}
