//! Fuzz target for the bounded-rand strategy catalog.
//!
//! Feeds every strategy a chosen range and a scripted word stream, then
//! checks:
//!
//! 1. **Bounds**: the result is below `range` for every non-zero range
//! 2. **No panics**: no overflow or division fault on any word sequence
//! 3. **Single draws**: the biased baselines consume exactly one word
//!
//! The scripted words come first so the fuzzer can steer rejection paths;
//! after them a seeded PCG takes over so every rejection loop terminates.

#![no_main]

use arbitrary::Arbitrary;
use bounded_rand::source::{BitSource, Pcg32, Pcg64, SeedableSource};
use bounded_rand::{Algorithm, Word};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum BoundedInput {
    Narrow { range: u32, words: Vec<u32>, seed: u64 },
    Wide { range: u64, words: Vec<u64>, seed: u64 },
}

/// Replays `words` once, then continues with `tail`.
struct Scripted<S: BitSource> {
    words: std::vec::IntoIter<S::Word>,
    tail: S,
    drawn: usize,
}

impl<S: BitSource> Scripted<S> {
    fn new(words: Vec<S::Word>, tail: S) -> Self {
        Self {
            words: words.into_iter(),
            tail,
            drawn: 0,
        }
    }
}

impl<S: BitSource> BitSource for Scripted<S> {
    type Word = S::Word;

    fn next_word(&mut self) -> S::Word {
        self.drawn += 1;
        self.words.next().unwrap_or_else(|| self.tail.next_word())
    }
}

fn check<S: BitSource + Clone>(range: S::Word, words: &[S::Word], tail: &S) {
    if range == S::Word::ZERO {
        return;
    }
    for &algorithm in Algorithm::ALL {
        let mut source = Scripted::new(words.to_vec(), tail.clone());
        let value = algorithm.sample(&mut source, range);
        assert!(value < range, "{algorithm}: {value} >= {range}");
        if algorithm.draws_single_word() {
            assert_eq!(source.drawn, 1, "{algorithm}");
        }
    }
}

fuzz_target!(|input: BoundedInput| {
    match input {
        BoundedInput::Narrow { range, words, seed } => {
            check(range, &words, &Pcg32::seed_from_u64(seed));
        }
        BoundedInput::Wide { range, words, seed } => {
            check(range, &words, &Pcg64::seed_from_u64(seed));
        }
    }
});
