//! Sentence and word segmentation.

use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Splits text into sentences and sentences into word tokens.
pub trait Segmenter: Send + Sync {
    fn sentences(&self, text: &str) -> Vec<String>;
    fn words(&self, sentence: &str) -> Vec<String>;
}

/// Unicode (UAX #29) sentence boundaries; words are runs of word characters or
/// runs of punctuation, so `don't!` becomes `don ' t !`.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeSegmenter;

fn word_punct() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+|[^\w\s]+").expect("static regex"))
}

impl Segmenter for UnicodeSegmenter {
    fn sentences(&self, text: &str) -> Vec<String> {
        text.split_sentence_bounds()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn words(&self, sentence: &str) -> Vec<String> {
        word_punct()
            .find_iter(sentence)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
