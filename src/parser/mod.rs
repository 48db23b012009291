pub mod extract;
pub mod sections;
pub mod urls;

use std::sync::Arc;

use crate::profile::Profile;
use crate::settings::Vocabulary;
use extract::skills::SkillMatchers;
use sections::Segmenter;
use urls::UrlExtractor;

/// Extraction engine built once from a vocabulary and shared across documents.
#[derive(Debug, Clone)]
pub struct Extractor {
    pub vocab: Arc<Vocabulary>,
    pub segmenter: Segmenter,
    pub urls: UrlExtractor,
    pub skills: SkillMatchers,
}

impl Extractor {
    pub fn new(vocab: Vocabulary) -> Self {
        let segmenter = Segmenter::new(&vocab.headings);
        let urls = UrlExtractor::new(&vocab.url_suffixes);
        let skills = SkillMatchers::new(&vocab);
        Self {
            vocab: Arc::new(vocab),
            segmenter,
            urls,
            skills,
        }
    }

    /// Single forward pass: document text → profile record. Never fails.
    pub fn extract(&self, text: &str) -> Profile {
        extract::extract_all(self, text)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(Vocabulary::default())
    }
}

/// Prefix of at most `max` characters, cut on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
