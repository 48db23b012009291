use std::sync::LazyLock;

use regex::Regex;

use crate::parser::Extractor;
use crate::profile::{EducationEntry, EducationLevel};

pub static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

// First alternative wins: month range, then year range, then a bare year.
static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let month = r"(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*";
    Regex::new(&format!(
        r"{m}\s+\d{{4}}\s*[-–]\s*{m}\s+\d{{4}}|\d{{4}}\s*[-–]\s*\d{{4}}|\d{{4}}",
        m = month
    ))
    .unwrap()
});

const LEVEL_KEYWORDS: &[(EducationLevel, &[&str])] = &[
    (EducationLevel::Bachelor, &["b.tech", "btech", "bachelor", "b.sc", "bsc", "be "]),
    (EducationLevel::Masters, &["m.tech", "mtech", "master", "m.sc", "msc", "mba"]),
    (EducationLevel::HighSchool, &["high school", "hsc", "pcm", "12th", "10th"]),
];

pub fn extract(ex: &Extractor, text: &str) -> Vec<EducationEntry> {
    ex.segmenter
        .extract_section(text, "Education")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && YEAR_RE.is_match(l))
        .map(|l| EducationEntry {
            level: classify(l),
            raw_text: l.to_string(),
            period: period(l),
        })
        .collect()
}

pub fn classify(line: &str) -> EducationLevel {
    let lower = line.to_lowercase();
    LEVEL_KEYWORDS
        .iter()
        .find(|(_, keys)| keys.iter().any(|k| lower.contains(k)))
        .map(|(level, _)| *level)
        .unwrap_or(EducationLevel::Education)
}

pub fn period(line: &str) -> Option<String> {
    PERIOD_RE.find(line).map(|m| m.as_str().to_string())
}
