use std::sync::LazyLock;

use regex::Regex;

use super::education::YEAR_RE;
use crate::parser::Extractor;
use crate::profile::{EducationEntry, JourneyItem, JourneyTitle, Milestone};

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());
static INTERN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bIntern").unwrap());
// Whole word only, so "International" or "Internal" still count as jobs.
static INTERN_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bIntern\b").unwrap());
static ROLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:Developer|Engineer|Software|SDE|Data)\b").unwrap());

pub const EXPERIENCE_HEADINGS: &[&str] = &["Internship", "Internships", "Experience"];

pub struct Timeline {
    pub internships: Vec<String>,
    pub current_job: Option<String>,
}

pub fn extract(ex: &Extractor, text: &str) -> Timeline {
    Timeline {
        internships: internships(ex, text),
        current_job: current_job(ex, text),
    }
}

/// Blank-line separated paragraphs that mention an internship or a year.
pub fn internships(ex: &Extractor, text: &str) -> Vec<String> {
    let section = ex.segmenter.first_section(text, EXPERIENCE_HEADINGS);
    PARAGRAPH_RE
        .split(section)
        .map(str::trim)
        .filter(|p| !p.is_empty() && (INTERN_RE.is_match(p) || YEAR_RE.is_match(p)))
        .map(str::to_string)
        .collect()
}

/// First non-intern role line in Experience, else anywhere in the document.
pub fn current_job(ex: &Extractor, text: &str) -> Option<String> {
    let experience = ex.segmenter.extract_section(text, "Experience");
    [experience, text].into_iter().find_map(first_role_line)
}

fn first_role_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && ROLE_RE.is_match(l) && !INTERN_WORD_RE.is_match(l))
        .map(str::to_string)
}

/// Education, then the current job, then internships. Source order within
/// each group; no calendar sort.
pub fn build_journey(
    education: &[EducationEntry],
    current_job: Option<&str>,
    internships: &[String],
) -> Vec<JourneyItem> {
    let education_items = education.iter().map(|e| JourneyItem {
        title: JourneyTitle::Education(e.level),
        text: e.raw_text.clone(),
        period: e.period.clone(),
    });
    let job_item = current_job.map(|job| JourneyItem {
        title: JourneyTitle::Milestone(Milestone::CurrentJob),
        text: job.to_string(),
        period: None,
    });
    let internship_items = internships.iter().map(|it| JourneyItem {
        title: JourneyTitle::Milestone(Milestone::Internship),
        text: it.clone(),
        period: None,
    });

    education_items.chain(job_item).chain(internship_items).collect()
}
