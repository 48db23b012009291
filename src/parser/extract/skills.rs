use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::parser::{truncate_chars, Extractor};
use crate::profile::SkillSet;
use crate::settings::{SkillGroup, Vocabulary};

static TOKEN_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,\n;•/]+").unwrap());
static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Characters past a category label read when nothing terminates the block.
const UNBOUNDED_CHUNK: usize = 600;

const SKILL_HEADINGS: &[&str] = &["Technical Skills", "Skills"];

/// Case-insensitive match for a technology name. Terms ending in symbols
/// ("C++", "C#") are bounded by hand since `\b` never fires after them, and
/// "C" must not match inside "C++".
pub fn term_regex(term: &str) -> Regex {
    let starts_word = term.chars().next().is_some_and(|c| c.is_alphanumeric() || c == '_');
    let left = if starts_word { r"\b" } else { r"(?:^|[^\w+#])" };
    Regex::new(&format!(r"(?i){}{}(?:$|[^\w+#])", left, regex::escape(term)))
        .expect("escaped term is a valid pattern")
}

#[derive(Debug, Clone)]
struct Category {
    label: String,
    key: String,
    start_re: Regex,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    canonical: String,
    terms: Vec<Regex>,
}

/// Skill vocabulary compiled into matchers once per extractor.
#[derive(Debug, Clone)]
pub struct SkillMatchers {
    categories: Vec<Category>,
    catalog: Vec<(String, Vec<CatalogEntry>)>,
    known: Vec<(String, Regex)>,
    groups: Vec<SkillGroup>,
}

impl SkillMatchers {
    pub fn new(vocab: &Vocabulary) -> Self {
        let categories = vocab
            .skill_categories
            .iter()
            .map(|label| Category {
                label: label.clone(),
                key: category_key(label),
                start_re: Regex::new(&format!(r"(?i)\b{}\b\s*:", regex::escape(label)))
                    .expect("escaped label is a valid pattern"),
            })
            .collect();

        let canonical_of = |name: &str| -> String {
            vocab
                .skill_aliases
                .iter()
                .find(|a| a.alias.eq_ignore_ascii_case(name))
                .map(|a| a.canonical.clone())
                .unwrap_or_else(|| name.to_string())
        };

        let catalog = vocab
            .skill_catalog
            .iter()
            .map(|cat| {
                let entries: Vec<CatalogEntry> = cat
                    .skills
                    .iter()
                    .map(|skill| {
                        let canonical = canonical_of(skill);
                        let mut terms = vec![term_regex(skill)];
                        terms.extend(
                            vocab
                                .skill_aliases
                                .iter()
                                .filter(|a| a.canonical == canonical && !a.alias.eq_ignore_ascii_case(skill))
                                .map(|a| term_regex(&a.alias)),
                        );
                        CatalogEntry { canonical, terms }
                    })
                    .collect();
                (cat.category.clone(), entries)
            })
            .collect();

        let known = vocab
            .known_skills
            .iter()
            .map(|s| (s.clone(), term_regex(s)))
            .collect();

        Self {
            categories,
            catalog,
            known,
            groups: vocab.skill_groups.clone(),
        }
    }

    pub fn category_labels(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.label.clone()).collect()
    }
}

fn category_key(label: &str) -> String {
    label.to_lowercase().replace(' ', "_")
}

type Strategy = fn(&Extractor, &str) -> SkillSet;

/// Tried in order; the first strategy that yields any skill wins.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("categorized", categorized),
    ("catalog", catalog),
    ("grouped", grouped),
];

pub fn extract(ex: &Extractor, text: &str) -> SkillSet {
    let mut last = SkillSet::Grouped(BTreeMap::new());
    for (name, strategy) in STRATEGIES {
        let set = strategy(ex, text);
        if !set.is_empty() {
            debug!(strategy = *name, groups = set.groups().len(), "Skills resolved");
            return set;
        }
        last = set;
    }
    debug!("No skills found");
    last
}

/// Splits a category block into clean, case-insensitively unique skill names.
pub fn tokenize(chunk: &str) -> Vec<String> {
    let mut clean: Vec<String> = Vec::new();
    for raw in TOKEN_SPLIT_RE.split(chunk) {
        let stripped = PAREN_RE.replace_all(raw, "");
        let token = MULTI_SPACE_RE.replace_all(stripped.trim(), " ").to_string();
        if !token.is_empty() && !clean.iter().any(|c| c.eq_ignore_ascii_case(&token)) {
            clean.push(token);
        }
    }
    clean
}

/// `"<Category>:"` blocks inside the skills section.
pub fn categorized(ex: &Extractor, text: &str) -> SkillSet {
    let matchers = &ex.skills;
    let inline = matchers.category_labels();
    let section = SKILL_HEADINGS
        .iter()
        .map(|h| ex.segmenter.extract_section_with(text, h, &inline))
        .find(|s| !s.is_empty())
        .unwrap_or("");
    let collapsed = MULTI_SPACE_RE.replace_all(section, " ");
    let sec: &str = &collapsed;

    let mut result: BTreeMap<String, Vec<String>> =
        matchers.categories.iter().map(|c| (c.key.clone(), Vec::new())).collect();

    for cat in &matchers.categories {
        let Some(start) = cat.start_re.find(sec) else {
            continue;
        };
        let rest = &sec[start.end()..];

        let category_stops = matchers
            .categories
            .iter()
            .filter(|other| other.key != cat.key)
            .filter_map(|other| other.start_re.find(rest).map(|m| m.start()));
        let heading_stops = ex
            .segmenter
            .headings()
            .iter()
            .filter_map(|h| h.re.find(rest).map(|m| m.start()));

        let chunk = match category_stops.chain(heading_stops).min() {
            Some(end) => &rest[..end],
            None => truncate_chars(rest, UNBOUNDED_CHUNK),
        };

        let tokens = tokenize(chunk);
        if !tokens.is_empty() {
            result.insert(cat.key.clone(), tokens);
        }
    }

    SkillSet::Categorized(result)
}

/// Whole-document scan against the per-category catalog, aliases folded
/// into their canonical names.
pub fn catalog(ex: &Extractor, text: &str) -> SkillSet {
    let result = ex
        .skills
        .catalog
        .iter()
        .map(|(key, entries)| {
            let mut found: Vec<String> = Vec::new();
            for entry in entries {
                if entry.terms.iter().any(|re| re.is_match(text)) && !found.contains(&entry.canonical) {
                    found.push(entry.canonical.clone());
                }
            }
            (key.clone(), found)
        })
        .collect();
    SkillSet::Categorized(result)
}

/// Flat known-skill scan bucketed by role area.
pub fn grouped(ex: &Extractor, text: &str) -> SkillSet {
    let matchers = &ex.skills;
    let mut result: BTreeMap<String, Vec<String>> =
        matchers.groups.iter().map(|g| (g.name.clone(), Vec::new())).collect();

    for (skill, re) in &matchers.known {
        if !re.is_match(text) {
            continue;
        }
        let lower = skill.to_lowercase();
        if let Some(group) = matchers.groups.iter().find(|g| g.members.iter().any(|m| *m == lower)) {
            if let Some(bucket) = result.get_mut(&group.name) {
                bucket.push(skill.clone());
            }
        }
    }
    SkillSet::Grouped(result)
}
