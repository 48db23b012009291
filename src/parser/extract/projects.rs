use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::tags::tags_for;
use super::timeline::EXPERIENCE_HEADINGS;
use crate::parser::urls::{host_label, title_case};
use crate::parser::{truncate_chars, Extractor};
use crate::profile::Project;
use crate::settings::{KnownProject, Vocabulary};

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bLink\b\s*:").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bLink\b").unwrap());
static DASH_BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*]\s+").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[—:-]").unwrap());
static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?\)").unwrap());
static TECH_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bTech\b.*").unwrap());
static DISALLOWED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 +._-]").unwrap());
static MULTI_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

const NAME_MAX: usize = 60;
const DESCRIPTION_MAX: usize = 300;
const MIN_NAME_LEN: usize = 3;
const NAME_LOOKBACK: usize = 3;
const ANCHOR_URL_LOOKAHEAD: usize = 2;
const DESCRIPTION_LOOKBACK: usize = 3;
const DESCRIPTION_LOOKAHEAD: usize = 5;
const BULLET_LINK_WINDOW: usize = 12;
const KNOWN_URL_WINDOW: usize = 8;

const PLACEHOLDER: &str = "Project";

/// Accumulates candidates across passes. Linked entries are unique per
/// (name, url); every entry registers its lowercased name so later passes
/// can skip it.
#[derive(Default)]
struct ProjectBook {
    items: Vec<Project>,
    pairs: HashSet<(String, String)>,
    names: HashSet<String>,
}

impl ProjectBook {
    fn push_linked(&mut self, project: Project) {
        let key = (
            project.name.to_lowercase(),
            project.url.clone().unwrap_or_default(),
        );
        if !self.pairs.insert(key) {
            return;
        }
        self.names.insert(project.name.to_lowercase());
        self.items.push(project);
    }

    fn push_named(&mut self, project: Project) {
        if self.names.insert(project.name.to_lowercase()) {
            self.items.push(project);
        }
    }

    fn has_name(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    /// Final list, unique by lowercased name; the first entry wins.
    fn finish(self) -> Vec<Project> {
        let mut seen = HashSet::new();
        self.items
            .into_iter()
            .filter(|p| seen.insert(p.name.to_lowercase()))
            .collect()
    }
}

fn trimmed_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).collect()
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('•') || DASH_BULLET_RE.is_match(line)
}

fn has_separator(line: &str) -> bool {
    line.contains(|c| matches!(c, '—' | '-' | ':'))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strips asides, a trailing "Tech ..." stack list and stray symbols, then
/// caps the length and capitalizes each word.
pub fn clean_name(raw: &str) -> String {
    let name = PAREN_RE.replace_all(raw, "");
    let name = TECH_SUFFIX_RE.replace(name.trim(), "");
    let name = DISALLOWED_RE.replace_all(name.trim(), " ");
    let name = MULTI_SPACE_RE.replace_all(&name, " ");
    truncate_chars(&name, NAME_MAX)
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn finish_description(raw: &str) -> String {
    let collapsed = MULTI_SPACE_RE.replace_all(raw.trim(), " ");
    let desc = truncate_chars(&collapsed, DESCRIPTION_MAX).trim();
    if desc.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        desc.to_string()
    }
}

/// Rejects action bullets and other headers that are not project names.
pub fn is_valid_project_name(vocab: &Vocabulary, name: &str) -> bool {
    let lower = name.to_lowercase();
    name.chars().count() >= MIN_NAME_LEN
        && !vocab
            .non_project_prefixes
            .iter()
            .any(|p| lower.starts_with(&p.to_lowercase()))
}

pub fn extract(ex: &Extractor, text: &str) -> Vec<Project> {
    let section = ex.segmenter.extract_section(text, "Projects");
    let base = if section.is_empty() { text } else { section };
    let lines = trimmed_lines(base);

    let mut book = ProjectBook::default();

    link_anchors(ex, &lines, &mut book);
    let anchored = book.len();

    bullets(ex, &lines, &mut book, |_| true);
    let bulleted = book.len() - anchored;

    let experience = trimmed_lines(ex.segmenter.first_section(text, EXPERIENCE_HEADINGS));
    bullets(ex, &experience, &mut book, |name| is_valid_project_name(&ex.vocab, name));
    let from_experience = book.len() - anchored - bulleted;

    for known in &ex.vocab.known_projects {
        reconcile_known(ex, text, known, &mut book);
    }

    if book.items.is_empty() {
        for url in ex.urls.extract(base) {
            let name = title_case(host_label(&url));
            book.push_linked(Project::new(name, Some(url), PLACEHOLDER.to_string()));
        }
    }

    let mut projects = book.finish();
    for project in &mut projects {
        project.tags = tags_for(&ex.vocab.project_tags, &project.description);
    }

    debug!(
        anchored,
        bulleted,
        from_experience,
        total = projects.len(),
        "Projects extracted"
    );
    projects
}

/// Lines carrying a "Link:" label. The URL comes from the anchor or the two
/// lines after it; the name from the nearest header above it.
fn link_anchors(ex: &Extractor, lines: &[&str], book: &mut ProjectBook) {
    for (i, line) in lines.iter().enumerate() {
        if !ANCHOR_RE.is_match(line) {
            continue;
        }

        let url_end = (i + 1 + ANCHOR_URL_LOOKAHEAD).min(lines.len());
        let url = lines[i..url_end]
            .iter()
            .find_map(|l| ex.urls.extract(l).into_iter().next());

        let name = infer_name(lines, i)
            .map(clean_name)
            .filter(|n| !n.is_empty())
            .or_else(|| {
                url.as_deref()
                    .map(|u| clean_name(&title_case(host_label(u))))
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        let before = lines[i.saturating_sub(DESCRIPTION_LOOKBACK)..i]
            .iter()
            .filter(|l| !l.is_empty() && !LINK_RE.is_match(l));
        let after = lines[i + 1..]
            .iter()
            .take(DESCRIPTION_LOOKAHEAD)
            .take_while(|l| !l.is_empty() && !LINK_RE.is_match(l));
        let description = finish_description(&before.chain(after).copied().collect::<Vec<_>>().join(" "));

        book.push_linked(Project::new(name, url, description));
    }
}

/// Walks back from an anchor to the nearest line that reads like a project
/// header: text before a separator, or a bullet.
fn infer_name<'a>(lines: &[&'a str], idx: usize) -> Option<&'a str> {
    let window = &lines[idx.saturating_sub(NAME_LOOKBACK)..idx];
    for cand in window.iter().rev().copied() {
        if cand.is_empty() {
            continue;
        }
        if has_separator(cand) {
            let head = SEPARATOR_RE.split(cand).next().unwrap_or_default().trim();
            if head.chars().count() >= MIN_NAME_LEN {
                return Some(head);
            }
        }
        if let Some(rest) = cand.strip_prefix('•') {
            return Some(rest.trim());
        }
    }
    None
}

/// Bullet headers with a separator open an entry; following plain lines
/// extend its description until the next bullet, blank or "Link" line.
fn bullets(
    ex: &Extractor,
    lines: &[&str],
    book: &mut ProjectBook,
    accept: impl Fn(&str) -> bool,
) {
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if !is_bullet(line) {
            i += 1;
            continue;
        }
        let header = line
            .trim_start_matches(|c| matches!(c, '•' | '-' | '*' | ' '))
            .trim();
        if !has_separator(header) {
            i += 1;
            continue;
        }

        let name = clean_name(SEPARATOR_RE.split(header).next().unwrap_or_default());

        let mut end = i + 1;
        while end < lines.len()
            && !lines[end].is_empty()
            && !is_bullet(lines[end])
            && !LINK_RE.is_match(lines[end])
        {
            end += 1;
        }
        let parts: Vec<&str> = std::iter::once(header)
            .chain(lines[i + 1..end].iter().copied())
            .collect();
        let description = finish_description(&parts.join(" "));

        let window_end = (i + BULLET_LINK_WINDOW).min(lines.len());
        let url = lines[i..window_end]
            .iter()
            .filter(|l| LINK_RE.is_match(l))
            .find_map(|l| ex.urls.extract(l).into_iter().next());

        if !name.is_empty() && accept(&name) {
            book.push_named(Project::new(name, url, description));
        }
        i = end;
    }
}

/// Synthesizes a configured project the other passes missed, from the first
/// line naming one of its aliases or a URL matching one of its hints.
fn reconcile_known(ex: &Extractor, text: &str, known: &KnownProject, book: &mut ProjectBook) {
    if book.has_name(&known.name) {
        return;
    }
    let lines = trimmed_lines(text);
    let aliases: Vec<String> = known.aliases.iter().map(|a| a.to_lowercase()).collect();
    let hit = lines.iter().position(|l| {
        let lower = l.to_lowercase();
        aliases.iter().any(|a| lower.contains(a.as_str()))
    });

    let nearby_url = hit.and_then(|i| {
        let end = (i + KNOWN_URL_WINDOW).min(lines.len());
        lines[i..end]
            .iter()
            .find_map(|l| ex.urls.extract(l).into_iter().next())
    });
    let url = nearby_url.or_else(|| {
        let all = ex.urls.extract(text);
        known
            .url_hints
            .iter()
            .find_map(|hint| all.iter().find(|u| u.contains(hint.as_str())).cloned())
    });

    if hit.is_none() && url.is_none() {
        return;
    }
    let description = match hit {
        Some(i) => finish_description(lines[i]),
        None => known.name.clone(),
    };
    debug!(project = %known.name, url = ?url, "Known project recovered");
    book.push_named(Project::new(known.name.clone(), url, description));
}
