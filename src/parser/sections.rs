use regex::Regex;

#[derive(Debug, Clone)]
pub struct Heading {
    pub label: String,
    pub re: Regex,
}

/// Case-insensitive, word-bounded matcher for a literal term.
pub fn word_regex(term: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))).expect("escaped term is a valid pattern")
}

/// Splits a document into sections on a fixed heading vocabulary.
///
/// Every vocabulary heading terminates a section, including aliases of the
/// one being extracted ("Internship" ends at "Internships").
#[derive(Debug, Clone)]
pub struct Segmenter {
    headings: Vec<Heading>,
}

impl Segmenter {
    pub fn new(labels: &[String]) -> Self {
        let headings = labels
            .iter()
            .map(|label| Heading {
                label: label.clone(),
                re: word_regex(label),
            })
            .collect();
        Self { headings }
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// Text between the first occurrence of `heading` (plus an optional colon)
    /// and the earliest following occurrence of any other heading. Empty when
    /// `heading` does not occur.
    pub fn extract_section<'a>(&self, text: &'a str, heading: &str) -> &'a str {
        self.extract_section_with(text, heading, &[])
    }

    /// Like [`extract_section`](Self::extract_section), but an occurrence of
    /// one of `inline_labels` directly followed by a colon is treated as a
    /// field label inside the section rather than as a new heading.
    pub fn extract_section_with<'a>(
        &self,
        text: &'a str,
        heading: &str,
        inline_labels: &[String],
    ) -> &'a str {
        let start_re = self
            .headings
            .iter()
            .find(|h| h.label.eq_ignore_ascii_case(heading))
            .map(|h| h.re.clone())
            .unwrap_or_else(|| word_regex(heading));

        let Some(m) = start_re.find(text) else {
            return "";
        };
        let mut start = m.end();
        if text[start..].starts_with(':') {
            start += 1;
        }

        let rest = &text[start..];
        let end = self
            .headings
            .iter()
            .filter(|h| !h.label.eq_ignore_ascii_case(heading))
            .filter_map(|h| {
                let inline = inline_labels.iter().any(|l| l.eq_ignore_ascii_case(&h.label));
                h.re
                    .find_iter(rest)
                    .find(|hm| !(inline && rest[hm.end()..].trim_start().starts_with(':')))
                    .map(|hm| start + hm.start())
            })
            .min()
            .unwrap_or(text.len());

        text[start..end].trim()
    }

    /// First non-empty section among `headings`, tried in order.
    pub fn first_section<'a>(&self, text: &'a str, headings: &[&str]) -> &'a str {
        headings
            .iter()
            .map(|h| self.extract_section(text, h))
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }
}
