use std::sync::LazyLock;

use regex::Regex;

static EXPLICIT_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s)]+").unwrap());
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)+(?:/[^\s)]+)?\b").unwrap());
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://(?:www\.)?").unwrap());

const TRAILING_PUNCT: &[char] = &[')', '.', ',', ';', '"', '\''];

/// Pulls explicit and bare-domain URLs out of free text.
#[derive(Debug, Clone)]
pub struct UrlExtractor {
    suffix_re: Regex,
}

impl UrlExtractor {
    pub fn new(suffixes: &[String]) -> Self {
        let alternatives = suffixes
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let suffix_re = Regex::new(&format!(r"\.(?:{})(?:/|$)", alternatives))
            .expect("escaped suffixes form a valid pattern");
        Self { suffix_re }
    }

    /// URLs in document order, de-duplicated. Bare tokens are kept only when
    /// they end in an allowed suffix, and get an `https://` prefix.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let explicit: Vec<(usize, usize)> = EXPLICIT_URL_RE
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut candidates: Vec<(usize, &str)> = explicit
            .iter()
            .map(|&(start, end)| (start, &text[start..end]))
            .collect();

        for m in BARE_URL_RE.find_iter(text) {
            let inside_explicit = explicit.iter().any(|&(s, e)| m.start() < e && m.end() > s);
            // user or domain half of an e-mail address
            let touches_at = text[..m.start()].ends_with('@') || text[m.end()..].starts_with('@');
            if !inside_explicit && !touches_at {
                candidates.push((m.start(), m.as_str()));
            }
        }
        candidates.sort_by_key(|(pos, _)| *pos);

        let mut urls: Vec<String> = Vec::new();
        for (_, raw) in candidates {
            let trimmed = raw.trim_end_matches(TRAILING_PUNCT);
            let url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
                trimmed.to_string()
            } else if self.suffix_re.is_match(trimmed) {
                format!("https://{}", trimmed)
            } else {
                continue;
            };
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }
}

/// First DNS label of the URL's host, without scheme or `www.`.
pub fn host_label(url: &str) -> &str {
    let rest = match SCHEME_RE.find(url) {
        Some(m) => &url[m.end()..],
        None => url,
    };
    let host = rest.split('/').next().unwrap_or_default();
    host.split('.').next().unwrap_or_default()
}

/// Upper-cases every letter that follows a non-letter, lower-cases the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Vocabulary;

    fn extractor() -> UrlExtractor {
        UrlExtractor::new(&Vocabulary::default().url_suffixes)
    }

    #[test]
    fn bare_platform_domain_is_accepted() {
        let urls = extractor().extract("Visit myproject.vercel.app for demo");
        assert_eq!(urls, vec!["https://myproject.vercel.app"]);
    }

    #[test]
    fn version_numbers_are_rejected() {
        assert!(extractor().extract("version 2.5 released").is_empty());
        assert!(extractor().extract("CGPA 8.72 / 10, built with Node.js").is_empty());
    }

    #[test]
    fn explicit_urls_keep_scheme_and_lose_trailing_punctuation() {
        let urls = extractor().extract("Code (http://example.org/repo), docs: https://docs.rs/regex.");
        assert_eq!(urls, vec!["http://example.org/repo", "https://docs.rs/regex"]);
    }

    #[test]
    fn order_and_dedup() {
        let text = "github.com/jane then https://github.com/jane and linkedin.com/in/jane github.com/jane";
        let urls = extractor().extract(text);
        assert_eq!(urls, vec!["https://github.com/jane", "https://linkedin.com/in/jane"]);
    }

    #[test]
    fn email_halves_are_not_urls() {
        assert!(extractor().extract("mail jane.doe@example.com").is_empty());
    }

    #[test]
    fn host_label_strips_scheme_and_www() {
        assert_eq!(host_label("https://www.career-f-crawler.onrender.com/x"), "career-f-crawler");
        assert_eq!(host_label("http://myprepspot.com"), "myprepspot");
    }

    #[test]
    fn title_case_matches_word_starts() {
        assert_eq!(title_case("career-f-crawler"), "Career-F-Crawler");
        assert_eq!(title_case("myPREPspot"), "Myprepspot");
    }
}
