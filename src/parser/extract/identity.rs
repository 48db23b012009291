use std::sync::LazyLock;

use regex::Regex;

use crate::parser::Extractor;
use crate::profile::Contact;

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z .'-]{2,}$").unwrap());

// Tolerates the stray spaces PDF text extraction leaves around '@', and
// around a dot only when they sit on both sides of it.
static LOOSE_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([A-Za-z0-9_%+-]+(?:(?:[ \t]+\.[ \t]+|\.)[A-Za-z0-9_%+-]+)*)[ \t]*@[ \t]*([A-Za-z0-9-]+(?:(?:[ \t]+\.[ \t]+|\.)[A-Za-z0-9-]+)*)(?:[ \t]+\.[ \t]+|\.)([A-Za-z]{2,})",
    )
    .unwrap()
});
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());

const NAME_WINDOW: usize = 5;

pub struct Identity {
    pub name: String,
    pub contacts: Contact,
}

pub fn extract(ex: &Extractor, text: &str) -> Identity {
    Identity {
        name: find_name(text).unwrap_or_else(|| ex.vocab.fallback_name.clone()),
        contacts: extract_contacts(ex, text),
    }
}

/// First of the leading non-blank lines that looks like a personal name.
pub fn find_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(NAME_WINDOW)
        .find(|l| NAME_RE.is_match(l))
        .map(str::to_string)
}

/// E-mail with whitespace artifacts repaired, plus the first LinkedIn and
/// GitHub URLs. The e-mail is left empty here; the orchestrator applies the
/// fallback address.
pub fn extract_contacts(ex: &Extractor, text: &str) -> Contact {
    let urls = ex.urls.extract(text);
    let find_url = |host: &str| urls.iter().find(|u| u.contains(host)).cloned();

    Contact {
        email: find_email(text),
        linkedin: find_url("linkedin.com"),
        github: find_url("github.com"),
    }
}

pub fn find_email(text: &str) -> Option<String> {
    if let Some(caps) = LOOSE_EMAIL_RE.captures(text) {
        let squash = |i: usize| -> String {
            caps[i].chars().filter(|c| !c.is_whitespace()).collect()
        };
        return Some(format!("{}@{}.{}", squash(1), squash(2), squash(3)));
    }
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_with_stray_spaces_is_repaired() {
        assert_eq!(find_email("Mail: john . doe @ example . com").as_deref(), Some("john.doe@example.com"));
        assert_eq!(find_email("jane_roe@mail.co.in | +91 99").as_deref(), Some("jane_roe@mail.co.in"));
        assert_eq!(find_email("no address here"), None);
    }

    #[test]
    fn sentence_end_is_not_glued_to_email() {
        assert_eq!(find_email("Based in Pune, India. jane@x.com").as_deref(), Some("jane@x.com"));
        assert_eq!(find_email("Write to jane@x.com. Thanks").as_deref(), Some("jane@x.com"));
    }

    #[test]
    fn name_is_first_plausible_leading_line() {
        assert_eq!(find_name("\n  Jane O'Neil-Roe \nBackend developer").as_deref(), Some("Jane O'Neil-Roe"));
        assert_eq!(find_name("+91 99999\njane@x.com\nJ. Doe").as_deref(), Some("J. Doe"));
        assert_eq!(find_name("Al"), None);
    }

    #[test]
    fn name_search_stops_after_five_lines() {
        let text = "1\n2\n3\n4\n5\nJane Roe";
        assert_eq!(find_name(text), None);
    }

    #[test]
    fn fallback_name_and_social_links() {
        let ex = Extractor::default();
        let id = extract(
            &ex,
            "+1 555 0100\nlinkedin.com/in/jroe | https://github.com/jroe | https://github.com/other",
        );
        assert_eq!(id.name, "Anonymous");
        assert_eq!(id.contacts.linkedin.as_deref(), Some("https://linkedin.com/in/jroe"));
        assert_eq!(id.contacts.github.as_deref(), Some("https://github.com/jroe"));
        assert_eq!(id.contacts.email, None);
    }
}
