use crate::settings::TagRule;

/// Technologies whose keywords occur in the lowercased description.
pub fn tags_for(rules: &[TagRule], description: &str) -> Vec<String> {
    let lower = description.to_lowercase();
    rules
        .iter()
        .filter(|rule| rule.keywords.iter().any(|k| lower.contains(k.as_str())))
        .map(|rule| rule.tag.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Vocabulary;

    #[test]
    fn substring_keywords_in_table_order() {
        let rules = Vocabulary::default().project_tags;
        assert_eq!(
            tags_for(&rules, "A Next.js + Postgres app with Tailwind"),
            vec!["Next.js", "Tailwind CSS", "PostgreSQL"]
        );
        assert!(tags_for(&rules, "Hand-written assembly").is_empty());
    }
}
