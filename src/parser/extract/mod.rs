pub mod education;
pub mod identity;
pub mod projects;
pub mod skills;
pub mod tags;
pub mod timeline;

use tracing::debug;

use crate::parser::Extractor;
use crate::profile::Profile;

const ABOUT_HEADINGS: &[&str] = &["Summary", "Objective", "About"];

/// Runs the independent extractors over the same text and merges them into
/// one profile record.
pub fn extract_all(ex: &Extractor, text: &str) -> Profile {
    let ((identity, skills), ((education, timeline), projects)) = rayon::join(
        || {
            rayon::join(
                || identity::extract(ex, text),
                || skills::extract(ex, text),
            )
        },
        || {
            rayon::join(
                || {
                    rayon::join(
                        || education::extract(ex, text),
                        || timeline::extract(ex, text),
                    )
                },
                || projects::extract(ex, text),
            )
        },
    );

    let about = ex.segmenter.first_section(text, ABOUT_HEADINGS).to_string();

    let mut contacts = identity.contacts;
    let contact_email = contacts
        .email
        .get_or_insert_with(|| ex.vocab.fallback_email.clone())
        .clone();

    let journey = timeline::build_journey(
        &education,
        timeline.current_job.as_deref(),
        &timeline.internships,
    );

    debug!(
        name = %identity.name,
        education = education.len(),
        internships = timeline.internships.len(),
        projects = projects.len(),
        "Profile assembled"
    );

    Profile {
        name: identity.name,
        tagline: ex.vocab.tagline.clone(),
        about,
        contacts,
        contact_email,
        skills,
        education,
        internships: timeline.internships,
        current_job: timeline.current_job,
        journey,
        projects,
        roles: ex.vocab.roles.clone(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::profile::{EducationLevel, JourneyTitle, Milestone, SkillSet};

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.txt", name)).unwrap()
    }

    #[test]
    fn full_resume_profile() {
        let ex = Extractor::default();
        let p = ex.extract(&fixture("jane_roe"));

        assert_eq!(p.name, "Jane Roe");
        assert_eq!(p.contact_email, "jane.roe@example.com");
        assert_eq!(p.contacts.email.as_deref(), Some("jane.roe@example.com"));
        assert_eq!(p.contacts.linkedin.as_deref(), Some("https://linkedin.com/in/janeroe"));
        assert_eq!(p.contacts.github.as_deref(), Some("https://github.com/janeroe"));
        assert!(p.about.starts_with("Backend developer"));

        let SkillSet::Categorized(groups) = &p.skills else {
            panic!("expected categorized skills, got {:?}", p.skills);
        };
        assert_eq!(groups["languages"], vec!["Python", "C++", "JavaScript"]);
        assert_eq!(groups["frameworks"], vec!["Flask", "React", "Node.js"]);
        assert_eq!(groups["tools"], vec!["Git", "Docker"]);

        assert_eq!(p.education.len(), 2);
        assert_eq!(p.education[0].level, EducationLevel::Bachelor);
        assert_eq!(p.education[0].period.as_deref(), Some("Aug 2019 - May 2023"));
        assert_eq!(p.education[1].level, EducationLevel::HighSchool);

        assert_eq!(p.current_job.as_deref(), Some("Software Engineer, Northwind (Jun 2023 - Present)"));
        assert_eq!(p.internships.len(), 2);

        let titles: Vec<JourneyTitle> = p.journey.iter().map(|j| j.title).collect();
        assert_eq!(
            titles,
            vec![
                JourneyTitle::Education(EducationLevel::Bachelor),
                JourneyTitle::Education(EducationLevel::HighSchool),
                JourneyTitle::Milestone(Milestone::CurrentJob),
                JourneyTitle::Milestone(Milestone::Internship),
                JourneyTitle::Milestone(Milestone::Internship),
            ]
        );

        let names: Vec<&str> = p.projects.iter().map(|x| x.name.as_str()).collect();
        assert_eq!(names, vec!["Folio", "Orbit", "Ledger Sync", "MyPrepSpot"]);
        assert_eq!(p.projects[0].url.as_deref(), Some("https://folio.vercel.app"));
        assert_eq!(p.projects[3].url.as_deref(), Some("https://myprepspot.com"));
        assert!(p.projects[1].tags.contains(&"React".to_string()));
    }

    #[test]
    fn project_names_are_unique() {
        let ex = Extractor::default();
        for name in ["jane_roe", "sparse"] {
            let p = ex.extract(&fixture(name));
            let mut seen = HashSet::new();
            assert!(p.projects.iter().all(|x| seen.insert(x.name.to_lowercase())));
        }
    }

    #[test]
    fn sparse_resume_uses_fallbacks() {
        let ex = Extractor::default();
        let p = ex.extract(&fixture("sparse"));
        assert_eq!(p.name, "Sam Lee");
        assert_eq!(p.contact_email, "sam.lee@mail.com");
        assert!(matches!(p.skills, SkillSet::Categorized(_)));
        assert_eq!(p.skills.groups()["databases"], vec!["PostgreSQL"]);
        assert_eq!(p.current_job.as_deref(), Some("Data Analyst at Contoso"));
        let names: Vec<&str> = p.projects.iter().map(|x| x.name.as_str()).collect();
        assert_eq!(names, vec!["Samlee", "Github"]);
    }

    #[test]
    fn empty_document_still_produces_a_profile() {
        let ex = Extractor::default();
        let p = ex.extract("");
        assert_eq!(p.name, "Anonymous");
        assert_eq!(p.contact_email, "contact@example.com");
        assert_eq!(p.contacts.email.as_deref(), Some("contact@example.com"));
        assert_eq!(p.about, "");
        assert!(p.skills.is_empty());
        assert!(p.education.is_empty());
        assert!(p.journey.is_empty());
        assert!(p.projects.is_empty());
        assert_eq!(p.current_job, None);
    }

    #[test]
    fn extraction_is_deterministic() {
        let ex = Extractor::default();
        let text = fixture("jane_roe");
        let first = serde_json::to_string(&ex.extract(&text)).unwrap();
        let second = serde_json::to_string(&ex.extract(&text)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn vocabulary_is_injected() {
        let mut vocab = crate::settings::Vocabulary::default();
        vocab.fallback_name = "Portfolio Owner".into();
        vocab.tagline = Some("Builds things".into());
        vocab.roles = vec!["Engineer".into()];
        let p = Extractor::new(vocab).extract("42");
        assert_eq!(p.name, "Portfolio Owner");
        assert_eq!(p.tagline.as_deref(), Some("Builds things"));
        assert_eq!(p.roles, vec!["Engineer"]);
    }
}
