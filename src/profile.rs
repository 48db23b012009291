use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub email: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

/// Skills in exactly one of two shapes: labelled categories lifted from a
/// skills block, or coarse role-area groups found by scanning the whole text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "groups", rename_all = "snake_case")]
pub enum SkillSet {
    Categorized(BTreeMap<String, Vec<String>>),
    Grouped(BTreeMap<String, Vec<String>>),
}

impl SkillSet {
    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        match self {
            SkillSet::Categorized(g) | SkillSet::Grouped(g) => g,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups().values().all(|v| v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationLevel {
    Bachelor,
    Masters,
    #[serde(rename = "High School")]
    HighSchool,
    Education,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub level: EducationLevel,
    pub raw_text: String,
    pub period: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Milestone {
    #[serde(rename = "Current Job")]
    CurrentJob,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JourneyTitle {
    Education(EducationLevel),
    Milestone(Milestone),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyItem {
    pub title: JourneyTitle,
    pub text: String,
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub url: Option<String>,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Local preview path relative to the image directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Remote preview reference kept when the download failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_remote: Option<String>,
}

impl Project {
    pub fn new(name: String, url: Option<String>, description: String) -> Self {
        Self {
            name,
            url,
            description,
            tags: Vec::new(),
            image: None,
            image_remote: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub tagline: Option<String>,
    pub about: String,
    pub contacts: Contact,
    pub contact_email: String,
    pub skills: SkillSet,
    pub education: Vec<EducationEntry>,
    pub internships: Vec<String>,
    pub current_job: Option<String>,
    pub journey: Vec<JourneyItem>,
    pub projects: Vec<Project>,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journey_titles_serialize_as_plain_labels() {
        let items = vec![
            JourneyTitle::Education(EducationLevel::HighSchool),
            JourneyTitle::Milestone(Milestone::CurrentJob),
            JourneyTitle::Milestone(Milestone::Internship),
        ];
        let json = serde_json::to_string(&items).unwrap();
        assert_eq!(json, r#"["High School","Current Job","Internship"]"#);
        let back: Vec<JourneyTitle> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, items);
    }

    #[test]
    fn skill_set_emptiness() {
        let mut groups = BTreeMap::new();
        groups.insert("tools".to_string(), Vec::new());
        assert!(SkillSet::Grouped(groups.clone()).is_empty());
        groups.insert("languages".to_string(), vec!["Rust".to_string()]);
        assert!(!SkillSet::Categorized(groups).is_empty());
    }

    #[test]
    fn project_preview_fields_are_omitted_when_absent() {
        let p = Project::new("Folio".into(), None, "Project".into());
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("image").is_none());
        assert!(json.get("image_remote").is_none());
        assert_eq!(json["tags"], serde_json::json!([]));
    }
}
