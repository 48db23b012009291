use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "folio.toml";

/// Runtime settings: an optional TOML file layered under `FOLIO_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_path: PathBuf,
    pub image_dir: PathBuf,
    pub preview: PreviewSettings,
    pub smtp: SmtpSettings,
    pub vocabulary: Vocabulary,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("data/folio.sqlite"),
            image_dir: PathBuf::from("static/images"),
            preview: PreviewSettings::default(),
            smtp: SmtpSettings::default(),
            vocabulary: Vocabulary::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("FOLIO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read settings from {}", path.display()))?
            .try_deserialize()
            .context("Failed to parse settings")?;

        info!(
            config = %path.display(),
            headings = settings.vocabulary.headings.len(),
            known_projects = settings.vocabulary.known_projects.len(),
            "Settings loaded"
        );
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// `{url}` is replaced by the page URL.
    pub screenshot_template: String,
    pub user_agent: String,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fetch_timeout_secs: 10,
            download_timeout_secs: 15,
            screenshot_template: "https://image.thum.io/get/width/1200/noanimate/{url}".into(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120 Safari/537.36".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".into(),
            port: 465,
            user: std::env::var("SMTP_USER").ok(),
            password: std::env::var("SMTP_PASS").ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SkillGroup {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogCategory {
    pub category: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SkillAlias {
    pub alias: String,
    pub canonical: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagRule {
    pub tag: String,
    pub keywords: Vec<String>,
}

/// A project the bullet heuristics are known to miss, recovered by alias
/// search and URL hints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KnownProject {
    pub name: String,
    pub aliases: Vec<String>,
    pub url_hints: Vec<String>,
}

/// Vocabulary tables injected into the extractor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub headings: Vec<String>,
    pub skill_categories: Vec<String>,
    pub known_skills: Vec<String>,
    pub skill_groups: Vec<SkillGroup>,
    pub skill_catalog: Vec<CatalogCategory>,
    pub skill_aliases: Vec<SkillAlias>,
    /// Bare `host.tld` tokens are only accepted when they end in one of these.
    pub url_suffixes: Vec<String>,
    pub project_tags: Vec<TagRule>,
    pub non_project_prefixes: Vec<String>,
    pub known_projects: Vec<KnownProject>,
    pub fallback_name: String,
    pub fallback_email: String,
    pub tagline: Option<String>,
    pub roles: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn group(name: &str, members: &[&str]) -> SkillGroup {
    SkillGroup {
        name: name.into(),
        members: strings(members),
    }
}

fn catalog(category: &str, skills: &[&str]) -> CatalogCategory {
    CatalogCategory {
        category: category.into(),
        skills: strings(skills),
    }
}

fn alias(alias: &str, canonical: &str) -> SkillAlias {
    SkillAlias {
        alias: alias.into(),
        canonical: canonical.into(),
    }
}

fn tag(tag: &str, keywords: &[&str]) -> TagRule {
    TagRule {
        tag: tag.into(),
        keywords: strings(keywords),
    }
}

fn known(name: &str, aliases: &[&str], url_hints: &[&str]) -> KnownProject {
    KnownProject {
        name: name.into(),
        aliases: strings(aliases),
        url_hints: strings(url_hints),
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            headings: strings(&[
                "Summary",
                "Objective",
                "About",
                "Education",
                "Experience",
                "Internship",
                "Internships",
                "Projects",
                "Skills",
                "Technical Skills",
                "Languages",
                "Certifications",
                "Achievements",
                "Contact",
            ]),
            skill_categories: strings(&[
                "Languages",
                "Frameworks",
                "Databases",
                "Machine Learning",
                "Concepts",
                "Tools",
            ]),
            known_skills: strings(&[
                "JavaScript",
                "TypeScript",
                "React",
                "Next.js",
                "Node.js",
                "Express",
                "MongoDB",
                "Mongoose",
                "PostgreSQL",
                "MySQL",
                "Python",
                "Flask",
                "Django",
                "HTML",
                "CSS",
                "Tailwind",
                "Bootstrap",
                "Git",
                "Docker",
                "AWS",
                "Google Cloud",
            ]),
            skill_groups: vec![
                group(
                    "frontend",
                    &["javascript", "typescript", "react", "next.js", "html", "css", "tailwind", "bootstrap"],
                ),
                group("backend", &["node.js", "express", "python", "flask", "django"]),
                group("database", &["mongodb", "mongoose", "postgresql", "mysql"]),
                group("tools", &["git", "docker", "aws", "google cloud"]),
            ],
            skill_catalog: vec![
                catalog("languages", &["Python", "C++", "JavaScript", "SQL", "C"]),
                catalog(
                    "frameworks",
                    &["Django", "Flask", "React.js", "React", "Tailwind CSS", "Bootstrap", "Next.js"],
                ),
                catalog("databases", &["PostgreSQL", "MySQL", "SQLite", "MongoDB", "Mongoose"]),
                catalog(
                    "machine_learning",
                    &["Pandas", "NumPy", "Scikit-learn", "Seaborn", "Matplotlib"],
                ),
                catalog(
                    "concepts",
                    &["Data Structures & Algorithms", "DSA", "OOP", "DBMS", "OS", "Computer Networks"],
                ),
                catalog(
                    "tools",
                    &["Git", "GitHub", "VS Code", "Linux", "Docker", "AWS", "Google Cloud"],
                ),
            ],
            skill_aliases: vec![
                alias("react", "React.js"),
                alias("react.js", "React.js"),
                alias("dsa", "Data Structures & Algorithms"),
            ],
            url_suffixes: strings(&[
                "com", "net", "org", "io", "dev", "app", "ai", "co", "in", "me", "tech", "xyz",
                "site", "blog", "gov", "edu", "render.com", "vercel.app", "onrender.com",
                "github.io",
            ]),
            project_tags: vec![
                tag("React", &["react", "react.js"]),
                tag("Next.js", &["next.js"]),
                tag("Node.js", &["node", "node.js"]),
                tag("Django", &["django"]),
                tag("Flask", &["flask"]),
                tag("Tailwind CSS", &["tailwind"]),
                tag("Bootstrap", &["bootstrap"]),
                tag("MongoDB", &["mongodb"]),
                tag("PostgreSQL", &["postgresql", "postgres"]),
                tag("MySQL", &["mysql"]),
                tag("Python", &["python"]),
                tag("TypeScript", &["typescript"]),
                tag("JavaScript", &["javascript"]),
            ],
            non_project_prefixes: strings(&[
                "developed",
                "designed",
                "integrated",
                "implemented",
                "build",
                "built",
                "github",
                "coursera",
                "kaggle",
                "udemy",
                "certification",
                "link",
                "languages",
                "soft skills",
                "tech stack",
                "teamwork",
            ]),
            known_projects: vec![
                known("MyPrepSpot", &["MyPrepSpot"], &["myprepspot.com"]),
                known(
                    "Career-F-Crawler",
                    &["Career-F-Crawler", "Career F Crawler"],
                    &["career-f-crawler.onrender.com"],
                ),
            ],
            fallback_name: "Anonymous".into(),
            fallback_email: "contact@example.com".into(),
            tagline: None,
            roles: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.vocabulary, Vocabulary::default());
        assert_eq!(settings.preview.concurrency, 4);
        assert_eq!(settings.database_path, PathBuf::from("data/folio.sqlite"));
    }

    #[test]
    fn file_overrides_whole_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
image_dir = "public/img"

[preview]
concurrency = 2

[vocabulary]
headings = ["Profile", "Work"]
fallback_name = "Jane Roe"

[[vocabulary.known_projects]]
name = "Orbit"
aliases = ["Orbit App"]
url_hints = ["orbit.dev"]
"#
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.image_dir, PathBuf::from("public/img"));
        assert_eq!(settings.preview.concurrency, 2);
        assert_eq!(settings.preview.fetch_timeout_secs, 10);
        assert_eq!(settings.vocabulary.headings, vec!["Profile", "Work"]);
        assert_eq!(settings.vocabulary.fallback_name, "Jane Roe");
        assert_eq!(settings.vocabulary.known_projects.len(), 1);
        assert_eq!(settings.vocabulary.known_projects[0].url_hints, vec!["orbit.dev"]);
        // untouched tables keep their defaults
        assert_eq!(settings.vocabulary.skill_categories.len(), 6);
    }
}
