use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::profile::Project;
use crate::settings::PreviewSettings;

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Where project preview images come from. Neither call fails: fetch falls
/// back to a screenshot URL and download reports success as a bool.
#[async_trait]
pub trait PreviewSource: Send + Sync {
    async fn preview_image(&self, page_url: &str) -> String;
    async fn download(&self, src: &str, dest: &Path) -> bool;
}

pub struct HttpPreview {
    client: Client,
    download_timeout: Duration,
    screenshot_template: String,
}

impl HttpPreview {
    pub fn new(settings: &PreviewSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.fetch_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            download_timeout: Duration::from_secs(settings.download_timeout_secs),
            screenshot_template: settings.screenshot_template.clone(),
        })
    }

    fn screenshot(&self, page_url: &str) -> String {
        screenshot_url(&self.screenshot_template, page_url)
    }

    async fn fetch_preview(&self, page_url: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(page_url)
            .send()
            .await
            .with_context(|| format!("GET {}", page_url))?;
        if response.status() != StatusCode::OK {
            info!(url = page_url, status = %response.status(), "No preview page");
            return Ok(None);
        }
        let html = response.text().await.context("Failed to read page body")?;
        Ok(find_preview_in_html(&html))
    }

    async fn fetch_bytes(&self, src: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(src)
            .timeout(self.download_timeout)
            .send()
            .await
            .with_context(|| format!("GET {}", src))?;
        if response.status() != StatusCode::OK {
            bail!("HTTP {}", response.status());
        }
        let bytes = response.bytes().await.context("Failed to read image body")?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(dest, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", dest.display()))?;
        Ok(())
    }
}

#[async_trait]
impl PreviewSource for HttpPreview {
    async fn preview_image(&self, page_url: &str) -> String {
        match self.fetch_preview(page_url).await {
            Ok(Some(src)) => src,
            Ok(None) => self.screenshot(page_url),
            Err(e) => {
                warn!(url = page_url, "Preview fetch failed: {:#}", e);
                self.screenshot(page_url)
            }
        }
    }

    async fn download(&self, src: &str, dest: &Path) -> bool {
        match self.fetch_bytes(src, dest).await {
            Ok(()) => true,
            Err(e) => {
                warn!(src, dest = %dest.display(), "Image download failed: {:#}", e);
                false
            }
        }
    }
}

pub fn screenshot_url(template: &str, page_url: &str) -> String {
    template.replace("{url}", page_url)
}

/// `og:image` content, else the first `<img>` if its src is absolute.
pub fn find_preview_in_html(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    if let Ok(og) = Selector::parse(r#"meta[property="og:image"]"#) {
        let content = doc
            .select(&og)
            .next()
            .and_then(|m| m.value().attr("content"))
            .filter(|c| !c.is_empty());
        if let Some(content) = content {
            return Some(content.to_string());
        }
    }

    let img = Selector::parse("img").ok()?;
    doc.select(&img)
        .next()
        .and_then(|i| i.value().attr("src"))
        .filter(|src| src.starts_with("http"))
        .map(str::to_string)
}

pub fn project_slug(name: &str) -> String {
    let slug = SLUG_RE.replace_all(&name.to_lowercase(), "-").trim_matches('-').to_string();
    if slug.is_empty() {
        "project".to_string()
    } else {
        slug
    }
}

/// Slug for `name`, suffixed `-2`, `-3`, ... when an earlier project in the
/// same run already claimed it.
fn unique_slug(taken: &mut HashMap<String, usize>, name: &str) -> String {
    let base = project_slug(name);
    let mut n = *taken.get(&base).unwrap_or(&0);
    let slug = loop {
        n += 1;
        let candidate = if n == 1 { base.clone() } else { format!("{}-{}", base, n) };
        if !taken.contains_key(&candidate) {
            break candidate;
        }
    };
    taken.insert(base, n);
    taken.insert(slug.clone(), 1);
    slug
}

pub struct EnrichStats {
    pub total: usize,
    pub saved: usize,
    pub remote: usize,
}

struct Fetched {
    index: usize,
    local: Option<String>,
    src: String,
}

/// Attach a preview image to every project with a URL. Fetches run
/// concurrently behind a semaphore; images land in `<image_dir>/projects/`.
pub async fn enrich_projects(
    projects: &mut [Project],
    source: Arc<dyn PreviewSource>,
    image_dir: &Path,
    concurrency: usize,
) -> Result<EnrichStats> {
    let concurrency = concurrency.max(1);
    let mut taken: HashMap<String, usize> = HashMap::new();
    let jobs: Vec<(usize, String, String)> = projects
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.url.clone().map(|u| (i, u, unique_slug(&mut taken, &p.name))))
        .collect();
    let total = jobs.len();

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} previews")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<Fetched>(concurrency * 2);

    for (index, url, slug) in jobs {
        let source = Arc::clone(&source);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();
        let dest: PathBuf = image_dir.join("projects").join(format!("{}.jpg", slug));

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let src = source.preview_image(&url).await;
            let local = if source.download(&src, &dest).await {
                Some(format!("projects/{}.jpg", slug))
            } else {
                None
            };
            let _ = tx.send(Fetched { index, local, src }).await;
        });
    }

    // rx closes once every task has dropped its sender
    drop(tx);

    let mut saved = 0usize;
    let mut remote = 0usize;
    while let Some(fetched) = rx.recv().await {
        let project = &mut projects[fetched.index];
        match fetched.local {
            Some(path) => {
                project.image = Some(path);
                saved += 1;
            }
            None => {
                project.image_remote = Some(fetched.src);
                remote += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Previews for {} projects ({} saved, {} remote)", total, saved, remote);

    Ok(EnrichStats { total, saved, remote })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSource;

    #[async_trait]
    impl PreviewSource for FakeSource {
        async fn preview_image(&self, page_url: &str) -> String {
            format!("{}/og.png", page_url)
        }

        async fn download(&self, src: &str, dest: &Path) -> bool {
            if src.contains("broken") {
                return false;
            }
            std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
            std::fs::write(dest, src.as_bytes()).is_ok()
        }
    }

    #[test]
    fn og_image_wins_over_img() {
        let html = r#"<html><head><meta property="og:image" content="https://cdn.test/card.png"></head>
            <body><img src="https://cdn.test/logo.png"></body></html>"#;
        assert_eq!(find_preview_in_html(html).as_deref(), Some("https://cdn.test/card.png"));
    }

    #[test]
    fn first_absolute_img_is_used() {
        let html = r#"<body><img src="https://cdn.test/hero.jpg"><img src="/b.png"></body>"#;
        assert_eq!(find_preview_in_html(html).as_deref(), Some("https://cdn.test/hero.jpg"));
        assert_eq!(find_preview_in_html(r#"<img src="/relative.png">"#), None);
        assert_eq!(find_preview_in_html("<p>nothing</p>"), None);
    }

    #[test]
    fn slugs_and_screenshots() {
        assert_eq!(project_slug("Career-F-Crawler"), "career-f-crawler");
        assert_eq!(project_slug("C++ Engine!"), "c-engine");
        assert_eq!(project_slug("++"), "project");
        assert_eq!(
            screenshot_url("https://shots.test/{url}", "https://folio.dev"),
            "https://shots.test/https://folio.dev"
        );
    }

    #[test]
    fn colliding_slugs_get_suffixes() {
        let mut taken = HashMap::new();
        assert_eq!(unique_slug(&mut taken, "C++ Engine"), "c-engine");
        assert_eq!(unique_slug(&mut taken, "C Engine"), "c-engine-2");
        assert_eq!(unique_slug(&mut taken, "c engine!"), "c-engine-3");
        assert_eq!(unique_slug(&mut taken, "C Engine 2"), "c-engine-2-2");
    }

    #[tokio::test]
    async fn unreachable_host_falls_back() {
        let settings = PreviewSettings::default();
        let http = HttpPreview::new(&settings).unwrap();
        let page = "http://127.0.0.1:9/";

        assert_eq!(
            http.preview_image(page).await,
            screenshot_url(&settings.screenshot_template, page)
        );

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("projects/down.jpg");
        assert!(!http.download("http://127.0.0.1:9/card.png", &dest).await);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn same_slug_projects_keep_separate_images() {
        let dir = tempfile::tempdir().unwrap();
        let mut projects = vec![
            Project::new("C++ Engine".into(), Some("https://cpp.dev".into()), "Project".into()),
            Project::new("C Engine".into(), Some("https://c.dev".into()), "Project".into()),
        ];

        let stats = enrich_projects(&mut projects, Arc::new(FakeSource), dir.path(), 2)
            .await
            .unwrap();

        assert_eq!(stats.saved, 2);
        assert_eq!(projects[0].image.as_deref(), Some("projects/c-engine.jpg"));
        assert_eq!(projects[1].image.as_deref(), Some("projects/c-engine-2.jpg"));
        let first = std::fs::read_to_string(dir.path().join("projects/c-engine.jpg")).unwrap();
        assert_eq!(first, "https://cpp.dev/og.png");
    }

    #[tokio::test]
    async fn enrich_saves_or_keeps_remote() {
        let dir = tempfile::tempdir().unwrap();
        let mut projects = vec![
            Project::new("Folio".into(), Some("https://folio.dev".into()), "Project".into()),
            Project::new("Offline".into(), None, "Project".into()),
            Project::new("Broken App".into(), Some("https://broken.dev".into()), "Project".into()),
        ];

        let stats = enrich_projects(&mut projects, Arc::new(FakeSource), dir.path(), 2)
            .await
            .unwrap();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.saved, 1);
        assert_eq!(stats.remote, 1);
        assert_eq!(projects[0].image.as_deref(), Some("projects/folio.jpg"));
        assert!(dir.path().join("projects/folio.jpg").exists());
        assert_eq!(projects[1].image, None);
        assert_eq!(projects[1].image_remote, None);
        assert_eq!(projects[2].image, None);
        assert_eq!(projects[2].image_remote.as_deref(), Some("https://broken.dev/og.png"));
    }
}
