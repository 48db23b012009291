use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

static HSPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Linearized résumé text with runs of spaces and tabs collapsed.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: PathBuf,
    pub text: String,
}

/// Reads a résumé from disk. PDFs go through text extraction; anything
/// else must be UTF-8.
pub fn load_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let raw = if is_pdf(path, &bytes) {
        pdf_extract::extract_text_from_mem(&bytes)
            .with_context(|| format!("Failed to extract text from PDF {}", path.display()))?
    } else {
        String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8 text", path.display()))?
    };

    let text = normalize(&raw);
    debug!(source = %path.display(), chars = text.len(), "Document loaded");
    Ok(Document {
        source: path.to_path_buf(),
        text,
    })
}

fn is_pdf(path: &Path, bytes: &[u8]) -> bool {
    let by_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    by_ext || bytes.starts_with(b"%PDF-")
}

/// Collapses spaces and tabs; line breaks survive.
pub fn normalize(raw: &str) -> String {
    HSPACE_RE.replace_all(raw, " ").into_owned()
}
