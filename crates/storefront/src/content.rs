//! Markdown info pages (FAQ, returns, shipping, contact, terms).
//!
//! Pages live in `content/pages/*.md` with YAML frontmatter and are rendered
//! to HTML once at startup.

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Frontmatter of an info page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// A rendered page with metadata and HTML content
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// Content store that holds all loaded pages in memory
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load every `*.md` file under `content_dir/pages`.
    ///
    /// A missing directory yields an empty store. Pages that fail to read or
    /// parse are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the pages directory exists but cannot be listed.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "No pages directory, serving no info pages");
            return Ok(Self::default());
        }

        let mut pages = HashMap::new();
        for path in std::fs::read_dir(&dir)
            .map_err(|e| ContentError::Io(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        {
            match read_page(&path) {
                Ok(page) => {
                    tracing::debug!(slug = %page.slug, "Loaded page");
                    pages.insert(page.slug.clone(), page);
                }
                Err(e) => tracing::error!(path = %path.display(), error = %e, "Skipping page"),
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Build a store from in-memory `(slug, markdown)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if any page lacks valid frontmatter.
    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ContentError> {
        let pages = sources
            .into_iter()
            .map(|(slug, source)| parse_page(slug, source).map(|p| (p.slug.clone(), p)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Read a page file; its stem is the slug.
fn read_page(path: &Path) -> Result<Page, ContentError> {
    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ContentError::Parse(format!("bad file name {}", path.display())))?;
    let source = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;
    parse_page(slug, &source)
}

fn parse_page(slug: &str, source: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(source)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Page {
        slug: slug.to_string(),
        meta,
        content_html: render_markdown(&parsed.content),
    })
}

/// GFM tables, autolinks and heading anchors. Raw HTML passes through: the
/// pages ship with the binary.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());
    options.render.r#unsafe = true;
    markdown_to_html(content, &options)
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FAQ: &str = "---\ntitle: Frequently Asked Questions\nupdated_at: 2025-06-01\n---\n\n## Shipping\n\nWe ship **everywhere**.\n";

    #[test]
    fn test_parse_page_renders_markdown() {
        let store = ContentStore::from_sources([("faq", FAQ)]).unwrap();
        let page = store.get_page("faq").unwrap();
        assert_eq!(page.meta.title, "Frequently Asked Questions");
        assert!(page.content_html.contains("<strong>everywhere</strong>"));
        assert!(page.content_html.contains("<h2"));
        assert_eq!(
            page.meta.updated_at,
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
    }

    #[test]
    fn test_missing_frontmatter_is_an_error() {
        let result = ContentStore::from_sources([("terms", "# Terms\n")]);
        assert!(matches!(result, Err(ContentError::Parse(_))));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let store = ContentStore::load(Path::new("/nonexistent/o2-content")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_bundled_pages_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("content");
        let store = ContentStore::load(&dir).unwrap();
        for slug in ["faq", "returns", "shipping", "contact", "terms"] {
            assert!(store.get_page(slug).is_some(), "missing page {slug}");
        }
    }
}
