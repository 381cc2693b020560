//! Directory loader: `components/**/*.json`, `layouts/**/*.json`, `knowledge/**/*.md`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use intentlayer_core::errors::CatalogError;
use intentlayer_core::models::KnowledgeDocument;
use regex::Regex;
use serde::de::DeserializeOwned;
use walkdir::WalkDir;

use crate::builtin;
use crate::catalog::TemplateCatalog;

static CATEGORY_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<!--\s*category:\s*([^>]*?)\s*-->").ok());
static TAGS_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<!--\s*tags:\s*([^>]*?)\s*-->").ok());
static ANY_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"<!--\s*(category|tags):[^>]*-->").ok());

const FALLBACK_CATEGORY: &str = "general";

impl TemplateCatalog {
    /// Load a catalog directory. Missing subdirectories fall back to the built-in entries.
    pub fn load_dir(root: &Path) -> Result<Self, CatalogError> {
        if !root.is_dir() {
            return Err(CatalogError::Io {
                path: root.display().to_string(),
                reason: "catalog directory does not exist".into(),
            });
        }

        let components = match read_json_entries(&root.join("components"))? {
            Some(found) => found,
            None => {
                tracing::warn!(root = %root.display(), "no components directory, using built-in components");
                builtin::components()?
            }
        };
        let layouts = match read_json_entries(&root.join("layouts"))? {
            Some(found) => found,
            None => {
                tracing::warn!(root = %root.display(), "no layouts directory, using built-in layouts");
                builtin::layouts()?
            }
        };
        let knowledge = match read_knowledge(&root.join("knowledge"))? {
            Some(found) => found,
            None => {
                tracing::warn!(root = %root.display(), "no knowledge directory, using built-in documents");
                builtin::knowledge()?
            }
        };

        let catalog = Self::new(components, layouts, knowledge)?;
        tracing::info!(
            root = %root.display(),
            entries = catalog.len(),
            version = catalog.version(),
            "template catalog loaded"
        );
        Ok(catalog)
    }
}

fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, CatalogError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CatalogError::Io {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == extension)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_file(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Each file holds one object or an array of objects. `None` when `dir` is absent.
fn read_json_entries<T: DeserializeOwned>(dir: &Path) -> Result<Option<Vec<T>>, CatalogError> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut entries = Vec::new();
    for path in files_with_extension(dir, "json")? {
        let parse_err = |e: serde_json::Error| CatalogError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        let value: serde_json::Value = serde_json::from_str(&read_file(&path)?).map_err(parse_err)?;
        match value {
            serde_json::Value::Array(items) => {
                for item in items {
                    entries.push(serde_json::from_value(item).map_err(parse_err)?);
                }
            }
            other => entries.push(serde_json::from_value(other).map_err(parse_err)?),
        }
    }
    Ok(Some(entries))
}

fn read_knowledge(dir: &Path) -> Result<Option<Vec<KnowledgeDocument>>, CatalogError> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut docs = Vec::new();
    for path in files_with_extension(dir, "md")? {
        let text = read_file(&path)?;
        let relative = path.strip_prefix(dir).unwrap_or(&path);
        docs.push(parse_markdown(relative, &text));
    }
    Ok(Some(docs))
}

/// Parse one markdown document. `relative` is the path below the knowledge root.
pub(crate) fn parse_markdown(relative: &Path, text: &str) -> KnowledgeDocument {
    let id = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    let capture = |marker: &LazyLock<Option<Regex>>| {
        marker
            .as_ref()
            .and_then(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let category = capture(&CATEGORY_MARKER)
        .or_else(|| {
            relative
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

    let tags = capture(&TAGS_MARKER)
        .map(|raw| {
            raw.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut title = None;
    let mut body = Vec::new();
    for line in text.lines() {
        if title.is_none() {
            if let Some(heading) = line.strip_prefix("# ") {
                title = Some(heading.trim().to_string());
                continue;
            }
        }
        body.push(line);
    }
    let body = body.join("\n");
    let content = match ANY_MARKER.as_ref() {
        Some(re) => re.replace_all(&body, "").trim().to_string(),
        None => body.trim().to_string(),
    };

    KnowledgeDocument {
        title: title.unwrap_or_else(|| id.clone()),
        id,
        content,
        category,
        tags,
    }
}
