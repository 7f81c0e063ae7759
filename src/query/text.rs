// Plain-text search over workspace files

use std::fs;
use std::path::Path;

use regex::RegexBuilder;
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{IndexError, Result};

/// Most matches a text search returns
pub const MAX_TEXT_MATCHES: usize = 50;

/// Lines shown on each side of a match
const CONTEXT_LINES: usize = 2;

/// A line containing the searched text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextMatch {
    pub file: String,
    /// 1-based
    pub line: usize,
    /// The matching line, trimmed
    pub preview: String,
    /// Trimmed lines around the match, the match included
    pub context: Vec<String>,
}

/// File extensions searched for a language; `None` searches every file.
pub fn extensions_for(language: &str) -> Option<&'static [&'static str]> {
    match language {
        "python" => Some(&["py"]),
        "rust" => Some(&["rs"]),
        "javascript" => Some(&["js"]),
        "typescript" => Some(&["ts"]),
        "java" => Some(&["java"]),
        _ => None,
    }
}

/// Case-insensitive search for `needle` in the workspace files of `language`.
/// Ignored paths are skipped, unreadable or non-UTF-8 files silently.
pub fn search_text(root: &Path, config: &Config, needle: &str, language: &str) -> Result<Vec<TextMatch>> {
    let pattern = RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .map_err(|e| IndexError::QueryInput(e.to_string()))?;

    if !root.is_dir() {
        return Err(IndexError::Workspace {
            path: root.to_path_buf(),
            message: "not a readable directory".to_string(),
        });
    }

    let extensions = extensions_for(language);
    let relative = |path: &Path| -> Option<String> {
        let rel = path.strip_prefix(root).ok()?;
        Some(rel.to_string_lossy().replace('\\', "/"))
    };

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || relative(entry.path())
                    .map(|rel| !config.is_ignored(&rel))
                    .unwrap_or(false)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file());

    let mut matches = Vec::new();

    for entry in walker {
        let path = entry.path();

        if let Some(extensions) = extensions {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !extensions.contains(&ext) {
                continue;
            }
        }

        let Some(file) = relative(path) else {
            continue;
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Skipping {} in text search: {}", file, e);
                continue;
            }
        };

        let lines: Vec<&str> = content.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if !pattern.is_match(line) {
                continue;
            }

            let start = i.saturating_sub(CONTEXT_LINES);
            let end = (i + CONTEXT_LINES + 1).min(lines.len());

            matches.push(TextMatch {
                file: file.clone(),
                line: i + 1,
                preview: line.trim().to_string(),
                context: lines[start..end].iter().map(|l| l.trim().to_string()).collect(),
            });

            if matches.len() == MAX_TEXT_MATCHES {
                return Ok(matches);
            }
        }
    }

    Ok(matches)
}
