//! Corpus files: discovery and per-format line extraction.

use crate::error::{MorphError, Result};
use crate::text::{natural_cmp, strip_bom};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported corpus formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain text, one line per block.
    Text,
    /// Advanced SubStation Alpha subtitles.
    Ass,
    /// SubRip subtitles.
    Srt,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<SourceKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "txt" => Some(SourceKind::Text),
            "ass" => Some(SourceKind::Ass),
            "srt" => Some(SourceKind::Srt),
            _ => None,
        }
    }
}

/// Every supported file under `dir`, in natural order of their full paths.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory loop"));
            MorphError::io(path, source)
        })?;
        if entry.file_type().is_file() && SourceKind::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
    Ok(files)
}

/// Read a source file as UTF-8 with any byte-order marks removed.
///
/// Undecodable content reads as empty text.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| MorphError::io(path, e))?;
    let text = String::from_utf8(bytes).unwrap_or_default();
    Ok(strip_bom(&text).replace('\u{feff}', ""))
}

/// Split a source into the text blocks that are measured one by one.
///
/// Plain text yields every line. ASS yields the text column of each dialogue
/// line, as declared by the latest `Format:` header. SRT skips the counter and
/// timing lines and joins the rest of each cue.
pub fn text_blocks(kind: SourceKind, text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut pending = String::new();
    let mut text_index: Option<usize> = None;
    let mut num_fields = 1;
    let mut srt_line = 0;

    for line in text.lines() {
        let mut flush = true;
        let content: &str = match kind {
            SourceKind::Text => line,
            SourceKind::Ass => {
                if let Some(pos) = line.find("Format:") {
                    let formats: Vec<&str> = line[pos + "Format:".len()..]
                        .split(',')
                        .map(str::trim)
                        .collect();
                    text_index = formats.iter().position(|f| *f == "Text");
                    num_fields = formats.len();
                    continue;
                }
                let (Some(pos), Some(index)) = (line.find("Dialogue:"), text_index) else {
                    continue;
                };
                let columns: Vec<&str> = line[pos + "Dialogue:".len()..]
                    .splitn(num_fields.max(1), ',')
                    .collect();
                match columns.get(index) {
                    Some(c) => *c,
                    None => continue,
                }
            }
            SourceKind::Srt => {
                srt_line += 1;
                if srt_line <= 2 {
                    continue;
                }
                if line.is_empty() {
                    srt_line = 0;
                } else {
                    flush = false;
                }
                line
            }
        };

        if !content.is_empty() {
            pending.push_str(content);
            pending.push('\n');
        }
        if flush && !pending.is_empty() {
            blocks.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        blocks.push(pending);
    }
    blocks
}
