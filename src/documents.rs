//! Document loading: `.docx` paragraphs or plain-text lines.
//!
//! A `.docx` file is a zip archive; the body text lives in
//! `word/document.xml` as `<w:p>` paragraphs made of `<w:t>` runs.

use crate::error::{BudgetError, Result};
use crate::normalize::normalize_line;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const DOCX_BODY_ENTRY: &str = "word/document.xml";

fn is_docx(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"))
}

/// Ordered paragraphs of a document. `label` names the source in errors
/// ("Meals file", "Walmart items").
pub fn list_paragraphs(path: &Path, label: &str) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(BudgetError::SourceNotFound {
            label: label.to_string(),
            path: path.to_path_buf(),
        });
    }

    let paragraphs = if is_docx(path) {
        let xml = read_docx_body(path).map_err(|reason| BudgetError::unreadable(label, path, reason))?;
        docx_paragraphs(&xml).map_err(|e| BudgetError::unreadable(label, path, e))?
    } else {
        let text = std::fs::read_to_string(path).map_err(|e| BudgetError::unreadable(label, path, e))?;
        text.lines().map(str::to_string).collect()
    };

    debug!(path = %path.display(), paragraphs = paragraphs.len(), "loaded document");
    Ok(paragraphs)
}

/// Inventory items: non-blank, normalized paragraphs.
pub fn load_inventory(path: &Path, label: &str) -> Result<Vec<String>> {
    let items: Vec<String> = list_paragraphs(path, label)?
        .iter()
        .map(|p| normalize_line(p))
        .filter(|p| !p.is_empty())
        .collect();

    if items.is_empty() {
        return Err(BudgetError::EmptySource {
            label: label.to_string(),
            path: path.to_path_buf(),
        });
    }
    Ok(items)
}

fn read_docx_body(path: &Path) -> std::result::Result<String, String> {
    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| format!("not a .docx archive: {e}"))?;
    let mut entry = archive
        .by_name(DOCX_BODY_ENTRY)
        .map_err(|e| format!("missing {DOCX_BODY_ENTRY}: {e}"))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(|e| e.to_string())?;
    Ok(xml)
}

/// Elements whose paragraphs are not body paragraphs: text boxes and tables.
fn is_nested_container(local_name: &[u8]) -> bool {
    matches!(local_name, b"txbxContent" | b"tbl")
}

/// Extract paragraph text from WordprocessingML, one string per body-level
/// `<w:p>`.
///
/// Tabs and breaks inside a paragraph become `\t` and `\n`. Text boxes and
/// tables are skipped entirely; a text box anchored in a paragraph does not
/// disturb that paragraph's own text.
pub fn docx_paragraphs(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_run = false;
    let mut in_text = false;
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) if is_nested_container(e.local_name().as_ref()) => {
                skip_depth += 1;
                continue;
            }
            Event::End(e) if is_nested_container(e.local_name().as_ref()) => {
                skip_depth = skip_depth.saturating_sub(1);
                continue;
            }
            Event::Eof => break,
            _ if skip_depth > 0 => continue,
            _ => {}
        }

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => current = Some(String::new()),
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                // Tab stops in paragraph properties are also `w:tab`; only runs count.
                let ch = match e.local_name().as_ref() {
                    b"tab" if in_run => Some('\t'),
                    b"br" | b"cr" if in_run => Some('\n'),
                    b"p" => {
                        paragraphs.push(String::new());
                        None
                    }
                    _ => None,
                };
                if let (Some(ch), Some(p)) = (ch, current.as_mut()) {
                    p.push(ch);
                }
            }
            Event::Text(t) => {
                if in_text {
                    if let Some(p) = current.as_mut() {
                        p.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(paragraphs)
}
