//! PDF text extraction and section segmentation.
//!
//! Extraction is delegated to `pdf-extract`. Segmentation scans the text line
//! by line: a line whose trimmed content equals one of [`SECTION_HEADERS`]
//! (ignoring case) opens a new section. Text before the first header is kept
//! as a `Preamble` section when it is not blank.

use serde::Serialize;

use crate::error::IngestError;

pub const MIME_PDF: &str = "application/pdf";

/// Recognized section headers, in canonical spelling.
pub const SECTION_HEADERS: &[&str] = &[
    "Abstract",
    "Introduction",
    "Methodology",
    "Conclusion",
    "References",
];

pub const PREAMBLE: &str = "Preamble";

/// A named slice of a document's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub content: String,
}

pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, IngestError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| IngestError::Pdf(e.to_string()))
}

fn match_header(line: &str) -> Option<&'static str> {
    let trimmed = line.trim();
    SECTION_HEADERS
        .iter()
        .copied()
        .find(|h| h.eq_ignore_ascii_case(trimmed))
}

/// Split document text into sections by header lines.
pub fn segment_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = PREAMBLE.to_string();
    let mut buf: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(header) = match_header(line) {
            push_section(&mut sections, &current, &buf);
            current = header.to_string();
            buf.clear();
        } else {
            buf.push(line);
        }
    }
    push_section(&mut sections, &current, &buf);

    sections
}

fn push_section(sections: &mut Vec<Section>, name: &str, lines: &[&str]) {
    let content = lines.join("\n").trim().to_string();
    if name == PREAMBLE && content.is_empty() {
        return;
    }
    sections.push(Section {
        name: name.to_string(),
        content,
    });
}
