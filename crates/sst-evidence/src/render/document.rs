//! # Paginated Documents
//!
//! Two-phase protocol:
//!
//! 1. Layout produces a [`DraftDocument`]: positioned content, no footers,
//!    page total unknown while pages are still being added.
//! 2. [`DraftDocument::finalize`] consumes the draft, counts the pages, and
//!    stamps every footer with the integrity seal and `Página X de N`.
//!
//! A [`SealedDocument`] can only be obtained through `finalize`, so a
//! document with missing or stale footers cannot exist.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvidenceError;

/// Footer seal line for a content hash.
pub fn seal_line(hash: &str) -> String {
    format!("Selo de integridade SHA-256: {hash}")
}

/// Footer pagination line.
pub fn pagination_line(page: usize, total: usize) -> String {
    format!("Página {page} de {total}")
}

// ---------------------------------------------------------------------------
// Page model
// ---------------------------------------------------------------------------

/// Text style tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    /// `#` heading.
    Heading1,
    /// `##` heading.
    Heading2,
    /// Paragraph text.
    Body,
    /// Blockquote text.
    Quote,
}

/// A positioned page element. Coordinates are points from the top-left
/// corner; `y` is the top of the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    /// One wrapped line of text.
    Text {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Font size.
        size: f64,
        /// Style tier.
        style: TextStyle,
        /// Line content.
        text: String,
    },
    /// Horizontal rule.
    Rule {
        /// Start.
        x1: f64,
        /// End.
        x2: f64,
        /// Vertical position.
        y: f64,
    },
    /// Left bar of a blockquote segment.
    QuoteBar {
        /// Horizontal position.
        x: f64,
        /// Segment top.
        top: f64,
        /// Segment bottom.
        bottom: f64,
    },
    /// One table row; each cell holds its wrapped lines.
    TableRow {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Row height.
        height: f64,
        /// Font size.
        size: f64,
        /// Header row.
        header: bool,
        /// Column widths.
        widths: Vec<f64>,
        /// Cell lines.
        cells: Vec<Vec<String>>,
    },
}

/// A laid-out page without footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    /// Elements in drawing order.
    pub elements: Vec<Element>,
}

/// Result of layout. Footers are not stamped yet.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftDocument {
    pages: Vec<Page>,
    footer_y: f64,
}

impl DraftDocument {
    pub(crate) fn new(pages: Vec<Page>, footer_y: f64) -> Self {
        Self { pages, footer_y }
    }

    /// Pages laid out so far.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Stamp every footer with the seal and final pagination.
    pub fn finalize(self, content_hash: &str) -> SealedDocument {
        let total = self.pages.len();
        let footer_y = self.footer_y;
        let seal = seal_line(content_hash);
        let pages = self
            .pages
            .into_iter()
            .map(|page| SealedPage {
                footer: Footer {
                    y: footer_y,
                    seal: seal.clone(),
                    pagination: pagination_line(page.number, total),
                },
                number: page.number,
                elements: page.elements,
            })
            .collect();
        SealedDocument {
            content_hash: content_hash.to_string(),
            page_count: total,
            pages,
        }
    }
}

/// Page footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    /// Vertical position.
    pub y: f64,
    /// `Selo de integridade SHA-256: <hash>`.
    pub seal: String,
    /// `Página X de N`.
    pub pagination: String,
}

/// A finalized page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedPage {
    /// 1-based page number.
    pub number: usize,
    /// Elements in drawing order.
    pub elements: Vec<Element>,
    /// Stamped footer.
    pub footer: Footer,
}

/// A finalized, exportable document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedDocument {
    content_hash: String,
    page_count: usize,
    pages: Vec<SealedPage>,
}

impl SealedDocument {
    /// Content hash printed in every footer.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Total pages.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Finalized pages.
    pub fn pages(&self) -> &[SealedPage] {
        &self.pages
    }

    /// Deterministic plain-text dump. Pages are separated by a form feed.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                out.push('\u{c}');
                out.push('\n');
            }
            for element in &page.elements {
                match element {
                    Element::Text { style, text, .. } => {
                        let prefix = match style {
                            TextStyle::Heading1 => "# ",
                            TextStyle::Heading2 => "## ",
                            TextStyle::Quote => "> ",
                            TextStyle::Body => "",
                        };
                        out.push_str(prefix);
                        out.push_str(text);
                        out.push('\n');
                    }
                    Element::Rule { .. } => out.push_str("---\n"),
                    Element::QuoteBar { .. } => {}
                    Element::TableRow { cells, .. } => {
                        let joined: Vec<String> = cells.iter().map(|lines| lines.join(" ")).collect();
                        out.push_str("| ");
                        out.push_str(&joined.join(" | "));
                        out.push_str(" |\n");
                    }
                }
            }
            out.push('\n');
            out.push_str(&page.footer.seal);
            out.push('\n');
            out.push_str(&page.footer.pagination);
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Export formats
// ---------------------------------------------------------------------------

/// Encoding of an exported document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// [`SealedDocument::to_text`].
    #[default]
    Text,
    /// The serialized page model.
    Json,
}

impl ExportFormat {
    /// Format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Encode a sealed document.
    pub fn encode(&self, document: &SealedDocument) -> Result<Vec<u8>, EvidenceError> {
        match self {
            Self::Text => Ok(document.to_text().into_bytes()),
            Self::Json => serde_json::to_vec_pretty(document)
                .map_err(|e| EvidenceError::Encoding(e.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = EvidenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(EvidenceError::Encoding(format!("unknown export format '{other}'"))),
        }
    }
}
