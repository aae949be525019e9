//! # Markdown Subset
//!
//! Line-oriented parser for the grammar sealed evidence uses:
//!
//! | Line | Block |
//! |------|-------|
//! | `# text` | heading, tier 1 |
//! | `## text` (or deeper) | heading, tier 2 |
//! | `---` | horizontal rule |
//! | `> text` | blockquote; consecutive lines merge |
//! | `\| a \| b \|` | table row; the `---` delimiter row is discarded |
//! | anything else | paragraph; consecutive lines merge |
//!
//! Blank lines end the current paragraph, quote, or table.

use serde::{Deserialize, Serialize};

/// A parsed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MdBlock {
    /// `#` or `##` heading.
    Heading {
        /// 1 or 2.
        level: u8,
        /// Heading text.
        text: String,
    },
    /// `---`.
    Rule,
    /// `>` quote.
    Quote {
        /// Quote text, lines joined by spaces.
        text: String,
    },
    /// Pipe table.
    Table {
        /// First row.
        header: Vec<String>,
        /// Remaining rows.
        rows: Vec<Vec<String>>,
    },
    /// Plain text.
    Paragraph {
        /// Paragraph text, lines joined by spaces.
        text: String,
    },
}

#[derive(Default)]
struct Pending {
    paragraph: Vec<String>,
    quote: Vec<String>,
    table: Vec<Vec<String>>,
}

impl Pending {
    fn flush(&mut self, out: &mut Vec<MdBlock>) {
        if !self.paragraph.is_empty() {
            out.push(MdBlock::Paragraph {
                text: std::mem::take(&mut self.paragraph).join(" "),
            });
        }
        if !self.quote.is_empty() {
            out.push(MdBlock::Quote {
                text: std::mem::take(&mut self.quote).join(" "),
            });
        }
        if !self.table.is_empty() {
            let mut rows = std::mem::take(&mut self.table).into_iter();
            let header = rows.next().unwrap_or_default();
            out.push(MdBlock::Table {
                header,
                rows: rows.collect(),
            });
        }
    }
}

/// Parse markdown into blocks.
pub fn parse(markdown: &str) -> Vec<MdBlock> {
    let mut out = Vec::new();
    let mut pending = Pending::default();

    for raw in markdown.lines() {
        let line = raw.trim();

        if line.is_empty() {
            pending.flush(&mut out);
        } else if let Some((level, text)) = heading(line) {
            pending.flush(&mut out);
            out.push(MdBlock::Heading {
                level,
                text: text.to_string(),
            });
        } else if is_rule(line) {
            pending.flush(&mut out);
            out.push(MdBlock::Rule);
        } else if let Some(text) = line.strip_prefix('>') {
            if !pending.paragraph.is_empty() || !pending.table.is_empty() {
                pending.flush(&mut out);
            }
            pending.quote.push(text.trim().to_string());
        } else if line.starts_with('|') {
            if !pending.paragraph.is_empty() || !pending.quote.is_empty() {
                pending.flush(&mut out);
            }
            let cells = split_cells(line);
            if !is_delimiter(&cells) {
                pending.table.push(cells);
            }
        } else {
            if !pending.quote.is_empty() || !pending.table.is_empty() {
                pending.flush(&mut out);
            }
            pending.paragraph.push(line.to_string());
        }
    }
    pending.flush(&mut out);
    out
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let level = if hashes == 1 { 1 } else { 2 };
    Some((level, rest.trim()))
}

fn is_rule(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

/// Split a pipe table row into unescaped, trimmed cells.
pub fn split_cells(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = match inner.strip_suffix('|') {
        Some(s) if !s.ends_with('\\') => s,
        _ => inner,
    };

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                cell.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            c => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

fn is_delimiter(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| {
            let c = c.trim();
            c.contains('-') && c.chars().all(|ch| ch == '-' || ch == ':')
        })
}
