//! # Evidence Templates
//!
//! A deliberately small template language:
//!
//! - `{{path.to.value}}` substitutes a scalar from the [`Bindings`].
//! - `{{#each setores}}…{{/each}}`, and the same for `cargos` and
//!   `inventario`, repeat the body once per row. Inside a block, tokens
//!   name fields of the current row and every rendered line must be a
//!   `| … |` table row.
//!
//! Everything else that looks like a template construct (`{{else}}`,
//! partials, comments, other helpers, nested blocks) is rejected at parse
//! time. So is `{{seal.hash}}`: the hash is computed over the rendered
//! content and cannot appear inside it.
//!
//! Top-level values are folded onto one line, and cell values are also
//! pipe-escaped, so bound data cannot add structure the template lacks.
//!
//! A block tag directly followed by a newline consumes that newline, so
//! a block on its own lines leaves no blank lines in the table.

use std::fmt;
use std::str::FromStr;

use crate::binding::{escape_cell, single_line, Bindings, Row};
use crate::error::TemplateError;

/// The document's own hash. Never a valid token.
pub const RESERVED_HASH_TOKEN: &str = "seal.hash";

/// Default evidence template shipped with the crate.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/pgr_evidence.md");

// ---------------------------------------------------------------------------
// BlockName
// ---------------------------------------------------------------------------

/// The three repeatable table blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockName {
    /// Exposure per sector.
    Setores,
    /// Exposure per role.
    Cargos,
    /// Full risk inventory.
    Inventario,
}

impl BlockName {
    /// Every block.
    pub const ALL: [BlockName; 3] = [BlockName::Setores, BlockName::Cargos, BlockName::Inventario];

    /// Name used in templates and bindings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setores => "setores",
            Self::Cargos => "cargos",
            Self::Inventario => "inventario",
        }
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockName {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| TemplateError::UnknownBlock { name: s.to_string() })
    }
}

// ---------------------------------------------------------------------------
// Parsed form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Segment(Segment),
    Block { name: BlockName, body: Vec<Segment> },
}

/// A parsed, validated template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

enum Tag<'a> {
    Open(BlockName),
    Close,
    Token(&'a str),
}

fn classify(raw: &str, offset: usize) -> Result<Tag<'_>, TemplateError> {
    let tag = raw.trim();
    if tag.is_empty() {
        return Err(TemplateError::EmptyTag { offset });
    }
    let unsupported = || TemplateError::UnsupportedConstruct {
        tag: tag.to_string(),
        offset,
    };

    if let Some(rest) = tag.strip_prefix('#') {
        let mut parts = rest.split_whitespace();
        return match (parts.next(), parts.next(), parts.next()) {
            (Some("each"), Some(name), None) => Ok(Tag::Open(name.parse()?)),
            _ => Err(unsupported()),
        };
    }
    if let Some(rest) = tag.strip_prefix('/') {
        return if rest.trim() == "each" {
            Ok(Tag::Close)
        } else {
            Err(unsupported())
        };
    }
    if tag == "else" || tag.starts_with(['>', '!', '^', '{', '&', '~']) {
        return Err(unsupported());
    }
    if tag == RESERVED_HASH_TOKEN {
        return Err(TemplateError::ReservedToken {
            path: tag.to_string(),
        });
    }
    let valid = tag
        .split('.')
        .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if !valid {
        return Err(TemplateError::InvalidToken {
            path: tag.to_string(),
        });
    }
    Ok(Tag::Token(tag))
}

impl Template {
    /// Parse and validate a template.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut nodes = Vec::new();
        let mut open: Option<(BlockName, Vec<Segment>)> = None;
        let mut rest = source;
        let mut offset = 0usize;

        loop {
            let Some(start) = rest.find("{{") else {
                push_text(&mut nodes, &mut open, rest);
                break;
            };
            push_text(&mut nodes, &mut open, &rest[..start]);
            let tag_offset = offset + start;
            let after_open = &rest[start + 2..];
            let end = after_open
                .find("}}")
                .ok_or(TemplateError::Unterminated { offset: tag_offset })?;
            let raw = &after_open[..end];
            let mut consumed = start + 2 + end + 2;

            match classify(raw, tag_offset)? {
                Tag::Open(name) => {
                    if let Some((outer, _)) = &open {
                        return Err(TemplateError::NestedBlock {
                            outer: outer.to_string(),
                            inner: name.to_string(),
                        });
                    }
                    open = Some((name, Vec::new()));
                    consumed += newline_len(&rest[consumed..]);
                }
                Tag::Close => {
                    let (name, body) = open
                        .take()
                        .ok_or(TemplateError::UnexpectedClose { offset: tag_offset })?;
                    nodes.push(Node::Block { name, body });
                    consumed += newline_len(&rest[consumed..]);
                }
                Tag::Token(path) => {
                    let seg = Segment::Token(path.to_string());
                    match &mut open {
                        Some((_, body)) => body.push(seg),
                        None => nodes.push(Node::Segment(seg)),
                    }
                }
            }

            rest = &rest[consumed..];
            offset += consumed;
        }

        if let Some((name, _)) = open {
            return Err(TemplateError::UnclosedBlock {
                name: name.to_string(),
            });
        }
        Ok(Self { nodes })
    }

    /// Top-level token paths, in order of appearance.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Segment(Segment::Token(path)) => Some(path.as_str()),
            _ => None,
        })
    }

    /// Blocks used by the template, in order of appearance.
    pub fn blocks(&self) -> impl Iterator<Item = BlockName> + '_ {
        self.nodes.iter().filter_map(|n| match n {
            Node::Block { name, .. } => Some(*name),
            _ => None,
        })
    }

    /// Substitute every token and expand every block.
    pub fn render(&self, bindings: &dyn Bindings) -> Result<String, TemplateError> {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Segment(Segment::Text(text)) => out.push_str(text),
                Node::Segment(Segment::Token(path)) => {
                    let value = bindings
                        .value(path)
                        .ok_or_else(|| TemplateError::UnresolvedToken {
                            path: path.clone(),
                            block: None,
                        })?;
                    out.push_str(&single_line(&value));
                }
                Node::Block { name, body } => {
                    let rows = bindings.rows(*name).ok_or_else(|| TemplateError::MissingBlock {
                        name: name.to_string(),
                    })?;
                    for row in &rows {
                        render_row(*name, body, row, &mut out)?;
                    }
                }
            }
        }
        Ok(out)
    }
}

fn push_text(nodes: &mut Vec<Node>, open: &mut Option<(BlockName, Vec<Segment>)>, text: &str) {
    if text.is_empty() {
        return;
    }
    let seg = Segment::Text(text.to_string());
    match open {
        Some((_, body)) => body.push(seg),
        None => nodes.push(Node::Segment(seg)),
    }
}

fn newline_len(s: &str) -> usize {
    if s.starts_with("\r\n") {
        2
    } else if s.starts_with('\n') {
        1
    } else {
        0
    }
}

fn render_row(
    block: BlockName,
    body: &[Segment],
    row: &Row,
    out: &mut String,
) -> Result<(), TemplateError> {
    let mut rendered = String::new();
    for seg in body {
        match seg {
            Segment::Text(text) => rendered.push_str(text),
            Segment::Token(path) => {
                let value = row.get(path).ok_or_else(|| TemplateError::UnresolvedToken {
                    path: path.clone(),
                    block: Some(block.to_string()),
                })?;
                rendered.push_str(&escape_cell(value));
            }
        }
    }

    for line in rendered.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !is_table_row(line) {
            return Err(TemplateError::MalformedRow {
                block: block.to_string(),
                line: line.to_string(),
            });
        }
        out.push_str(line);
        out.push('\n');
    }
    Ok(())
}

fn is_table_row(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('|') && line.ends_with('|') && !line.ends_with("\\|")
}
