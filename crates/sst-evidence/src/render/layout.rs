//! # Layout Engine
//!
//! Places parsed markdown blocks on fixed-size pages with a single vertical
//! cursor. Before each line or row, if the remaining height above the
//! footer area is smaller than what the line needs, a new page starts and
//! the cursor resets to the top margin. Tables repeat their header row at
//! the top of each continuation page.
//!
//! Text width uses a fixed per-character model (`size × char_width_ratio`)
//! rather than font metrics, so the same input always wraps and paginates
//! the same way.

use serde::{Deserialize, Serialize};

use crate::render::document::{DraftDocument, Element, Page, TextStyle};
use crate::render::markdown::{self, MdBlock};

/// Page geometry and typography, in points. Defaults to A4.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Page width.
    pub page_width: f64,
    /// Page height.
    pub page_height: f64,
    /// Margin on every side.
    pub margin: f64,
    /// Height reserved above the bottom margin for the footer.
    pub footer_height: f64,
    /// Tier-1 heading size.
    pub heading1_size: f64,
    /// Tier-2 heading size.
    pub heading2_size: f64,
    /// Paragraph and quote size.
    pub body_size: f64,
    /// Table size.
    pub table_size: f64,
    /// Line height as a multiple of font size.
    pub line_spacing: f64,
    /// Average glyph width as a multiple of font size.
    pub char_width_ratio: f64,
    /// Left indent of quote text.
    pub quote_indent: f64,
    /// Horizontal padding inside table cells.
    pub cell_padding: f64,
    /// Vertical space after each block.
    pub block_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 50.0,
            footer_height: 36.0,
            heading1_size: 18.0,
            heading2_size: 14.0,
            body_size: 10.0,
            table_size: 9.0,
            line_spacing: 1.4,
            char_width_ratio: 0.5,
            quote_indent: 14.0,
            cell_padding: 3.0,
            block_gap: 6.0,
        }
    }
}

impl LayoutConfig {
    fn usable_width(&self) -> f64 {
        (self.page_width - 2.0 * self.margin).max(1.0)
    }

    fn content_bottom(&self) -> f64 {
        self.page_height - self.margin - self.footer_height
    }

    fn line_height(&self, size: f64) -> f64 {
        size * self.line_spacing
    }

    fn chars_per_line(&self, width: f64, size: f64) -> usize {
        let glyph = (size * self.char_width_ratio).max(0.1);
        ((width / glyph).floor() as usize).max(1)
    }
}

/// Greedy word wrap to at most `max_chars` characters per line. Words
/// longer than a line are split.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        while chars.len() > max_chars {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = chars.split_off(max_chars);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        let len = chars.len();
        if current_len > 0 && current_len + 1 + len > max_chars {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(chars);
        current_len += len;
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

struct Cursor<'c> {
    config: &'c LayoutConfig,
    pages: Vec<Page>,
    elements: Vec<Element>,
    y: f64,
}

impl<'c> Cursor<'c> {
    fn new(config: &'c LayoutConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            elements: Vec::new(),
            y: config.margin,
        }
    }

    fn remaining(&self) -> f64 {
        self.config.content_bottom() - self.y
    }

    /// Start a new page if `height` does not fit. An empty page always
    /// accepts the element.
    fn ensure(&mut self, height: f64) -> bool {
        if self.remaining() < height && !self.elements.is_empty() {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn new_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            elements: std::mem::take(&mut self.elements),
        });
        self.y = self.config.margin;
    }

    fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    fn gap(&mut self) {
        self.y += self.config.block_gap;
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.elements.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

/// The layout engine.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    config: LayoutConfig,
}

impl Layout {
    /// Engine with the given geometry.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Active geometry.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Parse and lay out markdown.
    pub fn render_markdown(&self, markdown: &str) -> DraftDocument {
        self.render(&markdown::parse(markdown))
    }

    /// Lay out parsed blocks. Always yields at least one page.
    pub fn render(&self, blocks: &[MdBlock]) -> DraftDocument {
        let mut cursor = Cursor::new(&self.config);
        for block in blocks {
            match block {
                MdBlock::Heading { level, text } => self.heading(&mut cursor, *level, text),
                MdBlock::Paragraph { text } => self.paragraph(&mut cursor, text),
                MdBlock::Quote { text } => self.quote(&mut cursor, text),
                MdBlock::Rule => self.rule(&mut cursor),
                MdBlock::Table { header, rows } => self.table(&mut cursor, header, rows),
            }
        }
        let footer_y = self.config.page_height - self.config.margin - self.config.footer_height / 2.0;
        let pages = cursor.finish();
        tracing::debug!(pages = pages.len(), "layout complete");
        DraftDocument::new(pages, footer_y)
    }

    fn heading(&self, cursor: &mut Cursor<'_>, level: u8, text: &str) {
        let (size, style) = if level == 1 {
            (self.config.heading1_size, TextStyle::Heading1)
        } else {
            (self.config.heading2_size, TextStyle::Heading2)
        };
        let lh = self.config.line_height(size);
        let lines = wrap(text, self.config.chars_per_line(self.config.usable_width(), size));
        // Keep the heading together with the line that follows it.
        let body_lh = self.config.line_height(self.config.body_size);
        cursor.ensure(lh * lines.len() as f64 + body_lh);
        for line in lines {
            cursor.ensure(lh);
            cursor.push(Element::Text {
                x: self.config.margin,
                y: cursor.y,
                size,
                style,
                text: line,
            });
            cursor.y += lh;
        }
        cursor.gap();
    }

    fn paragraph(&self, cursor: &mut Cursor<'_>, text: &str) {
        let size = self.config.body_size;
        let lh = self.config.line_height(size);
        for line in wrap(text, self.config.chars_per_line(self.config.usable_width(), size)) {
            cursor.ensure(lh);
            cursor.push(Element::Text {
                x: self.config.margin,
                y: cursor.y,
                size,
                style: TextStyle::Body,
                text: line,
            });
            cursor.y += lh;
        }
        cursor.gap();
    }

    fn quote(&self, cursor: &mut Cursor<'_>, text: &str) {
        let size = self.config.body_size;
        let lh = self.config.line_height(size);
        let bar_x = self.config.margin + self.config.quote_indent / 3.0;
        let text_x = self.config.margin + self.config.quote_indent;
        let width = self.config.usable_width() - self.config.quote_indent;

        let mut top = cursor.y;
        for line in wrap(text, self.config.chars_per_line(width, size)) {
            if cursor.remaining() < lh && !cursor.elements.is_empty() {
                if cursor.y > top {
                    cursor.push(Element::QuoteBar {
                        x: bar_x,
                        top,
                        bottom: cursor.y,
                    });
                }
                cursor.new_page();
                top = cursor.y;
            }
            cursor.push(Element::Text {
                x: text_x,
                y: cursor.y,
                size,
                style: TextStyle::Quote,
                text: line,
            });
            cursor.y += lh;
        }
        if cursor.y > top {
            cursor.push(Element::QuoteBar {
                x: bar_x,
                top,
                bottom: cursor.y,
            });
        }
        cursor.gap();
    }

    fn rule(&self, cursor: &mut Cursor<'_>) {
        let gap = self.config.block_gap;
        cursor.ensure(2.0 * gap);
        cursor.push(Element::Rule {
            x1: self.config.margin,
            x2: self.config.page_width - self.config.margin,
            y: cursor.y + gap,
        });
        cursor.y += 2.0 * gap;
    }

    fn table(&self, cursor: &mut Cursor<'_>, header: &[String], rows: &[Vec<String>]) {
        let columns = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0)
            .max(1);
        let size = self.config.table_size;
        let lh = self.config.line_height(size);
        let col_width = self.config.usable_width() / columns as f64;
        let max_chars = self
            .config
            .chars_per_line((col_width - 2.0 * self.config.cell_padding).max(1.0), size);
        let grid = TableGrid {
            x: self.config.margin,
            columns,
            max_chars,
            line_height: lh,
            padding: self.config.cell_padding,
            size,
            widths: vec![col_width; columns],
        };

        let (header_cells, header_height) = grid.shape(header);

        // Header plus the first body row must fit together.
        let first_height = rows.first().map(|r| grid.shape(r.as_slice()).1).unwrap_or(0.0);
        cursor.ensure(header_height + first_height);
        grid.place(cursor, header_cells.clone(), header_height, true);

        for row in rows {
            let (cells, height) = grid.shape(row.as_slice());
            if cursor.ensure(height) {
                grid.place(cursor, header_cells.clone(), header_height, true);
            }
            grid.place(cursor, cells, height, false);
        }
        cursor.gap();
    }
}

struct TableGrid {
    x: f64,
    columns: usize,
    max_chars: usize,
    line_height: f64,
    padding: f64,
    size: f64,
    widths: Vec<f64>,
}

impl TableGrid {
    fn shape(&self, cells: &[String]) -> (Vec<Vec<String>>, f64) {
        let wrapped: Vec<Vec<String>> = (0..self.columns)
            .map(|i| wrap(cells.get(i).map(String::as_str).unwrap_or(""), self.max_chars))
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        (wrapped, lines as f64 * self.line_height + 2.0 * self.padding)
    }

    fn place(&self, cursor: &mut Cursor<'_>, cells: Vec<Vec<String>>, height: f64, header: bool) {
        cursor.push(Element::TableRow {
            x: self.x,
            y: cursor.y,
            height,
            size: self.size,
            header,
            widths: self.widths.clone(),
            cells,
        });
        cursor.y += height;
    }
}
