//! Page layout and PDF serialisation of report elements.
//!
//! A single-column flow layout on A4: elements are stacked top to bottom,
//! text is word-wrapped with the Helvetica metrics, and a new page starts
//! whenever the next line or table row would cross the bottom margin.
//!
//! Each page becomes one uncompressed content stream. Fonts are the
//! non-embedded base-14 Helvetica faces, so the output stays small and
//! byte-for-byte reproducible.

use super::metrics::{byte_width, encode_win_ansi, encoded_width, Font};
use super::ReportElement;
use crate::error::SynthError;
use chrono::{DateTime, Local};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN_TOP: f32 = 72.0;
pub const MARGIN_BOTTOM: f32 = 18.0;
pub const MARGIN_LEFT: f32 = 72.0;
pub const MARGIN_RIGHT: f32 = 72.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
const TOP_Y: f32 = PAGE_HEIGHT - MARGIN_TOP;
const USABLE_HEIGHT: f32 = TOP_Y - MARGIN_BOTTOM;

type Rgb = (f32, f32, f32);

const BLACK: Rgb = (0.0, 0.0, 0.0);
const DARK_BLUE: Rgb = (0.0, 0.0, 0.545);
const DARK_GREEN: Rgb = (0.0, 0.392, 0.0);
const GREY: Rgb = (0.5, 0.5, 0.5);
const RULE_GREY: Rgb = (0.75, 0.75, 0.75);

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    font: Font,
    size: f32,
    leading: f32,
    color: Rgb,
    centered: bool,
    space_before: f32,
    space_after: f32,
}

const TITLE: TextStyle = TextStyle {
    font: Font::Bold,
    size: 24.0,
    leading: 29.0,
    color: DARK_BLUE,
    centered: true,
    space_before: 0.0,
    space_after: 30.0,
};

const SUBTITLE: TextStyle = TextStyle {
    font: Font::Bold,
    size: 16.0,
    leading: 20.0,
    color: DARK_BLUE,
    centered: false,
    space_before: 12.0,
    space_after: 12.0,
};

const HEADING: TextStyle = TextStyle {
    font: Font::Bold,
    size: 14.0,
    leading: 17.0,
    color: DARK_GREEN,
    centered: false,
    space_before: 16.0,
    space_after: 8.0,
};

const BODY: TextStyle = TextStyle {
    font: Font::Regular,
    size: 11.0,
    leading: 14.0,
    color: BLACK,
    centered: false,
    space_before: 0.0,
    space_after: 6.0,
};

const EMPHASIZED: TextStyle = TextStyle {
    font: Font::Bold,
    ..BODY
};

const FOOTER: TextStyle = TextStyle {
    font: Font::Regular,
    size: 10.0,
    leading: 12.0,
    color: GREY,
    centered: true,
    space_before: 0.0,
    space_after: 0.0,
};

const TABLE_FONT_SIZE: f32 = 9.0;
const TABLE_LEADING: f32 = 11.0;
const TABLE_PADDING: f32 = 4.0;
const TABLE_SPACE_AFTER: f32 = 10.0;
const SEPARATOR_SPACE: f32 = 12.0;

/// Lay out `elements` and serialise them as a PDF document.
pub fn write_pdf(
    elements: &[ReportElement],
    title: &str,
    created: &DateTime<Local>,
) -> Result<Vec<u8>, SynthError> {
    let mut layout = PageLayout::new();
    for element in elements {
        layout.place(element);
    }
    let pages = layout.finish();
    debug!("Report layout: {} pages", pages.len());

    serialise(pages, title, created)
}

// ── Layout ───────────────────────────────────────────────────────────────

struct PageLayout {
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
}

impl PageLayout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: TOP_Y,
        }
    }

    fn place(&mut self, element: &ReportElement) {
        match element {
            ReportElement::Title(t) => self.text(t, &TITLE),
            ReportElement::Subtitle(t) => self.text(t, &SUBTITLE),
            ReportElement::Heading(t) => self.text(t, &HEADING),
            ReportElement::Paragraph(t) => self.text(t, &BODY),
            ReportElement::Emphasized(t) => self.text(t, &EMPHASIZED),
            ReportElement::Footer(t) => self.text(t, &FOOTER),
            ReportElement::Table(rows) => self.table(rows),
            ReportElement::Spacer(h) => self.spacer(*h),
            ReportElement::Separator => self.separator(),
            ReportElement::PageBreak => {
                if !self.ops.is_empty() {
                    self.new_page();
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(std::mem::take(&mut self.ops));
        }
        self.pages
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = TOP_Y;
    }

    fn at_page_top(&self) -> bool {
        self.ops.is_empty()
    }

    /// Start a new page unless `height` still fits. Returns `true` on a break.
    fn ensure(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN_BOTTOM && !self.at_page_top() {
            self.new_page();
            return true;
        }
        false
    }

    /// Flow space; dropped at the top of a page.
    fn gap(&mut self, height: f32) {
        if height <= 0.0 || self.at_page_top() {
            return;
        }
        if self.y - height < MARGIN_BOTTOM {
            self.new_page();
        } else {
            self.y -= height;
        }
    }

    /// Explicit space; kept even at the top of a page.
    fn spacer(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM {
            self.new_page();
        } else {
            self.y -= height;
        }
    }

    fn text(&mut self, text: &str, style: &TextStyle) {
        let lines = wrap(text, style.font, style.size, CONTENT_WIDTH);
        if lines.is_empty() {
            return;
        }

        self.gap(style.space_before);
        for line in lines {
            self.ensure(style.leading);
            let x = if style.centered {
                MARGIN_LEFT + (CONTENT_WIDTH - encoded_width(&line, style.font, style.size)) / 2.0
            } else {
                MARGIN_LEFT
            };
            let baseline = self.y - style.size;
            self.draw_text(x, baseline, line, style.font, style.size, style.color);
            self.y -= style.leading;
        }
        self.gap(style.space_after);
    }

    fn separator(&mut self) {
        self.gap(SEPARATOR_SPACE);
        self.ensure(1.0);
        let y = self.y;
        self.draw_rule(MARGIN_LEFT, PAGE_WIDTH - MARGIN_RIGHT, y, 1.0, GREY);
        self.gap(SEPARATOR_SPACE);
    }

    /// Draw a table as bordered row bands.
    ///
    /// A row that fits on one page is kept together. A taller row is split
    /// between line bands, closing the page with a rule and reopening the
    /// row on the next one.
    fn table(&mut self, rows: &[Vec<String>]) {
        let columns = rows.first().map(Vec::len).unwrap_or(0).max(1);
        let col_width = CONTENT_WIDTH / columns as f32;
        let cell_width = col_width - 2.0 * TABLE_PADDING;
        let left = MARGIN_LEFT;
        let right = MARGIN_LEFT + CONTENT_WIDTH;

        self.gap(BODY.space_after);
        let mut first_row_on_page = true;

        for (r, row) in rows.iter().enumerate() {
            let font = if r == 0 { Font::Bold } else { Font::Regular };
            let cells: Vec<Vec<Vec<u8>>> = row
                .iter()
                .map(|cell| wrap(cell, font, TABLE_FONT_SIZE, cell_width))
                .collect();
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
            let height = line_count as f32 * TABLE_LEADING + 2.0 * TABLE_PADDING;

            if self.ensure(height.min(USABLE_HEIGHT)) {
                first_row_on_page = true;
            }
            if first_row_on_page {
                let y = self.y;
                self.draw_rule(left, right, y, 0.5, RULE_GREY);
                first_row_on_page = false;
            }
            self.y -= TABLE_PADDING;

            for i in 0..line_count {
                let band = if i + 1 == line_count {
                    TABLE_LEADING + TABLE_PADDING
                } else {
                    TABLE_LEADING
                };
                if self.y - band < MARGIN_BOTTOM {
                    let y = self.y;
                    self.draw_rule(left, right, y, 0.5, RULE_GREY);
                    self.new_page();
                    let y = self.y;
                    self.draw_rule(left, right, y, 0.5, RULE_GREY);
                    self.y -= TABLE_PADDING;
                }

                let baseline = self.y - TABLE_FONT_SIZE;
                for (c, lines) in cells.iter().enumerate() {
                    if let Some(line) = lines.get(i) {
                        let x = left + c as f32 * col_width + TABLE_PADDING;
                        self.draw_text(x, baseline, line.clone(), font, TABLE_FONT_SIZE, BLACK);
                    }
                }
                self.y -= TABLE_LEADING;
            }

            self.y -= TABLE_PADDING;
            let y = self.y;
            self.draw_rule(left, right, y, 0.5, RULE_GREY);
        }

        self.gap(TABLE_SPACE_AFTER);
    }

    fn draw_text(&mut self, x: f32, y: f32, text: Vec<u8>, font: Font, size: f32, color: Rgb) {
        let (r, g, b) = color;
        self.ops.extend([
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource_name().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn draw_rule(&mut self, x1: f32, x2: f32, y: f32, width: f32, color: Rgb) {
        let (r, g, b) = color;
        self.ops.extend([
            Operation::new("w", vec![width.into()]),
            Operation::new("RG", vec![r.into(), g.into(), b.into()]),
            Operation::new("m", vec![x1.into(), y.into()]),
            Operation::new("l", vec![x2.into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
    }
}

/// Greedy word wrap over WinAnsi-encoded text.
///
/// Every source line starts a new output line. Words wider than `max_width`
/// are broken at the last byte that fits.
fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();

    for source_line in text.lines() {
        let encoded = encode_win_ansi(source_line);
        let mut current: Vec<u8> = Vec::new();

        for word in encoded.split(|&b| b == b' ').filter(|w| !w.is_empty()) {
            let sep = usize::from(!current.is_empty());
            let candidate_width = encoded_width(&current, font, size)
                + sep as f32 * byte_width(b' ', font) as f32 * size / 1000.0
                + encoded_width(word, font, size);
            if candidate_width <= max_width {
                if sep == 1 {
                    current.push(b' ');
                }
                current.extend_from_slice(word);
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut rest = word;
            while encoded_width(rest, font, size) > max_width {
                let cut = fitting_prefix(rest, font, size, max_width);
                lines.push(rest[..cut].to_vec());
                rest = &rest[cut..];
            }
            current.extend_from_slice(rest);
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Length of the longest prefix of `bytes` that fits in `max_width`; at least 1.
fn fitting_prefix(bytes: &[u8], font: Font, size: f32, max_width: f32) -> usize {
    let mut width = 0.0;
    for (i, &b) in bytes.iter().enumerate() {
        width += byte_width(b, font) as f32 * size / 1000.0;
        if width > max_width {
            return i.max(1);
        }
    }
    bytes.len()
}

// ── Serialisation ────────────────────────────────────────────────────────

fn render_error(e: impl std::fmt::Display) -> SynthError {
    SynthError::Render {
        detail: e.to_string(),
    }
}

fn font_dictionary(font: Font) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn serialise(
    pages: Vec<Vec<Operation>>,
    title: &str,
    created: &DateTime<Local>,
) -> Result<Vec<u8>, SynthError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(Font::Regular));
    let bold_id = doc.add_object(font_dictionary(Font::Bold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource_name() => regular_id,
            Font::Bold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let stream = Stream::new(dictionary! {}, content.encode().map_err(render_error)?);
        let content_id = doc.add_object(stream);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(title)),
        "Producer" => Object::string_literal(concat!("edgequake-pdfsynth ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(created.format("D:%Y%m%d%H%M%S").to_string()),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).map_err(render_error)?;
    Ok(buf)
}
