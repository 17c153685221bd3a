//! Cursor-based page layout over `printpdf` primitives.
//!
//! [`ReportPdf`] tracks a top-down cursor in millimeters on an A4 page and
//! exposes the drawing operations the report assembler composes: shaded
//! section titles, wrapped paragraphs, bordered tables with alternating row
//! shading, embedded chart images with captions, and the suggestion blocks.
//! A page break happens automatically whenever an operation would cross the
//! bottom margin; non-cover pages get the header rule and a page-number
//! footer.
//!
//! The builtin Helvetica faces cover latin-1 only, which is why all narrative
//! text is sanitized before it reaches this module. Line wrapping uses
//! approximate per-glyph advance widths; exact metrics are not needed for a
//! report of this shape.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point, Px, Rect, Rgb,
};

use crate::error::ReportError;
use crate::types::ChartArtifact;

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN_LEFT: f64 = 10.0;
pub const MARGIN_TOP: f64 = 25.0;
pub const MARGIN_BOTTOM: f64 = 15.0;
pub const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN_LEFT;

pub const ACCENT: (u8, u8, u8) = (33, 102, 172);
pub const TEXT_DARK: (u8, u8, u8) = (40, 40, 40);
pub const TEXT_GRAY: (u8, u8, u8) = (90, 90, 90);
pub const TEXT_ALERT: (u8, u8, u8) = (255, 0, 0);
const FOOTER_GRAY: (u8, u8, u8) = (120, 120, 120);
const SUBTITLE_INK: (u8, u8, u8) = (60, 60, 120);
const TABLE_BORDER: (u8, u8, u8) = (160, 160, 160);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

fn pdf_err(e: printpdf::Error) -> ReportError {
    ReportError::RenderError(e.to_string())
}

/// A paginated report document under construction.
pub struct ReportPdf {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    font_italic: IndirectFontRef,
    /// Cursor, measured from the top of the page in millimeters.
    y: f64,
    page_no: u32,
}

impl ReportPdf {
    pub fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_err)?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err)?;
        let font_italic = doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            font,
            font_bold,
            font_italic,
            y: 40.0,
            page_no: 1,
        })
    }

    /// Starts a new page with the header rule and page-number footer.
    pub fn add_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH as f32), Mm(PAGE_HEIGHT as f32), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page_no += 1;
        self.y = MARGIN_TOP;

        self.set_outline(ACCENT);
        self.layer.set_outline_thickness(0.3);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(10.0), Mm((PAGE_HEIGHT - 20.0) as f32)), false),
                (Point::new(Mm(200.0), Mm((PAGE_HEIGHT - 20.0) as f32)), false),
            ],
            is_closed: false,
        });

        // The cover is not counted in the footer numbering.
        let label = format!("Page {}", self.page_no - 1);
        self.set_fill(FOOTER_GRAY);
        let x = MARGIN_LEFT + (CONTENT_WIDTH - text_width_mm(&label, 9.0)) / 2.0;
        self.layer
            .use_text(label, 9.0, Mm(x as f32), Mm(10.0), &self.font_italic);
    }

    /// Moves the cursor down, breaking the page if `needed` would not fit.
    pub fn ensure_space(&mut self, needed: f64) {
        if self.y + needed > PAGE_HEIGHT - MARGIN_BOTTOM {
            self.add_page();
        }
    }

    /// Moves the cursor down unconditionally.
    pub fn vertical_gap(&mut self, mm: f64) {
        self.y += mm;
    }

    pub fn set_cursor(&mut self, y_from_top: f64) {
        self.y = y_from_top;
    }

    fn set_fill(&self, (r, g, b): (u8, u8, u8)) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            None,
        )));
    }

    fn set_outline(&self, (r, g, b): (u8, u8, u8)) {
        self.layer.set_outline_color(Color::Rgb(Rgb::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            None,
        )));
    }

    fn font_ref(&self, style: FontStyle) -> IndirectFontRef {
        match style {
            FontStyle::Regular => self.font.clone(),
            FontStyle::Bold => self.font_bold.clone(),
            FontStyle::Italic => self.font_italic.clone(),
        }
    }

    /// Draws one line of text whose top edge sits at the cursor.
    fn draw_line_of_text(
        &self,
        text: &str,
        style: FontStyle,
        size: f64,
        x: f64,
        line_height: f64,
    ) {
        let baseline = PAGE_HEIGHT - self.y - line_height * 0.75;
        self.layer
            .use_text(text, size as f32, Mm(x as f32), Mm(baseline as f32), &self.font_ref(style));
    }

    /// Filled (and optionally stroked) rectangle with its top-left corner at
    /// `(x, y_from_top)`.
    fn draw_rect(&self, x: f64, y_from_top: f64, w: f64, h: f64, mode: PaintMode) {
        let rect = Rect::new(
            Mm(x as f32),
            Mm((PAGE_HEIGHT - y_from_top - h) as f32),
            Mm((x + w) as f32),
            Mm((PAGE_HEIGHT - y_from_top) as f32),
        )
        .with_mode(mode);
        self.layer.add_rect(rect);
    }

    /// Writes wrapped text across the content width, advancing the cursor.
    pub fn multi_cell(
        &mut self,
        text: &str,
        line_height: f64,
        size: f64,
        style: FontStyle,
        color: (u8, u8, u8),
        align: Align,
    ) {
        for line in wrap_text(text, CONTENT_WIDTH, size) {
            self.ensure_space(line_height);
            self.set_fill(color);
            let x = match align {
                Align::Left => MARGIN_LEFT,
                Align::Center => {
                    MARGIN_LEFT + (CONTENT_WIDTH - text_width_mm(&line, size)).max(0.0) / 2.0
                }
            };
            self.draw_line_of_text(&line, style, size, x, line_height);
            self.y += line_height;
        }
    }

    /// Shaded section heading.
    pub fn section_title(&mut self, title: &str) {
        self.ensure_space(12.0);
        self.set_fill((240, 245, 255));
        self.draw_rect(MARGIN_LEFT, self.y, CONTENT_WIDTH, 8.0, PaintMode::Fill);
        self.set_fill(ACCENT);
        self.draw_line_of_text(title, FontStyle::Bold, 14.0, MARGIN_LEFT + 1.5, 8.0);
        self.y += 12.0;
    }

    /// Unshaded section heading.
    pub fn plain_section_title(&mut self, title: &str) {
        self.ensure_space(14.0);
        self.set_fill(TEXT_DARK);
        self.draw_line_of_text(title, FontStyle::Regular, 14.0, MARGIN_LEFT, 8.0);
        self.y += 14.0;
    }

    /// Small bold subsection heading.
    pub fn subtitle(&mut self, title: &str) {
        self.ensure_space(8.0);
        self.set_fill(SUBTITLE_INK);
        self.draw_line_of_text(title, FontStyle::Bold, 11.0, MARGIN_LEFT, 6.0);
        self.y += 8.0;
    }

    /// Red placeholder notice for a missing asset.
    pub fn placeholder(&mut self, message: &str) {
        self.multi_cell(message, 6.0, 10.0, FontStyle::Regular, TEXT_ALERT, Align::Left);
    }

    /// Bordered table with a header row, fixed column widths, alternating
    /// row shading, and centered cells. `None` cells render as "N/A".
    pub fn add_table(
        &mut self,
        title: Option<&str>,
        headers: &[&str],
        widths: &[f64],
        rows: &[Vec<Option<String>>],
    ) {
        if let Some(title) = title {
            self.subtitle(title);
        }

        const HEADER_HEIGHT: f64 = 8.0;
        const ROW_HEIGHT: f64 = 7.0;

        self.ensure_space(HEADER_HEIGHT + ROW_HEIGHT);
        self.set_outline(TABLE_BORDER);
        self.layer.set_outline_thickness(0.2);
        let mut x = MARGIN_LEFT;
        for (header, &width) in headers.iter().zip(widths) {
            self.set_fill((230, 230, 230));
            self.draw_rect(x, self.y, width, HEADER_HEIGHT, PaintMode::FillStroke);
            self.set_fill(TEXT_DARK);
            let text = truncate_to_width(header, width - 2.0, 9.0);
            let tx = x + (width - text_width_mm(&text, 9.0)).max(0.0) / 2.0;
            self.draw_line_of_text(&text, FontStyle::Bold, 9.0, tx, HEADER_HEIGHT);
            x += width;
        }
        self.y += HEADER_HEIGHT;

        for (i, row) in rows.iter().enumerate() {
            self.ensure_space(ROW_HEIGHT);
            self.set_outline(TABLE_BORDER);
            self.layer.set_outline_thickness(0.2);
            let shade = if i % 2 == 0 {
                (255, 255, 255)
            } else {
                (250, 250, 250)
            };
            let mut x = MARGIN_LEFT;
            for (cell, &width) in row.iter().zip(widths) {
                self.set_fill(shade);
                self.draw_rect(x, self.y, width, ROW_HEIGHT, PaintMode::FillStroke);
                self.set_fill(TEXT_DARK);
                let value = cell.clone().unwrap_or_else(|| "N/A".to_string());
                let text = truncate_to_width(&value, width - 2.0, 8.0);
                let tx = x + (width - text_width_mm(&text, 8.0)).max(0.0) / 2.0;
                self.draw_line_of_text(&text, FontStyle::Regular, 8.0, tx, ROW_HEIGHT);
                x += width;
            }
            self.y += ROW_HEIGHT;
        }
        self.y += 6.0;
    }

    /// Embeds one chart with its caption and description. A pixel buffer
    /// that does not match its declared dimensions renders as a placeholder
    /// instead of aborting assembly.
    pub fn add_image(&mut self, artifact: &ChartArtifact, caption: &str, description: &str) {
        const IMAGE_WIDTH: f64 = 150.0;
        const IMAGE_HEIGHT: f64 = 80.0;

        let expected = artifact.width as usize * artifact.height as usize * 3;
        if artifact.width == 0 || artifact.height == 0 || artifact.rgb.len() != expected {
            self.placeholder(&format!("[Image Missing: {}]", artifact.name));
            self.y += 6.0;
            return;
        }

        self.ensure_space(IMAGE_HEIGHT + 18.0);
        // dpi maps the pixel width onto IMAGE_WIDTH mm; the aspect ratio is
        // then corrected vertically to hit IMAGE_HEIGHT exactly.
        let dpi = artifact.width as f64 * 25.4 / IMAGE_WIDTH;
        let natural_height_mm = artifact.height as f64 * 25.4 / dpi;
        let scale_y = IMAGE_HEIGHT / natural_height_mm;

        let image = Image::from(ImageXObject {
            width: Px(artifact.width as usize),
            height: Px(artifact.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: artifact.rgb.clone(),
            image_filter: None,
            smask: None,
            clipping_bbox: None,
        });
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(30.0)),
                translate_y: Some(Mm((PAGE_HEIGHT - self.y - IMAGE_HEIGHT) as f32)),
                scale_y: Some(scale_y as f32),
                dpi: Some(dpi as f32),
                ..Default::default()
            },
        );
        self.y += IMAGE_HEIGHT + 2.0;

        self.multi_cell(caption, 4.0, 8.0, FontStyle::Italic, TEXT_GRAY, Align::Center);
        self.y += 2.0;
        self.multi_cell(description, 5.0, 9.0, FontStyle::Regular, TEXT_DARK, Align::Left);
        self.y += 6.0;
    }

    /// Finalizes the document and returns its bytes.
    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        let ReportPdf { doc, layer, .. } = self;
        drop(layer);
        doc.save_to_bytes().map_err(pdf_err)
    }
}

/// Approximate advance width of a Helvetica string, in millimeters.
pub(crate) fn text_width_mm(text: &str, size: f64) -> f64 {
    let em: f64 = text.chars().map(glyph_units).sum();
    em * size * 25.4 / 72.0
}

/// Rough per-glyph advance as a fraction of the em square.
fn glyph_units(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | ' ' | '/' => 0.37,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.85,
        'A'..='Z' | '0'..='9' => 0.64,
        _ => 0.52,
    }
}

/// Greedy word wrap to a column width; words longer than the column are
/// split hard so no line ever overflows.
pub(crate) fn wrap_text(text: &str, width_mm: f64, size: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let paragraph = paragraph.trim_end();
        if paragraph.trim().is_empty() {
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width_mm(&candidate, size) <= width_mm {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(current.clone());
                current.clear();
            }
            if text_width_mm(word, size) <= width_mm {
                current = word.to_string();
            } else {
                // Hard-split an oversized word.
                let mut chunk = String::new();
                for ch in word.chars() {
                    chunk.push(ch);
                    if text_width_mm(&chunk, size) > width_mm {
                        chunk.pop();
                        lines.push(chunk.clone());
                        chunk.clear();
                        chunk.push(ch);
                    }
                }
                current = chunk;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Shortens a cell value with a trailing ".." when it would overflow.
pub(crate) fn truncate_to_width(text: &str, width_mm: f64, size: f64) -> String {
    if text_width_mm(text, size) <= width_mm {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        out.push(ch);
        if text_width_mm(&format!("{out}.."), size) > width_mm {
            out.pop();
            break;
        }
    }
    format!("{out}..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_respects_column_width() {
        let lines = wrap_text(
            "one two three four five six seven eight nine ten",
            30.0,
            10.0,
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, 10.0) <= 30.0);
        }
    }

    #[test]
    fn blank_lines_are_dropped() {
        assert!(wrap_text("\n\n  \n", 100.0, 10.0).is_empty());
        assert_eq!(wrap_text("hello\n\nworld", 100.0, 10.0).len(), 2);
    }

    #[test]
    fn oversized_words_are_hard_split() {
        let lines = wrap_text(&"x".repeat(200), 20.0, 10.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, 10.0) <= 20.0);
        }
    }

    #[test]
    fn truncation_marks_shortened_cells() {
        let long = "A very long chapter title that cannot fit";
        let short = truncate_to_width(long, 20.0, 8.0);
        assert!(short.ends_with(".."));
        assert!(text_width_mm(&short, 8.0) <= 20.0);
        assert_eq!(truncate_to_width("short", 50.0, 8.0), "short");
    }
}
