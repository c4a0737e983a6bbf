use std::collections::HashMap;
use std::io::Write;
use log::debug;
use crate::core::canvas::Canvas;
use crate::core::document::Document;
use crate::core::font::Font;
use crate::core::image::Image;
use crate::core::page::Page;
use crate::core::types::Rect;
use crate::error::{Error, Result};

/// Helvetica ascender in 1000 units
const HELVETICA_ASCENT: f64 = 718.0;

/// Average Helvetica advance as a fraction of the font size
const HELVETICA_AVG_WIDTH: f64 = 0.5;

/// Dash patterns understood by [`Canvas::set_line_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineType {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineType {
    /// Unknown tokens draw solid lines
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "dashed" => LineType::Dashed,
            "dotted" => LineType::Dotted,
            "normal" | "straight" | "solid" | "" => LineType::Solid,
            other => {
                debug!("Unknown line type {:?}, drawing solid lines", other);
                LineType::Solid
            }
        }
    }

    fn dash_operator(self) -> &'static str {
        match self {
            LineType::Solid => "[] 0 d",
            LineType::Dashed => "[5] 2 d",
            LineType::Dotted => "[2 3] 11 d",
        }
    }
}

/// [`Canvas`] producing a PDF document.
///
/// Pages are buffered until [`Canvas::serialize_to`]. Families that were
/// never registered fall back to the built-in Helvetica.
pub struct PdfCanvas {
    doc: Document,
    page_size: Rect,
    current: Option<Page>,
    families: HashMap<String, usize>,
    images: HashMap<String, usize>,
    font: Option<usize>,
    size: f64,
    x: f64,
    y: f64,
    line_width: f64,
    line_type: LineType,
}

impl Default for PdfCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfCanvas {
    pub fn new() -> Self {
        PdfCanvas {
            doc: Document::new(),
            page_size: Rect::a4(),
            current: None,
            families: HashMap::new(),
            images: HashMap::new(),
            font: None,
            size: 12.0,
            x: 0.0,
            y: 0.0,
            line_width: 1.0,
            line_type: LineType::Solid,
        }
    }

    /// Pages added so far, including the one being drawn
    pub fn page_count(&self) -> usize {
        self.doc.page_count() + usize::from(self.current.is_some())
    }

    /// Flip a top-left Y into PDF user space
    fn pdf_y(&self, y: f64) -> f64 {
        self.page_size.h - y
    }

    fn ascent(&self) -> f64 {
        let ascent = match self.font {
            Some(i) => self.doc.fonts[i].ascent() as f64,
            None => HELVETICA_ASCENT,
        };
        ascent * self.size / 1000.0
    }

    fn flush_page(&mut self) {
        if let Some(page) = self.current.take() {
            self.doc.add_page(page);
        }
    }

    fn draw_at(&mut self, text: &str, baseline: f64) {
        let x = self.x;
        let y = self.pdf_y(baseline);
        let size = self.size;
        let Some(page) = self.current.as_mut() else {
            debug!("Text drawn before the first page: {:?}", text);
            return;
        };
        match self.font {
            Some(i) => {
                let glyphs = self.doc.fonts[i].shape_text(text);
                page.text_with_font(&glyphs, i, x, y, size);
            }
            None => {
                page.text(text, x, y, size);
            }
        }
    }
}

impl Canvas for PdfCanvas {
    fn start(&mut self, page_size: Rect) {
        self.page_size = page_size;
    }

    fn add_page(&mut self) {
        self.flush_page();
        let mut page = Page::new(self.page_size.w, self.page_size.h);
        // every content stream starts from the default graphics state
        page.set_line_width(self.line_width).set_dash(self.line_type.dash_operator());
        self.current = Some(page);
    }

    fn close(&mut self) {
        *self = PdfCanvas::new();
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
        if let Some(page) = self.current.as_mut() {
            page.set_line_width(width);
        }
    }

    fn set_line_type(&mut self, line_type: &str) {
        self.line_type = LineType::parse(line_type);
        if let Some(page) = self.current.as_mut() {
            page.set_dash(self.line_type.dash_operator());
        }
    }

    fn set_font(&mut self, family: &str, size: f64) {
        self.font = self.families.get(family).copied();
        if self.font.is_none() {
            debug!("Font family {:?} not registered, using Helvetica", family);
        }
        self.size = size;
    }

    fn register_font(&mut self, family: &str, path: &str) -> Result<()> {
        let font = Font::from_file(path, family)?;
        let index = self.doc.add_font(font);
        self.families.insert(family.to_string(), index);
        Ok(())
    }

    fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    fn set_y(&mut self, y: f64) {
        self.y = y;
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let (y1, y2) = (self.pdf_y(y1), self.pdf_y(y2));
        if let Some(page) = self.current.as_mut() {
            page.draw_line(x1, y1, x2, y2);
        }
    }

    fn text(&mut self, text: &str) {
        self.draw_at(text, self.y);
    }

    fn cell(&mut self, text: &str) {
        let baseline = self.y + self.ascent();
        self.draw_at(text, baseline);
    }

    fn measure_text_width(&self, text: &str) -> f64 {
        match self.font {
            Some(i) => self.doc.fonts[i].measure_text(text, self.size),
            None => text.chars().count() as f64 * self.size * HELVETICA_AVG_WIDTH,
        }
    }

    fn image(&mut self, path: &str, x: f64, y: f64, size: Rect) -> Result<()> {
        if self.current.is_none() {
            return Err(Error::Canvas(format!("image {} drawn before the first page", path)));
        }
        let index = match self.images.get(path) {
            Some(index) => *index,
            None => {
                let index = self.doc.add_image(Image::from_file(path)?);
                self.images.insert(path.to_string(), index);
                index
            }
        };
        let bottom = self.pdf_y(y + size.h);
        if let Some(page) = self.current.as_mut() {
            page.draw_image(index, x, bottom, size.w, size.h);
        }
        Ok(())
    }

    fn serialize_to(&mut self, sink: &mut dyn Write) -> Result<()> {
        self.flush_page();
        self.doc.write_to(sink)?;
        Ok(())
    }
}
