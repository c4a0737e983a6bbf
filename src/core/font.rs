use std::cell::RefCell;
use std::collections::HashMap;
use owned_ttf_parser::{AsFaceRef, GlyphId, OwnedFace};
use crate::error::{Error, Result};

/// A shaped glyph. Advances are in text space units (1/1000 em) so one
/// shaping result serves every font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedGlyph {
    pub glyph_id: u16,
    /// Advance chosen by the shaper, kerning included
    pub advance: i64,
    /// Nominal advance, as published in the font's `/W` array
    pub width: i64,
}

impl ShapedGlyph {
    /// TJ adjustment that moves the next glyph from the nominal to the shaped position
    pub fn kerning(&self) -> i64 {
        self.width - self.advance
    }
}

/// A TrueType font registered under a family name
pub struct Font {
    face: OwnedFace,
    name: String,
    units_per_em: u16,
    shape_cache: RefCell<HashMap<String, Vec<ShapedGlyph>>>,
}

impl Font {
    pub fn from_file(path: &str, name: impl Into<String>) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| Error::Font(format!("cannot read {}: {}", path, e)))?;
        Self::from_bytes(data, name)
    }

    pub fn from_bytes(data: Vec<u8>, name: impl Into<String>) -> Result<Self> {
        let face = OwnedFace::from_vec(data, 0)
            .map_err(|e| Error::Font(format!("invalid font file: {}", e)))?;
        let units_per_em = face.as_face_ref().units_per_em();
        if units_per_em == 0 {
            return Err(Error::Font("font reports zero units per em".to_string()));
        }

        Ok(Font {
            face,
            name: name.into(),
            units_per_em,
            shape_cache: RefCell::new(HashMap::new()),
        })
    }

    /// Shape a cell value. Results are cached per text.
    pub fn shape_text(&self, text: &str) -> Vec<ShapedGlyph> {
        if let Some(glyphs) = self.shape_cache.borrow().get(text) {
            return glyphs.clone();
        }

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        let face = rustybuzz::Face::from_face(self.face.as_face_ref().clone());
        let output = rustybuzz::shape(&face, &[], buffer);

        let glyphs: Vec<ShapedGlyph> = output.glyph_infos().iter()
            .zip(output.glyph_positions())
            .map(|(info, pos)| {
                let glyph_id = info.glyph_id as u16;
                ShapedGlyph {
                    glyph_id,
                    advance: self.to_text_space(pos.x_advance as i64),
                    width: self.pdf_width(glyph_id),
                }
            })
            .collect();

        self.shape_cache.borrow_mut().insert(text.to_string(), glyphs.clone());
        glyphs
    }

    /// Width of the shaped run at `size`, matching what the viewer draws
    pub fn measure_text(&self, text: &str, size: f64) -> f64 {
        let total: i64 = self.shape_text(text).iter().map(|g| g.advance).sum();
        total as f64 * size / 1000.0
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw font data for embedding
    pub fn font_data(&self) -> &[u8] {
        self.face.as_slice()
    }

    /// Ascender in 1000 units
    pub fn ascent(&self) -> i16 {
        self.to_text_space(self.face.as_face_ref().ascender() as i64) as i16
    }

    pub fn descent(&self) -> i16 {
        self.to_text_space(self.face.as_face_ref().descender() as i64) as i16
    }

    pub fn bbox(&self) -> (i16, i16, i16, i16) {
        let bbox = self.face.as_face_ref().global_bounding_box();
        let scale = |v: i16| self.to_text_space(v as i64) as i16;
        (scale(bbox.x_min), scale(bbox.y_min), scale(bbox.x_max), scale(bbox.y_max))
    }

    /// 70% of the ascender when the font has no cap height
    pub fn cap_height(&self) -> i16 {
        match self.face.as_face_ref().capital_height() {
            Some(cap_height) => self.to_text_space(cap_height as i64) as i16,
            None => (self.ascent() as i32 * 70 / 100) as i16,
        }
    }

    pub fn italic_angle(&self) -> f32 {
        self.face.as_face_ref().italic_angle()
    }

    /// Nominal advance of a glyph in 1000 units
    pub fn pdf_width(&self, glyph_id: u16) -> i64 {
        let advance = self.face.as_face_ref()
            .glyph_hor_advance(GlyphId(glyph_id))
            .unwrap_or(0);
        self.to_text_space(advance as i64)
    }

    fn to_text_space(&self, units: i64) -> i64 {
        units * 1000 / self.units_per_em as i64
    }
}

/// A TrueType font installed on the machine running the tests
#[cfg(test)]
pub(crate) fn system_font() -> Option<&'static str> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .into_iter()
    .find(|p| std::path::Path::new(p).exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load() -> Option<Font> {
        let Some(path) = system_font() else {
            eprintln!("no system TrueType font found, skipping");
            return None;
        };
        Some(Font::from_file(path, "body").unwrap())
    }

    #[test]
    fn test_missing_file_is_font_error() {
        let err = Font::from_file("/nonexistent/msyh.ttf", "msyh").err().unwrap();
        assert!(matches!(err, Error::Font(_)));
        assert!(err.to_string().contains("msyh.ttf"));
    }

    #[test]
    fn test_garbage_is_font_error() {
        let err = Font::from_bytes(b"definitely not a font".to_vec(), "bad").err().unwrap();
        assert!(matches!(err, Error::Font(_)));
    }

    #[test]
    fn test_shaped_run_measures_from_advances() {
        let Some(font) = load() else { return };

        let glyphs = font.shape_text("Title");
        assert_eq!(glyphs.len(), 5);
        assert!(glyphs.iter().all(|g| g.glyph_id != 0 && g.advance > 0));
        assert!(glyphs.iter().all(|g| g.width == font.pdf_width(g.glyph_id)));

        let total: i64 = glyphs.iter().map(|g| g.advance).sum();
        assert_eq!(font.measure_text("Title", 20.0), total as f64 * 20.0 / 1000.0);
        assert_eq!(font.measure_text("Title", 10.0) * 2.0, font.measure_text("Title", 20.0));
        assert!(font.measure_text("iiii", 12.0) < font.measure_text("WWWW", 12.0));

        // cached run is returned unchanged
        assert_eq!(font.shape_text("Title"), glyphs);
        assert!(font.shape_text("").is_empty());
    }

    #[test]
    fn test_metrics_in_text_space() {
        let Some(font) = load() else { return };
        assert!(font.ascent() > 0);
        assert!(font.descent() < 0);
        assert!(font.cap_height() > 0 && font.cap_height() <= font.ascent());
        let (x_min, y_min, x_max, y_max) = font.bbox();
        assert!(x_min < x_max && y_min < y_max);
        assert_eq!(font.pdf_width(0xFFFF), 0);
    }

    #[test]
    fn test_kerning_is_width_minus_advance() {
        let glyph = ShapedGlyph { glyph_id: 36, advance: 640, width: 684 };
        assert_eq!(glyph.kerning(), 44);
    }
}
