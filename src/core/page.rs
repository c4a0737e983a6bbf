use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;
use crate::core::font::ShapedGlyph;
use crate::core::writer::{escape_string, format_real};

/// A single page: its size, content stream and the resources it uses.
/// Coordinates here are PDF user space (origin bottom-left).
#[derive(Debug, Clone)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub content: Vec<u8>,
    pub used_glyphs: HashMap<usize, HashSet<u16>>,  // font_index -> glyph_ids
    pub used_images: BTreeSet<usize>,
}

impl Page {
    pub fn new(width: f64, height: f64) -> Self {
        Page {
            width,
            height,
            content: Vec::new(),
            used_glyphs: HashMap::new(),
            used_images: BTreeSet::new(),
        }
    }

    /// Text in the built-in Helvetica (/F1)
    pub fn text(&mut self, text: &str, x: f64, y: f64, size: f64) -> &mut Self {
        let _ = write!(self.content, "BT /F1 {} Tf {} {} Td (", format_real(size), format_real(x), format_real(y));
        self.content.extend(escape_string(text));
        self.content.extend_from_slice(b") Tj ET\n");
        self
    }

    /// Shaped text in a custom font. Font names are offset by two since
    /// /F1 is the built-in Helvetica.
    pub fn text_with_font(&mut self, glyphs: &[ShapedGlyph], font_index: usize, x: f64, y: f64, size: f64) -> &mut Self {
        self.used_glyphs
            .entry(font_index)
            .or_default()
            .extend(glyphs.iter().map(|g| g.glyph_id));

        let _ = write!(
            self.content,
            "BT /F{} {} Tf {} {} Td ",
            font_index + 2, format_real(size), format_real(x), format_real(y)
        );
        // Identity-H: the string is the raw big-endian glyph id sequence
        let last = glyphs.len().saturating_sub(1);
        if glyphs[..last].iter().all(|g| g.kerning() == 0) {
            let hex: String = glyphs.iter().map(|g| format!("{:04X}", g.glyph_id)).collect();
            let _ = writeln!(self.content, "<{}> Tj ET", hex);
        } else {
            let mut run = String::from("[<");
            for (i, g) in glyphs.iter().enumerate() {
                run.push_str(&format!("{:04X}", g.glyph_id));
                if i < last && g.kerning() != 0 {
                    run.push_str(&format!("> {} <", g.kerning()));
                }
            }
            let _ = writeln!(self.content, "{}>] TJ ET", run);
        }
        self
    }

    pub fn set_line_width(&mut self, width: f64) -> &mut Self {
        let _ = writeln!(self.content, "{} w", format_real(width));
        self
    }

    /// Dash pattern operator, e.g. `[5] 2 d`
    pub fn set_dash(&mut self, pattern: &str) -> &mut Self {
        let _ = writeln!(self.content, "{}", pattern);
        self
    }

    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> &mut Self {
        let _ = writeln!(
            self.content,
            "{} {} m {} {} l S",
            format_real(x1), format_real(y1), format_real(x2), format_real(y2)
        );
        self
    }

    /// Place image XObject /Im{index} with its lower-left corner at (x, y)
    pub fn draw_image(&mut self, image_index: usize, x: f64, y: f64, w: f64, h: f64) -> &mut Self {
        self.used_images.insert(image_index);
        let _ = writeln!(
            self.content,
            "q {} 0 0 {} {} {} cm /Im{} Do Q",
            format_real(w), format_real(h), format_real(x), format_real(y), image_index
        );
        self
    }
}
