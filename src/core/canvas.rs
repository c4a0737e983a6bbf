use std::io::Write;
use crate::core::types::Rect;
use crate::error::Result;

/// Drawing surface the table generator renders onto.
///
/// Coordinates use a top-left origin with Y growing downwards. Text is drawn
/// at a cursor set with `set_x`/`set_y`; `text` anchors the baseline at the
/// cursor, `cell` anchors the top of the text box.
pub trait Canvas {
    /// Begin a new document with the given page size
    fn start(&mut self, page_size: Rect);

    /// Append a blank page and make it current
    fn add_page(&mut self);

    /// Release any document state. Called once after serialization.
    fn close(&mut self) {}

    fn set_line_width(&mut self, width: f64);

    /// Dash pattern token: "normal", "dashed" or "dotted"
    fn set_line_type(&mut self, line_type: &str);

    /// Select a registered font family at the given size
    fn set_font(&mut self, family: &str, size: f64);

    /// Load a TrueType font and make it selectable under `family`
    fn register_font(&mut self, family: &str, path: &str) -> Result<()>;

    fn set_x(&mut self, x: f64);

    fn set_y(&mut self, y: f64);

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);

    /// Draw text with its baseline at the cursor
    fn text(&mut self, text: &str);

    /// Draw text with the top of its line box at the cursor
    fn cell(&mut self, text: &str);

    /// Move the cursor and draw baseline-anchored text
    fn draw_text(&mut self, x: f64, y: f64, text: &str) {
        self.set_x(x);
        self.set_y(y);
        self.text(text);
    }

    /// Width of `text` in the current font and size
    fn measure_text_width(&self, text: &str) -> f64;

    /// Place an image with its upper-left corner at (x, y)
    fn image(&mut self, path: &str, x: f64, y: f64, size: Rect) -> Result<()>;

    /// Write the finished document. The sink is borrowed, never closed.
    fn serialize_to(&mut self, sink: &mut dyn Write) -> Result<()>;
}
