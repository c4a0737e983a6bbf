use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Width x height in page units (points)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(w: f64, h: f64) -> Self {
        Rect { w, h }
    }

    /// A4 portrait, the fallback page size
    pub fn a4() -> Self {
        Rect { w: 595.0, h: 842.0 }
    }
}

/// Position measured from the upper-left corner of the page, Y grows down
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Column descriptor. Declaration order is the left-to-right layout order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    /// Header text and the key used to look the value up in each row
    pub name: String,
    pub width: f64,
    /// Left-align values (with a small inset) instead of centering them.
    /// Header text is always centered.
    #[serde(default)]
    pub align_left: bool,
}

impl Title {
    pub fn new(name: impl Into<String>, width: f64) -> Self {
        Title { name: name.into(), width, align_left: false }
    }

    pub fn left(name: impl Into<String>, width: f64) -> Self {
        Title { name: name.into(), width, align_left: true }
    }
}

/// One data record: column name => display value
pub type Row = HashMap<String, String>;

/// Forward-only, one-shot row sequence
pub type RowStream = Box<dyn Iterator<Item = Row>>;

/// A font file to register under a family name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub path: String,
}

/// An image drawn on every page (e.g. a logo)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttr {
    /// Upper-left corner
    pub pos: Point,
    /// Displayed size
    pub size: Rect,
    pub path: String,
}

/// Grid line attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    #[serde(default)]
    pub draw: bool,
    #[serde(default = "default_line_width")]
    pub width: f64,
    /// "normal", "dashed" or "dotted"
    #[serde(default = "default_line_type")]
    pub line_type: String,
}

fn default_line_width() -> f64 { 0.5 }
fn default_line_type() -> String { "normal".to_string() }

impl Default for LineStyle {
    fn default() -> Self {
        LineStyle {
            draw: false,
            width: default_line_width(),
            line_type: default_line_type(),
        }
    }
}

/// Page title, drawn centered with its baseline at `y`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageTitle {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub font_family: String,
    #[serde(default)]
    pub font_size: f64,
}

/// Column header row: position of the first column, row height, font and the schema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnHeader {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub font_family: String,
    #[serde(default)]
    pub font_size: f64,
    #[serde(default)]
    pub titles: Vec<Title>,
}

/// Data row geometry plus the row stream itself
pub struct RowSpec {
    pub first_y: f64,
    pub height: f64,
    pub font_family: String,
    pub font_size: f64,
    pub rows: Option<RowStream>,
}

impl Default for RowSpec {
    fn default() -> Self {
        RowSpec {
            first_y: 0.0,
            height: 0.0,
            font_family: String::new(),
            font_size: 0.0,
            rows: None,
        }
    }
}

impl std::fmt::Debug for RowSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSpec")
            .field("first_y", &self.first_y)
            .field("height", &self.height)
            .field("font_family", &self.font_family)
            .field("font_size", &self.font_size)
            .field("rows", &self.rows.as_ref().map(|_| "<stream>"))
            .finish()
    }
}
