use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use log::warn;
use crate::core::font::Font;
use crate::core::image::{Image, ImageFilter};
use crate::core::page::Page;
use crate::core::writer::{PdfWriter, PdfObject};

/// Objects per embedded font: FontFile2, FontDescriptor, CIDFont, Type0
const OBJECTS_PER_FONT: u32 = 4;

/// A buffered PDF document: pages plus the fonts and images they reference
pub struct Document {
    pub pages: Vec<Page>,
    pub fonts: Vec<Font>,
    pub images: Vec<Image>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            pages: Vec::new(),
            fonts: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Register a custom font, returning its index for page rendering
    pub fn add_font(&mut self, font: Font) -> usize {
        self.fonts.push(font);
        self.fonts.len() - 1
    }

    /// Register an image, returning its index for page rendering
    pub fn add_image(&mut self, image: Image) -> usize {
        self.images.push(image);
        self.images.len() - 1
    }

    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize the whole document to `sink`
    pub fn write_to<W: Write>(&self, sink: W) -> io::Result<()> {
        let mut writer = PdfWriter::new(sink)?;

        let catalog_id = 1;
        let pages_id = 2;
        let helvetica_id = 3;
        let mut next_id = 4;

        let font_base_ids: Vec<u32> = (0..self.fonts.len())
            .map(|_| {
                let id = next_id;
                next_id += OBJECTS_PER_FONT;
                id
            })
            .collect();

        let image_ids: Vec<u32> = (0..self.images.len())
            .map(|_| {
                let id = next_id;
                next_id += 1;
                id
            })
            .collect();

        // (content, page) per page
        let page_object_ids: Vec<(u32, u32)> = (0..self.pages.len())
            .map(|_| {
                let ids = (next_id, next_id + 1);
                next_id += 2;
                ids
            })
            .collect();

        let catalog = PdfObject::Dictionary(vec![
            ("Type".to_string(), PdfObject::name("Catalog")),
            ("Pages".to_string(), PdfObject::Reference(pages_id)),
        ]);
        writer.write_object(catalog_id, &catalog)?;

        let pages_obj = PdfObject::Dictionary(vec![
            ("Type".to_string(), PdfObject::name("Pages")),
            ("Kids".to_string(), PdfObject::Array(
                page_object_ids.iter().map(|(_, page_id)| PdfObject::Reference(*page_id)).collect()
            )),
            ("Count".to_string(), PdfObject::Integer(self.pages.len() as i64)),
        ]);
        writer.write_object(pages_id, &pages_obj)?;

        let helvetica = PdfObject::Dictionary(vec![
            ("Type".to_string(), PdfObject::name("Font")),
            ("Subtype".to_string(), PdfObject::name("Type1")),
            ("BaseFont".to_string(), PdfObject::name("Helvetica")),
            ("Encoding".to_string(), PdfObject::name("WinAnsiEncoding")),
        ]);
        writer.write_object(helvetica_id, &helvetica)?;

        // Glyph usage across all pages drives subsetting and the width array
        let mut font_glyph_usage: HashMap<usize, HashSet<u16>> = HashMap::new();
        for page in &self.pages {
            for (font_idx, gids) in &page.used_glyphs {
                font_glyph_usage.entry(*font_idx).or_default().extend(gids);
            }
        }

        let empty = HashSet::new();
        let mut font_resources = vec![
            ("F1".to_string(), PdfObject::Reference(helvetica_id))
        ];
        for (i, font) in self.fonts.iter().enumerate() {
            let used = font_glyph_usage.get(&i).unwrap_or(&empty);
            let type0_id = embed_font(&mut writer, font, font_base_ids[i], used)?;
            font_resources.push((format!("F{}", i + 2), PdfObject::Reference(type0_id)));
        }

        for (image, id) in self.images.iter().zip(&image_ids) {
            writer.write_object(*id, &image_object(image)?)?;
        }

        for (page, (content_id, page_id)) in self.pages.iter().zip(&page_object_ids) {
            let content = PdfObject::flate_stream(vec![], &page.content)?;
            writer.write_object(*content_id, &content)?;

            let mut resources = vec![
                ("Font".to_string(), PdfObject::Dictionary(font_resources.clone())),
            ];
            if !page.used_images.is_empty() {
                let xobjects = page.used_images.iter()
                    .map(|i| (format!("Im{}", i), PdfObject::Reference(image_ids[*i])))
                    .collect();
                resources.push(("XObject".to_string(), PdfObject::Dictionary(xobjects)));
            }

            let page_obj = PdfObject::Dictionary(vec![
                ("Type".to_string(), PdfObject::name("Page")),
                ("Parent".to_string(), PdfObject::Reference(pages_id)),
                ("MediaBox".to_string(), PdfObject::Array(vec![
                    PdfObject::Integer(0),
                    PdfObject::Integer(0),
                    PdfObject::Real(page.width),
                    PdfObject::Real(page.height),
                ])),
                ("Resources".to_string(), PdfObject::Dictionary(resources)),
                ("Contents".to_string(), PdfObject::Reference(*content_id)),
            ]);
            writer.write_object(*page_id, &page_obj)?;
        }

        writer.write_xref_and_trailer(catalog_id)
    }
}

fn image_object(image: &Image) -> io::Result<PdfObject> {
    let dict = vec![
        ("Type".to_string(), PdfObject::name("XObject")),
        ("Subtype".to_string(), PdfObject::name("Image")),
        ("Width".to_string(), PdfObject::Integer(image.width as i64)),
        ("Height".to_string(), PdfObject::Integer(image.height as i64)),
        ("ColorSpace".to_string(), PdfObject::name(&image.color_space)),
        ("BitsPerComponent".to_string(), PdfObject::Integer(image.bits_per_component as i64)),
    ];
    match image.filter {
        ImageFilter::Flate => PdfObject::flate_stream(dict, &image.data),
        ImageFilter::Dct => {
            let mut dict = dict;
            dict.push(("Filter".to_string(), PdfObject::name(image.filter.pdf_name())));
            Ok(PdfObject::Stream(dict, image.data.clone()))
        }
    }
}

/// Keep only the glyphs in use. Falls back to the full font if subsetting fails.
fn subset_font(font: &Font, used_gids: &HashSet<u16>) -> Vec<u8> {
    let mut gids: Vec<u16> = used_gids.iter().copied().collect();
    gids.sort_unstable();

    let profile = subsetter::Profile::pdf(&gids);

    match subsetter::subset(font.font_data(), 0, profile) {
        Ok(subset_data) => subset_data,
        Err(e) => {
            warn!("font subsetting failed for {} ({:?}), embedding the full font", font.name(), e);
            font.font_data().to_vec()
        }
    }
}

/// PDF names can't carry spaces or delimiters
fn pdf_font_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Embed a TrueType font as FontFile2, FontDescriptor, CIDFontType2 and the
/// Type0 composite font. Returns the id of the Type0 font.
fn embed_font(writer: &mut PdfWriter<impl Write>, font: &Font, base_id: u32, used_gids: &HashSet<u16>) -> io::Result<u32> {
    let font_file_id = base_id;
    let font_descriptor_id = base_id + 1;
    let cid_font_id = base_id + 2;
    let type0_font_id = base_id + 3;
    let base_font = pdf_font_name(font.name());

    let font_data = subset_font(font, used_gids);
    let font_file = PdfObject::flate_stream(
        vec![("Length1".to_string(), PdfObject::Integer(font_data.len() as i64))],
        &font_data,
    )?;
    writer.write_object(font_file_id, &font_file)?;

    let bbox = font.bbox();
    let font_descriptor = PdfObject::Dictionary(vec![
        ("Type".to_string(), PdfObject::name("FontDescriptor")),
        ("FontName".to_string(), PdfObject::Name(base_font.clone())),
        ("Flags".to_string(), PdfObject::Integer(32)),  // Nonsymbolic
        ("FontBBox".to_string(), PdfObject::Array(vec![
            PdfObject::Integer(bbox.0 as i64),
            PdfObject::Integer(bbox.1 as i64),
            PdfObject::Integer(bbox.2 as i64),
            PdfObject::Integer(bbox.3 as i64),
        ])),
        ("ItalicAngle".to_string(), PdfObject::Real(font.italic_angle() as f64)),
        ("Ascent".to_string(), PdfObject::Integer(font.ascent() as i64)),
        ("Descent".to_string(), PdfObject::Integer(font.descent() as i64)),
        ("CapHeight".to_string(), PdfObject::Integer(font.cap_height() as i64)),
        ("StemV".to_string(), PdfObject::Integer(80)),  // Approximate
        ("FontFile2".to_string(), PdfObject::Reference(font_file_id)),
    ]);
    writer.write_object(font_descriptor_id, &font_descriptor)?;

    // W: [gid [width] gid [width] ...]
    let mut gids: Vec<u16> = used_gids.iter().copied().collect();
    gids.sort_unstable();
    let widths = gids.iter()
        .flat_map(|gid| [
            PdfObject::Integer(*gid as i64),
            PdfObject::Array(vec![PdfObject::Integer(font.pdf_width(*gid))]),
        ])
        .collect();

    let cid_font = PdfObject::Dictionary(vec![
        ("Type".to_string(), PdfObject::name("Font")),
        ("Subtype".to_string(), PdfObject::name("CIDFontType2")),
        ("BaseFont".to_string(), PdfObject::Name(base_font.clone())),
        ("CIDSystemInfo".to_string(), PdfObject::Dictionary(vec![
            ("Registry".to_string(), PdfObject::String("Adobe".to_string())),
            ("Ordering".to_string(), PdfObject::String("Identity".to_string())),
            ("Supplement".to_string(), PdfObject::Integer(0)),
        ])),
        ("FontDescriptor".to_string(), PdfObject::Reference(font_descriptor_id)),
        ("CIDToGIDMap".to_string(), PdfObject::name("Identity")),
        ("DW".to_string(), PdfObject::Integer(1000)),
        ("W".to_string(), PdfObject::Array(widths)),
    ]);
    writer.write_object(cid_font_id, &cid_font)?;

    let type0_font = PdfObject::Dictionary(vec![
        ("Type".to_string(), PdfObject::name("Font")),
        ("Subtype".to_string(), PdfObject::name("Type0")),
        ("BaseFont".to_string(), PdfObject::Name(base_font)),
        ("Encoding".to_string(), PdfObject::name("Identity-H")),
        ("DescendantFonts".to_string(), PdfObject::Array(vec![
            PdfObject::Reference(cid_font_id)
        ])),
    ]);
    writer.write_object(type0_font_id, &type0_font)?;

    Ok(type0_font_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::font::system_font;

    fn contains(hay: &[u8], needle: &str) -> bool {
        hay.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    fn count(hay: &[u8], needle: &str) -> usize {
        hay.windows(needle.len()).filter(|w| *w == needle.as_bytes()).count()
    }

    #[test]
    fn test_empty_document_is_valid() {
        let mut out = Vec::new();
        Document::new().write_to(&mut out).unwrap();
        assert!(out.starts_with(b"%PDF-1.7\n"));
        assert!(contains(&out, "/Count 0"));
        assert!(out.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn test_pages_and_shared_image() {
        let mut doc = Document::new();
        let idx = doc.add_image(Image {
            width: 1,
            height: 1,
            color_space: "DeviceRGB".to_string(),
            bits_per_component: 8,
            data: vec![255, 0, 0],
            filter: ImageFilter::Flate,
        });
        for _ in 0..3 {
            let mut page = Page::new(595.0, 842.0);
            page.text("x", 10.0, 10.0, 12.0);
            page.draw_image(idx, 0.0, 0.0, 10.0, 10.0);
            doc.add_page(page);
        }
        assert_eq!(doc.page_count(), 3);

        let mut out = Vec::new();
        doc.write_to(&mut out).unwrap();
        assert!(contains(&out, "/Count 3"));
        assert_eq!(count(&out, "/Subtype /Image"), 1);
        assert_eq!(count(&out, "/XObject << /Im0 4 0 R >>"), 3);
        assert_eq!(count(&out, "/Type /Page "), 3);
    }

    #[test]
    fn test_font_embedded_as_cid_font() {
        let Some(path) = system_font() else {
            eprintln!("no system TrueType font found, skipping");
            return;
        };
        let mut doc = Document::new();
        let font = Font::from_file(path, "Body Font").unwrap();
        let glyphs = font.shape_text("Hi there");
        let idx = doc.add_font(font);
        let mut page = Page::new(595.0, 842.0);
        page.text_with_font(&glyphs, idx, 10.0, 10.0, 12.0);
        doc.add_page(page);

        let mut out = Vec::new();
        doc.write_to(&mut out).unwrap();

        for needle in [
            "/Subtype /Type0",
            "/Subtype /CIDFontType2",
            "/Encoding /Identity-H",
            "/CIDToGIDMap /Identity",
            "/BaseFont /Body-Font",
            "/FontFile2 4 0 R",
            "/Font << /F1 3 0 R /F2 7 0 R >>",
        ] {
            assert!(contains(&out, needle), "missing {}", needle);
        }

        // one width entry per distinct glyph, in glyph id order
        let font = &doc.fonts[idx];
        let mut gids: Vec<u16> = glyphs.iter().map(|g| g.glyph_id).collect();
        gids.sort_unstable();
        gids.dedup();
        let widths: Vec<String> = gids.iter().map(|g| format!("{} [{}]", g, font.pdf_width(*g))).collect();
        assert!(contains(&out, &format!("/W [{}]", widths.join(" "))));

        let used: HashSet<u16> = gids.into_iter().collect();
        let subset = subset_font(font, &used);
        assert!(subset.len() < font.font_data().len());
        assert!(contains(&out, &format!("/Length1 {}", subset.len())));
    }

    #[test]
    fn test_font_name_sanitized() {
        assert_eq!(pdf_font_name("Noto Sans/CJK"), "Noto-Sans-CJK");
    }
}
