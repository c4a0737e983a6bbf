use log::{debug, warn};
use crate::core::canvas::Canvas;
use crate::core::source::TableSource;
use crate::core::types::{ColumnHeader, LineStyle, Rect, Row, RowStream, Title};

/// Inset of left-aligned values from their column's left edge
pub const LEFT_INSET: f64 = 1.5;

/// Distance between the last possible row slot and the page number
pub const PAGE_NUMBER_GAP: f64 = 5.0;

/// Geometry of the data rows
#[derive(Debug, Clone, PartialEq)]
pub struct RowGeometry {
    /// Y of the top of the first row on every page
    pub first_y: f64,
    pub height: f64,
    pub font_family: String,
    pub font_size: f64,
}

/// Paginating table layout.
///
/// Rows are pulled one at a time from the stream and placed top to bottom.
/// Whenever the next row would start at or past the bottom margin a new page
/// is started and all per-page decorations (images, title, header row, grid,
/// page number) are drawn again.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub page: Rect,
    pub header: ColumnHeader,
    pub row: RowGeometry,
    pub line: LineStyle,
}

impl TableLayout {
    pub fn new(page: Rect, header: ColumnHeader, row: RowGeometry, line: LineStyle) -> Self {
        TableLayout { page, header, row, line }
    }

    /// Last Y at which a row may still start
    pub fn bottom_margin(&self) -> f64 {
        self.page.h - self.row.height * 1.5
    }

    /// Number of rows that fit on one page.
    /// A row starts on the current page iff its Y is below the bottom margin,
    /// and the first row of a page is always placed.
    pub fn rows_per_page(&self) -> usize {
        if self.row.height <= 0.0 {
            return 1;
        }
        let span = self.bottom_margin() - self.row.first_y;
        if span <= 0.0 {
            return 1;
        }
        (span / self.row.height).ceil() as usize
    }

    /// X of a cell value given the column's left edge and the measured text width
    pub fn cell_x(column_left: f64, title: &Title, text_width: f64) -> f64 {
        if title.align_left {
            column_left + LEFT_INSET
        } else {
            column_left + (title.width - text_width) / 2.0
        }
    }

    /// Grid segments `(x1, y1, x2, y2)` for one page
    pub fn grid_lines(&self) -> Vec<(f64, f64, f64, f64)> {
        let mut lines = Vec::new();
        let bottom = self.bottom_margin();
        let left = self.header.x;
        let right = self.page.w - self.header.x;

        let mut y = self.row.first_y - (self.row.height - self.row.font_size) / 2.0;
        let header_y = y - self.header.height;
        lines.push((left, header_y, right, header_y));
        if self.row.height > 0.0 {
            while y < bottom {
                lines.push((left, y, right, y));
                y += self.row.height;
            }
        }
        lines.push((left, y, right, y));
        let end_y = y;

        lines.push((left, header_y, left, end_y));
        let last = self.header.titles.len().saturating_sub(1);
        let mut x = left;
        for (i, title) in self.header.titles.iter().enumerate() {
            if i == last {
                x = right;
            } else {
                x = (x + title.width).min(right);
            }
            lines.push((x, header_y, x, end_y));
        }
        lines
    }

    /// Lay out every row of the stream, returning the number of pages drawn.
    /// The stream is always consumed to the end.
    pub fn render<C, S>(&self, canvas: &mut C, source: &S, rows: &mut RowStream) -> usize
    where
        C: Canvas + ?Sized,
        S: TableSource + ?Sized,
    {
        let bottom = self.bottom_margin();
        let mut page = 0;
        let mut new_page = true;
        let mut y = self.row.first_y;

        for row in rows.by_ref() {
            if new_page {
                page += 1;
                debug!("Starting page {}", page);
                self.new_page(canvas, source, page);
                y = self.row.first_y;
                new_page = false;
            }

            self.draw_row(canvas, &row, y);
            y += self.row.height;

            if y >= bottom {
                new_page = true;
            }
        }
        page
    }

    fn new_page<C, S>(&self, canvas: &mut C, source: &S, page: usize)
    where
        C: Canvas + ?Sized,
        S: TableSource + ?Sized,
    {
        canvas.add_page();
        draw_images(canvas, source);
        self.draw_title(canvas, source);
        self.draw_column_titles(canvas);
        if self.line.draw {
            for (x1, y1, x2, y2) in self.grid_lines() {
                canvas.line(x1, y1, x2, y2);
            }
        }

        canvas.set_font(&self.row.font_family, self.row.font_size / 2.0);
        self.draw_page_no(canvas, page);
        canvas.set_font(&self.row.font_family, self.row.font_size);
    }

    fn draw_title<C, S>(&self, canvas: &mut C, source: &S)
    where
        C: Canvas + ?Sized,
        S: TableSource + ?Sized,
    {
        let title = source.title();
        if title.text.is_empty() {
            return;
        }
        canvas.set_font(&title.font_family, title.font_size);
        canvas.set_y(title.y);
        let width = canvas.measure_text_width(&title.text);
        canvas.set_x((self.page.w - width) / 2.0);
        canvas.text(&title.text);
    }

    fn draw_column_titles<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        let header = &self.header;
        canvas.set_font(&header.font_family, header.font_size);
        canvas.set_y(header.y);
        let mut x = header.x;
        for title in &header.titles {
            let width = canvas.measure_text_width(&title.name);
            canvas.set_x(x + (title.width - width) / 2.0);
            canvas.cell(&title.name);
            x += title.width;
        }
    }

    fn draw_page_no<C: Canvas + ?Sized>(&self, canvas: &mut C, page: usize) {
        let p = page.to_string();
        canvas.set_y(self.bottom_margin() + self.row.height + PAGE_NUMBER_GAP);
        let width = canvas.measure_text_width(&p);
        canvas.set_x((self.page.w - width) / 2.0);
        canvas.text(&p);
    }

    fn draw_row<C: Canvas + ?Sized>(&self, canvas: &mut C, row: &Row, y: f64) {
        canvas.set_y(y);
        let mut x = self.header.x;
        for title in &self.header.titles {
            if let Some(value) = row.get(&title.name) {
                if !value.is_empty() {
                    let width = if title.align_left { 0.0 } else { canvas.measure_text_width(value) };
                    canvas.set_x(Self::cell_x(x, title, width));
                    canvas.cell(value);
                }
            }
            // blank cells still take their column
            x += title.width;
        }
    }
}

fn draw_images<C, S>(canvas: &mut C, source: &S)
where
    C: Canvas + ?Sized,
    S: TableSource + ?Sized,
{
    for image in source.images() {
        if let Err(e) = canvas.image(&image.path, image.pos.x, image.pos.y, image.size) {
            warn!("failed to draw image {}: {}", image.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::canvas::recording::{Call, RecordingCanvas};
    use crate::core::types::{ImageAttr, PageTitle, Point};

    #[derive(Default)]
    struct Decor {
        title: PageTitle,
        images: Vec<ImageAttr>,
    }

    impl TableSource for Decor {
        fn title(&self) -> PageTitle {
            self.title.clone()
        }

        fn images(&self) -> Box<dyn Iterator<Item = ImageAttr> + '_> {
            Box::new(self.images.iter().cloned())
        }
    }

    fn layout(page_h: f64, first_y: f64, height: f64, titles: Vec<Title>) -> TableLayout {
        TableLayout::new(
            Rect::new(300.0, page_h),
            ColumnHeader {
                x: 0.0,
                y: first_y - 30.0,
                height: 20.0,
                font_family: "head".to_string(),
                font_size: 12.0,
                titles,
            },
            RowGeometry {
                first_y,
                height,
                font_family: "body".to_string(),
                font_size: 10.0,
            },
            LineStyle::default(),
        )
    }

    fn stream(rows: Vec<Row>) -> RowStream {
        Box::new(rows.into_iter())
    }

    fn numbered(n: usize) -> Vec<Row> {
        (0..n).map(|i| Row::from([("A".to_string(), format!("r{}", i))])).collect()
    }

    fn data_cells(canvas: &RecordingCanvas) -> Vec<usize> {
        canvas.cells_by_page()
            .iter()
            .map(|cells| cells.iter().filter(|(_, _, t)| t.starts_with('r')).count())
            .collect()
    }

    #[test]
    fn test_bottom_margin_and_rows_per_page() {
        let t = layout(320.0, 100.0, 20.0, vec![Title::new("A", 50.0)]);
        assert_eq!(t.bottom_margin(), 290.0);
        assert_eq!(t.rows_per_page(), 10);

        // exact multiple: the row that would start on the margin moves to the next page
        let t = layout(330.0, 100.0, 20.0, vec![Title::new("A", 50.0)]);
        assert_eq!(t.bottom_margin(), 300.0);
        assert_eq!(t.rows_per_page(), 10);

        let t = layout(100.0, 200.0, 20.0, vec![Title::new("A", 50.0)]);
        assert_eq!(t.rows_per_page(), 1);
    }

    #[test]
    fn test_single_row_scenario() {
        let t = layout(300.0, 100.0, 30.0, vec![Title::new("A", 50.0), Title::left("B", 100.0)]);
        let mut canvas = RecordingCanvas::new();
        let row = Row::from([
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "hello".to_string()),
        ]);
        let pages = t.render(&mut canvas, &Decor::default(), &mut stream(vec![row]));

        assert_eq!(pages, 1);
        assert_eq!(canvas.pages(), 1);
        let cells = &canvas.cells_by_page()[0];
        // "1" is 5 wide at size 10
        assert!(cells.contains(&(22.5, 100.0, "1".to_string())));
        assert!(cells.contains(&(51.5, 100.0, "hello".to_string())));
    }

    #[test]
    fn test_41_rows_make_5_pages() {
        let t = layout(320.0, 100.0, 20.0, vec![Title::new("A", 50.0)]);
        let mut canvas = RecordingCanvas::new();
        let pages = t.render(&mut canvas, &Decor::default(), &mut stream(numbered(41)));

        assert_eq!(pages, 5);
        assert_eq!(data_cells(&canvas), vec![10, 10, 10, 10, 1]);
    }

    #[test]
    fn test_page_count_matches_rows_per_page() {
        for (page_h, first_y, height) in [(320.0, 100.0, 20.0), (330.0, 100.0, 20.0), (400.0, 50.0, 29.0)] {
            let t = layout(page_h, first_y, height, vec![Title::new("A", 50.0)]);
            let per_page = t.rows_per_page();
            for n in 0..45 {
                let mut canvas = RecordingCanvas::new();
                let pages = t.render(&mut canvas, &Decor::default(), &mut stream(numbered(n)));
                assert_eq!(pages, n.div_ceil(per_page), "n={} h={}", n, page_h);
                assert_eq!(canvas.pages(), pages);
            }
        }
    }

    #[test]
    fn test_rows_stack_by_row_height() {
        let t = layout(320.0, 100.0, 20.0, vec![Title::left("A", 50.0)]);
        let mut canvas = RecordingCanvas::new();
        t.render(&mut canvas, &Decor::default(), &mut stream(numbered(12)));

        let pages = canvas.cells_by_page();
        let ys: Vec<f64> = pages[0].iter().filter(|c| c.2.starts_with('r')).map(|c| c.1).collect();
        let want: Vec<f64> = (0..10).map(|i| 100.0 + 20.0 * i as f64).collect();
        assert_eq!(ys, want);
        // second page restarts at the first row
        assert_eq!(pages[1].iter().find(|c| c.2 == "r10").map(|c| c.1), Some(100.0));
    }

    #[test]
    fn test_blank_cells_keep_columns_aligned() {
        let titles = vec![Title::left("A", 40.0), Title::left("B", 70.0), Title::left("C", 25.0)];
        let t = layout(320.0, 100.0, 20.0, titles);
        let mut canvas = RecordingCanvas::new();
        let rows = vec![
            Row::from([("zzz".to_string(), "ignored".to_string())]),
            Row::from([("C".to_string(), "c".to_string()), ("A".to_string(), String::new())]),
        ];
        t.render(&mut canvas, &Decor::default(), &mut stream(rows));

        let cells = &canvas.cells_by_page()[0];
        assert!(!cells.iter().any(|c| c.2 == "ignored"));
        // the blank row still took a slot
        assert!(cells.contains(&(110.0 + LEFT_INSET, 120.0, "c".to_string())));
        assert_eq!(cells.iter().filter(|c| c.1 >= 100.0).count(), 1);
    }

    #[test]
    fn test_alignment() {
        let centered = Title::new("A", 80.0);
        let left = Title::left("B", 80.0);
        assert_eq!(TableLayout::cell_x(20.0, &centered, 30.0), 45.0);
        assert_eq!(TableLayout::cell_x(20.0, &left, 30.0), 21.5);
        assert_eq!(TableLayout::cell_x(20.0, &left, 75.0), 21.5);
    }

    #[test]
    fn test_header_centered_per_column() {
        let t = layout(320.0, 100.0, 20.0, vec![Title::new("AB", 50.0), Title::new("C", 30.0)]);
        let mut canvas = RecordingCanvas::new();
        t.render(&mut canvas, &Decor::default(), &mut stream(numbered(1)));

        let cells = &canvas.cells_by_page()[0];
        // header font is 12: "AB" is 12 wide, "C" is 6 wide
        assert!(cells.contains(&(19.0, 70.0, "AB".to_string())));
        assert!(cells.contains(&(62.0, 70.0, "C".to_string())));
    }

    #[test]
    fn test_title_and_page_number_centered_each_page() {
        let t = layout(320.0, 100.0, 20.0, vec![Title::new("A", 50.0)]);
        let decor = Decor {
            title: PageTitle {
                text: "Report".to_string(),
                y: 40.0,
                font_family: "head".to_string(),
                font_size: 20.0,
            },
            images: Vec::new(),
        };
        let mut canvas = RecordingCanvas::new();
        t.render(&mut canvas, &decor, &mut stream(numbered(15)));

        let texts = canvas.texts();
        let titles: Vec<_> = texts.iter().filter(|t| t.2 == "Report").collect();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0].0, (300.0 - 60.0) / 2.0);
        assert_eq!(titles[0].0, titles[1].0);
        assert_eq!(titles[0].1, 40.0);

        // page numbers at half the row font size, below the last row slot
        let numbers: Vec<_> = texts.iter().filter(|t| t.2 == "1" || t.2 == "2").collect();
        assert_eq!(numbers.len(), 2);
        assert_eq!(numbers[0].1, 290.0 + 20.0 + PAGE_NUMBER_GAP);
        assert_eq!(numbers[0].0, (300.0 - 2.5) / 2.0);
        assert!(canvas.calls.contains(&Call::Font("body".to_string(), 5.0)));
    }

    #[test]
    fn test_empty_title_not_drawn() {
        let t = layout(320.0, 100.0, 20.0, vec![Title::new("A", 50.0)]);
        let mut canvas = RecordingCanvas::new();
        t.render(&mut canvas, &Decor::default(), &mut stream(numbered(1)));
        // only the page number
        assert_eq!(canvas.texts().len(), 1);
    }

    #[test]
    fn test_images_every_page_failures_skipped() {
        let t = layout(320.0, 100.0, 20.0, vec![Title::new("A", 50.0)]);
        let image = |path: &str| ImageAttr {
            pos: Point { x: 10.0, y: 10.0 },
            size: Rect::new(40.0, 40.0),
            path: path.to_string(),
        };
        let decor = Decor {
            title: PageTitle::default(),
            images: vec![image("missing.png"), image("logo.png")],
        };
        let mut canvas = RecordingCanvas::new();
        let pages = t.render(&mut canvas, &decor, &mut stream(numbered(25)));

        assert_eq!(pages, 3);
        let logos = canvas.calls.iter()
            .filter(|c| matches!(c, Call::Image { path, .. } if path == "logo.png"))
            .count();
        assert_eq!(logos, 3);
    }

    #[test]
    fn test_grid_geometry() {
        let mut t = TableLayout::new(
            Rect::new(200.0, 200.0),
            ColumnHeader {
                x: 10.0,
                y: 25.0,
                height: 20.0,
                font_family: "head".to_string(),
                font_size: 10.0,
                titles: vec![Title::new("A", 50.0), Title::new("B", 500.0)],
            },
            RowGeometry {
                first_y: 50.0,
                height: 20.0,
                font_family: "body".to_string(),
                font_size: 10.0,
            },
            LineStyle { draw: true, ..LineStyle::default() },
        );

        let lines = t.grid_lines();
        let horizontal: Vec<f64> = lines.iter().filter(|l| l.1 == l.3).map(|l| l.1).collect();
        assert_eq!(horizontal, vec![25.0, 45.0, 65.0, 85.0, 105.0, 125.0, 145.0, 165.0, 185.0]);
        assert!(lines.iter().filter(|l| l.1 == l.3).all(|l| l.0 == 10.0 && l.2 == 190.0));

        let vertical: Vec<f64> = lines.iter().filter(|l| l.0 == l.2).map(|l| l.0).collect();
        assert_eq!(vertical, vec![10.0, 60.0, 190.0]);
        assert!(lines.iter().filter(|l| l.0 == l.2).all(|l| l.1 == 25.0 && l.3 == 185.0));

        // a wide middle column is clamped to the right edge
        t.header.titles = vec![Title::new("A", 500.0), Title::new("B", 10.0), Title::new("C", 10.0)];
        let vertical: Vec<f64> = t.grid_lines().iter().filter(|l| l.0 == l.2).map(|l| l.0).collect();
        assert_eq!(vertical, vec![10.0, 190.0, 190.0, 190.0]);
    }

    #[test]
    fn test_grid_only_when_enabled() {
        let mut t = layout(320.0, 100.0, 20.0, vec![Title::new("A", 50.0)]);
        let mut canvas = RecordingCanvas::new();
        t.render(&mut canvas, &Decor::default(), &mut stream(numbered(3)));
        assert!(canvas.lines().is_empty());

        t.line.draw = true;
        let mut canvas = RecordingCanvas::new();
        t.render(&mut canvas, &Decor::default(), &mut stream(numbered(3)));
        assert_eq!(canvas.lines(), t.grid_lines());
    }

    #[test]
    fn test_empty_stream_draws_nothing() {
        let t = layout(320.0, 100.0, 20.0, vec![Title::new("A", 50.0)]);
        let mut canvas = RecordingCanvas::new();
        assert_eq!(t.render(&mut canvas, &Decor::default(), &mut stream(Vec::new())), 0);
        assert!(canvas.calls.is_empty());
    }
}
