//! Page planning for client reports.
//!
//! The planner works in PDF points on an A4 page with the origin at the
//! top-left corner and `y` growing downwards; the renderer flips it.

use crate::models::DocumentType;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN_X: f32 = 40.0;
pub const CONTENT_TOP: f32 = 50.0;
/// Rows and sections never extend below this line; the footer lives underneath.
pub const PAGE_BOTTOM: f32 = 780.0;
pub const LINE_HEIGHT: f32 = 14.0;
pub const FONT_SIZE: f32 = 10.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;
const VALUE_X: f32 = 190.0;
const VALUE_WIDTH: f32 = PAGE_WIDTH - MARGIN_X - VALUE_X;
const SECTION_MARGIN: f32 = 60.0;
const SECTION_HEADER_HEIGHT: f32 = 28.0;
const HEADER_BAND_HEIGHT: f32 = 70.0;
const PORTRAIT_WIDTH: f32 = 100.0;
const PORTRAIT_HEIGHT: f32 = 120.0;
const FOOTER_RULE_Y: f32 = 800.0;
const FOOTER_TEXT_Y: f32 = 815.0;

pub const UNAVAILABLE_CAPTION: &str = "Document unavailable";
pub const NO_PHOTO_CAPTION: &str = "No Photo";

pub type Rgb = (f32, f32, f32);

pub const BRAND: Rgb = (0.204, 0.220, 0.463);
pub const BLACK: Rgb = (0.0, 0.0, 0.0);
pub const WHITE: Rgb = (1.0, 1.0, 1.0);
pub const MUTED: Rgb = (0.45, 0.45, 0.45);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text { x: f32, y: f32, size: f32, font: Font, color: Rgb, text: String },
    Line { x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgb },
    /// `y` is the top edge.
    FillRect { x: f32, y: f32, w: f32, h: f32, color: Rgb },
    Image { id: usize, x: f32, y: f32, w: f32, h: f32 },
    Placeholder { x: f32, y: f32, w: f32, h: f32, caption: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text drawn on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Where an image slot's pixels come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageSlot {
    /// Index into the report's embedded image list, with pixel size for aspect fitting.
    Ready { id: usize, width: u32, height: u32 },
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedDocument {
    pub document_type: DocumentType,
    pub slot: ImageSlot,
}

struct SlotBox {
    caption_y: f32,
    top: f32,
    height: f32,
}

const SINGLE_SLOT: [SlotBox; 1] = [SlotBox { caption_y: 104.0, top: 114.0, height: 656.0 }];
const PAIR_SLOTS: [SlotBox; 2] = [
    SlotBox { caption_y: 104.0, top: 114.0, height: 306.0 },
    SlotBox { caption_y: 450.0, top: 460.0, height: 306.0 },
];

/// Cursor-driven page planner: current page plus vertical offset on it.
pub struct PagePlanner {
    pages: Vec<Page>,
    y: f32,
}

impl Default for PagePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PagePlanner {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: CONTENT_TOP,
        }
    }

    pub fn page_index(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn cursor(&self) -> f32 {
        self.y
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = CONTENT_TOP;
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text(&mut self, x: f32, y: f32, size: f32, font: Font, color: Rgb, text: impl Into<String>) {
        self.push(DrawOp::Text { x, y, size, font, color, text: text.into() });
    }

    /// Banner across the top of the first page, the subject's name and the portrait.
    pub fn add_header(&mut self, title: &str, subject: &str, subtitle: &str, portrait: ImageSlot) {
        self.push(DrawOp::FillRect { x: 0.0, y: 0.0, w: PAGE_WIDTH, h: HEADER_BAND_HEIGHT, color: BRAND });
        self.text(MARGIN_X, 40.0, 20.0, Font::Bold, WHITE, title);
        self.text(MARGIN_X, 58.0, 9.0, Font::Regular, WHITE, subtitle);

        let photo_x = PAGE_WIDTH - MARGIN_X - PORTRAIT_WIDTH;
        let photo_y = HEADER_BAND_HEIGHT + 20.0;
        self.place_image(portrait, photo_x, photo_y, PORTRAIT_WIDTH, PORTRAIT_HEIGHT, NO_PHOTO_CAPTION);

        self.text(MARGIN_X, photo_y + 24.0, 16.0, Font::Bold, BLACK, subject);
        self.y = photo_y + PORTRAIT_HEIGHT + 20.0;
    }

    /// A label/value row; wraps the value and breaks the page first if the row would not fit.
    pub fn add_row(&mut self, label: &str, value: &str) {
        let lines = wrap_text(value, VALUE_WIDTH, FONT_SIZE, Font::Regular);
        let height = LINE_HEIGHT * lines.len() as f32;
        if self.y + height > PAGE_BOTTOM {
            self.new_page();
        }

        let baseline = self.y + FONT_SIZE;
        self.text(MARGIN_X, baseline, FONT_SIZE, Font::Bold, MUTED, label);
        for (i, line) in lines.into_iter().enumerate() {
            self.text(VALUE_X, baseline + LINE_HEIGHT * i as f32, FONT_SIZE, Font::Regular, BLACK, line);
        }
        self.y += height;
    }

    /// Section title with a divider; needs more headroom than a row so titles never orphan.
    pub fn add_section(&mut self, title: &str) {
        if self.y + SECTION_MARGIN > PAGE_BOTTOM {
            self.new_page();
        }
        self.text(MARGIN_X, self.y + 14.0, 12.0, Font::Bold, BRAND, title);
        let rule_y = self.y + 20.0;
        self.push(DrawOp::Line {
            x1: MARGIN_X,
            y1: rule_y,
            x2: PAGE_WIDTH - MARGIN_X,
            y2: rule_y,
            width: 0.8,
            color: BRAND,
        });
        self.y += SECTION_HEADER_HEIGHT;
    }

    /// One or more pages of captured documents. Always opens a fresh page; documents are
    /// ordered by type, `per_page` (1 or 2) decides how many share a page.
    pub fn place_document_group(&mut self, title: &str, mut documents: Vec<PlacedDocument>, per_page: usize) {
        if documents.is_empty() {
            return;
        }
        documents.sort_by_key(|d| d.document_type);
        let per_page = per_page.clamp(1, 2);
        let slots: &[SlotBox] = if per_page == 1 { &SINGLE_SLOT } else { &PAIR_SLOTS };

        for (i, chunk) in documents.chunks(per_page).enumerate() {
            self.new_page();
            let heading = if i == 0 { title.to_string() } else { format!("{} (continued)", title) };
            self.text(MARGIN_X, CONTENT_TOP + 16.0, 16.0, Font::Bold, BRAND, heading);
            self.push(DrawOp::Line {
                x1: MARGIN_X,
                y1: CONTENT_TOP + 24.0,
                x2: PAGE_WIDTH - MARGIN_X,
                y2: CONTENT_TOP + 24.0,
                width: 1.0,
                color: BRAND,
            });

            for (doc, slot) in chunk.iter().zip(slots) {
                self.text(MARGIN_X, slot.caption_y, 12.0, Font::Bold, BLACK, doc.document_type.label());
                self.place_image(doc.slot, MARGIN_X, slot.top, CONTENT_WIDTH, slot.height, UNAVAILABLE_CAPTION);
                self.y = slot.top + slot.height;
            }
        }
    }

    /// Fit an image inside the box keeping its aspect ratio, centred; placeholder when missing.
    fn place_image(&mut self, slot: ImageSlot, x: f32, y: f32, w: f32, h: f32, caption: &str) {
        match slot {
            ImageSlot::Ready { id, width, height } if width > 0 && height > 0 => {
                let scale = (w / width as f32).min(h / height as f32);
                let (dw, dh) = (width as f32 * scale, height as f32 * scale);
                self.push(DrawOp::Image {
                    id,
                    x: x + (w - dw) / 2.0,
                    y: y + (h - dh) / 2.0,
                    w: dw,
                    h: dh,
                });
            }
            _ => {
                let ph = h.min(160.0);
                self.push(DrawOp::Placeholder {
                    x,
                    y: y + (h - ph) / 2.0,
                    w,
                    h: ph,
                    caption: caption.to_string(),
                });
            }
        }
    }

    /// Footer on every page: generation time, `Page N of M`, subject name.
    pub fn add_footers(&mut self, generated_at: &str, subject: &str) {
        let total = self.pages.len();
        let stamp = format!("Generated: {}", generated_at);
        for (i, page) in self.pages.iter_mut().enumerate() {
            let numbering = format!("Page {} of {}", i + 1, total);
            let size = 8.0;
            page.ops.push(DrawOp::Line {
                x1: MARGIN_X,
                y1: FOOTER_RULE_Y,
                x2: PAGE_WIDTH - MARGIN_X,
                y2: FOOTER_RULE_Y,
                width: 0.5,
                color: MUTED,
            });
            page.ops.push(DrawOp::Text {
                x: MARGIN_X,
                y: FOOTER_TEXT_Y,
                size,
                font: Font::Regular,
                color: MUTED,
                text: stamp.clone(),
            });
            page.ops.push(DrawOp::Text {
                x: (PAGE_WIDTH - text_width(&numbering, size, Font::Regular)) / 2.0,
                y: FOOTER_TEXT_Y,
                size,
                font: Font::Regular,
                color: MUTED,
                text: numbering,
            });
            page.ops.push(DrawOp::Text {
                x: PAGE_WIDTH - MARGIN_X - text_width(subject, size, Font::Regular),
                y: FOOTER_TEXT_Y,
                size,
                font: Font::Regular,
                color: MUTED,
                text: subject.to_string(),
            });
        }
    }
}

/// Approximate Helvetica advance widths per 1000 units.
fn glyph_width(c: char) -> f32 {
    match c {
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | 'I' | '[' | ']' | '\\' | 'f' | 't' => 278.0,
        'i' | 'j' | 'l' => 222.0,
        '(' | ')' | '-' | '`' | 'r' => 333.0,
        '0'..='9' | '$' | '?' | '_' => 556.0,
        'm' | 'M' => 833.0,
        'w' | 'W' => 944.0,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' | 'J' => 500.0,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722.0,
        'G' | 'O' | 'Q' => 778.0,
        'F' | 'T' | 'Z' => 611.0,
        'L' => 556.0,
        '@' => 1015.0,
        'A'..='Z' => 667.0,
        _ => 556.0,
    }
}

pub fn text_width(text: &str, size: f32, font: Font) -> f32 {
    let factor = match font {
        Font::Regular => 1.0,
        Font::Bold => 1.06,
    };
    text.chars().map(glyph_width).sum::<f32>() * size * factor / 1000.0
}

/// Greedy word wrap; words wider than the column are split. Always yields at least one line.
pub fn wrap_text(text: &str, max_width: f32, size: f32, font: Font) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width(&candidate, size, font) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if text_width(&current, size, font) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captions(page: &Page) -> Vec<&str> {
        page.texts().filter(|t| DocumentType::ALL.iter().any(|d| d.label() == *t)).collect()
    }

    #[test]
    fn short_values_fit_on_one_line() {
        assert_eq!(wrap_text("Indian", VALUE_WIDTH, FONT_SIZE, Font::Regular), vec!["Indian"]);
        assert_eq!(wrap_text("", VALUE_WIDTH, FONT_SIZE, Font::Regular), vec![""]);
    }

    #[test]
    fn long_values_wrap_without_exceeding_the_column() {
        let address = "Flat 12, Sunrise Apartments, 4th Cross Road, Indiranagar, Bengaluru, Karnataka 560038, India";
        let lines = wrap_text(address, VALUE_WIDTH, FONT_SIZE, Font::Regular);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, FONT_SIZE, Font::Regular) <= VALUE_WIDTH);
        }
        assert_eq!(lines.join(" "), address);
    }

    #[test]
    fn unbroken_words_are_split() {
        let token = "X".repeat(200);
        let lines = wrap_text(&token, 100.0, FONT_SIZE, Font::Regular);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), token);
    }

    #[test]
    fn rows_advance_by_wrapped_line_count() {
        let mut planner = PagePlanner::new();
        let start = planner.cursor();
        planner.add_row("Name", "Asha");
        assert_eq!(planner.cursor(), start + LINE_HEIGHT);
        planner.add_row("Address", &"word ".repeat(60));
        let lines = wrap_text(&"word ".repeat(60), VALUE_WIDTH, FONT_SIZE, Font::Regular).len();
        assert_eq!(planner.cursor(), start + LINE_HEIGHT * (1 + lines) as f32);
    }

    #[test]
    fn rows_break_onto_a_new_page_before_overflowing() {
        let mut planner = PagePlanner::new();
        let mut rows = 0;
        while planner.page_index() == 0 {
            planner.add_row("Field", "value");
            rows += 1;
        }
        let per_page = ((PAGE_BOTTOM - CONTENT_TOP) / LINE_HEIGHT).floor() as usize;
        assert_eq!(rows, per_page + 1);
        let first = &planner.pages()[1].ops[0];
        assert!(matches!(first, DrawOp::Text { y, .. } if *y == CONTENT_TOP + FONT_SIZE));
        assert_eq!(planner.cursor(), CONTENT_TOP + LINE_HEIGHT);
    }

    #[test]
    fn sections_need_extra_headroom() {
        let mut planner = PagePlanner::new();
        while planner.cursor() + SECTION_MARGIN <= PAGE_BOTTOM {
            planner.add_row("Field", "value");
        }
        assert_eq!(planner.page_index(), 0);
        planner.add_section("Family Information");
        assert_eq!(planner.page_index(), 1);
        assert_eq!(planner.cursor(), CONTENT_TOP + SECTION_HEADER_HEIGHT);
    }

    #[test]
    fn pairs_are_placed_in_type_order_regardless_of_input_order() {
        let mut planner = PagePlanner::new();
        let docs = vec![
            PlacedDocument { document_type: DocumentType::AadhaarBack, slot: ImageSlot::Ready { id: 1, width: 800, height: 500 } },
            PlacedDocument { document_type: DocumentType::AadhaarFront, slot: ImageSlot::Ready { id: 0, width: 800, height: 500 } },
        ];
        planner.place_document_group("Aadhaar Card", docs, 2);
        let pages = planner.pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(captions(&pages[1]), vec!["Aadhaar Card (Front)", "Aadhaar Card (Back)"]);

        let image_ids: Vec<usize> = pages[1]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Image { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(image_ids, vec![0, 1]);
    }

    #[test]
    fn single_sheet_groups_get_a_page_per_document() {
        let mut planner = PagePlanner::new();
        let docs = vec![
            PlacedDocument { document_type: DocumentType::CvPage2, slot: ImageSlot::Unavailable },
            PlacedDocument { document_type: DocumentType::CvPage1, slot: ImageSlot::Unavailable },
        ];
        planner.place_document_group("Curriculum Vitae", docs, 1);
        let pages = planner.pages();
        assert_eq!(pages.len(), 3);
        assert_eq!(captions(&pages[1]), vec!["CV (Page 1)"]);
        assert_eq!(captions(&pages[2]), vec!["CV (Page 2)"]);
        assert!(pages[2].texts().any(|t| t == "Curriculum Vitae (continued)"));
    }

    #[test]
    fn missing_images_become_placeholders() {
        let mut planner = PagePlanner::new();
        planner.place_document_group(
            "PAN Card",
            vec![PlacedDocument { document_type: DocumentType::PanFront, slot: ImageSlot::Unavailable }],
            2,
        );
        let placeholder = planner.pages()[1].ops.iter().find_map(|op| match op {
            DrawOp::Placeholder { caption, .. } => Some(caption.as_str()),
            _ => None,
        });
        assert_eq!(placeholder, Some(UNAVAILABLE_CAPTION));
    }

    #[test]
    fn images_keep_aspect_ratio_and_stay_in_their_slot() {
        let mut planner = PagePlanner::new();
        planner.place_document_group(
            "Marksheet",
            vec![PlacedDocument {
                document_type: DocumentType::Marksheet,
                slot: ImageSlot::Ready { id: 0, width: 1000, height: 500 },
            }],
            1,
        );
        let (x, y, w, h) = planner.pages()[1]
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Image { x, y, w, h, .. } => Some((*x, *y, *w, *h)),
                _ => None,
            })
            .unwrap();
        assert!((w / h - 2.0).abs() < 1e-3);
        assert!((w - CONTENT_WIDTH).abs() < 1e-3);
        assert!(x >= MARGIN_X && y >= SINGLE_SLOT[0].top && y + h <= PAGE_BOTTOM);
    }

    #[test]
    fn empty_groups_emit_nothing() {
        let mut planner = PagePlanner::new();
        planner.place_document_group("Passport", Vec::new(), 2);
        assert_eq!(planner.pages().len(), 1);
    }

    #[test]
    fn every_page_gets_numbered() {
        let mut planner = PagePlanner::new();
        planner.new_page();
        planner.add_footers("2025-01-01 10:00", "Asha Verma");
        let pages = planner.pages();
        assert!(pages[0].texts().any(|t| t == "Page 1 of 2"));
        assert!(pages[1].texts().any(|t| t == "Page 2 of 2"));
        assert!(pages[1].texts().any(|t| t == "Generated: 2025-01-01 10:00"));
        assert!(pages[1].texts().any(|t| t == "Asha Verma"));
    }
}
