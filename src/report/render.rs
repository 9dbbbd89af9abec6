use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use super::fetcher::{EmbeddedImage, ImageEncoding};
use super::layout::{DrawOp, Font, PAGE_HEIGHT, PAGE_WIDTH, Page, text_width};

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

/// Serialise planned pages into a PDF using the built-in Helvetica faces.
pub fn render_pdf(pages: &[Page], images: &[EmbeddedImage], title: &str) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let regular_id = alloc();
    let bold_id = alloc();
    let info_id = alloc();

    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr("client-intake"));

    let mut image_xobjects: Vec<(String, Ref)> = Vec::with_capacity(images.len());
    for (i, img) in images.iter().enumerate() {
        let xobj_ref = alloc();
        let mut xobj = pdf.image_xobject(xobj_ref, &img.data);
        xobj.filter(match img.encoding {
            ImageEncoding::Jpeg => Filter::DctDecode,
            ImageEncoding::FlateRgb => Filter::FlateDecode,
        });
        xobj.width(img.width as i32);
        xobj.height(img.height as i32);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
        drop(xobj);
        image_xobjects.push((format!("Im{}", i + 1), xobj_ref));
    }

    let n = pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, page) in pages.iter().enumerate() {
        let raw = draw_page(page, &image_xobjects);
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id).kids(page_ids.iter().copied()).count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            fonts.pair(REGULAR, regular_id);
            fonts.pair(BOLD, bold_id);
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    pdf.finish()
}

fn draw_page(page: &Page, image_xobjects: &[(String, Ref)]) -> Vec<u8> {
    let mut content = Content::new();
    for op in &page.ops {
        match op {
            DrawOp::Text { x, y, size, font, color, text } => {
                content.set_fill_rgb(color.0, color.1, color.2);
                show_text(&mut content, *x, *y, *size, *font, text);
            }
            DrawOp::Line { x1, y1, x2, y2, width, color } => {
                content.set_stroke_rgb(color.0, color.1, color.2);
                content.set_line_width(*width);
                content.move_to(*x1, PAGE_HEIGHT - y1);
                content.line_to(*x2, PAGE_HEIGHT - y2);
                content.stroke();
            }
            DrawOp::FillRect { x, y, w, h, color } => {
                content.set_fill_rgb(color.0, color.1, color.2);
                content.rect(*x, PAGE_HEIGHT - y - h, *w, *h);
                content.fill_nonzero();
            }
            DrawOp::Image { id, x, y, w, h } => {
                let Some((name, _)) = image_xobjects.get(*id) else {
                    continue;
                };
                content.save_state();
                content.transform([*w, 0.0, 0.0, *h, *x, PAGE_HEIGHT - y - h]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
            DrawOp::Placeholder { x, y, w, h, caption } => {
                content.set_fill_gray(0.87);
                content.rect(*x, PAGE_HEIGHT - y - h, *w, *h);
                content.fill_nonzero();
                content.set_stroke_gray(0.6);
                content.set_line_width(0.5);
                content.rect(*x, PAGE_HEIGHT - y - h, *w, *h);
                content.stroke();
                let size = 10.0;
                let tx = x + (w - text_width(caption, size, Font::Regular)) / 2.0;
                content.set_fill_gray(0.4);
                show_text(&mut content, tx, y + h / 2.0 + size / 3.0, size, Font::Regular, caption);
            }
        }
    }
    content.finish().as_slice().to_vec()
}

fn show_text(content: &mut Content, x: f32, y: f32, size: f32, font: Font, text: &str) {
    let face = match font {
        Font::Regular => REGULAR,
        Font::Bold => BOLD,
    };
    content.begin_text();
    content.set_font(face, size);
    content.next_line(x, PAGE_HEIGHT - y);
    content.show(Str(&to_winansi(text)));
    content.end_text();
}

/// ASCII and Latin-1 map straight through; anything else becomes `?`.
fn to_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            0x2013 => 0x96,
            0x2014 => 0x97,
            0x2022 => 0x95,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::layout::{ImageSlot, PagePlanner};

    #[test]
    fn writes_one_pdf_page_per_planned_page() {
        let mut planner = PagePlanner::new();
        planner.add_header("Client Report", "Asha Verma", "Created 2025-01-01", ImageSlot::Unavailable);
        planner.add_section("Personal Information");
        planner.add_row("Client Name", "Asha");
        planner.new_page();
        planner.add_footers("2025-01-01 10:00", "Asha Verma");

        let bytes = render_pdf(planner.pages(), &[], "Asha Verma");
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert_eq!(text.matches("/Type /Page\n").count() + text.matches("/Type /Page ").count(), 2);
        assert!(text.contains("/Helvetica-Bold"));
    }

    #[test]
    fn images_become_xobjects() {
        let img = EmbeddedImage {
            encoding: ImageEncoding::FlateRgb,
            width: 1,
            height: 1,
            data: miniz_oxide::deflate::compress_to_vec_zlib(&[255, 0, 0], 6),
        };
        let mut planner = PagePlanner::new();
        planner.add_header("Client Report", "Asha", "", ImageSlot::Ready { id: 0, width: 1, height: 1 });
        let bytes = render_pdf(planner.pages(), &[img], "Asha");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Image"));
        assert!(text.contains("/Im1"));
    }

    #[test]
    fn non_latin_text_is_replaced() {
        assert_eq!(to_winansi("Zoë – ✓"), vec![b'Z', b'o', 0xEB, b' ', 0x96, b' ', b'?']);
    }
}
