use tui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::capture::{CaptureInput, CaptureState, CapturedImage};

/// Camera controls plus the optional file-path prompt for uploads.
pub fn render_capture_panel<B: Backend>(
    f: &mut Frame<B>,
    area: Rect,
    title: &str,
    capture: &CaptureInput,
    current: Option<&str>,
    upload_path: Option<&str>,
) {
    let mut lines = vec![Spans::from(vec![
        Span::styled("Current: ", Style::default().fg(Color::Gray)),
        Span::raw(current.unwrap_or("none").to_string()),
    ])];
    lines.push(Spans::from(""));

    if let Some(path) = upload_path {
        lines.push(Spans::from(vec![
            Span::styled("Image file: ", Style::default().fg(Color::Yellow)),
            Span::styled(format!("{}|", path), Style::default().add_modifier(Modifier::BOLD)),
        ]));
        lines.push(Spans::from("Enter - Load file | Esc - Cancel"));
    } else {
        match capture.state() {
            CaptureState::Idle => {
                lines.push(Spans::from("Camera off"));
                lines.push(Spans::from("C - Start camera | U - Upload file"));
            }
            CaptureState::Live { facing } => {
                lines.push(Spans::from(vec![
                    Span::styled("● Live ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                    Span::raw(format!("({} camera)", facing)),
                ]));
                lines.push(Spans::from("Space - Capture | F - Switch camera | Esc - Stop"));
            }
            CaptureState::Captured { image } => {
                lines.push(Spans::from(vec![
                    Span::styled("Preview: ", Style::default().fg(Color::Green)),
                    Span::raw(describe(image)),
                ]));
                lines.push(Spans::from("Enter - Use this image | R - Retake"));
            }
        }
    }

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(panel, area);
}

pub fn describe(image: &CapturedImage) -> String {
    match image.dimensions {
        Some((width, height)) => format!("{} ({}x{}, {} KB)", image.file_name, width, height, image.size_kb()),
        None => format!("{} ({} KB)", image.file_name, image.size_kb()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_uses_header_dimensions() {
        let mut buf = Vec::new();
        image::RgbImage::new(8, 6)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .unwrap();
        let captured = CapturedImage::jpeg("photo", buf);
        assert!(describe(&captured).starts_with("photo.jpg (8x6, "));

        let broken = CapturedImage::jpeg("panFront", vec![0xFF, 0xD8]);
        assert_eq!(describe(&broken), "panFront.jpg (1 KB)");
    }
}
