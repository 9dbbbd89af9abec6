use std::time::{Duration, Instant};

use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Spans,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Yes/no dialog drawn over the current screen.
pub fn render_confirm<B: Backend>(frame: &mut Frame<B>, title: &str, lines: &[&str]) {
    let area = centered_rect(50, 25, frame.size());
    let mut text: Vec<Spans> = vec![Spans::from("")];
    text.extend(lines.iter().map(|l| Spans::from(*l)));
    text.push(Spans::from(""));
    text.push(Spans::from("<Y> Yes  <N> No"));

    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// Transient message shown in the top-right corner until it expires.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    shown_at: Instant,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= NOTIFICATION_TTL
    }
}

pub fn render_notification<B: Backend>(frame: &mut Frame<B>, notification: &Notification) {
    let size = frame.size();
    let width = (notification.message.chars().count() as u16 + 4).clamp(20, size.width.saturating_sub(2).max(20));
    let area = Rect {
        x: size.width.saturating_sub(width + 1),
        y: 1,
        width: width.min(size.width),
        height: 3.min(size.height),
    };
    let (title, color) = match notification.kind {
        NotificationKind::Info => ("Info", Color::Cyan),
        NotificationKind::Success => ("Done", Color::Green),
        NotificationKind::Error => ("Error", Color::Red),
    };
    let toast = Paragraph::new(notification.message.as_str())
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().title(title).borders(Borders::ALL).border_style(Style::default().fg(color)));

    frame.render_widget(Clear, area);
    frame.render_widget(toast, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_sits_in_the_middle() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 50, outer);
        assert_eq!((inner.x, inner.width), (25, 50));
        assert_eq!((inner.y, inner.height), (10, 20));
    }

    #[test]
    fn fresh_notifications_are_visible() {
        let n = Notification::error("Network error");
        assert!(!n.is_expired());
        assert_eq!(n.kind, NotificationKind::Error);
    }
}
