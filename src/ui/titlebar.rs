use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::state::AppState;
use crate::timer::WARNING_THRESHOLD_SECS;

pub fn draw_titlebar(f: &mut Frame, area: Rect, state: &AppState) {
    let session = &state.session;
    let remaining = session.remaining_seconds();
    let timer_label = format!(" {} ", session.timer_display());

    let timer_span = if session.is_active() && remaining <= WARNING_THRESHOLD_SECS {
        Span::styled(
            timer_label.clone(),
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(timer_label.clone(), Style::default().fg(Color::Rgb(200, 200, 120)))
    };

    let title_text = format!("[ {} ]", session.title());
    let title_len = title_text.chars().count();
    let timer_len = timer_label.chars().count();
    let available = area.width as usize;
    let center_pad = available.saturating_sub(title_len) / 2;
    let right_pad = available.saturating_sub(center_pad + title_len + timer_len);

    let line = Line::from(vec![
        Span::raw(" ".repeat(center_pad)),
        Span::styled(
            title_text,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(right_pad)),
        timer_span,
    ]);

    let widget = Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .alignment(Alignment::Left);
    f.render_widget(widget, area);
}
