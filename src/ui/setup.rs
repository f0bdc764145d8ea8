//! API key setup screen.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::config::ColorConfig;
use crate::flow::{SetupFlow, SetupStatus};

use super::gradient::{gradient_color, gradient_spans};

const DIALOG_WIDTH: u16 = 64;
const DIALOG_HEIGHT: u16 = 15;

/// Render the setup screen centered in `area`.
pub fn render_setup(
    f: &mut Frame,
    area: Rect,
    setup: &SetupFlow,
    colors: &ColorConfig,
    cursor_visible: bool,
) {
    let (start, end) = colors.chat_gradient();
    let width = DIALOG_WIDTH.min(area.width);
    let height = DIALOG_HEIGHT.min(area.height);
    let dialog_area = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );

    f.render_widget(Clear, dialog_area);

    let status = setup.status();
    let border_color = match status {
        SetupStatus::Saved => ColorConfig::to_color(&colors.success),
        _ if setup.error_message().is_some() => ColorConfig::to_color(&colors.error),
        _ => gradient_color(start, end, 0.5),
    };
    let block = Block::default()
        .title(Line::from(gradient_spans(" Gemini API Key ", start, end)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(Color::Rgb(25, 25, 35)));
    let inner = block.inner(dialog_area);
    f.render_widget(block, dialog_area);

    let chunks = Layout::vertical([
        Constraint::Length(2), // Prompt
        Constraint::Length(3), // Key field
        Constraint::Length(1), // Error
        Constraint::Length(2), // Buttons
        Constraint::Length(2), // Footer
        Constraint::Min(0),
        Constraint::Length(1), // Key hints
    ])
    .split(inner);

    f.render_widget(
        Paragraph::new("Enter your Google AI Studio API key:")
            .style(Style::default().fg(Color::Gray)),
        chunks[0],
    );

    // Key field, masked unless toggled visible
    let shown = setup.display_candidate();
    let split = shown
        .char_indices()
        .nth(setup.candidate().cursor())
        .map(|(i, _)| i)
        .unwrap_or(shown.len());
    let (before, after) = shown.split_at(split);
    let cursor = if cursor_visible && setup.is_editable() { "▎" } else { " " };
    let field = if shown.is_empty() {
        Line::from(vec![
            Span::styled(cursor, Style::default().fg(Color::Cyan)),
            Span::styled("Enter your API key", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(vec![
            Span::raw(before.to_string()),
            Span::styled(cursor, Style::default().fg(Color::Cyan)),
            Span::raw(after.to_string()),
        ])
    };
    let eye = if setup.is_visible() { " hide " } else { " show " };
    let field_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Rgb(80, 80, 100)))
        .title(
            ratatui::widgets::block::Title::from(Span::styled(
                eye,
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(Alignment::Right),
        );
    f.render_widget(
        Paragraph::new(field)
            .style(Style::default().fg(Color::White))
            .block(field_block),
        chunks[1],
    );

    if let Some(error) = setup.error_message() {
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("⚠ ", Style::default().fg(ColorConfig::to_color(&colors.error))),
                Span::styled(error, Style::default().fg(ColorConfig::to_color(&colors.error))),
            ])),
            chunks[2],
        );
    }

    let save_style = if setup.can_submit() || status != SetupStatus::Idle {
        Style::default()
            .fg(Color::White)
            .bg(Color::Rgb(66, 133, 244))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray).bg(Color::Rgb(50, 50, 60))
    };
    let save_label = match status {
        SetupStatus::Saved => format!(" ✓ {} ", status.button_label()),
        _ => format!(" {} ", status.button_label()),
    };
    let buttons = Line::from(vec![
        Span::styled(save_label, save_style),
        Span::raw("  "),
        Span::styled(
            " Clear ",
            Style::default().fg(Color::White).bg(Color::Rgb(60, 60, 70)),
        ),
    ]);
    f.render_widget(
        Paragraph::new(vec![Line::from(""), buttons]).alignment(Alignment::Center),
        chunks[3],
    );

    let footer_color = if status == SetupStatus::Saved {
        ColorConfig::to_color(&colors.success)
    } else {
        Color::DarkGray
    };
    f.render_widget(
        Paragraph::new(vec![Line::from(""), Line::from(status.footer())])
            .alignment(Alignment::Center)
            .style(Style::default().fg(footer_color)),
        chunks[4],
    );

    let hints = Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
        Span::raw(" Save "),
        Span::styled("[^V]", Style::default().fg(Color::Yellow)),
        Span::raw(" Show "),
        Span::styled("[^L]", Style::default().fg(Color::Yellow)),
        Span::raw(" Clear "),
        Span::styled("[^O]", Style::default().fg(Color::Yellow)),
        Span::raw(" Get key "),
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ]);
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::Gray)),
        chunks[6],
    );
}
