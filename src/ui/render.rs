use ratatui::{
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation, Wrap},
    Frame,
};

use crate::app::{App, Screen, ScrollState};
use crate::config::{ColorConfig, Config};
use crate::flow::ChatFlow;
use crate::message::Role;

use super::gradient::{gradient_block_with_status, gradient_color};
use super::setup::render_setup;
use super::text::wrap_text;

/// Shown after the last message while a reply is pending.
pub const AWAITING_INDICATOR: &str = "Gemini is thinking...";

/// Main UI rendering function.
pub fn ui(f: &mut Frame, app: &mut App, config: &Config) {
    let bg_color = Color::Rgb(20, 20, 25);

    let background = Block::default().style(Style::default().bg(Color::Black));
    f.render_widget(background, f.size());

    // Inner area with margin to create thick border (2 chars on sides, 1 on top/bottom)
    let inner_area = f.size().inner(&Margin {
        horizontal: 2,
        vertical: 1,
    });
    f.render_widget(Block::default().style(Style::default().bg(bg_color)), inner_area);

    let cursor_visible = app.cursor_visible;
    match &app.screen {
        Screen::Setup(setup) => render_setup(f, inner_area, setup, &config.colors, cursor_visible),
        Screen::Chat(chat) => {
            render_chat(f, inner_area, chat, &mut app.scroll, &config.colors, cursor_visible)
        }
    }
}

/// Render the chat screen into `area`.
pub fn render_chat(
    f: &mut Frame,
    area: Rect,
    chat: &ChatFlow,
    scroll: &mut ScrollState,
    colors: &ColorConfig,
    cursor_visible: bool,
) {
    let (chat_start, chat_end) = colors.chat_gradient();
    let (input_start, input_end) = colors.input_gradient();
    let error_height = if chat.error_message().is_some() { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),               // Transcript
            Constraint::Length(error_height), // Error banner
            Constraint::Length(3),            // Input box
            Constraint::Length(1),            // Key hints
        ])
        .split(area);

    let text_width = chunks[0].width.saturating_sub(4) as usize;
    let mut items: Vec<ListItem> = Vec::new();
    for msg in chat.transcript() {
        if !items.is_empty() {
            items.push(ListItem::new(Line::from("")));
        }
        let style = match msg.role {
            Role::User => Style::default().fg(ColorConfig::to_color(&colors.user)),
            Role::Assistant => Style::default().fg(ColorConfig::to_color(&colors.assistant)),
        };

        let prefix = msg.role.prefix();
        let indent = " ".repeat(prefix.chars().count());
        let wrapped = wrap_text(&msg.content, text_width.saturating_sub(prefix.len()).max(1));

        for (i, line) in wrapped.into_iter().enumerate() {
            if i == 0 {
                items.push(ListItem::new(Line::from(vec![
                    Span::styled(prefix, style.add_modifier(Modifier::BOLD)),
                    Span::styled(line, style),
                ])));
            } else {
                items.push(ListItem::new(Line::from(vec![
                    Span::raw(indent.clone()),
                    Span::styled(line, style),
                ])));
            }
        }
        items.push(ListItem::new(Line::from(Span::styled(
            msg.time_label(),
            Style::default().fg(Color::DarkGray),
        ))));
    }

    if chat.is_awaiting() {
        items.push(ListItem::new(Line::from("")));
        items.push(ListItem::new(Line::from(Span::styled(
            AWAITING_INDICATOR,
            Style::default()
                .fg(gradient_color(chat_start, chat_end, 0.5))
                .add_modifier(Modifier::ITALIC),
        ))));
    }

    let (status_text, status_color) = if !chat.has_credential() {
        ("● No API Key", ColorConfig::to_color(&colors.error))
    } else if chat.is_awaiting() {
        ("● Waiting...", Color::Rgb(100, 200, 255))
    } else {
        ("● Ready", ColorConfig::to_color(&colors.success))
    };

    // Slice the rows here; while following, the window ends at the newest row
    let total_rows = items.len();
    let visible_rows = chunks[0].height.saturating_sub(2) as usize;
    scroll.update(total_rows, visible_rows);
    let items: Vec<ListItem> = items
        .into_iter()
        .skip(scroll.offset)
        .take(visible_rows)
        .collect();

    let transcript = List::new(items).block(gradient_block_with_status(
        " Gemini Chat ",
        status_text,
        status_color,
        chat_start,
        chat_end,
    ));
    f.render_widget(transcript, chunks[0]);

    let scroll_position = if scroll.max_offset() > 0 {
        scroll.offset as f32 / scroll.max_offset() as f32
    } else {
        1.0
    };
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("▲"))
        .end_symbol(Some("▼"))
        .track_symbol(Some("░"))
        .thumb_symbol("█")
        .style(Style::default().fg(gradient_color(chat_start, chat_end, scroll_position)));
    f.render_stateful_widget(
        scrollbar,
        chunks[0].inner(&Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scroll.scrollbar,
    );

    if let Some(error) = chat.error_message() {
        let banner = Paragraph::new(Line::from(vec![
            Span::styled("⚠ ", Style::default().fg(ColorConfig::to_color(&colors.error))),
            Span::styled(error, Style::default().fg(ColorConfig::to_color(&colors.error))),
        ]));
        f.render_widget(banner, chunks[1]);
    }

    let cursor_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::SLOW_BLINK);
    let cursor_char = if cursor_visible { "▎" } else { " " };
    let placeholder_style = Style::default().fg(Color::DarkGray);

    let input_text = if !chat.has_credential() {
        Line::from(Span::styled("Set an API key to start chatting", placeholder_style))
    } else if chat.is_awaiting() {
        Line::from(Span::styled("Waiting for response...", placeholder_style))
    } else if chat.draft().as_str().is_empty() {
        Line::from(vec![
            Span::styled(cursor_char, cursor_style),
            Span::styled("Send a message...", placeholder_style),
        ])
    } else {
        let (before, after) = chat.draft().split_at_cursor();
        Line::from(vec![
            Span::raw(before),
            Span::styled(cursor_char, cursor_style),
            Span::raw(after),
        ])
    };

    let input_block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(gradient_color(input_start, input_end, 0.5)))
        .style(Style::default().bg(Color::Rgb(30, 30, 35)));
    let input = Paragraph::new(input_text)
        .style(Style::default().fg(Color::White))
        .block(input_block)
        .wrap(Wrap { trim: false });
    f.render_widget(input, chunks[2]);

    let hints = Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
        Span::raw(" Send  "),
        Span::styled("[Ctrl+B]", Style::default().fg(Color::Yellow)),
        Span::raw(" Sign out  "),
        Span::styled("[↑/↓]", Style::default().fg(Color::Yellow)),
        Span::raw(" Scroll  "),
        Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ]);
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::Gray)),
        chunks[3],
    );
}
