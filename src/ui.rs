use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, ChatRole};
use crate::content;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    if app.chat_open {
        // Page keeps the left half while the assistant panel is open
        let [page_area, chat_area] = Layout::horizontal([
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .areas(body_area);

        render_page(frame, page_area);
        render_chat_panel(app, frame, chat_area);
    } else {
        render_page(frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", content::PAGE_TITLE),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_page(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut lines: Vec<Line> = vec![
        Line::default(),
        Line::from(Span::styled(
            content::PAGE_TITLE,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::default(),
        Line::from(content::PAGE_TAGLINE).centered(),
        Line::default(),
        Line::from(Span::styled(
            content::INSTRUCTIONS_TITLE,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
    ];
    for item in content::INSTRUCTIONS {
        lines.push(Line::from(item));
    }

    let page = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(page, area);
}

fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    // Transcript on top, single-line input at the bottom
    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store transcript dimensions for scroll calculations (inner size minus borders)
    app.chat_height = transcript_area.height.saturating_sub(2);
    app.chat_width = transcript_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(format!(" {} ", content::ASSISTANT_TITLE))
        .title(
            Line::from(Span::styled(
                format!(" {} ", content::ASSISTANT_BYLINE),
                Style::default().fg(Color::DarkGray),
            ))
            .right_aligned(),
        );

    let mut lines: Vec<Line> = Vec::new();

    for msg in &app.messages {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(msg.content.as_str()));
                lines.push(Line::default());
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.loading {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, transcript_area);

    // Typing stays available while a request is in flight; only sending is gated
    let (input_title, input_border_color) = if app.loading {
        (" Ask (waiting for reply) ", Color::DarkGray)
    } else {
        (" Ask (Enter to send) ", Color::Yellow)
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(input_title);

    // Horizontal scroll keeps the cursor visible in the one-line input
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    if app.input.is_empty() {
        let placeholder = Paragraph::new(content::INPUT_PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray))
            .block(input_block);
        frame.render_widget(placeholder, input_area);
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();

        let input = Paragraph::new(visible_text)
            .style(Style::default().fg(Color::Cyan))
            .block(input_block);
        frame.render_widget(input, input_area);
    }

    frame.set_cursor_position((
        input_area.x + (cursor_pos - scroll_offset) as u16 + 1,
        input_area.y + 1,
    ));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = if app.chat_open {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White)
    };
    let mode_text = if app.chat_open { " CHAT " } else { " PAGE " };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    if app.chat_open {
        if app.loading {
            // Submission is blocked until the reply lands
            let waiting_style = Style::default().bg(Color::Black).fg(Color::DarkGray);
            spans.extend(vec![
                Span::styled(" Enter ", waiting_style),
                Span::styled(" waiting ", waiting_style),
            ]);
        } else {
            spans.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
            ]);
        }
        spans.extend(vec![
            Span::styled(" Up/Down ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" close ", label_style),
        ]);
    } else {
        spans.extend(vec![
            Span::styled(" a ", key_style),
            Span::styled(" chat ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]);
    }

    let footer = Paragraph::new(Line::from(spans));
    frame.render_widget(footer, area);
}
