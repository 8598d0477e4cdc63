use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use crate::app::App;
use crate::source::render_source;
use crate::transcript::{ChatMessage, ChatRole, Entry, Transcript, PLACEHOLDER_TEXT};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Quick-RAG Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.client.endpoint(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Styled lines for the whole transcript. Placeholders show the spinner
/// frame in front of the "Thinking..." text.
pub fn transcript_lines(transcript: &Transcript, spinner_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for entry in transcript.entries() {
        match entry {
            Entry::Message(message) => push_message(&mut lines, message),
            Entry::Placeholder(_) => {
                lines.push(role_line(ChatRole::Bot));
                let spinner = SPINNER[spinner_frame as usize % SPINNER.len()];
                lines.push(Line::from(Span::styled(
                    format!("{} {}", spinner, PLACEHOLDER_TEXT),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
                lines.push(Line::default());
            }
        }
    }

    lines
}

fn role_line(role: ChatRole) -> Line<'static> {
    match role {
        ChatRole::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        ChatRole::Bot => Line::from(Span::styled(
            "Bot:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

fn push_message(lines: &mut Vec<Line<'static>>, message: &ChatMessage) {
    lines.push(role_line(message.role));

    let text_style = match message.role {
        ChatRole::User => Style::default().fg(Color::Cyan),
        ChatRole::Bot if message.failed => Style::default().fg(Color::Red),
        ChatRole::Bot => Style::default(),
    };
    for line in message.text.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), text_style)));
    }

    if message.role == ChatRole::Bot && !message.sources.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sources:",
            Style::default().add_modifier(Modifier::BOLD),
        )));

        for source in &message.sources {
            let display = render_source(source);
            lines.push(Line::from(vec![
                Span::styled("  • ", Style::default().fg(Color::Magenta)),
                Span::raw(display.meta),
            ]));
            if let Some(preview) = display.preview {
                lines.push(Line::from(Span::styled(
                    format!("    {}", preview),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }

    lines.push(Line::default());
}

/// Word-wrap one styled line into rows of at most `width` characters.
/// Words longer than a row are split. Spaces at a row break are dropped;
/// leading indentation of the first row is kept.
pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let cells: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| {
            let style = line.style.patch(span.style);
            span.content.chars().map(move |c| (c, style))
        })
        .collect();

    let mut rows: Vec<Vec<(char, Style)>> = Vec::new();
    let mut row: Vec<(char, Style)> = Vec::new();
    let mut start = 0;

    while start < cells.len() {
        // Next token is a run of spaces or a run of non-spaces
        let is_space = cells[start].0 == ' ';
        let end = cells[start..]
            .iter()
            .position(|(c, _)| (*c == ' ') != is_space)
            .map_or(cells.len(), |n| start + n);
        let token = &cells[start..end];

        if is_space {
            if row.is_empty() {
                if rows.is_empty() {
                    row.extend(token.iter().take(width));
                }
            } else if row.len() + token.len() <= width {
                row.extend_from_slice(token);
            } else {
                rows.push(std::mem::take(&mut row));
            }
        } else {
            if !row.is_empty() && row.len() + token.len() > width {
                rows.push(std::mem::take(&mut row));
            }
            for cell in token {
                if row.len() == width {
                    rows.push(std::mem::take(&mut row));
                }
                row.push(*cell);
            }
        }

        start = end;
    }

    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }

    rows.into_iter().map(row_to_line).collect()
}

fn row_to_line(mut row: Vec<(char, Style)>) -> Line<'static> {
    while row.last().is_some_and(|(c, _)| *c == ' ') {
        row.pop();
    }

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut current: Option<Style> = None;

    for (c, style) in row {
        if current.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut text), current.unwrap_or_default()));
        }
        current = Some(style);
        text.push(c);
    }
    if let Some(style) = current {
        spans.push(Span::styled(text, style));
    }

    Line::from(spans)
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let pending = app.transcript.pending_count();
    let title = if pending > 0 {
        format!(" Chat ({} waiting) ", pending)
    } else {
        " Chat ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    let inner_area = block.inner(area);

    if app.transcript.is_empty() {
        let placeholder = Paragraph::new("Ask a question about your documents...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Pre-wrapped so the row count used for scrolling is exact
    let rows: Vec<Line<'static>> = transcript_lines(&app.transcript, app.animation_frame)
        .iter()
        .flat_map(|line| wrap_line(line, inner_area.width as usize))
        .collect();
    let total_lines = rows.len().min(u16::MAX as usize) as u16;
    app.update_viewport(total_lines, inner_area.height);

    let chat = Paragraph::new(Text::from(rows))
        .block(block)
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);

    if total_lines > inner_area.height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state = ScrollbarState::new(app.max_scroll as usize)
            .position(app.scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Ask ");

    // Horizontal scrolling keeps the cursor visible inside the borders
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" ↑/↓ PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
    ];
    if !app.follow_tail {
        hints.extend(vec![
            Span::styled(" ^G ", key_style),
            Span::styled(" latest ", label_style),
        ]);
    }
    hints.extend(vec![
        Span::styled(" ^U ", key_style),
        Span::styled(" clear ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let mode_style = if app.is_waiting() {
        Style::default().bg(Color::Yellow).fg(Color::Black)
    } else {
        Style::default().bg(Color::Blue).fg(Color::White)
    };
    let mode_text = if app.is_waiting() { " WAITING " } else { " READY " };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
