use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use guia_core::{Message, Sender};
use crate::app::App;

const TITLE: &str = " Assistente Virtual - Guia Prático ";
const COPIED_BADGE: &str = " Copiado para a área de transferência! ";
const INPUT_PLACEHOLDER: &str = "Digite sua pergunta aqui...";
const INPUT_WAITING: &str = "Aguardando a resposta...";

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            current_text.push(c);
            continue;
        }
        chars.next();

        let mut bold_text = String::new();
        let mut found_close = false;
        while let Some(c) = chars.next() {
            if c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                found_close = true;
                break;
            }
            bold_text.push(c);
        }

        if found_close && !bold_text.is_empty() {
            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
            }
            spans.push(Span::styled(bold_text, Style::default().add_modifier(Modifier::BOLD)));
        } else {
            // unterminated: keep the asterisks
            current_text.push_str("**");
            current_text.push_str(&bold_text);
            if found_close {
                current_text.push_str("**");
            }
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    Line::from(spans)
}

fn user_lines(message: &Message, lines: &mut Vec<Line<'static>>) {
    let style = Style::default().fg(Color::Cyan);
    lines.push(
        Line::from(Span::styled("Você", style.add_modifier(Modifier::BOLD)))
            .alignment(Alignment::Right),
    );
    for line in message.text.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), style)).alignment(Alignment::Right));
    }
}

fn bot_lines(message: &Message, lines: &mut Vec<Line<'static>>) {
    lines.push(Line::from(Span::styled(
        "Assistente",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));
    for line in message.text.lines() {
        lines.push(parse_markdown_line(line));
    }

    if message.sources.is_empty() {
        return;
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Fontes:",
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
    )));
    for source in &message.sources {
        lines.push(Line::from(vec![
            Span::styled("  • ", Style::default().fg(Color::Magenta)),
            Span::styled(source.label().to_string(), Style::default().add_modifier(Modifier::BOLD)),
        ]));
        if source.label() != source.uri {
            lines.push(Line::from(Span::styled(
                format!("    {}", source.uri),
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            )));
        }
    }
}

/// Every chat line, in order, including the typing indicator when busy
pub(crate) fn chat_lines(messages: &[Message], busy: bool, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for message in messages {
        match message.sender {
            Sender::User => user_lines(message, &mut lines),
            Sender::Bot => bot_lines(message, &mut lines),
        }
        lines.push(Line::default());
    }

    if busy {
        lines.push(Line::from(Span::styled(
            "Assistente",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("Digitando{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let badge_width = if app.controller.is_copied() {
        COPIED_BADGE.chars().count() as u16
    } else {
        0
    };
    let [title_area, badge_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(badge_width),
    ])
    .areas(area);

    let title = Line::from(vec![
        Span::styled(TITLE, Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);
    frame.render_widget(
        Paragraph::new(title).style(Style::default().bg(Color::DarkGray)),
        title_area,
    );

    if badge_width > 0 {
        let badge = Paragraph::new(COPIED_BADGE)
            .style(Style::default().bg(Color::Green).fg(Color::Black).bold());
        frame.render_widget(badge, badge_area);
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" FFM · {} ", app.model));
    let inner = block.inner(area);

    let lines = chat_lines(
        app.controller.conversation().messages(),
        app.controller.is_busy(),
        app.animation_frame,
    );
    let chat = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });

    let total_lines = u16::try_from(chat.line_count(inner.width)).unwrap_or(u16::MAX);
    app.update_scroll_bounds(total_lines, inner.height);

    frame.render_widget(chat.block(block).scroll((app.chat_scroll, 0)), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let enabled = app.input_enabled();
    let border_color = if enabled { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Pergunta ");

    let pending = app.controller.pending_input();

    if !enabled {
        let waiting = Paragraph::new(INPUT_WAITING)
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(block);
        frame.render_widget(waiting, area);
        return;
    }

    if pending.is_empty() {
        let placeholder = Paragraph::new(INPUT_PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        frame.set_cursor_position((area.x + 1, area.y + 1));
        return;
    }

    // Horizontal scroll keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 || cursor_pos < inner_width {
        0
    } else {
        cursor_pos - inner_width + 1
    };

    let visible_text: String = pending
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    let cursor_x = (cursor_pos - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let disabled_style = Style::default().bg(Color::Black).fg(Color::DarkGray);

    let hint = |key: &'static str, label: &'static str, enabled: bool| {
        [
            Span::styled(key, if enabled { key_style } else { disabled_style }),
            Span::styled(label, if enabled { label_style } else { disabled_style }),
        ]
    };

    let mode = if app.controller.is_busy() {
        Span::styled(" AGUARDE ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        Span::styled(" PRONTO ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut spans = vec![mode, Span::styled(" ", label_style)];
    spans.extend(hint(" Enter ", " enviar ", app.controller.can_submit()));
    spans.extend(hint(" Ctrl+S ", " compartilhar ", app.controller.can_share()));
    spans.extend(hint(" PgUp/PgDn ", " rolar ", true));
    spans.extend(hint(" Esc ", " sair ", true));

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
