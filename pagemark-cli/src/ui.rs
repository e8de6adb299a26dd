//! Terminal UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use pagemark_core::{AnnotationStore, CursorHint, Mode, NodeId, Tool};

use crate::view::{Focus, Viewer};

// Catppuccin Mocha colors
const BASE: Color = Color::Rgb(30, 30, 46);
const SURFACE0: Color = Color::Rgb(49, 50, 68);
const SURFACE1: Color = Color::Rgb(69, 71, 90);
const TEXT: Color = Color::Rgb(205, 214, 244);
const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
const RED: Color = Color::Rgb(243, 139, 168);
const YELLOW: Color = Color::Rgb(249, 226, 175);
const GREEN: Color = Color::Rgb(166, 227, 161);
const BLUE: Color = Color::Rgb(137, 180, 250);
const MAUVE: Color = Color::Rgb(203, 166, 247);
const TEAL: Color = Color::Rgb(148, 226, 213);
const PINK: Color = Color::Rgb(245, 194, 231);

pub fn draw<S: AnnotationStore>(frame: &mut Frame, viewer: &Viewer<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_title_bar(frame, viewer, chunks[0]);
    draw_main_area(frame, viewer, chunks[1]);
    draw_status_bar(frame, viewer, chunks[2]);

    if viewer.show_help {
        draw_help(frame);
    }
}

fn draw_title_bar<S: AnnotationStore>(frame: &mut Frame, viewer: &Viewer<S>, area: Rect) {
    let group_count = viewer.app.stored_groups().len();
    let title_text = format!(
        " Pagemark - {} [{} highlight{}]",
        viewer.title,
        group_count,
        if group_count == 1 { "" } else { "s" }
    );

    let title_bar = Paragraph::new(title_text).style(Style::default().fg(TEXT).bg(SURFACE0));

    frame.render_widget(title_bar, area);
}

fn draw_main_area<S: AnnotationStore>(frame: &mut Frame, viewer: &Viewer<S>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Pages
            Constraint::Length(32), // Sidebar
        ])
        .split(area);

    draw_pages(frame, viewer, chunks[0]);
    draw_sidebar(frame, viewer, chunks[1]);
}

fn draw_pages<S: AnnotationStore>(frame: &mut Frame, viewer: &Viewer<S>, area: Rect) {
    let border_style = if viewer.focus == Focus::Pages {
        Style::default().fg(BLUE)
    } else {
        Style::default().fg(SUBTEXT0)
    };

    let mode_indicator = match (viewer.app.session.mode, viewer.selection_start.is_some()) {
        (_, true) => " [SELECT]",
        (Mode::Highlighting, false) => " [HIGHLIGHT]",
        (Mode::Erasing, false) => " [ERASE]",
        (Mode::Idle, false) => "",
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!("Pages{}", mode_indicator));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let selection = viewer.selection_bounds();
    let cursor = viewer.cursor.cursor();
    let lines: Vec<Line> = viewer
        .lines()
        .iter()
        .enumerate()
        .map(|(row, &line)| render_line(viewer, row, line, selection, cursor))
        .collect();

    // Keep the cursor row on screen
    let visible_height = inner.height as usize;
    let scroll_offset = if cursor.0 >= visible_height {
        cursor.0 - visible_height + 1
    } else {
        0
    };

    let paragraph = Paragraph::new(lines).scroll((scroll_offset as u16, 0));
    frame.render_widget(paragraph, inner);
}

/// Style every char of a line from the decoration it sits in, then overlay
/// the selection and the cursor
fn render_line<'a, S: AnnotationStore>(
    viewer: &Viewer<S>,
    row: usize,
    line: NodeId,
    selection: Option<((usize, usize), (usize, usize))>,
    cursor: (usize, usize),
) -> Line<'a> {
    let dom = &viewer.app.dom;
    let applier = viewer.app.applier();
    let mut spans: Vec<Span> = Vec::new();
    let mut col = 0;

    for text in dom.text_nodes(line) {
        let background = applier
            .enclosing(dom, text)
            .first()
            .and_then(|&d| applier.color_of(dom, d))
            .map(|name| highlight_color(&name));

        for ch in dom.text(text).unwrap_or_default().chars() {
            let ch = if ch == '\n' || ch == '\t' { ' ' } else { ch };
            let mut style = Style::default().fg(TEXT);
            if let Some(bg) = background {
                style = style.fg(BASE).bg(bg);
            }
            if let Some((start, end)) = selection {
                if (row, col) >= start && (row, col) < end {
                    style = style.fg(TEXT).bg(SURFACE1).add_modifier(Modifier::BOLD);
                }
            }
            if (row, col) == cursor && viewer.focus == Focus::Pages {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(ch.to_string(), style));
            col += 1;
        }
    }

    // Cursor parked past the last char
    if cursor == (row, col) && viewer.focus == Focus::Pages {
        spans.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
    }

    Line::from(spans)
}

fn draw_sidebar<S: AnnotationStore>(frame: &mut Frame, viewer: &Viewer<S>, area: Rect) {
    let sidebar_style = if viewer.focus == Focus::Sidebar {
        Style::default().fg(BLUE)
    } else {
        Style::default().fg(SUBTEXT0)
    };

    let groups = viewer.app.stored_groups();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(sidebar_style)
        .title(format!("Highlights ({})", groups.len()));

    let items: Vec<ListItem> = groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let selected = i == viewer.sidebar_selected;
            let marker = if selected { ">" } else { " " };
            let swatch = highlight_color(group.color_or(&viewer.app.config().fallback_color));

            let preview: String = group
                .anchors
                .iter()
                .map(|a| a.text_snippet.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(22)
                .collect();

            let style = if selected {
                Style::default().fg(TEXT).bg(SURFACE1)
            } else {
                Style::default().fg(TEXT)
            };

            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!("{} ", marker), style),
                    Span::styled("  ", Style::default().bg(swatch)),
                    Span::styled(format!(" \"{}\"", preview), style),
                ]),
                Line::from(Span::styled(
                    format!("    {} anchor{}", group.anchors.len(), if group.anchors.len() == 1 { "" } else { "s" }),
                    style.fg(SUBTEXT0),
                )),
            ])
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

fn draw_status_bar<S: AnnotationStore>(frame: &mut Frame, viewer: &Viewer<S>, area: Rect) {
    let session = &viewer.app.session;
    let mode_str = match session.mode {
        Mode::Idle => "IDLE",
        Mode::Highlighting => "HIGHLIGHT",
        Mode::Erasing => "ERASE",
    };
    let hint = match viewer.cursor_hint() {
        CursorHint::Crosshair => "+",
        CursorHint::Pointer => "*",
        CursorHint::Text => "I",
        CursorHint::Default => "-",
    };
    let color = session.color(Tool::Highlight).unwrap_or_default();

    let status = viewer.status_message.as_deref().unwrap_or("");
    let help_hint = "1 highlight | 2 erase | v select | Enter apply | c colour | ? help";

    let status_text = format!(
        " {} {} | {} | {}",
        mode_str,
        hint,
        color,
        if status.is_empty() { help_hint } else { status },
    );

    let status_bar = Paragraph::new(status_text).style(Style::default().fg(SUBTEXT0).bg(SURFACE0));

    frame.render_widget(status_bar, area);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(60, 22, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Help (press any key to close)");

    let help_text = vec![
        Line::from(Span::styled("Navigation", Style::default().fg(MAUVE).add_modifier(Modifier::BOLD))),
        Line::from("  h/j/k/l  Move cursor"),
        Line::from("  w/b      Next/previous word"),
        Line::from("  g/G      Go to top/bottom"),
        Line::from("  Tab      Toggle pages/sidebar"),
        Line::from(""),
        Line::from(Span::styled("Tools", Style::default().fg(MAUVE).add_modifier(Modifier::BOLD))),
        Line::from("  1        Toggle highlight mode"),
        Line::from("  2        Toggle erase mode"),
        Line::from("  3/4      Draw/text (not available)"),
        Line::from("  c        Next highlight colour"),
        Line::from(""),
        Line::from(Span::styled("Highlights", Style::default().fg(MAUVE).add_modifier(Modifier::BOLD))),
        Line::from("  v        Start selection"),
        Line::from("  Enter    Highlight selection / erase under cursor"),
        Line::from("  d        Erase highlight selected in sidebar"),
        Line::from("  X        Erase all highlights in this document"),
        Line::from("  R        Re-render pages and restore highlights"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(SUBTEXT0))),
    ];

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

/// Terminal colour for a stored colour name
fn highlight_color(name: &str) -> Color {
    match name {
        "yellow" => YELLOW,
        "greenyellow" | "green" => GREEN,
        "cyan" => TEAL,
        "magenta" => PINK,
        "red" => RED,
        "blue" => BLUE,
        other => other.parse().unwrap_or(YELLOW),
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
