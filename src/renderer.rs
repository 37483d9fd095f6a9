//! Ratatui-based table renderer for the product model tree.
//!
//! This module is purely presentational -- it takes references to application
//! data and renders into a Ratatui `Frame`.  It does **not** own any state.

use std::collections::HashSet;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::collapse::CollapsedSubmodels;
use crate::product::{AnnotatedRow, CompletionLevel, ProductType, ROW_LIMIT};
use crate::sort::{SortColumn, TreeSort};
use crate::tint::AxisTints;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const TYPE_WIDTH: usize = 16;
const ID_WIDTH: usize = 36;
const LABEL_WIDTH: usize = 36;
const VARIANT_WIDTH: usize = 12;

// ---------------------------------------------------------------------------
// View input
// ---------------------------------------------------------------------------

/// Progress of the current fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Everything one frame needs, borrowed from the app.
pub struct TableView<'a> {
    pub title: &'a str,
    pub dataset_label: &'a str,
    /// 1-based index and count of switchable datasets.
    pub dataset_position: (usize, usize),
    pub status: &'a LoadStatus,
    pub rows: &'a [AnnotatedRow],
    pub total_rows: usize,
    pub tints: &'a AxisTints,
    pub sort: TreeSort,
    /// Applied (debounced) query; drives highlighting and dimming.
    pub query: &'a str,
    pub search_input: &'a str,
    pub search_active: bool,
    pub search_pending: bool,
    pub show_hidden: bool,
    pub collapsed: &'a CollapsedSubmodels,
    pub expandable: &'a HashSet<String>,
    pub highlight_technical_id: Option<&'a str>,
    pub selected: usize,
    pub scroll_offset: usize,
    pub message: Option<&'a str>,
    pub last_error: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Color mapping
// ---------------------------------------------------------------------------

/// Map a color name (axis tints, product type tints) to a Ratatui `Color`.
fn color_from_name(name: &str) -> Color {
    match name {
        "dim" => Color::DarkGray,
        "green" => Color::Green,
        "dark_blue" => Color::Blue,
        "purple" => Color::Magenta,
        "dark_purple" => Color::Rgb(0x52, 0x26, 0x7d),
        "yellow" => Color::Yellow,
        "red" => Color::Red,
        "forest_green" => Color::Rgb(0x22, 0x8b, 0x22),
        "hot_pink" => Color::Rgb(0xff, 0x69, 0xb4),
        "coral_red" => Color::Rgb(0xff, 0x40, 0x40),
        "orange" => Color::Rgb(0xff, 0xa5, 0x00),
        "chocolate" => Color::Rgb(0xd2, 0x69, 0x1e),
        "olive_green" => Color::Rgb(0x80, 0x80, 0x00),
        "dark_cyan" => Color::Cyan,
        "blue" => Color::LightBlue,
        _ => Color::Reset,
    }
}

fn type_color(product_type: ProductType) -> Color {
    color_from_name(match product_type {
        ProductType::Model => "olive_green",
        ProductType::Submodel => "dark_cyan",
        ProductType::Variant => "blue",
    })
}

fn level_color(level: CompletionLevel) -> Color {
    match level {
        CompletionLevel::Danger => Color::Red,
        CompletionLevel::Warning => Color::Yellow,
        CompletionLevel::Primary => Color::Green,
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// Byte range of the first case-insensitive occurrence of `query_lower` in
/// `text`.
fn find_case_insensitive(text: &str, query_lower: &str) -> Option<(usize, usize)> {
    if query_lower.is_empty() {
        return None;
    }
    for (start, _) in text.char_indices() {
        let mut expected = query_lower.chars().peekable();
        for (offset, ch) in text[start..].char_indices() {
            let matched = ch.to_lowercase().all(|lower| expected.next() == Some(lower));
            if !matched {
                break;
            }
            if expected.peek().is_none() {
                return Some((start, start + offset + ch.len_utf8()));
            }
        }
    }
    None
}

/// Split `text` into spans, emphasising the first match of the query.
fn highlight_spans(text: &str, query_lower: &str, style: Style) -> Vec<Span<'static>> {
    match find_case_insensitive(text, query_lower) {
        Some((start, end)) => {
            let mut spans = Vec::with_capacity(3);
            if start > 0 {
                spans.push(Span::styled(text[..start].to_string(), style));
            }
            spans.push(Span::styled(
                text[start..end].to_string(),
                style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ));
            if end < text.len() {
                spans.push(Span::styled(text[end..].to_string(), style));
            }
            spans
        }
        None => vec![Span::styled(text.to_string(), style)],
    }
}

/// Truncate spans to `width` display columns (ending in `…` when cut) and
/// pad with spaces up to `width`.
fn fit_spans(spans: Vec<Span<'static>>, width: usize) -> Vec<Span<'static>> {
    let total: usize = spans.iter().map(|s| s.content.width()).sum();
    let mut out = Vec::with_capacity(spans.len() + 1);

    if total <= width {
        out.extend(spans);
        if total < width {
            out.push(Span::raw(" ".repeat(width - total)));
        }
        return out;
    }

    // Leave room for the ellipsis and a separating space.
    let budget = width.saturating_sub(2);
    let mut used = 0;
    for span in spans {
        if used >= budget {
            break;
        }
        let mut kept = String::new();
        for ch in span.content.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > budget {
                break;
            }
            kept.push(ch);
            used += w;
        }
        if !kept.is_empty() {
            out.push(Span::styled(kept, span.style));
        }
    }
    let filler = width.saturating_sub(used);
    if filler > 0 {
        out.push(Span::styled(
            format!("\u{2026}{}", " ".repeat(filler - 1)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    out
}

// ---------------------------------------------------------------------------
// Row lines
// ---------------------------------------------------------------------------

/// Leading cell: indentation, expand/collapse marker and type tag.
fn type_cell(row: &AnnotatedRow, view: &TableView) -> Vec<Span<'static>> {
    let marker = match row.product_type {
        ProductType::Model => "",
        ProductType::Submodel if view.expandable.contains(&row.identifier) => {
            if view.collapsed.contains(&row.identifier) {
                "\u{25b8} "
            } else {
                "\u{25be} "
            }
        }
        ProductType::Submodel => "  ",
        ProductType::Variant => "    ",
    };
    vec![
        Span::styled(format!(" {}", marker), Style::default().fg(Color::DarkGray)),
        Span::styled(
            row.product_type.as_str().to_string(),
            Style::default().fg(type_color(row.product_type)),
        ),
    ]
}

fn variant_cell(row: &AnnotatedRow) -> Vec<Span<'static>> {
    match row.complete_variant_products {
        Some(c) => vec![Span::styled(
            format!(" {} ", c.badge()),
            Style::default()
                .fg(Color::Black)
                .bg(level_color(c.level()))
                .add_modifier(Modifier::BOLD),
        )],
        None => Vec::new(),
    }
}

fn axes_cell(row: &AnnotatedRow, tints: &AxisTints, query_lower: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for axis in &row.axes {
        let style = Style::default().fg(color_from_name(tints.tint(&axis.attribute_code)));
        spans.push(Span::styled("[", style));
        spans.extend(highlight_spans(&axis.display_text(), query_lower, style));
        spans.push(Span::styled("] ", style));
    }
    spans
}

/// Build the styled line for one table row.
pub fn row_line(row: &AnnotatedRow, view: &TableView, is_selected: bool) -> Line<'static> {
    let query_lower = view.query.to_lowercase();

    let mut spans = fit_spans(type_cell(row, view), TYPE_WIDTH);
    spans.extend(fit_spans(
        highlight_spans(&row.identifier, &query_lower, Style::default().fg(Color::White)),
        ID_WIDTH,
    ));
    spans.extend(fit_spans(
        highlight_spans(&row.label, &query_lower, Style::default().fg(Color::White)),
        LABEL_WIDTH,
    ));
    spans.extend(fit_spans(variant_cell(row), VARIANT_WIDTH));
    spans.extend(axes_cell(row, view.tints, &query_lower));

    let mut line_style = Style::default();
    if !view.query.is_empty() && !row.matches {
        line_style = line_style.add_modifier(Modifier::DIM);
    }
    if view.highlight_technical_id == Some(row.technical_id.as_str()) {
        line_style = line_style.bg(Color::Rgb(0x2a, 0x3a, 0x4a));
    }
    if is_selected {
        line_style = line_style.add_modifier(Modifier::REVERSED);
    }

    Line::from(spans).style(line_style)
}

/// Plain-text rendering of a row for `--print`.
pub fn plain_row(row: &AnnotatedRow) -> String {
    let indent = "  ".repeat(row.product_type.depth());
    let mut out = format!(
        "{}{:<9} {}  {}",
        indent,
        row.product_type.as_str(),
        row.identifier,
        row.label
    );
    if let Some(c) = row.complete_variant_products {
        out.push_str(&format!("  [{}]", c.badge()));
    }
    if !row.axes.is_empty() {
        let axes: Vec<String> = row.axes.iter().map(|a| a.display_text()).collect();
        out.push_str(&format!("  {}", axes.join(", ")));
    }
    if !row.visible {
        out.push_str("  (hidden)");
    }
    out
}

// ---------------------------------------------------------------------------
// Column headers
// ---------------------------------------------------------------------------

/// Header row; sortable columns carry their key and the active direction.
fn table_column_headers(sort: TreeSort) -> Line<'static> {
    let hdr_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::UNDERLINED);
    let active_style = hdr_style.fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut spans = vec![Span::styled(
        format!(" {:<width$}", "Type", width = TYPE_WIDTH - 1),
        hdr_style,
    )];
    for (key, column) in SortColumn::ALL.iter().enumerate() {
        let width = match column {
            SortColumn::Identifier => ID_WIDTH,
            SortColumn::Label => LABEL_WIDTH,
            SortColumn::Variant => VARIANT_WIDTH,
        };
        let title = format!("{} {}{}", key + 1, column.title(), sort.indicator(*column));
        let style = if sort.column == *column {
            active_style
        } else {
            hdr_style
        };
        spans.extend(fit_spans(vec![Span::styled(title, style)], width));
    }
    spans.push(Span::styled("Variation axis", hdr_style));
    Line::from(spans)
}

// ---------------------------------------------------------------------------
// Header / toolbar / legend
// ---------------------------------------------------------------------------

fn render_header(frame: &mut Frame, area: Rect, view: &TableView) {
    let title_line = Line::from(vec![
        Span::styled(
            " modeltree ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            view.title.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let (position, count) = view.dataset_position;
    let mut info = vec![
        Span::styled(" Dataset: ", Style::default().fg(Color::DarkGray)),
        Span::styled(view.dataset_label.to_string(), Style::default().fg(Color::White)),
    ];
    if count > 1 {
        info.push(Span::styled(
            format!(" ({}/{}, Tab to switch)", position, count),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if *view.status == LoadStatus::Ready {
        info.push(Span::styled(
            format!("  {} rows, {} shown", view.total_rows, view.rows.len()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph = Paragraph::new(Text::from(vec![title_line, Line::from(info)]))
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(paragraph, area);
}

fn render_toolbar(frame: &mut Frame, area: Rect, view: &TableView) {
    let search_style = if view.search_active {
        Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled(" / ", search_style),
        Span::styled(
            format!(" {}", view.search_input),
            Style::default().fg(Color::White),
        ),
    ];
    if view.search_active {
        spans.push(Span::styled(
            "_",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ));
    } else if view.search_input.is_empty() {
        spans.push(Span::styled("Search", Style::default().fg(Color::DarkGray)));
    }
    if view.search_pending {
        spans.push(Span::styled(" \u{2026}", Style::default().fg(Color::DarkGray)));
    }

    let checkbox = if view.show_hidden { "[x]" } else { "[ ]" };
    spans.push(Span::styled(
        format!("   {} Show hidden products", checkbox),
        Style::default().fg(if view.show_hidden { Color::Cyan } else { Color::DarkGray }),
    ));
    spans.push(Span::styled(
        "   e expand all  c collapse all",
        Style::default().fg(Color::DarkGray),
    ));
    if !view.collapsed.is_empty() {
        spans.push(Span::styled(
            format!(" ({} collapsed)", view.collapsed.ids().len()),
            Style::default().fg(Color::Cyan),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_legend(frame: &mut Frame, area: Rect, view: &TableView, viewport_height: usize) {
    let mut spans: Vec<Span<'static>> = vec![Span::styled(
        " q quit  / search  h hidden  space toggle  1/2/3 sort  o open  r reload  j/k move",
        Style::default().fg(Color::DarkGray),
    )];

    if let Some(msg) = view.message {
        spans.push(Span::styled(
            format!("  {}", msg),
            Style::default().fg(Color::Green),
        ));
    }

    if let Some(err) = view.last_error {
        spans.push(Span::styled(
            format!("  [!] {}", err),
            Style::default().fg(Color::Red),
        ));
    }

    // Show scroll position indicator when content overflows the viewport.
    let total = view.rows.len();
    if total > viewport_height {
        let current_top = view.scroll_offset + 1;
        let current_bottom = (view.scroll_offset + viewport_height).min(total);
        spans.push(Span::styled(
            format!("  [{}-{}/{}]", current_top, current_bottom, total),
            Style::default().fg(Color::Cyan),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_placeholder(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let paragraph = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Lines shown in the table area when there is nothing to list.
fn placeholder_lines(view: &TableView) -> Option<Vec<Line<'static>>> {
    match view.status {
        LoadStatus::Loading => Some(vec![Line::from(Span::styled(
            format!("Loading {}\u{2026}", view.dataset_label),
            Style::default().fg(Color::DarkGray),
        ))]),
        LoadStatus::Failed(message) => Some(vec![
            Line::from(Span::styled(
                "An error occurred",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
            Line::from(Span::styled(
                "Press r to retry",
                Style::default().fg(Color::DarkGray),
            )),
        ]),
        LoadStatus::Ready if view.rows.is_empty() => Some(vec![Line::from(Span::styled(
            "No results",
            Style::default().fg(Color::DarkGray),
        ))]),
        LoadStatus::Ready => None,
    }
}

// ---------------------------------------------------------------------------
// Main render entry point
// ---------------------------------------------------------------------------

/// Top-level render function.  Returns the number of table rows that fit,
/// which the caller uses to keep the cursor in view.
pub fn render_ui(frame: &mut Frame, view: &TableView) -> usize {
    let size = frame.area();

    let warning_height: u16 =
        if *view.status == LoadStatus::Ready && view.total_rows >= ROW_LIMIT { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),              // header
            Constraint::Length(1),              // search / toolbar
            Constraint::Length(warning_height), // row cap notice
            Constraint::Length(1),              // column headers
            Constraint::Min(1),                 // table rows
            Constraint::Length(1),              // legend
        ])
        .split(size);

    render_header(frame, chunks[0], view);
    render_toolbar(frame, chunks[1], view);

    if warning_height > 0 {
        let notice = Line::from(Span::styled(
            format!(
                " This product model has more than {} variants. Only the first {} are displayed and available for search.",
                ROW_LIMIT, ROW_LIMIT
            ),
            Style::default().fg(Color::Yellow),
        ));
        frame.render_widget(Paragraph::new(notice), chunks[2]);
    }

    frame.render_widget(Paragraph::new(table_column_headers(view.sort)), chunks[3]);

    // ----- Table rows -----
    let table_area = chunks[4];
    let viewport_height = table_area.height as usize;

    if let Some(lines) = placeholder_lines(view) {
        render_placeholder(frame, table_area, lines);
    } else {
        // Virtual scrolling: only build Line objects for the visible viewport.
        let start = view.scroll_offset.min(view.rows.len());
        let end = (start + viewport_height).min(view.rows.len());
        let lines: Vec<Line<'static>> = view.rows[start..end]
            .iter()
            .enumerate()
            .map(|(i, row)| row_line(row, view, start + i == view.selected))
            .collect();
        frame.render_widget(Paragraph::new(Text::from(lines)), table_area);
    }

    render_legend(frame, chunks[5], view, viewport_height);

    viewport_height
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
