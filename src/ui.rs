use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};
use sakura_map::braille::BrailleSurface;
use sakura_map::map::{Ink, MarkerGroup};

const BLANK_BRAILLE: u32 = 0x2800;

fn chunks(area: Rect) -> [Rect; 2] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    [chunks[0], chunks[1]]
}

fn map_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " 桜 Sakura Map ",
            Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
        ))
}

/// Character area the map is drawn into for a given terminal size. Mouse
/// events are decoded against this.
pub fn map_area(terminal: Rect) -> Rect {
    let [map, _] = chunks(terminal);
    map_block().inner(map)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let [map, status] = chunks(frame.area());

    let block = map_block();
    let inner = block.inner(map);
    frame.render_widget(block, map);
    frame.render_widget(MapWidget { surface: app.viewport.surface() }, inner);

    render_status_bar(frame, app, status);
}

fn ink_color(ink: Ink) -> Color {
    match ink {
        Ink::Label => Color::Gray,
        Ink::Marker(MarkerGroup::Sakura100) => Color::LightMagenta,
        Ink::Marker(MarkerGroup::WeathernewsTop10) => Color::LightGreen,
        Ink::Marker(MarkerGroup::Other) => Color::LightBlue,
        Ink::MarkerOutline => Color::White,
        Ink::HoverRing => Color::Yellow,
        Ink::SelectionRing => Color::LightRed,
    }
}

/// Which ink colours a cell shared by several layers.
fn ink_rank(ink: Ink) -> u8 {
    match ink {
        Ink::Label => 0,
        Ink::MarkerOutline => 1,
        Ink::Marker(MarkerGroup::Other) => 2,
        Ink::Marker(MarkerGroup::WeathernewsTop10) => 3,
        Ink::Marker(MarkerGroup::Sakura100) => 4,
        Ink::HoverRing => 5,
        Ink::SelectionRing => 6,
    }
}

/// Blits the Braille surface: basemap, then labels, then the marker layers
/// with their dots merged per cell.
struct MapWidget<'a> {
    surface: &'a BrailleSurface,
}

impl MapWidget<'_> {
    fn render_basemap(&self, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in self.surface.basemap().rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch as u32 == BLANK_BRAILLE {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(Color::DarkGray);
            }
        }
    }

    fn render_labels(&self, area: Rect, buf: &mut Buffer) {
        for item in self.surface.texts() {
            if item.row < 0 || item.row >= area.height as i32 {
                continue;
            }
            let width = Span::raw(item.text.as_str()).width() as i32;
            let start = (item.col - width / 2).max(0);
            if start >= area.width as i32 {
                continue;
            }
            let max_width = (area.width as i32 - start) as usize;
            buf.set_stringn(
                area.x + start as u16,
                area.y + item.row as u16,
                &item.text,
                max_width,
                Style::default().fg(ink_color(item.ink)),
            );
        }
    }

    fn render_markers(&self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.surface.size();
        for row in 0..height.min(area.height as usize) {
            for col in 0..width.min(area.width as usize) {
                let mut bits = 0u8;
                let mut top: Option<Ink> = None;
                for (ink, canvas) in self.surface.layers() {
                    let cell = canvas.cell(col, row);
                    if cell == 0 {
                        continue;
                    }
                    bits |= cell;
                    if top.map_or(true, |t| ink_rank(ink) > ink_rank(t)) {
                        top = Some(ink);
                    }
                }

                let Some(ink) = top else {
                    continue;
                };
                let ch = char::from_u32(BLANK_BRAILLE + bits as u32).unwrap_or(' ');
                let (x, y) = (area.x + col as u16, area.y + row as u16);
                buf[(x, y)].set_char(ch).set_fg(ink_color(ink));
            }
        }
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.render_basemap(area, buf);
        self.render_labels(area, buf);
        self.render_markers(area, buf);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let filter_style = |on: bool| Style::default().fg(if on { Color::Green } else { Color::DarkGray });

    let collection = app.filters.collection.map(|c| c.to_string());
    let prefecture = app.prefecture_filter_name();

    let mut spans = vec![
        Span::styled(" Zoom: ", dim),
        Span::styled(format!("{:.2}x ", app.viewport.transform().k), Style::default().fg(Color::Yellow)),
        Span::styled("| [f] ", dim),
        Span::styled(
            collection.as_deref().unwrap_or("all").to_string(),
            filter_style(collection.is_some()),
        ),
        Span::styled(" [p] ", dim),
        Span::styled(prefecture.unwrap_or("all").to_string(), filter_style(prefecture.is_some())),
        Span::styled(format!(" ({} spots) ", app.viewport.markers().len()), dim),
    ];

    if let Some(name) = app.hovered_name() {
        spans.push(Span::styled("| ", dim));
        spans.push(Span::styled(name.to_string(), Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(" "));
    }
    if let Some(detail) = app.selection_detail() {
        spans.push(Span::styled("| ◉ ", dim));
        spans.push(Span::styled(
            detail,
            Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::styled(
        "| drag:pan wheel/+/-:zoom 0:reset enter:focus q:quit",
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
