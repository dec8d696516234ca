//! UI rendering helpers for the terminal user interface.
//!
//! This module renders the TUI using `ratatui` and reports where the
//! clickable regions ended up so the event loop can map mouse input.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Tabs, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::App;
use crate::catalog::{CatalogStore, Tab, Track};
use crate::config::{Settings, TimeField, UiSettings};
use crate::session::{PlaybackState, SessionStatus, format_time};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("enter", "play selected");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next");
    // H/L and +/- are filled dynamically from config.
    map.insert("m", "mute");
    map.insert("tab", "switch tab");
    map.insert("/", "search");
    map.insert("r", "refresh");
    map.insert("K", "metadata");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating configured step sizes.
fn controls_text(scrub_seconds: u64, volume_step: f32) -> String {
    let order = [
        "j/k", "enter", "space/p", "h/l", "H/L", "+/-", "m", "tab", "/", "r", "K", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] scrub -/+{}s", scrub_seconds)),
            "+/-" => Some(format!("[+/-] volume {:.0}%", volume_step * 100.0)),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v)),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Screen regions that react to the mouse, as laid out by the last draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitAreas {
    list: Rect,
    /// Catalog index of each visible list row, top to bottom.
    rows: Vec<usize>,
    progress: Rect,
    volume: Rect,
}

impl HitAreas {
    /// Catalog index of the list row under the pointer.
    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        if !self.list.contains(Position::new(column, row)) {
            return None;
        }
        self.rows.get(usize::from(row - self.list.y)).copied()
    }

    /// Horizontal fraction of the progress bar under the pointer.
    pub fn progress_at(&self, column: u16, row: u16) -> Option<f64> {
        fraction_at(self.progress, column, row)
    }

    /// Horizontal fraction of the volume bar under the pointer.
    pub fn volume_at(&self, column: u16, row: u16) -> Option<f64> {
        fraction_at(self.volume, column, row)
    }

    pub fn over_volume(&self, column: u16, row: u16) -> bool {
        self.volume.contains(Position::new(column, row))
    }
}

fn fraction_at(area: Rect, column: u16, row: u16) -> Option<f64> {
    if !area.contains(Position::new(column, row)) {
        return None;
    }
    let offset = f64::from(column - area.x);
    let width = f64::from(area.width.saturating_sub(1).max(1));
    Some((offset / width).clamp(0.0, 1.0))
}

/// Parse a `#rrggbb` accent into a terminal colour.
pub fn parse_accent(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(position: f64, duration: Option<f64>, ui: &UiSettings) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_time(position)),
            TimeField::Total => parts.push(format_time(duration.unwrap_or(f64::NAN))),
            TimeField::Remaining => {
                if let Some(d) = duration {
                    parts.push(format!("-{}", format_time((d - position).max(0.0))));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn status_label(state: &PlaybackState) -> &'static str {
    match state.status {
        SessionStatus::Idle => "Stopped",
        SessionStatus::Loading if state.is_playing => "Loading",
        SessionStatus::Loading => "Loading (paused)",
        SessionStatus::Playing => "Playing",
        SessionStatus::Paused => "Paused",
    }
}

fn track_row(track: &Track) -> String {
    format!(
        "{:<36} {:<24} {:>6}",
        track.name,
        track.artist,
        format_time(track.duration.as_secs_f64())
    )
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn left_pad() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

/// Render the entire UI into `frame` and return its clickable regions.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    catalog: &CatalogStore,
    playback: &PlaybackState,
    current: Option<&Track>,
    settings: &Settings,
) -> HitAreas {
    let ui_settings = &settings.ui;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header with tabs
    let titles = [Tab::ForYou, Tab::TopTracks].map(Tab::title);
    let selected_tab = match app.tab {
        Tab::ForYou => 0,
        Tab::TopTracks => 1,
    };
    let tabs = Tabs::new(titles)
        .select(selected_tab)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(ui_settings.header_text.as_str())
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(tabs, chunks[0]);

    // Now playing
    let accent = current
        .filter(|_| ui_settings.accent_theme)
        .and_then(|t| t.accent_color.as_deref())
        .and_then(parse_accent);
    let mut border = Block::bordered().padding(left_pad()).title(" now playing ");
    if let Some(color) = accent {
        border = border.border_style(Style::default().fg(color));
    }
    let inner = border.inner(chunks[1]);
    frame.render_widget(border, chunks[1]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let title = match current {
        Some(t) => t.display(),
        None => "Nothing selected".to_string(),
    };
    frame.render_widget(Paragraph::new(title).bold(), rows[0]);

    let mut status_parts = vec![status_label(playback).to_string()];
    if let Some(time) =
        now_playing_time_text(playback.position_secs, playback.duration_secs, ui_settings)
    {
        status_parts.push(time);
    }
    if let Some(err) = playback.last_error {
        status_parts.push(format!("! {}", err.label()));
    }
    if !app.follow_playback {
        status_parts.push("cursor: free-roam".to_string());
    }
    let status_style = if playback.last_error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    frame.render_widget(
        Paragraph::new(status_parts.join(" • ")).style(status_style),
        rows[1],
    );

    let progress = Gauge::default()
        .ratio(playback.progress_ratio())
        .label("")
        .gauge_style(Style::default().fg(accent.unwrap_or(Color::Cyan)));
    frame.render_widget(progress, rows[2]);

    let volume_label = if playback.is_muted {
        "muted".to_string()
    } else {
        format!("vol {:.0}%", playback.volume * 100.0)
    };
    let mut volume_style = Style::default().fg(Color::Green);
    if playback.is_volume_gesture_active {
        volume_style = volume_style.add_modifier(Modifier::BOLD);
    }
    let volume = Gauge::default()
        .ratio(f64::from(playback.effective_volume()).clamp(0.0, 1.0))
        .label(volume_label)
        .gauge_style(volume_style);
    frame.render_widget(volume, rows[3]);

    // Main list
    let display = app.display_indices(catalog);
    let list_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.tab.title().to_lowercase()));
    let list_area = list_block.inner(chunks[2]);

    // Center the selected item when possible; only build items for the visible window.
    let total = display.len();
    let list_height = list_area.height as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let playing = playback.current_track_id.as_ref();
    let visible_items: Vec<ListItem> = display[start..end]
        .iter()
        .filter_map(|&i| catalog.get(i))
        .map(|track| {
            let item = ListItem::new(track_row(track));
            if Some(&track.id) == playing {
                item.style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                item
            }
        })
        .collect();

    let empty_text = if app.loading {
        "Loading catalog..."
    } else if catalog.is_empty() {
        "No tracks"
    } else {
        "No matches"
    };
    if visible_items.is_empty() {
        frame.render_widget(
            Paragraph::new(empty_text)
                .alignment(Alignment::Center)
                .block(list_block),
            chunks[2],
        );
    } else {
        let list = List::new(visible_items)
            .block(list_block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(selected_pos_in_visible));
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 9, chunks[2]);
        frame.render_widget(Clear, popup_area);

        let meta = match app.selected_track(catalog) {
            Some(track) => format!(
                "Name: {}\nArtist: {}\nDuration: {}\nTop track: {}\nCover: {}\nMedia: {}",
                track.name,
                track.artist,
                format_time(track.duration.as_secs_f64()),
                if track.is_top_track { "yes" } else { "no" },
                track
                    .cover_url(&settings.catalog.cover_base_url)
                    .unwrap_or_else(|| "-".to_string()),
                track.media_url,
            ),
            None => "No track selected".to_string(),
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(left_pad())
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    // Footer: search prompt or status message over the controls line.
    let mut footer_lines = Vec::new();
    let q = app.search_query.trim();
    if app.search_mode || !q.is_empty() {
        let cursor = if app.search_mode { "_" } else { "" };
        footer_lines.push(Line::from(format!("search: {}{}", app.search_query, cursor)).bold());
    } else if let Some(message) = &app.status {
        footer_lines.push(Line::from(message.as_str()).italic());
    }
    footer_lines.push(Line::from(controls_text(
        settings.controls.scrub_seconds,
        settings.controls.volume_step,
    )));
    let footer = Paragraph::new(footer_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_pad()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);

    HitAreas {
        list: list_area,
        rows: display[start..end].to_vec(),
        progress: rows[2],
        volume: rows[3],
    }
}
