//! TUI module for audviz
//!
//! Transport bar, the active visualization with the event log over it, and a
//! help line.

mod canvas;
mod transport;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use audviz::{
    capture::CaptureStats,
    graph::VisualizationMode,
    media::SourceSpec,
    params::ParamDescriptor,
    playback::AudioState,
    viz::{EventLog, Scene},
};

use canvas::render_scene;
use transport::render_transport;

/// Everything one frame of the UI shows.
pub struct View<'a> {
    pub source: &'a SourceSpec,
    pub state: AudioState,
    pub mode: VisualizationMode,
    pub scene: Option<&'a Scene>,
    pub param: Option<(&'a ParamDescriptor, u32)>,
    pub stats: CaptureStats,
    pub sample_rate: f32,
    pub looping: bool,
    /// Engine clock in seconds.
    pub clock: f64,
    pub events: &'a EventLog,
}

fn chunks(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport bar
            Constraint::Min(6),    // Visualization
            Constraint::Length(1), // Help bar
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn visualization_block(mode: VisualizationMode) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", mode.label()))
        .borders(Borders::ALL)
}

/// Inner area of the visualization panel for a frame of size `area`.
pub fn visualization_area(area: Rect) -> Rect {
    let [_, panel, _] = chunks(area);
    Block::default().borders(Borders::ALL).inner(panel)
}

/// Scene size for a panel: braille gives 2x4 dots per cell.
pub fn canvas_size(inner: Rect) -> (f32, f32) {
    (f32::from(inner.width) * 2.0, f32::from(inner.height) * 4.0)
}

/// Event log in the top-left corner of the panel, newest line last.
fn render_events(frame: &mut Frame, inner: Rect, events: &EventLog) {
    if events.is_empty() || inner.height == 0 {
        return;
    }
    let shown = events.len().min(inner.height as usize);
    let lines: Vec<Line> = events
        .iter()
        .skip(events.len() - shown)
        .map(|line| Line::from(line.to_owned()))
        .collect();
    let width = lines.iter().map(Line::width).max().unwrap_or(0) as u16;
    let area = Rect {
        width: width.min(inner.width),
        height: shown as u16,
        ..inner
    };
    let log = Paragraph::new(lines).style(Style::default().fg(Color::Gray));
    frame.render_widget(log, area);
}

pub fn render(frame: &mut Frame, view: &View) {
    let [top, panel, bottom] = chunks(frame.area());

    render_transport(frame, top, view);

    let block = visualization_block(view.mode);
    let inner = block.inner(panel);
    frame.render_widget(block, panel);
    if let Some(scene) = view.scene {
        render_scene(frame, inner, scene);
    }
    render_events(frame, inner, view.events);

    let help = Paragraph::new(
        " [Q] Quit  [Space] Play/Pause  [1-4/0/Tab] View  [←/→] Param  [↑/↓] Adjust",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, bottom);
}
