//! Transport bar widget - shows source, play state, position, view, parameter and capture stats

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use audviz::playback::AudioState;

use super::View;

fn state_style(state: AudioState) -> (&'static str, Color) {
    match state {
        AudioState::Playing => ("▶", Color::Green),
        AudioState::Paused => ("⏸", Color::Yellow),
        AudioState::UserStartPlay => ("⏵", Color::Cyan),
        AudioState::Failed => ("✖", Color::Red),
        AudioState::Ended => ("■", Color::DarkGray),
        _ => ("…", Color::Blue),
    }
}

/// Engine clock as `m:ss`.
fn clock_label(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Render the transport bar
pub fn render_transport(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default()
        .title(format!(" audviz - {} ", view.source))
        .borders(Borders::ALL);

    let (symbol, color) = state_style(view.state);
    let sample_rate_khz = view.sample_rate / 1000.0;
    let position = if view.source.is_stream() {
        "live".to_owned()
    } else {
        clock_label(view.clock)
    };

    let mut spans = vec![
        Span::styled(
            format!(" {symbol} {}  ", view.state),
            Style::default().fg(color),
        ),
        Span::styled(format!("{position}  "), Style::default().fg(Color::White)),
        Span::styled(
            format!("View: {}  ", view.mode),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if let Some((param, value)) = view.param {
        spans.push(Span::styled(
            format!("{}: {}/{}  ", param.name, value, param.max_range),
            Style::default().fg(Color::Magenta),
        ));
    }
    if view.looping {
        spans.push(Span::styled("↻ loop  ", Style::default().fg(Color::White)));
    }
    spans.push(Span::styled(
        format!("{sample_rate_khz:.1}kHz  "),
        Style::default().fg(Color::DarkGray),
    ));
    spans.push(Span::styled(
        format!(
            "blocks {}  over {}  under {}  skip {}",
            view.stats.blocks, view.stats.overruns, view.stats.underruns, view.stats.skipped_frames
        ),
        Style::default().fg(Color::DarkGray),
    ));

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
