use std::io::{IsTerminal, Write};

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use loadpilot::metrics::Phase;

/// Width of the bar between the brackets.
const BAR_WIDTH: usize = 30;

/// One progress update as shown on the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProgressView {
    pub pct: u8,
    pub phase: Phase,
    pub elapsed_secs: u64,
    pub concurrency: u64,
    pub requests: u64,
}

/// Redraws the progress line on stderr. Does nothing when stderr is not a
/// terminal.
pub(crate) fn render_progress_line(view: &ProgressView, no_color: bool) -> Result<(), std::io::Error> {
    if !std::io::stderr().is_terminal() {
        return Ok(());
    }
    let line = build_progress_line(view, no_color);

    let mut out = std::io::stderr();
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    for segment in line {
        match segment.color {
            Some(color) if !no_color => {
                queue!(out, SetForegroundColor(color), Print(&segment.text), ResetColor)?;
            }
            Some(_) | None => queue!(out, Print(&segment.text))?,
        }
    }
    out.flush()?;
    Ok(())
}

pub(crate) fn finish_progress_line() -> Result<(), std::io::Error> {
    if !std::io::stderr().is_terminal() {
        return Ok(());
    }
    let mut out = std::io::stderr();
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

fn build_progress_line(view: &ProgressView, no_color: bool) -> Vec<ProgressSegment> {
    let pct = usize::from(view.pct.min(100));
    let filled = pct
        .saturating_mul(BAR_WIDTH)
        .checked_div(100)
        .unwrap_or(0)
        .min(BAR_WIDTH);
    let bar = format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH.saturating_sub(filled))
    );
    let pct_text = format!(" {:>3}%", pct);
    let phase_text = format!(" {}", view.phase.as_str());
    let stats_text = format!(
        " | {}s | {} VUs | {} reqs",
        view.elapsed_secs, view.concurrency, view.requests
    );

    if no_color {
        vec![
            ProgressSegment::plain(bar),
            ProgressSegment::plain(pct_text),
            ProgressSegment::plain(phase_text),
            ProgressSegment::plain(stats_text),
        ]
    } else {
        vec![
            ProgressSegment::plain(bar),
            ProgressSegment::colored(pct_text, Color::Cyan),
            ProgressSegment::colored(phase_text, phase_color(view.phase)),
            ProgressSegment::colored(stats_text, Color::Yellow),
        ]
    }
}

const fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::RampUp => Color::Blue,
        Phase::Running => Color::Green,
        Phase::CoolDown => Color::Magenta,
        Phase::Complete => Color::White,
    }
}

struct ProgressSegment {
    text: String,
    color: Option<Color>,
}

impl ProgressSegment {
    const fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    const fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(view: &ProgressView, no_color: bool) -> String {
        build_progress_line(view, no_color)
            .into_iter()
            .map(|segment| segment.text)
            .collect()
    }

    #[test]
    fn progress_line_scales_bar() -> Result<(), String> {
        let view = ProgressView {
            pct: 50,
            phase: Phase::Running,
            elapsed_secs: 15,
            concurrency: 10,
            requests: 420,
        };
        let line = text(&view, true);
        let expected = format!(
            "[{}{}]  50% running | 15s | 10 VUs | 420 reqs",
            "#".repeat(15),
            "-".repeat(15)
        );
        if line != expected {
            return Err(format!("Unexpected line: {:?}", line));
        }
        Ok(())
    }

    #[test]
    fn progress_line_colors_only_when_enabled() -> Result<(), String> {
        let view = ProgressView {
            pct: 100,
            phase: Phase::Complete,
            elapsed_secs: 30,
            concurrency: 0,
            requests: 900,
        };
        if build_progress_line(&view, true)
            .iter()
            .any(|segment| segment.color.is_some())
        {
            return Err("no_color must not produce colored segments".to_owned());
        }
        let colored = build_progress_line(&view, false);
        if colored.iter().filter(|segment| segment.color.is_some()).count() != 3 {
            return Err("Expected three colored segments".to_owned());
        }
        if !text(&view, false).starts_with(&format!("[{}]", "#".repeat(BAR_WIDTH))) {
            return Err("Full progress must fill the bar".to_owned());
        }
        Ok(())
    }
}
