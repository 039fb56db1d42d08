pub mod widgets;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color as TermColor, Print, ResetColor, SetBackgroundColor};
use crossterm::queue;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::pipeline::detect::DetectionResult;
use widgets::{ConfidenceWidget, SwatchWidget};

/// State for the interactive result viewer.
pub struct TuiApp {
    pub result: DetectionResult,
    pub image_path: PathBuf,
}

/// Show the result until the user presses `q` or Esc.
pub fn run(app: TuiApp) -> Result<()> {
    let mut terminal = ratatui::init();
    let outcome = event_loop(&mut terminal, &app);
    ratatui::restore();
    outcome
}

fn event_loop(terminal: &mut ratatui::DefaultTerminal, app: &TuiApp) -> Result<()> {
    loop {
        terminal
            .draw(|frame| draw(frame, app))
            .context("failed to draw terminal frame")?;

        if let Event::Key(key) = event::read().context("failed to read terminal event")? {
            if key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
            {
                return Ok(());
            }
        }
    }
}

fn draw(frame: &mut Frame, app: &TuiApp) {
    let [title, swatch, confidence, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Min(1),
    ])
    .areas(frame.area());

    frame.render_widget(
        Paragraph::new(format!(" {}", app.image_path.display())).bold(),
        title,
    );
    frame.render_widget(SwatchWidget::new(&app.result), swatch);
    frame.render_widget(ConfidenceWidget::new(&app.result.breakdown), confidence);
    frame.render_widget(
        Paragraph::new(" q / Esc to quit").fg(Color::DarkGray),
        help,
    );
}

/// Print a one-line colored swatch of the detected color.
pub fn print_preview(out: &mut impl Write, result: &DetectionResult) -> std::io::Result<()> {
    let c = result.rgb;
    queue!(
        out,
        SetBackgroundColor(TermColor::Rgb {
            r: c.r,
            g: c.g,
            b: c.b
        }),
        Print("        "),
        ResetColor,
        Print(format!(" {} {}\n", c.to_hex(), result.tone)),
    )?;
    out.flush()
}
