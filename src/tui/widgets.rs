use ratatui::prelude::*;
use ratatui::widgets::{Block, Gauge, Paragraph, Widget};

use crate::color::PixelColor;
use crate::pipeline::confidence::ConfidenceBreakdown;
use crate::pipeline::detect::DetectionResult;

/// Detected skin color as a filled swatch next to the classification.
pub struct SwatchWidget<'a> {
    result: &'a DetectionResult,
}

impl<'a> SwatchWidget<'a> {
    pub fn new(result: &'a DetectionResult) -> Self {
        Self { result }
    }
}

fn to_color(c: PixelColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Black text on light swatches, white on dark ones.
fn contrast_fg(lightness: f32) -> Color {
    if lightness > 60.0 {
        Color::Black
    } else {
        Color::White
    }
}

impl Widget for SwatchWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title("Skin tone");
        let inner = block.inner(area);
        block.render(area, buf);

        let r = self.result;
        let swatch_style = Style::default()
            .bg(to_color(r.rgb))
            .fg(contrast_fg(r.lab.l))
            .add_modifier(Modifier::BOLD);

        let undertone = r
            .undertone
            .map(|u| format!("  undertone {u}"))
            .unwrap_or_default();

        let lines = vec![
            Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{:^12}", r.tone.as_str()), swatch_style),
                Span::raw(format!("  {}{undertone}", r.rgb.to_hex())),
            ]),
            Line::from(vec![
                Span::raw("  "),
                Span::styled(" ".repeat(12), swatch_style),
                Span::raw(format!(
                    "  L {:.1}  a {:.1}  b {:.1}",
                    r.lab.l, r.lab.a, r.lab.b
                )),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "  {} pixels sampled ({:?}), face covers {:.0}% of frame",
                    r.pixel_count,
                    r.sampling,
                    r.face_coverage * 100.0
                ),
                Style::default().fg(Color::DarkGray),
            )),
        ];

        Paragraph::new(lines).render(inner, buf);
    }
}

/// One gauge per confidence signal plus the overall score.
pub struct ConfidenceWidget<'a> {
    breakdown: &'a ConfidenceBreakdown,
}

impl<'a> ConfidenceWidget<'a> {
    pub fn new(breakdown: &'a ConfidenceBreakdown) -> Self {
        Self { breakdown }
    }
}

fn gauge_color(score: f32) -> Color {
    if score >= 0.75 {
        Color::Green
    } else if score >= 0.4 {
        Color::Yellow
    } else {
        Color::Red
    }
}

impl Widget for ConfidenceWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title("Confidence");
        let inner = block.inner(area);
        block.render(area, buf);

        let b = self.breakdown;
        let rows = [
            ("overall", b.confidence),
            ("tightness", b.variance_score),
            ("coverage", b.coverage_score),
            ("samples", b.sample_score),
        ];
        let areas = Layout::vertical([Constraint::Length(1); 4]).split(inner);

        for ((name, score), row) in rows.into_iter().zip(areas.iter()) {
            let [label_area, gauge_area] =
                Layout::horizontal([Constraint::Length(12), Constraint::Min(10)]).areas(*row);
            Paragraph::new(format!(" {name}")).render(label_area, buf);
            Gauge::default()
                .gauge_style(Style::default().fg(gauge_color(score)))
                .ratio(score.clamp(0.0, 1.0) as f64)
                .label(format!("{score:.2}"))
                .render(gauge_area, buf);
        }
    }
}
