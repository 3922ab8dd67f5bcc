//! Plotters-powered cell chart widget for Ratatui.
//!
//! Plotters draws the axes and tick labels; `plotters-ratatui-backend` maps its
//! primitives onto the Ratatui buffer.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::CellPlot;

/// Line colors, cycled over the plot's curves.
const CURVE_PALETTE: [RGBColor; 4] = [
    RGBColor(0, 255, 255),
    RGBColor(255, 200, 0),
    RGBColor(255, 0, 255),
    RGBColor(0, 255, 0),
];

/// Render-only chart over a [`CellPlot`].
///
/// Bounds are derived from the plot data with a small vertical margin.
pub struct CellChart<'a> {
    pub plot: &'a CellPlot,
}

impl<'a> CellChart<'a> {
    pub fn new(plot: &'a CellPlot) -> Self {
        Self { plot }
    }

    /// Padded `(x0, x1, y0, y1)`, or `None` when there is nothing finite to draw.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let (mut x0, mut x1, mut y0, mut y1) = self.plot.bounds()?;
        if x1 <= x0 {
            x0 -= 0.5;
            x1 += 0.5;
        }
        let pad = if y1 > y0 { (y1 - y0) * 0.05 } else { 0.5 };
        y0 -= pad;
        y1 += pad;
        Some((x0, x1, y0, y1))
    }
}

impl<'a> Widget for CellChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters fails to lay out a chart in tiny areas; show a hint instead of panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let Some((x0, x1, y0, y1)) = self.bounds() else {
            buf.set_string(area.x, area.y, "Nothing to plot.", Style::default().fg(Color::Yellow));
            return;
        };

        let plot = self.plot;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are clutter at terminal resolution; axes and labels suffice.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_tick(*v))
                .y_label_formatter(&|v| fmt_tick(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (curve, color) in plot.curves.iter().zip(CURVE_PALETTE.iter().cycle()) {
                // Split at non-finite samples so gaps stay gaps.
                for segment in curve
                    .points
                    .split(|&(x, y)| !(x.is_finite() && y.is_finite()))
                    .filter(|s| !s.is_empty())
                {
                    chart.draw_series(LineSeries::new(segment.iter().copied(), color))?;
                }
            }

            // `Circle` radii come out huge through the ratatui backend; pixels read fine.
            chart.draw_series(
                plot.points
                    .iter()
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|&(x, y)| Pixel::new((x, y), WHITE)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn fmt_tick(v: f64) -> String {
    if v.abs() >= 1000.0 || (v != 0.0 && v.abs() < 0.01) {
        format!("{v:.1e}")
    } else {
        format!("{v:.2}")
    }
}

/// Color of the `i`-th curve, for legends drawn outside the chart.
pub fn curve_color(i: usize) -> Color {
    let RGBColor(r, g, b) = CURVE_PALETTE[i % CURVE_PALETTE.len()];
    Color::Rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Curve;

    #[test]
    fn bounds_pad_flat_data() {
        let plot = CellPlot {
            title: "flat".to_string(),
            points: vec![(1.0, 2.0), (1.0, 2.0)],
            curves: vec![],
        };
        let (x0, x1, y0, y1) = CellChart::new(&plot).bounds().unwrap();
        assert_eq!((x0, x1), (0.5, 1.5));
        assert_eq!((y0, y1), (1.5, 2.5));
    }

    #[test]
    fn bounds_cover_curves_too() {
        let plot = CellPlot {
            title: "c".to_string(),
            points: vec![(0.0, 0.0)],
            curves: vec![Curve {
                label: "line".to_string(),
                points: vec![(0.0, 0.0), (10.0, 20.0)],
            }],
        };
        let (x0, x1, y0, y1) = CellChart::new(&plot).bounds().unwrap();
        assert_eq!((x0, x1), (0.0, 10.0));
        assert!(y0 < 0.0 && y1 > 20.0);
    }

    #[test]
    fn tiny_area_renders_a_hint() {
        let plot = CellPlot {
            title: "t".to_string(),
            points: vec![],
            curves: vec![],
        };
        let area = Rect::new(0, 0, 10, 4);
        let mut buf = Buffer::empty(area);
        CellChart::new(&plot).render(area, &mut buf);
        assert_eq!(buf.content()[0].symbol(), "C");
    }
}
