//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - curves: `-`, then `.`, then `~` for further curves

use crate::domain::{CellPlot, Curve, CurveFile};

const CURVE_CHARS: [char; 3] = ['-', '.', '~'];

/// Render a cell plot (points + curves).
pub fn render_ascii_plot(plot: &CellPlot, width: usize, height: usize) -> String {
    render_plot(plot, width, height)
}

/// Render a plot from a saved curve JSON file (curve only, no overlay points).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let plot = CellPlot {
        title: format!("{} ({})", curve.model.display_name, curve.cell.display_name()),
        points: Vec::new(),
        curves: vec![Curve {
            label: curve.model.display_name.clone(),
            points: curve
                .grid
                .x
                .iter()
                .copied()
                .zip(curve.grid.y.iter().copied())
                .collect(),
        }],
    };
    render_plot(&plot, width, height)
}

fn render_plot(plot: &CellPlot, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max, y_min, y_max) = plot.bounds().unwrap_or((0.0, 1.0, 0.0, 1.0));
    let (x_min, x_max) = widen(x_min, x_max);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curves first (so points can overlay).
    for (curve, &ch) in plot.curves.iter().zip(CURVE_CHARS.iter().cycle()) {
        draw_curve(&mut grid, &curve.points, (x_min, x_max), (y_min, y_max), ch);
    }

    for &(x, y) in &plot.points {
        if !(x.is_finite() && y.is_finite()) {
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!("{}\n", plot.title));
    out.push_str(&format!(
        "x=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let mut legend = Vec::new();
    if !plot.points.is_empty() {
        legend.push("o data".to_string());
    }
    for (curve, ch) in plot.curves.iter().zip(CURVE_CHARS.iter().cycle()) {
        legend.push(format!("{ch} {}", curve.label));
    }
    if !legend.is_empty() {
        out.push_str(&legend.join(" | "));
        out.push('\n');
    }

    out
}

/// Give a degenerate x-range some width so mapping stays finite.
fn widen(min: f64, max: f64) -> (f64, f64) {
    if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { 0.5 };
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], xr: (f64, f64), yr: (f64, f64), ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    // Non-finite samples break the line instead of being clamped to an edge.
    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let col = map_x(x, xr.0, xr.1, width);
        let row = map_y(y, yr.0, yr.1, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else if grid[row][col] == ' ' {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let plot = CellPlot {
            title: "flat fit".to_string(),
            points: vec![(1.0, 100.0), (10.0, 110.0)],
            curves: vec![Curve {
                label: "constant".to_string(),
                points: vec![(1.0, 100.0), (10.0, 100.0)],
            }],
        };

        let txt = render_ascii_plot(&plot, 10, 5);
        let expected = concat!(
            "flat fit\n",
            "x=[1.000, 10.000] | y=[99.50, 110.50]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
            "o data | - constant\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn second_curve_uses_its_own_glyph() {
        let plot = CellPlot {
            title: "two".to_string(),
            points: vec![],
            curves: vec![
                Curve {
                    label: "low".to_string(),
                    points: vec![(0.0, 0.0), (1.0, 0.0)],
                },
                Curve {
                    label: "high".to_string(),
                    points: vec![(0.0, 1.0), (1.0, 1.0)],
                },
            ],
        };
        let txt = render_ascii_plot(&plot, 10, 5);
        let rows: Vec<&str> = txt.lines().collect();
        assert_eq!(rows[2], "..........");
        assert_eq!(rows[6], "----------");
        assert_eq!(rows[7], "- low | . high");
    }

    #[test]
    fn empty_plot_still_renders_a_frame() {
        let plot = CellPlot {
            title: "nothing".to_string(),
            points: vec![],
            curves: vec![],
        };
        let txt = render_ascii_plot(&plot, 12, 6);
        assert_eq!(txt.lines().count(), 2 + 6);
    }
}
