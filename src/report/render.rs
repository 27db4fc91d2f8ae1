use std::ops::Range;
use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::color::{annotation_color, heat_color, series_color};
use crate::data::model::AxisValue;
use crate::style::ChartStyle;

use super::{ChartData, HeatmapData, LineKind, MarkerKind, PanelData};

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Dash length and gap, in points.
const DASH_PT: (f64, f64) = (5.0, 3.0);
/// Steps in the heatmap colour bar.
const COLORBAR_STEPS: usize = 64;
/// Relative padding added around line-chart data.
const AXIS_PAD: f64 = 0.05;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Draw `data` into an RGB buffer and write it to `path` as PNG.
///
/// `figure_size` is in inches; the pixel size follows `style.dpi`.
pub fn render_png(
    data: &ChartData,
    figure_size: (f64, f64),
    style: &ChartStyle,
    path: &Path,
) -> Result<()> {
    let (width, height) = style.figure_pixels(figure_size);
    let mut buffer = vec![0u8; width as usize * height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&style.background)?;
        match data {
            ChartData::Lines(panels) => {
                let areas = root.split_evenly((1, panels.len().max(1)));
                for (area, panel) in areas.iter().zip(panels) {
                    draw_line_panel(area, panel, style)
                        .with_context(|| format!("drawing panel '{}'", panel.title))?;
                }
            }
            ChartData::Heatmap(heatmap) => draw_heatmap(&root, heatmap, style)?,
        }
        root.present()?;
    }

    let image = image::RgbImage::from_raw(width, height, buffer)
        .context("chart buffer does not match image dimensions")?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn font(style: &ChartStyle, points: f64) -> FontDesc<'_> {
    (style.font_family.as_str(), style.px(points)).into_font()
}

// ---------------------------------------------------------------------------
// Line panels
// ---------------------------------------------------------------------------

fn draw_line_panel(area: &Area<'_>, panel: &PanelData, style: &ChartStyle) -> Result<()> {
    let (x_range, y_range) = panel_bounds(panel);

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, font(style, style.title_font_pt))
        .margin(style.px_u32(10.0))
        .x_label_area_size(style.px_u32(32.0))
        .y_label_area_size(style.px_u32(48.0))
        .build_cartesian_2d(x_range.clone(), y_range)?;

    let tick = |v: &f64| format_tick(*v);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(panel.x_desc.as_str())
        .y_desc(panel.y_desc.as_str())
        .axis_desc_style(font(style, style.label_font_pt))
        .label_style(font(style, style.tick_font_pt))
        .x_label_formatter(&tick)
        .y_label_formatter(&tick);
    if style.grid {
        mesh.bold_line_style(style.grid_color)
            .light_line_style(style.background);
    } else {
        mesh.disable_mesh();
    }
    mesh.draw()?;

    let stroke = style.px_u32(style.line_width_pt);
    let marker = style.px_u32(style.marker_pt) as i32;
    let dash = (style.px_u32(DASH_PT.0) as i32, style.px_u32(DASH_PT.1) as i32);
    let legend_len = style.px_u32(18.0) as i32;

    for series in &panel.series {
        let color = series_color(series.color_index, panel.series.len());
        let line_style = color.stroke_width(stroke);
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();

        let anno = match series.line {
            LineKind::Solid => chart.draw_series(LineSeries::new(points.clone(), line_style))?,
            LineKind::Dashed => chart.draw_series(DashedLineSeries::new(
                points.clone(),
                dash.0,
                dash.1,
                line_style,
            ))?,
        };
        anno.label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + legend_len, y)], line_style));

        match series.marker {
            MarkerKind::Circle => {
                chart.draw_series(
                    points
                        .iter()
                        .map(|&p| Circle::new(p, marker, color.filled())),
                )?;
            }
            MarkerKind::Square => {
                chart.draw_series(points.iter().map(|&p| {
                    EmptyElement::at(p)
                        + Rectangle::new([(-marker, -marker), (marker, marker)], color.filled())
                }))?;
            }
            MarkerKind::None => {}
        }
    }

    if let Some(reference) = panel.reference {
        let ref_style = RED.stroke_width(stroke);
        chart
            .draw_series(DashedLineSeries::new(
                vec![(x_range.start, reference.y), (x_range.end, reference.y)],
                dash.0,
                dash.1,
                ref_style,
            ))?
            .label(reference.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + legend_len, y)], ref_style));
    }

    if !panel.series.is_empty() || panel.reference.is_some() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(style.background.mix(0.8))
            .border_style(style.grid_color)
            .label_font(font(style, style.tick_font_pt))
            .draw()?;
    }

    Ok(())
}

/// Data extent of a panel with a small margin; `0..1` when there is no data.
fn panel_bounds(panel: &PanelData) -> (Range<f64>, Range<f64>) {
    let points = || panel.series.iter().flat_map(|s| s.points.iter().copied());
    let xs = padded(points().map(|(x, _)| x));
    let ys = padded(
        points()
            .map(|(_, y)| y)
            .chain(panel.reference.map(|r| r.y)),
    );
    (xs, ys)
}

fn padded(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * AXIS_PAD
    } else {
        lo.abs().max(1.0) * AXIS_PAD
    };
    (lo - pad)..(hi + pad)
}

fn format_tick(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

/// Annotated grid, first row key at the top, plus a colour bar on the right.
fn draw_heatmap(root: &Area<'_>, heatmap: &HeatmapData, style: &ChartStyle) -> Result<()> {
    let grid = &heatmap.grid;
    let rows = grid.row_keys.len().max(1) as i32;
    let cols = grid.column_keys.len().max(1) as i32;
    let (lo, hi) = grid.value_range().unwrap_or((0.0, 1.0));
    let scale = |v: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };

    let (width, _) = root.dim_in_pixel();
    let bar_width = (width as f64 * 0.12).round() as u32;
    let (grid_area, bar_area) = root.split_horizontally(width.saturating_sub(bar_width));

    let mut chart = ChartBuilder::on(&grid_area)
        .caption(&heatmap.title, font(style, style.title_font_pt))
        .margin(style.px_u32(10.0))
        .x_label_area_size(style.px_u32(32.0))
        .y_label_area_size(style.px_u32(48.0))
        .build_cartesian_2d(0..cols, rows..0)?;

    let (plot_w, plot_h) = chart.plotting_area().dim_in_pixel();
    let cell_w = plot_w as i32 / cols;
    let cell_h = plot_h as i32 / rows;

    let x_label = |c: &i32| key_label(&grid.column_keys, *c);
    let y_label = |r: &i32| key_label(&grid.row_keys, *r);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(cols as usize + 1)
        .y_labels(rows as usize + 1)
        .x_label_offset(cell_w / 2)
        .y_label_offset(cell_h / 2)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_desc(heatmap.x_desc.as_str())
        .y_desc(heatmap.y_desc.as_str())
        .axis_desc_style(font(style, style.label_font_pt))
        .label_style(font(style, style.tick_font_pt))
        .draw()?;

    let cells: Vec<(i32, i32, f64)> = grid
        .cells
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(c, v)| v.map(|v| (c as i32, r as i32, v)))
        })
        .collect();

    chart.draw_series(cells.iter().map(|&(c, r, v)| {
        Rectangle::new([(c, r), (c + 1, r + 1)], heat_color(scale(v)).filled())
    }))?;

    chart.draw_series(cells.iter().map(|&(c, r, v)| {
        let ink = annotation_color(heat_color(scale(v)));
        let text = font(style, style.tick_font_pt)
            .color(&ink)
            .pos(Pos::new(HPos::Center, VPos::Center));
        EmptyElement::at((c, r))
            + Text::new(
                format!("{v:.prec$}", prec = heatmap.precision),
                (cell_w / 2, cell_h / 2),
                text,
            )
    }))?;

    draw_colorbar(&bar_area, lo, hi, style)
}

fn key_label(keys: &[AxisValue], i: i32) -> String {
    usize::try_from(i)
        .ok()
        .and_then(|i| keys.get(i))
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn draw_colorbar(area: &Area<'_>, lo: f64, hi: f64, style: &ChartStyle) -> Result<()> {
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let step = (hi - lo) / COLORBAR_STEPS as f64;

    let mut bar = ChartBuilder::on(area)
        .margin_top(style.px_u32(30.0))
        .margin_bottom(style.px_u32(42.0))
        .margin_right(style.px_u32(10.0))
        .y_label_area_size(style.px_u32(36.0))
        .build_cartesian_2d(0..1, lo..hi)?;

    let tick = |v: &f64| format_tick(*v);
    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_label_formatter(&tick)
        .label_style(font(style, style.tick_font_pt))
        .draw()?;

    bar.draw_series((0..COLORBAR_STEPS).map(|i| {
        let v0 = lo + step * i as f64;
        let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        Rectangle::new([(0, v0), (1, v0 + step)], heat_color(t).filled())
    }))?;

    Ok(())
}
