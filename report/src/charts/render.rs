//! Chart rendering over an in-memory RGB bitmap.
//!
//! Each renderer draws one [`ChartSpec`] onto a `plotters` bitmap backend
//! and returns the pixels as a [`ChartArtifact`]. Everything is computed
//! from the question rows; no renderer touches global state.

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::charts::{ChartKind, ChartSpec, GroupField};
use crate::error::ReportError;
use crate::stats::percentile_linear;
use crate::types::{ChartArtifact, QuestionRow};

type Root<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const BAR_COLOR: RGBColor = RGBColor(86, 119, 194);
const HISTOGRAM_BINS: usize = 30;

fn chart_err<E: std::fmt::Debug>(e: E) -> ReportError {
    ReportError::ChartError(format!("{e:?}"))
}

/// Renders one chart of the plan.
pub fn render_chart(spec: &ChartSpec, rows: &[QuestionRow]) -> Result<ChartArtifact, ReportError> {
    if rows.is_empty() {
        return Err(ReportError::ChartError("no rows to plot".to_string()));
    }
    let (width, height) = dimensions(&spec.kind);
    let mut buf = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;
        match &spec.kind {
            ChartKind::TimeHistogram => draw_histogram(&root, spec, rows)?,
            ChartKind::CategoryCounts(field) => draw_counts(&root, spec, rows, field)?,
            ChartKind::TimeTrend(group) => draw_trend(&root, spec, rows, group.as_ref())?,
            ChartKind::CountHeatmap {
                row_field,
                col_field,
            } => draw_heatmap(&root, spec, rows, row_field, col_field)?,
            ChartKind::TimeDistribution(field) => draw_distribution(&root, spec, rows, field)?,
        }
        root.present().map_err(chart_err)?;
    }
    Ok(ChartArtifact {
        name: spec.name.to_string(),
        caption: spec.caption.to_string(),
        width,
        height,
        rgb: buf,
    })
}

fn dimensions(kind: &ChartKind) -> (u32, u32) {
    match kind {
        ChartKind::TimeHistogram => (900, 600),
        ChartKind::CategoryCounts(GroupField::Chapter) => (900, 1000),
        ChartKind::CategoryCounts(_) => (900, 600),
        ChartKind::TimeTrend(_) => (1100, 600),
        ChartKind::CountHeatmap {
            row_field: GroupField::Chapter,
            ..
        }
        | ChartKind::CountHeatmap {
            col_field: GroupField::Chapter,
            ..
        } => (1200, 900),
        ChartKind::CountHeatmap { .. } => (1000, 700),
        ChartKind::TimeDistribution(GroupField::Chapter) => (1100, 1100),
        ChartKind::TimeDistribution(_) => (1100, 700),
    }
}

/// Distinct grouping values in order of first appearance, the order the
/// student encountered them.
fn categories(rows: &[QuestionRow], field: &GroupField) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for row in rows {
        let value = field.value(row);
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Distinct grouping values in sorted order, for grid axes.
fn sorted_categories(rows: &[QuestionRow], field: &GroupField) -> Vec<String> {
    let mut out = categories(rows, field);
    out.sort();
    out
}

fn label_area_width(field: &GroupField) -> u32 {
    match field {
        GroupField::Chapter => 220,
        GroupField::Section => 130,
        _ => 100,
    }
}

fn draw_histogram(root: &Root, spec: &ChartSpec, rows: &[QuestionRow]) -> Result<(), ReportError> {
    let times: Vec<f64> = rows.iter().map(|r| r.time_taken as f64).collect();
    let max_time = times.iter().cloned().fold(0.0_f64, f64::max).max(1.0);
    let bin_width = max_time / HISTOGRAM_BINS as f64;

    let mut counts = vec![0usize; HISTOGRAM_BINS];
    for t in &times {
        let mut idx = (t / bin_width) as usize;
        if idx >= HISTOGRAM_BINS {
            idx = HISTOGRAM_BINS - 1;
        }
        counts[idx] += 1;
    }
    let max_count = counts.iter().max().copied().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..max_time, 0f64..(max_count as f64 * 1.1))
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc("Time Taken (s)")
        .y_desc("Count")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, &c)| {
            let x0 = i as f64 * bin_width;
            Rectangle::new([(x0, 0.0), (x0 + bin_width, c as f64)], BAR_COLOR.filled())
        }))
        .map_err(chart_err)?;
    Ok(())
}

fn draw_counts(
    root: &Root,
    spec: &ChartSpec,
    rows: &[QuestionRow],
    field: &GroupField,
) -> Result<(), ReportError> {
    let cats = categories(rows, field);
    let counts: Vec<u32> = cats
        .iter()
        .map(|c| rows.iter().filter(|r| field.value(r) == *c).count() as u32)
        .collect();
    let max_count = counts.iter().max().copied().unwrap_or(0).max(1);
    let n = cats.len() as i32;

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(label_area_width(field))
        .build_cartesian_2d(0u32..(max_count + 1), (0..n).into_segmented())
        .map_err(chart_err)?;

    let label_for = |seg: &SegmentValue<i32>| match seg {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            cats.get(*i as usize).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_label_formatter(&label_for)
        .x_desc("Count")
        .y_desc(field.label())
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, &c)| {
            Rectangle::new(
                [
                    (0, SegmentValue::Exact(i as i32)),
                    (c, SegmentValue::Exact(i as i32 + 1)),
                ],
                BAR_COLOR.filled(),
            )
        }))
        .map_err(chart_err)?;
    Ok(())
}

fn draw_trend(
    root: &Root,
    spec: &ChartSpec,
    rows: &[QuestionRow],
    group: Option<&GroupField>,
) -> Result<(), ReportError> {
    let n = rows.len();
    let max_time = rows
        .iter()
        .map(|r| r.time_taken)
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(0f64..(n as f64), 0f64..(max_time * 1.05))
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc("Question Index")
        .y_desc("Time Taken (s)")
        .draw()
        .map_err(chart_err)?;

    match group {
        None => {
            chart
                .draw_series(LineSeries::new(
                    rows.iter()
                        .enumerate()
                        .map(|(i, r)| (i as f64, r.time_taken as f64)),
                    &BAR_COLOR,
                ))
                .map_err(chart_err)?;
        }
        Some(field) => {
            for (k, cat) in categories(rows, field).iter().enumerate() {
                let color = Palette99::pick(k).to_rgba();
                let points: Vec<(f64, f64)> = rows
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| field.value(r) == *cat)
                    .map(|(i, r)| (i as f64, r.time_taken as f64))
                    .collect();
                chart
                    .draw_series(LineSeries::new(points, &color))
                    .map_err(chart_err)?;
            }
        }
    }
    Ok(())
}

fn draw_heatmap(
    root: &Root,
    spec: &ChartSpec,
    rows: &[QuestionRow],
    row_field: &GroupField,
    col_field: &GroupField,
) -> Result<(), ReportError> {
    let row_cats = sorted_categories(rows, row_field);
    let col_cats = sorted_categories(rows, col_field);
    let nr = row_cats.len();
    let nc = col_cats.len();

    let mut counts = vec![vec![0usize; nc]; nr];
    for row in rows {
        let ri = row_cats.iter().position(|c| *c == row_field.value(row));
        let ci = col_cats.iter().position(|c| *c == col_field.value(row));
        if let (Some(ri), Some(ci)) = (ri, ci) {
            counts[ri][ci] += 1;
        }
    }
    let max_count = counts.iter().flatten().max().copied().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(110)
        .y_label_area_size(label_area_width(row_field))
        .build_cartesian_2d(0f64..(nc as f64), 0f64..(nr as f64))
        .map_err(chart_err)?;

    let x_label = |v: &f64| {
        let idx = v.floor();
        if idx < 0.0 {
            return String::new();
        }
        col_cats.get(idx as usize).cloned().unwrap_or_default()
    };
    // Grid rows are drawn top-down: row 0 occupies the highest band.
    let y_label = |v: &f64| {
        let idx = v.floor();
        if idx < 0.0 || idx as usize >= nr {
            return String::new();
        }
        row_cats
            .get(nr - 1 - idx as usize)
            .cloned()
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(nc)
        .y_labels(nr)
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .x_desc(col_field.label())
        .y_desc(row_field.label())
        .draw()
        .map_err(chart_err)?;

    let mut cells = Vec::with_capacity(nr * nc);
    for (i, row_counts) in counts.iter().enumerate() {
        for (j, &count) in row_counts.iter().enumerate() {
            cells.push((i, j, count));
        }
    }

    chart
        .draw_series(cells.iter().map(|&(i, j, count)| {
            let y0 = (nr - 1 - i) as f64;
            Rectangle::new(
                [(j as f64, y0), (j as f64 + 1.0, y0 + 1.0)],
                heat_color(count, max_count).filled(),
            )
        }))
        .map_err(chart_err)?;
    chart
        .draw_series(cells.iter().map(|&(i, j, count)| {
            let y0 = (nr - 1 - i) as f64;
            Text::new(
                count.to_string(),
                (j as f64 + 0.45, y0 + 0.5),
                ("sans-serif", 15).into_font().color(&BLACK),
            )
        }))
        .map_err(chart_err)?;
    Ok(())
}

fn draw_distribution(
    root: &Root,
    spec: &ChartSpec,
    rows: &[QuestionRow],
    field: &GroupField,
) -> Result<(), ReportError> {
    let cats = categories(rows, field);
    let n = cats.len();
    let max_time = rows
        .iter()
        .map(|r| r.time_taken)
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(spec.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(45)
        .y_label_area_size(label_area_width(field))
        .build_cartesian_2d(0f64..(max_time * 1.05), 0f64..(n as f64))
        .map_err(chart_err)?;

    let y_label = |v: &f64| {
        let idx = v.floor();
        if idx < 0.0 {
            return String::new();
        }
        cats.get(idx as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&y_label)
        .x_desc("Time Taken (s)")
        .y_desc(field.label())
        .draw()
        .map_err(chart_err)?;

    for (i, cat) in cats.iter().enumerate() {
        let values: Vec<u32> = rows
            .iter()
            .filter(|r| field.value(r) == *cat)
            .map(|r| r.time_taken)
            .collect();
        let lo = values.iter().min().copied().unwrap_or(0) as f64;
        let hi = values.iter().max().copied().unwrap_or(0) as f64;
        let q1 = percentile_linear(&values, 0.25).unwrap_or(lo);
        let q2 = percentile_linear(&values, 0.50).unwrap_or(lo);
        let q3 = percentile_linear(&values, 0.75).unwrap_or(hi);
        let y_center = i as f64 + 0.5;

        // Whisker, box, then median tick.
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(lo, y_center), (hi, y_center)],
                BLACK.stroke_width(1),
            )))
            .map_err(chart_err)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(q1, i as f64 + 0.2), (q3, i as f64 + 0.8)],
                BAR_COLOR.mix(0.45).filled(),
            )))
            .map_err(chart_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(q2, i as f64 + 0.2), (q2, i as f64 + 0.8)],
                BLACK.stroke_width(2),
            )))
            .map_err(chart_err)?;
    }
    Ok(())
}

/// Yellow-to-red ramp for heatmap cells, scaled to the maximum count.
fn heat_color(value: usize, max: usize) -> RGBColor {
    let t = value as f64 / max as f64;
    let (from, to, frac) = if t < 0.5 {
        ((255.0, 255.0, 204.0), (253.0, 141.0, 60.0), t * 2.0)
    } else {
        ((253.0, 141.0, 60.0), (128.0, 0.0, 38.0), (t - 0.5) * 2.0)
    };
    RGBColor(
        lerp(from.0, to.0, frac),
        lerp(from.1, to.1, frac),
        lerp(from.2, to.2, frac),
    )
}

fn lerp(from: f64, to: f64, t: f64) -> u8 {
    (from + (to - from) * t).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_color_spans_the_ramp() {
        assert_eq!(heat_color(0, 10), RGBColor(255, 255, 204));
        assert_eq!(heat_color(10, 10), RGBColor(128, 0, 38));
        // Midpoint lands on the ramp's pivot color.
        assert_eq!(heat_color(5, 10), RGBColor(253, 141, 60));
    }

    #[test]
    fn category_order_is_first_appearance() {
        let row = |chapter: &str| QuestionRow {
            subject: crate::types::Subject::Physics,
            chapter: chapter.to_string(),
            level: "easy".to_string(),
            is_correct: true,
            time_taken: 10,
            status: "answered".to_string(),
            section: None,
        };
        let rows = vec![row("Waves"), row("Optics"), row("Waves"), row("Atoms")];
        assert_eq!(
            categories(&rows, &GroupField::Chapter),
            vec!["Waves", "Optics", "Atoms"]
        );
        assert_eq!(
            sorted_categories(&rows, &GroupField::Chapter),
            vec!["Atoms", "Optics", "Waves"]
        );
    }
}
