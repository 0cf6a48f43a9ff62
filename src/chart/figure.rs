use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, NaiveTime};

use super::{Axis, ChartArgs, ChartError, ChartKind};
use crate::data::model::{CellValue, Column, ColumnKind, Dataset};

const SECONDS_PER_DAY: f64 = 86_400.0;
/// Fraction of a slot a bar (or a group of boxes) occupies.
const SLOT_FILL: f64 = 0.8;

// ---------------------------------------------------------------------------
// Figure – renderer-independent description of a chart
// ---------------------------------------------------------------------------

/// How plot coordinates on one axis map back to labels.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisScale {
    Linear,
    /// Coordinates are days since the Unix epoch.
    Temporal,
    /// Coordinate `i` is `labels[i]`.
    Categorical(Vec<String>),
}

impl AxisScale {
    /// Tick label for a plot coordinate.
    pub fn format_tick(&self, value: f64) -> String {
        match self {
            AxisScale::Linear => value.to_string(),
            AxisScale::Temporal => match from_days(value) {
                Some(dt) if dt.time() == NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
                Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
                None => String::new(),
            },
            AxisScale::Categorical(labels) => {
                let idx = value.round();
                if (value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarSegment {
    pub x: f64,
    pub base: f64,
    pub height: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSummary {
    pub x: f64,
    pub width: f64,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Bars(Vec<BarSegment>),
    Line(Vec<[f64; 2]>),
    Points(Vec<[f64; 2]>),
    Boxes(Vec<BoxSummary>),
}

/// One legend entry: a colour group.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub name: String,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub kind: ChartKind,
    pub x_title: String,
    pub y_title: String,
    pub x_scale: AxisScale,
    pub y_scale: AxisScale,
    pub traces: Vec<Trace>,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// Build a figure from validated arguments.
pub fn build(
    dataset: &Dataset,
    kind: ChartKind,
    args: &ChartArgs,
    max_bins: usize,
) -> Result<Figure, ChartError> {
    let x_col = lookup(dataset, args, Axis::X)?.ok_or(ChartError::MissingAxes { kind })?;
    let y_col = lookup(dataset, args, Axis::Y)?;
    let color_col = lookup(dataset, args, Axis::Color)?;

    let x = Encoded::from_column(x_col);
    let y = y_col.map(Encoded::from_column);
    let default_name = y_col.unwrap_or(x_col).name.as_str();
    let groups = color_groups(dataset.len(), color_col, default_name);

    let x_title = x_col.name.clone();
    let figure = match (kind, y_col.zip(y)) {
        (ChartKind::Histogram, y) => {
            let summed = y.filter(|(_, enc)| enc.scale == AxisScale::Linear);
            let y_title = match summed {
                Some((col, _)) => format!("sum of {}", col.name),
                None => "count".to_string(),
            };
            Figure {
                kind,
                x_title,
                y_title,
                y_scale: AxisScale::Linear,
                traces: histogram(&x, summed.as_ref().map(|(_, enc)| enc), &groups, max_bins),
                x_scale: x.scale,
            }
        }
        (_, None) => return Err(ChartError::MissingAxes { kind }),
        (_, Some((y_col, y))) => {
            let traces = match kind {
                ChartKind::Bar => bars(&x, &y, &groups),
                ChartKind::Box => boxes(&x, &y, &groups),
                ChartKind::Line => xy_traces(&x, &y, &groups, Geometry::Line),
                _ => xy_traces(&x, &y, &groups, Geometry::Points),
            };
            Figure {
                kind,
                x_title,
                y_title: y_col.name.clone(),
                x_scale: x.scale,
                y_scale: y.scale,
                traces,
            }
        }
    };
    Ok(figure)
}

fn lookup<'a>(
    dataset: &'a Dataset,
    args: &ChartArgs,
    axis: Axis,
) -> Result<Option<&'a Column>, ChartError> {
    args.get(&axis)
        .map(|name| {
            dataset
                .column(name)
                .ok_or_else(|| ChartError::UnknownColumn(name.clone()))
        })
        .transpose()
}

/// A column mapped to plot coordinates.
#[derive(Debug, Clone)]
struct Encoded {
    scale: AxisScale,
    positions: Vec<Option<f64>>,
}

impl Encoded {
    fn from_column(column: &Column) -> Self {
        match column.kind {
            ColumnKind::Numeric => Encoded {
                scale: AxisScale::Linear,
                positions: column.values.iter().map(CellValue::as_f64).collect(),
            },
            ColumnKind::Temporal => Encoded {
                scale: AxisScale::Temporal,
                positions: column
                    .values
                    .iter()
                    .map(|v| v.as_datetime().map(to_days))
                    .collect(),
            },
            ColumnKind::Categorical | ColumnKind::Unrecognized => {
                let mut labels: Vec<String> = Vec::new();
                let mut index: HashMap<String, usize> = HashMap::new();
                let positions = column
                    .values
                    .iter()
                    .map(|v| {
                        if v.is_null() {
                            return None;
                        }
                        let label = v.to_string();
                        let next = labels.len();
                        let i = *index.entry(label.clone()).or_insert_with(|| {
                            labels.push(label);
                            next
                        });
                        Some(i as f64)
                    })
                    .collect();
                Encoded {
                    scale: AxisScale::Categorical(labels),
                    positions,
                }
            }
        }
    }

    /// Smallest gap between distinct coordinates, or 1 with fewer than two.
    fn slot_width(&self) -> f64 {
        let mut xs: Vec<f64> = self.positions.iter().flatten().copied().collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        xs.windows(2)
            .map(|w| w[1] - w[0])
            .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
            .unwrap_or(1.0)
    }
}

pub fn to_days(dt: NaiveDateTime) -> f64 {
    dt.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

pub fn from_days(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    DateTime::from_timestamp((days * SECONDS_PER_DAY).round() as i64, 0).map(|dt| dt.naive_utc())
}

/// Row groups keyed by colour value, in order of first appearance.
fn color_groups(rows: usize, color: Option<&Column>, default_name: &str) -> Vec<(String, Vec<usize>)> {
    let Some(color) = color else {
        return vec![(default_name.to_string(), (0..rows).collect())];
    };
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (row, value) in color.values.iter().enumerate() {
        let label = value.to_string();
        let slot = *index.entry(label.clone()).or_insert_with(|| {
            groups.push((label, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row);
    }
    groups
}

// -- Stacking --

/// Running bar tops per x, kept apart for positive and negative heights.
#[derive(Default)]
struct Stacker {
    tops: HashMap<u64, (f64, f64)>,
}

impl Stacker {
    fn place(&mut self, x: f64, width: f64, height: f64) -> BarSegment {
        let (pos, neg) = self.tops.entry(x.to_bits()).or_insert((0.0, 0.0));
        let top = if height >= 0.0 { pos } else { neg };
        let base = *top;
        *top += height;
        BarSegment {
            x,
            base,
            height,
            width,
        }
    }
}

/// Sum `weight` per x coordinate, sorted by x.
fn sum_by_x(rows: &[usize], x: &Encoded, weight: impl Fn(usize) -> Option<f64>) -> Vec<(f64, f64)> {
    let mut sums: HashMap<u64, f64> = HashMap::new();
    for &row in rows {
        if let (Some(xv), Some(w)) = (x.positions[row], weight(row)) {
            *sums.entry(xv.to_bits()).or_insert(0.0) += w;
        }
    }
    let mut out: Vec<(f64, f64)> = sums.into_iter().map(|(k, v)| (f64::from_bits(k), v)).collect();
    out.sort_by(|a, b| a.0.total_cmp(&b.0));
    out
}

// -- Chart kinds --

fn histogram(
    x: &Encoded,
    y: Option<&Encoded>,
    groups: &[(String, Vec<usize>)],
    max_bins: usize,
) -> Vec<Trace> {
    let weight = |row: usize| match y {
        Some(y) => y.positions[row],
        None => Some(1.0),
    };

    // Categorical x: one bar per category.  Otherwise bins shared by all groups.
    let (positions, bar_width) = match x.scale {
        AxisScale::Categorical(_) => (x.positions.clone(), SLOT_FILL),
        _ => {
            let present: Vec<f64> = x.positions.iter().flatten().copied().collect();
            let lo = present.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let (start, width, bins) = if hi > lo {
                let bins = sturges_bins(present.len(), max_bins);
                (lo, (hi - lo) / bins as f64, bins)
            } else {
                (lo - 0.5, 1.0, 1)
            };
            let centers = x
                .positions
                .iter()
                .map(|p| {
                    p.map(|v| {
                        let i = (((v - start) / width).floor() as usize).min(bins - 1);
                        start + width * (i as f64 + 0.5)
                    })
                })
                .collect();
            (centers, width)
        }
    };
    let binned = Encoded {
        scale: AxisScale::Linear,
        positions,
    };

    let mut stacker = Stacker::default();
    groups
        .iter()
        .map(|(name, rows)| {
            let segments = sum_by_x(rows, &binned, weight)
                .into_iter()
                .map(|(center, h)| stacker.place(center, bar_width, h))
                .collect();
            Trace {
                name: name.clone(),
                geometry: Geometry::Bars(segments),
            }
        })
        .collect()
}

/// Sturges' rule, capped.
fn sturges_bins(n: usize, max_bins: usize) -> usize {
    if n < 2 {
        return 1;
    }
    let bins = (n as f64).log2().ceil() as usize + 1;
    bins.clamp(1, max_bins.max(1))
}

fn bars(x: &Encoded, y: &Encoded, groups: &[(String, Vec<usize>)]) -> Vec<Trace> {
    let width = x.slot_width() * SLOT_FILL;
    let mut stacker = Stacker::default();
    groups
        .iter()
        .map(|(name, rows)| {
            let segments = sum_by_x(rows, x, |row| y.positions[row])
                .into_iter()
                .map(|(xv, h)| stacker.place(xv, width, h))
                .collect();
            Trace {
                name: name.clone(),
                geometry: Geometry::Bars(segments),
            }
        })
        .collect()
}

fn xy_traces(
    x: &Encoded,
    y: &Encoded,
    groups: &[(String, Vec<usize>)],
    shape: fn(Vec<[f64; 2]>) -> Geometry,
) -> Vec<Trace> {
    groups
        .iter()
        .map(|(name, rows)| {
            let points = rows
                .iter()
                .filter_map(|&row| Some([x.positions[row]?, y.positions[row]?]))
                .collect();
            Trace {
                name: name.clone(),
                geometry: shape(points),
            }
        })
        .collect()
}

fn boxes(x: &Encoded, y: &Encoded, groups: &[(String, Vec<usize>)]) -> Vec<Trace> {
    let slot = x.slot_width();
    let width = slot * SLOT_FILL / groups.len().max(1) as f64;
    groups
        .iter()
        .enumerate()
        .map(|(g, (name, rows))| {
            let mut by_x: HashMap<u64, Vec<f64>> = HashMap::new();
            for &row in rows {
                if let (Some(xv), Some(yv)) = (x.positions[row], y.positions[row]) {
                    by_x.entry(xv.to_bits()).or_default().push(yv);
                }
            }
            let offset = -slot * SLOT_FILL / 2.0 + width * (g as f64 + 0.5);
            let mut summaries: Vec<BoxSummary> = by_x
                .into_iter()
                .filter_map(|(xv, values)| {
                    box_summary(values, f64::from_bits(xv) + offset, width)
                })
                .collect();
            summaries.sort_by(|a, b| a.x.total_cmp(&b.x));
            Trace {
                name: name.clone(),
                geometry: Geometry::Boxes(summaries),
            }
        })
        .collect()
}

/// Quartiles by linear interpolation; whiskers reach the furthest values
/// within 1.5 IQR of the box.
fn box_summary(mut values: Vec<f64>, x: f64, width: f64) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let q1 = quantile(&values, 0.25);
    let median = quantile(&values, 0.5);
    let q3 = quantile(&values, 0.75);
    let reach = 1.5 * (q3 - q1);
    let lower_whisker = values
        .iter()
        .copied()
        .find(|&v| v >= q1 - reach)
        .unwrap_or(q1);
    let upper_whisker = values
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= q3 + reach)
        .unwrap_or(q3);
    Some(BoxSummary {
        x,
        width,
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
    })
}

fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
