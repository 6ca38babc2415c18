//! Throughput-aligned comparison of benchmark runs.
//!
//! Runs rarely hit exactly the same throughput steps, so points are paired by
//! throughput proximity instead of by index: every baseline point takes the
//! nearest comparison point, and the pair only counts if the two throughputs
//! are less than [`THROUGHPUT_TOLERANCE_MBPS`] apart. System CPU, protection
//! domain CPU and PMU counters all go through [`compare_points`].

use serde::{Deserialize, Serialize};

use crate::models::{CpuType, CustomPlot, PlotType, Run, Session, TestPoint};

/// Two points pair up only if their throughputs differ by strictly less.
pub const THROUGHPUT_TOLERANCE_MBPS: f64 = 1.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Point {
    pub throughput_mbps: f64,
    pub value: f64,
}

impl Point {
    pub fn new(throughput_mbps: f64, value: f64) -> Self {
        Self {
            throughput_mbps,
            value,
        }
    }
}

/// Mean deltas of one comparison run against the baseline.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Deltas {
    /// Mean of the per-point percentage differences. `None` when no matched
    /// point had a positive baseline value.
    pub mean_relative_diff: Option<f64>,
    pub mean_absolute_diff: f64,
    pub matched_points: usize,
}

/// What to pull out of a run.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Metric<'a> {
    SystemCpu(CpuType),
    ProtectionDomain { name: &'a str, cpu_type: CpuType },
    Pmu(&'a str),
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RunRef {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RunComparison {
    pub run_id: i64,
    pub run_name: String,
    #[serde(flatten)]
    pub deltas: Deltas,
}

/// Comparison of every selected run against the baseline for one metric.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub metric: String,
    pub baseline: RunRef,
    pub comparisons: Vec<RunComparison>,
}

/// Linear scan for the candidate closest to `throughput_mbps`. On a tie the
/// earlier candidate wins. Returns `None` if the closest one is not within
/// the tolerance.
pub fn nearest_point(throughput_mbps: f64, candidates: &[Point]) -> Option<&Point> {
    let mut best: Option<(&Point, f64)> = None;
    for candidate in candidates {
        let distance = (candidate.throughput_mbps - throughput_mbps).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    best.filter(|(_, distance)| *distance < THROUGHPUT_TOLERANCE_MBPS)
        .map(|(point, _)| point)
}

/// Pairs every baseline point with its nearest comparison point and averages
/// the differences. Relative differences are averaged per point (mean of
/// ratios) and only for positive baseline values; absolute differences use
/// every matched pair. Returns `None` when nothing matched.
pub fn compare_points(baseline: &[Point], comparison: &[Point]) -> Option<Deltas> {
    let mut relative_sum = 0.0;
    let mut relative_count = 0usize;
    let mut absolute_sum = 0.0;
    let mut matched = 0usize;

    for base in baseline {
        let Some(other) = nearest_point(base.throughput_mbps, comparison) else {
            continue;
        };

        if base.value > 0.0 {
            relative_sum += (other.value - base.value) / base.value * 100.0;
            relative_count += 1;
        }
        absolute_sum += other.value - base.value;
        matched += 1;
    }

    if matched == 0 {
        return None;
    }

    Some(Deltas {
        mean_relative_diff: (relative_count > 0).then(|| relative_sum / relative_count as f64),
        mean_absolute_diff: absolute_sum / matched as f64,
        matched_points: matched,
    })
}

/// Received throughput (Mbps) of the CSV row that was driven at
/// `requested_mbps`, or `None` when no complete row was close enough.
fn received_mbps_at(rows: &[TestPoint], requested_mbps: f64) -> Option<f64> {
    let rows: Vec<Point> = rows
        .iter()
        .filter_map(|row| Some(Point::new(row.requested_mbps()?, row.received_mbps()?)))
        .collect();
    nearest_point(requested_mbps, &rows).map(|row| row.value)
}

/// Extracts `(throughput, value)` points of `metric` from `run`. Samples
/// that did not record the metric contribute no point.
///
/// CPU metrics are placed at the received throughput of the matching CSV
/// row. PMU metrics are placed at the declared throughput step instead.
pub fn metric_points(run: &Run, metric: Metric<'_>) -> Vec<Point> {
    let Some(cpu) = &run.cpu_data else {
        return vec![];
    };

    match metric {
        Metric::SystemCpu(cpu_type) => cpu
            .tests
            .iter()
            .filter_map(|test| {
                let value = test.system_utilization(cpu_type)?;
                let x = received_mbps_at(&run.data, test.throughput_mbps)?;
                Some(Point::new(x, value))
            })
            .collect(),
        Metric::ProtectionDomain { name, cpu_type } => cpu
            .tests
            .iter()
            .filter_map(|test| {
                let value = test.protection_domain_utilization(name, cpu_type)?;
                let x = received_mbps_at(&run.data, test.throughput_mbps)?;
                Some(Point::new(x, value))
            })
            .collect(),
        Metric::Pmu(name) => cpu
            .pmu_data
            .as_ref()
            .and_then(|pmu| pmu.get(name))
            .map(|values| {
                values
                    .iter()
                    .enumerate()
                    .filter_map(|(i, value)| {
                        let value = (*value)?;
                        Some(Point::new(cpu.pmu_throughput_step(i)?, value))
                    })
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Compares every run after the first against the first one. Runs that
/// matched no points are left out.
pub fn compare_runs(runs: &[&Run], metric: Metric<'_>) -> Vec<RunComparison> {
    let Some((baseline, others)) = runs.split_first() else {
        return vec![];
    };
    let baseline_points = metric_points(baseline, metric);

    others
        .iter()
        .filter_map(|run| {
            let deltas = compare_points(&baseline_points, &metric_points(run, metric))?;
            Some(RunComparison {
                run_id: run.id,
                run_name: run.name.clone(),
                deltas,
            })
        })
        .collect()
}

/// Statistics behind a custom plot: one entry per plotted metric, each
/// comparing the plot's runs against its first selected run.
///
/// Selected run ids the session does not know are skipped. With fewer than
/// two runs there is nothing to compare and the result is empty.
pub fn plot_statistics(session: &Session, plot: &CustomPlot) -> Vec<MetricComparison> {
    let runs: Vec<&Run> = plot
        .selected_runs
        .iter()
        .filter_map(|id| session.run(*id))
        .collect();
    if runs.len() < 2 {
        return vec![];
    }

    let baseline = runs[0];
    let baseline_cpu = baseline.cpu_data.as_ref();
    let baseline_ref = RunRef {
        id: baseline.id,
        name: baseline.name.clone(),
    };

    let build = |label: String, metric: Metric<'_>| MetricComparison {
        metric: label,
        baseline: baseline_ref.clone(),
        comparisons: compare_runs(&runs, metric),
    };

    match plot.plot_type {
        PlotType::ThroughputCpu => vec![build(
            "system".to_string(),
            Metric::SystemCpu(plot.cpu_type),
        )],
        PlotType::ProtectionDomains => {
            let names = if plot.selected_pds.is_empty() {
                baseline_cpu
                    .map(|cpu| cpu.protection_domain_names())
                    .unwrap_or_default()
            } else {
                plot.selected_pds.clone()
            };
            names
                .iter()
                .map(|name| {
                    build(
                        name.clone(),
                        Metric::ProtectionDomain {
                            name: name.as_str(),
                            cpu_type: plot.cpu_type,
                        },
                    )
                })
                .collect()
        }
        PlotType::CacheMetrics => {
            let names = if plot.cache_metrics.is_empty() {
                baseline_cpu
                    .map(|cpu| cpu.pmu_metric_names())
                    .unwrap_or_default()
            } else {
                plot.cache_metrics.clone()
            };
            names
                .iter()
                .map(|name| build(name.clone(), Metric::Pmu(name.as_str())))
                .collect()
        }
    }
}
