use serde::{Deserialize, Serialize};

use super::ExtraFields;

/// A user-defined plot over some of a session's runs. Only the selection is
/// stored, never computed values.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CustomPlot {
    pub id: i64,
    pub name: String,

    /// Run ids in selection order; the first one is the baseline.
    #[serde(default)]
    pub selected_runs: Vec<i64>,
    pub plot_type: PlotType,

    #[serde(rename = "selectedPDs", default)]
    pub selected_pds: Vec<String>,
    #[serde(default)]
    pub cpu_type: CpuType,
    #[serde(default)]
    pub cache_metrics: Vec<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "kebab-case")]
pub enum PlotType {
    ThroughputCpu,
    ProtectionDomains,
    CacheMetrics,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum CpuType {
    #[default]
    Total,
    Kernel,
    User,
}
