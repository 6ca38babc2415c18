use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{plot::CpuType, ExtraFields};

/// The CPU/PMU document uploaded next to a run's CSV.
///
/// Readings are optional everywhere: a missing or `null` value means the
/// metric was not recorded and never stands in for zero.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct CpuData {
    #[serde(default)]
    pub tests: Vec<TestCpuSample>,

    /// Counter series per metric, one entry per test step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmu_data: Option<BTreeMap<String, Vec<Option<f64>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CpuMetadata>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct CpuMetadata {
    #[serde(default)]
    pub test_throughputs: Vec<f64>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct TestCpuSample {
    pub throughput_mbps: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemCpu>,
    #[serde(default)]
    pub cores: Vec<CoreSample>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct SystemCpu {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_utilization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_cpu_utilization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_cpu_utilization: Option<f64>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct CoreSample {
    #[serde(default)]
    pub protection_domains: Vec<ProtectionDomainSample>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Per-core sample of a protection domain. `name` identifies the domain
/// within one core only; the same name may show up on several cores.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct ProtectionDomainSample {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_utilization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_cpu_utilization: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_cpu_utilization: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cycles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_cycles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_cycles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_entries: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedules: Option<f64>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl SystemCpu {
    pub fn utilization(&self, cpu_type: CpuType) -> Option<f64> {
        match cpu_type {
            CpuType::Total => self.cpu_utilization,
            CpuType::Kernel => self.kernel_cpu_utilization,
            CpuType::User => self.user_cpu_utilization,
        }
    }
}

impl ProtectionDomainSample {
    pub fn utilization(&self, cpu_type: CpuType) -> Option<f64> {
        match cpu_type {
            CpuType::Total => self.cpu_utilization,
            CpuType::Kernel => self.kernel_cpu_utilization,
            CpuType::User => self.user_cpu_utilization,
        }
    }
}

impl TestCpuSample {
    /// System utilization of this sample, `None` if it was not recorded.
    pub fn system_utilization(&self, cpu_type: CpuType) -> Option<f64> {
        self.system.as_ref()?.utilization(cpu_type)
    }

    /// Utilization of the named protection domain summed over every core that
    /// reports it. `None` if no core has a reading for it in this sample.
    pub fn protection_domain_utilization(&self, name: &str, cpu_type: CpuType) -> Option<f64> {
        self.cores
            .iter()
            .flat_map(|core| core.protection_domains.iter())
            .filter(|pd| pd.name == name)
            .filter_map(|pd| pd.utilization(cpu_type))
            .fold(None, |acc, value| Some(acc.unwrap_or(0.0) + value))
    }
}

impl CpuData {
    /// Protection domain names in the order they are first seen.
    pub fn protection_domain_names(&self) -> Vec<String> {
        self.tests
            .iter()
            .flat_map(|test| test.cores.iter())
            .flat_map(|core| core.protection_domains.iter())
            .map(|pd| pd.name.clone())
            .unique()
            .collect()
    }

    pub fn pmu_metric_names(&self) -> Vec<String> {
        self.pmu_data
            .as_ref()
            .map(|pmu| pmu.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Throughput step of the `index`-th PMU sample: the declared step when
    /// the metadata has one, the measured test throughput otherwise.
    pub fn pmu_throughput_step(&self, index: usize) -> Option<f64> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.test_throughputs.get(index).copied())
            .or_else(|| self.tests.get(index).map(|test| test.throughput_mbps))
    }
}
