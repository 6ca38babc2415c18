use serde::{Deserialize, Serialize};

use super::{cpu::CpuData, ExtraFields};

/// Bits per second in one Mbps.
pub const BITS_PER_MBPS: f64 = 1_000_000.0;

/// One benchmark execution: the CSV throughput/RTT rows plus the optional
/// CPU/PMU document recorded alongside them.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: i64,
    pub name: String,

    #[serde(default)]
    pub data: Vec<TestPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_data: Option<CpuData>,

    #[serde(default)]
    pub metadata: RunMetadata,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// One row of the throughput CSV. Throughputs are in bits/s, RTTs in µs.
/// Empty cells are `None`; columns other than these are kept in `extra`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct TestPoint {
    #[serde(rename = "Requested_Throughput", default, skip_serializing_if = "Option::is_none")]
    pub requested_throughput: Option<f64>,
    #[serde(rename = "Receive_Throughput", default, skip_serializing_if = "Option::is_none")]
    pub receive_throughput: Option<f64>,

    #[serde(rename = "Average_RTT", default, skip_serializing_if = "Option::is_none")]
    pub average_rtt: Option<f64>,
    #[serde(rename = "Minimum_RTT", default, skip_serializing_if = "Option::is_none")]
    pub minimum_rtt: Option<f64>,
    #[serde(rename = "Maximum_RTT", default, skip_serializing_if = "Option::is_none")]
    pub maximum_rtt: Option<f64>,
    #[serde(rename = "Stdev_RTT", default, skip_serializing_if = "Option::is_none")]
    pub stdev_rtt: Option<f64>,
    #[serde(rename = "Median_RTT", default, skip_serializing_if = "Option::is_none")]
    pub median_rtt: Option<f64>,

    #[serde(rename = "Bad_Packets", default, skip_serializing_if = "Option::is_none")]
    pub bad_packets: Option<f64>,

    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl TestPoint {
    pub fn requested_mbps(&self) -> Option<f64> {
        self.requested_throughput.map(|bps| bps / BITS_PER_MBPS)
    }

    pub fn received_mbps(&self) -> Option<f64> {
        self.receive_throughput.map(|bps| bps / BITS_PER_MBPS)
    }
}
