use serde::{Deserialize, Serialize};

/// Rolling window statistics, in microseconds unless stated otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowStatistics {
    #[serde(rename = "min")]
    pub minimum: Option<i64>,
    #[serde(rename = "max")]
    pub maximum: Option<i64>,
    #[serde(rename = "avg")]
    pub average: Option<i64>,
    pub sum: Option<i64>,
    /// Number of values sampled.
    #[serde(rename = "cnt")]
    pub count: Option<i64>,
    #[serde(rename = "stddev")]
    pub standard_deviation: Option<i64>,
    /// Memory size of the HDR histogram.
    #[serde(rename = "hdrsize")]
    pub hdr_size: Option<i64>,
    pub p50: Option<i64>,
    pub p75: Option<i64>,
    pub p90: Option<i64>,
    pub p95: Option<i64>,
    pub p99: Option<i64>,
    pub p99_99: Option<i64>,
    /// Values skipped because they were outside the histogram range.
    #[serde(rename = "outofrange")]
    pub out_of_range: Option<i64>,
}
