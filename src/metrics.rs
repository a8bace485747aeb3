//! Cross-dimension metric projection.
//!
//! A [`MetricKey`] names one field of the host, channel or business
//! dimension. Projection evaluates a list of keys against selected hosts.

use crate::format::{format_percentage, format_rate};
use crate::mock::{HostMetric, Snapshot, TaskCounts};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "field", rename_all = "lowercase")]
pub enum MetricKey {
    Host(HostField),
    Channel(TaskField),
    Business(TaskField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostField {
    CpuUsage,
    MemoryUsage,
    DiskUsage,
    NetworkReadRate,
    NetworkWriteRate,
    ProcessCount,
    TaskCount,
}

/// Fields shared by the channel and business dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskField {
    TaskCount,
    SuccessCount,
    FailureCount,
    EmptyCount,
    DedupCount,
    SuccessRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Percent(f64),
    /// MB/s
    Rate(f64),
}

impl MetricValue {
    pub fn display(self) -> String {
        match self {
            Self::Count(n) => n.to_string(),
            Self::Percent(p) => format_percentage(p),
            Self::Rate(r) => format_rate(r),
        }
    }
}

impl HostField {
    pub const ALL: [HostField; 7] = [
        Self::CpuUsage,
        Self::MemoryUsage,
        Self::DiskUsage,
        Self::NetworkReadRate,
        Self::NetworkWriteRate,
        Self::ProcessCount,
        Self::TaskCount,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::CpuUsage => "CPU usage",
            Self::MemoryUsage => "Memory usage",
            Self::DiskUsage => "Disk usage",
            Self::NetworkReadRate => "Network read rate",
            Self::NetworkWriteRate => "Network write rate",
            Self::ProcessCount => "Processes",
            Self::TaskCount => "Tasks",
        }
    }

    pub fn value(self, metric: &HostMetric) -> MetricValue {
        match self {
            Self::CpuUsage => MetricValue::Percent(metric.cpu_usage as f64),
            Self::MemoryUsage => MetricValue::Percent(metric.memory_usage as f64),
            Self::DiskUsage => MetricValue::Percent(metric.disk_usage as f64),
            Self::NetworkReadRate => MetricValue::Rate(metric.network_read_rate),
            Self::NetworkWriteRate => MetricValue::Rate(metric.network_write_rate),
            Self::ProcessCount => MetricValue::Count(metric.process_count as u64),
            Self::TaskCount => MetricValue::Count(metric.task_count),
        }
    }
}

impl TaskField {
    pub const ALL: [TaskField; 6] = [
        Self::TaskCount,
        Self::SuccessCount,
        Self::FailureCount,
        Self::EmptyCount,
        Self::DedupCount,
        Self::SuccessRate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::TaskCount => "Tasks",
            Self::SuccessCount => "Successful tasks",
            Self::FailureCount => "Failed tasks",
            Self::EmptyCount => "Empty tasks",
            Self::DedupCount => "Deduplicated tasks",
            Self::SuccessRate => "Success rate",
        }
    }

    pub fn value<T: TaskCounts>(self, row: &T) -> MetricValue {
        match self {
            Self::TaskCount => MetricValue::Count(row.task_count()),
            Self::SuccessCount => MetricValue::Count(row.success_count()),
            Self::FailureCount => MetricValue::Count(row.failure_count()),
            Self::EmptyCount => MetricValue::Count(row.empty_count()),
            Self::DedupCount => MetricValue::Count(row.dedup_count()),
            Self::SuccessRate => {
                let rate = if row.task_count() > 0 {
                    row.success_count() as f64 / row.task_count() as f64 * 100.0
                } else {
                    0.0
                };
                MetricValue::Percent(rate)
            }
        }
    }
}

impl MetricKey {
    /// Every selectable key, host dimension first.
    pub fn all() -> Vec<MetricKey> {
        HostField::ALL
            .into_iter()
            .map(MetricKey::Host)
            .chain(TaskField::ALL.into_iter().map(MetricKey::Channel))
            .chain(TaskField::ALL.into_iter().map(MetricKey::Business))
            .collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Host(f) => f.label(),
            Self::Channel(f) | Self::Business(f) => f.label(),
        }
    }
}

/// Summed task counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub task: u64,
    pub success: u64,
    pub failure: u64,
    pub empty: u64,
    pub dedup: u64,
}

impl Totals {
    pub fn add<T: TaskCounts>(&mut self, row: &T) {
        self.task += row.task_count();
        self.success += row.success_count();
        self.failure += row.failure_count();
        self.empty += row.empty_count();
        self.dedup += row.dedup_count();
    }
}

impl TaskCounts for Totals {
    fn task_count(&self) -> u64 {
        self.task
    }
    fn success_count(&self) -> u64 {
        self.success
    }
    fn failure_count(&self) -> u64 {
        self.failure
    }
    fn empty_count(&self) -> u64 {
        self.empty
    }
    fn dedup_count(&self) -> u64 {
        self.dedup
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRequest {
    pub keys: Vec<MetricKey>,
    /// Empty selects every host.
    #[serde(default)]
    pub host_ips: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cell {
    pub key: MetricKey,
    pub label: &'static str,
    pub value: MetricValue,
    pub display: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedRow {
    pub ip: String,
    pub sample_time: String,
    pub cells: Vec<Cell>,
}

/// Evaluate `request.keys` for each selected host.
///
/// Channel fields sum the channel summaries the host works for; business
/// fields sum the business rollups the host contributes to.
pub fn project(snapshot: &Snapshot, request: &ProjectionRequest) -> Vec<ProjectedRow> {
    let wanted: HashSet<&str> = request.host_ips.iter().map(String::as_str).collect();

    snapshot
        .host_metrics
        .iter()
        .filter(|m| wanted.is_empty() || wanted.contains(m.ip.as_str()))
        .map(|metric| {
            let details: Vec<_> = snapshot
                .channel_details
                .iter()
                .filter(|d| d.ip == metric.ip)
                .collect();

            let parents: HashSet<&str> = details.iter().map(|d| d.parent_id.as_str()).collect();
            let mut channel = Totals::default();
            for summary in snapshot
                .channel_summaries
                .iter()
                .filter(|s| parents.contains(s.id.as_str()))
            {
                channel.add(summary);
            }

            let businesses: HashSet<&str> =
                details.iter().map(|d| d.business_name.as_str()).collect();
            let mut business = Totals::default();
            for rollup in snapshot
                .business_metrics
                .iter()
                .filter(|b| businesses.contains(b.business_name.as_str()))
            {
                business.add(rollup);
            }

            let cells = request
                .keys
                .iter()
                .map(|&key| {
                    let value = match key {
                        MetricKey::Host(f) => f.value(metric),
                        MetricKey::Channel(f) => f.value(&channel),
                        MetricKey::Business(f) => f.value(&business),
                    };
                    Cell {
                        key,
                        label: key.label(),
                        value,
                        display: value.display(),
                    }
                })
                .collect();

            ProjectedRow {
                ip: metric.ip.clone(),
                sample_time: metric.sample_time.clone(),
                cells,
            }
        })
        .collect()
}
