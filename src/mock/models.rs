//! Inventory model types.
//!
//! Status enums serialize as their integer codes so a consuming UI sees the
//! same values it always has.

use serde::{Deserialize, Serialize};

/// Whether a host is live or logically removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EnabledStatus {
    Enabled = 1,
    SoftDeleted = 2,
}

impl EnabledStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::SoftDeleted => "soft-deleted",
        }
    }
}

impl TryFrom<u8> for EnabledStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Enabled),
            2 => Ok(Self::SoftDeleted),
            other => Err(format!("invalid enabled status: {}", other)),
        }
    }
}

impl From<EnabledStatus> for u8 {
    fn from(status: EnabledStatus) -> Self {
        status as u8
    }
}

/// Utilization bucket assigned by operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ManagementStatus {
    Normal = 1,
    LowUtilization = 2,
    /// Available for reassignment from the shared pool.
    Poolable = 3,
}

impl ManagementStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::LowUtilization => "low-utilization",
            Self::Poolable => "poolable",
        }
    }
}

impl TryFrom<u8> for ManagementStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Normal),
            2 => Ok(Self::LowUtilization),
            3 => Ok(Self::Poolable),
            other => Err(format!("invalid management status: {}", other)),
        }
    }
}

impl From<ManagementStatus> for u8 {
    fn from(status: ManagementStatus) -> Self {
        status as u8
    }
}

/// Health as reported by the metrics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DeviceStatus {
    Normal = 1,
    MissingMetrics = 2,
    AbnormalLoad = 3,
}

impl DeviceStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::MissingMetrics => "missing-metrics",
            Self::AbnormalLoad => "abnormal-load",
        }
    }
}

impl TryFrom<u8> for DeviceStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Normal),
            2 => Ok(Self::MissingMetrics),
            3 => Ok(Self::AbnormalLoad),
            other => Err(format!("invalid device status: {}", other)),
        }
    }
}

impl From<DeviceStatus> for u8 {
    fn from(status: DeviceStatus) -> Self {
        status as u8
    }
}

/// Which status field a change record touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OperationType {
    ManagementStatus = 1,
    DeviceStatus = 2,
}

impl OperationType {
    pub fn label(self) -> &'static str {
        match self {
            Self::ManagementStatus => "management-status",
            Self::DeviceStatus => "device-status",
        }
    }
}

impl TryFrom<u8> for OperationType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::ManagementStatus),
            2 => Ok(Self::DeviceStatus),
            other => Err(format!("invalid operation type: {}", other)),
        }
    }
}

impl From<OperationType> for u8 {
    fn from(op: OperationType) -> Self {
        op as u8
    }
}

/// Kind of work a channel processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskType {
    List,
    Data,
    Detail,
}

/// A cloud virtual machine inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub id: String,
    pub vendor: String,
    pub region: String,
    pub ip: String,
    /// Cores
    pub cpu: u32,
    /// GB
    pub memory: u32,
    /// GB
    pub disk: u32,
    /// Mbps
    pub bandwidth: u32,
    pub system: String,
    pub online_time: String,
    pub owner: String,
    pub department: String,
    pub shared_department: String,
    pub enabled_status: EnabledStatus,
    pub management_status: ManagementStatus,
    pub device_status: DeviceStatus,
}

/// Weekly and monthly utilization of a host flagged as wasteful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InefficientHost {
    pub ip: String,
    pub sample_time: String,
    pub cpu_usage_weekly: u32,
    pub memory_usage_weekly: u32,
    pub disk_usage_weekly: u32,
    pub network_read_rate_weekly: f64,
    pub network_write_rate_weekly: f64,
    pub cpu_usage_monthly: u32,
    pub memory_usage_monthly: u32,
    pub disk_usage_monthly: u32,
    pub network_read_rate_monthly: f64,
    pub network_write_rate_monthly: f64,
}

/// Point-in-time resource usage of a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMetric {
    pub ip: String,
    pub sample_time: String,
    pub cpu_usage: u32,
    pub memory_usage: u32,
    pub disk_usage: u32,
    /// MB/s
    pub network_read_rate: f64,
    /// MB/s
    pub network_write_rate: f64,
    pub process_count: u32,
    pub task_count: u64,
    pub running_processes: String,
}

/// Task outcome counters shared by channel, detail and business rows.
pub trait TaskCounts {
    fn task_count(&self) -> u64;
    fn success_count(&self) -> u64;
    fn failure_count(&self) -> u64;
    fn empty_count(&self) -> u64;
    fn dedup_count(&self) -> u64;
}

macro_rules! impl_task_counts {
    ($($ty:ty),*) => {
        $(impl TaskCounts for $ty {
            fn task_count(&self) -> u64 { self.task_count }
            fn success_count(&self) -> u64 { self.success_count }
            fn failure_count(&self) -> u64 { self.failure_count }
            fn empty_count(&self) -> u64 { self.empty_count }
            fn dedup_count(&self) -> u64 { self.dedup_count }
        })*
    };
}

/// Per-channel task totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMetricSummary {
    pub id: String,
    pub channel_name: String,
    pub task_type: TaskType,
    pub sample_time: String,
    pub task_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub empty_count: u64,
    pub dedup_count: u64,
}

/// One host's share of a channel's work for a business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMetricDetail {
    /// Id of the owning [`ChannelMetricSummary`].
    pub parent_id: String,
    pub business_name: String,
    pub ip: String,
    pub sample_time: String,
    pub task_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub empty_count: u64,
    pub dedup_count: u64,
}

/// Audit entry for a status change on a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostChangeRecord {
    pub sample_time: String,
    pub ip: String,
    pub operation_type: OperationType,
    pub operator: String,
    pub old_value: String,
    pub new_value: String,
    pub remark: String,
}

/// Detail rows rolled up by business name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetric {
    pub business_name: String,
    /// Latest sample time among the contributing rows.
    pub sample_time: String,
    pub task_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub empty_count: u64,
    pub dedup_count: u64,
    /// Number of contributing detail rows. A host reached through two
    /// channels is counted twice.
    pub host_count: u64,
}

impl_task_counts!(ChannelMetricSummary, ChannelMetricDetail, BusinessMetric);

/// A channel row attached to a [`CustomMetric`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRollup {
    pub business_name: String,
    pub channel_name: String,
    pub task_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub success_rate: String,
}

/// Host metric joined with host descriptors and channel activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMetric {
    #[serde(flatten)]
    pub metric: HostMetric,
    pub vendor: String,
    pub region: String,
    pub system: String,
    pub department: String,
    pub owner: String,
    pub channels: Vec<ChannelRollup>,
}

/// Headline numbers for the landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_hosts: u64,
    pub public_pool_hosts: u64,
    pub windows_hosts: u64,
    pub linux_hosts: u64,
    pub cpu_usage: u32,
    pub memory_usage: u32,
    pub disk_usage: u32,
    pub high_cpu_hosts: u64,
    pub high_memory_hosts: u64,
    pub high_disk_hosts: u64,
    pub offline_hosts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_serialize_as_integers() {
        assert_eq!(serde_json::to_string(&EnabledStatus::SoftDeleted).unwrap(), "2");
        assert_eq!(serde_json::to_string(&ManagementStatus::Poolable).unwrap(), "3");
        assert_eq!(serde_json::to_string(&DeviceStatus::MissingMetrics).unwrap(), "2");
        assert_eq!(serde_json::to_string(&OperationType::DeviceStatus).unwrap(), "2");

        let status: DeviceStatus = serde_json::from_str("3").unwrap();
        assert_eq!(status, DeviceStatus::AbnormalLoad);
        assert!(serde_json::from_str::<ManagementStatus>("4").is_err());
        assert!(serde_json::from_str::<EnabledStatus>("0").is_err());
    }

    #[test]
    fn test_custom_metric_flattens_host_metric() {
        let custom = CustomMetric {
            metric: HostMetric {
                ip: "10.0.0.1".to_string(),
                sample_time: "2025/03/04".to_string(),
                cpu_usage: 40,
                memory_usage: 50,
                disk_usage: 60,
                network_read_rate: 1.5,
                network_write_rate: 2.5,
                process_count: 100,
                task_count: 2000,
                running_processes: "process_1,process_101".to_string(),
            },
            vendor: "AWS".to_string(),
            region: "Beijing".to_string(),
            system: "CentOS 7".to_string(),
            department: "Ops".to_string(),
            owner: "Li Ming".to_string(),
            channels: vec![],
        };

        let value = serde_json::to_value(&custom).unwrap();
        assert_eq!(value["ip"], "10.0.0.1");
        assert_eq!(value["cpuUsage"], 40);
        assert_eq!(value["vendor"], "AWS");
        assert!(value.get("metric").is_none());
    }

    #[test]
    fn test_task_type_uppercase() {
        assert_eq!(serde_json::to_string(&TaskType::Detail).unwrap(), "\"DETAIL\"");
    }
}
