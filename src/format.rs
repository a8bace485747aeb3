//! Display helpers for coded values and numbers.

use crate::mock::{
    DeviceStatus, EnabledStatus, Host, HostChangeRecord, ManagementStatus, OperationType,
};

use serde::Serialize;

/// Label returned for any code outside its enumeration.
pub const UNKNOWN: &str = "unknown";

fn label_for<T>(code: i64, label: fn(T) -> &'static str) -> &'static str
where
    T: TryFrom<u8>,
{
    u8::try_from(code)
        .ok()
        .and_then(|c| T::try_from(c).ok())
        .map(label)
        .unwrap_or(UNKNOWN)
}

pub fn enabled_status_text(code: i64) -> &'static str {
    label_for(code, EnabledStatus::label)
}

pub fn management_status_text(code: i64) -> &'static str {
    label_for(code, ManagementStatus::label)
}

pub fn device_status_text(code: i64) -> &'static str {
    label_for(code, DeviceStatus::label)
}

pub fn operation_type_text(code: i64) -> &'static str {
    label_for(code, OperationType::label)
}

/// `42.0` -> `"42.0%"`
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_storage(value: u32, unit: &str) -> String {
    format!("{} {}", value, unit)
}

/// Storage in the default unit.
pub fn format_storage_gb(value: u32) -> String {
    format_storage(value, "GB")
}

pub fn format_bandwidth(value: u32) -> String {
    format!("{} Mbps", value)
}

pub fn format_rate(value: f64) -> String {
    format!("{} MB/s", value)
}

/// `2025/03/04` -> `2025-03-04`
pub fn format_date(date: &str) -> String {
    date.replace('/', "-")
}

/// Success ratio as shown in channel rollups: two decimals, `"0%"` when
/// nothing ran.
pub fn success_rate(success_count: u64, task_count: u64) -> String {
    if task_count == 0 {
        return "0%".to_string();
    }
    format!("{:.2}%", success_count as f64 / task_count as f64 * 100.0)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A host rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostLabels {
    pub id: String,
    pub ip: String,
    pub cpu: String,
    pub memory: String,
    pub disk: String,
    pub bandwidth: String,
    pub online_time: String,
    pub enabled_status: &'static str,
    pub management_status: &'static str,
    pub device_status: &'static str,
}

impl From<&Host> for HostLabels {
    fn from(host: &Host) -> Self {
        Self {
            id: host.id.clone(),
            ip: host.ip.clone(),
            cpu: format!("{} cores", host.cpu),
            memory: format_storage_gb(host.memory),
            disk: format_storage_gb(host.disk),
            bandwidth: format_bandwidth(host.bandwidth),
            online_time: format_date(&host.online_time),
            enabled_status: enabled_status_text(u8::from(host.enabled_status).into()),
            management_status: management_status_text(u8::from(host.management_status).into()),
            device_status: device_status_text(u8::from(host.device_status).into()),
        }
    }
}

/// A change record with its coded values spelled out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLabels {
    pub sample_time: String,
    pub ip: String,
    pub operation_type: &'static str,
    pub operator: String,
    pub old_value: &'static str,
    pub new_value: &'static str,
    pub remark: String,
}

impl From<&HostChangeRecord> for ChangeLabels {
    fn from(record: &HostChangeRecord) -> Self {
        let status_text = match record.operation_type {
            OperationType::ManagementStatus => management_status_text,
            OperationType::DeviceStatus => device_status_text,
        };
        let value = |v: &str| v.parse::<i64>().map(status_text).unwrap_or(UNKNOWN);

        Self {
            sample_time: format_date(&record.sample_time),
            ip: record.ip.clone(),
            operation_type: operation_type_text(i64::from(u8::from(record.operation_type))),
            operator: record.operator.clone(),
            old_value: value(&record.old_value),
            new_value: value(&record.new_value),
            remark: record.remark.clone(),
        }
    }
}
