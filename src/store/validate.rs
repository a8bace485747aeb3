//! Host field validation.

use super::StoreError;
use crate::mock::{DeviceStatus, EnabledStatus, Host, ManagementStatus, DATE_FORMAT};

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

fn ip_pattern() -> &'static Regex {
    static IP: OnceLock<Regex> = OnceLock::new();
    IP.get_or_init(|| {
        Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})$").expect("ip pattern compiles")
    })
}

fn date_pattern() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| Regex::new(r"^\d{4}/\d{2}/\d{2}$").expect("date pattern compiles"))
}

/// Fields of a new host; the id is assigned on insert.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDraft {
    pub vendor: String,
    pub region: String,
    pub ip: String,
    pub cpu: u32,
    pub memory: u32,
    pub disk: u32,
    pub bandwidth: u32,
    pub system: String,
    pub online_time: String,
    pub owner: String,
    pub department: String,
    #[serde(default)]
    pub shared_department: String,
    pub enabled_status: EnabledStatus,
    pub management_status: ManagementStatus,
    pub device_status: DeviceStatus,
}

impl HostDraft {
    pub fn into_host(self, id: String) -> Host {
        Host {
            id,
            vendor: self.vendor,
            region: self.region,
            ip: self.ip,
            cpu: self.cpu,
            memory: self.memory,
            disk: self.disk,
            bandwidth: self.bandwidth,
            system: self.system,
            online_time: self.online_time,
            owner: self.owner,
            department: self.department,
            shared_department: self.shared_department,
            enabled_status: self.enabled_status,
            management_status: self.management_status,
            device_status: self.device_status,
        }
    }
}

/// Partial update. `operator` is not a host field; it is written to the
/// change records produced by status changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostPatch {
    pub vendor: Option<String>,
    pub region: Option<String>,
    pub ip: Option<String>,
    pub cpu: Option<u32>,
    pub memory: Option<u32>,
    pub disk: Option<u32>,
    pub bandwidth: Option<u32>,
    pub system: Option<String>,
    pub online_time: Option<String>,
    pub owner: Option<String>,
    pub department: Option<String>,
    pub shared_department: Option<String>,
    pub enabled_status: Option<EnabledStatus>,
    pub management_status: Option<ManagementStatus>,
    pub device_status: Option<DeviceStatus>,
    pub operator: Option<String>,
}

impl HostPatch {
    /// Overlay the set fields on `host`.
    pub fn apply(&self, mut host: Host) -> Host {
        macro_rules! merge {
            ($($field:ident),*) => {
                $(if let Some(v) = &self.$field {
                    host.$field = v.clone();
                })*
            };
        }
        merge!(
            vendor,
            region,
            ip,
            cpu,
            memory,
            disk,
            bandwidth,
            system,
            online_time,
            owner,
            department,
            shared_department,
            enabled_status,
            management_status,
            device_status
        );
        host
    }
}

/// Check required fields and ip uniqueness against `others`.
pub fn validate_host(host: &Host, others: &[Host]) -> Result<(), StoreError> {
    let required = [
        ("vendor", &host.vendor),
        ("region", &host.region),
        ("ip", &host.ip),
        ("system", &host.system),
        ("onlineTime", &host.online_time),
        ("owner", &host.owner),
        ("department", &host.department),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!("{} is required", name)));
        }
    }

    let capacities = [
        ("cpu", host.cpu),
        ("memory", host.memory),
        ("disk", host.disk),
        ("bandwidth", host.bandwidth),
    ];
    for (name, value) in capacities {
        if value == 0 {
            return Err(StoreError::Validation(format!("{} must be positive", name)));
        }
    }

    validate_ip(&host.ip)?;
    validate_date(&host.online_time)?;

    if others.iter().any(|o| o.id != host.id && o.ip == host.ip) {
        return Err(StoreError::Validation(format!("ip {} already in use", host.ip)));
    }

    Ok(())
}

fn validate_ip(ip: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::Validation(format!("invalid ip address: {}", ip));
    let caps = ip_pattern().captures(ip).ok_or_else(invalid)?;

    for i in 1..=4 {
        let octet = &caps[i];
        // `010` and `10` would name the same address.
        if octet.len() > 1 && octet.starts_with('0') {
            return Err(invalid());
        }
        octet.parse::<u8>().map_err(|_| invalid())?;
    }
    Ok(())
}

fn validate_date(date: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::Validation(format!("onlineTime must be YYYY/MM/DD: {}", date));
    if !date_pattern().is_match(date) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| invalid())?;
    Ok(())
}
