//! Synthetic record generators.
//!
//! Every draw goes through the generator's own random source so a seeded
//! generator reproduces the same inventory.

use super::models::*;
use crate::format::round2;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

pub const DATE_FORMAT: &str = "%Y/%m/%d";

const SYSTEMS: &[&str] = &[
    "Windows Server 2008",
    "Windows Server 2012",
    "Windows Server 2016",
    "Windows Server 2019",
    "Ubuntu 18.04",
    "Ubuntu 20.04",
    "CentOS 7",
    "CentOS 8",
    "Red Hat Enterprise Linux 8",
];

const VENDORS: &[&str] = &["Alibaba Cloud", "Tencent Cloud", "Huawei Cloud", "AWS", "Azure"];

const REGIONS: &[&str] = &["Nanjing", "Beijing", "Shanghai", "Guangzhou", "Shenzhen", "Hangzhou"];

const DEPARTMENTS: &[&str] = &[
    "DSC - Nanjing Tech - PEVC",
    "DSC - Nanjing Tech - WDS",
    "DSC - Beijing Tech",
    "DSC - Shanghai R&D Center",
    "DSC - Guangzhou Operations",
];

const OWNERS: &[&str] = &[
    "Sun Wei", "Li Ming", "Wang Fang", "Zhang Qiang", "Liu Yang", "Chen Jing", "Yang Jun",
    "Huang Li",
];

const CHANNELS: &[&str] = &["FHBSD", "XYZAB", "LMNOP", "QRSTUV", "EFGHIJ"];

const BUSINESSES: &[&str] = &["Business A", "Business B", "Business C", "Business D", "Business E"];

pub const SYSTEM_OPERATOR: &str = "System";
pub const SYSTEM_REMARK: &str = "SYSTEM(\"System processed\")";
pub const MANUAL_REMARK: &str = "Manual adjustment";

/// Distinct `10.a.b.c` addresses available to generated hosts.
pub const MAX_HOSTS: usize = 255 * 255 * 255;

/// Source of synthetic inventory records.
pub struct Generator<R = StdRng> {
    rng: R,
    earliest: NaiveDate,
    latest: NaiveDate,
}

impl Generator<StdRng> {
    /// Reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> Generator<R> {
    /// Sample dates fall between 2025/01/01 and today.
    pub fn with_rng(rng: R) -> Self {
        let mut generator = Self {
            rng,
            earliest: NaiveDate::default(),
            latest: NaiveDate::default(),
        };
        generator.set_window_end(Utc::now().date_naive());
        generator
    }

    /// Move the end of the sample window. The start stays at 2025/01/01
    /// unless `end` comes before it.
    pub fn set_window_end(&mut self, end: NaiveDate) {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(end);
        self.earliest = start.min(end);
        self.latest = end;
    }

    pub fn window_end(&self) -> NaiveDate {
        self.latest
    }

    /// Restrict sample dates to `[earliest, latest]`. Bounds are swapped when
    /// given in the wrong order.
    #[cfg(test)]
    pub fn with_date_range(mut self, earliest: NaiveDate, latest: NaiveDate) -> Self {
        self.earliest = earliest.min(latest);
        self.latest = earliest.max(latest);
        self
    }

    fn pick(&mut self, items: &[&str]) -> String {
        items.choose(&mut self.rng).copied().unwrap_or_default().to_string()
    }

    fn date_string(&mut self) -> String {
        let span = (self.latest - self.earliest).num_days();
        let offset = self.rng.gen_range(0..=span);
        (self.earliest + ChronoDuration::days(offset))
            .format(DATE_FORMAT)
            .to_string()
    }

    fn ip(&mut self) -> String {
        format!(
            "10.{}.{}.{}",
            self.rng.gen_range(0..255),
            self.rng.gen_range(0..255),
            self.rng.gen_range(0..255)
        )
    }

    /// Draw `(task, success, failure, empty, dedup)` with success between
    /// 70% and 95% of the tasks and failures bounded by what is left.
    fn task_counts(&mut self, min_tasks: u64, max_tasks: u64) -> (u64, u64, u64, u64, u64) {
        let task = self.rng.gen_range(min_tasks..=max_tasks);
        let low = (task as f64 * 0.7).ceil() as u64;
        let high = ((task as f64 * 0.95).floor() as u64).max(low);
        let success = self.rng.gen_range(low..=high).min(task);
        let failure = self.rng.gen_range(0..=task - success);
        let empty = self.rng.gen_range(0..=task / 10);
        let dedup = self.rng.gen_range(0..=task / 20);
        (task, success, failure, empty, dedup)
    }

    /// `count` hosts with ids `host_1..=host_count` and distinct ips, at most
    /// [`MAX_HOSTS`].
    pub fn hosts(&mut self, count: usize) -> Vec<Host> {
        let count = count.min(MAX_HOSTS);
        let mut used = HashSet::with_capacity(count);
        (0..count)
            .map(|i| {
                let mut host = self.host(format!("host_{}", i + 1));
                while !used.insert(host.ip.clone()) {
                    host.ip = self.ip();
                }
                host
            })
            .collect()
    }

    pub fn host(&mut self, id: String) -> Host {
        let enabled_status = if self.rng.gen_bool(0.9) {
            EnabledStatus::Enabled
        } else {
            EnabledStatus::SoftDeleted
        };
        let management_status = if self.rng.gen_bool(0.7) {
            ManagementStatus::Normal
        } else if self.rng.gen_bool(0.5) {
            ManagementStatus::LowUtilization
        } else {
            ManagementStatus::Poolable
        };
        let device_status = if self.rng.gen_bool(0.8) {
            DeviceStatus::Normal
        } else if self.rng.gen_bool(0.5) {
            DeviceStatus::MissingMetrics
        } else {
            DeviceStatus::AbnormalLoad
        };

        Host {
            id,
            vendor: self.pick(VENDORS),
            region: self.pick(REGIONS),
            ip: self.ip(),
            cpu: self.rng.gen_range(1..=16),
            memory: self.rng.gen_range(1..=64),
            disk: self.rng.gen_range(20..=500),
            bandwidth: self.rng.gen_range(1..=100),
            system: self.pick(SYSTEMS),
            online_time: self.date_string(),
            owner: self.pick(OWNERS),
            department: self.pick(DEPARTMENTS),
            shared_department: self.pick(DEPARTMENTS),
            enabled_status,
            management_status,
            device_status,
        }
    }

    /// One low-CPU, low-memory, nearly-full-disk row per host.
    pub fn inefficient_hosts(&mut self, hosts: &[Host]) -> Vec<InefficientHost> {
        hosts.iter().map(|h| self.inefficient_host(&h.ip)).collect()
    }

    pub fn inefficient_host(&mut self, ip: &str) -> InefficientHost {
        InefficientHost {
            ip: ip.to_string(),
            sample_time: self.date_string(),
            cpu_usage_weekly: self.rng.gen_range(0..=30),
            memory_usage_weekly: self.rng.gen_range(0..=30),
            disk_usage_weekly: self.rng.gen_range(80..=100),
            network_read_rate_weekly: round2(self.rng.gen::<f64>() * 5.0),
            network_write_rate_weekly: round2(self.rng.gen::<f64>() * 30.0),
            cpu_usage_monthly: self.rng.gen_range(0..=30),
            memory_usage_monthly: self.rng.gen_range(0..=30),
            disk_usage_monthly: self.rng.gen_range(80..=100),
            network_read_rate_monthly: round2(self.rng.gen::<f64>() * 5.0),
            network_write_rate_monthly: round2(self.rng.gen::<f64>() * 30.0),
        }
    }

    /// Usage weighted by each host's capacity.
    pub fn host_metrics(&mut self, hosts: &[Host]) -> Vec<HostMetric> {
        hosts.iter().map(|h| self.host_metric(h)).collect()
    }

    pub fn host_metric(&mut self, host: &Host) -> HostMetric {
        let cpu = weighted_usage(host.cpu as f64 * 3.0, self.rng.gen_range(0.0..=20.0), 5.0, 95.0);
        let memory =
            weighted_usage(host.memory as f64 * 1.5, self.rng.gen_range(0.0..=25.0), 10.0, 98.0);
        let disk =
            weighted_usage(host.disk as f64 / 10.0, self.rng.gen_range(0.0..=30.0), 15.0, 98.0);

        HostMetric {
            ip: host.ip.clone(),
            sample_time: self.date_string(),
            cpu_usage: cpu,
            memory_usage: memory,
            disk_usage: disk,
            network_read_rate: round2(self.rng.gen::<f64>() * 100.0),
            network_write_rate: round2(self.rng.gen::<f64>() * 100.0),
            process_count: self.rng.gen_range(50..=500),
            task_count: self.rng.gen_range(1000..=10000),
            running_processes: format!(
                "process_{},process_{}",
                self.rng.gen_range(1..=100),
                self.rng.gen_range(101..=200)
            ),
        }
    }

    pub fn channel_summaries(&mut self, count: usize) -> Vec<ChannelMetricSummary> {
        (0..count)
            .map(|i| {
                let task_type = if self.rng.gen_bool(0.4) {
                    TaskType::Data
                } else if self.rng.gen_bool(0.5) {
                    TaskType::Detail
                } else {
                    TaskType::List
                };
                let channel_name = self.pick(CHANNELS);
                let sample_time = self.date_string();
                let (task, success, failure, empty, dedup) = self.task_counts(500, 5000);

                ChannelMetricSummary {
                    id: format!("channel_{}", i + 1),
                    channel_name,
                    task_type,
                    sample_time,
                    task_count: task,
                    success_count: success,
                    failure_count: failure,
                    empty_count: empty,
                    dedup_count: dedup,
                }
            })
            .collect()
    }

    /// Spread every summary over 2 to 5 distinct hosts.
    pub fn channel_details(
        &mut self,
        summaries: &[ChannelMetricSummary],
        hosts: &[Host],
    ) -> Vec<ChannelMetricDetail> {
        let mut details = Vec::new();

        for summary in summaries {
            let wanted = self.rng.gen_range(2..=5);
            let picked: Vec<&Host> = hosts.choose_multiple(&mut self.rng, wanted).collect();

            for host in picked {
                let business_name = self.pick(BUSINESSES);
                let sample_time = self.date_string();
                let (task, success, failure, empty, dedup) = self.task_counts(100, 1000);

                details.push(ChannelMetricDetail {
                    parent_id: summary.id.clone(),
                    business_name,
                    ip: host.ip.clone(),
                    sample_time,
                    task_count: task,
                    success_count: success,
                    failure_count: failure,
                    empty_count: empty,
                    dedup_count: dedup,
                });
            }
        }

        details
    }

    /// Roughly 30% of hosts get one to three change records.
    pub fn change_records(&mut self, hosts: &[Host]) -> Vec<HostChangeRecord> {
        let mut records = Vec::new();

        for host in hosts {
            if !self.rng.gen_bool(0.3) {
                continue;
            }

            for _ in 0..self.rng.gen_range(1..=3) {
                let operation_type = if self.rng.gen_bool(0.5) {
                    OperationType::ManagementStatus
                } else {
                    OperationType::DeviceStatus
                };
                let operator = if self.rng.gen_bool(0.2) {
                    SYSTEM_OPERATOR.to_string()
                } else {
                    self.pick(OWNERS)
                };

                records.push(HostChangeRecord {
                    sample_time: self.date_string(),
                    ip: host.ip.clone(),
                    operation_type,
                    operator,
                    old_value: self.rng.gen_range(1..=3u8).to_string(),
                    new_value: self.rng.gen_range(1..=3u8).to_string(),
                    remark: if self.rng.gen_bool(0.2) {
                        SYSTEM_REMARK.to_string()
                    } else {
                        MANUAL_REMARK.to_string()
                    },
                });
            }
        }

        records
    }

    /// Host counts come from the hosts; usage averages and high-load counts
    /// are drawn fresh and do not correspond to any particular host.
    pub fn dashboard_stats(&mut self, hosts: &[Host]) -> DashboardStats {
        let count = |pred: &dyn Fn(&Host) -> bool| hosts.iter().filter(|h| pred(h)).count() as u64;

        let public_pool_hosts = count(&|h| h.management_status == ManagementStatus::Poolable);
        let windows_hosts = count(&|h| h.system.to_lowercase().contains("windows"));
        let linux_hosts = count(&|h| {
            let system = h.system.to_lowercase();
            system.contains("linux") || system.contains("ubuntu") || system.contains("centos")
        });
        let offline_hosts = count(&|h| h.device_status == DeviceStatus::AbnormalLoad);

        let cpu_usage = self.rng.gen_range(20..=80);
        let memory_usage = self.rng.gen_range(30..=70);
        let disk_usage = self.rng.gen_range(40..=60);

        let high_cpu_hosts = self.flag_hosts(hosts.len(), 0.2);
        let high_memory_hosts = self.flag_hosts(hosts.len(), 0.15);
        let high_disk_hosts = self.flag_hosts(hosts.len(), 0.1);

        DashboardStats {
            total_hosts: hosts.len() as u64,
            public_pool_hosts,
            windows_hosts,
            linux_hosts,
            cpu_usage,
            memory_usage,
            disk_usage,
            high_cpu_hosts,
            high_memory_hosts,
            high_disk_hosts,
            offline_hosts,
        }
    }

    fn flag_hosts(&mut self, hosts: usize, probability: f64) -> u64 {
        (0..hosts).filter(|_| self.rng.gen_bool(probability)).count() as u64
    }
}

/// Capacity base plus noise, clamped and rounded to a whole percent.
fn weighted_usage(base: f64, noise: f64, floor: f64, cap: f64) -> u32 {
    (base + noise).clamp(floor, cap).round() as u32
}
