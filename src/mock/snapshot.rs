//! One cross-referenced generation of every inventory collection.

use super::generator::Generator;
use super::models::*;
use crate::format::success_rate;

use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// A broken link between collections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("host ip {0} is used by more than one host")]
    DuplicateHostIp(String),
    #[error("host metric for unknown ip {0}")]
    OrphanHostMetric(String),
    #[error("inefficient host row for unknown ip {0}")]
    OrphanInefficientHost(String),
    #[error("host {0} has {1} metric rows")]
    MetricCardinality(String, usize),
    #[error("channel detail for unknown ip {0}")]
    OrphanDetailHost(String),
    #[error("channel detail for unknown summary {0}")]
    OrphanDetailParent(String),
    #[error("change record for unknown ip {0}")]
    OrphanChangeRecord(String),
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub hosts: Vec<Host>,
    pub inefficient_hosts: Vec<InefficientHost>,
    pub host_metrics: Vec<HostMetric>,
    pub channel_summaries: Vec<ChannelMetricSummary>,
    pub channel_details: Vec<ChannelMetricDetail>,
    pub change_records: Vec<HostChangeRecord>,
    pub business_metrics: Vec<BusinessMetric>,
    pub custom_metrics: Vec<CustomMetric>,
}

impl Snapshot {
    /// Build every collection in dependency order.
    pub fn assemble<R: Rng>(
        generator: &mut Generator<R>,
        host_count: usize,
        channel_count: usize,
    ) -> Self {
        let hosts = generator.hosts(host_count);
        let inefficient_hosts = generator.inefficient_hosts(&hosts);
        let host_metrics = generator.host_metrics(&hosts);
        let channel_summaries = generator.channel_summaries(channel_count);
        let channel_details = generator.channel_details(&channel_summaries, &hosts);
        let change_records = generator.change_records(&hosts);

        let mut snapshot = Self {
            hosts,
            inefficient_hosts,
            host_metrics,
            channel_summaries,
            channel_details,
            change_records,
            ..Default::default()
        };
        snapshot.rederive();

        tracing::debug!(
            "Assembled snapshot: {} hosts, {} channels, {} details, {} change records",
            snapshot.hosts.len(),
            snapshot.channel_summaries.len(),
            snapshot.channel_details.len(),
            snapshot.change_records.len()
        );

        snapshot
    }

    /// Recompute business and custom metrics from the base collections.
    pub fn rederive(&mut self) {
        self.business_metrics = business_metrics(&self.channel_details);
        self.custom_metrics = custom_metrics(
            &self.hosts,
            &self.host_metrics,
            &self.channel_summaries,
            &self.channel_details,
        );
    }

    pub fn host_by_id(&self, id: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.id == id)
    }

    pub fn host_by_ip(&self, ip: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.ip == ip)
    }

    /// Drop the host and every row keyed by its ip. Returns the removed host.
    pub fn remove_host(&mut self, id: &str) -> Option<Host> {
        let index = self.hosts.iter().position(|h| h.id == id)?;
        let host = self.hosts.remove(index);

        self.inefficient_hosts.retain(|r| r.ip != host.ip);
        self.host_metrics.retain(|r| r.ip != host.ip);
        self.channel_details.retain(|r| r.ip != host.ip);
        self.change_records.retain(|r| r.ip != host.ip);
        self.rederive();

        Some(host)
    }

    /// Point every row keyed by `old` at `new`.
    pub fn rename_ip(&mut self, old: &str, new: &str) {
        if old == new {
            return;
        }
        for r in self.inefficient_hosts.iter_mut().filter(|r| r.ip == old) {
            r.ip = new.to_string();
        }
        for r in self.host_metrics.iter_mut().filter(|r| r.ip == old) {
            r.ip = new.to_string();
        }
        for r in self.channel_details.iter_mut().filter(|r| r.ip == old) {
            r.ip = new.to_string();
        }
        for r in self.change_records.iter_mut().filter(|r| r.ip == old) {
            r.ip = new.to_string();
        }
    }

    /// Every reference that does not resolve within this snapshot.
    pub fn check_integrity(&self) -> Vec<IntegrityError> {
        let mut errors = Vec::new();

        let mut ips = HashSet::new();
        for host in &self.hosts {
            if !ips.insert(host.ip.as_str()) {
                errors.push(IntegrityError::DuplicateHostIp(host.ip.clone()));
            }
        }

        let mut metric_rows: HashMap<&str, usize> = HashMap::new();
        for m in &self.host_metrics {
            if !ips.contains(m.ip.as_str()) {
                errors.push(IntegrityError::OrphanHostMetric(m.ip.clone()));
            }
            *metric_rows.entry(m.ip.as_str()).or_default() += 1;
        }
        for host in &self.hosts {
            let rows = metric_rows.get(host.ip.as_str()).copied().unwrap_or(0);
            if rows != 1 {
                errors.push(IntegrityError::MetricCardinality(host.ip.clone(), rows));
            }
        }

        for r in &self.inefficient_hosts {
            if !ips.contains(r.ip.as_str()) {
                errors.push(IntegrityError::OrphanInefficientHost(r.ip.clone()));
            }
        }

        let summary_ids: HashSet<&str> =
            self.channel_summaries.iter().map(|s| s.id.as_str()).collect();
        for d in &self.channel_details {
            if !ips.contains(d.ip.as_str()) {
                errors.push(IntegrityError::OrphanDetailHost(d.ip.clone()));
            }
            if !summary_ids.contains(d.parent_id.as_str()) {
                errors.push(IntegrityError::OrphanDetailParent(d.parent_id.clone()));
            }
        }

        for r in &self.change_records {
            if !ips.contains(r.ip.as_str()) {
                errors.push(IntegrityError::OrphanChangeRecord(r.ip.clone()));
            }
        }

        errors
    }
}

/// Sum detail rows by business name.
///
/// `host_count` counts rows, so a host serving the same business through two
/// channels contributes twice. `sample_time` is the latest contributing
/// date; plain string comparison is enough because dates are fixed-width
/// `YYYY/MM/DD`.
pub fn business_metrics(details: &[ChannelMetricDetail]) -> Vec<BusinessMetric> {
    let mut by_name: BTreeMap<&str, BusinessMetric> = BTreeMap::new();

    for d in details {
        let entry = by_name
            .entry(d.business_name.as_str())
            .or_insert_with(|| BusinessMetric {
                business_name: d.business_name.clone(),
                sample_time: d.sample_time.clone(),
                task_count: 0,
                success_count: 0,
                failure_count: 0,
                empty_count: 0,
                dedup_count: 0,
                host_count: 0,
            });

        entry.task_count += d.task_count;
        entry.success_count += d.success_count;
        entry.failure_count += d.failure_count;
        entry.empty_count += d.empty_count;
        entry.dedup_count += d.dedup_count;
        entry.host_count += 1;
        if d.sample_time > entry.sample_time {
            entry.sample_time = d.sample_time.clone();
        }
    }

    by_name.into_values().collect()
}

/// Join each host metric with its host's descriptors and channel activity.
///
/// A metric whose host is missing keeps empty descriptors; a detail whose
/// summary is missing gets an empty channel name.
pub fn custom_metrics(
    hosts: &[Host],
    host_metrics: &[HostMetric],
    summaries: &[ChannelMetricSummary],
    details: &[ChannelMetricDetail],
) -> Vec<CustomMetric> {
    let hosts_by_ip: HashMap<&str, &Host> = hosts.iter().map(|h| (h.ip.as_str(), h)).collect();
    let channel_names: HashMap<&str, &str> = summaries
        .iter()
        .map(|s| (s.id.as_str(), s.channel_name.as_str()))
        .collect();

    host_metrics
        .iter()
        .map(|metric| {
            let host = hosts_by_ip.get(metric.ip.as_str());
            let (vendor, region, system, department, owner) = match host {
                Some(h) => (
                    h.vendor.clone(),
                    h.region.clone(),
                    h.system.clone(),
                    h.department.clone(),
                    h.owner.clone(),
                ),
                None => Default::default(),
            };

            let channels = details
                .iter()
                .filter(|d| d.ip == metric.ip)
                .map(|d| ChannelRollup {
                    business_name: d.business_name.clone(),
                    channel_name: channel_names
                        .get(d.parent_id.as_str())
                        .map(|name| name.to_string())
                        .unwrap_or_default(),
                    task_count: d.task_count,
                    success_count: d.success_count,
                    failure_count: d.failure_count,
                    success_rate: success_rate(d.success_count, d.task_count),
                })
                .collect();

            CustomMetric {
                metric: metric.clone(),
                vendor,
                region,
                system,
                department,
                owner,
                channels,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(
        parent: &str,
        business: &str,
        ip: &str,
        date: &str,
        task: u64,
        success: u64,
    ) -> ChannelMetricDetail {
        ChannelMetricDetail {
            parent_id: parent.to_string(),
            business_name: business.to_string(),
            ip: ip.to_string(),
            sample_time: date.to_string(),
            task_count: task,
            success_count: success,
            failure_count: 1,
            empty_count: 2,
            dedup_count: 3,
        }
    }

    #[test]
    fn test_assembled_snapshot_is_closed() {
        for seed in 0..10 {
            let mut generator = Generator::seeded(seed);
            let snapshot = Snapshot::assemble(&mut generator, 50, 10);

            assert_eq!(snapshot.hosts.len(), 50);
            assert_eq!(snapshot.inefficient_hosts.len(), 50);
            assert_eq!(snapshot.host_metrics.len(), 50);
            assert_eq!(snapshot.custom_metrics.len(), 50);
            assert_eq!(snapshot.channel_summaries.len(), 10);
            assert!(snapshot.check_integrity().is_empty(), "{:?}", snapshot.check_integrity());
        }
    }

    #[test]
    fn test_business_metrics_sum_details() {
        let details = vec![
            detail("channel_1", "Business A", "10.0.0.1", "2025/02/01", 100, 80),
            detail("channel_2", "Business A", "10.0.0.1", "2025/03/15", 200, 150),
            detail("channel_2", "Business B", "10.0.0.2", "2025/01/09", 50, 40),
        ];

        let metrics = business_metrics(&details);
        assert_eq!(metrics.len(), 2);

        let a = &metrics[0];
        assert_eq!(a.business_name, "Business A");
        assert_eq!(a.task_count, 300);
        assert_eq!(a.success_count, 230);
        assert_eq!(a.failure_count, 2);
        assert_eq!(a.empty_count, 4);
        assert_eq!(a.dedup_count, 6);
        assert_eq!(a.sample_time, "2025/03/15");
        // Same host through two channels counts twice.
        assert_eq!(a.host_count, 2);

        assert_eq!(metrics[1].task_count, 50);
        assert_eq!(metrics[1].host_count, 1);
    }

    #[test]
    fn test_business_metrics_empty() {
        assert!(business_metrics(&[]).is_empty());
    }

    #[test]
    fn test_business_metrics_match_generated_details() {
        let mut generator = Generator::seeded(21);
        let snapshot = Snapshot::assemble(&mut generator, 30, 12);

        for metric in &snapshot.business_metrics {
            let rows: Vec<_> = snapshot
                .channel_details
                .iter()
                .filter(|d| d.business_name == metric.business_name)
                .collect();
            assert_eq!(metric.task_count, rows.iter().map(|d| d.task_count).sum::<u64>());
            assert_eq!(metric.success_count, rows.iter().map(|d| d.success_count).sum::<u64>());
            assert_eq!(metric.host_count, rows.len() as u64);
        }
    }

    #[test]
    fn test_custom_metrics_join() {
        let mut generator = Generator::seeded(4);
        let hosts = generator.hosts(2);
        let mut metrics = generator.host_metrics(&hosts);
        metrics.push(HostMetric {
            ip: "192.168.1.1".to_string(),
            ..metrics[0].clone()
        });
        let summaries = generator.channel_summaries(1);
        let details = vec![
            detail(&summaries[0].id, "Business C", &hosts[0].ip, "2025/01/02", 0, 0),
            detail("channel_missing", "Business D", &hosts[0].ip, "2025/01/03", 3, 1),
        ];

        let custom = custom_metrics(&hosts, &metrics, &summaries, &details);
        assert_eq!(custom.len(), 3);

        let first = &custom[0];
        assert_eq!(first.vendor, hosts[0].vendor);
        assert_eq!(first.channels.len(), 2);
        assert_eq!(first.channels[0].channel_name, summaries[0].channel_name);
        assert_eq!(first.channels[0].success_rate, "0%");
        assert_eq!(first.channels[1].channel_name, "");
        assert_eq!(first.channels[1].success_rate, "33.33%");

        assert!(custom[1].channels.is_empty());

        let orphan = &custom[2];
        assert_eq!(orphan.vendor, "");
        assert_eq!(orphan.owner, "");
    }

    #[test]
    fn test_remove_host_cascades() {
        let mut generator = Generator::seeded(8);
        let mut snapshot = Snapshot::assemble(&mut generator, 20, 6);
        let victim = snapshot.channel_details[0].ip.clone();
        let id = snapshot.host_by_ip(&victim).unwrap().id.clone();

        let removed = snapshot.remove_host(&id).unwrap();
        assert_eq!(removed.ip, victim);
        assert_eq!(snapshot.hosts.len(), 19);
        assert!(snapshot.channel_details.iter().all(|d| d.ip != victim));
        assert!(snapshot.custom_metrics.iter().all(|c| c.metric.ip != victim));
        assert!(snapshot.check_integrity().is_empty());

        assert!(snapshot.remove_host(&id).is_none());
    }

    #[test]
    fn test_rename_ip_keeps_links() {
        let mut generator = Generator::seeded(8);
        let mut snapshot = Snapshot::assemble(&mut generator, 10, 4);
        let old = snapshot.hosts[0].ip.clone();

        snapshot.hosts[0].ip = "172.16.0.1".to_string();
        assert!(!snapshot.check_integrity().is_empty());

        snapshot.rename_ip(&old, "172.16.0.1");
        snapshot.rederive();
        assert!(snapshot.check_integrity().is_empty());
    }

    #[test]
    fn test_integrity_errors_reported() {
        let mut generator = Generator::seeded(1);
        let mut snapshot = Snapshot::assemble(&mut generator, 5, 2);
        let orphan = detail("channel_99", "Business A", "1.1.1.1", "2025/01/01", 1, 1);
        snapshot.channel_details.push(orphan);

        let errors = snapshot.check_integrity();
        assert!(errors.contains(&IntegrityError::OrphanDetailHost("1.1.1.1".to_string())));
        assert!(errors.contains(&IntegrityError::OrphanDetailParent("channel_99".to_string())));
    }
}
