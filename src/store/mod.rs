//! In-memory inventory store.
//!
//! Owns one snapshot for the life of the process. Reads observe it, writes
//! mutate it in place, and `reset` replaces it with a fresh generation.

mod query;
mod validate;

pub use query::*;
pub use validate::*;

use crate::metrics::{self, ProjectedRow, ProjectionRequest};
use crate::mock::*;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Store error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Simulated response time per call weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    /// Single-record reads and writes.
    pub light: Duration,
    /// Paged list reads.
    pub list: Duration,
    /// Multi-dimension metric reads.
    pub heavy: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            light: Duration::from_millis(300),
            list: Duration::from_millis(500),
            heavy: Duration::from_millis(800),
        }
    }
}

impl Latency {
    pub fn none() -> Self {
        Self {
            light: Duration::ZERO,
            list: Duration::ZERO,
            heavy: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Weight {
    Light,
    List,
    Heavy,
}

/// Inventory construction parameters.
#[derive(Debug, Clone)]
pub struct InventoryOptions {
    pub host_count: usize,
    pub channel_count: usize,
    /// `None` draws from entropy.
    pub seed: Option<u64>,
    pub latency: Latency,
    /// Last date of synthesized samples. `None` follows the clock, refreshed
    /// on every reset.
    pub window_end: Option<NaiveDate>,
}

impl Default for InventoryOptions {
    fn default() -> Self {
        Self {
            host_count: 50,
            channel_count: 10,
            seed: None,
            latency: Latency::default(),
            window_end: None,
        }
    }
}

/// Result of a multi-dimension metric read: a page of host metrics plus the
/// channel rows reachable from it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiDimensionMetrics {
    pub host_metrics: Vec<HostMetric>,
    pub channel_summaries: Vec<ChannelMetricSummary>,
    pub channel_details: Vec<ChannelMetricDetail>,
    pub total: usize,
}

/// Source of the current date.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| Utc::now().date_naive())
}

struct State {
    snapshot: Snapshot,
    next_host: usize,
}

/// Thread-safe handle to the inventory.
#[derive(Clone)]
pub struct Inventory {
    state: Arc<RwLock<State>>,
    generator: Arc<Mutex<Generator>>,
    clock: Clock,
    options: InventoryOptions,
}

impl Inventory {
    /// Generate the initial snapshot.
    pub fn new(options: InventoryOptions) -> Self {
        let mut generator = match options.seed {
            Some(seed) => Generator::seeded(seed),
            None => Generator::from_entropy(),
        };
        if let Some(end) = options.window_end {
            generator.set_window_end(end);
        }
        Self::with_generator(generator, options)
    }

    pub fn with_generator(mut generator: Generator, options: InventoryOptions) -> Self {
        let snapshot =
            Snapshot::assemble(&mut generator, options.host_count, options.channel_count);
        Self::from_snapshot(snapshot, generator, options)
    }

    /// Serve a prepared snapshot. `generator` backs later writes and resets.
    pub fn from_snapshot(
        snapshot: Snapshot,
        generator: Generator,
        options: InventoryOptions,
    ) -> Self {
        let next_host = next_host_number(&snapshot.hosts);
        Self {
            state: Arc::new(RwLock::new(State {
                snapshot,
                next_host,
            })),
            generator: Arc::new(Mutex::new(generator)),
            clock: system_clock(),
            options,
        }
    }

    /// Replace the date source used for write stamps and open date ranges.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    async fn pause(&self, weight: Weight) {
        let latency = &self.options.latency;
        let delay = match weight {
            Weight::Light => latency.light,
            Weight::List => latency.list,
            Weight::Heavy => latency.heavy,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Copy of the whole snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot.clone()
    }

    /// Replace the snapshot with a freshly generated one.
    pub async fn reset(&self) {
        self.pause(Weight::Light).await;
        let mut state = self.state.write().await;
        let mut generator = self.generator.lock().await;

        if self.options.window_end.is_none() {
            generator.set_window_end(self.today());
        }
        let snapshot = Snapshot::assemble(
            &mut *generator,
            self.options.host_count,
            self.options.channel_count,
        );
        state.next_host = next_host_number(&snapshot.hosts);
        state.snapshot = snapshot;

        tracing::info!(
            "Inventory reset: {} hosts, {} channels",
            state.snapshot.hosts.len(),
            state.snapshot.channel_summaries.len()
        );
    }

    // --- Dashboard ---

    pub async fn dashboard_stats(&self) -> DashboardStats {
        self.pause(Weight::Light).await;
        let state = self.state.read().await;
        let mut generator = self.generator.lock().await;
        generator.dashboard_stats(&state.snapshot.hosts)
    }

    // --- Hosts ---

    /// Search covers ip, vendor, region, system, owner and department.
    pub async fn list_hosts(&self, query: &ListQuery) -> Page<Host> {
        self.pause(Weight::List).await;
        let state = self.state.read().await;

        let hosts = filter_hosts(state.snapshot.hosts.iter(), query);
        tracing::debug!("list_hosts: {} matches", hosts.len());
        paginate(hosts, query)
    }

    /// Hosts available from the shared pool.
    pub async fn list_public_pool_hosts(&self, query: &ListQuery) -> Page<Host> {
        self.pause(Weight::List).await;
        let state = self.state.read().await;

        let pool = state
            .snapshot
            .hosts
            .iter()
            .filter(|h| h.management_status == ManagementStatus::Poolable);
        paginate(filter_hosts(pool, query), query)
    }

    pub async fn get_host(&self, id: &str) -> Result<Host, StoreError> {
        self.pause(Weight::Light).await;
        let state = self.state.read().await;

        state
            .snapshot
            .host_by_id(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("host {}", id)))
    }

    /// Insert a host with the next free id and synthesize its metric rows.
    pub async fn create_host(&self, draft: HostDraft) -> Result<Host, StoreError> {
        self.pause(Weight::Light).await;
        let mut state = self.state.write().await;

        let host = draft.into_host(format!("host_{}", state.next_host));
        if let Err(e) = validate_host(&host, &state.snapshot.hosts) {
            tracing::warn!("Rejected new host {}: {}", host.ip, e);
            return Err(e);
        }

        let mut generator = self.generator.lock().await;
        let inefficient = generator.inefficient_host(&host.ip);
        let metric = generator.host_metric(&host);
        drop(generator);

        state.next_host += 1;
        let snapshot = &mut state.snapshot;
        snapshot.hosts.push(host.clone());
        snapshot.inefficient_hosts.push(inefficient);
        snapshot.host_metrics.push(metric);
        snapshot.rederive();
        log_integrity(snapshot);

        tracing::info!("Created host {} ({})", host.id, host.ip);
        Ok(host)
    }

    /// Merge `patch` into the host. Status changes are appended to the change
    /// log and an ip change is carried to every row keyed by the old ip.
    pub async fn update_host(&self, id: &str, patch: HostPatch) -> Result<Host, StoreError> {
        self.pause(Weight::Light).await;
        let mut state = self.state.write().await;
        let snapshot = &mut state.snapshot;

        let index = snapshot
            .hosts
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("host {}", id)))?;
        let before = snapshot.hosts[index].clone();
        let after = patch.apply(before.clone());

        if let Err(e) = validate_host(&after, &snapshot.hosts) {
            tracing::warn!("Rejected update of host {}: {}", id, e);
            return Err(e);
        }

        let today = self.today().format(DATE_FORMAT).to_string();
        let operator = patch
            .operator
            .clone()
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| SYSTEM_OPERATOR.to_string());

        snapshot.rename_ip(&before.ip, &after.ip);

        let mut changes = Vec::new();
        if before.management_status != after.management_status {
            changes.push((
                OperationType::ManagementStatus,
                u8::from(before.management_status),
                u8::from(after.management_status),
            ));
        }
        if before.device_status != after.device_status {
            changes.push((
                OperationType::DeviceStatus,
                u8::from(before.device_status),
                u8::from(after.device_status),
            ));
        }
        for (operation_type, old, new) in changes {
            snapshot.change_records.push(HostChangeRecord {
                sample_time: today.clone(),
                ip: after.ip.clone(),
                operation_type,
                operator: operator.clone(),
                old_value: old.to_string(),
                new_value: new.to_string(),
                remark: MANUAL_REMARK.to_string(),
            });
        }

        snapshot.hosts[index] = after.clone();
        snapshot.rederive();
        log_integrity(snapshot);

        tracing::info!("Updated host {} ({})", id, after.ip);
        Ok(after)
    }

    /// Remove the host and every row keyed by its ip.
    pub async fn delete_host(&self, id: &str) -> Result<(), StoreError> {
        self.pause(Weight::Light).await;
        let mut state = self.state.write().await;

        let host = state
            .snapshot
            .remove_host(id)
            .ok_or_else(|| StoreError::NotFound(format!("host {}", id)))?;

        tracing::info!("Deleted host {} ({})", host.id, host.ip);
        Ok(())
    }

    // --- Efficiency & changes ---

    /// Search covers ip; the date range applies to the sample time.
    pub async fn list_inefficient_hosts(
        &self,
        query: &ListQuery,
    ) -> Result<Page<InefficientHost>, StoreError> {
        self.pause(Weight::List).await;
        let range = query.date_range(self.today())?;
        let state = self.state.read().await;

        let rows: Vec<_> = state
            .snapshot
            .inefficient_hosts
            .iter()
            .filter(|r| matches_any(query.search_term(), &[r.ip.as_str()]))
            .filter(|r| range.map_or(true, |range| range.contains(&r.sample_time)))
            .cloned()
            .collect();
        Ok(paginate(rows, query))
    }

    /// Search covers ip and operator; the date range applies to the sample
    /// time.
    pub async fn list_change_records(
        &self,
        query: &ListQuery,
    ) -> Result<Page<HostChangeRecord>, StoreError> {
        self.pause(Weight::List).await;
        let range = query.date_range(self.today())?;
        let state = self.state.read().await;

        let rows: Vec<_> = state
            .snapshot
            .change_records
            .iter()
            .filter(|r| matches_any(query.search_term(), &[r.ip.as_str(), r.operator.as_str()]))
            .filter(|r| range.map_or(true, |range| range.contains(&r.sample_time)))
            .cloned()
            .collect();
        Ok(paginate(rows, query))
    }

    /// Apply the newest change record for `ip` to the host's status.
    ///
    /// Returns `false` when the host has no change records.
    pub async fn restore_latest_status(&self, ip: &str) -> Result<bool, StoreError> {
        self.pause(Weight::Light).await;
        let mut state = self.state.write().await;
        let snapshot = &mut state.snapshot;

        let id = snapshot
            .host_by_ip(ip)
            .map(|h| h.id.clone())
            .ok_or_else(|| StoreError::NotFound(format!("host with ip {}", ip)))?;

        // max_by_key keeps the last of equal dates, i.e. the latest written.
        let latest = match snapshot
            .change_records
            .iter()
            .filter(|r| r.ip == ip)
            .max_by_key(|r| r.sample_time.as_str())
        {
            Some(r) => r.clone(),
            None => return Ok(false),
        };

        let code: u8 = latest.new_value.parse().map_err(|_| {
            StoreError::Validation(format!("unreadable status value: {}", latest.new_value))
        })?;
        let Some(host) = snapshot.hosts.iter_mut().find(|h| h.id == id) else {
            return Err(StoreError::NotFound(format!("host {}", id)));
        };
        match latest.operation_type {
            OperationType::ManagementStatus => {
                host.management_status =
                    ManagementStatus::try_from(code).map_err(StoreError::Validation)?;
            }
            OperationType::DeviceStatus => {
                host.device_status =
                    DeviceStatus::try_from(code).map_err(StoreError::Validation)?;
            }
        }

        tracing::info!(
            "Restored {} of {} to {}",
            latest.operation_type.label(),
            ip,
            latest.new_value
        );
        Ok(true)
    }

    // --- Metrics ---

    /// A page of host metrics plus the channel details for those hosts and
    /// the summaries those details belong to.
    pub async fn multi_dimension_metrics(&self, query: &MetricsQuery) -> MultiDimensionMetrics {
        self.pause(Weight::Heavy).await;
        let state = self.state.read().await;
        let snapshot = &state.snapshot;
        let list = query.list();

        let metrics: Vec<_> = snapshot
            .host_metrics
            .iter()
            .filter(|m| query.keeps(&m.ip))
            .filter(|m| matches_any(list.search_term(), &[m.ip.as_str()]))
            .cloned()
            .collect();
        let page = paginate(metrics, &list);

        let channel_details: Vec<_> = snapshot
            .channel_details
            .iter()
            .filter(|d| page.data.iter().any(|m| m.ip == d.ip))
            .cloned()
            .collect();
        let channel_summaries: Vec<_> = snapshot
            .channel_summaries
            .iter()
            .filter(|s| channel_details.iter().any(|d| d.parent_id == s.id))
            .cloned()
            .collect();

        tracing::debug!(
            "multi_dimension_metrics: {} of {} hosts, {} details, {} summaries",
            page.data.len(),
            page.total,
            channel_details.len(),
            channel_summaries.len()
        );

        MultiDimensionMetrics {
            host_metrics: page.data,
            channel_summaries,
            channel_details,
            total: page.total,
        }
    }

    /// Search covers the business name; the date range applies to the
    /// latest sample time.
    pub async fn list_business_metrics(
        &self,
        query: &ListQuery,
    ) -> Result<Page<BusinessMetric>, StoreError> {
        self.pause(Weight::List).await;
        let range = query.date_range(self.today())?;
        let state = self.state.read().await;

        let rows: Vec<_> = state
            .snapshot
            .business_metrics
            .iter()
            .filter(|b| matches_any(query.search_term(), &[b.business_name.as_str()]))
            .filter(|b| range.map_or(true, |range| range.contains(&b.sample_time)))
            .cloned()
            .collect();
        Ok(paginate(rows, query))
    }

    /// Search covers the same host descriptors as [`Self::list_hosts`].
    pub async fn list_custom_metrics(&self, query: &MetricsQuery) -> Page<CustomMetric> {
        self.pause(Weight::Heavy).await;
        let state = self.state.read().await;
        let list = query.list();

        let rows: Vec<_> = state
            .snapshot
            .custom_metrics
            .iter()
            .filter(|c| query.keeps(&c.metric.ip))
            .filter(|c| {
                matches_any(
                    list.search_term(),
                    &[
                        c.metric.ip.as_str(),
                        c.vendor.as_str(),
                        c.region.as_str(),
                        c.system.as_str(),
                        c.owner.as_str(),
                        c.department.as_str(),
                    ],
                )
            })
            .cloned()
            .collect();
        paginate(rows, &list)
    }

    pub async fn project(&self, request: &ProjectionRequest) -> Vec<ProjectedRow> {
        self.pause(Weight::Heavy).await;
        let state = self.state.read().await;
        metrics::project(&state.snapshot, request)
    }
}

fn filter_hosts<'a>(hosts: impl Iterator<Item = &'a Host>, query: &ListQuery) -> Vec<Host> {
    hosts
        .filter(|h| {
            matches_any(
                query.search_term(),
                &[
                    h.ip.as_str(),
                    h.vendor.as_str(),
                    h.region.as_str(),
                    h.system.as_str(),
                    h.owner.as_str(),
                    h.department.as_str(),
                ],
            )
        })
        .cloned()
        .collect()
}

/// One past the highest `host_N` id in use.
fn next_host_number(hosts: &[Host]) -> usize {
    hosts
        .iter()
        .filter_map(|h| h.id.strip_prefix("host_")?.parse::<usize>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

fn log_integrity(snapshot: &Snapshot) {
    for error in snapshot.check_integrity() {
        tracing::debug!("Integrity: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio_test::{assert_err, assert_ok};

    fn options(host_count: usize, channel_count: usize) -> InventoryOptions {
        InventoryOptions {
            host_count,
            channel_count,
            seed: Some(99),
            latency: Latency::none(),
            window_end: None,
        }
    }

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn fixed_clock(date: NaiveDate) -> Clock {
        Arc::new(move || date)
    }

    fn inventory() -> Inventory {
        Inventory::new(options(25, 6))
    }

    fn draft(ip: &str) -> HostDraft {
        HostDraft {
            vendor: "AWS".to_string(),
            region: "Beijing".to_string(),
            ip: ip.to_string(),
            cpu: 8,
            memory: 16,
            disk: 200,
            bandwidth: 50,
            system: "Ubuntu 20.04".to_string(),
            online_time: "2025/05/01".to_string(),
            owner: "Li Ming".to_string(),
            department: "DSC - Beijing Tech".to_string(),
            shared_department: String::new(),
            enabled_status: EnabledStatus::Enabled,
            management_status: ManagementStatus::Normal,
            device_status: DeviceStatus::Normal,
        }
    }

    #[tokio::test]
    async fn test_reads_are_consistent() {
        let inventory = inventory();
        let first = inventory.list_hosts(&ListQuery::page(1, 100)).await;
        let second = inventory.list_hosts(&ListQuery::page(1, 100)).await;
        assert_eq!(first, second);
        assert_eq!(first.total, 25);
    }

    #[tokio::test]
    async fn test_list_hosts_pages() {
        let inventory = inventory();
        let all = inventory.list_hosts(&ListQuery::page(1, 25)).await.data;

        let page = inventory.list_hosts(&ListQuery::page(2, 10)).await;
        assert_eq!(page.total, 25);
        assert_eq!(page.data, all[10..20].to_vec());

        let page = inventory.list_hosts(&ListQuery::page(3, 10)).await;
        assert_eq!(page.total, 25);
        assert_eq!(page.data, all[20..25].to_vec());
    }

    #[tokio::test]
    async fn test_list_hosts_search_total() {
        let inventory = inventory();
        let vendor = inventory.snapshot().await.hosts[0].vendor.clone();
        let expected = inventory
            .snapshot()
            .await
            .hosts
            .iter()
            .filter(|h| {
                [&h.ip, &h.vendor, &h.region, &h.system, &h.owner, &h.department]
                    .iter()
                    .any(|f| f.contains(&vendor))
            })
            .count();

        for (page, size) in [(1, 1), (1, 10), (2, 3), (9, 10)] {
            let result = inventory
                .list_hosts(&ListQuery::page(page, size).with_search(&vendor))
                .await;
            assert_eq!(result.total, expected);
            assert!(result.data.len() <= size);
        }
    }

    #[tokio::test]
    async fn test_public_pool_only_poolable() {
        let mut generator = Generator::seeded(5);
        let mut snapshot = Snapshot::assemble(&mut generator, 10, 2);
        for (i, host) in snapshot.hosts.iter_mut().enumerate() {
            host.management_status = match i {
                0 | 4 | 7 => ManagementStatus::Poolable,
                1 => ManagementStatus::LowUtilization,
                _ => ManagementStatus::Normal,
            };
        }
        let inventory = Inventory::from_snapshot(snapshot, generator, options(10, 2));

        let page = inventory.list_public_pool_hosts(&ListQuery::page(1, 10)).await;
        assert_eq!(page.total, 3);
        assert!(page
            .data
            .iter()
            .all(|h| h.management_status == ManagementStatus::Poolable));
    }

    #[tokio::test]
    async fn test_get_host_not_found() {
        let inventory = inventory();
        assert_ok!(inventory.get_host("host_1").await);
        assert_eq!(
            inventory.get_host("host_999").await,
            Err(StoreError::NotFound("host host_999".to_string()))
        );
    }

    #[tokio::test]
    async fn test_create_host_persists() {
        let inventory = inventory();
        let host = inventory.create_host(draft("192.168.0.10")).await.unwrap();
        assert_eq!(host.id, "host_26");

        let fetched = inventory.get_host("host_26").await.unwrap();
        assert_eq!(fetched, host);

        let snapshot = inventory.snapshot().await;
        assert_eq!(snapshot.hosts.len(), 26);
        assert!(snapshot.host_metrics.iter().any(|m| m.ip == "192.168.0.10"));
        assert!(snapshot.inefficient_hosts.iter().any(|m| m.ip == "192.168.0.10"));
        assert!(snapshot.custom_metrics.iter().any(|m| m.metric.ip == "192.168.0.10"));
        assert!(snapshot.check_integrity().is_empty());

        let second = inventory.create_host(draft("192.168.0.11")).await.unwrap();
        assert_eq!(second.id, "host_27");
    }

    #[tokio::test]
    async fn test_create_host_validation() {
        let inventory = inventory();

        let mut bad = draft("192.168.0.10");
        bad.vendor = String::new();
        assert!(matches!(
            inventory.create_host(bad).await,
            Err(StoreError::Validation(_))
        ));

        let taken = inventory.snapshot().await.hosts[0].ip.clone();
        assert_err!(inventory.create_host(draft(&taken)).await);
        assert_eq!(inventory.snapshot().await.hosts.len(), 25);
    }

    #[tokio::test]
    async fn test_update_host_records_status_change() {
        let inventory = inventory();
        let before = inventory.get_host("host_3").await.unwrap();
        let target = if before.device_status == DeviceStatus::AbnormalLoad {
            DeviceStatus::Normal
        } else {
            DeviceStatus::AbnormalLoad
        };

        let patch = HostPatch {
            device_status: Some(target),
            owner: Some("Huang Li".to_string()),
            operator: Some("Wang Fang".to_string()),
            ..Default::default()
        };
        let after = inventory.update_host("host_3", patch).await.unwrap();
        assert_eq!(after.device_status, target);
        assert_eq!(after.owner, "Huang Li");

        let records = inventory
            .list_change_records(&ListQuery::page(1, 100).with_search("Wang Fang"))
            .await
            .unwrap();
        let record = records
            .data
            .iter()
            .find(|r| r.ip == before.ip && r.operator == "Wang Fang")
            .unwrap();
        assert_eq!(record.operation_type, OperationType::DeviceStatus);
        assert_eq!(record.old_value, u8::from(before.device_status).to_string());
        assert_eq!(record.new_value, u8::from(target).to_string());
    }

    #[tokio::test]
    async fn test_update_host_renames_ip() {
        let inventory = inventory();
        let old_ip = inventory.get_host("host_2").await.unwrap().ip;

        let patch = HostPatch {
            ip: Some("172.16.5.5".to_string()),
            ..Default::default()
        };
        inventory.update_host("host_2", patch).await.unwrap();

        let snapshot = inventory.snapshot().await;
        assert!(snapshot.host_metrics.iter().all(|m| m.ip != old_ip));
        assert!(snapshot.host_metrics.iter().any(|m| m.ip == "172.16.5.5"));
        assert!(snapshot.check_integrity().is_empty());
    }

    #[tokio::test]
    async fn test_update_host_errors() {
        let inventory = inventory();
        let missing = inventory.update_host("host_0", HostPatch::default()).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));

        let patch = HostPatch {
            cpu: Some(0),
            ..Default::default()
        };
        let invalid = inventory.update_host("host_1", patch).await;
        assert!(matches!(invalid, Err(StoreError::Validation(_))));
        assert_ne!(inventory.get_host("host_1").await.unwrap().cpu, 0);
    }

    #[tokio::test]
    async fn test_delete_host() {
        let inventory = inventory();
        let ip = inventory.get_host("host_4").await.unwrap().ip;

        assert_ok!(inventory.delete_host("host_4").await);
        assert!(matches!(
            inventory.get_host("host_4").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            inventory.delete_host("host_4").await,
            Err(StoreError::NotFound(_))
        ));

        let snapshot = inventory.snapshot().await;
        assert_eq!(snapshot.hosts.len(), 24);
        assert!(snapshot.channel_details.iter().all(|d| d.ip != ip));
        assert!(snapshot.check_integrity().is_empty());
    }

    #[tokio::test]
    async fn test_restore_latest_status() {
        let mut generator = Generator::seeded(12);
        let mut snapshot = Snapshot::assemble(&mut generator, 3, 1);
        let ip = snapshot.hosts[1].ip.clone();
        snapshot.hosts[1].management_status = ManagementStatus::Normal;
        snapshot.change_records = vec![
            HostChangeRecord {
                sample_time: "2025/02/01".to_string(),
                ip: ip.clone(),
                operation_type: OperationType::ManagementStatus,
                operator: "Li Ming".to_string(),
                old_value: "1".to_string(),
                new_value: "2".to_string(),
                remark: MANUAL_REMARK.to_string(),
            },
            HostChangeRecord {
                sample_time: "2025/03/01".to_string(),
                ip: ip.clone(),
                operation_type: OperationType::ManagementStatus,
                operator: SYSTEM_OPERATOR.to_string(),
                old_value: "2".to_string(),
                new_value: "3".to_string(),
                remark: SYSTEM_REMARK.to_string(),
            },
        ];
        let other_ip = snapshot.hosts[0].ip.clone();
        let inventory = Inventory::from_snapshot(snapshot, generator, options(3, 1));

        assert_eq!(inventory.restore_latest_status(&ip).await, Ok(true));
        let host = inventory.snapshot().await.hosts[1].clone();
        assert_eq!(host.management_status, ManagementStatus::Poolable);

        assert_eq!(inventory.restore_latest_status(&other_ip).await, Ok(false));
        assert!(matches!(
            inventory.restore_latest_status("1.2.3.4").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_change_records_date_range() {
        let inventory = inventory();
        let all = inventory
            .list_change_records(&ListQuery::page(1, 1000))
            .await
            .unwrap();

        let query = ListQuery::page(1, 1000).with_range(Some("2025/03/01"), Some("2025/03/31"));
        let march = inventory.list_change_records(&query).await.unwrap();
        let expected = all
            .data
            .iter()
            .filter(|r| r.sample_time.starts_with("2025/03/"))
            .count();
        assert_eq!(march.total, expected);

        let bad = ListQuery::page(1, 10).with_range(Some("March"), None);
        assert!(matches!(
            inventory.list_change_records(&bad).await,
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_inefficient_hosts_search() {
        let inventory = inventory();
        let ip = inventory.snapshot().await.hosts[7].ip.clone();

        let page = inventory
            .list_inefficient_hosts(&ListQuery::page(1, 10).with_search(&ip))
            .await
            .unwrap();
        assert!(page.total >= 1);
        assert!(page.data.iter().all(|r| r.ip.contains(&ip)));
    }

    #[tokio::test]
    async fn test_multi_dimension_closure() {
        let inventory = Inventory::new(options(40, 10));
        let snapshot = inventory.snapshot().await;
        let picked: Vec<String> = snapshot.hosts[..12].iter().map(|h| h.ip.clone()).collect();

        let query = MetricsQuery {
            page: Some(2),
            page_size: Some(5),
            search: None,
            host_ips: picked.clone(),
        };
        let result = inventory.multi_dimension_metrics(&query).await;

        assert_eq!(result.total, 12);
        assert_eq!(result.host_metrics.len(), 5);
        let page_ips: HashSet<&str> = result.host_metrics.iter().map(|m| m.ip.as_str()).collect();
        assert!(page_ips.iter().all(|ip| picked.iter().any(|p| p == ip)));

        let expected_details = snapshot
            .channel_details
            .iter()
            .filter(|d| page_ips.contains(d.ip.as_str()))
            .count();
        assert_eq!(result.channel_details.len(), expected_details);

        let parents: HashSet<&str> = result
            .channel_details
            .iter()
            .map(|d| d.parent_id.as_str())
            .collect();
        assert_eq!(result.channel_summaries.len(), parents.len());
        assert!(result
            .channel_summaries
            .iter()
            .all(|s| parents.contains(s.id.as_str())));
    }

    #[tokio::test]
    async fn test_business_and_custom_metrics() {
        let inventory = inventory();
        let snapshot = inventory.snapshot().await;

        let business = inventory
            .list_business_metrics(&ListQuery::page(1, 100))
            .await
            .unwrap();
        assert_eq!(business.total, snapshot.business_metrics.len());

        let ip = snapshot.hosts[0].ip.clone();
        let query = MetricsQuery {
            host_ips: vec![ip.clone()],
            ..Default::default()
        };
        let custom = inventory.list_custom_metrics(&query).await;
        assert_eq!(custom.total, 1);
        assert_eq!(custom.data[0].metric.ip, ip);
        assert_eq!(custom.data[0].vendor, snapshot.hosts[0].vendor);
    }

    #[tokio::test]
    async fn test_reset_regenerates() {
        let inventory = inventory();
        inventory.delete_host("host_1").await.unwrap();
        assert_eq!(inventory.snapshot().await.hosts.len(), 24);

        inventory.reset().await;
        let snapshot = inventory.snapshot().await;
        assert_eq!(snapshot.hosts.len(), 25);
        assert!(snapshot.host_by_id("host_1").is_some());
        assert!(snapshot.check_integrity().is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_stats_counts() {
        let inventory = inventory();
        let snapshot = inventory.snapshot().await;
        let stats = inventory.dashboard_stats().await;

        assert_eq!(stats.total_hosts, 25);
        let poolable = snapshot
            .hosts
            .iter()
            .filter(|h| h.management_status == ManagementStatus::Poolable)
            .count() as u64;
        assert_eq!(stats.public_pool_hosts, poolable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_applied() {
        let inventory = Inventory::new(InventoryOptions {
            seed: Some(1),
            ..Default::default()
        });

        let start = tokio::time::Instant::now();
        inventory.multi_dimension_metrics(&MetricsQuery::default()).await;
        assert!(start.elapsed() >= Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_writes_stamped_with_current_date() {
        let generator = Generator::seeded(8).with_date_range(ymd(2025, 1, 1), ymd(2025, 1, 10));
        let inventory = Inventory::with_generator(generator, options(10, 2))
            .with_clock(fixed_clock(ymd(2026, 10, 16)));

        let before = inventory.get_host("host_1").await.unwrap();
        let target = if before.device_status == DeviceStatus::Normal {
            DeviceStatus::MissingMetrics
        } else {
            DeviceStatus::Normal
        };
        let patch = HostPatch {
            device_status: Some(target),
            operator: Some("Zhou Min".to_string()),
            ..Default::default()
        };
        inventory.update_host("host_1", patch).await.unwrap();

        // Open end of the range is the clock's date, not the sample window's.
        let query = ListQuery::page(1, 100).with_range(Some("2026/10/01"), None);
        let records = inventory.list_change_records(&query).await.unwrap();
        assert_eq!(records.total, 1);
        assert_eq!(records.data[0].sample_time, "2026/10/16");
        assert_eq!(records.data[0].operator, "Zhou Min");
    }

    #[tokio::test]
    async fn test_reset_follows_clock() {
        let generator = Generator::seeded(8).with_date_range(ymd(2025, 1, 1), ymd(2025, 1, 10));
        let inventory = Inventory::with_generator(generator, options(25, 2))
            .with_clock(fixed_clock(ymd(2026, 10, 16)));
        let stale = inventory.snapshot().await;
        assert!(stale.hosts.iter().all(|h| h.online_time.as_str() <= "2025/01/10"));

        inventory.reset().await;
        let fresh = inventory.snapshot().await;
        assert!(fresh.hosts.iter().all(|h| h.online_time.as_str() <= "2026/10/16"));
        assert!(fresh.hosts.iter().any(|h| h.online_time.as_str() > "2025/01/10"));
    }

    #[tokio::test]
    async fn test_fixed_window_reproducible() {
        let fixed = InventoryOptions {
            window_end: Some(ymd(2025, 8, 31)),
            ..options(20, 4)
        };
        let first = Inventory::new(fixed.clone()).snapshot().await;
        let second = Inventory::new(fixed.clone())
            .with_clock(fixed_clock(ymd(2027, 1, 1)))
            .snapshot()
            .await;

        assert_eq!(first.hosts, second.hosts);
        assert_eq!(first.change_records, second.change_records);
        assert!(first.hosts.iter().all(|h| h.online_time.as_str() <= "2025/08/31"));

        // A fixed window survives a reset.
        let inventory = Inventory::new(fixed).with_clock(fixed_clock(ymd(2027, 1, 1)));
        inventory.reset().await;
        let reset = inventory.snapshot().await;
        assert!(reset.hosts.iter().all(|h| h.online_time.as_str() <= "2025/08/31"));
    }

    #[test]
    fn test_next_host_number() {
        let mut generator = Generator::seeded(1);
        let mut hosts = generator.hosts(3);
        assert_eq!(next_host_number(&hosts), 4);

        hosts[0].id = "custom".to_string();
        hosts[1].id = "host_40".to_string();
        assert_eq!(next_host_number(&hosts), 41);
        assert_eq!(next_host_number(&[]), 1);
    }
}
