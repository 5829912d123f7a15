//! In-memory provider used by tests.

use super::{DnsProvider, DnsRecord, RecordSpec, RecordType};
use crate::error::{DdnsError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct MemoryProvider {
    records: Mutex<Vec<(String, DnsRecord)>>,
    broken_zones: HashSet<String>,
    panicking_zones: HashSet<String>,
    next_id: AtomicUsize,
    pub(crate) creates: AtomicUsize,
    pub(crate) updates: AtomicUsize,
}

impl MemoryProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Zone lookups for `zone` always fail.
    pub(crate) fn with_broken_zone(mut self, zone: &str) -> Self {
        self.broken_zones.insert(zone.to_string());
        self
    }

    /// Zone lookups for `zone` panic.
    pub(crate) fn with_panicking_zone(mut self, zone: &str) -> Self {
        self.panicking_zones.insert(zone.to_string());
        self
    }

    pub(crate) fn insert(&self, zone_id: &str, spec: &RecordSpec) -> DnsRecord {
        let record = DnsRecord {
            id: format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: spec.name.clone(),
            record_type: spec.record_type,
            content: spec.content.clone(),
            ttl: spec.ttl,
            proxied: spec.proxied,
        };
        self.records
            .lock()
            .unwrap()
            .push((zone_id.to_string(), record.clone()));
        record
    }

    pub(crate) fn records(&self, name: &str) -> Vec<DnsRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.name == name)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

#[async_trait]
impl DnsProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        if self.panicking_zones.contains(zone_name) {
            panic!("zone lookup for {} panicked", zone_name);
        }
        if self.broken_zones.contains(zone_name) {
            return Err(DdnsError::Provider {
                provider: self.name().to_string(),
                message: format!("zone {} not found", zone_name),
            });
        }
        Ok(format!("zone-{}", zone_name))
    }

    async fn list_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(z, r)| z == zone_id && r.name == name && r.record_type == record_type)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn create_record(&self, zone_id: &str, record: &RecordSpec) -> Result<DnsRecord> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(self.insert(zone_id, record))
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordSpec,
    ) -> Result<DnsRecord> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let (_, existing) = records
            .iter_mut()
            .find(|(z, r)| z == zone_id && r.id == record_id)
            .ok_or_else(|| DdnsError::Provider {
                provider: "memory".to_string(),
                message: format!("record {} not found", record_id),
            })?;

        existing.name = record.name.clone();
        existing.content = record.content.clone();
        existing.ttl = record.ttl;
        existing.proxied = record.proxied;
        Ok(existing.clone())
    }
}
