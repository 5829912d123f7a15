//! Create-or-update of a single domain's address record.

use crate::config::DomainTarget;
use crate::detector::ResolvedAddress;
use crate::error::{DdnsError, Result};
use crate::providers::{DnsProvider, RecordSpec};

/// What `reconcile` did at the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
}

/// Point `target` at `address`.
///
/// Repeated calls with the same address converge on one record with the
/// configured content, TTL and proxied flag. When several records already
/// match, only the first one returned by the provider is touched.
pub async fn reconcile(
    address: &ResolvedAddress,
    target: &DomainTarget,
    provider: &dyn DnsProvider,
) -> Result<ReconcileAction> {
    let zone_id = provider
        .zone_id(&target.zone)
        .await
        .map_err(|e| DdnsError::ZoneLookup {
            zone: target.zone.clone(),
            source: Box::new(e),
        })?;

    let desired = RecordSpec {
        record_type: target.record_type,
        name: target.name.clone(),
        content: address.to_string(),
        ttl: target.ttl,
        proxied: target.proxied,
    };

    let existing = provider
        .list_records(&zone_id, &target.name, target.record_type)
        .await
        .map_err(|e| DdnsError::RecordList {
            record_type: target.record_type,
            name: target.name.clone(),
            source: Box::new(e),
        })?;

    match existing.first() {
        Some(record) => {
            if existing.len() > 1 {
                tracing::debug!(
                    "{} {} records for {}, updating {}",
                    existing.len(),
                    target.record_type,
                    target.name,
                    record.id
                );
            }
            provider
                .update_record(&zone_id, &record.id, &desired)
                .await
                .map_err(|e| DdnsError::RecordUpdate {
                    record_type: target.record_type,
                    name: target.name.clone(),
                    source: Box::new(e),
                })?;
            tracing::info!(
                "updated {} record for {} to {}",
                target.record_type,
                target.name,
                desired.content
            );
            Ok(ReconcileAction::Updated)
        }
        None => {
            provider
                .create_record(&zone_id, &desired)
                .await
                .map_err(|e| DdnsError::RecordCreate {
                    record_type: target.record_type,
                    name: target.name.clone(),
                    source: Box::new(e),
                })?;
            tracing::info!(
                "created {} record for {} as {}",
                target.record_type,
                target.name,
                desired.content
            );
            Ok(ReconcileAction::Created)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::memory::MemoryProvider;
    use crate::providers::{DnsRecord, MockDnsProvider, RecordType};
    use std::sync::atomic::Ordering;

    fn address(s: &str) -> ResolvedAddress {
        ResolvedAddress::new(s.parse().unwrap()).unwrap()
    }

    fn target() -> DomainTarget {
        DomainTarget::new("example.com", "ddns.example.com", 60, false).unwrap()
    }

    fn provider_error() -> DdnsError {
        DdnsError::Provider {
            provider: "mock".to_string(),
            message: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn test_creates_missing_record() {
        let provider = MemoryProvider::new();

        let action = reconcile(&address("93.184.216.34"), &target(), &provider)
            .await
            .unwrap();

        assert_eq!(action, ReconcileAction::Created);
        let records = provider.records("ddns.example.com");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "93.184.216.34");
        assert_eq!(records[0].ttl, 60);
        assert!(!records[0].proxied);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let provider = MemoryProvider::new();
        let address = address("93.184.216.34");

        let first = reconcile(&address, &target(), &provider).await.unwrap();
        let second = reconcile(&address, &target(), &provider).await.unwrap();

        assert_eq!(first, ReconcileAction::Created);
        assert_eq!(second, ReconcileAction::Updated);
        let records = provider.records("ddns.example.com");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "93.184.216.34");
        assert_eq!(provider.creates.load(Ordering::SeqCst), 1);
        assert_eq!(provider.updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_updates_stale_record_attributes() {
        let provider = MemoryProvider::new();
        provider.insert(
            "zone-example.com",
            &RecordSpec {
                record_type: RecordType::A,
                name: "ddns.example.com".to_string(),
                content: "1.1.1.1".to_string(),
                ttl: 300,
                proxied: true,
            },
        );

        let action = reconcile(&address("93.184.216.34"), &target(), &provider)
            .await
            .unwrap();

        assert_eq!(action, ReconcileAction::Updated);
        let records = provider.records("ddns.example.com");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "93.184.216.34");
        assert_eq!(records[0].ttl, 60);
        assert!(!records[0].proxied);
    }

    #[tokio::test]
    async fn test_duplicates_only_first_is_updated() {
        let provider = MemoryProvider::new();
        let stale = RecordSpec {
            record_type: RecordType::A,
            name: "ddns.example.com".to_string(),
            content: "1.1.1.1".to_string(),
            ttl: 60,
            proxied: false,
        };
        let first = provider.insert("zone-example.com", &stale);
        let second = provider.insert("zone-example.com", &stale);

        reconcile(&address("93.184.216.34"), &target(), &provider)
            .await
            .unwrap();

        let records = provider.records("ddns.example.com");
        assert_eq!(records.len(), 2);
        let by_id = |id: &str| records.iter().find(|r| r.id == id).unwrap().content.clone();
        assert_eq!(by_id(&first.id), "93.184.216.34");
        assert_eq!(by_id(&second.id), "1.1.1.1");
    }

    #[tokio::test]
    async fn test_zone_lookup_failure_is_wrapped() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_zone_id()
            .times(1)
            .returning(|_| Err(provider_error()));
        provider.expect_list_records().never();

        let err = reconcile(&address("93.184.216.34"), &target(), &provider)
            .await
            .unwrap_err();

        match err {
            DdnsError::ZoneLookup { zone, .. } => assert_eq!(zone, "example.com"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_failure_is_wrapped() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_zone_id()
            .returning(|_| Ok("zone-1".to_string()));
        provider
            .expect_list_records()
            .returning(|_, _, _| Err(provider_error()));
        provider.expect_create_record().never();
        provider.expect_update_record().never();

        let err = reconcile(&address("93.184.216.34"), &target(), &provider)
            .await
            .unwrap_err();

        assert!(matches!(err, DdnsError::RecordList { record_type: RecordType::A, ref name, .. } if name == "ddns.example.com"));
    }

    #[tokio::test]
    async fn test_create_failure_is_wrapped() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_zone_id()
            .returning(|_| Ok("zone-1".to_string()));
        provider
            .expect_list_records()
            .returning(|_, _, _| Ok(Vec::new()));
        provider
            .expect_create_record()
            .withf(|zone_id, spec| zone_id == "zone-1" && spec.content == "93.184.216.34")
            .times(1)
            .returning(|_, _| Err(provider_error()));

        let err = reconcile(&address("93.184.216.34"), &target(), &provider)
            .await
            .unwrap_err();

        assert!(matches!(err, DdnsError::RecordCreate { .. }));
        assert!(err.to_string().starts_with("error creating DNS record (A for ddns.example.com)"));
    }

    #[tokio::test]
    async fn test_update_failure_is_wrapped() {
        let mut provider = MockDnsProvider::new();
        provider
            .expect_zone_id()
            .returning(|_| Ok("zone-1".to_string()));
        provider.expect_list_records().returning(|_, _, _| {
            Ok(vec![DnsRecord {
                id: "record-7".to_string(),
                name: "ddns.example.com".to_string(),
                record_type: RecordType::A,
                content: "1.1.1.1".to_string(),
                ttl: 60,
                proxied: false,
            }])
        });
        provider
            .expect_update_record()
            .withf(|_, record_id, _| record_id == "record-7")
            .times(1)
            .returning(|_, _, _| Err(provider_error()));
        provider.expect_create_record().never();

        let err = reconcile(&address("93.184.216.34"), &target(), &provider)
            .await
            .unwrap_err();

        assert!(matches!(err, DdnsError::RecordUpdate { .. }));
    }
}
