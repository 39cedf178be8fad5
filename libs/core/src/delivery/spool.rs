//! File-backed host for development and the command-line tool.
//!
//! Each live notification is one JSON file in the spool directory, so
//! separate processes (successive CLI invocations in particular) share
//! the same notification state. Writes go through a temp file and an
//! atomic rename. Subscriptions are process-local; a spool file cannot
//! call back into a process that has exited.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::warn;
use tw_registrar::{EventHandler, EventKind, HostCapabilities, InteractionEvent};

use super::host::{
    admit_sequence, HostRecord, HostService, HostSubmission, SubscribeAck, SubscriptionScope,
    UpdateOutcome,
};
use super::{DeliveryIdentity, RemoveSelector, SequenceNumber};
use crate::config::SpoolConfig;

struct Subscription {
    scope: SubscriptionScope,
    kind: EventKind,
    handler: EventHandler,
}

/// Spool-directory host. Defaults to activation-only capabilities, which
/// matches what a file spool can honestly deliver.
#[derive(Clone)]
pub struct SpoolHost {
    dir: PathBuf,
    subscriptions: Arc<RwLock<HashMap<String, Subscription>>>,
    caps: HostCapabilities,
}

impl SpoolHost {
    pub fn new(cfg: &SpoolConfig) -> Self {
        Self {
            dir: cfg.dir.clone(),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            caps: HostCapabilities::activation_only(),
        }
    }

    pub fn with_capabilities(mut self, caps: HostCapabilities) -> Self {
        self.caps = caps;
        self
    }

    fn record_path(&self, identity: &DeliveryIdentity) -> PathBuf {
        let key = identity.key();
        let digest = Sha256::digest(key.as_bytes());
        let safe: String = key
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '~'))
            .take(64)
            .collect();
        self.dir
            .join(format!("{safe}-{}.json", hex::encode(&digest[..4])))
    }

    fn write_record(&self, record: &HostRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating spool dir {}", self.dir.display()))?;
        let path = self.record_path(&record.identity);
        let bytes = serde_json::to_vec_pretty(record)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&path)
            .with_context(|| format!("persisting spool record {}", path.display()))?;
        Ok(())
    }

    fn read_record(&self, path: &Path) -> Option<HostRecord> {
        let bytes = fs::read(path).ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable spool record");
                None
            }
        }
    }

    fn all_records(&self) -> Result<Vec<(PathBuf, HostRecord)>> {
        let mut records = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(records),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(record) = self.read_record(&path) {
                    records.push((path, record));
                }
            }
        }
        Ok(records)
    }

    /// Invokes every matching subscription in this process, the same way
    /// [`super::InMemoryHost::emit`] does.
    pub async fn fire(
        &self,
        identity: &DeliveryIdentity,
        kind: EventKind,
        arguments: Option<String>,
        inputs: BTreeMap<String, String>,
    ) -> usize {
        let actions: Vec<_> = {
            let guard = self.subscriptions.read().await;
            guard
                .values()
                .filter(|sub| sub.kind == kind && sub.scope.matches(identity))
                .map(|sub| sub.handler.action.clone())
                .collect()
        };
        let event = InteractionEvent {
            group: identity.group.clone(),
            tag: identity.tag.clone(),
            kind,
            arguments,
            inputs,
        };
        for action in &actions {
            action(event.clone());
        }
        actions.len()
    }
}

#[async_trait]
impl HostService for SpoolHost {
    fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    async fn create_or_replace(&self, submission: HostSubmission) -> Result<()> {
        let record = HostRecord {
            sequence: submission.sequence.map(SequenceNumber::get).unwrap_or(0),
            identity: submission.identity,
            markup: submission.markup,
            data: submission.data,
            expires_at: submission.expires_at,
            suppress_popup: submission.suppress_popup,
            updated_at: OffsetDateTime::now_utc(),
        };
        self.write_record(&record)
    }

    async fn update(
        &self,
        identity: &DeliveryIdentity,
        data: BTreeMap<String, String>,
        sequence: Option<SequenceNumber>,
    ) -> Result<UpdateOutcome> {
        let path = self.record_path(identity);
        let Some(mut record) = self.read_record(&path) else {
            return Ok(UpdateOutcome::NotFound);
        };
        let Some(next) = admit_sequence(record.sequence, sequence) else {
            return Ok(UpdateOutcome::Stale);
        };
        record.data.extend(data);
        record.sequence = next;
        record.updated_at = OffsetDateTime::now_utc();
        self.write_record(&record)?;
        Ok(UpdateOutcome::Applied)
    }

    async fn remove(&self, selector: &RemoveSelector) -> Result<usize> {
        let mut removed = 0;
        for (path, record) in self.all_records()? {
            let matches = match selector {
                RemoveSelector::All => true,
                RemoveSelector::Exact(identity) => record.identity == *identity,
                RemoveSelector::Tag(tag) => record.identity.tag == *tag,
                RemoveSelector::Group(group) => record.identity.group == *group,
            };
            if matches && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn history(&self, identity: Option<&DeliveryIdentity>) -> Result<Vec<HostRecord>> {
        let now = OffsetDateTime::now_utc();
        let mut live: Vec<HostRecord> = self
            .all_records()?
            .into_iter()
            .map(|(_, record)| record)
            .filter(|r| !r.is_expired(now))
            .filter(|r| identity.is_none_or(|id| *id == r.identity))
            .collect();
        live.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(live)
    }

    async fn subscribe(
        &self,
        scope: SubscriptionScope,
        kind: EventKind,
        source_id: &str,
        handler: EventHandler,
    ) -> Result<SubscribeAck> {
        let mut guard = self.subscriptions.write().await;
        if guard.contains_key(source_id) {
            return Ok(SubscribeAck::AlreadyRegistered);
        }
        guard.insert(
            source_id.to_string(),
            Subscription {
                scope,
                kind,
                handler,
            },
        );
        Ok(SubscribeAck::Subscribed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spool_in(dir: &Path) -> SpoolHost {
        SpoolHost::new(&SpoolConfig {
            dir: dir.to_path_buf(),
        })
    }

    fn submission(id: &DeliveryIdentity, seq: Option<u64>) -> HostSubmission {
        HostSubmission {
            identity: id.clone(),
            markup: "<toast/>".into(),
            data: BTreeMap::new(),
            sequence: seq.map(SequenceNumber::from),
            expires_at: None,
            suppress_popup: false,
        }
    }

    #[tokio::test]
    async fn records_survive_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let id = DeliveryIdentity::new("jobs", "backup");

        let first = spool_in(dir.path());
        first
            .create_or_replace(submission(&id, Some(1)))
            .await
            .unwrap();
        drop(first);

        let second = spool_in(dir.path());
        let records = second.history(None).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, id);
        assert_eq!(records[0].sequence, 1);
    }

    #[tokio::test]
    async fn sequence_rules_hold_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let host = spool_in(dir.path());
        let id = DeliveryIdentity::for_id("dl");
        host.create_or_replace(submission(&id, Some(2))).await.unwrap();

        let applied = host
            .update(
                &id,
                BTreeMap::from([("v".to_string(), "3".to_string())]),
                Some(SequenceNumber::from(3)),
            )
            .await
            .unwrap();
        assert_eq!(applied, UpdateOutcome::Applied);

        let stale = host
            .update(&id, BTreeMap::new(), Some(SequenceNumber::from(1)))
            .await
            .unwrap();
        assert_eq!(stale, UpdateOutcome::Stale);

        let missing = host
            .update(
                &DeliveryIdentity::for_id("nope"),
                BTreeMap::new(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(missing, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn remove_by_group_deletes_files() {
        let dir = tempfile::tempdir().unwrap();
        let host = spool_in(dir.path());
        host.create_or_replace(submission(&DeliveryIdentity::new("a", "1"), None))
            .await
            .unwrap();
        host.create_or_replace(submission(&DeliveryIdentity::new("a", "2"), None))
            .await
            .unwrap();
        host.create_or_replace(submission(&DeliveryIdentity::new("b", "1"), None))
            .await
            .unwrap();

        let removed = host
            .remove(&RemoveSelector::Group("a".into()))
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(host.history(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let host = spool_in(dir.path());
        host.create_or_replace(submission(&DeliveryIdentity::for_id("good"), None))
            .await
            .unwrap();
        fs::write(dir.path().join("junk.json"), b"not json").unwrap();

        let records = host.history(None).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn default_capabilities_are_activation_only() {
        let dir = tempfile::tempdir().unwrap();
        let host = spool_in(dir.path());
        assert!(host.capabilities().activation_events);
        assert!(!host.capabilities().dismissal_events);
    }

    #[tokio::test]
    async fn fire_reaches_global_subscriptions() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let dir = tempfile::tempdir().unwrap();
        let host = spool_in(dir.path());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        host.subscribe(
            SubscriptionScope::Global,
            EventKind::Activated,
            "sub",
            EventHandler::new("body", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();

        let fired = host
            .fire(
                &DeliveryIdentity::for_id("x"),
                EventKind::Activated,
                None,
                BTreeMap::new(),
            )
            .await;
        assert_eq!(fired, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
