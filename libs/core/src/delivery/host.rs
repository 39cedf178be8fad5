//! Host notification service contract and the in-memory reference host.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use tw_registrar::{
    EventHandler, EventKind, HandlerStore, HostCapabilities, InteractionEvent, RegisterSlot,
};

use super::{DeliveryIdentity, RemoveSelector, SequenceNumber};

/// One notification handed to the host.
#[derive(Debug, Clone)]
pub struct HostSubmission {
    pub identity: DeliveryIdentity,
    pub markup: String,
    /// Initial binding snapshot; empty for literal payloads.
    pub data: BTreeMap<String, String>,
    pub sequence: Option<SequenceNumber>,
    pub expires_at: Option<OffsetDateTime>,
    pub suppress_popup: bool,
}

/// A notification as the host currently holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRecord {
    pub identity: DeliveryIdentity,
    pub markup: String,
    pub data: BTreeMap<String, String>,
    /// Last accepted sequence number; zero when none was ever supplied.
    pub sequence: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub suppress_popup: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl HostRecord {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Outcome of a data update against an existing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// The snapshot was applied.
    Applied,
    /// The sequence number did not advance; the host kept what it had.
    Stale,
    /// No notification with that identity is live.
    NotFound,
}

/// Outcome of an event subscription attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeAck {
    Subscribed,
    /// The identifier is already subscribed; the earlier handler stays.
    AlreadyRegistered,
}

/// What a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionScope {
    /// Events from one notification.
    Identity(DeliveryIdentity),
    /// Events from every notification of this application.
    Global,
}

impl SubscriptionScope {
    pub fn matches(&self, identity: &DeliveryIdentity) -> bool {
        match self {
            SubscriptionScope::Global => true,
            SubscriptionScope::Identity(id) => id == identity,
        }
    }
}

/// The host notification service: posts, updates, removals, history, and
/// interaction subscriptions.
///
/// Sequence admission is the host's job. An update whose sequence does
/// not advance past the stored one is answered with
/// [`UpdateOutcome::Stale`]; an absent or zero sequence refreshes
/// unconditionally and leaves the stored sequence unchanged.
#[async_trait]
pub trait HostService: Send + Sync {
    fn capabilities(&self) -> HostCapabilities;

    async fn create_or_replace(&self, submission: HostSubmission) -> Result<()>;

    async fn update(
        &self,
        identity: &DeliveryIdentity,
        data: BTreeMap<String, String>,
        sequence: Option<SequenceNumber>,
    ) -> Result<UpdateOutcome>;

    /// Removes matching notifications, returning how many went away.
    async fn remove(&self, selector: &RemoveSelector) -> Result<usize>;

    /// Live (unexpired) notifications, optionally narrowed to one
    /// identity, newest first.
    async fn history(&self, identity: Option<&DeliveryIdentity>) -> Result<Vec<HostRecord>>;

    async fn subscribe(
        &self,
        scope: SubscriptionScope,
        kind: EventKind,
        source_id: &str,
        handler: EventHandler,
    ) -> Result<SubscribeAck>;
}

pub type SharedHost = Arc<dyn HostService>;

/// Sequence admission shared by host implementations: the new stored
/// sequence, or `None` when the update is stale.
pub(super) fn admit_sequence(current: u64, incoming: Option<SequenceNumber>) -> Option<u64> {
    match incoming.map(SequenceNumber::get) {
        None | Some(0) => Some(current),
        Some(n) if n > current => Some(n),
        Some(_) => None,
    }
}

struct Subscription {
    scope: SubscriptionScope,
    kind: EventKind,
    handler: EventHandler,
}

/// Reference host keeping everything in process memory. Complete enough
/// for tests and embedded use: sequence admission, expiry, and
/// subscription dispatch all behave like a real host.
#[derive(Clone)]
pub struct InMemoryHost {
    records: Arc<RwLock<BTreeMap<String, HostRecord>>>,
    subscriptions: Arc<RwLock<HashMap<String, Subscription>>>,
    caps: HostCapabilities,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::with_capabilities(HostCapabilities::full())
    }

    pub fn with_capabilities(caps: HostCapabilities) -> Self {
        Self {
            records: Arc::new(RwLock::new(BTreeMap::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            caps,
        }
    }

    /// Simulates the host reporting an interaction: fires every
    /// subscription whose scope and kind match. Returns how many handlers
    /// ran. Handlers run outside the subscription lock.
    pub async fn emit(
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

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostService for InMemoryHost {
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
        let key = record.identity.key();
        debug!(identity = %key, sequence = record.sequence, "notification posted");
        self.records.write().await.insert(key, record);
        Ok(())
    }

    async fn update(
        &self,
        identity: &DeliveryIdentity,
        data: BTreeMap<String, String>,
        sequence: Option<SequenceNumber>,
    ) -> Result<UpdateOutcome> {
        let mut guard = self.records.write().await;
        let Some(record) = guard.get_mut(&identity.key()) else {
            return Ok(UpdateOutcome::NotFound);
        };
        let Some(next) = admit_sequence(record.sequence, sequence) else {
            debug!(identity = %identity.key(), "stale update discarded");
            return Ok(UpdateOutcome::Stale);
        };
        record.data.extend(data);
        record.sequence = next;
        record.updated_at = OffsetDateTime::now_utc();
        Ok(UpdateOutcome::Applied)
    }

    async fn remove(&self, selector: &RemoveSelector) -> Result<usize> {
        let mut guard = self.records.write().await;
        let before = guard.len();
        match selector {
            RemoveSelector::All => guard.clear(),
            RemoveSelector::Exact(identity) => {
                guard.remove(&identity.key());
            }
            RemoveSelector::Tag(tag) => guard.retain(|_, r| r.identity.tag != *tag),
            RemoveSelector::Group(group) => guard.retain(|_, r| r.identity.group != *group),
        }
        Ok(before - guard.len())
    }

    async fn history(&self, identity: Option<&DeliveryIdentity>) -> Result<Vec<HostRecord>> {
        let now = OffsetDateTime::now_utc();
        let guard = self.records.read().await;
        let mut live: Vec<HostRecord> = guard
            .values()
            .filter(|r| !r.is_expired(now))
            .filter(|r| identity.is_none_or(|id| *id == r.identity))
            .cloned()
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

/// Adapts a host's subscription facility to the registrar's store
/// contract, so handler dedup decisions and host registrations stay in
/// one place.
pub struct HostSubscriptionStore {
    host: SharedHost,
}

impl HostSubscriptionStore {
    pub fn new(host: SharedHost) -> Self {
        Self { host }
    }
}

#[async_trait]
impl HandlerStore for HostSubscriptionStore {
    async fn try_register(
        &self,
        kind: EventKind,
        source_id: &str,
        handler: EventHandler,
    ) -> Result<RegisterSlot> {
        match self
            .host
            .subscribe(SubscriptionScope::Global, kind, source_id, handler)
            .await?
        {
            SubscribeAck::Subscribed => Ok(RegisterSlot::Inserted),
            SubscribeAck::AlreadyRegistered => Ok(RegisterSlot::AlreadyPresent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn sequence_admission_rules() {
        assert_eq!(admit_sequence(3, None), Some(3));
        assert_eq!(admit_sequence(3, Some(SequenceNumber::from(0))), Some(3));
        assert_eq!(admit_sequence(3, Some(SequenceNumber::from(4))), Some(4));
        assert_eq!(admit_sequence(3, Some(SequenceNumber::from(3))), None);
        assert_eq!(admit_sequence(3, Some(SequenceNumber::from(2))), None);
    }

    #[tokio::test]
    async fn update_applies_merges_and_advances() {
        let host = InMemoryHost::new();
        let id = DeliveryIdentity::for_id("job");
        host.create_or_replace(submission(&id, Some(1))).await.unwrap();

        let outcome = host
            .update(
                &id,
                BTreeMap::from([("status".to_string(), "half".to_string())]),
                Some(SequenceNumber::from(2)),
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied);

        let stale = host
            .update(
                &id,
                BTreeMap::from([("status".to_string(), "old".to_string())]),
                Some(SequenceNumber::from(2)),
            )
            .await
            .unwrap();
        assert_eq!(stale, UpdateOutcome::Stale);

        let records = host.history(Some(&id)).await.unwrap();
        assert_eq!(records[0].data["status"], "half");
        assert_eq!(records[0].sequence, 2);
    }

    #[tokio::test]
    async fn update_unknown_identity_is_not_found() {
        let host = InMemoryHost::new();
        let outcome = host
            .update(
                &DeliveryIdentity::for_id("ghost"),
                BTreeMap::new(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn zero_sequence_refreshes_without_regressing() {
        let host = InMemoryHost::new();
        let id = DeliveryIdentity::for_id("job");
        host.create_or_replace(submission(&id, Some(5))).await.unwrap();

        let outcome = host
            .update(
                &id,
                BTreeMap::from([("status".to_string(), "fresh".to_string())]),
                Some(SequenceNumber::from(0)),
            )
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied);

        let records = host.history(Some(&id)).await.unwrap();
        assert_eq!(records[0].sequence, 5);
        assert_eq!(records[0].data["status"], "fresh");
    }

    #[tokio::test]
    async fn remove_selectors() {
        let host = InMemoryHost::new();
        let a = DeliveryIdentity::new("alerts", "one");
        let b = DeliveryIdentity::new("alerts", "two");
        let c = DeliveryIdentity::new("jobs", "one");
        for id in [&a, &b, &c] {
            host.create_or_replace(submission(id, None)).await.unwrap();
        }

        let removed = host
            .remove(&RemoveSelector::Tag("one".into()))
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let removed = host
            .remove(&RemoveSelector::Group("alerts".into()))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(host.history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_records_drop_out_of_history() {
        let host = InMemoryHost::new();
        let id = DeliveryIdentity::for_id("old");
        let mut sub = submission(&id, None);
        sub.expires_at = Some(OffsetDateTime::now_utc() - time::Duration::minutes(1));
        host.create_or_replace(sub).await.unwrap();
        assert!(host.history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn emit_fires_matching_scopes_only() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let host = InMemoryHost::new();
        let target = DeliveryIdentity::new("g", "target");
        let other = DeliveryIdentity::new("g", "other");

        let global_hits = Arc::new(AtomicUsize::new(0));
        let scoped_hits = Arc::new(AtomicUsize::new(0));
        let hits = global_hits.clone();
        host.subscribe(
            SubscriptionScope::Global,
            EventKind::Activated,
            "global-sub",
            EventHandler::new("global", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();
        let hits = scoped_hits.clone();
        host.subscribe(
            SubscriptionScope::Identity(target.clone()),
            EventKind::Activated,
            "scoped-sub",
            EventHandler::new("scoped", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            host.emit(&target, EventKind::Activated, None, BTreeMap::new())
                .await,
            2
        );
        assert_eq!(
            host.emit(&other, EventKind::Activated, None, BTreeMap::new())
                .await,
            1
        );
        assert_eq!(
            host.emit(&target, EventKind::Dismissed, None, BTreeMap::new())
                .await,
            0
        );
        assert_eq!(global_hits.load(Ordering::SeqCst), 2);
        assert_eq!(scoped_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_subscription_keeps_first() {
        let host = InMemoryHost::new();
        let first = host
            .subscribe(
                SubscriptionScope::Global,
                EventKind::Activated,
                "sub-1",
                EventHandler::inert("a"),
            )
            .await
            .unwrap();
        assert_eq!(first, SubscribeAck::Subscribed);
        let second = host
            .subscribe(
                SubscriptionScope::Global,
                EventKind::Activated,
                "sub-1",
                EventHandler::inert("b"),
            )
            .await
            .unwrap();
        assert_eq!(second, SubscribeAck::AlreadyRegistered);
    }
}
