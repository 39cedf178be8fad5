//! Submission and update channel against a host notification service.
//!
//! [`Notifier`] is the delivery facade: it renders content to a wire
//! payload, registers interaction handlers through the dedup registrar,
//! and posts the result to a [`HostService`]. Registration side effects
//! never abort a delivery; they surface as warnings on the
//! [`DeliveryReceipt`].

pub mod host;
pub mod spool;

pub use host::{
    HostRecord, HostService, HostSubmission, HostSubscriptionStore, InMemoryHost, SharedHost,
    SubscribeAck, SubscriptionScope, UpdateOutcome,
};
pub use spool::SpoolHost;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use tw_registrar::{EventHandler, EventKind, EventRegistrar, Registration};
use uuid::Uuid;

use crate::content::ToastContent;
use crate::wire::{render_payload, BindingMode, SerializeError};

/// Addresses one notification at the host: a group and a tag. Posting
/// under an existing identity replaces the previous notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryIdentity {
    pub group: String,
    pub tag: String,
}

impl DeliveryIdentity {
    pub fn new(group: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            tag: tag.into(),
        }
    }

    /// Uses one id for both halves, for callers that track a single
    /// handle per notification.
    pub fn for_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            group: id.clone(),
            tag: id,
        }
    }

    pub fn generate() -> Self {
        Self::for_id(Uuid::new_v4().to_string())
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DeliveryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.group, self.tag)
    }
}

/// Monotonic update counter for one notification. The host discards
/// updates whose sequence does not advance past the stored one; zero is
/// the unconditional-refresh value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which live notifications a removal targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RemoveSelector {
    Tag(String),
    Group(String),
    Exact(DeliveryIdentity),
    All,
}

/// Delivery settings for one submission.
#[derive(Default)]
pub struct SubmitOptions {
    pub id: Option<String>,
    /// Binding snapshot. Present switches rendering to
    /// [`BindingMode::Template`]; absent renders literally.
    pub data: Option<BTreeMap<String, String>>,
    pub sequence: Option<SequenceNumber>,
    pub expires_at: Option<OffsetDateTime>,
    pub suppress_popup: bool,
    pub urgent: bool,
    pub on_activated: Option<EventHandler>,
    pub on_dismissed: Option<EventHandler>,
    pub on_failed: Option<EventHandler>,
}

impl SubmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caller-chosen identity; both halves of the delivery identity get
    /// this id. Without one, a fresh unique identity is generated.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn data(mut self, data: BTreeMap<String, String>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn data_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn sequence(mut self, sequence: impl Into<SequenceNumber>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    pub fn expires_at(mut self, when: OffsetDateTime) -> Self {
        self.expires_at = Some(when);
        self
    }

    /// Posts straight to the listing without the transient popup.
    pub fn suppress_popup(mut self, suppress: bool) -> Self {
        self.suppress_popup = suppress;
        self
    }

    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }

    pub fn on_activated(mut self, handler: EventHandler) -> Self {
        self.on_activated = Some(handler);
        self
    }

    pub fn on_dismissed(mut self, handler: EventHandler) -> Self {
        self.on_dismissed = Some(handler);
        self
    }

    pub fn on_failed(mut self, handler: EventHandler) -> Self {
        self.on_failed = Some(handler);
        self
    }
}

/// Non-fatal observations from a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptWarning {
    /// A handler with the same normalized body was already registered;
    /// the original stays in place.
    DuplicateHandler { kind: EventKind, source_id: String },
    /// The host does not report this event kind.
    HandlerSkipped { kind: EventKind },
    /// The registration attempt itself failed; delivery continued.
    RegistrationFailed { kind: EventKind, reason: String },
}

impl fmt::Display for ReceiptWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptWarning::DuplicateHandler { kind, source_id } => {
                write!(f, "duplicate {kind} handler, kept the original ({source_id})")
            }
            ReceiptWarning::HandlerSkipped { kind } => {
                write!(f, "host does not support {kind} events, handler skipped")
            }
            ReceiptWarning::RegistrationFailed { kind, reason } => {
                write!(f, "could not register {kind} handler: {reason}")
            }
        }
    }
}

/// What a successful submission produced.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub identity: DeliveryIdentity,
    /// Binding keys discovered in the content, in document order.
    pub binding_keys: Vec<String>,
    pub warnings: Vec<ReceiptWarning>,
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error("host {op} failed")]
    Host {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Delivery facade tying the serializer, the handler registrar, and a
/// host service together.
#[derive(Clone)]
pub struct Notifier {
    host: SharedHost,
    registrar: EventRegistrar,
}

impl Notifier {
    pub fn new(host: SharedHost) -> Self {
        let caps = host.capabilities();
        let store = Arc::new(HostSubscriptionStore::new(host.clone()));
        Self {
            host,
            registrar: EventRegistrar::new(store, caps),
        }
    }

    pub fn registrar(&self) -> &EventRegistrar {
        &self.registrar
    }

    pub fn host(&self) -> &SharedHost {
        &self.host
    }

    /// Renders `content` and posts it under a new or caller-chosen
    /// identity.
    ///
    /// Supplied handlers are registered before the post. A template
    /// submission completes its binding snapshot: every discovered key
    /// missing from the caller's data is seeded with the key name, so the
    /// host never displays an unbound slot.
    pub async fn submit(
        &self,
        content: &ToastContent,
        opts: SubmitOptions,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let mode = if opts.data.is_some() {
            BindingMode::Template
        } else {
            BindingMode::Literal
        };
        let payload = render_payload(content, mode, opts.urgent)?;

        let identity = match opts.id {
            Some(id) => DeliveryIdentity::for_id(id),
            None => DeliveryIdentity::generate(),
        };

        let mut warnings = Vec::new();
        let handlers = [
            (EventKind::Activated, opts.on_activated),
            (EventKind::Dismissed, opts.on_dismissed),
            (EventKind::Failed, opts.on_failed),
        ];
        for (kind, handler) in handlers {
            let Some(handler) = handler else { continue };
            match self.registrar.register(kind, handler).await {
                Ok(Registration::Registered { .. }) => {}
                Ok(Registration::Duplicate { source_id }) => {
                    warnings.push(ReceiptWarning::DuplicateHandler { kind, source_id });
                }
                Ok(Registration::Skipped { kind }) => {
                    warnings.push(ReceiptWarning::HandlerSkipped { kind });
                }
                Err(error) => {
                    warn!(kind = %kind, %error, "handler registration failed, continuing delivery");
                    warnings.push(ReceiptWarning::RegistrationFailed {
                        kind,
                        reason: error.to_string(),
                    });
                }
            }
        }

        let mut data = opts.data.unwrap_or_default();
        if mode == BindingMode::Template {
            for key in &payload.binding_keys {
                data.entry(key.clone()).or_insert_with(|| key.clone());
            }
        }

        self.host
            .create_or_replace(HostSubmission {
                identity: identity.clone(),
                markup: payload.markup,
                data,
                sequence: opts.sequence,
                expires_at: opts.expires_at,
                suppress_popup: opts.suppress_popup,
            })
            .await
            .map_err(|source| DeliveryError::Host {
                op: "create_or_replace",
                source,
            })?;

        info!(identity = %identity, keys = payload.binding_keys.len(), "notification delivered");
        Ok(DeliveryReceipt {
            identity,
            binding_keys: payload.binding_keys,
            warnings,
        })
    }

    /// Pushes a new binding snapshot to a live notification.
    pub async fn update(
        &self,
        identity: &DeliveryIdentity,
        data: BTreeMap<String, String>,
        sequence: Option<SequenceNumber>,
    ) -> Result<UpdateOutcome, DeliveryError> {
        self.host
            .update(identity, data, sequence)
            .await
            .map_err(|source| DeliveryError::Host {
                op: "update",
                source,
            })
    }

    pub async fn remove(&self, selector: &RemoveSelector) -> Result<usize, DeliveryError> {
        self.host
            .remove(selector)
            .await
            .map_err(|source| DeliveryError::Host {
                op: "remove",
                source,
            })
    }

    pub async fn history(
        &self,
        identity: Option<&DeliveryIdentity>,
    ) -> Result<Vec<HostRecord>, DeliveryError> {
        self.host
            .history(identity)
            .await
            .map_err(|source| DeliveryError::Host {
                op: "history",
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_is_group_and_tag() {
        let id = DeliveryIdentity::new("downloads", "iso");
        assert_eq!(id.key(), "downloads~iso");
        let same = DeliveryIdentity::for_id("job-1");
        assert_eq!(same.group, same.tag);
    }

    #[test]
    fn generated_identities_are_unique() {
        assert_ne!(DeliveryIdentity::generate(), DeliveryIdentity::generate());
    }

    #[test]
    fn options_accumulate_data_entries() {
        let opts = SubmitOptions::new()
            .data_entry("status", "queued")
            .data_entry("eta", "5m");
        let data = opts.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["status"], "queued");
    }
}
