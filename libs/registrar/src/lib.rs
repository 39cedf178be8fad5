//! Dedup-keyed registration of notification interaction handlers.
//!
//! Handlers are identified by the *normalized logical content* of their
//! callback body: whitespace and statement separators are stripped, the text
//! is lower-cased, and the result is hashed. Registering the same body twice
//! under the same role therefore hits the same slot, and the second attempt
//! is reported as a duplicate instead of silently replacing the first.
//!
//! The registration table itself sits behind [`HandlerStore`] so the host
//! subscription primitive can back it in production while tests substitute
//! [`InMemoryHandlerStore`].

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::warn;

/// Interaction roles a handler can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Activated,
    Dismissed,
    Failed,
}

impl EventKind {
    /// Stable role tag used as the source-identifier prefix.
    pub fn role_tag(&self) -> &'static str {
        match self {
            EventKind::Activated => "Activated",
            EventKind::Dismissed => "Dismissed",
            EventKind::Failed => "Failed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role_tag())
    }
}

/// Interaction event delivered back from the host service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub group: String,
    pub tag: String,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,
}

/// Callback invoked when the host reports an interaction.
pub type HandlerFn = Arc<dyn Fn(InteractionEvent) + Send + Sync>;

/// A callback body paired with the action to run.
///
/// The `body` is the handler's logical content, the text the dedup key is
/// derived from. Two handlers whose bodies normalize to the same text collide
/// and only the first registers; closed-over state in `action` is invisible
/// to that identity on purpose.
#[derive(Clone)]
pub struct EventHandler {
    pub body: String,
    pub action: HandlerFn,
}

impl EventHandler {
    pub fn new<F>(body: impl Into<String>, action: F) -> Self
    where
        F: Fn(InteractionEvent) + Send + Sync + 'static,
    {
        Self {
            body: body.into(),
            action: Arc::new(action),
        }
    }

    /// Handler that only carries a body, for callers that merely want the
    /// host-side registration.
    pub fn inert(body: impl Into<String>) -> Self {
        Self::new(body, |_event| {})
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Strips whitespace and statement separators (`;`, `|`) and lower-cases the
/// remainder.
///
/// ```
/// use tw_registrar::normalized_body;
///
/// assert_eq!(normalized_body("Open-Log -Path X;"), normalized_body("open-log  -path x"));
/// ```
pub fn normalized_body(body: &str) -> String {
    body.chars()
        .filter(|c| !c.is_whitespace() && *c != ';' && *c != '|')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Derives the stable registration key for a handler body under a role.
///
/// The key is `<RoleTag>-<hex sha256(normalized body)>`. Distinct bodies that
/// normalize to the same text share a key; that collision is a property of
/// the content-addressing scheme, not an error, and the first registration
/// wins.
pub fn source_identifier(kind: EventKind, body: &str) -> String {
    let digest = Sha256::digest(normalized_body(body).as_bytes());
    format!("{}-{}", kind.role_tag(), hex::encode(digest))
}

/// Outcome of a raw store insertion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterSlot {
    Inserted,
    AlreadyPresent,
}

/// Contract implemented by handler registration tables.
///
/// Production backs this with the host subscription primitive; tests use
/// [`InMemoryHandlerStore`]. Returns [`RegisterSlot::AlreadyPresent`] when a
/// prior registration holds `source_id`; implementations must keep the
/// earlier handler in that case.
#[async_trait]
pub trait HandlerStore: Send + Sync {
    async fn try_register(
        &self,
        kind: EventKind,
        source_id: &str,
        handler: EventHandler,
    ) -> Result<RegisterSlot>;
}

/// Shared trait object wrapper.
pub type SharedHandlerStore = Arc<dyn HandlerStore>;

/// Process-local registration table used in tests and by hosts without a
/// native subscription facility.
#[derive(Clone, Default)]
pub struct InMemoryHandlerStore {
    inner: Arc<RwLock<HashMap<String, EventHandler>>>,
}

impl InMemoryHandlerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn contains(&self, source_id: &str) -> bool {
        self.inner.read().await.contains_key(source_id)
    }

    /// Invokes the handler registered under `source_id`, if any. The action
    /// runs outside the table lock.
    pub async fn fire(&self, source_id: &str, event: InteractionEvent) -> bool {
        let action = {
            let guard = self.inner.read().await;
            guard.get(source_id).map(|handler| handler.action.clone())
        };
        match action {
            Some(action) => {
                action(event);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl HandlerStore for InMemoryHandlerStore {
    async fn try_register(
        &self,
        _kind: EventKind,
        source_id: &str,
        handler: EventHandler,
    ) -> Result<RegisterSlot> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(source_id) {
            return Ok(RegisterSlot::AlreadyPresent);
        }
        guard.insert(source_id.to_string(), handler);
        Ok(RegisterSlot::Inserted)
    }
}

/// Host feature support, computed once at startup and threaded in explicitly
/// rather than read from ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    pub activation_events: bool,
    pub dismissal_events: bool,
    pub failure_events: bool,
}

impl HostCapabilities {
    /// Every interaction role is available.
    pub fn full() -> Self {
        Self {
            activation_events: true,
            dismissal_events: true,
            failure_events: true,
        }
    }

    /// Hosts that only report activation (older service versions).
    pub fn activation_only() -> Self {
        Self {
            activation_events: true,
            dismissal_events: false,
            failure_events: false,
        }
    }

    pub fn supports(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Activated => self.activation_events,
            EventKind::Dismissed => self.dismissal_events,
            EventKind::Failed => self.failure_events,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// Result of a registration attempt. `Duplicate` and `Skipped` are warnings,
/// not errors: delivery continues and the earlier handler (if any) stays
/// authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered { source_id: String },
    Duplicate { source_id: String },
    Skipped { kind: EventKind },
}

impl Registration {
    pub fn is_registered(&self) -> bool {
        matches!(self, Registration::Registered { .. })
    }
}

/// Guard that derives dedup keys, gates on host capabilities, and reports
/// duplicates without replacing or retrying.
#[derive(Clone)]
pub struct EventRegistrar {
    store: SharedHandlerStore,
    caps: HostCapabilities,
}

impl EventRegistrar {
    pub fn new(store: SharedHandlerStore, caps: HostCapabilities) -> Self {
        Self { store, caps }
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    /// Registers `handler` for `kind` under its content-derived identifier.
    ///
    /// Unsupported kinds are skipped with one descriptive warning. A prior
    /// registration under the same identifier yields
    /// [`Registration::Duplicate`]; the table is left unchanged.
    pub async fn register(&self, kind: EventKind, handler: EventHandler) -> Result<Registration> {
        if !self.caps.supports(kind) {
            warn!(
                kind = kind.role_tag(),
                "host does not support this event kind; skipping handler registration"
            );
            return Ok(Registration::Skipped { kind });
        }

        let source_id = source_identifier(kind, &handler.body);
        match self.store.try_register(kind, &source_id, handler).await? {
            RegisterSlot::Inserted => Ok(Registration::Registered { source_id }),
            RegisterSlot::AlreadyPresent => {
                warn!(
                    kind = kind.role_tag(),
                    source_id = %source_id,
                    "a handler with an identical normalized body is already registered; keeping the original"
                );
                metrics::counter!("toastway_handler_duplicate_total", "kind" => kind.role_tag())
                    .increment(1);
                Ok(Registration::Duplicate { source_id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording_handler(body: &str, log: Arc<Mutex<Vec<String>>>) -> EventHandler {
        let body_owned = body.to_string();
        EventHandler::new(body, move |event: InteractionEvent| {
            log.lock()
                .unwrap()
                .push(format!("{}:{}", body_owned, event.tag));
        })
    }

    #[test]
    fn normalization_folds_whitespace_case_and_separators() {
        assert_eq!(normalized_body("Show-Result; Open-Log"), "show-resultopen-log");
        assert_eq!(
            normalized_body("show-result\n\topen-log"),
            "show-resultopen-log"
        );
        assert_eq!(normalized_body("a | b"), "ab");
        assert_ne!(normalized_body("open-log"), normalized_body("open-logs"));
    }

    #[test]
    fn source_identifiers_are_role_prefixed_and_stable() {
        let a = source_identifier(EventKind::Activated, "Open-Log -Path X");
        let b = source_identifier(EventKind::Activated, "open-log    -path x;");
        let c = source_identifier(EventKind::Dismissed, "Open-Log -Path X");
        assert_eq!(a, b);
        assert!(a.starts_with("Activated-"));
        assert!(c.starts_with("Dismissed-"));
        assert_ne!(a, c);
        // SHA-256 hex digest after the role tag and dash.
        assert_eq!(a.len(), "Activated-".len() + 64);
    }

    #[tokio::test]
    async fn memory_store_keeps_the_first_handler() {
        let store = InMemoryHandlerStore::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let id = source_identifier(EventKind::Activated, "body");
        let first = store
            .try_register(
                EventKind::Activated,
                &id,
                recording_handler("first", log.clone()),
            )
            .await
            .unwrap();
        assert_eq!(first, RegisterSlot::Inserted);

        let second = store
            .try_register(
                EventKind::Activated,
                &id,
                recording_handler("second", log.clone()),
            )
            .await
            .unwrap();
        assert_eq!(second, RegisterSlot::AlreadyPresent);
        assert_eq!(store.len().await, 1);

        let event = InteractionEvent {
            group: "g".into(),
            tag: "t".into(),
            kind: EventKind::Activated,
            arguments: None,
            inputs: BTreeMap::new(),
        };
        assert!(store.fire(&id, event).await);
        assert_eq!(log.lock().unwrap().as_slice(), ["first:t"]);
    }

    #[tokio::test]
    async fn registrar_reports_duplicates_without_replacing() {
        let store = InMemoryHandlerStore::new();
        let registrar = EventRegistrar::new(Arc::new(store.clone()), HostCapabilities::full());

        let first = registrar
            .register(EventKind::Activated, EventHandler::inert("Invoke-Item X"))
            .await
            .unwrap();
        assert!(first.is_registered());

        // Same body modulo whitespace, case, and separators.
        let second = registrar
            .register(EventKind::Activated, EventHandler::inert("invoke-item  x ;"))
            .await
            .unwrap();
        assert!(matches!(second, Registration::Duplicate { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn same_body_registers_once_per_role() {
        let store = InMemoryHandlerStore::new();
        let registrar = EventRegistrar::new(Arc::new(store.clone()), HostCapabilities::full());

        let activated = registrar
            .register(EventKind::Activated, EventHandler::inert("body"))
            .await
            .unwrap();
        let dismissed = registrar
            .register(EventKind::Dismissed, EventHandler::inert("body"))
            .await
            .unwrap();
        assert!(activated.is_registered());
        assert!(dismissed.is_registered());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn capability_gate_skips_unsupported_kinds() {
        let store = InMemoryHandlerStore::new();
        let registrar =
            EventRegistrar::new(Arc::new(store.clone()), HostCapabilities::activation_only());

        let dismissed = registrar
            .register(EventKind::Dismissed, EventHandler::inert("body"))
            .await
            .unwrap();
        assert_eq!(
            dismissed,
            Registration::Skipped {
                kind: EventKind::Dismissed
            }
        );
        let failed = registrar
            .register(EventKind::Failed, EventHandler::inert("body"))
            .await
            .unwrap();
        assert_eq!(
            failed,
            Registration::Skipped {
                kind: EventKind::Failed
            }
        );
        assert!(store.is_empty().await);

        let activated = registrar
            .register(EventKind::Activated, EventHandler::inert("body"))
            .await
            .unwrap();
        assert!(activated.is_registered());
    }
}
