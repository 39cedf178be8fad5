//! Toastway core: declarative notification content and its delivery.
//!
//! This crate covers the path from element construction to a live
//! notification at the host service: the [`content`] element model and
//! builder, the [`wire`] serializer with its strip and patch passes, the
//! [`media`] cache for remote image sources, and the [`delivery`] channel
//! with its sequence-numbered update protocol. Interaction handler
//! registration and dedup live in the companion `tw-registrar` crate and
//! are re-exported here.
pub mod config;
pub mod content;
pub mod delivery;
pub mod media;
pub mod prelude;
pub mod wire;

pub use config::{ContentDefaults, MediaConfig, SpoolConfig};
pub use content::{ContentError, ToastBuilder, ToastContent};
pub use delivery::{
    DeliveryError, DeliveryIdentity, DeliveryReceipt, Notifier, RemoveSelector, SequenceNumber,
    SubmitOptions, UpdateOutcome,
};
pub use media::{MediaCache, MediaResolver, PassthroughResolver};
pub use tw_registrar::{
    EventHandler, EventKind, EventRegistrar, HostCapabilities, InteractionEvent, Registration,
};
pub use wire::{render_payload, BindingMode, Payload, SerializeError};

/// Library version, for diagnostics.
///
/// ```
/// assert_eq!(tw_core::version(), env!("CARGO_PKG_VERSION"));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
