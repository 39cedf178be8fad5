//! Convenience re-exports for building and delivering notifications.

pub use crate::config::{ContentDefaults, MediaConfig, SpoolConfig};
pub use crate::content::{
    ActionButton, ActionSet, ActivationKind, Audio, BodyElement, Button, ButtonColor,
    ContentError, ContextMenuItem, DismissButton, Group, Header, Image, ImageCrop, ImageRole,
    InputControl, People, ProgressBar, ProgressValue, Scenario, SelectionInput, SelectionItem,
    SnoozeButton, Sound, SoundSource, Subgroup, SubgroupChild, Text, TextAlign, TextInput,
    TextStyle, ToastBuilder, ToastContent, ToastDuration, Visual,
};
pub use crate::delivery::{
    DeliveryError, DeliveryIdentity, DeliveryReceipt, HostRecord, HostService, HostSubmission,
    InMemoryHost, Notifier, ReceiptWarning, RemoveSelector, SequenceNumber, SharedHost,
    SpoolHost, SubmitOptions, SubscribeAck, SubscriptionScope, UpdateOutcome,
};
pub use crate::media::{MediaCache, MediaResolver, PassthroughResolver};
pub use crate::wire::{render_payload, BindingMode, Payload, SerializeError, WireElement};
pub use tw_registrar::{
    EventHandler, EventKind, EventRegistrar, HostCapabilities, InteractionEvent, Registration,
};
