//! Flat, path-addressable bridge over a typed service tree.
//!
//! Legacy RPC clients cannot represent nesting, typed leaves or object
//! identity. This crate maps a hierarchical tree onto a flat set of
//! string-addressed leaves and back:
//!
//! - **[`AccessPath`]**: the textual path grammar
//!   (`panel.channels[2].gains["left"]`), with exact round-tripping.
//!
//! - **Native model** ([`model`]): a closed set of value kinds: scalars,
//!   enums with a registered declaration order, physical quantities,
//!   sequences, mappings, nested [`DataObject`]s with computed properties
//!   and methods, and the [`NumberSlider`] widget.
//!
//! - **[`DataService`]**: owns a tree, serves consistent reads and is the
//!   single write entry point. Changes are broadcast as [`ChangeEvent`]s.
//!
//! - **Resolver, flattener, coercer** ([`resolve`], [`flatten()`],
//!   [`coerce`]): walk paths, turn snapshots into `path -> leaf` maps,
//!   and convert between wire scalars and native values.
//!
//! - **[`NotificationBridge`]**: republishes tree changes to registered
//!   [`Observer`]s, coerced and addressed the way the flat client expects.
//!
//! - **[`RpcInterface`]**: `get_props`, `get_param`, `set_param`,
//!   `remote_call` and friends, ready to be wired to a transport.

pub mod bridge;
pub mod coerce;
pub mod config;
pub mod error;
pub mod flatten;
pub mod model;
pub mod path;
pub mod resolve;
pub mod rpc;
pub mod service;
pub mod snapshot;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{
    BridgeState, ChannelObserver, Notification, NotificationBridge, Observer, ObserverError,
    ObserverId,
};
pub use coerce::{SkipReason, WritePlan};
pub use config::{BridgeConfig, WritePolicy};
pub use error::BridgeError;
pub use flatten::{FlatMap, flatten};
pub use path::{AccessPath, Segment};
pub use resolve::{Resolved, WriteOutcome};
pub use rpc::RpcInterface;
pub use service::{ChangeEvent, DataService};
pub use snapshot::{SerializedLeaf, SerializedNode, SliderLimits};

pub use model::{
    DataObject, EnumDescriptor, EnumMember, EnumRegistry, Member, Method, NumberSlider, Parameter,
    Property, Quantity, TypeTag, Value,
};
