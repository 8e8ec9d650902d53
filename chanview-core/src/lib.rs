#![crate_name = "chanview"]

//! A list-model adapter that exposes a wallet's Lightning channels to a
//! declarative UI.
//! See [`model::ChannelListModel`] for the entry point.

#![forbid(unsafe_code)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(missing_docs)]

/// Channel identifiers, states and amounts
pub mod channel;
/// The wallet and Lightning engine interface
pub mod domain;
/// Wallet event delivery
pub mod event;
/// Filtered views
pub mod filter;
/// The channel list model
pub mod model;
/// Rows and roles
pub mod row;
/// In-memory wallet
pub mod snapshot;
/// Various utilities
pub mod util;

pub use model::{ChannelListModel, ListObserver, ModelChange};

/// Common imports
pub mod prelude {
    pub use std::collections::BTreeMap as OrderedMap;
    pub use std::collections::BTreeSet as OrderedSet;

    pub use std::sync::{Arc, Mutex, MutexGuard, Weak};

    /// Convenience trait for Send + Sync
    pub trait SendSync: Send + Sync {}

    impl<T: Send + Sync + ?Sized> SendSync for T {}
}

pub use prelude::SendSync;
