//! The narrow interface to the wallet and its Lightning engine.
//!
//! Channel lifecycle, balance accounting and peer management live behind
//! these traits.  The list model only reads through them.

use core::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::channel::{ChannelId, ChannelState, NodeId, Side};
use crate::prelude::*;

/// Identity of a wallet, used to route events to the right models
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct WalletId(String);

impl WalletId {
    /// Create an ID
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The wallet name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A wallet, which may or may not have Lightning enabled
pub trait Wallet: SendSync {
    /// The wallet identity
    fn id(&self) -> WalletId;
    /// The Lightning engine, if this wallet has one
    fn lnworker(&self) -> Option<Arc<dyn LnWorker>>;
}

/// The wallet's Lightning engine
pub trait LnWorker: SendSync {
    /// Active (non-backup) channels
    fn channels(&self) -> Vec<Arc<dyn LnChannel>>;

    /// Channel backups
    fn channel_backups(&self) -> Vec<Arc<dyn LnChannel>>;

    /// Channels followed by backups
    fn channel_objects(&self) -> Vec<Arc<dyn LnChannel>> {
        let mut all = self.channels();
        all.extend(self.channel_backups());
        all
    }

    /// Look up an active channel by id
    fn get_channel(&self, cid: &ChannelId) -> Option<Arc<dyn LnChannel>> {
        self.channels().into_iter().find(|c| &c.channel_id() == cid)
    }

    /// The gossip alias of a node, if known
    fn node_alias(&self, node_id: &NodeId) -> Option<String>;

    /// Whether the node is one of our trampoline peers
    fn is_trampoline_peer(&self, node_id: &NodeId) -> bool;
}

/// A Lightning channel, or a backup of one
pub trait LnChannel: SendSync {
    /// The channel id
    fn channel_id(&self) -> ChannelId;
    /// The peer's node id
    fn node_id(&self) -> NodeId;
    /// Short channel id for display, empty if not yet known
    fn short_id_for_gui(&self) -> String;
    /// Current state
    fn state(&self) -> ChannelState;
    /// Human readable state label
    fn state_for_gui(&self) -> String {
        self.state().name().to_string()
    }
    /// True if this is a backup rather than a live channel
    fn is_backup(&self) -> bool;
    /// True if the backup was imported from a file
    fn is_imported(&self) -> bool;
    /// True if we opened the channel
    fn is_initiator(&self) -> bool;
    /// Channel capacity
    fn capacity_sat(&self) -> u64;
    /// Amount the given side can currently send, in msat
    fn available_to_spend(&self, side: Side) -> u64;
    /// Balance of the given side, in msat
    fn balance(&self, side: Side) -> u64;
    /// The to_self_delay imposed on the given side
    fn csv_delay(&self, side: Side) -> u16;
    /// Sending is frozen by the user
    fn is_frozen_for_sending(&self) -> bool;
    /// Receiving is frozen by the user
    fn is_frozen_for_receiving(&self) -> bool;
    /// Channel type tag, e.g. "ANCHORS_ZERO_FEE_HTLC_TX"
    fn channel_type(&self) -> String;
    /// The funding outpoint, as "txid:vout", if funded
    fn funding_outpoint(&self) -> Option<String>;
}
