use core::fmt;

use serde_derive::Serialize;

use crate::channel::{Amount, ChannelId, ChannelState, Side};
use crate::domain::{LnChannel, LnWorker};

/// Role keys start here, the first value a list-model contract leaves for
/// application defined roles.
pub const USER_ROLE: i32 = 0x0100;

/// A named field of a [ChannelRow], as exposed to the UI.
///
/// Variant order is key order.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Cid,
    State,
    StateCode,
    Initiator,
    Capacity,
    CanSend,
    CanReceive,
    LocalCsvDelay,
    RemoteCsvDelay,
    SendFrozen,
    ReceiveFrozen,
    Type,
    NodeId,
    NodeAlias,
    ShortCid,
    FundingTx,
    IsTrampoline,
    IsBackup,
    IsImported,
    LocalCapacity,
    RemoteCapacity,
}

impl Role {
    /// All roles, in key order
    pub const ALL: [Role; 21] = [
        Role::Cid,
        Role::State,
        Role::StateCode,
        Role::Initiator,
        Role::Capacity,
        Role::CanSend,
        Role::CanReceive,
        Role::LocalCsvDelay,
        Role::RemoteCsvDelay,
        Role::SendFrozen,
        Role::ReceiveFrozen,
        Role::Type,
        Role::NodeId,
        Role::NodeAlias,
        Role::ShortCid,
        Role::FundingTx,
        Role::IsTrampoline,
        Role::IsBackup,
        Role::IsImported,
        Role::LocalCapacity,
        Role::RemoteCapacity,
    ];

    /// The name the UI binds to
    pub fn name(&self) -> &'static str {
        match self {
            Role::Cid => "cid",
            Role::State => "state",
            Role::StateCode => "state_code",
            Role::Initiator => "initiator",
            Role::Capacity => "capacity",
            Role::CanSend => "can_send",
            Role::CanReceive => "can_receive",
            Role::LocalCsvDelay => "l_csv_delay",
            Role::RemoteCsvDelay => "r_csv_delay",
            Role::SendFrozen => "send_frozen",
            Role::ReceiveFrozen => "receive_frozen",
            Role::Type => "type",
            Role::NodeId => "node_id",
            Role::NodeAlias => "node_alias",
            Role::ShortCid => "short_cid",
            Role::FundingTx => "funding_tx",
            Role::IsTrampoline => "is_trampoline",
            Role::IsBackup => "is_backup",
            Role::IsImported => "is_imported",
            Role::LocalCapacity => "local_capacity",
            Role::RemoteCapacity => "remote_capacity",
        }
    }

    /// The integer key of this role
    pub fn key(&self) -> i32 {
        USER_ROLE + *self as i32
    }

    /// Look up a role by key
    pub fn from_key(key: i32) -> Option<Role> {
        let index = key.checked_sub(USER_ROLE)?;
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Look up a role by name
    pub fn from_name(name: &str) -> Option<Role> {
        Self::ALL.iter().copied().find(|r| r.name() == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed field value
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RoleValue {
    /// A flag
    Bool(bool),
    /// An integer
    Int(i64),
    /// Text
    Str(String),
    /// An amount
    Amount(Amount),
}

impl fmt::Display for RoleValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoleValue::Bool(b) => write!(f, "{}", b),
            RoleValue::Int(i) => write!(f, "{}", i),
            RoleValue::Str(s) => f.write_str(s),
            RoleValue::Amount(a) => write!(f, "{}", a),
        }
    }
}

impl From<bool> for RoleValue {
    fn from(b: bool) -> Self {
        RoleValue::Bool(b)
    }
}

impl From<&str> for RoleValue {
    fn from(s: &str) -> Self {
        RoleValue::Str(s.to_string())
    }
}

impl From<i64> for RoleValue {
    fn from(i: i64) -> Self {
        RoleValue::Int(i)
    }
}

/// A point-in-time snapshot of one channel, as the UI sees it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelRow {
    /// Channel id, hex
    pub cid: String,
    /// Human readable state
    pub state: String,
    /// Numeric [ChannelState] code
    pub state_code: i32,
    /// We opened the channel
    pub initiator: bool,
    /// Channel capacity
    pub capacity: Amount,
    /// Spendable by us
    pub can_send: Amount,
    /// Spendable by the peer
    pub can_receive: Amount,
    /// Our to_self_delay
    pub l_csv_delay: u16,
    /// The peer's to_self_delay
    pub r_csv_delay: u16,
    /// Sending frozen
    pub send_frozen: bool,
    /// Receiving frozen
    pub receive_frozen: bool,
    /// Channel type tag
    #[serde(rename = "type")]
    pub channel_type: String,
    /// Peer node id, hex
    pub node_id: String,
    /// Peer alias, empty if unknown
    pub node_alias: String,
    /// Short channel id for display
    pub short_cid: String,
    /// Funding outpoint, empty if not funded
    pub funding_tx: String,
    /// Peer is a trampoline node
    pub is_trampoline: bool,
    /// Entry is a channel backup
    pub is_backup: bool,
    /// Backup was imported
    pub is_imported: bool,
    /// Our balance
    pub local_capacity: Amount,
    /// The peer's balance
    pub remote_capacity: Amount,
}

impl ChannelRow {
    /// Snapshot a domain channel.
    ///
    /// Backups carry no live balances, so their amounts are zero.
    pub fn from_channel(lnworker: &dyn LnWorker, chan: &dyn LnChannel) -> ChannelRow {
        let node_id = chan.node_id();
        let state = chan.state();
        let is_backup = chan.is_backup();
        let (can_send, can_receive, local_capacity, remote_capacity, is_imported) = if is_backup {
            (Amount::zero(), Amount::zero(), Amount::zero(), Amount::zero(), chan.is_imported())
        } else {
            (
                Amount::from_msat(chan.available_to_spend(Side::Local)),
                Amount::from_msat(chan.available_to_spend(Side::Remote)),
                Amount::from_msat(chan.balance(Side::Local)),
                Amount::from_msat(chan.balance(Side::Remote)),
                false,
            )
        };
        ChannelRow {
            cid: chan.channel_id().to_string(),
            state: chan.state_for_gui(),
            state_code: state.code(),
            initiator: chan.is_initiator(),
            capacity: Amount::from_sat(chan.capacity_sat()),
            can_send,
            can_receive,
            l_csv_delay: chan.csv_delay(Side::Local),
            r_csv_delay: chan.csv_delay(Side::Remote),
            send_frozen: chan.is_frozen_for_sending(),
            receive_frozen: chan.is_frozen_for_receiving(),
            channel_type: chan.channel_type(),
            node_alias: lnworker.node_alias(&node_id).unwrap_or_default(),
            is_trampoline: lnworker.is_trampoline_peer(&node_id),
            node_id: node_id.to_string(),
            short_cid: chan.short_id_for_gui(),
            funding_tx: chan.funding_outpoint().unwrap_or_default(),
            is_backup,
            is_imported,
            local_capacity,
            remote_capacity,
        }
    }

    /// True if this row's channel has the given id
    pub fn has_id(&self, cid: &ChannelId) -> bool {
        self.cid == cid.to_string()
    }

    /// True if the channel is operational
    pub fn is_open(&self) -> bool {
        self.state_code == ChannelState::Open.code()
    }

    /// Ordering key: state code, then backups after live channels
    pub fn sort_key(&self) -> (i32, bool) {
        (self.state_code, self.is_backup)
    }

    /// The value of one field
    pub fn get(&self, role: Role) -> RoleValue {
        match role {
            Role::Cid => RoleValue::Str(self.cid.clone()),
            Role::State => RoleValue::Str(self.state.clone()),
            Role::StateCode => RoleValue::Int(self.state_code as i64),
            Role::Initiator => RoleValue::Bool(self.initiator),
            Role::Capacity => RoleValue::Amount(self.capacity),
            Role::CanSend => RoleValue::Amount(self.can_send),
            Role::CanReceive => RoleValue::Amount(self.can_receive),
            Role::LocalCsvDelay => RoleValue::Int(self.l_csv_delay as i64),
            Role::RemoteCsvDelay => RoleValue::Int(self.r_csv_delay as i64),
            Role::SendFrozen => RoleValue::Bool(self.send_frozen),
            Role::ReceiveFrozen => RoleValue::Bool(self.receive_frozen),
            Role::Type => RoleValue::Str(self.channel_type.clone()),
            Role::NodeId => RoleValue::Str(self.node_id.clone()),
            Role::NodeAlias => RoleValue::Str(self.node_alias.clone()),
            Role::ShortCid => RoleValue::Str(self.short_cid.clone()),
            Role::FundingTx => RoleValue::Str(self.funding_tx.clone()),
            Role::IsTrampoline => RoleValue::Bool(self.is_trampoline),
            Role::IsBackup => RoleValue::Bool(self.is_backup),
            Role::IsImported => RoleValue::Bool(self.is_imported),
            Role::LocalCapacity => RoleValue::Amount(self.local_capacity),
            Role::RemoteCapacity => RoleValue::Amount(self.remote_capacity),
        }
    }
}
