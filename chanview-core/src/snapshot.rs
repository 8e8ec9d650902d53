//! An in-memory wallet that implements the domain traits, loadable from JSON.
//!
//! Channel objects are immutable.  Mutators replace the stored object and
//! return the new one, which is what a [crate::event::WalletEvent] carries.

use log::*;
use serde_derive::{Deserialize, Serialize};

use crate::channel::{ChannelId, ChannelState, NodeId, Side};
use crate::domain::{LnChannel, LnWorker, Wallet, WalletId};
use crate::prelude::*;
use crate::util::status::{internal_error, not_found, Status};

fn default_csv_delay() -> u16 {
    144
}

fn default_channel_type() -> String {
    "STATIC_REMOTEKEY".to_string()
}

/// Persistent description of a channel or channel backup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// The channel id
    pub channel_id: ChannelId,
    /// The peer
    pub node_id: NodeId,
    /// Short channel id, e.g. "812345x1022x1"
    #[serde(default)]
    pub short_id: Option<String>,
    /// Current state
    pub state: ChannelState,
    /// Overrides the state name shown to the user
    #[serde(default)]
    pub state_label: Option<String>,
    /// Backup was imported from a file (backups only)
    #[serde(default)]
    pub is_imported: bool,
    /// We opened the channel
    #[serde(default)]
    pub initiator: bool,
    /// Channel capacity
    pub capacity_sat: u64,
    /// Our balance
    #[serde(default)]
    pub local_balance_msat: u64,
    /// The peer's balance
    #[serde(default)]
    pub remote_balance_msat: u64,
    /// Spendable by us, defaults to our balance
    #[serde(default)]
    pub local_spendable_msat: Option<u64>,
    /// Spendable by the peer, defaults to the peer's balance
    #[serde(default)]
    pub remote_spendable_msat: Option<u64>,
    /// Our to_self_delay
    #[serde(default = "default_csv_delay")]
    pub local_csv_delay: u16,
    /// The peer's to_self_delay
    #[serde(default = "default_csv_delay")]
    pub remote_csv_delay: u16,
    /// Sending frozen
    #[serde(default)]
    pub send_frozen: bool,
    /// Receiving frozen
    #[serde(default)]
    pub receive_frozen: bool,
    /// Channel type tag
    #[serde(default = "default_channel_type")]
    pub channel_type: String,
    /// Funding outpoint, "txid:vout"
    #[serde(default)]
    pub funding_outpoint: Option<String>,
}

impl ChannelRecord {
    /// A record with defaults for everything but the essentials
    pub fn new(
        channel_id: ChannelId,
        node_id: NodeId,
        state: ChannelState,
        capacity_sat: u64,
    ) -> ChannelRecord {
        ChannelRecord {
            channel_id,
            node_id,
            short_id: None,
            state,
            state_label: None,
            is_imported: false,
            initiator: false,
            capacity_sat,
            local_balance_msat: 0,
            remote_balance_msat: 0,
            local_spendable_msat: None,
            remote_spendable_msat: None,
            local_csv_delay: default_csv_delay(),
            remote_csv_delay: default_csv_delay(),
            send_frozen: false,
            receive_frozen: false,
            channel_type: default_channel_type(),
            funding_outpoint: None,
        }
    }
}

/// A channel object handed out by [SnapshotWorker]
#[derive(Debug)]
pub struct SnapshotChannel {
    record: ChannelRecord,
    is_backup: bool,
}

impl SnapshotChannel {
    /// The underlying record
    pub fn record(&self) -> &ChannelRecord {
        &self.record
    }
}

impl LnChannel for SnapshotChannel {
    fn channel_id(&self) -> ChannelId {
        self.record.channel_id.clone()
    }

    fn node_id(&self) -> NodeId {
        self.record.node_id.clone()
    }

    fn short_id_for_gui(&self) -> String {
        self.record.short_id.clone().unwrap_or_default()
    }

    fn state(&self) -> ChannelState {
        self.record.state
    }

    fn state_for_gui(&self) -> String {
        match &self.record.state_label {
            Some(label) => label.clone(),
            None => self.record.state.name().to_string(),
        }
    }

    fn is_backup(&self) -> bool {
        self.is_backup
    }

    fn is_imported(&self) -> bool {
        self.is_backup && self.record.is_imported
    }

    fn is_initiator(&self) -> bool {
        self.record.initiator
    }

    fn capacity_sat(&self) -> u64 {
        self.record.capacity_sat
    }

    fn available_to_spend(&self, side: Side) -> u64 {
        match side {
            Side::Local => {
                self.record.local_spendable_msat.unwrap_or(self.record.local_balance_msat)
            }
            Side::Remote => {
                self.record.remote_spendable_msat.unwrap_or(self.record.remote_balance_msat)
            }
        }
    }

    fn balance(&self, side: Side) -> u64 {
        match side {
            Side::Local => self.record.local_balance_msat,
            Side::Remote => self.record.remote_balance_msat,
        }
    }

    fn csv_delay(&self, side: Side) -> u16 {
        match side {
            Side::Local => self.record.local_csv_delay,
            Side::Remote => self.record.remote_csv_delay,
        }
    }

    fn is_frozen_for_sending(&self) -> bool {
        self.record.send_frozen
    }

    fn is_frozen_for_receiving(&self) -> bool {
        self.record.receive_frozen
    }

    fn channel_type(&self) -> String {
        self.record.channel_type.clone()
    }

    fn funding_outpoint(&self) -> Option<String> {
        self.record.funding_outpoint.clone()
    }
}

/// Persistent description of a wallet's Lightning state
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightningSnapshot {
    /// Active channels
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,
    /// Channel backups
    #[serde(default)]
    pub backups: Vec<ChannelRecord>,
    /// Node aliases, keyed by hex node id
    #[serde(default)]
    pub aliases: OrderedMap<String, String>,
    /// Trampoline peers
    #[serde(default)]
    pub trampoline_peers: Vec<NodeId>,
}

/// Persistent description of a wallet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    /// The wallet name
    pub wallet_id: String,
    /// Lightning state, absent if Lightning is not enabled
    #[serde(default)]
    pub lightning: Option<LightningSnapshot>,
}

struct WorkerState {
    channels: Vec<Arc<SnapshotChannel>>,
    backups: Vec<Arc<SnapshotChannel>>,
    aliases: OrderedMap<String, String>,
    trampoline_peers: OrderedSet<NodeId>,
}

fn wrap(records: Vec<ChannelRecord>, is_backup: bool) -> Vec<Arc<SnapshotChannel>> {
    records.into_iter().map(|record| Arc::new(SnapshotChannel { record, is_backup })).collect()
}

fn position(list: &[Arc<SnapshotChannel>], cid: &ChannelId) -> Option<usize> {
    list.iter().position(|c| &c.record.channel_id == cid)
}

fn as_dyn(chan: Arc<SnapshotChannel>) -> Arc<dyn LnChannel> {
    chan
}

/// A Lightning engine backed by a [LightningSnapshot]
pub struct SnapshotWorker {
    state: Mutex<WorkerState>,
}

impl SnapshotWorker {
    /// Create from a snapshot
    pub fn new(snapshot: LightningSnapshot) -> Self {
        let state = WorkerState {
            channels: wrap(snapshot.channels, false),
            backups: wrap(snapshot.backups, true),
            aliases: snapshot.aliases,
            trampoline_peers: snapshot.trampoline_peers.into_iter().collect(),
        };
        SnapshotWorker { state: Mutex::new(state) }
    }

    /// Current state, as a snapshot
    pub fn to_snapshot(&self) -> LightningSnapshot {
        let state = self.state.lock().unwrap();
        LightningSnapshot {
            channels: state.channels.iter().map(|c| c.record.clone()).collect(),
            backups: state.backups.iter().map(|c| c.record.clone()).collect(),
            aliases: state.aliases.clone(),
            trampoline_peers: state.trampoline_peers.iter().cloned().collect(),
        }
    }

    /// Add or replace an active channel, returning the new channel object
    pub fn upsert_channel(&self, record: ChannelRecord) -> Arc<dyn LnChannel> {
        let mut state = self.state.lock().unwrap();
        let chan = Arc::new(SnapshotChannel { record, is_backup: false });
        match position(&state.channels, &chan.record.channel_id) {
            Some(i) => state.channels[i] = Arc::clone(&chan),
            None => state.channels.push(Arc::clone(&chan)),
        }
        debug!("upsert channel {}", chan.record.channel_id);
        as_dyn(chan)
    }

    /// Add or replace a backup, returning the new channel object
    pub fn upsert_backup(&self, record: ChannelRecord) -> Arc<dyn LnChannel> {
        let mut state = self.state.lock().unwrap();
        let chan = Arc::new(SnapshotChannel { record, is_backup: true });
        match position(&state.backups, &chan.record.channel_id) {
            Some(i) => state.backups[i] = Arc::clone(&chan),
            None => state.backups.push(Arc::clone(&chan)),
        }
        debug!("upsert backup {}", chan.record.channel_id);
        as_dyn(chan)
    }

    /// Forget a channel or backup
    pub fn remove_channel(&self, cid: &ChannelId) -> Result<(), Status> {
        let mut state = self.state.lock().unwrap();
        if let Some(i) = position(&state.channels, cid) {
            state.channels.remove(i);
        } else if let Some(i) = position(&state.backups, cid) {
            state.backups.remove(i);
        } else {
            return Err(not_found(format!("channel {}", cid)));
        }
        debug!("removed channel {}", cid);
        Ok(())
    }

    /// Move a channel or backup to a new state, returning the new channel object
    pub fn set_state(
        &self,
        cid: &ChannelId,
        new_state: ChannelState,
    ) -> Result<Arc<dyn LnChannel>, Status> {
        let found = self.find(cid).ok_or_else(|| not_found(format!("channel {}", cid)))?;
        let mut record = found.record.clone();
        record.state = new_state;
        // a custom label would now be stale
        record.state_label = None;
        Ok(if found.is_backup { self.upsert_backup(record) } else { self.upsert_channel(record) })
    }

    /// Look up a channel or backup
    pub fn find(&self, cid: &ChannelId) -> Option<Arc<SnapshotChannel>> {
        let state = self.state.lock().unwrap();
        state
            .channels
            .iter()
            .chain(state.backups.iter())
            .find(|c| &c.record.channel_id == cid)
            .cloned()
    }

    /// Set a node alias
    pub fn set_alias(&self, node_id: &NodeId, alias: &str) {
        self.state.lock().unwrap().aliases.insert(node_id.to_string(), alias.to_string());
    }
}

impl LnWorker for SnapshotWorker {
    fn channels(&self) -> Vec<Arc<dyn LnChannel>> {
        self.state.lock().unwrap().channels.iter().cloned().map(as_dyn).collect()
    }

    fn channel_backups(&self) -> Vec<Arc<dyn LnChannel>> {
        self.state.lock().unwrap().backups.iter().cloned().map(as_dyn).collect()
    }

    fn node_alias(&self, node_id: &NodeId) -> Option<String> {
        self.state.lock().unwrap().aliases.get(&node_id.to_string()).cloned()
    }

    fn is_trampoline_peer(&self, node_id: &NodeId) -> bool {
        self.state.lock().unwrap().trampoline_peers.contains(node_id)
    }
}

/// A wallet backed by a [WalletSnapshot]
pub struct SnapshotWallet {
    id: WalletId,
    lnworker: Option<Arc<SnapshotWorker>>,
}

impl SnapshotWallet {
    /// Create from a snapshot
    pub fn new(snapshot: WalletSnapshot) -> Self {
        SnapshotWallet {
            id: WalletId::new(snapshot.wallet_id),
            lnworker: snapshot.lightning.map(|ln| Arc::new(SnapshotWorker::new(ln))),
        }
    }

    /// Parse a JSON [WalletSnapshot]
    pub fn from_json(json: &str) -> Result<Self, Status> {
        let snapshot: WalletSnapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot))
    }

    /// Read a JSON [WalletSnapshot] from a file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Status> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| internal_error(format!("read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// The concrete Lightning engine, for driving changes
    pub fn snapshot_worker(&self) -> Option<Arc<SnapshotWorker>> {
        self.lnworker.clone()
    }

    /// Current state, as a snapshot
    pub fn to_snapshot(&self) -> WalletSnapshot {
        WalletSnapshot {
            wallet_id: self.id.as_str().to_string(),
            lightning: self.lnworker.as_ref().map(|w| w.to_snapshot()),
        }
    }
}

impl Wallet for SnapshotWallet {
    fn id(&self) -> WalletId {
        self.id.clone()
    }

    fn lnworker(&self) -> Option<Arc<dyn LnWorker>> {
        self.lnworker.clone().map(|w| w as Arc<dyn LnWorker>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_utils::*;
    use test_log::test;

    const WALLET_JSON: &str = r#"{
        "wallet_id": "default_wallet",
        "lightning": {
            "channels": [
                {
                    "channel_id": "0101",
                    "node_id": "02aa",
                    "short_id": "812345x1022x1",
                    "state": "OPEN",
                    "capacity_sat": 200000,
                    "local_balance_msat": 150000000,
                    "remote_balance_msat": 50000000,
                    "local_spendable_msat": 148000000,
                    "funding_outpoint": "ab00:0"
                }
            ],
            "backups": [
                { "channel_id": "0202", "node_id": "02bb", "state": "CLOSED", "capacity_sat": 5000,
                  "is_imported": true }
            ],
            "aliases": { "02aa": "ACINQ" },
            "trampoline_peers": ["02aa"]
        }
    }"#;

    #[test]
    fn parse_wallet_test() {
        let wallet = SnapshotWallet::from_json(WALLET_JSON).unwrap();
        assert_eq!(wallet.id(), WalletId::new("default_wallet"));
        let worker = wallet.lnworker().unwrap();
        assert_eq!(worker.channels().len(), 1);
        assert_eq!(worker.channel_backups().len(), 1);
        assert_eq!(worker.channel_objects().len(), 2);

        let chan = &worker.channels()[0];
        assert_eq!(chan.channel_id().to_string(), "0101");
        assert_eq!(chan.short_id_for_gui(), "812345x1022x1");
        assert_eq!(chan.available_to_spend(Side::Local), 148_000_000);
        // defaults to the balance when not given
        assert_eq!(chan.available_to_spend(Side::Remote), 50_000_000);
        assert_eq!(chan.csv_delay(Side::Local), 144);
        assert_eq!(chan.channel_type(), "STATIC_REMOTEKEY");
        assert!(!chan.is_backup());

        let node: NodeId = "02aa".parse().unwrap();
        assert_eq!(worker.node_alias(&node).as_deref(), Some("ACINQ"));
        assert!(worker.is_trampoline_peer(&node));
        assert!(!worker.is_trampoline_peer(&"02bb".parse().unwrap()));

        let backup = &worker.channel_backups()[0];
        assert!(backup.is_backup());
        assert!(backup.is_imported());
    }

    #[test]
    fn wallet_without_lightning_test() {
        let wallet = SnapshotWallet::from_json(r#"{"wallet_id": "watch_only"}"#).unwrap();
        assert!(wallet.lnworker().is_none());
    }

    #[test]
    fn bad_json_test() {
        let err = SnapshotWallet::from_json(r#"{"lightning": 1}"#).err().unwrap();
        assert_eq!(err.code(), crate::util::status::Code::InvalidArgument);
    }

    #[test]
    fn mutators_replace_objects_test() {
        let wallet = make_wallet("w", vec![make_record(1, ChannelState::Opening)], vec![]);
        let worker = wallet.snapshot_worker().unwrap();
        let before = worker.channels()[0].clone();

        let after = worker.set_state(&channel_id(1), ChannelState::Open).unwrap();
        assert_eq!(before.state(), ChannelState::Opening);
        assert_eq!(after.state(), ChannelState::Open);
        assert_eq!(worker.channels().len(), 1);
        assert_eq!(worker.channels()[0].state(), ChannelState::Open);

        worker.upsert_channel(make_record(2, ChannelState::Funded));
        assert_eq!(worker.channels().len(), 2);
        assert!(worker.get_channel(&channel_id(2)).is_some());

        worker.remove_channel(&channel_id(1)).unwrap();
        assert_eq!(worker.channels().len(), 1);
        let err = worker.remove_channel(&channel_id(1)).unwrap_err();
        assert_eq!(err.code(), crate::util::status::Code::NotFound);
        assert!(worker.set_state(&channel_id(9), ChannelState::Open).is_err());
    }

    #[test]
    fn snapshot_roundtrip_test() {
        let wallet = SnapshotWallet::from_json(WALLET_JSON).unwrap();
        let json = serde_json::to_string(&wallet.to_snapshot()).unwrap();
        let again = SnapshotWallet::from_json(&json).unwrap();
        assert_eq!(again.to_snapshot(), wallet.to_snapshot());
    }
}
