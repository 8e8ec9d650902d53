use crate::channel::{ChannelId, ChannelState, NodeId};
use crate::model::{ListObserver, ModelChange};
use crate::prelude::*;
use crate::snapshot::{ChannelRecord, LightningSnapshot, SnapshotWallet, WalletSnapshot};

/// A deterministic channel id
pub fn channel_id(seed: u8) -> ChannelId {
    ChannelId::new(&[seed; 32])
}

/// A deterministic node id
pub fn node_id(seed: u8) -> NodeId {
    let mut bytes = [seed; 33];
    bytes[0] = 0x02;
    NodeId::new(&bytes)
}

/// A 1_000_000 sat channel with a 60/40 balance split
pub fn make_record(seed: u8, state: ChannelState) -> ChannelRecord {
    let mut record = ChannelRecord::new(channel_id(seed), node_id(seed), state, 1_000_000);
    record.local_balance_msat = 600_000_000;
    record.remote_balance_msat = 400_000_000;
    record.short_id = Some(format!("800000x{}x0", seed));
    record
}

/// A Lightning-enabled wallet
pub fn make_wallet(
    name: &str,
    channels: Vec<ChannelRecord>,
    backups: Vec<ChannelRecord>,
) -> Arc<SnapshotWallet> {
    let lightning = LightningSnapshot { channels, backups, ..Default::default() };
    Arc::new(SnapshotWallet::new(WalletSnapshot {
        wallet_id: name.to_string(),
        lightning: Some(lightning),
    }))
}

/// A wallet without a Lightning engine
pub fn make_wallet_without_lightning(name: &str) -> Arc<SnapshotWallet> {
    Arc::new(SnapshotWallet::new(WalletSnapshot { wallet_id: name.to_string(), lightning: None }))
}

/// Records every change it is told about
pub struct RecordingObserver {
    changes: Mutex<Vec<ModelChange>>,
}

impl RecordingObserver {
    /// Create, ready to register
    pub fn new() -> Arc<RecordingObserver> {
        Arc::new(RecordingObserver { changes: Mutex::new(Vec::new()) })
    }

    /// Changes seen since the last call
    pub fn take(&self) -> Vec<ModelChange> {
        core::mem::take(&mut *self.changes.lock().unwrap())
    }
}

impl ListObserver for RecordingObserver {
    fn on_change(&self, change: &ModelChange) {
        self.changes.lock().unwrap().push(change.clone());
    }
}
