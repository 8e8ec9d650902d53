//! Replaying scripted wallet events against a channel list model

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::*;
use serde_derive::Deserialize;

use chanview::channel::{ChannelId, ChannelState};
use chanview::event::{EventBus, WalletEvent};
use chanview::snapshot::{ChannelRecord, SnapshotWallet};
use chanview::{ChannelListModel, ListObserver, ModelChange};

/// One line of an events file
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ReplayEvent {
    /// A channel or backup changed state
    Update { cid: ChannelId, state: ChannelState },
    /// A new channel appeared
    Open { channel: ChannelRecord },
    /// A channel or backup was forgotten
    Close { cid: ChannelId },
    /// The whole channel collection was replaced
    Reload,
    /// A backup was added or replaced
    Backup { channel: ChannelRecord },
}

/// Parse the lines of an events file
pub fn parse_events(lines: &[String]) -> Result<Vec<ReplayEvent>> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("event {}: {}", i + 1, line))
        })
        .collect()
}

/// Apply one event to the wallet, then let the model know the way the
/// wallet would.
pub fn apply(
    wallet: &SnapshotWallet,
    bus: &EventBus,
    model: &ChannelListModel,
    event: &ReplayEvent,
) -> Result<()> {
    let worker = wallet.snapshot_worker().context("wallet has no lightning")?;
    debug!("replay {:?}", event);
    match event {
        ReplayEvent::Update { cid, state } => {
            let channel = worker.set_state(cid, *state)?;
            bus.publish(WalletEvent::ChannelUpdated { wallet: model.wallet_id().clone(), channel });
        }
        ReplayEvent::Open { channel } => {
            worker.upsert_channel(channel.clone());
            model.new_channel(&channel.channel_id);
        }
        ReplayEvent::Close { cid } => {
            if let Err(e) = worker.remove_channel(cid) {
                warn!("close {}: {}", cid, e);
            }
            model.remove_channel(cid);
        }
        ReplayEvent::Reload => {
            bus.publish(WalletEvent::ChannelsUpdated { wallet: model.wallet_id().clone() });
        }
        ReplayEvent::Backup { channel } => {
            worker.upsert_backup(channel.clone());
            bus.publish(WalletEvent::ChannelsUpdated { wallet: model.wallet_id().clone() });
        }
    }
    Ok(())
}

/// Describe a change in one line
pub fn describe(change: &ModelChange) -> String {
    match change {
        ModelChange::Reset => "reset".to_string(),
        ModelChange::RowsInserted { first, last } => format!("rows inserted {}..={}", first, last),
        ModelChange::RowsRemoved { first, last } => format!("rows removed {}..={}", first, last),
        ModelChange::DataChanged { first, last, roles } => {
            format!("data changed {}..={} ({} roles)", first, last, roles.len())
        }
        ModelChange::CountChanged => "count changed".to_string(),
        ModelChange::NumOpenChannelsChanged => "open channel count changed".to_string(),
    }
}

/// Collects a description of every change
#[derive(Default)]
pub struct ChangeLog {
    lines: Mutex<Vec<String>>,
}

impl ChangeLog {
    pub fn new() -> Arc<ChangeLog> {
        Arc::new(ChangeLog::default())
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap())
    }
}

impl ListObserver for ChangeLog {
    fn on_change(&self, change: &ModelChange) {
        self.lines.lock().unwrap().push(describe(change));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanview::util::test_utils::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn parse_events_test() {
        let cid = channel_id(1).to_string();
        let events = parse_events(&lines(&format!(
            "{{\"event\": \"update\", \"cid\": \"{cid}\", \"state\": \"CLOSING\"}}\n\
             {{\"event\": \"close\", \"cid\": \"{cid}\"}}\n\
             {{\"event\": \"reload\"}}"
        )))
        .unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            ReplayEvent::Update { cid: c, state: ChannelState::Closing } if *c == channel_id(1)
        ));
        assert!(matches!(events[2], ReplayEvent::Reload));
    }

    #[test]
    fn parse_bad_event_test() {
        let err = parse_events(&lines("{\"event\": \"reload\"}\n{\"event\": \"explode\"}"))
            .unwrap_err();
        assert!(err.to_string().starts_with("event 2:"));
    }

    #[test]
    fn apply_test() {
        let wallet = make_wallet("main", vec![make_record(1, ChannelState::Open)], vec![]);
        let bus = EventBus::new();
        let model = ChannelListModel::new(wallet.clone(), &bus);
        let log = ChangeLog::new();
        model.add_observer(log.clone());

        let open = ReplayEvent::Open { channel: make_record(2, ChannelState::Opening) };
        apply(&wallet, &bus, &model, &open).unwrap();
        assert_eq!(model.row_count(), 2);
        assert_eq!(
            log.take(),
            vec!["rows inserted 0..=0", "count changed", "open channel count changed"]
        );

        let update = ReplayEvent::Update { cid: channel_id(2), state: ChannelState::Open };
        apply(&wallet, &bus, &model, &update).unwrap();
        assert_eq!(model.num_open_channels(), 2);
        assert_eq!(log.take(), vec!["data changed 0..=0 (21 roles)", "open channel count changed"]);

        let close = ReplayEvent::Close { cid: channel_id(1) };
        apply(&wallet, &bus, &model, &close).unwrap();
        apply(&wallet, &bus, &model, &close).unwrap();
        assert_eq!(model.row_count(), 1);

        let backup = ReplayEvent::Backup { channel: make_record(3, ChannelState::Closed) };
        apply(&wallet, &bus, &model, &backup).unwrap();
        assert_eq!(model.filter_model_backups().row_count(), 1);

        let unknown = ReplayEvent::Update { cid: channel_id(9), state: ChannelState::Open };
        assert!(apply(&wallet, &bus, &model, &unknown).is_err());
    }
}
