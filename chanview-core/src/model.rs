//! The channel list model.
//!
//! Mirrors a sorted view of the wallet's channel collection as a list of
//! [ChannelRow]s and reports every change as a [ModelChange], in the
//! vocabulary of a UI list-model contract.

use log::*;

use crate::channel::ChannelId;
use crate::domain::{LnChannel, Wallet, WalletId};
use crate::event::{EventBus, Subscription, WalletEvent};
use crate::filter::FilterView;
use crate::prelude::*;
use crate::row::{ChannelRow, Role, RoleValue};
use crate::util::status::{invalid_argument, Status};

/// A change notification, delivered to [ListObserver]s after the change
/// has been applied
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelChange {
    /// The whole list was replaced
    Reset,
    /// Rows `first..=last` were inserted
    RowsInserted {
        /// First new row
        first: usize,
        /// Last new row
        last: usize,
    },
    /// Rows `first..=last` were removed
    RowsRemoved {
        /// First removed row
        first: usize,
        /// Last removed row
        last: usize,
    },
    /// Rows `first..=last` have new values for `roles`
    DataChanged {
        /// First changed row
        first: usize,
        /// Last changed row
        last: usize,
        /// The roles that may have changed
        roles: Vec<Role>,
    },
    /// The row count may have changed
    CountChanged,
    /// The open channel count may have changed
    NumOpenChannelsChanged,
}

/// Receives [ModelChange] notifications.
///
/// Called without any model lock held, so the observer may query the model.
pub trait ListObserver: SendSync {
    /// A change was applied
    fn on_change(&self, change: &ModelChange);
}

pub(crate) struct ModelInner {
    wallet: Arc<dyn Wallet>,
    wallet_id: WalletId,
    rows: Mutex<Vec<ChannelRow>>,
    observers: Mutex<Vec<Arc<dyn ListObserver>>>,
}

fn position(rows: &[ChannelRow], cid: &str) -> Option<usize> {
    rows.iter().position(|r| r.cid == cid)
}

impl ModelInner {
    pub(crate) fn rows(&self) -> MutexGuard<Vec<ChannelRow>> {
        self.rows.lock().unwrap()
    }

    pub(crate) fn add_observer(&self, observer: Arc<dyn ListObserver>) {
        self.observers.lock().unwrap().push(observer);
    }

    fn notify(&self, changes: &[ModelChange]) {
        // snapshot, so observers can call back into the model
        let observers: Vec<Arc<dyn ListObserver>> = self.observers.lock().unwrap().clone();
        for change in changes {
            #[cfg(feature = "debug")]
            debug!("{}: {:?}", self.wallet_id, change);
            for observer in observers.iter() {
                observer.on_change(change);
            }
        }
    }

    fn on_event(&self, event: &WalletEvent) {
        if event.wallet() != &self.wallet_id {
            return;
        }
        match event {
            WalletEvent::ChannelUpdated { channel, .. } => {
                self.on_channel_updated(channel.as_ref())
            }
            WalletEvent::ChannelsUpdated { .. } => self.init_model(),
        }
    }

    fn init_model(&self) {
        debug!("init_model");
        let lnworker = match self.wallet.lnworker() {
            Some(lnworker) => lnworker,
            None => {
                warn!("lnworker should be defined");
                return;
            }
        };

        let mut rows: Vec<ChannelRow> = Vec::new();
        for chan in lnworker.channel_objects() {
            let row = ChannelRow::from_channel(lnworker.as_ref(), chan.as_ref());
            if position(&rows, &row.cid).is_some() {
                warn!("skipping duplicate channel {}", row.cid);
                continue;
            }
            rows.push(row);
        }
        // stable, so equal keys keep the engine's order
        rows.sort_by_key(|r| r.sort_key());

        *self.rows() = rows;
        self.notify(&[
            ModelChange::Reset,
            ModelChange::CountChanged,
            ModelChange::NumOpenChannelsChanged,
        ]);
    }

    fn clear(&self) {
        self.rows().clear();
        self.notify(&[
            ModelChange::Reset,
            ModelChange::CountChanged,
            ModelChange::NumOpenChannelsChanged,
        ]);
    }

    fn on_channel_updated(&self, channel: &dyn LnChannel) {
        let cid = channel.channel_id();
        let lnworker = match self.wallet.lnworker() {
            Some(lnworker) => lnworker,
            None => {
                warn!("lnworker should be defined");
                return;
            }
        };
        let row = ChannelRow::from_channel(lnworker.as_ref(), channel);
        let index = {
            let mut rows = self.rows();
            match position(&rows, &row.cid) {
                Some(index) => {
                    rows[index] = row;
                    index
                }
                None => {
                    debug!("channel {} not in list, ignoring update", cid.short());
                    return;
                }
            }
        };
        debug!("updating our channel {}", channel.short_id_for_gui());
        self.notify(&[
            ModelChange::DataChanged { first: index, last: index, roles: Role::ALL.to_vec() },
            ModelChange::NumOpenChannelsChanged,
        ]);
    }

    fn new_channel(&self, cid: &ChannelId) {
        debug!("new channel with cid {}", cid.short());
        let lnworker = match self.wallet.lnworker() {
            Some(lnworker) => lnworker,
            None => {
                warn!("lnworker should be defined");
                return;
            }
        };
        let channel = match lnworker.get_channel(cid) {
            Some(channel) => channel,
            None => {
                debug!("channel {} unknown to lnworker", cid.short());
                return;
            }
        };
        let row = ChannelRow::from_channel(lnworker.as_ref(), channel.as_ref());
        let inserted = {
            let mut rows = self.rows();
            if rows.iter().any(|r| r.has_id(cid)) {
                false
            } else {
                rows.insert(0, row);
                true
            }
        };
        if !inserted {
            // keep ids unique, treat as a refresh
            debug!("channel {} already listed", cid.short());
            self.on_channel_updated(channel.as_ref());
            return;
        }
        self.notify(&[
            ModelChange::RowsInserted { first: 0, last: 0 },
            ModelChange::CountChanged,
            ModelChange::NumOpenChannelsChanged,
        ]);
    }

    fn remove_channel(&self, cid: &ChannelId) {
        debug!("remove channel with cid {}", cid.short());
        let index = {
            let mut rows = self.rows();
            match rows.iter().position(|r| r.has_id(cid)) {
                Some(index) => {
                    rows.remove(index);
                    index
                }
                None => {
                    debug!("channel {} not in list", cid.short());
                    return;
                }
            }
        };
        self.notify(&[
            ModelChange::RowsRemoved { first: index, last: index },
            ModelChange::CountChanged,
            ModelChange::NumOpenChannelsChanged,
        ]);
    }
}

/// List model over a wallet's Lightning channels and backups.
///
/// Created with the wallet and the event bus it publishes on.  The model
/// subscribes to the bus for its lifetime, reloading on
/// [WalletEvent::ChannelsUpdated] and refreshing one row on
/// [WalletEvent::ChannelUpdated].  Events for other wallets are ignored.
///
/// All operations are infallible from the UI's point of view: an unknown
/// channel id or a wallet without Lightning is logged and ignored.
pub struct ChannelListModel {
    inner: Arc<ModelInner>,
    _subscription: Subscription,
}

impl ChannelListModel {
    /// Create the model, load the wallet's channels and subscribe to `bus`
    pub fn new(wallet: Arc<dyn Wallet>, bus: &EventBus) -> Self {
        let inner = Arc::new(ModelInner {
            wallet_id: wallet.id(),
            wallet,
            rows: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
        });
        inner.init_model();
        let weak = Arc::downgrade(&inner);
        let subscription = bus.subscribe(Arc::new(move |event: &WalletEvent| {
            if let Some(inner) = weak.upgrade() {
                inner.on_event(event);
            }
        }));
        ChannelListModel { inner, _subscription: subscription }
    }

    /// The wallet being shown
    pub fn wallet_id(&self) -> &WalletId {
        &self.inner.wallet_id
    }

    /// Register an observer for change notifications
    pub fn add_observer(&self, observer: Arc<dyn ListObserver>) {
        self.inner.add_observer(observer)
    }

    /// Reload all rows from the wallet
    pub fn init_model(&self) {
        self.inner.init_model()
    }

    /// Drop all rows
    pub fn clear(&self) {
        self.inner.clear()
    }

    /// Recompute the row of `channel`, if listed
    pub fn on_channel_updated(&self, channel: &dyn LnChannel) {
        self.inner.on_channel_updated(channel)
    }

    /// Insert a channel the wallet just opened at the top of the list
    pub fn new_channel(&self, cid: &ChannelId) {
        self.inner.new_channel(cid)
    }

    /// Remove a channel's row
    pub fn remove_channel(&self, cid: &ChannelId) {
        self.inner.remove_channel(cid)
    }

    /// The row index of a channel
    pub fn index_of(&self, cid: &ChannelId) -> Option<usize> {
        self.inner.rows().iter().position(|r| r.has_id(cid))
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.inner.rows().len()
    }

    /// Number of rows, as a property
    pub fn count(&self) -> usize {
        self.row_count()
    }

    /// Number of channels in the open state
    pub fn num_open_channels(&self) -> usize {
        self.inner.rows().iter().filter(|r| r.is_open()).count()
    }

    /// Role keys and the names the UI binds to
    pub fn role_names(&self) -> Vec<(i32, &'static str)> {
        Role::ALL.iter().map(|r| (r.key(), r.name())).collect()
    }

    /// One field of one row, `None` if either is out of range
    pub fn data(&self, row: usize, role_key: i32) -> Option<RoleValue> {
        let role = Role::from_key(role_key)?;
        self.inner.rows().get(row).map(|r| r.get(role))
    }

    /// A copy of one row
    pub fn row(&self, row: usize) -> Option<ChannelRow> {
        self.inner.rows().get(row).cloned()
    }

    /// A copy of all rows
    pub fn rows(&self) -> Vec<ChannelRow> {
        self.inner.rows().clone()
    }

    /// A live view of the rows whose `role` equals `value`
    pub fn filter_model(&self, role: &str, value: RoleValue) -> Result<FilterView, Status> {
        let role =
            Role::from_name(role).ok_or_else(|| invalid_argument(format!("unknown role {}", role)))?;
        Ok(FilterView::new(Arc::downgrade(&self.inner), role, value))
    }

    /// A live view of the channel backups
    pub fn filter_model_backups(&self) -> FilterView {
        FilterView::new(Arc::downgrade(&self.inner), Role::IsBackup, RoleValue::Bool(true))
    }

    /// A live view of the channels that are not backups
    pub fn filter_model_no_backups(&self) -> FilterView {
        FilterView::new(Arc::downgrade(&self.inner), Role::IsBackup, RoleValue::Bool(false))
    }
}
