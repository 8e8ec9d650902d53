use log::*;

use crate::model::{ListObserver, ModelChange, ModelInner};
use crate::prelude::*;
use crate::row::{ChannelRow, Role, RoleValue};

/// A live, read-only projection of a
/// [ChannelListModel](crate::model::ChannelListModel).
///
/// Only rows whose `role` equals `value` are visible.  Every accessor reads
/// the source list at call time, so the view follows updates, insertions
/// and removals without being told.  If the source model is dropped the
/// view is empty.
///
/// Observers registered with [FilterView::add_observer] hear about changes
/// in view row numbers.
#[derive(Clone)]
pub struct FilterView {
    source: Weak<ModelInner>,
    role: Role,
    value: RoleValue,
}

impl FilterView {
    pub(crate) fn new(source: Weak<ModelInner>, role: Role, value: RoleValue) -> Self {
        debug!("filter view on {} == {}", role, value);
        FilterView { source, role, value }
    }

    /// The role filtered on
    pub fn role(&self) -> Role {
        self.role
    }

    /// The value rows must have
    pub fn value(&self) -> &RoleValue {
        &self.value
    }

    fn accepts(&self, row: &ChannelRow) -> bool {
        row.get(self.role) == self.value
    }

    fn with_rows<R>(&self, f: impl FnOnce(&[ChannelRow]) -> R) -> Option<R> {
        let source = self.source.upgrade()?;
        let rows = source.rows();
        Some(f(&rows))
    }

    /// Indexes of the visible rows in the source list
    pub fn source_rows(&self) -> Vec<usize> {
        self.with_rows(|rows| {
            rows.iter().enumerate().filter(|(_, r)| self.accepts(r)).map(|(i, _)| i).collect()
        })
        .unwrap_or_default()
    }

    /// The source list index of a visible row
    pub fn source_row(&self, row: usize) -> Option<usize> {
        self.source_rows().get(row).copied()
    }

    /// Number of visible rows
    pub fn row_count(&self) -> usize {
        self.with_rows(|rows| rows.iter().filter(|r| self.accepts(r)).count()).unwrap_or(0)
    }

    /// A copy of the visible rows
    pub fn rows(&self) -> Vec<ChannelRow> {
        self.with_rows(|rows| rows.iter().filter(|r| self.accepts(r)).cloned().collect())
            .unwrap_or_default()
    }

    /// Register an observer for changes to the visible rows.
    ///
    /// Source changes are renumbered to view rows and changes to hidden rows
    /// are dropped.  A row whose update moves it into or out of the view is
    /// reported as an insert or a removal.
    pub fn add_observer(&self, observer: Arc<dyn ListObserver>) {
        let source = match self.source.upgrade() {
            Some(source) => source,
            None => {
                warn!("source model dropped, not observing {} == {}", self.role, self.value);
                return;
            }
        };
        let visible = source.rows().iter().map(|r| self.accepts(r)).collect();
        source.add_observer(Arc::new(ViewRelay {
            view: self.clone(),
            observer,
            visible: Mutex::new(visible),
        }));
    }

    /// One field of one visible row
    pub fn data(&self, row: usize, role_key: i32) -> Option<RoleValue> {
        let role = Role::from_key(role_key)?;
        self.with_rows(|rows| rows.iter().filter(|r| self.accepts(r)).nth(row).map(|r| r.get(role)))
            .flatten()
    }
}

// number of visible rows before `source_row`
fn view_index(visible: &[bool], source_row: usize) -> usize {
    visible[..source_row].iter().filter(|v| **v).count()
}

/// Relays source model changes to a view observer
struct ViewRelay {
    view: FilterView,
    observer: Arc<dyn ListObserver>,
    // membership of each source row, as of the last change seen
    visible: Mutex<Vec<bool>>,
}

impl ViewRelay {
    fn translate(&self, change: &ModelChange) -> Vec<ModelChange> {
        let source = match self.view.source.upgrade() {
            Some(source) => source,
            None => return Vec::new(),
        };
        let rows = source.rows();
        let mut visible = self.visible.lock().unwrap();
        let mut out = Vec::new();
        let mut count_changed = false;
        match change {
            ModelChange::Reset => {
                *visible = rows.iter().map(|r| self.view.accepts(r)).collect();
                out.push(ModelChange::Reset);
                count_changed = true;
            }
            ModelChange::RowsInserted { first, last } => {
                for i in *first..=*last {
                    let accepted = rows.get(i).map_or(false, |r| self.view.accepts(r));
                    let at = i.min(visible.len());
                    visible.insert(at, accepted);
                    if accepted {
                        let v = view_index(&visible, at);
                        out.push(ModelChange::RowsInserted { first: v, last: v });
                        count_changed = true;
                    }
                }
            }
            ModelChange::RowsRemoved { first, last } => {
                for i in (*first..=*last).rev() {
                    if i >= visible.len() {
                        continue;
                    }
                    let v = view_index(&visible, i);
                    if visible.remove(i) {
                        out.push(ModelChange::RowsRemoved { first: v, last: v });
                        count_changed = true;
                    }
                }
            }
            ModelChange::DataChanged { first, last, roles } => {
                for i in *first..=*last {
                    let (row, was) = match (rows.get(i), visible.get(i).copied()) {
                        (Some(row), Some(was)) => (row, was),
                        _ => continue,
                    };
                    let now = self.view.accepts(row);
                    let v = view_index(&visible, i);
                    visible[i] = now;
                    match (was, now) {
                        (true, true) => out.push(ModelChange::DataChanged {
                            first: v,
                            last: v,
                            roles: roles.clone(),
                        }),
                        (false, true) => {
                            out.push(ModelChange::RowsInserted { first: v, last: v });
                            count_changed = true;
                        }
                        (true, false) => {
                            out.push(ModelChange::RowsRemoved { first: v, last: v });
                            count_changed = true;
                        }
                        (false, false) => {}
                    }
                }
            }
            // counts are the source's, the view reports its own
            ModelChange::CountChanged | ModelChange::NumOpenChannelsChanged => {}
        }
        if count_changed {
            out.push(ModelChange::CountChanged);
        }
        out
    }
}

impl ListObserver for ViewRelay {
    fn on_change(&self, change: &ModelChange) {
        for translated in self.translate(change) {
            self.observer.on_change(&translated);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::channel::ChannelState;
    use crate::event::EventBus;
    use crate::model::{ChannelListModel, ModelChange};
    use crate::row::{Role, RoleValue};
    use crate::util::test_utils::*;
    use test_log::test;

    #[test]
    fn backups_view_test() {
        let wallet = make_wallet(
            "w",
            vec![make_record(1, ChannelState::Open), make_record(2, ChannelState::Closed)],
            vec![make_record(3, ChannelState::Open), make_record(4, ChannelState::Redeemed)],
        );
        let model = ChannelListModel::new(wallet, &EventBus::new());
        let backups = model.filter_model_backups();
        let live = model.filter_model_no_backups();

        assert_eq!(backups.row_count(), 2);
        assert!(backups.rows().iter().all(|r| r.is_backup));
        assert_eq!(live.row_count(), 2);
        assert!(live.rows().iter().all(|r| !r.is_backup));

        // sorted source: 1 (open), 3 (open backup), 2 (closed), 4 (redeemed backup)
        assert_eq!(backups.source_rows(), vec![1, 3]);
        assert_eq!(backups.source_row(1), Some(3));
        assert_eq!(backups.source_row(2), None);
        assert_eq!(
            backups.data(0, Role::Cid.key()),
            Some(RoleValue::Str(channel_id(3).to_string()))
        );
        assert_eq!(backups.data(5, Role::Cid.key()), None);
        assert_eq!(backups.data(0, 0), None);
    }

    #[test]
    fn view_follows_updates_test() {
        let wallet = make_wallet(
            "w",
            vec![make_record(1, ChannelState::Open)],
            vec![make_record(2, ChannelState::Closed)],
        );
        let model = ChannelListModel::new(wallet.clone(), &EventBus::new());
        let backups = model.filter_model_backups();
        assert_eq!(backups.row_count(), 1);

        let worker = wallet.snapshot_worker().unwrap();
        let chan = worker.set_state(&channel_id(2), ChannelState::Redeemed).unwrap();
        model.on_channel_updated(chan.as_ref());
        assert_eq!(backups.rows()[0].state_code, ChannelState::Redeemed.code());

        worker.upsert_backup(make_record(3, ChannelState::Closed));
        model.init_model();
        assert_eq!(backups.row_count(), 2);

        model.remove_channel(&channel_id(2));
        assert_eq!(backups.row_count(), 1);
        assert_eq!(backups.rows()[0].cid, channel_id(3).to_string());
        assert!(backups.rows().iter().all(|r| r.is_backup));
    }

    #[test]
    fn view_by_state_code_test() {
        let wallet = make_wallet(
            "w",
            vec![make_record(1, ChannelState::Open), make_record(2, ChannelState::Funded)],
            vec![],
        );
        let model = ChannelListModel::new(wallet, &EventBus::new());
        let open = model
            .filter_model("state_code", RoleValue::Int(ChannelState::Open.code() as i64))
            .unwrap();
        assert_eq!(open.row_count(), model.num_open_channels());
        assert_eq!(open.role(), Role::StateCode);
    }

    #[test]
    fn view_observer_insert_remove_test() {
        let wallet = make_wallet(
            "w",
            vec![make_record(1, ChannelState::Open), make_record(3, ChannelState::Closed)],
            vec![make_record(2, ChannelState::Open)],
        );
        let model = ChannelListModel::new(wallet.clone(), &EventBus::new());
        // source: 1 (open), 2 (open backup), 3 (closed); view: 1, 3
        let live = model.filter_model_no_backups();
        let observer = RecordingObserver::new();
        live.add_observer(observer.clone());

        model.remove_channel(&channel_id(3));
        assert_eq!(
            observer.take(),
            vec![ModelChange::RowsRemoved { first: 1, last: 1 }, ModelChange::CountChanged]
        );

        // hidden rows are not reported
        model.remove_channel(&channel_id(2));
        assert!(observer.take().is_empty());

        wallet.snapshot_worker().unwrap().upsert_channel(make_record(4, ChannelState::Opening));
        model.new_channel(&channel_id(4));
        assert_eq!(
            observer.take(),
            vec![ModelChange::RowsInserted { first: 0, last: 0 }, ModelChange::CountChanged]
        );
        assert_eq!(live.rows()[0].cid, channel_id(4).to_string());
    }

    #[test]
    fn view_observer_data_changed_test() {
        let wallet = make_wallet(
            "w",
            vec![make_record(1, ChannelState::Open), make_record(2, ChannelState::Funded)],
            vec![make_record(3, ChannelState::Closed)],
        );
        let worker = wallet.snapshot_worker().unwrap();
        let model = ChannelListModel::new(wallet.clone(), &EventBus::new());
        // source: 2 (funded), 1 (open), 3 (closed backup)
        let open = model
            .filter_model("state_code", RoleValue::Int(ChannelState::Open.code() as i64))
            .unwrap();
        let observer = RecordingObserver::new();
        open.add_observer(observer.clone());

        // still open: a plain data change at its view row
        let chan = worker.find(&channel_id(1)).unwrap();
        model.on_channel_updated(chan.as_ref());
        assert_eq!(
            observer.take(),
            vec![ModelChange::DataChanged { first: 0, last: 0, roles: Role::ALL.to_vec() }]
        );

        // hidden before and after
        let chan = worker.set_state(&channel_id(3), ChannelState::Redeemed).unwrap();
        model.on_channel_updated(chan.as_ref());
        assert!(observer.take().is_empty());

        // moves into the view
        let chan = worker.set_state(&channel_id(2), ChannelState::Open).unwrap();
        model.on_channel_updated(chan.as_ref());
        assert_eq!(
            observer.take(),
            vec![ModelChange::RowsInserted { first: 0, last: 0 }, ModelChange::CountChanged]
        );
        assert_eq!(open.row_count(), 2);

        // moves out of the view
        let chan = worker.set_state(&channel_id(1), ChannelState::Shutdown).unwrap();
        model.on_channel_updated(chan.as_ref());
        assert_eq!(
            observer.take(),
            vec![ModelChange::RowsRemoved { first: 1, last: 1 }, ModelChange::CountChanged]
        );
        assert_eq!(open.row_count(), 1);
        assert_eq!(open.rows()[0].cid, channel_id(2).to_string());
    }

    #[test]
    fn view_observer_reset_test() {
        let wallet = make_wallet(
            "w",
            vec![make_record(1, ChannelState::Open)],
            vec![make_record(2, ChannelState::Closed)],
        );
        let model = ChannelListModel::new(wallet.clone(), &EventBus::new());
        let backups = model.filter_model_backups();
        let observer = RecordingObserver::new();
        backups.add_observer(observer.clone());

        wallet.snapshot_worker().unwrap().upsert_backup(make_record(3, ChannelState::Open));
        model.init_model();
        assert_eq!(observer.take(), vec![ModelChange::Reset, ModelChange::CountChanged]);

        // membership is recomputed on reset
        model.remove_channel(&channel_id(3));
        assert_eq!(
            observer.take(),
            vec![ModelChange::RowsRemoved { first: 0, last: 0 }, ModelChange::CountChanged]
        );

        model.clear();
        assert_eq!(observer.take(), vec![ModelChange::Reset, ModelChange::CountChanged]);
        assert_eq!(backups.row_count(), 0);
    }

    #[test]
    fn view_outliving_model_is_empty_test() {
        let wallet = make_wallet("w", vec![], vec![make_record(1, ChannelState::Closed)]);
        let model = ChannelListModel::new(wallet, &EventBus::new());
        let backups = model.filter_model_backups();
        assert_eq!(backups.row_count(), 1);
        drop(model);
        assert_eq!(backups.row_count(), 0);
        assert!(backups.rows().is_empty());
        assert_eq!(backups.data(0, Role::Cid.key()), None);
        backups.add_observer(RecordingObserver::new());
    }
}
