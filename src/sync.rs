//! Optimistic cell updates.
//!
//! Every edit runs in two phases. [`MonthState::apply`] changes the local
//! record set at once and describes the remote call to make as an
//! [`Effect`]. [`SyncController`] then performs that call against a
//! [`RecordStore`]; if it fails, the local state is thrown away and the month
//! is reloaded from the store. Failed writes are not retried.

use crate::cell::{CellKind, ManualEntry};
use crate::edit::{HabitDraft, confirm_delete};
use crate::errors::{StoreError, ValidationError};
use crate::models::{DayRecord, Habit, HabitId, HabitUpdate, RecordKey, UserId};
use crate::stats::{MonthlyStats, days_in_month, monthly_stats};
use crate::value::sanitize;
use std::future::Future;
use thiserror::Error;
use tracing::{info, warn};

/// The remote side of habit tracking.
pub trait RecordStore {
    fn list_habits(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Habit>, StoreError>> + Send;

    fn list_records(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> impl Future<Output = Result<Vec<DayRecord>, StoreError>> + Send;

    fn upsert_record(
        &self,
        key: RecordKey,
        value: f64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_record(
        &self,
        key: RecordKey,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn update_habit(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        update: &HabitUpdate,
    ) -> impl Future<Output = Result<Habit, StoreError>> + Send;

    fn delete_habit(
        &self,
        user_id: UserId,
        habit_id: HabitId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedHabit {
    pub habit: Habit,
    pub kind: CellKind,
}

impl From<Habit> for TrackedHabit {
    fn from(habit: Habit) -> Self {
        Self {
            kind: habit.kind(),
            habit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellEvent {
    Tap { habit_id: HabitId, day: u32 },
    Set { habit_id: HabitId, day: u32, value: f64 },
}

/// The remote call a local transition requires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    Upsert { key: RecordKey, value: f64 },
    Delete { key: RecordKey },
}

/// Client-side copy of one month of a user's grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthState {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
    habits: Vec<TrackedHabit>,
    records: Vec<DayRecord>,
}

impl MonthState {
    pub fn new(
        user_id: UserId,
        year: i32,
        month: u32,
        habits: Vec<Habit>,
        records: Vec<DayRecord>,
    ) -> Self {
        let mut state = Self {
            user_id,
            year,
            month,
            habits: habits.into_iter().map(TrackedHabit::from).collect(),
            records: Vec::new(),
        };
        state.replace_records(records);
        state
    }

    pub fn habits(&self) -> &[TrackedHabit] {
        &self.habits
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.records
    }

    pub fn tracked(&self, habit_id: HabitId) -> Option<&TrackedHabit> {
        self.habits.iter().find(|tracked| tracked.habit.id == habit_id)
    }

    pub fn value(&self, habit_id: HabitId, day: u32) -> f64 {
        self.records
            .iter()
            .find(|record| record.habit_id == habit_id && record.day == day)
            .map(|record| record.value.normalized())
            .unwrap_or(0.0)
    }

    pub fn stats(&self, habit_id: HabitId) -> MonthlyStats {
        monthly_stats(
            self.tracked(habit_id).map(|tracked| &tracked.habit),
            &self.records,
        )
    }

    pub fn key(&self, habit_id: HabitId, day: u32) -> RecordKey {
        RecordKey {
            user_id: self.user_id,
            habit_id,
            year: self.year,
            month: self.month,
            day,
        }
    }

    /// Replaces the record set, keeping only this month's rows of this user.
    pub fn replace_records(&mut self, records: Vec<DayRecord>) {
        let (user_id, year, month) = (self.user_id, self.year, self.month);
        self.records = records
            .into_iter()
            .filter(|record| {
                record.user_id == user_id && record.year == year && record.month == month
            })
            .collect();
    }

    pub fn replace_habits(&mut self, habits: Vec<Habit>) {
        self.habits = habits.into_iter().map(TrackedHabit::from).collect();
    }

    /// Edit dialog contents for a habit, pre-filled from its current values.
    pub fn edit_draft(&self, habit_id: HabitId) -> Option<HabitDraft> {
        self.tracked(habit_id)
            .map(|tracked| HabitDraft::from_habit(&tracked.habit))
    }

    pub fn manual_entry(&self, habit_id: HabitId, day: u32) -> Option<ManualEntry> {
        let tracked = self.tracked(habit_id)?;
        Some(ManualEntry::open(tracked.kind, self.value(habit_id, day)))
    }

    /// Local transition. Unknown habits and days outside the month change
    /// nothing.
    pub fn apply(&mut self, event: CellEvent) -> Effect {
        match event {
            CellEvent::Tap { habit_id, day } => {
                let Some(kind) = self.tracked(habit_id).map(|tracked| tracked.kind) else {
                    return Effect::None;
                };
                let next = kind.tap(self.value(habit_id, day));
                self.apply_cell_change(habit_id, day, next)
            }
            CellEvent::Set {
                habit_id,
                day,
                value,
            } => self.apply_cell_change(habit_id, day, value),
        }
    }

    pub fn apply_cell_change(&mut self, habit_id: HabitId, day: u32, value: f64) -> Effect {
        if self.tracked(habit_id).is_none() || !self.contains_day(day) {
            return Effect::None;
        }

        let key = self.key(habit_id, day);
        let value = sanitize(value);
        self.records.retain(|record| record.key() != key);
        if value > 0.0 {
            self.records.push(DayRecord::new(key, value));
            Effect::Upsert { key, value }
        } else {
            Effect::Delete { key }
        }
    }

    pub fn remove_habit(&mut self, habit_id: HabitId) {
        self.habits.retain(|tracked| tracked.habit.id != habit_id);
        self.records.retain(|record| record.habit_id != habit_id);
    }

    fn contains_day(&self, day: u32) -> bool {
        days_in_month(self.year, self.month).is_some_and(|days| (1..=days).contains(&day))
    }
}

/// Performs the remote call described by `effect`.
pub async fn perform<S: RecordStore>(store: &S, effect: Effect) -> Result<(), StoreError> {
    match effect {
        Effect::None => Ok(()),
        Effect::Upsert { key, value } => store.upsert_record(key, value).await,
        Effect::Delete { key } => store.delete_record(key).await,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Nothing to send.
    Unchanged,
    /// The store accepted the write.
    Confirmed,
    /// The write failed and local state now mirrors the store again.
    Reconciled(StoreError),
    /// The write failed and so did the reload; the optimistic state remains.
    ReloadFailed {
        write: StoreError,
        reload: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct SyncController<S> {
    store: S,
    state: MonthState,
}

impl<S: RecordStore> SyncController<S> {
    pub async fn load(
        store: S,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Self, StoreError> {
        let habits = store.list_habits(user_id).await?;
        let records = store.list_records(user_id, year, month).await?;
        Ok(Self {
            store,
            state: MonthState::new(user_id, year, month, habits, records),
        })
    }

    pub fn state(&self) -> &MonthState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn tap(&mut self, habit_id: HabitId, day: u32) -> SyncOutcome {
        self.dispatch(CellEvent::Tap { habit_id, day }).await
    }

    pub async fn apply_cell_change(
        &mut self,
        habit_id: HabitId,
        day: u32,
        value: f64,
    ) -> SyncOutcome {
        self.dispatch(CellEvent::Set {
            habit_id,
            day,
            value,
        })
        .await
    }

    pub async fn save_manual_entry(
        &mut self,
        habit_id: HabitId,
        day: u32,
        entry: &ManualEntry,
    ) -> SyncOutcome {
        self.apply_cell_change(habit_id, day, entry.save()).await
    }

    pub async fn dispatch(&mut self, event: CellEvent) -> SyncOutcome {
        let effect = self.state.apply(event);
        if effect == Effect::None {
            return SyncOutcome::Unchanged;
        }

        match perform(&self.store, effect).await {
            Ok(()) => SyncOutcome::Confirmed,
            Err(write) => {
                warn!(?effect, "cell write failed, reloading month: {write}");
                match self.reload_records().await {
                    Ok(()) => SyncOutcome::Reconciled(write),
                    Err(reload) => SyncOutcome::ReloadFailed { write, reload },
                }
            }
        }
    }

    pub async fn reload(&mut self) -> Result<(), StoreError> {
        let habits = self.store.list_habits(self.state.user_id).await?;
        self.state.replace_habits(habits);
        self.reload_records().await
    }

    async fn reload_records(&mut self) -> Result<(), StoreError> {
        let records = self
            .store
            .list_records(self.state.user_id, self.state.year, self.state.month)
            .await?;
        self.state.replace_records(records);
        Ok(())
    }

    /// Validates the draft locally before anything is sent.
    pub async fn save_habit(
        &mut self,
        habit_id: HabitId,
        draft: &HabitDraft,
    ) -> Result<Habit, SyncError> {
        let existing_plan = self
            .state
            .tracked(habit_id)
            .map(|tracked| tracked.habit.plan)
            .ok_or(StoreError::HabitNotFound(habit_id))?;
        let update = draft.validate(existing_plan)?;

        let habit = self
            .store
            .update_habit(self.state.user_id, habit_id, &update)
            .await?;
        if let Some(tracked) = self.state.habits.iter_mut().find(|t| t.habit.id == habit_id) {
            *tracked = TrackedHabit::from(habit.clone());
        }
        info!(habit_id, "habit saved");
        Ok(habit)
    }

    pub async fn delete_habit(
        &mut self,
        habit_id: HabitId,
        confirmed: bool,
    ) -> Result<(), SyncError> {
        confirm_delete(confirmed)?;
        self.store.delete_habit(self.state.user_id, habit_id).await?;
        self.state.remove_habit(habit_id);
        info!(habit_id, "habit deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppData, NewHabitRequest};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory store backed by [`AppData`] with switchable write failures.
    #[derive(Default)]
    struct FakeStore {
        data: Mutex<AppData>,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeStore {
        fn with_habit(unit: &str, plan: i64) -> (Self, HabitId) {
            let store = Self::default();
            let habit = store
                .data
                .lock()
                .unwrap()
                .create_habit(NewHabitRequest {
                    user_id: 1,
                    name: "habit".into(),
                    unit: unit.into(),
                    plan: Some(plan),
                })
                .unwrap();
            (store, habit.id)
        }

        fn write_guard(&self) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(StoreError::Transport("connection reset".into()))
            } else {
                Ok(())
            }
        }

        fn read_guard(&self) -> Result<(), StoreError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                Err(StoreError::Transport("offline".into()))
            } else {
                Ok(())
            }
        }
    }

    impl RecordStore for FakeStore {
        async fn list_habits(&self, user_id: UserId) -> Result<Vec<Habit>, StoreError> {
            self.read_guard()?;
            Ok(self.data.lock().unwrap().habits_for(user_id))
        }

        async fn list_records(
            &self,
            user_id: UserId,
            year: i32,
            month: u32,
        ) -> Result<Vec<DayRecord>, StoreError> {
            self.read_guard()?;
            Ok(self.data.lock().unwrap().records_for(user_id, year, month))
        }

        async fn upsert_record(&self, key: RecordKey, value: f64) -> Result<(), StoreError> {
            self.write_guard()?;
            self.data.lock().unwrap().upsert_record(key, value)
        }

        async fn delete_record(&self, key: RecordKey) -> Result<(), StoreError> {
            self.write_guard()?;
            self.data.lock().unwrap().delete_record(key).map(|_| ())
        }

        async fn update_habit(
            &self,
            user_id: UserId,
            habit_id: HabitId,
            update: &HabitUpdate,
        ) -> Result<Habit, StoreError> {
            self.write_guard()?;
            self.data
                .lock()
                .unwrap()
                .update_habit(user_id, habit_id, update)
        }

        async fn delete_habit(&self, user_id: UserId, habit_id: HabitId) -> Result<(), StoreError> {
            self.write_guard()?;
            self.data
                .lock()
                .unwrap()
                .delete_habit(user_id, habit_id)
                .map(|_| ())
        }
    }

    #[test]
    fn apply_describes_the_remote_call() {
        let habit = Habit {
            id: 1,
            user_id: 1,
            name: "Run".into(),
            unit: Some("Раз".into()),
            plan: 10,
            archived: Vec::new(),
        };
        let mut state = MonthState::new(1, 2025, 4, vec![habit], Vec::new());

        let effect = state.apply(CellEvent::Tap { habit_id: 1, day: 2 });
        assert_eq!(
            effect,
            Effect::Upsert {
                key: state.key(1, 2),
                value: 1.0
            }
        );
        state.apply(CellEvent::Tap { habit_id: 1, day: 2 });
        assert_eq!(state.value(1, 2), 2.0);
        assert_eq!(state.records().len(), 1);

        let effect = state.apply(CellEvent::Set {
            habit_id: 1,
            day: 2,
            value: 0.0,
        });
        assert_eq!(effect, Effect::Delete { key: state.key(1, 2) });
        assert!(state.records().is_empty());
    }

    #[test]
    fn apply_ignores_unknown_habits_and_days() {
        let mut state = MonthState::new(1, 2025, 2, Vec::new(), Vec::new());
        assert_eq!(state.apply(CellEvent::Tap { habit_id: 9, day: 1 }), Effect::None);

        state.replace_habits(vec![Habit {
            id: 9,
            user_id: 1,
            name: "x".into(),
            unit: None,
            plan: 1,
            archived: Vec::new(),
        }]);
        assert_eq!(state.apply(CellEvent::Tap { habit_id: 9, day: 29 }), Effect::None);
        assert_eq!(state.apply(CellEvent::Tap { habit_id: 9, day: 0 }), Effect::None);
    }

    #[test]
    fn clearing_a_day_matches_never_setting_it() {
        let habit = Habit {
            id: 1,
            user_id: 1,
            name: "Read".into(),
            unit: Some("Дни".into()),
            plan: 10,
            archived: Vec::new(),
        };
        let mut state = MonthState::new(1, 2025, 4, vec![habit], Vec::new());
        let untouched = state.stats(1);

        state.apply_cell_change(1, 5, 1.0);
        state.apply_cell_change(1, 5, 0.0);
        assert_eq!(state.stats(1), untouched);
    }

    #[tokio::test]
    async fn double_tap_on_check_cell_sets_then_deletes() {
        let (store, habit_id) = FakeStore::with_habit("Дни", 20);
        let mut controller = SyncController::load(store, 1, 2025, 4).await.unwrap();

        assert_eq!(controller.tap(habit_id, 7).await, SyncOutcome::Confirmed);
        assert_eq!(controller.state().value(habit_id, 7), 1.0);
        assert_eq!(controller.store().data.lock().unwrap().records.len(), 1);

        assert_eq!(controller.tap(habit_id, 7).await, SyncOutcome::Confirmed);
        assert_eq!(controller.state().value(habit_id, 7), 0.0);
        assert!(controller.state().records().is_empty());
        assert!(controller.store().data.lock().unwrap().records.is_empty());
        assert_eq!(controller.store().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_write_reloads_the_stored_value() {
        let (store, habit_id) = FakeStore::with_habit("Раз", 10);
        let mut controller = SyncController::load(store, 1, 2025, 4).await.unwrap();
        controller.apply_cell_change(habit_id, 3, 2.0).await;

        controller.store().fail_writes.store(true, Ordering::SeqCst);
        let outcome = controller.apply_cell_change(habit_id, 3, 5.0).await;

        assert!(matches!(outcome, SyncOutcome::Reconciled(StoreError::Transport(_))));
        assert_eq!(controller.state().value(habit_id, 3), 2.0);
        assert_eq!(controller.state().stats(habit_id).total, 2.0);
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_optimistic_value() {
        let (store, habit_id) = FakeStore::with_habit("Раз", 10);
        let mut controller = SyncController::load(store, 1, 2025, 4).await.unwrap();

        controller.store().fail_writes.store(true, Ordering::SeqCst);
        controller.store().fail_reads.store(true, Ordering::SeqCst);
        let outcome = controller.apply_cell_change(habit_id, 3, 5.0).await;

        assert!(matches!(outcome, SyncOutcome::ReloadFailed { .. }));
        assert_eq!(controller.state().value(habit_id, 3), 5.0);
    }

    #[tokio::test]
    async fn manual_entry_writes_its_value() {
        let (store, habit_id) = FakeStore::with_habit("Часы", 10);
        let mut controller = SyncController::load(store, 1, 2025, 4).await.unwrap();

        let mut entry = controller.state().manual_entry(habit_id, 1).unwrap();
        entry.input = "2,5".into();
        assert_eq!(
            controller.save_manual_entry(habit_id, 1, &entry).await,
            SyncOutcome::Confirmed
        );
        assert_eq!(controller.state().stats(habit_id).display, "2ч");
        assert_eq!(controller.state().stats(habit_id).percent, 25);
    }

    #[tokio::test]
    async fn invalid_habit_draft_sends_nothing() {
        let (store, habit_id) = FakeStore::with_habit("Дни", 20);
        let mut controller = SyncController::load(store, 1, 2025, 4).await.unwrap();

        let draft = HabitDraft {
            name: String::new(),
            unit: "Дни".into(),
            plan: "5".into(),
        };
        let result = controller.save_habit(habit_id, &draft).await;
        assert!(matches!(
            result,
            Err(SyncError::Validation(ValidationError::EmptyName))
        ));
        assert_eq!(controller.store().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn edit_draft_is_prefilled_from_the_habit() {
        let (store, habit_id) = FakeStore::with_habit("Дни", 20);
        let controller = SyncController::load(store, 1, 2025, 4).await.unwrap();

        let draft = controller.state().edit_draft(habit_id).unwrap();
        assert_eq!(draft.name, "habit");
        assert_eq!(draft.unit, "Дни");
        assert_eq!(draft.plan, "20");
        assert!(controller.state().edit_draft(habit_id + 1).is_none());
    }

    #[tokio::test]
    async fn saving_a_new_unit_reclassifies_the_habit() {
        let (store, habit_id) = FakeStore::with_habit("Дни", 20);
        let mut controller = SyncController::load(store, 1, 2025, 4).await.unwrap();

        let mut draft = controller.state().edit_draft(habit_id).unwrap();
        draft.name = "Study".into();
        draft.unit = "Часы".into();
        draft.plan = String::new();
        let habit = controller.save_habit(habit_id, &draft).await.unwrap();
        assert_eq!(habit.plan, 20);
        assert_eq!(controller.state().tracked(habit_id).unwrap().kind, CellKind::Time);
    }

    #[tokio::test]
    async fn confirmed_delete_drops_habit_and_records() {
        let (store, habit_id) = FakeStore::with_habit("Дни", 20);
        let mut controller = SyncController::load(store, 1, 2025, 4).await.unwrap();
        controller.tap(habit_id, 1).await;

        assert!(matches!(
            controller.delete_habit(habit_id, false).await,
            Err(SyncError::Validation(ValidationError::DeleteNotConfirmed))
        ));
        controller.delete_habit(habit_id, true).await.unwrap();

        assert!(controller.state().habits().is_empty());
        assert!(controller.state().records().is_empty());
        assert!(controller.store().data.lock().unwrap().records.is_empty());
        assert_eq!(controller.state().stats(habit_id), MonthlyStats::zero());
    }
}
