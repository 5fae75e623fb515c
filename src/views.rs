//! Derived views over the task cache.
//!
//! Pure, memoized projections: nothing in here mutates the cache. A
//! selector result is memoized on the cache generation plus the parameter
//! tuple, so repeated calls with unchanged inputs return the same
//! `Arc` without recomputation; any cache mutation bumps the generation
//! and invalidates.
//!
//! The UI composes period selection, completion filtering and sorting in
//! that order, but each stage stands alone.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use parking_lot::Mutex;

use crate::cache::SharedCache;
use crate::task::Task;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Combinator memo entries kept before the table is reset.
const COMBO_MEMO_CAP: usize = 16;

/// Sort order for deadline sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SelectKey {
    All,
    Period { start_ms: i64, end_ms: i64 },
}

struct SelectHit {
    generation: u64,
    value: Arc<Vec<Task>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComboOp {
    Completion(bool),
    Sort(SortOrder),
}

struct ComboHit {
    input: Arc<Vec<Task>>,
    op: ComboOp,
    output: Arc<Vec<Task>>,
}

/// Memoized selectors over a task cache.
pub struct TaskViews {
    cache: SharedCache<Task>,
    week_start: Weekday,
    selects: Mutex<HashMap<SelectKey, SelectHit>>,
    combos: Mutex<Vec<ComboHit>>,
}

impl TaskViews {
    pub fn new(cache: SharedCache<Task>, week_start: Weekday) -> Self {
        Self {
            cache,
            week_start,
            selects: Mutex::new(HashMap::new()),
            combos: Mutex::new(Vec::new()),
        }
    }

    /// All cached tasks, in cache insertion order.
    pub fn select_all(&self) -> Arc<Vec<Task>> {
        self.select(SelectKey::All)
    }

    /// Tasks whose deadline falls within today, inclusive at both bounds.
    pub fn select_for_today(&self) -> Arc<Vec<Task>> {
        self.select_for_today_at(Utc::now())
    }

    pub fn select_for_today_at(&self, now: DateTime<Utc>) -> Arc<Vec<Task>> {
        let (start_ms, end_ms) = day_bounds(now);
        self.select(SelectKey::Period { start_ms, end_ms })
    }

    /// Tasks due this week; the week begins on the configured weekday.
    pub fn select_for_week(&self) -> Arc<Vec<Task>> {
        self.select_for_week_at(Utc::now())
    }

    pub fn select_for_week_at(&self, now: DateTime<Utc>) -> Arc<Vec<Task>> {
        let (start_ms, end_ms) = week_bounds(now, self.week_start);
        self.select(SelectKey::Period { start_ms, end_ms })
    }

    /// Tasks due this calendar month.
    pub fn select_for_month(&self) -> Arc<Vec<Task>> {
        self.select_for_month_at(Utc::now())
    }

    pub fn select_for_month_at(&self, now: DateTime<Utc>) -> Arc<Vec<Task>> {
        let (start_ms, end_ms) = month_bounds(now);
        self.select(SelectKey::Period { start_ms, end_ms })
    }

    /// Memoized completion filter; a hit requires the same input list
    /// (by identity) and parameter.
    pub fn filter_by_completion(
        &self,
        tasks: &Arc<Vec<Task>>,
        show_completed: bool,
    ) -> Arc<Vec<Task>> {
        self.combo(tasks, ComboOp::Completion(show_completed))
    }

    /// Memoized stable deadline sort.
    pub fn sort_by_deadline(&self, tasks: &Arc<Vec<Task>>, order: SortOrder) -> Arc<Vec<Task>> {
        self.combo(tasks, ComboOp::Sort(order))
    }

    fn select(&self, key: SelectKey) -> Arc<Vec<Task>> {
        let cache = self.cache.read();
        let generation = cache.generation();
        let mut selects = self.selects.lock();
        if let Some(hit) = selects.get(&key) {
            if hit.generation == generation {
                return Arc::clone(&hit.value);
            }
        }
        let tasks = cache.all();
        let value = Arc::new(match key {
            SelectKey::All => tasks,
            SelectKey::Period { start_ms, end_ms } => tasks
                .into_iter()
                .filter(|task| task.deadline >= start_ms && task.deadline <= end_ms)
                .collect(),
        });
        selects.insert(
            key,
            SelectHit {
                generation,
                value: Arc::clone(&value),
            },
        );
        value
    }

    fn combo(&self, input: &Arc<Vec<Task>>, op: ComboOp) -> Arc<Vec<Task>> {
        let mut combos = self.combos.lock();
        if let Some(hit) = combos
            .iter()
            .find(|hit| hit.op == op && Arc::ptr_eq(&hit.input, input))
        {
            return Arc::clone(&hit.output);
        }
        let output = Arc::new(match op {
            ComboOp::Completion(show_completed) => filter_tasks(input, show_completed),
            ComboOp::Sort(order) => sorted_by_deadline(input, order),
        });
        if combos.len() >= COMBO_MEMO_CAP {
            combos.remove(0);
        }
        combos.push(ComboHit {
            input: Arc::clone(input),
            op,
            output: Arc::clone(&output),
        });
        output
    }
}

/// Drop completed tasks unless `show_completed`.
pub fn filter_tasks(tasks: &[Task], show_completed: bool) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| show_completed || !task.is_complete)
        .cloned()
        .collect()
}

/// Stable sort by deadline; equal deadlines keep their relative order.
pub fn sorted_by_deadline(tasks: &[Task], order: SortOrder) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort_by(|left, right| left.deadline.cmp(&right.deadline)),
        SortOrder::Descending => sorted.sort_by(|left, right| right.deadline.cmp(&left.deadline)),
    }
    sorted
}

fn ms_at_midnight(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
        .timestamp_millis()
}

/// `[start_of_day, end_of_day]` around `now`, both inclusive, in epoch-ms.
pub fn day_bounds(now: DateTime<Utc>) -> (i64, i64) {
    let start_ms = ms_at_midnight(now.date_naive());
    (start_ms, start_ms + MILLIS_PER_DAY - 1)
}

/// Bounds of the week containing `now`, starting on `week_start`.
pub fn week_bounds(now: DateTime<Utc>, week_start: Weekday) -> (i64, i64) {
    let week = now.date_naive().week(week_start);
    let start_ms = ms_at_midnight(week.first_day());
    let end_ms = ms_at_midnight(week.last_day()) + MILLIS_PER_DAY - 1;
    (start_ms, end_ms)
}

/// Bounds of the calendar month containing `now`.
pub fn month_bounds(now: DateTime<Utc>) -> (i64, i64) {
    let date = now.date_naive();
    let first = date.with_day(1).unwrap_or(date);
    let (next_year, next_month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap_or(first);
    (ms_at_midnight(first), ms_at_midnight(next_first) - 1)
}
