use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters and simple perf totals for table operations.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub tables: BTreeMap<String, TableCounters>,
    pub window_start_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            perf: EventPerf::default(),
            tables: BTreeMap::new(),
            window_start_ms: u64::try_from(*Timestamp::now()).unwrap_or_default(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // op entrypoints
    pub read_calls: u64,
    pub write_calls: u64,
    pub failed_calls: u64,

    // statements and rows
    pub statements: u64,
    pub rows_read: u64,
    pub rows_scanned: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableCounters {
    pub read_calls: u64,
    pub write_calls: u64,
    pub failed_calls: u64,
    pub statements: u64,
    pub rows_read: u64,
    pub rows_scanned: u64,
}

///
/// EventPerf
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventPerf {
    // wall-clock totals per op kind, in microseconds
    pub read_micros_total: u128,
    pub write_micros_total: u128,

    // maximum observed durations
    pub read_micros_max: u64,
    pub write_micros_max: u64,
}

///
/// EventReport
///
/// `counters` is `None` when the requested window starts after the
/// current one.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: Option<EventState>,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and start a new window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate a duration and track the max.
pub(crate) fn add_micros(total: &mut u128, max: &mut u64, delta: u64) {
    *total = total.saturating_add(u128::from(delta));
    if delta > *max {
        *max = delta;
    }
}

pub(crate) fn report_window_start(window_start_ms: Option<u64>) -> EventReport {
    with_state(|m| {
        let counters = match window_start_ms {
            Some(start) if start > m.window_start_ms => None,
            _ => Some(m.clone()),
        };

        EventReport { counters }
    })
}
