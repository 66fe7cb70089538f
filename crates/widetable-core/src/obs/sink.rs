//! Metrics sink boundary.
//!
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`.
//! This module is the only bridge between op execution and the
//! thread-local metrics state.
use crate::obs::metrics;
use std::{cell::Cell, time::Instant};

thread_local! {
    static SINK_OVERRIDE: Cell<Option<&'static dyn MetricsSink>> = const { Cell::new(None) };
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Read,
    Write,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    ExecStart {
        kind: ExecKind,
        table: &'a str,
    },
    ExecFinish {
        kind: ExecKind,
        table: &'a str,
        statements: u64,
        rows: u64,
        micros: u64,
        failed: bool,
    },
    RowsScanned {
        table: &'a str,
        rows: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink that writes into the thread-local metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ExecStart { kind, table } => {
                metrics::with_state_mut(|m| {
                    let entry = m.tables.entry(table.to_string()).or_default();
                    match kind {
                        ExecKind::Read => {
                            m.ops.read_calls = m.ops.read_calls.saturating_add(1);
                            entry.read_calls = entry.read_calls.saturating_add(1);
                        }
                        ExecKind::Write => {
                            m.ops.write_calls = m.ops.write_calls.saturating_add(1);
                            entry.write_calls = entry.write_calls.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::ExecFinish {
                kind,
                table,
                statements,
                rows,
                micros,
                failed,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.statements = m.ops.statements.saturating_add(statements);
                    match kind {
                        ExecKind::Read => {
                            m.ops.rows_read = m.ops.rows_read.saturating_add(rows);
                            metrics::add_micros(
                                &mut m.perf.read_micros_total,
                                &mut m.perf.read_micros_max,
                                micros,
                            );
                        }
                        ExecKind::Write => {
                            metrics::add_micros(
                                &mut m.perf.write_micros_total,
                                &mut m.perf.write_micros_max,
                                micros,
                            );
                        }
                    }
                    if failed {
                        m.ops.failed_calls = m.ops.failed_calls.saturating_add(1);
                    }

                    let entry = m.tables.entry(table.to_string()).or_default();
                    entry.statements = entry.statements.saturating_add(statements);
                    if kind == ExecKind::Read {
                        entry.rows_read = entry.rows_read.saturating_add(rows);
                    }
                    if failed {
                        entry.failed_calls = entry.failed_calls.saturating_add(1);
                    }
                });
            }

            MetricsEvent::RowsScanned { table, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows);
                    let entry = m.tables.entry(table.to_string()).or_default();
                    entry.rows_scanned = entry.rows_scanned.saturating_add(rows);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    match SINK_OVERRIDE.get() {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
///
/// `window_start_ms` filters by window start (`EventState::window_start_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<u64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state (counters + perf).
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Route every event recorded on this thread through `sink` while `f`
/// runs. Overrides nest; the previous sink is restored on return and on
/// unwind.
pub fn with_metrics_sink<T>(sink: &'static dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Restore(Option<&'static dyn MetricsSink>);

    impl Drop for Restore {
        fn drop(&mut self) {
            SINK_OVERRIDE.set(self.0);
        }
    }

    let _restore = Restore(SINK_OVERRIDE.replace(Some(sink)));

    f()
}

/// Span
/// RAII guard that emits start/finish events for one op run.
/// Finish accounting happens even on unwind.

pub(crate) struct Span {
    kind: ExecKind,
    table: String,
    start: Instant,
    statements: u64,
    rows: u64,
    failed: bool,
}

impl Span {
    #[must_use]
    pub(crate) fn new(kind: ExecKind, table: &str) -> Self {
        record(MetricsEvent::ExecStart { kind, table });

        Self {
            kind,
            table: table.to_string(),
            start: Instant::now(),
            statements: 0,
            rows: 0,
            failed: false,
        }
    }

    pub(crate) const fn add_statements(&mut self, statements: u64) {
        self.statements = self.statements.saturating_add(statements);
    }

    pub(crate) const fn add_rows(&mut self, rows: u64) {
        self.rows = self.rows.saturating_add(rows);
    }

    pub(crate) const fn set_failed(&mut self) {
        self.failed = true;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        let micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            table: &self.table,
            statements: self.statements,
            rows: self.rows,
            micros,
            failed: self.failed,
        });
    }
}
