//! In-process counters for the server.
//!
//! Plain atomics plus one labelled counter (messages dispatched per kind).
//! Rendered in Prometheus text format by the `/metrics` handler.

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dashmap::DashMap;

/// Counter keyed by a single label value.
#[derive(Default)]
pub struct CounterVec {
    map: DashMap<String, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, label: &str) {
        if let Some(c) = self.map.get(label) {
            c.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.map
            .entry(label.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, label: &str) -> u64 {
        self.map
            .get(label)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, label: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (value, count) in rows {
            let _ = writeln!(out, "{name}{{{label}=\"{}\"}} {count}", escape_label(&value));
        }
    }
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct ServerMetrics {
    pub sessions_active: AtomicI64,
    pub logins_accepted: AtomicU64,
    pub logins_rejected: AtomicU64,
    pub decode_errors: AtomicU64,
    pub oversized_frames: AtomicU64,
    /// Unknown kinds plus known kinds with no handler.
    pub unrouted: AtomicU64,
    pub handler_errors: AtomicU64,
    pub delivery_failures: AtomicU64,
    pub dispatched: CounterVec,
}

impl ServerMetrics {
    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_opened(&self) {
        self.sessions_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        self.sessions_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "# TYPE coplay_sessions_active gauge\ncoplay_sessions_active {}",
            self.sessions_active.load(Ordering::Relaxed)
        );
        for (name, counter) in [
            ("coplay_logins_accepted_total", &self.logins_accepted),
            ("coplay_logins_rejected_total", &self.logins_rejected),
            ("coplay_decode_errors_total", &self.decode_errors),
            ("coplay_oversized_frames_total", &self.oversized_frames),
            ("coplay_unrouted_total", &self.unrouted),
            ("coplay_handler_errors_total", &self.handler_errors),
            ("coplay_delivery_failures_total", &self.delivery_failures),
        ] {
            let _ = writeln!(
                out,
                "# TYPE {name} counter\n{name} {}",
                counter.load(Ordering::Relaxed)
            );
        }
        self.dispatched
            .render("coplay_dispatched_total", "kind", &mut out);
        out
    }
}
