//! Append-only trace log of a derivation.
//!
//! Entries are recorded only for the classes enabled in
//! [`DeriveOptions::trace`](crate::config::DeriveOptions) and forwarded to the
//! `log` facade (target = class) when the log is flushed.

/// A single trace message.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub class: String,
    pub message: String,
    pub timepoint: chrono::NaiveDateTime,
}

#[derive(Debug, Default)]
pub struct TraceLog {
    enabled: Vec<String>,
    entries: Vec<TraceEntry>,
    flushed: usize,
}

impl TraceLog {
    pub fn new(enabled: &[String]) -> Self {
        Self {
            enabled: enabled.to_vec(),
            entries: Vec::new(),
            flushed: 0,
        }
    }

    pub fn is_enabled(&self, class: &str) -> bool {
        self.enabled.iter().any(|c| c == class)
    }

    pub fn push(&mut self, class: &str, message: String) {
        self.entries.push(TraceEntry {
            class: class.to_string(),
            message,
            timepoint: chrono::Local::now().naive_local(),
        });
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Entries of one class, oldest first.
    pub fn messages<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.class == class)
            .map(|e| e.message.as_str())
    }

    /// Forward entries recorded since the last flush to the `log` facade.
    pub fn flush(&mut self) {
        for entry in &self.entries[self.flushed..] {
            log::trace!(target: entry.class.as_str(), "[{}] {}", entry.timepoint, entry.message);
        }
        self.flushed = self.entries.len();
    }
}

/// Record a formatted message if `$class` is enabled; the message is not
/// formatted otherwise.
#[macro_export]
macro_rules! fixtrace {
    (
        $log:expr,
        $class:expr,
        $( $arg:tt )*
    ) => {
        {
            let log: &mut $crate::trace::TraceLog = &mut $log;
            if log.is_enabled($class) {
                log.push($class, format!($($arg)*));
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magic::{TRACE_INDUCTION, TRACE_UNFOLD};

    #[test]
    fn only_enabled_classes_are_recorded() {
        let mut log = TraceLog::new(&[TRACE_UNFOLD.to_string()]);
        fixtrace!(log, TRACE_UNFOLD, "relation {}", 1);
        fixtrace!(log, TRACE_INDUCTION, "final term {}", 2);
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.messages(TRACE_UNFOLD).collect::<Vec<_>>(), ["relation 1"]);

        log.flush();
        fixtrace!(log, TRACE_UNFOLD, "relation {}", 3);
        log.flush();
        assert_eq!(log.entries().len(), 2);
    }

    fn record(log: &mut TraceLog, n: u32) {
        fixtrace!(*log, TRACE_UNFOLD, "borrowed {n}");
    }

    #[test]
    fn borrowed_logs_are_recorded_into() {
        let mut log = TraceLog::new(&[TRACE_UNFOLD.to_string()]);
        record(&mut log, 1);
        record(&mut log, 2);
        assert_eq!(
            log.messages(TRACE_UNFOLD).collect::<Vec<_>>(),
            ["borrowed 1", "borrowed 2"]
        );
    }
}
