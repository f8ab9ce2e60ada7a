use crate::model::{LogEntry, LogLevel, StepId};

/// Text/level/step filter for the log view. All parts are optional; an empty
/// filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub text: String,
    pub level: Option<LogLevel>,
    pub step_id: Option<StepId>,
}

impl LogFilter {
    pub fn new(text: impl Into<String>, level: Option<LogLevel>) -> Self {
        Self {
            text: text.into(),
            level,
            step_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.level.is_none() && self.step_id.is_none()
    }

    /// Cycle ALL → ERROR → WARN → INFO → DEBUG → ALL.
    pub fn cycle_level(&mut self) {
        self.level = match self.level {
            None => Some(LogLevel::Error),
            Some(LogLevel::Error) => Some(LogLevel::Warn),
            Some(LogLevel::Warn) => Some(LogLevel::Info),
            Some(LogLevel::Info) => Some(LogLevel::Debug),
            Some(LogLevel::Debug) => None,
        };
    }
}

/// Restartable filtered view over a slice of log entries.
#[derive(Debug, Clone)]
pub struct LogView<'a> {
    entries: &'a [LogEntry],
    needle: String,
    level: Option<LogLevel>,
    step_id: Option<StepId>,
}

impl<'a> LogView<'a> {
    pub(crate) fn new(entries: &'a [LogEntry], filter: &LogFilter) -> Self {
        Self {
            entries,
            needle: filter.text.to_lowercase(),
            level: filter.level,
            step_id: filter.step_id,
        }
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.level.map_or(true, |l| entry.level == l)
            && self.step_id.map_or(true, |s| entry.step_id == Some(s))
            && (self.needle.is_empty() || entry.message.to_lowercase().contains(&self.needle))
    }

    pub fn iter(&self) -> LogViewIter<'a, '_> {
        LogViewIter {
            view: self,
            inner: self.entries.iter(),
        }
    }
}

impl<'a, 'v> IntoIterator for &'v LogView<'a> {
    type Item = &'a LogEntry;
    type IntoIter = LogViewIter<'a, 'v>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct LogViewIter<'a, 'v> {
    view: &'v LogView<'a>,
    inner: std::slice::Iter<'a, LogEntry>,
}

impl<'a> Iterator for LogViewIter<'a, '_> {
    type Item = &'a LogEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let view = self.view;
        self.inner.by_ref().find(|e| view.matches(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LogBuffer;
    use chrono::Utc;

    fn buffer() -> LogBuffer {
        let now = Utc::now();
        let mut buf = LogBuffer::new();
        buf.append(LogEntry::new(LogLevel::Info, "Reading file data.csv", now).with_step(1));
        buf.append(LogEntry::new(LogLevel::Error, "File not found", now).with_step(2));
        buf.append(LogEntry::new(LogLevel::Debug, "tool call payload", now));
        buf
    }

    #[test]
    fn test_text_filter_is_case_insensitive() {
        let buf = buffer();
        let filter = LogFilter::new("FILE", None);
        assert_eq!(buf.filter(&filter).iter().count(), 2);
    }

    #[test]
    fn test_level_and_text_combine() {
        let buf = buffer();
        let filter = LogFilter::new("file", Some(LogLevel::Error));
        let hits: Vec<_> = buf.filter(&filter).iter().map(|e| e.message.clone()).collect();
        assert_eq!(hits, vec!["File not found".to_string()]);
    }

    #[test]
    fn test_view_is_restartable_and_pure() {
        let buf = buffer();
        let filter = LogFilter {
            step_id: Some(1),
            ..LogFilter::default()
        };
        let view = buf.filter(&filter);
        let first: Vec<_> = view.iter().collect();
        let second: Vec<_> = (&view).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_cycle_level_wraps() {
        let mut filter = LogFilter::default();
        for _ in 0..5 {
            filter.cycle_level();
        }
        assert_eq!(filter.level, None);
    }
}
