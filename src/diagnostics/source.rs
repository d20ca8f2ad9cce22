//! Registry of the source texts diagnostics point into.
//!
//! Resolution only ever touches byte offsets; line and column information is
//! computed here on demand when a diagnostic is rendered. Diagnostic paths
//! are cold, so positions are found by scanning the prefix instead of
//! maintaining a line index.

/// Handle to a registered source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

/// 1-based line/column position within a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug)]
struct SourceEntry {
    name: String,
    text: String,
}

/// All source texts of one analysis run, appended as the driver feeds them.
#[derive(Debug, Default)]
pub struct SourceMap {
    sources: Vec<SourceEntry>,
}

impl SourceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, text: impl Into<String>) -> SourceId {
        let id = SourceId(u32::try_from(self.sources.len()).unwrap_or(u32::MAX));
        self.sources.push(SourceEntry {
            name: name.into(),
            text: text.into(),
        });
        id
    }

    #[must_use]
    pub fn name(&self, id: SourceId) -> Option<&str> {
        self.entry(id).map(|entry| entry.name.as_str())
    }

    /// Line/column of a byte offset, counting characters within the line.
    #[must_use]
    pub fn position(&self, id: SourceId, offset: usize) -> Option<Position> {
        let entry = self.entry(id)?;
        if offset > entry.text.len() {
            return None;
        }
        let mut line = 1;
        let mut column = 1;
        for (index, ch) in entry.text.char_indices() {
            if index >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Some(Position { line, column })
    }

    /// Text of a 1-based line, without its trailing newline.
    #[must_use]
    pub fn line(&self, id: SourceId, line: usize) -> Option<&str> {
        self.entry(id)?.text.lines().nth(line.checked_sub(1)?)
    }

    /// Characters a byte range covers on its first line; at least one, so a
    /// rendered underline is never empty.
    #[must_use]
    pub fn width(&self, id: SourceId, start: usize, end: usize) -> usize {
        let Some(entry) = self.entry(id) else {
            return 1;
        };
        let mut width = 0;
        for (index, ch) in entry.text.char_indices() {
            if index < start {
                continue;
            }
            if index >= end || ch == '\n' {
                break;
            }
            width += 1;
        }
        width.max(1)
    }

    fn entry(&self, id: SourceId) -> Option<&SourceEntry> {
        self.sources.get(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_counts_lines_and_columns() {
        let mut sources = SourceMap::new();
        let id = sources.add("main.qz", "ab\ncd\n");
        assert_eq!(sources.position(id, 0), Some(Position { line: 1, column: 1 }));
        assert_eq!(sources.position(id, 1), Some(Position { line: 1, column: 2 }));
        assert_eq!(sources.position(id, 3), Some(Position { line: 2, column: 1 }));
        assert_eq!(sources.position(id, 7), None);
    }

    #[test]
    fn line_lookup_is_one_based() {
        let mut sources = SourceMap::new();
        let id = sources.add("lib.qz", "def foo\nfoo 1\n");
        assert_eq!(sources.line(id, 1), Some("def foo"));
        assert_eq!(sources.line(id, 2), Some("foo 1"));
        assert_eq!(sources.line(id, 3), None);
        assert_eq!(sources.line(id, 0), None);
    }

    #[test]
    fn width_clips_to_the_first_line_and_never_vanishes() {
        let mut sources = SourceMap::new();
        let id = sources.add("main.qz", "foo 1\nbar 2\n");
        assert_eq!(sources.width(id, 0, 3), 3);
        assert_eq!(sources.width(id, 0, 20), 5);
        assert_eq!(sources.width(id, 4, 4), 1);
    }

    #[test]
    fn unknown_ids_resolve_to_nothing() {
        let sources = SourceMap::new();
        assert_eq!(sources.name(SourceId(3)), None);
        assert_eq!(sources.position(SourceId(3), 0), None);
    }
}
