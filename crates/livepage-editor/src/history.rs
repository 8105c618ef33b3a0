//! Undo/redo history.
//!
//! A linear list of whole-document snapshots plus a cursor. Pushing after
//! an undo discards everything past the cursor; redo branches are never
//! kept. Snapshots are MessagePack-encoded [`SourceBundle`]s.

use crate::error::EditorResult;
use crate::sync::SourceBundle;

/// Linear, truncating history addressed by index.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<T>,
    /// Index of the current entry; meaningless while `entries` is empty.
    index: usize,
    max_depth: usize,
}

impl<T> History<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Truncate past the cursor, append, and move the cursor onto the new
    /// entry. The oldest entry is dropped once `max_depth` is exceeded.
    pub fn push(&mut self, entry: T) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.index + 1);
        }
        self.entries.push(entry);
        if self.entries.len() > self.max_depth {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back; `None` at the first entry.
    pub fn undo(&mut self) -> Option<&T> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward; `None` at the last entry.
    pub fn redo(&mut self) -> Option<&T> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.index)
    }

    /// Cursor position, `None` while empty.
    pub fn index(&self) -> Option<usize> {
        (!self.entries.is_empty()).then_some(self.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = 0;
    }
}

// ─── Snapshots ───────────────────────────────────────────────────────────

/// An opaque serialized canvas state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn capture(bundle: &SourceBundle) -> EditorResult<Self> {
        Ok(Self(rmp_serde::to_vec(bundle)?))
    }

    pub fn restore(&self) -> EditorResult<SourceBundle> {
        Ok(rmp_serde::from_slice(&self.0)?)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_after_undo_truncates() {
        let mut h = History::new(200);
        h.push('A');
        h.push('B');
        h.push('C');
        assert_eq!(h.undo(), Some(&'B'));
        assert_eq!(h.undo(), Some(&'A'));
        h.push('D');
        assert_eq!(h.entries(), &['A', 'D']);
        assert_eq!(h.index(), Some(1));
        assert_eq!(h.redo(), None);
    }

    #[test]
    fn bounds_are_no_ops() {
        let mut h: History<u8> = History::new(10);
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
        assert_eq!(h.index(), None);
        h.push(1);
        assert_eq!(h.undo(), None);
        assert_eq!(h.redo(), None);
        assert_eq!(h.index(), Some(0));
    }

    #[test]
    fn depth_limit_drops_oldest() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(i);
        }
        assert_eq!(h.entries(), &[2, 3, 4]);
        assert_eq!(h.index(), Some(2));
        assert!(h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn snapshot_restores_bundle() {
        let bundle = SourceBundle {
            html: "<div id=\"a\">x</div>".into(),
            css: "#a { color: red; }".into(),
            js: String::new(),
        };
        let snap = Snapshot::capture(&bundle).unwrap();
        assert_eq!(snap.restore().unwrap(), bundle);
    }

    #[test]
    fn garbage_snapshot_is_an_error() {
        let snap = Snapshot(vec![0xc1]);
        assert!(matches!(
            snap.restore(),
            Err(crate::error::EditorError::Snapshot(_))
        ));
    }
}
