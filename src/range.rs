//! Positional slicing of matched nodes

use serde::{Deserialize, Serialize};

/// Which of the matched nodes a specification keeps
///
/// Indices follow slice semantics: `start_idx` is inclusive, `end_idx`
/// exclusive, negative values count from the end. Bounds past either end are
/// clamped, so a range never fails; it just selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    pub start_idx: isize,
    /// `None` means every remaining node
    pub end_idx: Option<isize>,
    /// Reverse the selection after slicing
    pub reverse: bool,
    /// Resolve to the first selected value instead of a list
    pub find_single: bool,
}

impl Range {
    /// Every match, as a list
    pub fn all() -> Self {
        Self::default()
    }

    /// The single match at `index`; `-1` is the last one
    pub fn nth(index: isize) -> Self {
        // past `isize::MAX` the end is unbounded; the start already clamps
        let end_idx = if index == -1 { None } else { index.checked_add(1) };
        Self {
            start_idx: index,
            end_idx,
            reverse: false,
            find_single: true,
        }
    }

    pub fn first() -> Self {
        Self::nth(0)
    }

    pub fn last() -> Self {
        Self::nth(-1)
    }

    pub fn slice(start_idx: isize, end_idx: Option<isize>) -> Self {
        Self {
            start_idx,
            end_idx,
            ..Self::default()
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn single(mut self) -> Self {
        self.find_single = true;
        self
    }

    /// Apply the range to `items`, keeping their relative order
    pub fn select<T>(&self, mut items: Vec<T>) -> Vec<T> {
        let len = items.len();
        let start = normalize(self.start_idx, len);
        let end = self.end_idx.map_or(len, |end| normalize(end, len));

        if start >= end {
            return Vec::new();
        }

        items.truncate(end);
        let mut selected = items.split_off(start);
        if self.reverse {
            selected.reverse();
        }
        selected
    }
}

fn normalize(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}
