//! In-memory sorting and row selection for list views.

use std::{cmp::Ordering, collections::BTreeSet};

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first; nulls lead.
    #[default]
    Asc,
    /// Largest first; nulls trail.
    Desc,
}

impl SortDirection {
    /// The other direction.
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Query-string form (`asc` / `desc`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// A cell value as seen by the sorter.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    /// Missing value; lower than anything defined.
    Null,
    /// Boolean, `false < true`.
    Bool(bool),
    /// Any number.
    Number(f64),
    /// Text, compared case-insensitively.
    Text(String),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
        }
    }

    /// Total order: nulls first, then by kind, then by value.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for SortValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for SortValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for SortValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for SortValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<usize> for SortValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl<T: Into<SortValue>> From<Option<T>> for SortValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Stable in-place sort by an extracted key. Direction reverses the whole
/// ordering, nulls included.
pub fn sort_rows<T, F>(rows: &mut [T], direction: SortDirection, key: F)
where
    F: Fn(&T) -> SortValue,
{
    rows.sort_by(|a, b| direction.apply(key(a).compare(&key(b))));
}

/// Which column the list is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    /// Column key, `None` while unsorted.
    pub field: Option<String>,
    /// Current direction.
    pub direction: SortDirection,
}

impl SortState {
    /// Sorted by `field` ascending.
    pub fn by(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: Some(field.into()),
            direction,
        }
    }

    /// Header click: same field flips direction, new field starts ascending.
    pub fn toggle(&self, field: &str) -> Self {
        if self.field.as_deref() == Some(field) {
            Self {
                field: self.field.clone(),
                direction: self.direction.flipped(),
            }
        } else {
            Self::by(field, SortDirection::Asc)
        }
    }

    /// Direction for `field` if it is the active column.
    pub fn direction_of(&self, field: &str) -> Option<SortDirection> {
        (self.field.as_deref() == Some(field)).then_some(self.direction)
    }
}

/// Checkbox state of a table, keyed by row index in the current data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowSelection {
    selected: BTreeSet<usize>,
}

impl RowSelection {
    /// Nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one row.
    pub fn toggle(&mut self, index: usize) {
        if !self.selected.remove(&index) {
            self.selected.insert(index);
        }
    }

    /// Header checkbox: select every row unless all are already selected.
    pub fn toggle_all(&mut self, len: usize) {
        if self.is_all_selected(len) {
            self.selected.clear();
        } else {
            self.selected = (0..len).collect();
        }
    }

    /// True when `len > 0` and every row is selected.
    pub fn is_all_selected(&self, len: usize) -> bool {
        len > 0 && (0..len).all(|index| self.selected.contains(&index))
    }

    /// True when row `index` is checked.
    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    /// Number of checked rows.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// True when nothing is checked.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drop the selection, e.g. when the data set changes.
    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: Option<&'static str>,
        score: Option<f64>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: Some("bravo"), score: Some(12.0) },
            Row { name: None, score: Some(3.5) },
            Row { name: Some("Alpha"), score: None },
            Row { name: Some("charlie"), score: Some(40.0) },
            Row { name: Some("Delta"), score: Some(-1.0) },
        ]
    }

    fn names(rows: &[Row]) -> Vec<Option<&'static str>> {
        rows.iter().map(|row| row.name).collect()
    }

    #[test]
    fn string_sort_is_case_insensitive_with_null_low() {
        let mut asc = rows();
        sort_rows(&mut asc, SortDirection::Asc, |row| row.name.into());
        assert_eq!(
            names(&asc),
            vec![None, Some("Alpha"), Some("bravo"), Some("charlie"), Some("Delta")]
        );

        let mut desc = rows();
        sort_rows(&mut desc, SortDirection::Desc, |row| row.name.into());
        let mut reversed = names(&asc);
        reversed.reverse();
        assert_eq!(names(&desc), reversed);
        assert_eq!(desc.last().and_then(|row| row.name), None);
    }

    #[test]
    fn numbers_sort_numerically() {
        let mut sorted = rows();
        sort_rows(&mut sorted, SortDirection::Asc, |row| row.score.into());
        let scores: Vec<Option<f64>> = sorted.iter().map(|row| row.score).collect();
        assert_eq!(scores, vec![None, Some(-1.0), Some(3.5), Some(12.0), Some(40.0)]);
    }

    #[test]
    fn toggling_same_field_flips_and_new_field_resets() {
        let state = SortState::default().toggle("name");
        assert_eq!(state, SortState::by("name", SortDirection::Asc));
        let state = state.toggle("name");
        assert_eq!(state.direction, SortDirection::Desc);
        let state = state.toggle("score");
        assert_eq!(state, SortState::by("score", SortDirection::Asc));
        assert_eq!(state.direction_of("name"), None);
    }

    #[test]
    fn selection_toggles_and_select_all() {
        let mut selection = RowSelection::new();
        selection.toggle(2);
        selection.toggle(0);
        assert_eq!(selection.indices(), vec![0, 2]);
        selection.toggle(2);
        assert_eq!(selection.indices(), vec![0]);

        selection.toggle_all(3);
        assert!(selection.is_all_selected(3));
        selection.toggle_all(3);
        assert!(selection.is_empty());
        assert!(!selection.is_all_selected(0));
    }
}
