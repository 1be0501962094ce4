//! Maximum bipartite matching for order-insensitive collections.
//!
//! Augmenting-path search (Kuhn). Expectations are processed in ascending
//! index order and candidates are tried in ascending subject index order, so
//! the result is deterministic: among maximum matchings, each expectation
//! keeps the lowest-indexed subject it can hold without reducing the total.

/// Compatibility of expectations (rows) with subjects (columns)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceMatrix {
    rows: usize,
    columns: usize,
    cells: Vec<bool>,
}

impl EquivalenceMatrix {
    /// Build a matrix by probing every pair
    pub fn build<F>(rows: usize, columns: usize, mut probe: F) -> Self
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut cells = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                cells.push(probe(row, column));
            }
        }
        Self {
            rows,
            columns,
            cells,
        }
    }

    /// Number of expectations
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of subjects
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Whether expectation `row` is equivalent to subject `column`
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> bool {
        row < self.rows && column < self.columns && self.cells[row * self.columns + column]
    }

    /// Maximum matching: the subject index paired with each expectation
    #[must_use]
    pub fn maximum_matching(&self) -> Vec<Option<usize>> {
        let mut owner: Vec<Option<usize>> = vec![None; self.columns];
        for row in 0..self.rows {
            let mut seen = vec![false; self.columns];
            self.augment(row, &mut seen, &mut owner);
        }

        let mut matched = vec![None; self.rows];
        for (column, row) in owner.iter().enumerate() {
            if let Some(row) = row {
                matched[*row] = Some(column);
            }
        }
        matched
    }

    fn augment(&self, row: usize, seen: &mut [bool], owner: &mut [Option<usize>]) -> bool {
        for column in 0..self.columns {
            if !self.get(row, column) || seen[column] {
                continue;
            }
            seen[column] = true;
            let free = match owner[column] {
                None => true,
                Some(other) => self.augment(other, seen, owner),
            };
            if free {
                owner[column] = Some(row);
                return true;
            }
        }
        false
    }
}
