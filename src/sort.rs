use std::cell::RefCell;
use std::cmp::Ordering;

use feruca::{Collator, Tailoring};
use serde::{Deserialize, Serialize};

use crate::product::ProductRow;

// ---------------------------------------------------------------------------
// SortColumn / SortDirection
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    #[default]
    Identifier,
    Label,
    Variant,
}

impl SortColumn {
    pub const ALL: [SortColumn; 3] = [SortColumn::Identifier, SortColumn::Label, SortColumn::Variant];

    /// Column header text.
    pub fn title(&self) -> &'static str {
        match self {
            SortColumn::Identifier => "ID",
            SortColumn::Label => "Label",
            SortColumn::Variant => "Variant",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

// ---------------------------------------------------------------------------
// TreeSort
// ---------------------------------------------------------------------------

/// Active sort column and direction, applied to each sibling group
/// independently while the tree is indexed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeSort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl TreeSort {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Header click: a new column starts ascending, the active column flips.
    pub fn click(&mut self, column: SortColumn) {
        if self.column != column {
            self.column = column;
            self.direction = SortDirection::Asc;
        } else {
            self.direction = self.direction.flipped();
        }
    }

    /// Arrow suffix shown next to the active column's header.
    pub fn indicator(&self, column: SortColumn) -> &'static str {
        if self.column != column {
            return "";
        }
        match self.direction {
            SortDirection::Asc => " \u{2191}",
            SortDirection::Desc => " \u{2193}",
        }
    }

    /// Compare two sibling rows.
    pub fn compare(&self, a: &ProductRow, b: &ProductRow) -> Ordering {
        let ord = match self.column {
            SortColumn::Identifier => collate(&a.identifier, &b.identifier),
            SortColumn::Label => collate(&a.label, &b.label),
            SortColumn::Variant => variant_key(a).cmp(&variant_key(b)),
        };
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// `(total, complete)` with `-1` standing in for a missing summary, so rows
/// without one sort first when ascending.
fn variant_key(row: &ProductRow) -> (i64, i64) {
    match row.complete_variant_products {
        Some(c) => (i64::from(c.total), i64::from(c.complete)),
        None => (-1, -1),
    }
}

// ---------------------------------------------------------------------------
// Collation
// ---------------------------------------------------------------------------

thread_local! {
    // CLDR root collation with punctuation kept significant (non-ignorable),
    // i.e. the language-default ordering.
    static COLLATOR: RefCell<Collator> =
        RefCell::new(Collator::new(Tailoring::default(), false, false));
}

/// Case-insensitive Unicode collation of two strings.
///
/// Accented letters sort next to their base letter (`"Émile"` between
/// `"elan"` and `"fox"`), punctuation precedes digits and digits precede
/// letters. Strings differing only by case compare equal.
pub fn collate(a: &str, b: &str) -> Ordering {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    COLLATOR.with(|collator| {
        collator
            .borrow_mut()
            .collate(a_lower.as_str(), b_lower.as_str())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
