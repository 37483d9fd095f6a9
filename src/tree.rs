//! Turns the flat row set into the ordered, annotated and filtered sequence
//! the table renders.
//!
//! Every function here is pure: the loaded rows are never mutated, and the
//! whole pipeline is recomputed from scratch whenever a view input changes.
//!
//! Rows whose `parent` does not resolve to a row reachable from the root are
//! dropped from the traversal without being reported.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::collapse::CollapsedSubmodels;
use crate::error::TreeError;
use crate::product::{AnnotatedRow, ProductRow, ProductType};
use crate::sort::TreeSort;

/// Sibling comparator used while indexing.
pub type Comparator<'c> = &'c dyn Fn(&ProductRow, &ProductRow) -> Ordering;

// ---------------------------------------------------------------------------
// Tree indexing
// ---------------------------------------------------------------------------

/// Order rows depth-first, each parent immediately before its subtree.
///
/// Siblings are sorted with `comparator` when given (stable, so equal rows
/// keep their input order); otherwise they keep the order in which they
/// appear in `rows`.
pub fn build_tree_order<'a>(
    rows: &'a [ProductRow],
    comparator: Option<Comparator<'_>>,
) -> Vec<&'a ProductRow> {
    // Single-pass: group all rows by their parent identifier.
    let mut children_map: HashMap<Option<&str>, Vec<&ProductRow>> = HashMap::new();
    for row in rows {
        children_map
            .entry(row.parent.as_deref())
            .or_default()
            .push(row);
    }

    if let Some(compare) = comparator {
        for siblings in children_map.values_mut() {
            siblings.sort_by(|a, b| compare(*a, *b));
        }
    }

    // Depth-first pre-order with an explicit stack; siblings are pushed in
    // reverse so they pop in order. `walked` keeps a duplicated identifier
    // from re-entering its subtree.
    let mut ordered = Vec::with_capacity(rows.len());
    let mut walked: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&ProductRow> = Vec::new();
    if let Some(roots) = children_map.get(&None) {
        stack.extend(roots.iter().rev());
    }

    while let Some(row) = stack.pop() {
        ordered.push(row);
        let id = row.identifier.as_str();
        if walked.insert(id) {
            if let Some(children) = children_map.get(&Some(id)) {
                stack.extend(children.iter().rev());
            }
        }
    }
    ordered
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Case-insensitive substring match on identifier, label and each axis'
/// `"{attribute_label}:{axis_value}"` text. An empty query matches all rows.
pub fn matches_search(row: &ProductRow, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query_lower = query.to_lowercase();
    if row.identifier.to_lowercase().contains(&query_lower) {
        return true;
    }
    if row.label.to_lowercase().contains(&query_lower) {
        return true;
    }
    row.axes
        .iter()
        .any(|axis| axis.display_text().to_lowercase().contains(&query_lower))
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// Annotate rows with `matches` / `visible` for `query`, keeping their order.
///
/// A matching row makes every ancestor visible. The upward walk stops at the
/// first ancestor that is already visible: its own chain has been marked
/// already, and the same check ends the walk on cyclic parent chains.
pub fn annotate_rows(rows: &[&ProductRow], query: &str) -> Vec<AnnotatedRow> {
    if query.is_empty() {
        return rows
            .iter()
            .map(|row| AnnotatedRow {
                row: (*row).clone(),
                matches: true,
                visible: true,
            })
            .collect();
    }

    let mut annotated: Vec<AnnotatedRow> = rows
        .iter()
        .map(|row| AnnotatedRow {
            row: (*row).clone(),
            matches: matches_search(row, query),
            visible: false,
        })
        .collect();

    let mut position_by_id: HashMap<&str, usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        position_by_id.entry(row.identifier.as_str()).or_insert(i);
    }

    for i in 0..annotated.len() {
        if !annotated[i].matches {
            continue;
        }
        annotated[i].visible = true;

        let mut parent = rows[i].parent.as_deref();
        while let Some(parent_id) = parent {
            let Some(&pos) = position_by_id.get(parent_id) else {
                break;
            };
            if annotated[pos].visible {
                break;
            }
            annotated[pos].visible = true;
            parent = rows[pos].parent.as_deref();
        }
    }

    annotated
}

// ---------------------------------------------------------------------------
// Collapse filter
// ---------------------------------------------------------------------------

/// Drop variants of collapsed submodels and, while a query is active and
/// hidden rows are not requested, rows that are not visible. Order-preserving.
pub fn filter_rows(
    annotated: Vec<AnnotatedRow>,
    collapsed: &CollapsedSubmodels,
    show_hidden: bool,
    query: &str,
) -> Vec<AnnotatedRow> {
    let hide_invisible = !query.is_empty() && !show_hidden;
    annotated
        .into_iter()
        .filter(|row| {
            let in_collapsed = row.product_type == ProductType::Variant
                && row
                    .parent
                    .as_deref()
                    .is_some_and(|parent| collapsed.contains(parent));
            !in_collapsed && !(hide_invisible && !row.visible)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything the view can change that affects the final row sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewOptions {
    pub sort: TreeSort,
    pub query: String,
    pub show_hidden: bool,
    pub collapsed: CollapsedSubmodels,
}

/// Index, annotate and filter `rows` for the given view options.
pub fn compute_rows(rows: &[ProductRow], options: &ViewOptions) -> Vec<AnnotatedRow> {
    let sort = options.sort;
    let compare = move |a: &ProductRow, b: &ProductRow| sort.compare(a, b);
    let ordered = build_tree_order(rows, Some(&compare));
    let annotated = annotate_rows(&ordered, &options.query);
    filter_rows(
        annotated,
        &options.collapsed,
        options.show_hidden,
        &options.query,
    )
}

// ---------------------------------------------------------------------------
// Root helpers
// ---------------------------------------------------------------------------

/// Identifier of the first row without a parent.
pub fn get_root_identifier(rows: &[ProductRow]) -> Result<&str, TreeError> {
    rows.iter()
        .find(|row| row.is_root())
        .map(|row| row.identifier.as_str())
        .ok_or(TreeError::RootNotFound)
}

/// Label of the first row without a parent, or `""`.
pub fn get_root_label(rows: &[ProductRow]) -> &str {
    rows.iter()
        .find(|row| row.is_root())
        .map(|row| row.label.as_str())
        .unwrap_or("")
}

/// Identifiers of all submodel rows, in data order.
pub fn submodel_ids(rows: &[ProductRow]) -> Vec<String> {
    rows.iter()
        .filter(|row| row.product_type == ProductType::Submodel)
        .map(|row| row.identifier.clone())
        .collect()
}

/// Identifiers that at least one row names as its parent.
pub fn parents_with_children(rows: &[ProductRow]) -> HashSet<&str> {
    rows.iter().filter_map(|row| row.parent.as_deref()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
