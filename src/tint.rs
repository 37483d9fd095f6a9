use std::collections::HashMap;

use crate::product::ProductRow;

/// Display tints handed out to variation-axis attributes, in order.
pub const AXIS_TINT_PALETTE: [&str; 11] = [
    "green",
    "dark_blue",
    "purple",
    "dark_purple",
    "yellow",
    "red",
    "forest_green",
    "hot_pink",
    "coral_red",
    "orange",
    "chocolate",
];

/// Attribute code to palette slot, assigned in first-seen order across a
/// whole dataset. Rebuild it when the dataset changes.
#[derive(Clone, Debug, Default)]
pub struct AxisTints {
    slots: HashMap<String, usize>,
}

impl AxisTints {
    pub fn from_rows(rows: &[ProductRow]) -> Self {
        let mut slots = HashMap::new();
        let mut next_index = 0;

        for row in rows {
            for axis in &row.axes {
                if !slots.contains_key(&axis.attribute_code) {
                    slots.insert(
                        axis.attribute_code.clone(),
                        next_index % AXIS_TINT_PALETTE.len(),
                    );
                    next_index += 1;
                }
            }
        }

        Self { slots }
    }

    /// Palette index for `attribute_code`; unseen codes get slot 0.
    pub fn index(&self, attribute_code: &str) -> usize {
        self.slots.get(attribute_code).copied().unwrap_or(0)
    }

    pub fn tint(&self, attribute_code: &str) -> &'static str {
        AXIS_TINT_PALETTE[self.index(attribute_code)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{axis, make_simple_tree, row};
    use crate::product::ProductType;

    #[test]
    fn test_first_seen_codes_get_consecutive_slots() {
        let tints = AxisTints::from_rows(&make_simple_tree());
        // submodel carries color, fabric; variant carries size
        assert_eq!(tints.index("color"), 0);
        assert_eq!(tints.index("fabric"), 1);
        assert_eq!(tints.index("size"), 2);
        assert_eq!(tints.tint("fabric"), "dark_blue");
    }

    #[test]
    fn test_repeated_code_keeps_first_assignment() {
        let mut first = row(ProductType::Submodel, "a", Some("root"));
        first.axes = vec![axis("color", "Color", "Red")];
        let mut second = row(ProductType::Submodel, "b", Some("root"));
        second.axes = vec![axis("size", "Size", "S"), axis("color", "Color", "Blue")];

        let tints = AxisTints::from_rows(&[first, second]);
        assert_eq!(tints.index("color"), 0);
        assert_eq!(tints.index("size"), 1);
    }

    #[test]
    fn test_unknown_code_defaults_to_first_tint() {
        let tints = AxisTints::from_rows(&make_simple_tree());
        assert_eq!(tints.index("weight"), 0);
        assert_eq!(tints.tint("weight"), "green");
        assert_eq!(AxisTints::default().tint("color"), "green");
    }

    #[test]
    fn test_assignment_wraps_past_palette_size() {
        let mut r = row(ProductType::Variant, "v", Some("sub"));
        r.axes = (0..AXIS_TINT_PALETTE.len() + 2)
            .map(|i| axis(&format!("code_{}", i), "Label", "Value"))
            .collect();

        let tints = AxisTints::from_rows(&[r]);
        assert_eq!(tints.index("code_10"), 10);
        assert_eq!(tints.index("code_11"), 0);
        assert_eq!(tints.index("code_12"), 1);
    }
}
