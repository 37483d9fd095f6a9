use serde::{Deserialize, Serialize};

/// Number of rows at which the data source may have capped the dataset.
/// Reaching it only triggers a notice; every loaded row is still shown.
pub const ROW_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// ProductType
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Model,
    Submodel,
    Variant,
}

impl ProductType {
    /// Return the string representation matching the serde serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Model => "model",
            ProductType::Submodel => "submodel",
            ProductType::Variant => "variant",
        }
    }

    /// Depth of this product type in a well-formed catalog tree.
    pub fn depth(&self) -> usize {
        match self {
            ProductType::Model => 0,
            ProductType::Submodel => 1,
            ProductType::Variant => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Axis / VariantCompletion
// ---------------------------------------------------------------------------

/// One dimension of variation, e.g. `color` / `Color` / `Red`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Axis {
    /// Absent in some exports; an empty code shares the first tint slot.
    #[serde(default)]
    pub attribute_code: String,
    pub attribute_label: String,
    pub axis_value: String,
}

impl Axis {
    /// The `"{attribute_label}:{axis_value}"` text used both for display and
    /// for search matching.
    pub fn display_text(&self) -> String {
        format!("{}:{}", self.attribute_label, self.axis_value)
    }
}

/// Completion summary of the variants below a model or submodel.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariantCompletion {
    pub total: u32,
    pub complete: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionLevel {
    Danger,
    Warning,
    Primary,
}

impl VariantCompletion {
    pub fn level(&self) -> CompletionLevel {
        if self.complete == 0 {
            CompletionLevel::Danger
        } else if self.complete == self.total {
            CompletionLevel::Primary
        } else {
            CompletionLevel::Warning
        }
    }

    /// Format as the `complete/total` badge text.
    pub fn badge(&self) -> String {
        format!("{}/{}", self.complete, self.total)
    }
}

// ---------------------------------------------------------------------------
// ProductRow
// ---------------------------------------------------------------------------

/// One node of the catalog tree as delivered by the data source.
///
/// Rows reference their parent by identifier; the tree is never materialised
/// as owned pointers.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProductRow {
    pub product_type: ProductType,
    pub identifier: String,
    pub technical_id: String,
    pub label: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub axes: Vec<Axis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_variant_products: Option<VariantCompletion>,
}

impl ProductRow {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

// ---------------------------------------------------------------------------
// AnnotatedRow
// ---------------------------------------------------------------------------

/// A row together with its search flags for one query.
///
/// `matches` is a direct hit on the query; `visible` is a hit or an ancestor
/// of one. Both are `true` when no query is active. Never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedRow {
    pub row: ProductRow,
    pub matches: bool,
    pub visible: bool,
}

impl std::ops::Deref for AnnotatedRow {
    type Target = ProductRow;

    fn deref(&self) -> &ProductRow {
        &self.row
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{make_model, make_submodel, make_variant};

    #[test]
    fn test_product_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ProductType::Submodel).unwrap(),
            "\"submodel\""
        );
        assert_eq!(ProductType::Variant.as_str(), "variant");
        assert_eq!(ProductType::Model.depth(), 0);
    }

    #[test]
    fn test_deserialize_row_from_source_json() {
        let raw = r#"{
            "product_type": "submodel",
            "identifier": "tshirt_classic_white_cotton",
            "technical_id": "2",
            "label": "Classic T-Shirt White Cotton",
            "image": "https://example.com/submodel.jpg",
            "parent": "tshirt_classic",
            "axes": [
                {"attribute_code": "color", "attribute_label": "Color", "axis_value": "White"}
            ],
            "complete_variant_products": {"total": 24, "complete": 11}
        }"#;
        let row: ProductRow = serde_json::from_str(raw).unwrap();
        assert_eq!(row.product_type, ProductType::Submodel);
        assert_eq!(row.parent.as_deref(), Some("tshirt_classic"));
        assert_eq!(row.axes[0].display_text(), "Color:White");
        assert_eq!(
            row.complete_variant_products,
            Some(VariantCompletion {
                total: 24,
                complete: 11
            })
        );
    }

    #[test]
    fn test_deserialize_axes_without_attribute_code() {
        let raw = r#"[{
            "product_type": "submodel",
            "identifier": "tshirt_classic_red",
            "technical_id": "2",
            "label": "Classic T-Shirt Red",
            "image": "https://picsum.photos/seed/tshirt_classic_red/200/200",
            "parent": "tshirt_classic",
            "complete_variant_products": {"total": 4, "complete": 1},
            "axes": [{"attribute_label": "Color", "axis_value": "Red"}]
        }]"#;
        let rows: Vec<ProductRow> = serde_json::from_str(raw).unwrap();
        assert_eq!(rows[0].axes[0].attribute_code, "");
        assert_eq!(rows[0].axes[0].display_text(), "Color:Red");
        assert_eq!(crate::tint::AxisTints::from_rows(&rows).index(""), 0);
    }

    #[test]
    fn test_deserialize_root_with_null_parent_and_no_axes() {
        let raw = r#"{
            "product_type": "model",
            "identifier": "root",
            "technical_id": "1",
            "label": "Root",
            "image": "",
            "parent": null
        }"#;
        let row: ProductRow = serde_json::from_str(raw).unwrap();
        assert!(row.is_root());
        assert!(row.axes.is_empty());
        assert!(row.complete_variant_products.is_none());
    }

    #[test]
    fn test_variant_serializes_without_optional_fields() {
        let json = serde_json::to_value(make_variant()).unwrap();
        assert!(json.get("complete_variant_products").is_none());
        assert_eq!(json["parent"], "tshirt_classic_white_cotton");
    }

    #[test]
    fn test_completion_level_and_badge() {
        let none = VariantCompletion {
            total: 10,
            complete: 0,
        };
        let some = VariantCompletion {
            total: 10,
            complete: 4,
        };
        let all = VariantCompletion {
            total: 10,
            complete: 10,
        };
        assert_eq!(none.level(), CompletionLevel::Danger);
        assert_eq!(some.level(), CompletionLevel::Warning);
        assert_eq!(all.level(), CompletionLevel::Primary);
        assert_eq!(some.badge(), "4/10");
    }

    #[test]
    fn test_annotated_row_derefs_to_product_row() {
        let annotated = AnnotatedRow {
            row: make_model(),
            matches: true,
            visible: true,
        };
        assert_eq!(annotated.identifier, "tshirt_classic");
        assert!(make_submodel().parent.is_some());
    }
}
