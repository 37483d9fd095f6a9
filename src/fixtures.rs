//! Row builders shared by the unit tests.

use crate::product::{AnnotatedRow, Axis, ProductRow, ProductType, VariantCompletion};

pub fn axis(code: &str, label: &str, value: &str) -> Axis {
    Axis {
        attribute_code: code.to_string(),
        attribute_label: label.to_string(),
        axis_value: value.to_string(),
    }
}

pub fn completion(total: u32, complete: u32) -> Option<VariantCompletion> {
    Some(VariantCompletion { total, complete })
}

pub fn make_model() -> ProductRow {
    ProductRow {
        product_type: ProductType::Model,
        identifier: "tshirt_classic".to_string(),
        technical_id: "1".to_string(),
        label: "Classic T-Shirt".to_string(),
        image: "https://example.com/model.jpg".to_string(),
        parent: None,
        axes: Vec::new(),
        complete_variant_products: completion(500, 277),
    }
}

pub fn make_submodel() -> ProductRow {
    ProductRow {
        product_type: ProductType::Submodel,
        identifier: "tshirt_classic_white_cotton".to_string(),
        technical_id: "2".to_string(),
        label: "Classic T-Shirt White Cotton".to_string(),
        image: "https://example.com/submodel.jpg".to_string(),
        parent: Some("tshirt_classic".to_string()),
        axes: vec![
            axis("color", "Color", "White"),
            axis("fabric", "Fabric", "Cotton"),
        ],
        complete_variant_products: completion(24, 11),
    }
}

pub fn make_variant() -> ProductRow {
    ProductRow {
        product_type: ProductType::Variant,
        identifier: "tshirt_classic_white_cotton_3xl".to_string(),
        technical_id: "3".to_string(),
        label: "Classic T-Shirt White Cotton 3XL".to_string(),
        image: "https://example.com/variant.jpg".to_string(),
        parent: Some("tshirt_classic_white_cotton".to_string()),
        axes: vec![axis("size", "Size", "3XL")],
        complete_variant_products: None,
    }
}

/// Minimal model -> submodel -> variant tree.
pub fn make_simple_tree() -> Vec<ProductRow> {
    vec![make_model(), make_submodel(), make_variant()]
}

/// Build a bare row of the given type under `parent`.
pub fn row(product_type: ProductType, identifier: &str, parent: Option<&str>) -> ProductRow {
    ProductRow {
        product_type,
        identifier: identifier.to_string(),
        technical_id: format!("tech_{}", identifier),
        label: identifier.to_string(),
        image: String::new(),
        parent: parent.map(str::to_string),
        axes: Vec::new(),
        complete_variant_products: None,
    }
}

/// Two submodels under one root; only the colour branch carries a
/// "Red Small" variant.
pub fn make_two_branch_tree() -> Vec<ProductRow> {
    let root = row(ProductType::Model, "root", None);

    let mut sub_color = row(ProductType::Submodel, "sub_color", Some("root"));
    sub_color.axes = vec![axis("color", "Color", "Red")];

    let mut variant_red_s = row(ProductType::Variant, "variant_red_s", Some("sub_color"));
    variant_red_s.label = "T-Shirt Red Small".to_string();
    variant_red_s.axes = vec![axis("size", "Size", "S")];

    let mut sub_fabric = row(ProductType::Submodel, "sub_fabric", Some("root"));
    sub_fabric.axes = vec![axis("fabric", "Fabric", "Cotton")];

    let mut variant_cotton_l = row(ProductType::Variant, "variant_cotton_l", Some("sub_fabric"));
    variant_cotton_l.label = "T-Shirt Cotton Large".to_string();
    variant_cotton_l.axes = vec![axis("size", "Size", "L")];

    vec![root, sub_color, variant_red_s, sub_fabric, variant_cotton_l]
}

pub fn ids<'a>(rows: &[&'a ProductRow]) -> Vec<&'a str> {
    rows.iter().map(|r| r.identifier.as_str()).collect()
}

pub fn annotated_ids(rows: &[AnnotatedRow]) -> Vec<&str> {
    rows.iter().map(|r| r.identifier.as_str()).collect()
}
