use anyhow::{Context, Result};
use tracing::info;

use crate::product::{ProductRow, ProductType};

/// Path of the edit page for `row`: products for variants, product models
/// for models and submodels.
pub fn get_row_url(row: &ProductRow) -> String {
    match row.product_type {
        ProductType::Variant => format!("/product/{}", row.technical_id),
        ProductType::Model | ProductType::Submodel => {
            format!("/product-model/{}", row.technical_id)
        }
    }
}

/// Absolute URL for `row` under `base_url`.
pub fn absolute_row_url(base_url: &str, row: &ProductRow) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), get_row_url(row))
}

/// Open `row` in the default browser.
pub fn open_row(base_url: &str, row: &ProductRow) -> Result<String> {
    let url = absolute_row_url(base_url, row);
    info!(%url, identifier = %row.identifier, "opening row");
    open::that(&url).with_context(|| format!("opening {}", url))?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{make_model, make_submodel, make_variant};

    #[test]
    fn test_get_row_url() {
        assert_eq!(get_row_url(&make_variant()), "/product/3");
        assert_eq!(get_row_url(&make_submodel()), "/product-model/2");
        assert_eq!(get_row_url(&make_model()), "/product-model/1");
    }

    #[test]
    fn test_absolute_row_url_trims_trailing_slash() {
        assert_eq!(
            absolute_row_url("https://pim.example.com/", &make_variant()),
            "https://pim.example.com/product/3"
        );
        assert_eq!(
            absolute_row_url("http://localhost:8080", &make_model()),
            "http://localhost:8080/product-model/1"
        );
    }
}
