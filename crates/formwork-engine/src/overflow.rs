/*
 * overflow.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Overflow pagination.
//!
//! A section can only fit so many rows; the overflow paginator detects a
//! collection longer than the section's capacity and partitions the rest
//! into addendum pages. Each page gets a derived data context — a shallow
//! copy of the request data with the page's chunk under a reserved key and
//! the addendum bookkeeping fields — for the rendering layer to treat like
//! any other request.

use serde_json::{Map, Value};
use tracing::warn;

use formwork_mapping::{Diagnostics, Strategies};
use formwork_model::OverflowSpec;

use crate::output::AddendumPage;

/// Reserved key the page's overflow chunk lands under.
pub const OVERFLOW_ITEMS_KEY: &str = "overflowItems";
/// Marker distinguishing addendum contexts from primary requests.
pub const IS_ADDENDUM_KEY: &str = "isAddendum";
/// 1-based page number within this overflow spec's addenda.
pub const ADDENDUM_PAGE_NUMBER_KEY: &str = "addendumPageNumber";
/// Total addendum pages for this overflow spec (constant across pages).
pub const TOTAL_ADDENDUM_PAGES_KEY: &str = "totalAddendumPages";

/// Paginate one overflow spec against the request data.
///
/// No overflow (collection missing, not a list, or within capacity)
/// yields no pages. `itemsPerOverflowPage <= 0` puts the entire overflow
/// on a single page.
pub fn paginate(
    strategies: &Strategies,
    spec: &OverflowSpec,
    data: &Value,
    diagnostics: &mut Diagnostics,
) -> Vec<AddendumPage> {
    let items = match strategies.evaluate(spec.mapping_type, &spec.array_path, data) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!(
                array_path = spec.array_path.as_str(),
                "overflow array path is not a collection; skipping overflow"
            );
            diagnostics.warn(format!(
                "overflow array path {:?} is not a collection",
                spec.array_path
            ));
            return Vec::new();
        }
        None => return Vec::new(),
    };

    if items.len() <= spec.max_items_in_main {
        return Vec::new();
    }
    let overflow = &items[spec.max_items_in_main..];

    let chunk_size = if spec.items_per_overflow_page <= 0 {
        overflow.len()
    } else {
        spec.items_per_overflow_page as usize
    };
    let total_pages = overflow.len().div_ceil(chunk_size);

    overflow
        .chunks(chunk_size)
        .enumerate()
        .map(|(index, chunk)| AddendumPage {
            template_path: spec.addendum_template_path.clone(),
            context: derived_context(data, chunk, index + 1, total_pages),
        })
        .collect()
}

/// Build one page's data context: shallow copy of the request data plus
/// the reserved addendum keys.
fn derived_context(data: &Value, chunk: &[Value], page_number: usize, total_pages: usize) -> Value {
    let mut context = match data {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    context.insert(
        OVERFLOW_ITEMS_KEY.to_string(),
        Value::Array(chunk.to_vec()),
    );
    context.insert(IS_ADDENDUM_KEY.to_string(), Value::Bool(true));
    context.insert(ADDENDUM_PAGE_NUMBER_KEY.to_string(), page_number.into());
    context.insert(TOTAL_ADDENDUM_PAGES_KEY.to_string(), total_pages.into());
    Value::Object(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_model::MappingType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spec(max_main: usize, per_page: i64) -> OverflowSpec {
        OverflowSpec {
            array_path: "$.dependents".to_string(),
            mapping_type: MappingType::JsonPath,
            max_items_in_main: max_main,
            items_per_overflow_page: per_page,
            addendum_template_path: "forms/dependents-addendum.pdf".to_string(),
        }
    }

    fn data(count: usize) -> Value {
        let dependents: Vec<Value> = (0..count).map(|i| json!({"index": i})).collect();
        json!({"planId": "gold", "dependents": dependents})
    }

    #[test]
    fn test_overflow_math() {
        let strategies = Strategies::new();
        let mut diagnostics = Diagnostics::new();
        // 8 items, 3 in main, 2 per page: 5 overflow => pages of 2, 2, 1.
        let pages = paginate(&strategies, &spec(3, 2), &data(8), &mut diagnostics);

        assert_eq!(pages.len(), 3);
        let sizes: Vec<usize> = pages
            .iter()
            .map(|p| p.context[OVERFLOW_ITEMS_KEY].as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.context[IS_ADDENDUM_KEY], json!(true));
            assert_eq!(page.context[ADDENDUM_PAGE_NUMBER_KEY], json!(i + 1));
            assert_eq!(page.context[TOTAL_ADDENDUM_PAGES_KEY], json!(3));
            // Shallow copy keeps the original request data around.
            assert_eq!(page.context["planId"], json!("gold"));
        }

        // The first overflow item is the fourth of the collection.
        assert_eq!(
            pages[0].context[OVERFLOW_ITEMS_KEY][0],
            json!({"index": 3})
        );
    }

    #[test]
    fn test_exact_capacity_is_no_overflow() {
        let strategies = Strategies::new();
        let mut diagnostics = Diagnostics::new();
        let pages = paginate(&strategies, &spec(3, 2), &data(3), &mut diagnostics);
        assert!(pages.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_nonpositive_page_size_is_one_page() {
        let strategies = Strategies::new();
        let mut diagnostics = Diagnostics::new();
        let pages = paginate(&strategies, &spec(2, 0), &data(9), &mut diagnostics);
        assert_eq!(pages.len(), 1);
        assert_eq!(
            pages[0].context[OVERFLOW_ITEMS_KEY].as_array().unwrap().len(),
            7
        );
        assert_eq!(pages[0].context[TOTAL_ADDENDUM_PAGES_KEY], json!(1));
    }

    #[test]
    fn test_missing_collection_is_no_overflow() {
        let strategies = Strategies::new();
        let mut diagnostics = Diagnostics::new();
        let pages = paginate(
            &strategies,
            &spec(3, 2),
            &json!({"planId": "gold"}),
            &mut diagnostics,
        );
        assert!(pages.is_empty());
    }

    #[test]
    fn test_non_list_path_warns() {
        let strategies = Strategies::new();
        let mut diagnostics = Diagnostics::new();
        let mut bad = spec(3, 2);
        bad.array_path = "$.planId".to_string();
        let pages = paginate(&strategies, &bad, &data(8), &mut diagnostics);
        assert!(pages.is_empty());
        assert!(!diagnostics.is_empty());
    }
}
