//! WebAssembly module for the BASP marketplace web client
//!
//! Provides client-side computation for:
//! - Distance display between the visitor and a business
//! - Star weight preview while a review is being written
//! - Pagination descriptors for locally paged lists
//! - Rating breakdowns for cached review counts

use rust_decimal::prelude::ToPrimitive;
use wasm_bindgen::prelude::*;

use shared::geo;
use shared::pagination::PaginationMeta;
use shared::scoring::{self, DiscountTier, RatingBreakdown};

/// Great-circle distance in kilometres between two coordinates
#[wasm_bindgen]
pub fn distance_km(
    latitude_a: f64,
    longitude_a: f64,
    latitude_b: f64,
    longitude_b: f64,
) -> Result<f64, JsValue> {
    distance_between(latitude_a, longitude_a, latitude_b, longitude_b)
        .map_err(|e| JsValue::from_str(&e))
}

/// Weight a review would add to the business's total star
#[wasm_bindgen]
pub fn review_star_weight(rating: i32, discount: Option<i32>) -> Result<f64, JsValue> {
    star_weight_preview(rating, discount).map_err(|e| JsValue::from_str(&e))
}

/// Whether `discount` is one of the tiers a review may carry
#[wasm_bindgen]
pub fn is_valid_discount_tier(discount: i32) -> bool {
    DiscountTier::try_from(discount).is_ok()
}

/// Pagination descriptor as JSON, shaped like the API's `pagination` field
#[wasm_bindgen]
pub fn pagination_meta(current_page: u32, limit: u32, total_data: u32) -> Result<String, JsValue> {
    pagination_json(current_page, limit, total_data).map_err(|e| JsValue::from_str(&e))
}

/// Rating breakdown JSON from a `[[star, count], ...]` array
#[wasm_bindgen]
pub fn rating_breakdown(counts_json: &str) -> Result<String, JsValue> {
    rating_breakdown_json(counts_json).map_err(|e| JsValue::from_str(&e))
}

fn distance_between(
    latitude_a: f64,
    longitude_a: f64,
    latitude_b: f64,
    longitude_b: f64,
) -> Result<f64, String> {
    let a = shared::validate_coordinates(Some(latitude_a), Some(longitude_a))
        .map_err(|e| e.to_string())?;
    let b = shared::validate_coordinates(Some(latitude_b), Some(longitude_b))
        .map_err(|e| e.to_string())?;

    match (a, b) {
        (Some(a), Some(b)) => Ok(geo::haversine_km(a, b)),
        _ => Err("both coordinates are required".to_string()),
    }
}

fn star_weight_preview(rating: i32, discount: Option<i32>) -> Result<f64, String> {
    if !(1..=5).contains(&rating) {
        return Err("rating must be between 1 and 5".to_string());
    }
    if let Some(discount) = discount {
        DiscountTier::try_from(discount)?;
    }

    scoring::star_weight(rating, discount)
        .to_f64()
        .ok_or_else(|| "weight out of range".to_string())
}

fn pagination_json(current_page: u32, limit: u32, total_data: u32) -> Result<String, String> {
    if limit == 0 {
        return Err("limit must be at least 1".to_string());
    }
    let meta = PaginationMeta::new(current_page.max(1), limit, u64::from(total_data));
    meta.ensure_in_bounds().map_err(|e| e.to_string())?;
    serde_json::to_string(&meta).map_err(|e| e.to_string())
}

fn rating_breakdown_json(counts_json: &str) -> Result<String, String> {
    let counts: Vec<(i32, i64)> =
        serde_json::from_str(counts_json).map_err(|e| format!("Invalid counts JSON: {}", e))?;
    serde_json::to_string(&RatingBreakdown::from_counts(counts)).map_err(|e| e.to_string())
}
