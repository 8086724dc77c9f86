// Wire models for the analysis service and the scan API

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Product-level verdict produced by the classification service and stored
/// with each scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductSafety {
    Safe,
    Neutral,
    Harmful,
    Unknown,
}

impl std::fmt::Display for ProductSafety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductSafety::Safe => write!(f, "SAFE"),
            ProductSafety::Neutral => write!(f, "NEUTRAL"),
            ProductSafety::Harmful => write!(f, "HARMFUL"),
            ProductSafety::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One recognised ingredient with the service's description of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub safety: String,
}

/// Ingredient breakdown attached to an analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientInfo {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub ingredients: Vec<IngredientEntry>,
}

/// Full response of the analysis endpoint.
///
/// Recommendations are passed through opaquely; the app stores and renders
/// them without interpreting their shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAnalysis {
    pub analysis_summary: String,
    pub ingredient_info: IngredientInfo,
    #[serde(default)]
    pub recommendations: Vec<serde_json::Value>,
    pub product_safety: ProductSafety,
}

/// A stored scan as returned by the scan API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: i64,
    pub image_path: String,
    pub result_summary: String,
    #[serde(default)]
    pub ingredient_info_json: Option<String>,
    #[serde(default)]
    pub recommendations_json: Option<String>,
    pub product_safety: ProductSafety,
    pub scanned_at: NaiveDateTime,
}

/// Payload for storing a completed scan.
#[derive(Debug, Clone)]
pub struct UploadScanRequest {
    pub user_id: i64,
    pub result_summary: String,
    pub ingredient_info: IngredientInfo,
    pub recommendations: Vec<serde_json::Value>,
    pub product_safety: ProductSafety,
    pub image: Vec<u8>,
    pub image_filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn decodes_an_analysis_response() {
        let body = serde_json::json!({
            "analysis_summary": "For OILY skin:\n - Good ingredients: niacinamide.\n",
            "ingredient_info": {
                "summary": "2 ingredients recognised",
                "ingredients": [
                    {"name": "niacinamide", "description": "Brightening agent", "safety": "Safe for most skin types"},
                    {"name": "alcohol denat", "description": "Solvent", "safety": "Harmful, can cause irritation"}
                ]
            },
            "recommendations": [{"product": "Gentle Cleanser"}],
            "product_safety": "NEUTRAL"
        });
        let analysis: ProductAnalysis = serde_json::from_value(body).unwrap();
        assert_eq!(analysis.product_safety, ProductSafety::Neutral);
        assert_eq!(analysis.ingredient_info.ingredients.len(), 2);
        assert_eq!(analysis.ingredient_info.ingredients[0].name, "niacinamide");
        assert_eq!(analysis.recommendations.len(), 1);
    }

    #[test]
    fn decodes_a_scan_record_with_api_field_names() {
        let body = serde_json::json!({
            "id": 12,
            "imagePath": "/uploads/scan-12.jpg",
            "resultSummary": "Mostly safe",
            "ingredientInfoJson": "{}",
            "recommendationsJson": "[]",
            "productSafety": "SAFE",
            "scannedAt": "2025-11-03T09:15:00"
        });
        let record: ScanRecord = serde_json::from_value(body).unwrap();
        assert_eq!(record.id, 12);
        assert_eq!(record.product_safety, ProductSafety::Safe);
        assert_eq!(record.image_path, "/uploads/scan-12.jpg");
        assert_eq!(record.scanned_at.year(), 2025);
    }

    #[test]
    fn safety_display_matches_the_wire_format() {
        assert_eq!(ProductSafety::Harmful.to_string(), "HARMFUL");
        let parsed: ProductSafety = serde_json::from_str("\"UNKNOWN\"").unwrap();
        assert_eq!(parsed, ProductSafety::Unknown);
    }
}
