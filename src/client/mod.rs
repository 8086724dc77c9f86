// HTTP clients for the two backends: the ingredient-analysis service and
// the scan API. Both are thin typed wrappers meant to run as coordinator
// work; credentials are passed in per call, never stored.

mod analysis;
mod models;
mod scans;

pub use analysis::{AnalysisClient, AnalysisError};
pub use models::{
    IngredientEntry, IngredientInfo, ProductAnalysis, ProductSafety, ScanRecord, UploadScanRequest,
};
pub use scans::ScanClient;
