//! Map style selection: scores a catalog of tile styles against a viewing
//! context and returns the best fit together with the metrics behind it.

pub mod api;
pub mod catalog;
pub mod color;
pub mod initializer;
pub mod prefetch;
pub mod presentation;
pub mod presets;
pub mod selector;

pub use catalog::{CatalogLoadError, InvalidCatalog, MapStyle, PopupStyle, StyleCatalog};
pub use initializer::{initialize_map, MapInitialization, MapInitializer};
pub use prefetch::{HttpTilePrefetcher, NoopPrefetcher, TilePrefetcher};
pub use selector::{
    evaluate_style, score_metrics, select_optimal_style, MapConfig, MapPurpose, SelectionResult,
    StyleMetrics, StyleScore, ViewportSize,
};
