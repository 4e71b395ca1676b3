use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{InvalidCatalog, MapStyle, StyleCatalog};
use crate::prefetch::{NoopPrefetcher, TilePrefetcher};
use crate::presentation::expand_tile_url;
use crate::selector::{
    select_optimal_style, MapConfig, SelectionResult, StyleMetrics, StyleScore,
};

/// Upper bound on how long a caller should wait for a style to settle.
pub const MAX_SETTLE_DELAY_MS: u32 = 2000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInitialization {
    pub style_id: String,
    pub style: MapStyle,
    pub metrics: StyleMetrics,
    pub score: StyleScore,
    pub load_time_ms: u32,
}

impl MapInitialization {
    /// Simulated style-loading wait, capped at [`MAX_SETTLE_DELAY_MS`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.load_time_ms.min(MAX_SETTLE_DELAY_MS)))
    }
}

impl From<MapInitialization> for SelectionResult {
    fn from(init: MapInitialization) -> Self {
        Self {
            style_id: init.style_id,
            style: init.style,
            metrics: init.metrics,
            score: init.score,
        }
    }
}

/// Selects a style and warms the tile at `(0, 0)` for the current zoom. The
/// prefetch is handed off before returning and never influences the result.
pub fn initialize_map(
    catalog: &StyleCatalog,
    config: &MapConfig,
    prefetcher: &dyn TilePrefetcher,
) -> Result<MapInitialization, InvalidCatalog> {
    let selection = select_optimal_style(catalog, config)?;

    let tile_url = expand_tile_url(&selection.style.url, config.current_zoom, 0, 0);
    prefetcher.prefetch(&tile_url);

    Ok(MapInitialization {
        load_time_ms: selection.metrics.load_time_ms,
        style_id: selection.style_id,
        style: selection.style,
        metrics: selection.metrics,
        score: selection.score,
    })
}

/// Holds the catalog and prefetcher a caller initializes maps with.
#[derive(Clone)]
pub struct MapInitializer {
    catalog: StyleCatalog,
    prefetcher: Arc<dyn TilePrefetcher>,
}

impl MapInitializer {
    pub fn new(catalog: StyleCatalog, prefetcher: Arc<dyn TilePrefetcher>) -> Self {
        Self {
            catalog,
            prefetcher,
        }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn initialize_map(&self, config: &MapConfig) -> Result<MapInitialization, InvalidCatalog> {
        initialize_map(&self.catalog, config, self.prefetcher.as_ref())
    }

    /// Gives prefetches started by this initializer up to `timeout` to land.
    /// Short-lived callers use this before exiting.
    pub fn wait_for_prefetches(&self, timeout: Duration) -> bool {
        self.prefetcher.wait(timeout)
    }
}

impl Default for MapInitializer {
    fn default() -> Self {
        Self::new(StyleCatalog::default(), Arc::new(NoopPrefetcher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPrefetcher {
        urls: Mutex<Vec<String>>,
    }

    impl TilePrefetcher for RecordingPrefetcher {
        fn prefetch(&self, url: &str) {
            self.urls
                .lock()
                .expect("prefetch lock poisoned")
                .push(url.to_string());
        }
    }

    #[test]
    fn initialize_map_prefetches_origin_tile_of_selected_style() {
        let prefetcher = RecordingPrefetcher::default();
        let config = MapConfig::new(10.0);

        let init = initialize_map(&StyleCatalog::default(), &config, &prefetcher)
            .expect("initialize map");

        assert_eq!(init.style_id, "standard");
        assert_eq!(init.load_time_ms, init.metrics.load_time_ms);
        assert_eq!(
            *prefetcher.urls.lock().expect("prefetch lock poisoned"),
            vec!["https://a.tile.openstreetmap.org/10/0/0.png".to_string()]
        );
    }

    #[test]
    fn invalid_catalog_skips_prefetch() {
        let prefetcher = RecordingPrefetcher::default();
        let result = initialize_map(
            &StyleCatalog::from_styles(Vec::new()),
            &MapConfig::new(10.0),
            &prefetcher,
        );

        assert_eq!(result, Err(InvalidCatalog::Empty));
        assert!(prefetcher.urls.lock().expect("prefetch lock poisoned").is_empty());
    }

    #[test]
    fn settle_delay_is_capped() {
        let mut init = MapInitializer::default()
            .initialize_map(&MapConfig::new(10.0))
            .expect("initialize map");
        assert_eq!(init.settle_delay(), Duration::from_millis(800));

        init.load_time_ms = 4500;
        assert_eq!(init.settle_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn initializer_uses_injected_catalog() {
        let styles = StyleCatalog::default()
            .iter()
            .filter(|style| style.id == "dark")
            .cloned()
            .collect();
        let initializer =
            MapInitializer::new(StyleCatalog::from_styles(styles), Arc::new(NoopPrefetcher));

        let init = initializer
            .initialize_map(&MapConfig::new(4.0))
            .expect("initialize map");
        assert_eq!(init.style_id, "dark");
        assert_eq!(initializer.catalog().len(), 1);
        assert!(initializer.wait_for_prefetches(Duration::ZERO));
    }

    #[test]
    fn initialization_converts_back_to_selection() {
        let config = MapConfig::new(10.0);
        let init = MapInitializer::default()
            .initialize_map(&config)
            .expect("initialize map");
        let direct =
            select_optimal_style(&StyleCatalog::default(), &config).expect("select style");

        assert_eq!(SelectionResult::from(init), direct);
    }
}
