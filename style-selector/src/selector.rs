//! Scores catalog styles against a viewing context and picks the winner.

use serde::{Deserialize, Serialize};

use crate::catalog::{InvalidCatalog, MapStyle, StyleCatalog};
use crate::color::{luminance_ratio, parse_color};

pub const DEFAULT_MIN_ZOOM: f64 = 2.0;
pub const DEFAULT_MAX_ZOOM: f64 = 18.0;

/// Contrast at or above this ratio earns the full contrast weight.
pub const CONTRAST_THRESHOLD: f64 = 4.5;

/// Load times at or beyond this budget contribute nothing.
pub const LOAD_TIME_BUDGET_MS: f64 = 2000.0;

const AXIS_WEIGHT: f64 = 25.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapPurpose {
    #[default]
    Community,
    Navigation,
    Analytics,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    pub current_zoom: f64,
    pub viewport_size: ViewportSize,
    pub map_purpose: MapPurpose,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl MapConfig {
    /// A config at `current_zoom` with the default zoom bounds, viewport and
    /// purpose.
    pub fn new(current_zoom: f64) -> Self {
        Self {
            current_zoom,
            viewport_size: ViewportSize::default(),
            map_purpose: MapPurpose::default(),
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }

    pub fn with_zoom_bounds(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_size = ViewportSize { width, height };
        self
    }

    pub fn with_purpose(mut self, purpose: MapPurpose) -> Self {
        self.map_purpose = purpose;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleMetrics {
    pub load_time_ms: u32,
    pub contrast_ratio: f64,
    pub feature_visibility: u8,
    pub readability_score: f64,
}

/// Weighted contribution of each axis. Every component lies in `[0, 25]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleScore {
    pub load_time: f64,
    pub contrast: f64,
    pub visibility: f64,
    pub readability: f64,
    pub total: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    pub style_id: String,
    pub style: MapStyle,
    pub metrics: StyleMetrics,
    pub score: StyleScore,
}

pub fn evaluate_style(style: &MapStyle, config: &MapConfig) -> StyleMetrics {
    StyleMetrics {
        load_time_ms: estimated_load_time_ms(&style.id),
        contrast_ratio: popup_contrast_ratio(style),
        feature_visibility: feature_visibility(&style.id),
        readability_score: readability_score(config),
    }
}

pub fn score_metrics(metrics: &StyleMetrics) -> StyleScore {
    let load_time =
        (1.0 - f64::from(metrics.load_time_ms) / LOAD_TIME_BUDGET_MS).max(0.0) * AXIS_WEIGHT;
    let contrast = if metrics.contrast_ratio >= CONTRAST_THRESHOLD {
        AXIS_WEIGHT
    } else {
        0.0
    };
    let visibility = f64::from(metrics.feature_visibility) / 100.0 * AXIS_WEIGHT;
    let readability = metrics.readability_score / 100.0 * AXIS_WEIGHT;

    StyleScore {
        load_time,
        contrast,
        visibility,
        readability,
        total: load_time + contrast + visibility + readability,
    }
}

/// Picks the highest-scoring style. Styles are visited in catalog order and
/// only a strictly greater total replaces the current best, so the earliest
/// of several equal scores wins.
pub fn select_optimal_style(
    catalog: &StyleCatalog,
    config: &MapConfig,
) -> Result<SelectionResult, InvalidCatalog> {
    catalog.validate()?;

    let mut best_score = -1.0;
    let mut best: Option<(&MapStyle, StyleMetrics, StyleScore)> = None;

    for style in catalog {
        let metrics = evaluate_style(style, config);
        let score = score_metrics(&metrics);
        tracing::trace!(style = %style.id, total = score.total, "scored style");

        if score.total > best_score {
            best_score = score.total;
            best = Some((style, metrics, score));
        }
    }

    let (style, metrics, score) = match best {
        Some(best) => best,
        None => {
            let style = catalog.default_style().ok_or(InvalidCatalog::Empty)?;
            let metrics = evaluate_style(style, config);
            (style, metrics, score_metrics(&metrics))
        }
    };

    tracing::debug!(
        style = %style.id,
        total = score.total,
        zoom = config.current_zoom,
        purpose = ?config.map_purpose,
        "selected map style"
    );

    Ok(SelectionResult {
        style_id: style.id.clone(),
        style: style.clone(),
        metrics,
        score,
    })
}

fn popup_contrast_ratio(style: &MapStyle) -> f64 {
    let popup = &style.popup_style;
    match (parse_color(&popup.background), parse_color(&popup.text)) {
        (Ok(background), Ok(text)) => {
            let ratio = luminance_ratio(background.luminance(), text.luminance());
            tracing::trace!(
                style = %style.id,
                %background,
                %text,
                ratio,
                "popup contrast"
            );
            ratio
        }
        (background, text) => {
            tracing::debug!(
                style = %style.id,
                background = ?background.err(),
                text = ?text.err(),
                "unparseable popup colors, treating contrast as minimal"
            );
            1.0
        }
    }
}

/// Zoom progress between the configured bounds, as a percentage. A zero or
/// inverted span reads as 0.
fn readability_score(config: &MapConfig) -> f64 {
    let span = config.max_zoom - config.min_zoom;
    if !(span.is_finite() && span > 0.0) {
        tracing::debug!(
            min_zoom = config.min_zoom,
            max_zoom = config.max_zoom,
            "degenerate zoom range, readability is 0"
        );
        return 0.0;
    }

    let progress = (config.current_zoom - config.min_zoom) / span;
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0) * 100.0
}

fn feature_visibility(style_id: &str) -> u8 {
    match style_id {
        "satellite" => 90,
        "terrain" => 85,
        "standard" => 80,
        "dark" => 75,
        _ => 70,
    }
}

fn estimated_load_time_ms(style_id: &str) -> u32 {
    match style_id {
        "satellite" => 1800,
        "terrain" => 1200,
        "hybrid" => 1500,
        _ => 800,
    }
}
