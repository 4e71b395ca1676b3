//! Descriptors the map frontend needs to render a selected style: the tile
//! layer options, concrete tile URLs, and the popup stylesheet.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::MapStyle;

pub const TILE_LAYER_MAX_ZOOM: u8 = 18;
pub const TILE_SIZE: u32 = 512;

/// 1x1 transparent PNG shown in place of tiles that fail to load.
pub const ERROR_TILE_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayerOptions {
    pub attribution: String,
    pub max_zoom: u8,
    pub tile_size: u32,
    pub zoom_offset: i8,
    pub cross_origin: bool,
    pub error_tile_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    pub url: String,
    pub options: TileLayerOptions,
}

impl TileLayer {
    pub fn for_style(style: &MapStyle) -> Self {
        Self {
            url: style.url.clone(),
            options: TileLayerOptions {
                attribution: style.attribution.clone(),
                max_zoom: TILE_LAYER_MAX_ZOOM,
                tile_size: TILE_SIZE,
                // 512px tiles cover what a 256px tile covers one zoom level up.
                zoom_offset: -1,
                cross_origin: true,
                error_tile_url: ERROR_TILE_URL.to_string(),
            },
        }
    }
}

/// Fills a tile URL template. `{s}` always resolves to the `a` subdomain and
/// `{r}` (the retina suffix) to nothing. Unknown placeholders are left alone.
pub fn expand_tile_url(template: &str, zoom: f64, x: u32, y: u32) -> String {
    let mut values: HashMap<&str, String> = HashMap::new();
    values.insert("s", "a".to_string());
    values.insert("z", zoom.to_string());
    values.insert("x", x.to_string());
    values.insert("y", y.to_string());
    values.insert("r", String::new());

    let mut url = template.to_string();
    for (key, value) in &values {
        url = url.replace(&format!("{{{key}}}"), value);
    }
    url
}

/// Leaflet popup stylesheet for `style`.
pub fn popup_css(style: &MapStyle) -> String {
    let popup = &style.popup_style;
    format!(
        ".leaflet-popup-content-wrapper {{
  background: {background};
  color: {text};
  border: 1px solid {border};
  box-shadow: {shadow};
  border-radius: 0.5rem;
  padding: 0;
}}
.leaflet-popup-content {{
  margin: 0;
  min-width: 200px;
}}
.leaflet-popup-tip {{
  background: {background};
  border: 1px solid {border};
}}
",
        background = popup.background,
        text = popup.text,
        border = popup.border,
        shadow = popup.shadow,
    )
}
