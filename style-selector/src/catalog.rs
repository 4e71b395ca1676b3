use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::color::parse_color;

/// Id of the style used as the fallback selection.
pub const DEFAULT_STYLE_ID: &str = "standard";

pub const CATALOG_PATH_ENV: &str = "STYLE_SELECTOR_CATALOG_PATH";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupStyle {
    pub background: String,
    pub text: String,
    pub border: String,
    pub shadow: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStyle {
    pub id: String,
    pub name: String,
    /// Tile URL template with `{s}`, `{z}`, `{x}`, `{y}` and optional `{r}`
    /// placeholders.
    pub url: String,
    pub attribution: String,
    pub popup_style: PopupStyle,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidCatalog {
    #[error("style catalog is empty")]
    Empty,
    #[error("style at position {index} has a blank id")]
    BlankId { index: usize },
    #[error("duplicate style id: {id}")]
    DuplicateId { id: String },
    #[error("style {style_id}: invalid {field} color {value:?}")]
    MalformedColor {
        style_id: String,
        field: &'static str,
        value: String,
    },
    #[error("style {style_id}: missing popup {field}")]
    MissingField {
        style_id: String,
        field: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("config directory unavailable")]
    MissingConfigDir,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] InvalidCatalog),
}

/// Ordered set of map styles. Iteration follows insertion order, which is
/// also the tie-break order used during selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleCatalog {
    styles: Vec<MapStyle>,
}

impl StyleCatalog {
    /// Wraps `styles` without validating them. Selection validates before
    /// scoring, so an invalid catalog is reported there.
    pub fn from_styles(styles: Vec<MapStyle>) -> Self {
        Self { styles }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MapStyle> {
        self.styles.iter()
    }

    pub fn get(&self, id: &str) -> Option<&MapStyle> {
        self.styles.iter().find(|style| style.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.styles.iter().map(|style| style.id.as_str()).collect()
    }

    /// The "standard" style when present, otherwise the first entry.
    pub fn default_style(&self) -> Option<&MapStyle> {
        self.get(DEFAULT_STYLE_ID).or_else(|| self.styles.first())
    }

    pub fn validate(&self) -> Result<(), InvalidCatalog> {
        if self.styles.is_empty() {
            return Err(InvalidCatalog::Empty);
        }

        let mut seen = HashSet::with_capacity(self.styles.len());
        for (index, style) in self.styles.iter().enumerate() {
            if style.id.trim().is_empty() {
                return Err(InvalidCatalog::BlankId { index });
            }
            if !seen.insert(style.id.as_str()) {
                return Err(InvalidCatalog::DuplicateId {
                    id: style.id.clone(),
                });
            }
            validate_popup(style)?;
        }

        Ok(())
    }

    pub fn load() -> Result<Self, CatalogLoadError> {
        let path = get_catalog_path()?;
        Self::load_from_path(path)
    }

    /// Reads a JSON array of styles. A missing file yields the built-in
    /// catalog.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogLoadError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let catalog: StyleCatalog = serde_json::from_str(&contents)?;
                catalog.validate()?;
                tracing::debug!(
                    path = %path.display(),
                    styles = catalog.len(),
                    "loaded style catalog"
                );
                Ok(catalog)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no catalog file, using built-in styles");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), CatalogLoadError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::from_styles(builtin_styles())
    }
}

impl<'a> IntoIterator for &'a StyleCatalog {
    type Item = &'a MapStyle;
    type IntoIter = std::slice::Iter<'a, MapStyle>;

    fn into_iter(self) -> Self::IntoIter {
        self.styles.iter()
    }
}

pub fn get_catalog_path() -> Result<PathBuf, CatalogLoadError> {
    if let Ok(custom) = env::var(CATALOG_PATH_ENV) {
        return Ok(PathBuf::from(custom));
    }
    let base = config_dir().ok_or(CatalogLoadError::MissingConfigDir)?;
    Ok(base.join("style-selector").join("styles.json"))
}

fn validate_popup(style: &MapStyle) -> Result<(), InvalidCatalog> {
    let popup = &style.popup_style;

    for (field, value) in [("background", &popup.background), ("text", &popup.text)] {
        if value.trim().is_empty() {
            return Err(InvalidCatalog::MissingField {
                style_id: style.id.clone(),
                field,
            });
        }
        if parse_color(value).is_err() {
            return Err(InvalidCatalog::MalformedColor {
                style_id: style.id.clone(),
                field,
                value: value.clone(),
            });
        }
    }

    for (field, value) in [("border", &popup.border), ("shadow", &popup.shadow)] {
        if value.trim().is_empty() {
            return Err(InvalidCatalog::MissingField {
                style_id: style.id.clone(),
                field,
            });
        }
    }

    Ok(())
}

const OSM_ATTRIBUTION: &str = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";
const ESRI_ATTRIBUTION: &str = "&copy; Esri &mdash; Source: Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community";
const STAMEN_ATTRIBUTION: &str = "Map tiles by <a href=\"http://stamen.com\">Stamen Design</a>, under <a href=\"http://creativecommons.org/licenses/by/3.0\">CC BY 3.0</a>. Data by <a href=\"http://openstreetmap.org\">OpenStreetMap</a>, under <a href=\"http://creativecommons.org/licenses/by-sa/3.0\">CC BY SA</a>.";
const STADIA_ATTRIBUTION: &str = "&copy; <a href=\"https://stadiamaps.com/\">Stadia Maps</a>, &copy; <a href=\"https://openmaptiles.org/\">OpenMapTiles</a> &copy; <a href=\"http://openstreetmap.org\">OpenStreetMap</a> contributors";

const LIGHT_SHADOW: &str = "0 4px 6px -1px rgba(0, 0, 0, 0.1)";
const HEAVY_SHADOW: &str = "0 10px 15px -3px rgba(0, 0, 0, 0.5)";

fn style(
    id: &str,
    name: &str,
    url: &str,
    attribution: &str,
    [background, text, border, shadow]: [&str; 4],
) -> MapStyle {
    MapStyle {
        id: id.to_string(),
        name: name.to_string(),
        url: url.to_string(),
        attribution: attribution.to_string(),
        popup_style: PopupStyle {
            background: background.to_string(),
            text: text.to_string(),
            border: border.to_string(),
            shadow: shadow.to_string(),
        },
    }
}

fn builtin_styles() -> Vec<MapStyle> {
    vec![
        style(
            "standard",
            "Standard",
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            OSM_ATTRIBUTION,
            ["#FFFFFF", "#1D3640", "#E2E8F0", LIGHT_SHADOW],
        ),
        style(
            "satellite",
            "Satellite",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            ESRI_ATTRIBUTION,
            ["rgba(0, 0, 0, 0.8)", "#FFFFFF", "#374151", HEAVY_SHADOW],
        ),
        style(
            "terrain",
            "Terrain",
            "https://stamen-tiles.a.ssl.fastly.net/terrain/{z}/{x}/{y}.png",
            STAMEN_ATTRIBUTION,
            ["#F0FDF4", "#166534", "#BBF7D0", LIGHT_SHADOW],
        ),
        style(
            "dark",
            "Dark",
            "https://tiles.stadiamaps.com/tiles/alidade_smooth_dark/{z}/{x}/{y}{r}.png",
            STADIA_ATTRIBUTION,
            ["#1F2937", "#F3F4F6", "#374151", HEAVY_SHADOW],
        ),
        style(
            "hybrid",
            "Hybrid",
            "https://tiles.stadiamaps.com/tiles/osm_bright/{z}/{x}/{y}{r}.png",
            STADIA_ATTRIBUTION,
            ["#EEF2FF", "#3730A3", "#C7D2FE", LIGHT_SHADOW],
        ),
    ]
}
