//! Named map presets pairing a catalog style with marker options.

use serde::{Deserialize, Serialize};

use crate::catalog::{MapStyle, StyleCatalog};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    Pins,
    Photos,
    Custom,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmap: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_size: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetOptions {
    pub marker_style: MarkerStyle,
    pub enable_clustering: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_options: Option<CustomOptions>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapPreset {
    pub id: u32,
    pub name: String,
    pub style: MapStyle,
    pub options: PresetOptions,
}

struct PresetSpec {
    id: u32,
    name: &'static str,
    style_id: &'static str,
    marker_style: MarkerStyle,
    enable_clustering: bool,
    custom_options: Option<CustomOptions>,
}

fn preset_specs() -> [PresetSpec; 5] {
    [
        PresetSpec {
            id: 1,
            name: "Standard View",
            style_id: "standard",
            marker_style: MarkerStyle::Pins,
            enable_clustering: false,
            custom_options: None,
        },
        PresetSpec {
            id: 2,
            name: "Satellite Clusters",
            style_id: "satellite",
            marker_style: MarkerStyle::Custom,
            enable_clustering: true,
            custom_options: None,
        },
        PresetSpec {
            id: 3,
            name: "Terrain Photos",
            style_id: "terrain",
            marker_style: MarkerStyle::Photos,
            enable_clustering: false,
            custom_options: None,
        },
        PresetSpec {
            id: 4,
            name: "Dark Analytics",
            style_id: "dark",
            marker_style: MarkerStyle::Custom,
            enable_clustering: false,
            custom_options: Some(CustomOptions {
                heatmap: Some(true),
                dark_mode: Some(true),
                dynamic_size: Some(true),
                ..CustomOptions::default()
            }),
        },
        PresetSpec {
            id: 5,
            name: "Interactive Hybrid",
            style_id: "hybrid",
            marker_style: MarkerStyle::Custom,
            enable_clustering: true,
            custom_options: Some(CustomOptions {
                animation: Some(true),
                ..CustomOptions::default()
            }),
        },
    ]
}

/// Resolves the stock presets against `catalog`, skipping any whose style the
/// catalog does not carry.
pub fn default_presets(catalog: &StyleCatalog) -> Vec<MapPreset> {
    preset_specs()
        .into_iter()
        .filter_map(|spec| {
            let Some(style) = catalog.get(spec.style_id) else {
                tracing::debug!(
                    preset = spec.name,
                    style = spec.style_id,
                    "style missing, skipping preset"
                );
                return None;
            };
            Some(MapPreset {
                id: spec.id,
                name: spec.name.to_string(),
                style: style.clone(),
                options: PresetOptions {
                    marker_style: spec.marker_style,
                    enable_clustering: spec.enable_clustering,
                    custom_options: spec.custom_options,
                },
            })
        })
        .collect()
}
