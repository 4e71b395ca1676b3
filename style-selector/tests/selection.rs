use proptest::prelude::*;
use style_selector::color::{contrast_ratio, Rgb};
use style_selector::{
    evaluate_style, select_optimal_style, InvalidCatalog, MapConfig, MapPurpose, StyleCatalog,
};

fn arb_purpose() -> impl Strategy<Value = MapPurpose> {
    prop_oneof![
        Just(MapPurpose::Community),
        Just(MapPurpose::Navigation),
        Just(MapPurpose::Analytics),
    ]
}

/// Configs whose zoom lies inside a non-empty `[min, max]` range.
fn arb_config() -> impl Strategy<Value = MapConfig> {
    (0.0f64..10.0, 0.5f64..12.0, 1u32..4096, 1u32..4096, arb_purpose()).prop_flat_map(
        |(min_zoom, span, width, height, purpose)| {
            let max_zoom = min_zoom + span;
            (min_zoom..=max_zoom).prop_map(move |current_zoom| {
                MapConfig::new(current_zoom)
                    .with_zoom_bounds(min_zoom, max_zoom)
                    .with_viewport(width, height)
                    .with_purpose(purpose)
            })
        },
    )
}

fn arb_rgb() -> impl Strategy<Value = Rgb> {
    (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| Rgb::new(r, g, b))
}

proptest! {
    #[test]
    fn selected_style_comes_from_catalog(config in arb_config()) {
        let catalog = StyleCatalog::default();
        let result = select_optimal_style(&catalog, &config).expect("selection");

        prop_assert!(catalog.get(&result.style_id).is_some());
        prop_assert_eq!(&result.style.id, &result.style_id);
        prop_assert!((0.0..=100.0).contains(&result.score.total));
    }

    #[test]
    fn evaluation_is_deterministic(config in arb_config()) {
        let catalog = StyleCatalog::default();
        for style in &catalog {
            prop_assert_eq!(evaluate_style(style, &config), evaluate_style(style, &config));
        }
    }

    #[test]
    fn metrics_stay_in_documented_ranges(config in arb_config()) {
        let catalog = StyleCatalog::default();
        for style in &catalog {
            let metrics = evaluate_style(style, &config);
            prop_assert!(metrics.contrast_ratio.is_finite());
            prop_assert!(metrics.contrast_ratio >= 1.0);
            prop_assert!(metrics.feature_visibility <= 100);
            prop_assert!((0.0..=100.0).contains(&metrics.readability_score));
        }
    }

    #[test]
    fn readability_is_monotonic_in_zoom(
        config in arb_config(),
        step in 0.0f64..5.0,
    ) {
        let catalog = StyleCatalog::default();
        let style = catalog.get("standard").expect("standard style");
        let higher = MapConfig { current_zoom: config.current_zoom + step, ..config };

        let low = evaluate_style(style, &config).readability_score;
        let high = evaluate_style(style, &higher).readability_score;
        prop_assert!(high >= low);
    }

    #[test]
    fn contrast_is_symmetric_and_at_least_one(a in arb_rgb(), b in arb_rgb()) {
        let forward = contrast_ratio(a, b);
        prop_assert_eq!(forward, contrast_ratio(b, a));
        prop_assert!(forward >= 1.0);
        prop_assert!(forward.is_finite());
    }
}

#[test]
fn readability_is_exact_at_zoom_bounds() {
    let catalog = StyleCatalog::default();
    let style = catalog.get("terrain").expect("terrain style");

    let at_min = MapConfig::new(3.0).with_zoom_bounds(3.0, 15.0);
    let at_max = MapConfig::new(15.0).with_zoom_bounds(3.0, 15.0);

    assert_eq!(evaluate_style(style, &at_min).readability_score, 0.0);
    assert_eq!(evaluate_style(style, &at_max).readability_score, 100.0);
}

#[test]
fn community_scenario_is_deterministic() {
    let config = MapConfig::new(10.0)
        .with_zoom_bounds(2.0, 18.0)
        .with_viewport(1024, 768)
        .with_purpose(MapPurpose::Community);

    let first = select_optimal_style(&StyleCatalog::default(), &config).expect("selection");
    let second = select_optimal_style(&StyleCatalog::default(), &config).expect("selection");

    assert_eq!(first, second);
    assert_eq!(first.style_id, "standard");
    assert_eq!(first.metrics.load_time_ms, 800);
    assert_eq!(first.metrics.feature_visibility, 80);
    assert_eq!(first.metrics.readability_score, 50.0);
    assert!(first.metrics.contrast_ratio >= 4.5);
}

#[test]
fn high_zoom_still_prefers_standard_over_dark() {
    // Both load in 800ms and pass the contrast gate; standard wins on
    // visibility.
    let config = MapConfig::new(18.0);
    let result = select_optimal_style(&StyleCatalog::default(), &config).expect("selection");
    assert_eq!(result.style_id, "standard");
    assert!((result.score.total - 85.0).abs() < 1e-9);
}

#[test]
fn without_standard_dark_is_selected() {
    let styles = StyleCatalog::default()
        .iter()
        .filter(|style| style.id != "standard")
        .cloned()
        .collect();
    let catalog = StyleCatalog::from_styles(styles);

    let result = select_optimal_style(&catalog, &MapConfig::new(10.0)).expect("selection");
    assert_eq!(result.style_id, "dark");
}

#[test]
fn equal_zoom_bounds_give_zero_readability() {
    let config = MapConfig::new(10.0).with_zoom_bounds(10.0, 10.0);
    let result = select_optimal_style(&StyleCatalog::default(), &config).expect("selection");

    assert_eq!(result.metrics.readability_score, 0.0);
    assert!(result.score.total.is_finite());
}

#[test]
fn empty_catalog_reports_invalid_catalog() {
    let catalog = StyleCatalog::from_styles(Vec::new());
    let err = select_optimal_style(&catalog, &MapConfig::new(10.0)).expect_err("empty catalog");
    assert_eq!(err, InvalidCatalog::Empty);
    assert_eq!(err.to_string(), "style catalog is empty");
}
