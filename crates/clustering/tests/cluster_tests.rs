//! Clustering properties over generated marker sets.

use std::collections::BTreeSet;

use clustering::{ClusterConfig, ClusterEngine, ClusterPolicy};
use overlay_common::{build_markers, EntityType, LatLng, MarkerId};
use test_utils::{diving_center_record, red_sea_sites, sites_in_a_row};

#[test]
fn test_five_close_markers_one_group_at_zoom_8() {
    let markers = build_markers(sites_in_a_row(1, LatLng::new(0.5, 10.0), 5, 8.0, 10.0));
    let groups = ClusterEngine::default().cluster(&markers, 8.0);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 5);
}

#[test]
fn test_five_close_markers_singletons_at_zoom_14() {
    let markers = build_markers(sites_in_a_row(1, LatLng::new(0.5, 10.0), 5, 8.0, 10.0));
    let groups = ClusterEngine::default().cluster(&markers, 14.0);

    assert_eq!(groups.len(), 5);
    assert!(groups.iter().all(|g| g.is_singleton()));
}

#[test]
fn test_membership_is_a_partition() {
    let mut records = sites_in_a_row(10, LatLng::new(0.5, 10.0), 20, 6.0, 17.0);
    records.extend(sites_in_a_row(100, LatLng::new(-3.0, 12.0), 20, 6.0, 33.0));
    records.extend(red_sea_sites());
    let markers = build_markers(records);
    let engine = ClusterEngine::default();

    for zoom in 0..=22 {
        let groups = engine.cluster(&markers, zoom as f64);
        let mut seen = BTreeSet::new();
        let mut total = 0;
        for group in &groups {
            assert!(!group.is_empty());
            for id in &group.member_ids {
                assert!(seen.insert(*id), "{} in two groups at zoom {}", id, zoom);
                total += 1;
            }
        }
        assert_eq!(total, markers.len());
    }
}

#[test]
fn test_deterministic() {
    let markers = build_markers(sites_in_a_row(1, LatLng::new(0.5, 10.0), 30, 7.0, 23.0));
    let engine = ClusterEngine::default();
    assert_eq!(engine.cluster(&markers, 7.0), engine.cluster(&markers, 7.0));
}

#[test]
fn test_layers_cluster_separately() {
    let mut records = sites_in_a_row(1, LatLng::new(0.5, 10.0), 3, 8.0, 5.0);
    records.push(diving_center_record(1, 0.5, 10.0));
    let markers = build_markers(records);

    let mut config = ClusterConfig::default();
    config.layers.insert(
        EntityType::DivingCenter,
        ClusterPolicy {
            radius_px: 50.0,
            disable_at_zoom: 6,
        },
    );
    let layers = ClusterEngine::new(config).cluster_layers(&markers, 8.0);

    let sites = &layers[&EntityType::DiveSite];
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].len(), 3);

    let centers = &layers[&EntityType::DivingCenter];
    assert_eq!(
        centers[0].member_ids,
        vec![MarkerId::new(EntityType::DivingCenter, 1)]
    );
}

#[test]
fn test_policy_from_yaml() {
    let yaml = r#"
default_policy:
  radius_px: 60
  disable_at_zoom: 13
layers:
  diving_center:
    disable_at_zoom: 11
"#;
    let config: ClusterConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.for_layer(EntityType::DiveSite).disable_at_zoom, 13);
    let centers = config.for_layer(EntityType::DivingCenter);
    assert_eq!(centers.disable_at_zoom, 11);
    assert_eq!(centers.radius_px, 50.0);
}
