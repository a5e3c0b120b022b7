//! Radius-based marker agglomeration.
//!
//! Markers are visited in input order. Each one joins the nearest existing
//! group whose centroid lies within the policy radius (in world pixels at the
//! current zoom bucket) or starts a new group. Centroids are running means of
//! member positions. The result depends only on the input order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_common::{zoom_bucket, LatLng, Marker, MarkerId};

use crate::config::{ClusterConfig, ClusterPolicy, LayerKind};
use crate::projection::{to_world_pixel, PixelPoint};

/// One render group. Every marker is in exactly one group per pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterGroup {
    pub centroid: LatLng,
    pub member_ids: Vec<MarkerId>,
}

impl ClusterGroup {
    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.member_ids.len() == 1
    }
}

struct GroupBuilder {
    lat_sum: f64,
    lng_sum: f64,
    members: Vec<MarkerId>,
    pixel: PixelPoint,
}

impl GroupBuilder {
    fn new(marker: &Marker, zoom: f64) -> Self {
        Self {
            lat_sum: marker.position.lat,
            lng_sum: marker.position.lng,
            members: vec![marker.id],
            pixel: to_world_pixel(&marker.position, zoom),
        }
    }

    fn centroid(&self) -> LatLng {
        let n = self.members.len() as f64;
        LatLng::new(self.lat_sum / n, self.lng_sum / n)
    }

    fn add(&mut self, marker: &Marker, zoom: f64) {
        self.lat_sum += marker.position.lat;
        self.lng_sum += marker.position.lng;
        self.members.push(marker.id);
        self.pixel = to_world_pixel(&self.centroid(), zoom);
    }

    fn build(self) -> ClusterGroup {
        ClusterGroup {
            centroid: self.centroid(),
            member_ids: self.members,
        }
    }
}

/// Groups markers for rendering according to per-layer policies.
#[derive(Debug, Clone, Default)]
pub struct ClusterEngine {
    config: ClusterConfig,
}

impl ClusterEngine {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Cluster a marker list with the default policy.
    pub fn cluster(&self, markers: &[Marker], zoom: f64) -> Vec<ClusterGroup> {
        cluster_with_policy(markers, zoom, &self.config.default_policy)
    }

    /// Cluster each layer separately with its own policy. Layers never share
    /// a group.
    pub fn cluster_layers(
        &self,
        markers: &[Marker],
        zoom: f64,
    ) -> BTreeMap<LayerKind, Vec<ClusterGroup>> {
        let mut by_layer: BTreeMap<LayerKind, Vec<Marker>> = BTreeMap::new();
        for marker in markers {
            by_layer
                .entry(marker.entity_type())
                .or_default()
                .push(marker.clone());
        }

        by_layer
            .into_iter()
            .map(|(layer, layer_markers)| {
                let policy = self.config.for_layer(layer);
                (layer, cluster_with_policy(&layer_markers, zoom, &policy))
            })
            .collect()
    }
}

/// Cluster `markers` at `zoom` under one policy.
pub fn cluster_with_policy(
    markers: &[Marker],
    zoom: f64,
    policy: &ClusterPolicy,
) -> Vec<ClusterGroup> {
    let bucket = zoom_bucket(zoom);

    if bucket >= policy.disable_at_zoom {
        return markers
            .iter()
            .map(|m| ClusterGroup {
                centroid: m.position,
                member_ids: vec![m.id],
            })
            .collect();
    }

    let z = bucket as f64;
    let mut groups: Vec<GroupBuilder> = Vec::new();

    for marker in markers {
        let pixel = to_world_pixel(&marker.position, z);

        let mut best: Option<(usize, f64)> = None;
        for (idx, group) in groups.iter().enumerate() {
            let d = pixel.distance(&group.pixel);
            if d > policy.radius_px {
                continue;
            }
            // Strict comparison: ties stay with the earlier group
            match best {
                Some((_, best_d)) if best_d <= d => {}
                _ => best = Some((idx, d)),
            }
        }

        match best {
            Some((idx, _)) => groups[idx].add(marker, z),
            None => groups.push(GroupBuilder::new(marker, z)),
        }
    }

    debug!(
        markers = markers.len(),
        groups = groups.len(),
        zoom_bucket = bucket,
        radius_px = policy.radius_px,
        "Clustered markers"
    );

    groups.into_iter().map(GroupBuilder::build).collect()
}
