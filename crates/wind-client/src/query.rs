//! Query-string parameters for the two endpoints.

use overlay_cache::OverlayQuery;

pub type QueryParams = Vec<(&'static str, String)>;

fn bounds_params(query: &OverlayQuery) -> QueryParams {
    vec![
        ("north", query.bounds.north.to_string()),
        ("south", query.bounds.south.to_string()),
        ("east", query.bounds.east.to_string()),
        ("west", query.bounds.west.to_string()),
    ]
}

/// `GET /wind?north&south&east&west&zoom_level[&datetime_str]`
pub fn wind_params(query: &OverlayQuery) -> QueryParams {
    let mut params = bounds_params(query);
    params.push(("zoom_level", query.zoom_level.to_string()));
    if let Some(slice) = &query.time_slice {
        params.push(("datetime_str", slice.to_query_param()));
    }
    params
}

/// `GET /wind-recommendations?north&south&east&west[&datetime_str]&include_unknown`
pub fn recommendation_params(query: &OverlayQuery, include_unknown: bool) -> QueryParams {
    let mut params = bounds_params(query);
    if let Some(slice) = &query.time_slice {
        params.push(("datetime_str", slice.to_query_param()));
    }
    params.push(("include_unknown", include_unknown.to_string()));
    params
}
