// Route geometry - map center, viewport span and polyline thinning
use super::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Extra room around the farthest route point.
pub const SPAN_MARGIN: f64 = 2.5;

/// Keep one point out of this many when drawing the route overlay.
pub const DECIMATION_STRIDE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.latitude.is_finite() && self.longitude.is_finite() {
            Ok(())
        } else {
            Err(PipelineError::InvalidCoordinate(format!(
                "{},{}",
                self.latitude, self.longitude
            )))
        }
    }
}

/// Renders as `lat,lng`, the form the snapshot service expects.
impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub lat: f64,
    pub lng: f64,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapViewport {
    pub center: Coordinate,
    pub span: Span,
}

impl MapViewport {
    pub fn for_polyline(polyline: &[Coordinate]) -> Result<Self, PipelineError> {
        let center = compute_center(polyline)?;
        let span = compute_span(center, polyline)?;
        Ok(Self { center, span })
    }
}

fn endpoints(polyline: &[Coordinate]) -> Result<(Coordinate, Coordinate), PipelineError> {
    match (polyline.first(), polyline.last()) {
        (Some(first), Some(last)) => Ok((*first, *last)),
        _ => Err(PipelineError::InvalidCoordinate(
            "route polyline is empty".to_string(),
        )),
    }
}

/// Great-circle midpoint between the first and last polyline points.
pub fn compute_center(polyline: &[Coordinate]) -> Result<Coordinate, PipelineError> {
    let (origin, destination) = endpoints(polyline)?;
    origin.validate()?;
    destination.validate()?;

    let d_lng = (destination.longitude - origin.longitude).to_radians();
    let lat1 = origin.latitude.to_radians();
    let lat2 = destination.latitude.to_radians();
    let lng1 = origin.longitude.to_radians();

    let b_x = lat2.cos() * d_lng.cos();
    let b_y = lat2.cos() * d_lng.sin();
    let lat3 = (lat1.sin() + lat2.sin()).atan2(((lat1.cos() + b_x).powi(2) + b_y * b_y).sqrt());
    let lng3 = lng1 + b_y.atan2(lat1.cos() + b_x);

    Ok(Coordinate::new(lat3.to_degrees(), lng3.to_degrees()))
}

/// Largest latitude/longitude deviation from `center` over the whole
/// polyline, widened by [`SPAN_MARGIN`].
pub fn compute_span(center: Coordinate, polyline: &[Coordinate]) -> Result<Span, PipelineError> {
    center.validate()?;
    endpoints(polyline)?;

    let mut farthest_lat: f64 = 0.0;
    let mut farthest_lng: f64 = 0.0;
    for point in polyline {
        point.validate()?;
        farthest_lat = farthest_lat.max((center.latitude - point.latitude).abs());
        farthest_lng = farthest_lng.max((center.longitude - point.longitude).abs());
    }

    Ok(Span {
        lat: farthest_lat * SPAN_MARGIN,
        lng: farthest_lng * SPAN_MARGIN,
    })
}

/// Every [`DECIMATION_STRIDE`]-th point by index, plus the last point if
/// the stride skipped it.
pub fn decimate(polyline: &[Coordinate]) -> Vec<Coordinate> {
    if polyline.is_empty() {
        return Vec::new();
    }

    let mut kept: Vec<Coordinate> = polyline
        .iter()
        .step_by(DECIMATION_STRIDE)
        .copied()
        .collect();

    let last = polyline.len() - 1;
    if last % DECIMATION_STRIDE != 0 {
        kept.push(polyline[last]);
    }
    kept
}

/// Drops repeated points, keeping the first occurrence of each.
pub fn dedup_points(points: &[Coordinate]) -> Vec<Coordinate> {
    let mut seen = HashSet::new();
    points
        .iter()
        .filter(|p| seen.insert(p.to_string()))
        .copied()
        .collect()
}
