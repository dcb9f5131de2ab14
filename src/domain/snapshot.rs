// Static map snapshot request
use super::error::PipelineError;
use super::geometry::{Coordinate, MapViewport, decimate, dedup_points};
use serde_json::{Map, Value, json};

const COLOR_SCHEME: &str = "light";
const ZOOM: u32 = 13;
const LINE_WIDTH: u32 = 2;
const ANNOTATION_COLOR: &str = "449944";

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRequest {
    pub viewport: MapViewport,
    /// Unordered for rendering; kept in first-seen order so URLs are stable.
    pub overlay_points: Vec<Coordinate>,
    /// Always the unthinned route's first and last points.
    pub annotations: (Coordinate, Coordinate),
}

impl SnapshotRequest {
    pub fn for_route(polyline: &[Coordinate]) -> Result<Self, PipelineError> {
        let viewport = MapViewport::for_polyline(polyline)?;
        let (start, end) = match (polyline.first(), polyline.last()) {
            (Some(start), Some(end)) => (*start, *end),
            _ => {
                return Err(PipelineError::InvalidCoordinate(
                    "route polyline is empty".to_string(),
                ));
            }
        };

        Ok(Self {
            viewport,
            overlay_points: dedup_points(&decimate(polyline)),
            annotations: (start, end),
        })
    }

    /// Query parameters in the order they are signed.
    pub fn parameters(&self) -> Map<String, Value> {
        let points: Vec<String> = self.overlay_points.iter().map(|p| p.to_string()).collect();
        let (start, end) = self.annotations;

        let mut params = Map::new();
        params.insert("center".into(), json!(self.viewport.center.to_string()));
        params.insert("colorScheme".into(), json!(COLOR_SCHEME));
        params.insert("z".into(), json!(ZOOM));
        params.insert("spn".into(), json!(self.viewport.span.to_string()));
        params.insert(
            "overlays".into(),
            json!([{ "points": points, "lineWidth": LINE_WIDTH }]),
        );
        params.insert(
            "annotations".into(),
            json!([
                { "point": start.to_string(), "color": ANNOTATION_COLOR, "glyphText": "A" },
                { "point": end.to_string(), "color": ANNOTATION_COLOR, "glyphText": "B" },
            ]),
        );
        params
    }
}
