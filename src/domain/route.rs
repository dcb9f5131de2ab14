// Route domain models
use super::geometry::Coordinate;
use serde::{Deserialize, Serialize};

pub const METERS_TO_MILES: f64 = 0.000_621_371_2;

/// Turn-by-turn text stops growing once it reaches this many characters.
pub const MAX_DIRECTIONS_CHARS: usize = 940;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionRequest {
    pub origin: String,
    pub destination: String,
}

impl DirectionRequest {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub path_index: i64,
    #[serde(default)]
    pub distance_meters: f64,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub name: String,
    pub distance_meters: f64,
    pub travel_time_seconds: f64,
    pub steps: Vec<RouteStep>,
    pub polyline: Vec<Coordinate>,
}

impl RouteSummary {
    pub fn distance_miles(&self) -> f64 {
        meters_to_miles(self.distance_meters)
    }

    pub fn travel_minutes(&self) -> i64 {
        (self.travel_time_seconds / 60.0).round() as i64
    }

    /// Numbered step lines, skipping zero-length steps and cut short with
    /// an ellipsis before the text passes [`MAX_DIRECTIONS_CHARS`].
    pub fn turn_by_turn(&self) -> String {
        let mut text = String::new();
        let mut length = 0;

        for step in &self.steps {
            if step.distance_meters == 0.0 || !step.distance_meters.is_finite() {
                continue;
            }

            let separator = if text.is_empty() { "" } else { "\n" };
            let line = format!(
                "{}{}. {} mi: {}",
                separator,
                step.path_index,
                meters_to_miles(step.distance_meters),
                step.instructions
            );
            let line_length = line.chars().count();

            if length + line_length > MAX_DIRECTIONS_CHARS {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(ELLIPSIS);
                break;
            }
            text.push_str(&line);
            length += line_length;
        }

        text
    }
}

/// Miles rounded to two decimals.
pub fn meters_to_miles(meters: f64) -> f64 {
    ((meters * METERS_TO_MILES + f64::EPSILON) * 100.0).round() / 100.0
}
