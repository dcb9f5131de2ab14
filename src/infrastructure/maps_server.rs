// Apple Maps Server API route provider
use crate::application::route_provider::RouteProvider;
use crate::domain::error::PipelineError;
use crate::domain::geometry::Coordinate;
use crate::domain::route::{RouteStep, RouteSummary};
use crate::infrastructure::credentials::{MapKitCredentials, TOKEN_TTL_SECS, mint_auth_token};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://maps-api.apple.com";

#[derive(Debug, Clone)]
pub struct MapsServerProvider {
    client: reqwest::Client,
    credentials: Arc<MapKitCredentials>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessToken {
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<ServerRoute>,
    #[serde(default)]
    steps: Vec<ServerStep>,
    #[serde(default)]
    step_paths: Vec<Vec<Coordinate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerRoute {
    #[serde(default)]
    name: String,
    distance_meters: f64,
    duration_seconds: f64,
    #[serde(default)]
    step_indexes: Vec<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerStep {
    step_path_index: usize,
    #[serde(default)]
    distance_meters: f64,
    #[serde(default)]
    instructions: String,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl MapsServerProvider {
    pub fn new(client: reqwest::Client, credentials: Arc<MapKitCredentials>, base_url: &str) -> Self {
        Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn access_token(&self) -> Result<String, PipelineError> {
        let jwt = mint_auth_token(&self.credentials, TOKEN_TTL_SECS)?;
        let response = self
            .client
            .get(format!("{}/v1/token", self.base_url))
            .bearer_auth(jwt)
            .send()
            .await
            .map_err(provider_error)?;

        let token: AccessToken = read_json(response).await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl RouteProvider for MapsServerProvider {
    async fn fetch_route(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<RouteSummary, PipelineError> {
        let access_token = self.access_token().await?;

        tracing::debug!("Requesting directions: {} -> {}", origin, destination);
        let response = self
            .client
            .get(format!("{}/v1/directions", self.base_url))
            .bearer_auth(access_token)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("transportType", "Automobile"),
                ("requestsAlternateRoutes", "false"),
            ])
            .send()
            .await
            .map_err(provider_error)?;

        let directions: DirectionsResponse = read_json(response).await?;
        route_from_response(directions)
    }
}

fn provider_error(e: reqwest::Error) -> PipelineError {
    PipelineError::ProviderError(e.without_url().to_string())
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, PipelineError> {
    let status = response.status();
    let text = response.text().await.map_err(provider_error)?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorPayload>(&text) {
            Ok(payload) => PipelineError::ProviderError(payload.error.message),
            Err(_) => {
                tracing::error!("Maps API returned {}: {}", status, text);
                PipelineError::ProviderError(format!("Maps API returned {}", status))
            }
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!("Failed to parse Maps API response: {}. Body: {}", e, text);
        PipelineError::ProviderError(format!("malformed Maps API response: {}", e))
    })
}

/// First route, with its steps and the concatenation of their paths.
fn route_from_response(mut directions: DirectionsResponse) -> Result<RouteSummary, PipelineError> {
    if directions.routes.is_empty() {
        return Err(PipelineError::NoRouteFound);
    }
    let route = directions.routes.swap_remove(0);

    let mut steps = Vec::with_capacity(route.step_indexes.len());
    let mut polyline: Vec<Coordinate> = Vec::new();

    for &index in &route.step_indexes {
        let step = directions.steps.get(index).ok_or_else(|| {
            PipelineError::ProviderError(format!("route references missing step {}", index))
        })?;

        if let Some(path) = directions.step_paths.get(step.step_path_index) {
            for point in path {
                if polyline.last() != Some(point) {
                    polyline.push(*point);
                }
            }
        }

        steps.push(RouteStep {
            path_index: step.step_path_index as i64,
            distance_meters: step.distance_meters,
            instructions: step.instructions.clone(),
        });
    }

    Ok(RouteSummary {
        name: route.name,
        distance_meters: route.distance_meters,
        travel_time_seconds: route.duration_seconds,
        steps,
        polyline,
    })
}
