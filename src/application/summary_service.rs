// Summary service - Turns a route into the final chat payload
use crate::application::media::{ImageHost, SnapshotFetcher};
use crate::domain::error::PipelineError;
use crate::domain::payload::{DESTINATION_FIELD, DisplayPayload, FOOTER, ORIGIN_FIELD, title_case};
use crate::domain::route::{DirectionRequest, RouteSummary};
use crate::domain::snapshot::SnapshotRequest;
use crate::infrastructure::credentials::MapKitCredentials;
use crate::infrastructure::request_signer::snapshot_url;
use chrono::Utc;
use std::sync::Arc;

const MAPS_APP_URL: &str = "http://maps.apple.com/";

#[derive(Clone)]
pub struct SummaryService {
    credentials: Arc<MapKitCredentials>,
    snapshot_host: String,
    snapshots: Arc<dyn SnapshotFetcher>,
    images: Arc<dyn ImageHost>,
}

impl SummaryService {
    pub fn new(
        credentials: Arc<MapKitCredentials>,
        snapshot_host: String,
        snapshots: Arc<dyn SnapshotFetcher>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            credentials,
            snapshot_host,
            snapshots,
            images,
        }
    }

    /// Fill `payload` with distance, time, directions and a hosted map image.
    ///
    /// Only geometry and signing failures are returned; snapshot and upload
    /// problems leave the payload without an image.
    pub async fn build_summary(
        &self,
        payload: &mut DisplayPayload,
        request: &DirectionRequest,
        route: &RouteSummary,
    ) -> Result<(), PipelineError> {
        let origin = label(payload, ORIGIN_FIELD, &request.origin);
        let destination = label(payload, DESTINATION_FIELD, &request.destination);

        // Geometry first so a bad polyline aborts before the payload changes.
        let snapshot = SnapshotRequest::for_route(&route.polyline)?;
        let image_request = snapshot_url(&self.snapshot_host, &snapshot, &self.credentials);

        payload.title = format!("{} to {}", route.name, destination);
        payload.description = String::new();
        payload.add_field("Distance", format!("{} mi", route.distance_miles()), true);
        payload.add_field("Travel Time", format!("{} min", route.travel_minutes()), true);
        payload.add_field("Directions", route.turn_by_turn(), false);

        let maps_link = maps_deep_link(&origin, &destination);
        match self.snapshots.fetch_snapshot(&image_request).await {
            Ok(()) => match self.images.upload_url(&image_request).await {
                Ok(link) => {
                    tracing::info!("Snapshot hosted at {}", link);
                    payload.description =
                        format!("[Open in Maps]({}) or [View Full Image]({})", maps_link, link);
                    payload.image_url = Some(link);
                }
                Err(e) => {
                    tracing::warn!("Posting summary without image: {}", e.user_message());
                    payload.description = format!("[Open in Maps]({})", maps_link);
                }
            },
            Err(e) => {
                tracing::warn!("Posting summary without image: {}", e.user_message());
                payload.description = e.user_message();
            }
        }

        payload.footer = Some(FOOTER.to_string());
        payload.timestamp = Some(Utc::now());
        Ok(())
    }
}

fn label(payload: &DisplayPayload, field: &str, fallback: &str) -> String {
    payload
        .field(field)
        .map(str::to_string)
        .unwrap_or_else(|| title_case(fallback))
}

/// Link that opens driving directions in the native maps app.
pub fn maps_deep_link(origin: &str, destination: &str) -> String {
    format!(
        "{}?saddr={}&daddr={}&dirflg=d",
        MAPS_APP_URL,
        urlencoding::encode(origin),
        urlencoding::encode(destination)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geometry::Coordinate;
    use crate::domain::route::RouteStep;
    use crate::infrastructure::credentials::test_credentials;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeSnapshots {
        result: Result<(), PipelineError>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SnapshotFetcher for FakeSnapshots {
        async fn fetch_snapshot(&self, url: &str) -> Result<(), PipelineError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.result.clone()
        }
    }

    struct FakeImages {
        result: Result<String, PipelineError>,
    }

    #[async_trait]
    impl ImageHost for FakeImages {
        async fn upload_url(&self, _url: &str) -> Result<String, PipelineError> {
            self.result.clone()
        }
    }

    fn service(
        snapshot: Result<(), PipelineError>,
        upload: Result<String, PipelineError>,
    ) -> (SummaryService, Arc<FakeSnapshots>) {
        let snapshots = Arc::new(FakeSnapshots {
            result: snapshot,
            requested: Mutex::new(Vec::new()),
        });
        let service = SummaryService::new(
            Arc::new(test_credentials()),
            "https://snapshot.example.com".to_string(),
            snapshots.clone(),
            Arc::new(FakeImages { result: upload }),
        );
        (service, snapshots)
    }

    fn seattle_to_portland() -> RouteSummary {
        RouteSummary {
            name: "I-5 S".to_string(),
            distance_meters: 280_000.0,
            travel_time_seconds: 10_170.0,
            steps: vec![
                RouteStep {
                    path_index: 1,
                    distance_meters: 1_609.344,
                    instructions: "Head south on 4th Ave".to_string(),
                },
                RouteStep {
                    path_index: 2,
                    distance_meters: 278_390.656,
                    instructions: "Merge onto I-5 S".to_string(),
                },
            ],
            polyline: vec![
                Coordinate::new(47.6062, -122.3321),
                Coordinate::new(46.7298, -122.9007),
                Coordinate::new(45.5152, -122.6784),
            ],
        }
    }

    fn request() -> DirectionRequest {
        DirectionRequest::new("Seattle", "Portland")
    }

    #[tokio::test]
    async fn test_end_to_end_summary() {
        let (service, snapshots) = service(Ok(()), Ok("https://i.imgur.com/abc.png".to_string()));
        let mut payload = DisplayPayload::placeholder("Seattle", "Portland");

        service
            .build_summary(&mut payload, &request(), &seattle_to_portland())
            .await
            .unwrap();

        assert_eq!(payload.title, "I-5 S to Portland");
        assert_eq!(payload.field("Distance"), Some("173.98 mi"));
        assert_eq!(payload.field("Travel Time"), Some("170 min"));
        assert_eq!(
            payload.field("Directions"),
            Some("1. 1 mi: Head south on 4th Ave\n2. 172.98 mi: Merge onto I-5 S")
        );
        assert_eq!(payload.image_url.as_deref(), Some("https://i.imgur.com/abc.png"));
        assert_eq!(
            payload.description,
            "[Open in Maps](http://maps.apple.com/?saddr=Seattle&daddr=Portland&dirflg=d) \
             or [View Full Image](https://i.imgur.com/abc.png)"
        );
        assert_eq!(payload.footer.as_deref(), Some(FOOTER));
        assert!(payload.timestamp.is_some());

        let requested = snapshots.requested.lock().unwrap();
        assert_eq!(requested.len(), 1);
        assert!(requested[0].starts_with("https://snapshot.example.com/api/v1/snapshot?center="));
        assert!(requested[0].contains("&signature="));
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_text() {
        let (service, _) = service(
            Err(PipelineError::SnapshotError("403 Forbidden".to_string())),
            Ok("unused".to_string()),
        );
        let mut payload = DisplayPayload::placeholder("Seattle", "Portland");

        service
            .build_summary(&mut payload, &request(), &seattle_to_portland())
            .await
            .unwrap();

        assert!(payload.image_url.is_none());
        assert_eq!(payload.description, "Snapshot request failed: 403 Forbidden");
        assert_eq!(payload.field("Distance"), Some("173.98 mi"));
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_maps_link() {
        let (service, _) = service(
            Ok(()),
            Err(PipelineError::UploadError("rate limited".to_string())),
        );
        let mut payload = DisplayPayload::placeholder("new york", "boston");

        service
            .build_summary(&mut payload, &DirectionRequest::new("new york", "boston"), &seattle_to_portland())
            .await
            .unwrap();

        assert!(payload.image_url.is_none());
        assert_eq!(
            payload.description,
            "[Open in Maps](http://maps.apple.com/?saddr=New%20York&daddr=Boston&dirflg=d)"
        );
    }

    #[tokio::test]
    async fn test_invalid_geometry_aborts() {
        let (service, snapshots) = service(Ok(()), Ok("unused".to_string()));
        let mut route = seattle_to_portland();
        route.polyline[0] = Coordinate::new(f64::NAN, -122.0);
        let mut payload = DisplayPayload::placeholder("Seattle", "Portland");

        let err = service
            .build_summary(&mut payload, &request(), &route)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::InvalidCoordinate(_)));
        assert!(snapshots.requested.lock().unwrap().is_empty());
        assert_eq!(payload.title, "Directions");
    }
}
