// MapKit JS route provider driven through a scripted DOM sandbox
use crate::application::route_provider::RouteProvider;
use crate::domain::error::PipelineError;
use crate::domain::geometry::Coordinate;
use crate::domain::route::{RouteStep, RouteSummary};
use crate::infrastructure::credentials::{MapKitCredentials, TOKEN_TTL_SECS, mint_auth_token};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub const MAPKIT_JS_URL: &str = "https://cdn.apple-mapkit.com/mk/5.x.x/mapkit.js";

const RUNNER: &str = include_str!("sandbox_runner.js");

/// Browser capabilities MapKit JS probes for but never really uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CapabilityStub {
    MatchMedia,
    CanvasContext,
}

/// A self-contained document plus the environment it must run in.
#[derive(Debug, Clone, Serialize)]
pub struct SandboxPage {
    pub html: String,
    pub url: String,
    pub referrer: String,
    pub stubs: Vec<CapabilityStub>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SandboxOutcome {
    Route { route: SandboxRoute },
    NoRoute,
    Error { message: String },
}

/// The slice of a MapKit JS `Route` the runner serializes back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxRoute {
    #[serde(default)]
    pub name: String,
    pub distance: f64,
    pub expected_travel_time: f64,
    #[serde(default)]
    pub steps: Vec<SandboxStep>,
    pub polyline: SandboxPolyline,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxStep {
    pub path_index: i64,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SandboxPolyline {
    pub points: Vec<Coordinate>,
}

impl From<SandboxRoute> for RouteSummary {
    fn from(route: SandboxRoute) -> Self {
        RouteSummary {
            name: route.name,
            distance_meters: route.distance,
            travel_time_seconds: route.expected_travel_time,
            steps: route
                .steps
                .into_iter()
                .map(|s| RouteStep {
                    path_index: s.path_index,
                    distance_meters: s.distance.unwrap_or(0.0),
                    instructions: s.instructions,
                })
                .collect(),
            polyline: route.polyline.points,
        }
    }
}

#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Execute `page` until it reports an outcome. May never return on a
    /// network stall.
    async fn run(&self, page: &SandboxPage) -> Result<SandboxOutcome, PipelineError>;
}

/// Runs pages under jsdom in a `node` child process.
#[derive(Debug, Clone)]
pub struct NodeScriptHost {
    node_binary: String,
}

impl NodeScriptHost {
    pub fn new(node_binary: impl Into<String>) -> Self {
        Self {
            node_binary: node_binary.into(),
        }
    }
}

#[async_trait]
impl ScriptHost for NodeScriptHost {
    async fn run(&self, page: &SandboxPage) -> Result<SandboxOutcome, PipelineError> {
        let input = serde_json::to_vec(page)
            .map_err(|e| PipelineError::ProviderError(format!("cannot encode sandbox page: {}", e)))?;

        let mut child = Command::new(&self.node_binary)
            .arg("-e")
            .arg(RUNNER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PipelineError::ProviderError(format!("cannot start {}: {}", self.node_binary, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .await
                .map_err(|e| PipelineError::ProviderError(format!("sandbox stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PipelineError::ProviderError(format!("sandbox failed: {}", e)))?;

        if !output.stderr.is_empty() {
            tracing::debug!("Sandbox stderr: {}", String::from_utf8_lossy(&output.stderr));
        }

        parse_outcome(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_outcome(stdout: &str) -> Result<SandboxOutcome, PipelineError> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| PipelineError::ProviderError("sandbox exited without an outcome".to_string()))?;

    serde_json::from_str(line)
        .map_err(|e| PipelineError::ProviderError(format!("unreadable sandbox outcome: {}", e)))
}

pub struct SandboxProvider<H: ScriptHost> {
    host: H,
    credentials: Arc<MapKitCredentials>,
}

impl<H: ScriptHost> SandboxProvider<H> {
    pub fn new(host: H, credentials: Arc<MapKitCredentials>) -> Self {
        Self { host, credentials }
    }

    /// Bootstrap document that initialises MapKit JS and requests one route.
    pub fn page(&self, token: &str, origin: &str, destination: &str) -> SandboxPage {
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<script src="{mapkit}"></script>
</head>
<body>
<div id="map"></div>
</body>
<script>
mapkit.init({{
  authorizationCallback: function (done) {{ done({token}) }}
}})

const directions = new mapkit.Directions()
directions.route({{
  origin: {origin},
  destination: {destination},
  transportType: mapkit.Directions.Transport.Automobile,
  requestsAlternateRoutes: false
}}, (error, data) => {{
  if (error) window.onRouteFailed(error)
  else if (data.routes.length === 0) window.onNoRoute()
  else window.onRouteFinalized(data.routes[0])
}})
</script>
</html>"#,
            mapkit = MAPKIT_JS_URL,
            token = script_literal(token),
            origin = script_literal(origin),
            destination = script_literal(destination),
        );

        SandboxPage {
            html,
            url: self.credentials.origin.clone(),
            referrer: self.credentials.origin.clone(),
            stubs: vec![CapabilityStub::MatchMedia, CapabilityStub::CanvasContext],
        }
    }
}

/// JSON string literal that cannot close the surrounding `<script>`.
fn script_literal(text: &str) -> String {
    serde_json::Value::from(text).to_string().replace("</", "<\\/")
}

#[async_trait]
impl<H: ScriptHost> RouteProvider for SandboxProvider<H> {
    async fn fetch_route(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<RouteSummary, PipelineError> {
        let token = mint_auth_token(&self.credentials, TOKEN_TTL_SECS)?;
        let page = self.page(&token, origin, destination);

        tracing::debug!("Running directions sandbox: {} -> {}", origin, destination);
        match self.host.run(&page).await? {
            SandboxOutcome::Route { route } => {
                tracing::info!("Route information received");
                Ok(route.into())
            }
            SandboxOutcome::NoRoute => Err(PipelineError::NoRouteFound),
            SandboxOutcome::Error { message } => Err(PipelineError::ProviderError(message)),
        }
    }
}

#[cfg(all(test, target_os = "linux"))]
mod node_host_tests {
    use super::*;
    use crate::infrastructure::credentials::test_credentials;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Duration;

    /// Executable shell script standing in for `node`.
    fn stub_node(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("magellan-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("node");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Running and not yet a zombie.
    fn is_running(pid: u32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .and_then(|rest| rest.split_whitespace().next())
                .is_some_and(|state| state != "Z" && state != "X"),
            Err(_) => false,
        }
    }

    #[tokio::test]
    async fn test_stdout_outcome_maps_to_no_route() {
        let node = stub_node(
            "no-route",
            r#"cat > /dev/null
echo 'mapkit loading'
echo '{"outcome":"noRoute"}'"#,
        );
        let provider = SandboxProvider::new(
            NodeScriptHost::new(node.to_string_lossy()),
            Arc::new(test_credentials()),
        );

        assert_eq!(
            provider.fetch_route("Seattle", "Portland").await.unwrap_err(),
            PipelineError::NoRouteFound
        );
    }

    #[tokio::test]
    async fn test_page_is_written_to_stdin() {
        let node = stub_node(
            "stdin",
            r#"if grep -q '"url":"https://maps.example.org/"'; then
  echo '{"outcome":"error","message":"page received"}'
fi"#,
        );
        let host = NodeScriptHost::new(node.to_string_lossy());
        let provider = SandboxProvider::new(host.clone(), Arc::new(test_credentials()));
        let page = provider.page("tok", "Seattle", "Portland");

        assert_eq!(
            host.run(&page).await.unwrap(),
            SandboxOutcome::Error {
                message: "page received".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_provider_error() {
        let host = NodeScriptHost::new("/nonexistent/node");
        let provider = SandboxProvider::new(host, Arc::new(test_credentials()));
        assert!(matches!(
            provider.fetch_route("a", "b").await,
            Err(PipelineError::ProviderError(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_kills_sandbox_process() {
        let dir = stub_node("hang", "true").parent().unwrap().to_path_buf();
        let pid_file = dir.join("pid");
        let node = stub_node("hang", &format!("echo $$ > {}\nexec sleep 30", pid_file.display()));
        let provider = SandboxProvider::new(
            NodeScriptHost::new(node.to_string_lossy()),
            Arc::new(test_credentials()),
        );

        let result =
            tokio::time::timeout(Duration::from_millis(500), provider.fetch_route("a", "b")).await;
        assert!(result.is_err());

        let pid: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();

        let mut alive = is_running(pid);
        for _ in 0..40 {
            if !alive {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            alive = is_running(pid);
        }
        assert!(!alive, "sandbox process {} outlived its caller", pid);
    }
}
