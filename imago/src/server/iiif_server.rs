//! IIIF HTTP server lifecycle and composition.
//!
//! - `handlers` implement the IIIF endpoint and the response helpers.
//! - `routes` composes handlers into an Axum `Router`.
//! - `service` holds the shared state and the blocking work of a request.
//!
//! `iiif_server.rs` owns lifecycle concerns only: configuration ingestion, building the router,
//! applying the protection middlewares (backpressure, timeouts, panic catching), listening on a
//! socket and graceful shutdown.

use super::{handlers::error_with, routes, service::IiifService, utils::BaseUrl};
use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
	BoxError, Router,
	error_handling::HandleErrorLayer,
	http::{HeaderValue, StatusCode, header},
	response::{IntoResponse, Response},
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::oneshot};
use tower::{
	ServiceBuilder, buffer::BufferLayer, limit::ConcurrencyLimitLayer, load_shed::LoadShedLayer,
	timeout::{TimeoutLayer, error::Elapsed},
};
use tower_http::catch_panic::CatchPanicLayer;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Owns the listening task of one server instance.
///
/// Starting twice stops the previous instance first, stopping twice is a no-op, and in-flight
/// requests may finish during shutdown (up to a timeout).
///
/// ```no_run
/// # use imago::{config::Config, server::IiifServer};
/// # async fn demo(config: Config) -> anyhow::Result<()> {
/// let mut server = IiifServer::from_config(&config)?;
/// server.start().await?;
/// // ... run requests ...
/// server.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct IiifServer {
	ip: String,
	port: u16,
	service: Arc<IiifService>,
	request_timeout: Duration,
	/// One-shot channel to signal graceful shutdown to the serving task.
	exit_signal: Option<oneshot::Sender<()>>,
	/// Join handle for the serving task; awaited in `stop()`.
	join: Option<tokio::task::JoinHandle<()>>,
}

impl IiifServer {
	pub fn new(ip: &str, port: u16, service: IiifService) -> IiifServer {
		IiifServer {
			ip: ip.to_owned(),
			port,
			service: Arc::new(service),
			request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
			exit_signal: None,
			join: None,
		}
	}

	pub fn from_config(config: &Config) -> Result<IiifServer> {
		let base = match &config.server.base_url {
			Some(base_url) => BaseUrl::parse(base_url)?,
			None => BaseUrl::default(),
		};
		let root = config.images.root.clone().unwrap_or_else(|| PathBuf::from("."));
		let features = config.feature_set().context("building feature set")?;
		let options = config.images.pipeline_options()?;

		log::info!("serve images from {root:?} at '{}'", base.path);
		log::info!(
			"compliance level {}, resample filter {}",
			features.level().uri(),
			options.resample
		);

		let seconds = config.server.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS);
		Ok(IiifServer::new(
			config.server.ip.as_deref().unwrap_or("0.0.0.0"),
			config.server.port.unwrap_or(8080),
			IiifService::new(base, root, features, options),
		)
		.with_request_timeout(Duration::from_secs(seconds)))
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> IiifServer {
		self.request_timeout = timeout;
		self
	}

	/// The complete router including the protection layers.
	pub fn router(&self) -> Router {
		let mut router = Router::new();
		router = routes::add_status_to_app(router);
		router = routes::add_iiif_to_app(router, Arc::clone(&self.service));

		// Order from innermost to outermost:
		//   LoadShed → ConcurrencyLimit → Buffer → Timeout → CatchPanic → HandleError
		let global_concurrency = 256usize;
		let global_buffer = 512usize;

		let protection = ServiceBuilder::new()
			.layer(HandleErrorLayer::new(handle_protection_error))
			.layer(CatchPanicLayer::new())
			.layer(TimeoutLayer::new(self.request_timeout))
			.layer(BufferLayer::new(global_buffer))
			.layer(ConcurrencyLimitLayer::new(global_concurrency))
			.layer(LoadShedLayer::new());

		router.layer(protection)
	}

	/// Start listening and serving requests.
	pub async fn start(&mut self) -> Result<()> {
		if self.exit_signal.is_some() || self.join.is_some() {
			self.stop().await;
		}

		log::info!("starting server");
		let router = self.router();

		let addr = format!("{}:{}", self.ip, self.port);
		log::info!("server binding on {addr}");

		let listener = TcpListener::bind(&addr)
			.await
			.with_context(|| format!("binding to {addr}"))?;
		let (tx, rx) = oneshot::channel::<()>();

		let handle = tokio::spawn(async move {
			if let Err(err) = axum::serve(listener, router.into_make_service())
				.with_graceful_shutdown(async {
					rx.await.ok();
				})
				.await
			{
				log::error!("server task exited with error: {err}");
			}
		});

		self.exit_signal = Some(tx);
		self.join = Some(handle);

		Ok(())
	}

	/// Trigger graceful shutdown and wait for the server task to finish (with timeout).
	pub async fn stop(&mut self) {
		if self.exit_signal.is_none() && self.join.is_none() {
			return;
		}

		log::info!("stopping server");

		if let Some(tx) = self.exit_signal.take() {
			let _ = tx.send(());
		}

		if let Some(handle) = self.join.take() {
			match tokio::time::timeout(Duration::from_secs(10), handle).await {
				Ok(Err(join_err)) => log::warn!("server task join error: {join_err}"),
				Ok(Ok(())) => {}
				Err(_) => log::warn!("server task did not shutdown within timeout; continuing"),
			}
		}
	}
}

/// Timeouts become 500, everything else the protection layers reject (load shedding, a closed
/// buffer) becomes 503.
async fn handle_protection_error(err: BoxError) -> Response {
	if err.is::<Elapsed>() {
		log::warn!("request timed out");
		return error_with(500, "Request timed out");
	}
	log::warn!("request rejected: {err}");
	let mut resp = (StatusCode::SERVICE_UNAVAILABLE, "Service overloaded, try later").into_response();
	resp.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from_static("2"));
	resp
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::server::tests::write_test_image;
	use axum::{
		body::{Body, to_bytes},
		http::{Request, Response},
	};
	use crate::server::InfoOverrides;
	use imago_core::{Feature, FeatureSet, Identifier};
	use imago_image::PipelineOptions;
	use pretty_assertions::assert_eq;
	use std::{fs, path::Path};
	use tempfile::TempDir;
	use tower::{ServiceExt, load_shed::error::Overloaded};

	const IP: &str = "127.0.0.1";

	fn service_with(features: FeatureSet) -> (TempDir, IiifService) {
		let dir = tempfile::tempdir().unwrap();
		write_test_image(&dir.path().join("abc"), 800, 600);
		let service = IiifService::new(
			BaseUrl::parse("/iiif").unwrap(),
			dir.path().to_path_buf(),
			features,
			PipelineOptions::default(),
		);
		(dir, service)
	}

	fn server_with(features: FeatureSet) -> (TempDir, IiifServer) {
		let (dir, service) = service_with(features);
		(dir, IiifServer::new(IP, 0, service))
	}

	async fn request(server: &IiifServer, path: &str, headers: &[(&str, &str)]) -> Response<Body> {
		let mut builder = Request::builder().uri(path).header(header::HOST, "example.org");
		for (name, value) in headers {
			builder = builder.header(*name, *value);
		}
		server
			.router()
			.oneshot(builder.body(Body::empty()).unwrap())
			.await
			.unwrap()
	}

	async fn body(response: Response<Body>) -> Vec<u8> {
		to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
	}

	fn header_of<'a>(response: &'a Response<Body>, name: header::HeaderName) -> Option<&'a str> {
		response.headers().get(name).map(|v| v.to_str().unwrap())
	}

	#[tokio::test]
	async fn status_endpoint() {
		let (_dir, server) = server_with(FeatureSet::default());
		let response = request(&server, "/status", &[]).await;
		assert_eq!(response.status(), 200);
		assert_eq!(body(response).await, b"ready!");
	}

	#[tokio::test]
	async fn base_uri_redirects_to_info() {
		let (_dir, server) = server_with(FeatureSet::default());
		let response = request(&server, "/iiif/abc", &[]).await;
		assert_eq!(response.status(), 303);
		assert_eq!(header_of(&response, header::LOCATION), Some("/iiif/abc/info.json"));
	}

	#[tokio::test]
	async fn base_uri_without_redirect_is_not_found() {
		let mut features = FeatureSet::default();
		features.features.remove(Feature::BaseUriRedirect);
		let (_dir, server) = server_with(features);
		let response = request(&server, "/iiif/abc", &[]).await;
		assert_eq!(response.status(), 404);
	}

	#[tokio::test]
	async fn info_json() {
		let (_dir, server) = server_with(FeatureSet::default());
		let response = request(&server, "/iiif/abc/info.json", &[]).await;
		assert_eq!(response.status(), 200);
		assert_eq!(header_of(&response, header::CONTENT_TYPE), Some("application/json"));
		assert_eq!(header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), Some("*"));

		let value: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
		assert_eq!(value["@id"], "http://example.org/iiif/abc");
		assert_eq!(value["width"], 800);
		assert_eq!(value["height"], 600);
		assert_eq!(value["profile"][0], "http://iiif.io/api/image/2/level2.json");
	}

	#[tokio::test]
	async fn info_json_ld_on_request() {
		let (_dir, server) = server_with(FeatureSet::default());
		let response = request(&server, "/iiif/abc/info.json", &[("accept", "application/ld+json")]).await;
		assert_eq!(header_of(&response, header::CONTENT_TYPE), Some("application/ld+json"));
	}

	#[tokio::test]
	async fn info_json_without_cors() {
		let mut features = FeatureSet::default();
		features.features.remove(Feature::Cors);
		let (_dir, server) = server_with(features);
		let response = request(&server, "/iiif/abc/info.json", &[]).await;
		assert_eq!(response.status(), 200);
		assert_eq!(header_of(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), None);
	}

	#[tokio::test]
	async fn info_json_override() {
		let (dir, server) = server_with(FeatureSet::default());
		fs::write(dir.path().join("abc-info.json"), r#"{"@id":"%ID%","custom":true}"#).unwrap();
		let response = request(&server, "/iiif/abc/info.json", &[]).await;
		assert_eq!(response.status(), 200);
		assert_eq!(
			body(response).await,
			br#"{"@id":"http://example.org/iiif/abc","custom":true}"#.to_vec()
		);
	}

	#[tokio::test]
	async fn full_image_as_jpeg() {
		let (_dir, server) = server_with(FeatureSet::default());
		let response = request(&server, "/iiif/abc/full/full/0/default.jpg", &[]).await;
		assert_eq!(response.status(), 200);
		assert_eq!(header_of(&response, header::CONTENT_TYPE), Some("image/jpeg"));
		assert!(header_of(&response, header::LAST_MODIFIED).is_some());
		assert_eq!(header_of(&response, header::LINK), None);

		let image = image::load_from_memory(&body(response).await).unwrap();
		assert_eq!((image.width(), image.height()), (800, 600));
	}

	#[tokio::test]
	async fn link_headers_when_enabled() {
		let mut features = FeatureSet::default();
		features.features.insert(Feature::ProfileLinkHeader);
		features.features.insert(Feature::CanonicalLinkHeader);
		let (_dir, server) = server_with(features);
		let response = request(&server, "/iiif/abc/full/pct:50/0/default.png", &[]).await;
		assert_eq!(response.status(), 200);
		assert_eq!(
			header_of(&response, header::LINK),
			Some(
				"<http://iiif.io/api/image/2/level2.json>;rel=\"profile\", \
				<http://example.org/iiif/abc/full/400,/0/default.png>;rel=\"canonical\""
			)
		);
	}

	#[tokio::test]
	async fn not_modified() {
		let (_dir, server) = server_with(FeatureSet::default());
		let response = request(
			&server,
			"/iiif/abc/full/full/0/default.png",
			&[("if-modified-since", "Fri, 31 Dec 9999 23:59:59 GMT")],
		)
		.await;
		assert_eq!(response.status(), 304);
		assert!(body(response).await.is_empty());
	}

	#[tokio::test]
	async fn status_codes() {
		let (_dir, server) = server_with(FeatureSet::default());
		for (path, status) in [
			("/iiif/abc/full/full/0/default.jpeg", 400),
			("/iiif/abc/full/0,/0/default.jpg", 400),
			("/iiif/abc/full/full/0/default", 400),
			("/iiif/abc/800,0,10,10/full/0/default.jpg", 400),
			("/iiif/abc/full/full/45/default.jpg", 501),
			("/iiif/abc/full/4294967295,4294967295/0/default.jpg", 400),
			("/iiif/abc/full/60000,60000/0/default.jpg", 400),
			("/iiif/abc/full/pct:2000/0/default.png", 400),
			("/iiif/abc/full/full/0/default.webp", 501),
			("/iiif/missing/full/full/0/default.jpg", 404),
			("/iiif/missing/info.json", 404),
			("/other/abc/info.json", 404),
			("/iiif/abc/full/full/0/default.png", 200),
			("/iiif/abc/full/!100,100/90/gray.gif", 200),
			("/iiif/abc/pct:10,10,20,20/,50/!180/bitonal.tif", 200),
		] {
			let response = request(&server, path, &[]).await;
			assert_eq!(response.status().as_u16(), status, "{path}");
		}
	}

	#[tokio::test]
	async fn syntax_errors_are_reported_before_opening_the_image() {
		let (_dir, server) = server_with(FeatureSet::default());
		let response = request(&server, "/iiif/missing/full/full/0/default.jpeg", &[]).await;
		assert_eq!(response.status(), 400);
		let response = request(&server, "/iiif/missing/full/full/45/default.jpg", &[]).await;
		assert_eq!(response.status(), 501);
	}

	#[tokio::test]
	async fn error_bodies_do_not_leak_paths() {
		let (dir, server) = server_with(FeatureSet::default());
		fs::write(dir.path().join("broken"), b"not an image").unwrap();
		let response = request(&server, "/iiif/broken/full/full/0/default.jpg", &[]).await;
		assert_eq!(response.status(), 500);
		let text = String::from_utf8(body(response).await).unwrap();
		assert_eq!(text, "Unable to decode image");
	}

	#[tokio::test]
	async fn identifiers_with_encoded_slashes() {
		let (dir, server) = server_with(FeatureSet::default());
		fs::create_dir(dir.path().join("maps")).unwrap();
		write_test_image(&dir.path().join("maps").join("berlin.png"), 40, 30);
		let response = request(&server, "/iiif/maps%2Fberlin.png/info.json", &[]).await;
		assert_eq!(response.status(), 200);
		let value: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
		assert_eq!(value["@id"], "http://example.org/iiif/maps%2Fberlin.png");
	}

	#[tokio::test]
	async fn info_json_advertises_size_limits() {
		let mut features = FeatureSet::default();
		features.limits.max_width = Some(4000);
		let (_dir, server) = server_with(features);
		let response = request(&server, "/iiif/abc/info.json", &[]).await;
		let value: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
		assert_eq!(value["profile"][1]["maxWidth"], 4000);
		assert_eq!(value["profile"][1]["maxArea"], 100_000_000);
		assert!(value["profile"][1].get("maxHeight").is_none());

		let response = request(&server, "/iiif/abc/full/4001,/0/default.jpg", &[]).await;
		assert_eq!(response.status(), 400);
		assert_eq!(
			String::from_utf8(body(response).await).unwrap(),
			"Invalid IIIF request: size '4001,' (4001x3001) exceeds maxWidth 4000"
		);
	}

	struct SlowOverrides;

	impl InfoOverrides for SlowOverrides {
		fn load(&self, _identifier: &Identifier, _path: &Path) -> anyhow::Result<Option<Vec<u8>>> {
			std::thread::sleep(Duration::from_millis(300));
			Ok(Some(b"{}".to_vec()))
		}
	}

	#[tokio::test]
	async fn slow_requests_time_out() {
		let (_dir, service) = service_with(FeatureSet::default());
		let server = IiifServer::new(IP, 0, service.with_overrides(Box::new(SlowOverrides)))
			.with_request_timeout(Duration::from_millis(20));

		let response = request(&server, "/iiif/abc/info.json", &[]).await;
		assert_eq!(response.status(), 500);
		assert_eq!(header_of(&response, header::RETRY_AFTER), None);
		assert_eq!(body(response).await, b"Request timed out");

		let response = request(&server, "/status", &[]).await;
		assert_eq!(response.status(), 200);
	}

	#[tokio::test]
	async fn overload_is_503_with_retry_after() {
		let response = handle_protection_error(Box::new(Overloaded::new())).await;
		assert_eq!(response.status(), 503);
		assert_eq!(header_of(&response, header::RETRY_AFTER), Some("2"));
		assert_eq!(body(response).await, b"Service overloaded, try later");
	}

	#[tokio::test]
	async fn server_lifecycle() -> Result<()> {
		let (_dir, service) = service_with(FeatureSet::default());
		let mut server = IiifServer::new(IP, 50301, service);
		server.start().await?;

		let url = format!("http://{IP}:50301");
		assert_eq!(reqwest::get(format!("{url}/status")).await?.text().await?, "ready!");
		let response = reqwest::get(format!("{url}/iiif/abc/full/100,/0/default.png")).await?;
		assert_eq!(response.status(), 200);
		let image = image::load_from_memory(&response.bytes().await?)?;
		assert_eq!((image.width(), image.height()), (100, 75));

		server.start().await?;
		assert_eq!(reqwest::get(format!("{url}/status")).await?.status(), 200);

		server.stop().await;
		server.stop().await;
		assert!(reqwest::get(format!("{url}/status")).await.is_err());
		Ok(())
	}
}
