//! HTTP handlers and small response helpers for the IIIF endpoint.
//!
//! `serve_iiif` dispatches everything below the base path:
//! - `{id}` redirects to `{id}/info.json`
//! - `{id}/info.json` returns the descriptor
//! - `{id}/{region}/{size}/{rotation}/{quality}.{format}` returns the image
//!
//! The identifier is taken from the raw request path, so that `%2F` inside an identifier survives
//! until `Identifier::from_url_segment` decodes it.

use super::{
	service::{IiifService, Rendered},
	utils::format_http_date,
};
use axum::{
	body::Body,
	extract::State,
	http::{HeaderMap, Uri, header, response::Builder},
	response::Response,
};
use imago_core::{Command, Feature, FeatureSet, Identifier, IiifError, IiifResult};
use imago_image::CancelFlag;
use std::sync::Arc;
use tokio::task::spawn_blocking;

const MIME_JSON: &str = "application/json";
const MIME_JSON_LD: &str = "application/ld+json";

pub async fn serve_iiif(uri: Uri, headers: HeaderMap, State(service): State<Arc<IiifService>>) -> Response<Body> {
	let path = uri.path();
	log::debug!("handle IIIF request: {path}");

	let Some(rest) = service.base.path.strip_prefix(path) else {
		log::debug!("send 404 for IIIF request outside of base path: {path}");
		return error_404();
	};

	let result = match rest.split_once('/') {
		None => redirect_to_info(&service, rest, path),
		Some((segment, "info.json")) => serve_info(&service, segment, &headers).await,
		Some(_) => serve_image(&service, rest, &headers).await,
	};

	match result {
		Ok(response) => {
			log::debug!("send {} for IIIF request: {path}", response.status().as_u16());
			response
		}
		Err(err) => error_from(&err, path),
	}
}

fn redirect_to_info(service: &IiifService, segment: &str, path: &str) -> IiifResult<Response<Body>> {
	Identifier::from_url_segment(segment)?;
	if !service.features.has(Feature::BaseUriRedirect) {
		return Err(IiifError::not_found(format!("{} is disabled", Feature::BaseUriRedirect)));
	}
	build(
		Response::builder()
			.status(303)
			.header(header::LOCATION, format!("{path}/info.json")),
		Body::empty(),
	)
}

async fn serve_info(service: &Arc<IiifService>, segment: &str, headers: &HeaderMap) -> IiifResult<Response<Body>> {
	let identifier = Identifier::from_url_segment(segment)?;
	let id_url = service.base.absolute(&identifier.to_url_segment(), host(headers));

	let worker = Arc::clone(service);
	let body = spawn_blocking(move || worker.info_json(&identifier, &id_url))
		.await
		.map_err(|err| IiifError::Internal(err.into()))??;

	let mut response = Response::builder()
		.status(200)
		.header(header::CONTENT_TYPE, info_content_type(&service.features, headers));
	if service.features.has(Feature::Cors) {
		response = response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");
	}
	build(response, Body::from(body))
}

async fn serve_image(service: &Arc<IiifService>, rest: &str, headers: &HeaderMap) -> IiifResult<Response<Body>> {
	let cmd = Command::parse(rest)?;
	service.features.check(&cmd)?;

	let if_modified_since = headers
		.get(header::IF_MODIFIED_SINCE)
		.and_then(|value| value.to_str().ok())
		.map(str::to_owned);
	let mime = cmd.format.as_mime_str();

	// Dropping this future (client gone, timeout) raises the flag and stops the worker.
	let cancel = CancelFlag::new();
	let guard = cancel.guard();
	let worker = Arc::clone(service);
	let rendered = spawn_blocking(move || worker.render(&cmd, if_modified_since.as_deref(), &cancel))
		.await
		.map_err(|err| IiifError::Internal(err.into()))??;
	guard.disarm();

	match rendered {
		Rendered::NotModified { modified } => build(
			Response::builder()
				.status(304)
				.header(header::LAST_MODIFIED, http_date(modified)?),
			Body::empty(),
		),
		Rendered::Image {
			bytes,
			modified,
			canonical,
		} => {
			let mut response = Response::builder().status(200).header(header::CONTENT_TYPE, mime);
			if let Some(modified) = modified {
				response = response.header(header::LAST_MODIFIED, http_date(modified)?);
			}
			if service.features.has(Feature::Cors) {
				response = response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");
			}

			let mut links = Vec::new();
			if service.features.has(Feature::ProfileLinkHeader) {
				links.push(format!("<{}>;rel=\"profile\"", service.features.level().uri()));
			}
			if let Some(canonical) = canonical {
				links.push(format!(
					"<{}>;rel=\"canonical\"",
					service.base.absolute(&canonical, host(headers))
				));
			}
			if !links.is_empty() {
				response = response.header(header::LINK, links.join(", "));
			}

			build(response, Body::from(bytes))
		}
	}
}

/// `application/ld+json` if the client asks for it and the server offers it.
fn info_content_type(features: &FeatureSet, headers: &HeaderMap) -> &'static str {
	let accepts_json_ld = headers
		.get_all(header::ACCEPT)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(','))
		.any(|media| media.split(';').next().unwrap_or("").trim() == MIME_JSON_LD);

	if accepts_json_ld && features.has(Feature::JsonldMediaType) {
		MIME_JSON_LD
	} else {
		MIME_JSON
	}
}

// --- small helpers -----------------------------------------------------------

fn host(headers: &HeaderMap) -> Option<&str> {
	headers.get(header::HOST).and_then(|value| value.to_str().ok())
}

fn http_date(time: std::time::SystemTime) -> IiifResult<String> {
	format_http_date(time).map_err(IiifError::Internal)
}

fn build(builder: Builder, body: Body) -> IiifResult<Response<Body>> {
	builder.body(body).map_err(|err| IiifError::Internal(err.into()))
}

fn error_from(err: &IiifError, path: &str) -> Response<Body> {
	let status = err.status_code();
	if status >= 500 {
		log::warn!("send {status} for IIIF request: {path}. Error:\n{}", err.log_message());
	} else {
		log::debug!("send {status} for IIIF request: {path}: {err}");
	}
	error_with(status, &err.client_message())
}

pub fn error_with(status: u16, message: &str) -> Response<Body> {
	Response::builder()
		.status(status)
		.header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
		.body(Body::from(message.as_bytes().to_vec()))
		.expect("failed to build error response")
}

pub fn error_404() -> Response<Body> {
	error_with(404, "Not Found")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::server::{BaseUrl, tests::write_test_image};
	use axum::http::HeaderValue;
	use imago_image::PipelineOptions;
	use rstest::rstest;

	#[rstest]
	#[case(None, true, MIME_JSON)]
	#[case(Some("application/json"), true, MIME_JSON)]
	#[case(Some("application/ld+json"), true, MIME_JSON_LD)]
	#[case(Some("text/html, application/ld+json;q=0.9"), true, MIME_JSON_LD)]
	#[case(Some("application/ld+json"), false, MIME_JSON)]
	#[case(Some("application/ld+jsonx"), true, MIME_JSON)]
	fn negotiates_info_content_type(#[case] accept: Option<&str>, #[case] jsonld: bool, #[case] expected: &str) {
		let mut features = FeatureSet::default();
		if !jsonld {
			features.features.remove(Feature::JsonldMediaType);
		}
		let mut headers = HeaderMap::new();
		if let Some(accept) = accept {
			headers.insert(header::ACCEPT, HeaderValue::from_str(accept).unwrap());
		}
		assert_eq!(info_content_type(&features, &headers), expected);
	}

	#[rstest]
	#[case(IiifError::syntax("bad size"), 400, "Invalid IIIF request: bad size")]
	#[case(IiifError::not_found("/srv/a.jpg"), 404, "Image resource does not exist")]
	#[case(IiifError::Decode(anyhow::anyhow!("/srv/a.jpg is truncated")), 500, "Unable to decode image")]
	#[tokio::test]
	async fn errors_become_plain_text(#[case] err: IiifError, #[case] status: u16, #[case] body: &str) {
		let response = error_from(&err, "/iiif/a.jpg/full/full/0/default.jpg");
		assert_eq!(response.status().as_u16(), status);
		assert_eq!(
			response.headers().get(header::CONTENT_TYPE).unwrap(),
			"text/plain; charset=utf-8"
		);
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
		assert_eq!(bytes, body.as_bytes());
	}

	#[rstest]
	#[case::identifier("/iiif/abc", 303, Some("/iiif/abc/info.json"))]
	#[case::encoded_identifier("/iiif/a%2Fb", 303, Some("/iiif/a%2Fb/info.json"))]
	#[case::empty_identifier("/iiif/", 400, None)]
	#[case::base_path("/iiif", 404, None)]
	#[tokio::test]
	async fn redirects_only_valid_identifiers(#[case] path: &str, #[case] status: u16, #[case] location: Option<&str>) {
		let dir = tempfile::tempdir().unwrap();
		write_test_image(&dir.path().join("abc"), 8, 8);
		let service = IiifService::new(
			BaseUrl::parse("/iiif").unwrap(),
			dir.path().to_path_buf(),
			FeatureSet::default(),
			PipelineOptions::default(),
		);

		let uri: Uri = path.parse().unwrap();
		let response = serve_iiif(uri, HeaderMap::new(), State(Arc::new(service))).await;
		assert_eq!(response.status().as_u16(), status);
		assert_eq!(
			response.headers().get(header::LOCATION).map(|v| v.to_str().unwrap()),
			location
		);
	}
}
