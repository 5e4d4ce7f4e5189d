//! Error taxonomy for IIIF requests.
//!
//! Every failure a request can run into maps onto one [`IiifError`] variant, and every variant maps
//! onto exactly one HTTP status. The `Display` text is meant for logs; clients only ever see
//! [`IiifError::client_message`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IiifError {
	/// The request path does not follow the IIIF grammar or a segment is invalid.
	#[error("invalid IIIF request: {0}")]
	Syntax(String),

	/// The request is well formed but uses a feature that is not enabled.
	#[error("feature not supported: {0}")]
	UnsupportedFeature(String),

	/// The identifier does not resolve to a readable source image.
	#[error("image resource does not exist: {0}")]
	ResourceNotFound(String),

	#[error("unable to decode image")]
	Decode(#[source] anyhow::Error),

	#[error("unable to encode image")]
	Encode(#[source] anyhow::Error),

	#[error("internal error")]
	Internal(#[source] anyhow::Error),
}

pub type IiifResult<T> = Result<T, IiifError>;

impl IiifError {
	pub fn syntax(message: impl Into<String>) -> Self {
		IiifError::Syntax(message.into())
	}

	pub fn unsupported(message: impl Into<String>) -> Self {
		IiifError::UnsupportedFeature(message.into())
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		IiifError::ResourceNotFound(message.into())
	}

	/// HTTP status code this error is reported with.
	pub fn status_code(&self) -> u16 {
		match self {
			IiifError::Syntax(_) => 400,
			IiifError::ResourceNotFound(_) => 404,
			IiifError::UnsupportedFeature(_) => 501,
			IiifError::Decode(_) | IiifError::Encode(_) | IiifError::Internal(_) => 500,
		}
	}

	/// Short message that is safe to send to clients.
	///
	/// Syntax and feature errors repeat the offending segment, which came from the client anyway.
	/// Server side failures never leak paths or codec details.
	pub fn client_message(&self) -> String {
		match self {
			IiifError::Syntax(msg) => format!("Invalid IIIF request: {msg}"),
			IiifError::UnsupportedFeature(msg) => format!("Feature not supported: {msg}"),
			IiifError::ResourceNotFound(_) => String::from("Image resource does not exist"),
			IiifError::Decode(_) => String::from("Unable to decode image"),
			IiifError::Encode(_) => String::from("Unable to encode image"),
			IiifError::Internal(_) => String::from("Internal Server Error"),
		}
	}

	/// Full description including the cause chain, for server side logs.
	pub fn log_message(&self) -> String {
		let mut result = self.to_string();
		let mut source = std::error::Error::source(self);
		let mut first = true;
		while let Some(cause) = source {
			if first {
				result.push_str("\n  Caused by:");
				first = false;
			}
			result.push_str(&format!("\n    {cause}"));
			source = cause.source();
		}
		result
	}
}
