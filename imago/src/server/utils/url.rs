use anyhow::{Result, bail, ensure};

/// Path prefix of the IIIF endpoint, always with a leading and never with a trailing slash.
///
/// The root prefix is the empty string, so that `join_as_string` never produces `//`.
#[derive(Clone, PartialOrd, PartialEq, Debug)]
pub struct Url {
	pub str: String,
}

impl Url {
	pub fn new(url: &str) -> Url {
		let trimmed = url.trim_matches('/');
		let str = if trimmed.is_empty() {
			String::new()
		} else {
			format!("/{trimmed}")
		};
		Url { str }
	}

	pub fn is_root(&self) -> bool {
		self.str.is_empty()
	}

	/// Everything after `{self}/`, or `None` if `path` lies outside of this prefix.
	pub fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
		path.strip_prefix(&self.str)?.strip_prefix('/')
	}

	pub fn join_as_string(&self, segment: &str) -> String {
		format!("{}/{}", self.str, segment.trim_start_matches('/'))
	}
}

impl std::fmt::Display for Url {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.is_root() {
			f.write_str("/")
		} else {
			f.write_str(&self.str)
		}
	}
}

impl From<&str> for Url {
	fn from(s: &str) -> Self {
		Url::new(s)
	}
}

/// The configured base URL of the IIIF endpoint.
///
/// `https://images.example.org/iiif` routes `/iiif/...` and uses the full URL in descriptor ids.
/// A bare path like `/iiif` routes the same but takes scheme-less ids from the request `Host`.
#[derive(Clone, PartialEq, Debug)]
pub struct BaseUrl {
	pub path: Url,
	origin: Option<String>,
}

impl BaseUrl {
	pub fn parse(base_url: &str) -> Result<BaseUrl> {
		ensure!(
			!base_url.contains(['?', '#']),
			"base url '{base_url}' must not contain a query or fragment"
		);

		if let Some((scheme, rest)) = base_url.split_once("://") {
			if scheme != "http" && scheme != "https" {
				bail!("base url '{base_url}' must use http or https");
			}
			let (host, path) = match rest.find('/') {
				Some(index) => rest.split_at(index),
				None => (rest, ""),
			};
			ensure!(!host.is_empty(), "base url '{base_url}' has no host");
			Ok(BaseUrl {
				path: Url::new(path),
				origin: Some(format!("{scheme}://{host}")),
			})
		} else {
			Ok(BaseUrl {
				path: Url::new(base_url),
				origin: None,
			})
		}
	}

	/// Absolute URL of something below the base, e.g. the `@id` of an image.
	pub fn absolute(&self, segment: &str, host: Option<&str>) -> String {
		let path = self.path.join_as_string(segment);
		match (&self.origin, host) {
			(Some(origin), _) => format!("{origin}{path}"),
			(None, Some(host)) => format!("http://{host}{path}"),
			(None, None) => path,
		}
	}
}

impl Default for BaseUrl {
	fn default() -> Self {
		BaseUrl {
			path: Url::new("/iiif"),
			origin: None,
		}
	}
}
