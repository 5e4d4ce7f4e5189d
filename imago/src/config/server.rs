use serde::Deserialize;

#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
	/// IP to bind to.
	#[serde()]
	pub ip: Option<String>,

	/// TCP port to bind to.
	#[serde()]
	pub port: Option<u16>,

	/// Base URL of the IIIF endpoint, e.g. `/iiif` or `https://images.example.org/iiif`.
	/// A full URL is used verbatim in descriptor ids, a bare path is combined with the request host.
	#[serde()]
	pub base_url: Option<String>,

	/// Maximum duration of a single request in seconds.
	#[serde()]
	pub timeout_seconds: Option<u64>,
}

impl ServerConfig {
	pub fn override_optional_ip(&mut self, ip: &Option<String>) {
		if ip.is_some() {
			self.ip = ip.clone();
		}
	}
	pub fn override_optional_port(&mut self, port: &Option<u16>) {
		if port.is_some() {
			self.port = *port;
		}
	}
	pub fn override_optional_base_url(&mut self, base_url: &Option<String>) {
		if base_url.is_some() {
			self.base_url = base_url.clone();
		}
	}
	pub fn override_optional_timeout_seconds(&mut self, timeout_seconds: &Option<u64>) {
		if timeout_seconds.is_some() {
			self.timeout_seconds = *timeout_seconds;
		}
	}
}
