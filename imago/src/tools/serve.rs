use anyhow::Result;
use imago::{config::Config, server::IiifServer};
use imago_image::ResampleFilter;
use std::path::PathBuf;
use tokio::time::{Duration, sleep};

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true, verbatim_doc_comment)]
pub struct Subcommand {
	/// Path to a configuration file (YAML format) to configure the server, the image root and features.
	/// Command line arguments will override configuration file settings.
	#[arg(short = 'c', long, value_name = "FILE", display_order = 0)]
	pub config: Option<PathBuf>,

	/// Serve via socket ip. Default: 0.0.0.0
	#[arg(short = 'i', long, display_order = 0)]
	pub ip: Option<String>,

	/// Serve via port. Default: 8080
	#[arg(short, long, display_order = 0)]
	pub port: Option<u16>,

	/// Base URL of the IIIF endpoint. Default: /iiif
	/// Either a path like "/iiif" or a full URL like "https://images.example.org/iiif".
	/// A full URL is used as is for the "@id" in info.json.
	#[arg(long, value_name = "URL", verbatim_doc_comment, display_order = 1)]
	pub base_url: Option<String>,

	/// Directory containing the source images. Default: current directory
	#[arg(short = 'r', long, value_name = "DIR", display_order = 1)]
	pub root: Option<PathBuf>,

	/// Comma separated tile widths advertised in info.json. Default: 512
	#[arg(long, value_name = "N,N", value_delimiter = ',', display_order = 2)]
	pub tile_widths: Option<Vec<u32>>,

	/// Interpolation used for scaling: nearest, bilinear, catmullrom or lanczos3. Default: bilinear
	#[arg(long, value_name = "FILTER", value_parser = ResampleFilter::parse, display_order = 2)]
	pub resample: Option<ResampleFilter>,

	/// Largest output image in pixels (width × height). Default: 100000000
	#[arg(long, value_name = "PIXELS", display_order = 2)]
	pub max_area: Option<u64>,

	/// Maximum duration of a request in seconds. Default: 30
	#[arg(long, display_order = 2)]
	pub timeout: Option<u64>,

	/// Shutdown server automatically after x milliseconds.
	#[arg(long, display_order = 4)]
	pub auto_shutdown: Option<u64>,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let mut config = if let Some(config_path) = &arguments.config {
		Config::from_path(config_path)?
	} else {
		Config::default()
	};

	config.server.override_optional_ip(&arguments.ip);
	config.server.override_optional_port(&arguments.port);
	config.server.override_optional_base_url(&arguments.base_url);
	config.server.override_optional_timeout_seconds(&arguments.timeout);
	config.images.override_optional_root(&arguments.root);
	config.images.override_optional_tile_widths(&arguments.tile_widths);
	config.images.override_optional_resample(&arguments.resample);
	config.images.override_optional_max_area(&arguments.max_area);

	let mut server = IiifServer::from_config(&config)?;
	server.start().await?;

	if let Some(milliseconds) = arguments.auto_shutdown {
		sleep(Duration::from_millis(milliseconds)).await;
		server.stop().await;
	} else {
		loop {
			sleep(Duration::from_secs(60)).await
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::tests::{run_command, write_png};
	use anyhow::Result;

	#[test]
	fn serve_directory() -> Result<()> {
		let dir = tempfile::tempdir()?;
		write_png(&dir.path().join("abc.png"), 40, 30);
		let root = dir.path().to_str().unwrap();

		run_command(vec![
			"imago",
			"serve",
			"-i",
			"127.0.0.1",
			"-p",
			"65001",
			"--root",
			root,
			"--tile-widths",
			"256,512",
			"--resample",
			"lanczos3",
			"--max-area",
			"1000000",
			"--auto-shutdown",
			"500",
		])?;
		Ok(())
	}

	#[test]
	fn serve_with_config_file() -> Result<()> {
		run_command(vec![
			"imago",
			"serve",
			"-c",
			"../testdata/imago.yml",
			"-p",
			"65002",
			"--auto-shutdown",
			"200",
		])?;
		Ok(())
	}

	#[test]
	fn invalid_resample_filter() {
		let err = run_command(vec!["imago", "serve", "-p", "65004", "--resample", "cubic"]).unwrap_err();
		assert!(err.to_string().contains("unknown resample filter 'cubic'"));
	}

	#[test]
	fn invalid_base_url() {
		let err = run_command(vec![
			"imago",
			"serve",
			"-i",
			"127.0.0.1",
			"-p",
			"65003",
			"--base-url",
			"ftp://example.org/iiif",
		])
		.unwrap_err();
		assert!(err.to_string().contains("must use http or https"));
	}
}
