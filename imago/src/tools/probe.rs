use anyhow::{Context, Result};
use clap::Args;
use imago::config::Config;
use imago_image::decoder::open_decoder;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// image file you want to probe
	#[arg(required = true, verbatim_doc_comment)]
	filename: PathBuf,

	/// configuration file whose feature set is used for the descriptor
	#[arg(short = 'c', long, value_name = "FILE")]
	config: Option<PathBuf>,
}

pub fn run(arguments: &Subcommand) -> Result<()> {
	eprintln!("probe {:?}", arguments.filename);

	let config = if let Some(config_path) = &arguments.config {
		Config::from_path(config_path)?
	} else {
		Config::default()
	};
	let features = config.feature_set()?;

	let decoder = open_decoder(&arguments.filename)?;
	let (width, height) = decoder.dimensions();
	println!("dimensions: {width}x{height}");
	for (index, (w, h)) in decoder.levels().iter().enumerate() {
		println!("level {index}: {w}x{h}");
	}

	let id = arguments
		.filename
		.file_name()
		.and_then(|name| name.to_str())
		.context("file name is not valid UTF-8")?;
	println!("{}", features.info(id, width, height).to_json()?);

	Ok(())
}
