use std::process::ExitCode;

use anyhow::{bail, Result};
use gumdrop::{Options, ParsingStyle};
use tracing::debug;

use tomo_preprocess::commands;
use tomo_preprocess::config::Config;
use tomo_preprocess::logging::{self, ResultExt};


#[derive(Options)]
struct Args {

	#[options(help_flag)]
	help: bool,

	/// settings for log output
	#[options(default = "tomo_preprocess=info")]
	log: String,

	/// optional TOML config file
	#[options(no_short, meta = "PATH")]
	config: Option<String>,

	#[options(command)]
	cmd: Option<Command>
}

#[derive(Options)]
enum Command {

	/// Compute tilt orders and doses, and write tilt order files
	Order(commands::order::Args),

	/// Apply dose weighting to tilt series stacks
	DoseWeight(commands::dose_weight::Args),

	/// Sharpen images and volumes to account for dose weighting
	Sharpen(commands::sharpen::Args)
}


fn main() -> ExitCode {

	// parse arguments
	let args = Args::parse_args_or_exit(ParsingStyle::AllOptions);

	// init logging
	let Ok(_) = logging::init(&args.log)
		.log_err()
		else { return ExitCode::FAILURE; };

	let Ok(_) = run(args)
		.log_err()
		else { return ExitCode::FAILURE; };

	// we finished! =)
	ExitCode::SUCCESS
}


#[tracing::instrument(skip_all, level = 5, name = "TomoPreprocess")]
fn run(args: Args) -> Result<()> {

	let config = match &args.config {
		Some(path) => Config::read(path)?,
		None => Config::default()
	};
	debug!("config: {:?}", config);

	match args.cmd {
		Some(Command::Order(order_args)) => commands::order::run(&config, order_args),
		Some(Command::DoseWeight(dose_weight_args)) => commands::dose_weight::run(&config, dose_weight_args),
		Some(Command::Sharpen(sharpen_args)) => commands::sharpen::run(&config, sharpen_args),
		None => bail!("No command, try one of:\n{}", Args::command_list().unwrap_or_default())
	}
}
