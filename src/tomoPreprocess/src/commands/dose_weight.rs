use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gumdrop::Options;
use tracing::{info, warn};

use crate::config::Config;
use crate::dose_filter;
use crate::error::display_list;
use crate::mrc::{self, Mrc};
use crate::resolve::{self, DoseRate, OrderSources, SchemeArgs};
use crate::validate::LengthPolicy;


#[derive(Options)]
pub struct Args {

	#[options(help_flag)]
	help: bool,

	/// Tilt series stacks, with images ordered from the most negative to the most positive angle
	#[options(free)]
	stacks: Vec<String>,

	/// The pixel size of the images in Angstroms
	#[options(no_short, meta = "APIX")]
	pixel_size: Option<f64>,

	/// One of: continuous_positive, continuous_negative, bidirectional_positive, bidirectional_negative, dose_symmetric_positive, dose_symmetric_negative
	#[options(no_short, meta = "SCHEME")]
	tilt_scheme: Option<String>,

	/// The minimum (most negative) angle of the tilt series, eg --min-angle=-60
	#[options(no_short, meta = "DEG")]
	min_angle: Option<f64>,

	/// The angular step between tilt images
	#[options(no_short, meta = "DEG")]
	angle_step: Option<f64>,

	/// The starting tilt angle, only for bidirectional and dose symmetric tilt schemes
	#[options(no_short, meta = "DEG")]
	starting_angle: Option<f64>,

	/// Number of tilts collected on one side before switching, only for dose symmetric tilt schemes
	#[options(no_short, meta = "N")]
	group_size: Option<u32>,

	/// Count the starting tilt as part of the first group
	#[options(no_short)]
	groups_uncentered: bool,

	/// Dose applied per tilt image (in e-/A^2)
	#[options(no_short, meta = "DOSE")]
	dose_per_tilt: Option<f64>,

	/// Exposure before the tilt series was collected (in e-/A^2)
	#[options(no_short, meta = "DOSE", default = "0")]
	pre_dose: f64,

	/// A comma delimited list of the cumulative doses, in the same order as the images. Overrides everything else
	#[options(no_short, meta = "LIST")]
	custom_dose_series: Option<String>,

	/// A tilt order file with the acquisition order (and optionally the doses) of the images
	#[options(no_short, meta = "PATH")]
	tilt_order_file: Option<String>,

	/// String appended to the output file name
	#[options(no_short, meta = "STR")]
	file_append: Option<String>,

	/// Only check the inputs and report the doses, without filtering anything
	#[options(no_short)]
	dry_run: bool,

	/// Reject dose lists that are longer than the tilt series, instead of truncating them
	#[options(no_short)]
	strict_lengths: bool
}


pub fn run(config: &Config, args: Args) -> Result<()> {

	let pixel_size = args.pixel_size
		.context("Missing argument: --pixel-size")?;
	let policy =
		if args.strict_lengths {
			LengthPolicy::Strict
		} else {
			config.length_policy()
		};
	let file_append = args.file_append.clone()
		.unwrap_or_else(|| config.dose_weight.file_append.clone());

	let stacks = args.stacks.iter()
		.map(PathBuf::from)
		.collect::<Vec<_>>();
	super::for_each_series(
		&stacks,
		|stack| stack.to_string_lossy().to_string(),
		|stack| run_stack(&args, stack, pixel_size, &file_append, policy)
	)
}


fn run_stack(args: &Args, path: &Path, pixel_size: f64, file_append: &str, policy: LengthPolicy) -> Result<()> {

	let mut stack = Mrc::read(path)?;
	let total_tilts = stack.nz();

	if (stack.pixel_size() as f64 - pixel_size).abs() > 1e-3 {
		warn!("Pixel size from file header ({}) does not match ({}), the header value is kept for the output", stack.pixel_size(), pixel_size);
	}

	let sources = OrderSources {
		tilt_order_file: args.tilt_order_file.as_ref()
			.map(PathBuf::from),
		custom_order: None,
		scheme: SchemeArgs {
			tilt_scheme: args.tilt_scheme.clone(),
			min_angle: args.min_angle,
			angle_step: args.angle_step,
			starting_angle: args.starting_angle,
			group_size: args.group_size,
			groups_uncentered: args.groups_uncentered
		}
	};
	let dose_rate = args.dose_per_tilt.map(|dose_per_tilt| DoseRate {
		dose_per_tilt,
		pre_dose: args.pre_dose
	});
	let doses = resolve::resolve_doses(&sources, args.custom_dose_series.as_deref(), dose_rate, total_tilts, policy)?;
	info!("The following doses are used for dose weighting each tilt image: {}", display_list(&doses));

	if args.dry_run {
		info!("Skipping the dose weighting, this is a dry run");
		return Ok(());
	}

	dose_filter::dose_weight_stack(&mut stack, &doses, pixel_size)?;

	let out_path = mrc::appended_path(path, file_append);
	stack.save(&out_path)?;
	info!("Saved dose weighted stack: {}", out_path.to_string_lossy());

	Ok(())
}
