use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use gumdrop::Options;
use tracing::info;

use crate::config::Config;
use crate::error::display_list;
use crate::resolve::{self, DoseRate, OrderOrigin, OrderSources, ResolvedOrder, SchemeArgs};
use crate::tilt_series;
use crate::validate::LengthPolicy;


#[derive(Options)]
pub struct Args {

	#[options(help_flag)]
	help: bool,

	/// Tilt series folders. Without any, the tilt order is only printed
	#[options(free)]
	folders: Vec<String>,

	/// The number of tilts in the series, when printing the tilt order without any folders
	#[options(no_short, meta = "N")]
	total_tilts: Option<u32>,

	/// Pattern for the tilt images in each folder, eg *.tif. Sorted by name, they must be in angle order
	#[options(no_short, meta = "GLOB")]
	input_files: Option<String>,

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

	/// A comma delimited list of integers denoting the order the tilts were taken
	#[options(no_short, meta = "LIST")]
	custom_tilt_order: Option<String>,

	/// Read the tilt order (and doses) from the tilt order file in each folder, when it exists
	#[options(no_short)]
	use_tilt_order_files: bool,

	/// Write a tilt order file into each folder. Existing files are kept, unless the config says otherwise
	#[options(no_short)]
	write_tilt_order_files: bool,

	/// Reject tilt orders and dose lists that are longer than the tilt series, instead of truncating them
	#[options(no_short)]
	strict_lengths: bool
}

impl Args {

	fn scheme(&self) -> SchemeArgs {
		SchemeArgs {
			tilt_scheme: self.tilt_scheme.clone(),
			min_angle: self.min_angle,
			angle_step: self.angle_step,
			starting_angle: self.starting_angle,
			group_size: self.group_size,
			groups_uncentered: self.groups_uncentered
		}
	}

	fn dose_rate(&self) -> Option<DoseRate> {
		self.dose_per_tilt.map(|dose_per_tilt| DoseRate {
			dose_per_tilt,
			pre_dose: self.pre_dose
		})
	}

	fn policy(&self, config: &Config) -> LengthPolicy {
		if self.strict_lengths {
			LengthPolicy::Strict
		} else {
			config.length_policy()
		}
	}
}


pub fn run(config: &Config, args: Args) -> Result<()> {

	let policy = args.policy(config);

	// no folders, just show the order
	if args.folders.is_empty() {
		let total_tilts = args.total_tilts
			.context("Missing argument: --total-tilts")?;
		let sources = OrderSources {
			tilt_order_file: None,
			custom_order: args.custom_tilt_order.clone(),
			scheme: args.scheme()
		};
		let resolved = resolve::resolve_order(&sources, total_tilts, policy)?
			.with_derived_doses(args.dose_rate(), total_tilts, policy)?;
		print_table(&resolved, args.dose_per_tilt);
		return Ok(());
	}

	// folders count their own tilts
	if args.total_tilts.is_some() {
		bail!("--total-tilts can't be used with folders, each folder's tilts are counted with --input-files");
	}
	let input_files = args.input_files.as_deref()
		.context("Missing argument: --input-files")?;

	let folders = args.folders.iter()
		.map(PathBuf::from)
		.collect::<Vec<_>>();
	super::for_each_series(
		&folders,
		|folder| folder.to_string_lossy().to_string(),
		|folder| run_folder(config, &args, folder, input_files, policy)
	)
}


fn run_folder(config: &Config, args: &Args, folder: &Path, input_files: &str, policy: LengthPolicy) -> Result<()> {

	let files = resolve::series_files(folder, input_files)?;
	let total_tilts = u32::try_from(files.len())
		.context("Too many input files")?;
	info!("Found {} tilt images", total_tilts);

	let tilt_order_path = folder.join(&config.tilt_order.filename);
	let sources = OrderSources {
		tilt_order_file: args.use_tilt_order_files
			.then(|| tilt_order_path.clone()),
		custom_order: args.custom_tilt_order.clone(),
		scheme: args.scheme()
	};

	let resolved = resolve::resolve_order(&sources, total_tilts, policy)?
		.with_derived_doses(args.dose_rate(), total_tilts, policy)?;

	let sequence = resolved.acquisition_sequence()
		.into_iter()
		.map(|i| file_name(&files[i]))
		.collect::<Vec<_>>();
	info!("Tilt images in acquisition order: {}", display_list(&sequence));
	if let Some(doses) = &resolved.doses {
		info!("Doses: {}", display_list(doses));
	}

	if args.write_tilt_order_files {
		resolved.to_file()
			.write(&tilt_order_path, config.tilt_order.overwrite)?;
	}

	Ok(())
}


fn file_name(path: &Path) -> String {
	path.file_name()
		.map(|name| name.to_string_lossy().to_string())
		.unwrap_or_else(|| path.to_string_lossy().to_string())
}


fn print_table(resolved: &ResolvedOrder, dose_per_movie: Option<f64>) {

	let angles = match &resolved.origin {
		OrderOrigin::Scheme(spec) => Some(spec.angles()),
		_ => None
	};
	let initial_doses = resolved.doses.as_deref()
		.zip(dose_per_movie)
		.map(|(doses, dose_per_movie)| tilt_series::initial_doses(doses, dose_per_movie));

	let mut header = vec!["tilt"];
	if angles.is_some() {
		header.push("angle");
	}
	header.push("order");
	if resolved.doses.is_some() {
		header.push("dose");
	}
	if initial_doses.is_some() {
		header.push("initial_dose");
	}
	println!("{}", header.join("\t"));

	for (i, order) in resolved.order_list.iter().enumerate() {
		let mut row = vec![(i + 1).to_string()];
		if let Some(angles) = &angles {
			row.push(angles[i].to_string());
		}
		row.push(order.to_string());
		if let Some(doses) = &resolved.doses {
			row.push(format!("{:.2}", doses[i]));
		}
		if let Some(initial_doses) = &initial_doses {
			row.push(format!("{:.2}", initial_doses[i]));
		}
		println!("{}", row.join("\t"));
	}
}
