use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use gumdrop::Options;
use tracing::info;

use crate::config::Config;
use crate::dose_filter::{self, DoseFilter};
use crate::mrc::{self, Layout, Mrc};


#[derive(Options)]
pub struct Args {

	#[options(help_flag)]
	help: bool,

	/// Images or image stacks averaged over a dose weighted tilt series
	#[options(free)]
	files: Vec<String>,

	/// The pixel size of the images in Angstroms. If not given, it's read from the file header
	#[options(no_short, meta = "APIX")]
	pixel_size: Option<f64>,

	/// Dose applied per tilt image (in e-/A^2)
	#[options(no_short, meta = "DOSE")]
	dose_per_tilt: Option<f64>,

	/// Exposure before the tilt series was collected (in e-/A^2)
	#[options(no_short, meta = "DOSE", default = "0")]
	pre_dose: f64,

	/// The number of tilts included in the reconstruction.
	/// This can be less than the total number collected so long as those removed were the last to be collected
	#[options(no_short, meta = "N")]
	number_of_tilts: Option<u32>,

	/// String appended to the output file name
	#[options(no_short, meta = "STR")]
	file_append: Option<String>,

	/// Overwrite the input files instead of writing new ones
	#[options(no_short)]
	in_place: bool,

	/// Filter image stacks as one volume, eg a tomogram whose header says it's a stack
	#[options(no_short)]
	interpret_as_slices: bool,

	/// Filter volumes one section at a time, as if they were image stacks
	#[options(no_short)]
	interpret_as_images: bool
}


impl Args {

	fn layout(&self, header: Layout) -> Layout {
		match header {
			Layout::Volume if self.interpret_as_images => Layout::ImageStack,
			Layout::ImageStack if self.interpret_as_slices => Layout::Volume,
			layout => layout
		}
	}
}


pub fn run(config: &Config, args: Args) -> Result<()> {

	if args.interpret_as_slices && args.interpret_as_images {
		bail!("Choose one of --interpret-as-slices or --interpret-as-images, not both");
	}

	let filter = DoseFilter::Sharpen {
		dose_per_tilt: args.dose_per_tilt
			.context("Missing argument: --dose-per-tilt")?,
		pre_dose: args.pre_dose,
		number_of_tilts: args.number_of_tilts
			.context("Missing argument: --number-of-tilts")?
	};
	let file_append = args.file_append.clone()
		.unwrap_or_else(|| config.dose_weight.sharpen_file_append.clone());

	let files = args.files.iter()
		.map(PathBuf::from)
		.collect::<Vec<_>>();
	super::for_each_series(
		&files,
		|file| file.to_string_lossy().to_string(),
		|file| run_file(&args, file, filter, &file_append)
	)
}


fn run_file(args: &Args, path: &Path, filter: DoseFilter, file_append: &str) -> Result<()> {

	let mut mrc = Mrc::read(path)?;
	let pixel_size = args.pixel_size
		.unwrap_or(mrc.pixel_size() as f64);

	let layout = args.layout(mrc.layout());
	info!("Sharpening {} with pixel size {}", layout_name(layout), pixel_size);
	match layout {
		Layout::Volume => dose_filter::filter_volume(&mut mrc, filter, pixel_size)?,
		Layout::Image | Layout::ImageStack => dose_filter::filter_stack(&mut mrc, filter, pixel_size)?
	}

	let out_path =
		if args.in_place {
			path.to_path_buf()
		} else {
			mrc::appended_path(path, file_append)
		};
	mrc.save(&out_path)?;
	info!("Saved sharpened file: {}", out_path.to_string_lossy());

	Ok(())
}


fn layout_name(layout: Layout) -> &'static str {
	match layout {
		Layout::Image => "a single image",
		Layout::ImageStack => "an image stack",
		Layout::Volume => "a single volume"
	}
}
