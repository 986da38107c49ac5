use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::Pattern;
use tracing::info;

use crate::error::display_list;
use crate::order;
use crate::order_file::TiltOrderFile;
use crate::scheme::TiltScheme;
use crate::tilt_series::{self, TiltSeriesSpec};
use crate::validate::{self, LengthPolicy};


/// The scheme and geometry arguments, as the user gave them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemeArgs {
	pub tilt_scheme: Option<String>,
	pub min_angle: Option<f64>,
	pub angle_step: Option<f64>,
	pub starting_angle: Option<f64>,
	pub group_size: Option<u32>,
	pub groups_uncentered: bool
}

impl SchemeArgs {

	pub fn is_empty(&self) -> bool {
		self.tilt_scheme.is_none()
			&& self.min_angle.is_none()
			&& self.angle_step.is_none()
			&& self.starting_angle.is_none()
			&& self.group_size.is_none()
			&& !self.groups_uncentered
	}

	pub fn to_spec(&self, total_tilts: u32) -> Result<TiltSeriesSpec> {

		let name = self.tilt_scheme.as_deref()
			.context("Missing argument: --tilt-scheme")?;
		let scheme = name.parse::<TiltScheme>()?;
		let min_angle = self.min_angle
			.context("Missing argument: --min-angle")?;
		let angle_step = self.angle_step
			.context("Missing argument: --angle-step")?;

		let mut spec = TiltSeriesSpec::new(scheme, total_tilts, min_angle, angle_step);

		if let Some(starting_angle) = self.starting_angle {
			if !scheme.uses_starting_angle() && starting_angle != TiltSeriesSpec::DEFAULT_STARTING_ANGLE {
				bail!("Starting angle not required with {} tilt scheme", scheme);
			}
			spec = spec.with_starting_angle(starting_angle);
		}

		let group_size = self.group_size
			.unwrap_or(TiltSeriesSpec::DEFAULT_GROUP_SIZE);
		if !scheme.uses_groups() && (group_size != TiltSeriesSpec::DEFAULT_GROUP_SIZE || self.groups_uncentered) {
			bail!("Tilt groups are only used with dose symmetric tilt schemes, not {}", scheme);
		}
		spec = spec.with_groups(group_size, !self.groups_uncentered);

		Ok(spec)
	}
}


/// Cumulative dose per tilt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseRate {
	pub dose_per_tilt: f64,
	pub pre_dose: f64
}


/// Everything that could say what order a tilt series was collected in.
/// Sources are tried in order: the tilt order file (if it exists), the custom order, then the scheme.
#[derive(Debug, Clone, Default)]
pub struct OrderSources {
	pub tilt_order_file: Option<PathBuf>,
	pub custom_order: Option<String>,
	pub scheme: SchemeArgs
}


#[derive(Debug, Clone, PartialEq)]
pub enum OrderOrigin {
	TiltOrderFile(PathBuf),
	CustomOrder,
	Scheme(TiltSeriesSpec)
}


#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOrder {
	pub origin: OrderOrigin,
	pub order_list: Vec<u32>,
	pub doses: Option<Vec<f64>>
}

impl ResolvedOrder {

	/// Fills in doses from the dose rate, unless they were already known
	pub fn with_derived_doses(mut self, dose_rate: Option<DoseRate>, total_tilts: u32, policy: LengthPolicy) -> Result<Self> {
		if self.doses.is_none() {
			if let Some(rate) = dose_rate {
				let doses = tilt_series::doses_from_order(&self.order_list, rate.dose_per_tilt, rate.pre_dose);
				self.doses = Some(validate::validate_doses(doses, total_tilts, policy)?);
			}
		}
		Ok(self)
	}

	pub fn require_doses(&self) -> Result<&[f64]> {
		self.doses.as_deref()
			.context("Missing argument: --dose-per-tilt (doses are needed, but none were given in a tilt order file)")
	}

	pub fn acquisition_sequence(&self) -> Vec<usize> {
		order::acquisition_sequence(&self.order_list)
	}

	pub fn to_file(&self) -> TiltOrderFile {
		TiltOrderFile::new(self.order_list.clone(), self.doses.clone())
	}
}


/// Finds the acquisition order of a tilt series, and the doses if they were given explicitly
pub fn resolve_order(sources: &OrderSources, total_tilts: u32, policy: LengthPolicy) -> Result<ResolvedOrder> {

	if total_tilts == 0 {
		bail!("Tilt series has no tilts");
	}

	if let Some(path) = &sources.tilt_order_file {
		let exists = path.try_exists()
			.context(format!("Failed to check tilt order file: {}", path.to_string_lossy()))?;
		if exists {
			let file = TiltOrderFile::read(path)?;
			let order_list = validate::validate_order_list(file.order_list, total_tilts, policy)
				.context(format!("Bad tilt order in file: {}", path.to_string_lossy()))?;
			let doses = file.doses
				.map(|doses| validate::validate_doses(doses, total_tilts, policy))
				.transpose()
				.context(format!("Bad doses in file: {}", path.to_string_lossy()))?;
			info!("Using tilt order from file: {}", display_list(&order_list));
			return Ok(ResolvedOrder {
				origin: OrderOrigin::TiltOrderFile(path.clone()),
				order_list,
				doses
			});
		}
	}

	if let Some(custom_order) = &sources.custom_order {
		if !sources.scheme.is_empty() {
			bail!("Tilt info arguments cannot be used with a custom tilt order");
		}
		let order_list = validate::parse_order_list(custom_order)
			.context("Failed to read custom tilt order")?;
		let order_list = validate::validate_order_list(order_list, total_tilts, policy)
			.context("Bad custom tilt order")?;
		info!("Using custom tilt order: {}", display_list(&order_list));
		return Ok(ResolvedOrder {
			origin: OrderOrigin::CustomOrder,
			order_list,
			doses: None
		});
	}

	let spec = sources.scheme.to_spec(total_tilts)
		.context("Tilt info arguments are required")?;
	info!("{}", spec.summary());
	let result = spec.tilt_order()?;
	Ok(ResolvedOrder {
		origin: OrderOrigin::Scheme(spec),
		order_list: result.order_list,
		doses: None
	})
}


/// Finds the cumulative dose of every tilt, for dose weighting.
/// A custom dose series wins over everything else.
pub fn resolve_doses(
	sources: &OrderSources,
	custom_doses: Option<&str>,
	dose_rate: Option<DoseRate>,
	total_tilts: u32,
	policy: LengthPolicy
) -> Result<Vec<f64>> {

	if let Some(custom_doses) = custom_doses {
		let doses = validate::validate_dose_list(&validate::split_list(custom_doses), total_tilts, policy)
			.context("Bad custom dose series")?;
		info!("Using custom dose series: {}", display_list(&doses));
		return Ok(doses);
	}

	let resolved = resolve_order(sources, total_tilts, policy)?
		.with_derived_doses(dose_rate, total_tilts, policy)?;
	Ok(resolved.require_doses()?.to_vec())
}


/// Finds the tilt images of a series folder, sorted by name.
/// The sorted names must follow the physical (angle) order of the tilts.
pub fn series_files(folder: impl AsRef<Path>, pattern: &str) -> Result<Vec<PathBuf>> {

	let folder = folder.as_ref();
	let full_pattern = format!("{}/{}", Pattern::escape(&folder.to_string_lossy()), pattern);

	let mut files = glob::glob(&full_pattern)
		.context(format!("Bad input files pattern: {}", pattern))?
		.collect::<Result<Vec<_>,_>>()
		.context(format!("Failed to list input files in folder: {}", folder.to_string_lossy()))?;
	files.sort();

	if files.is_empty() {
		bail!("No input files matching {} in folder: {}", pattern, folder.to_string_lossy());
	}

	Ok(files)
}
