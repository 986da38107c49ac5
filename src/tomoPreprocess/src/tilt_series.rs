use tracing::warn;

use crate::error::TiltOrderError;
use crate::order;
use crate::scheme::TiltScheme;
use crate::validate::{self, LengthPolicy};


/// Describes how a tilt series was collected
#[derive(Debug, Clone, PartialEq)]
pub struct TiltSeriesSpec {
	pub scheme: TiltScheme,
	pub total_tilts: u32,
	/// the most negative angle, in degrees
	pub min_angle: f64,
	/// degrees between neighboring tilts
	pub angle_step: f64,
	/// the nominal angle of the first acquired tilt, in degrees
	pub starting_angle: f64,
	pub group_size: u32,
	pub groups_centered: bool
}

impl TiltSeriesSpec {

	pub const DEFAULT_STARTING_ANGLE: f64 = 0.0;
	pub const DEFAULT_GROUP_SIZE: u32 = 1;

	pub fn new(scheme: TiltScheme, total_tilts: u32, min_angle: f64, angle_step: f64) -> Self {
		Self {
			scheme,
			total_tilts,
			min_angle,
			angle_step,
			starting_angle: Self::DEFAULT_STARTING_ANGLE,
			group_size: Self::DEFAULT_GROUP_SIZE,
			groups_centered: true
		}
	}

	pub fn with_starting_angle(mut self, starting_angle: f64) -> Self {
		self.starting_angle = starting_angle;
		self
	}

	pub fn with_groups(mut self, group_size: u32, groups_centered: bool) -> Self {
		self.group_size = group_size;
		self.groups_centered = groups_centered;
		self
	}

	pub fn angle(&self, i: usize) -> f64 {
		self.min_angle + self.angle_step*(i as f64)
	}

	pub fn angles(&self) -> Vec<f64> {
		(0 .. self.total_tilts as usize)
			.map(|i| self.angle(i))
			.collect()
	}

	pub fn max_angle(&self) -> f64 {
		self.angle(self.total_tilts.saturating_sub(1) as usize)
	}

	pub fn zero_tilt_index(&self) -> Result<usize,TiltOrderError> {
		zero_tilt_index(self.min_angle, self.angle_step, self.total_tilts, self.starting_angle)
	}

	/// Computes the acquisition order of every tilt and checks it covers the whole series exactly once
	pub fn tilt_order(&self) -> Result<TiltOrderResult,TiltOrderError> {
		let zero_tilt_index = self.zero_tilt_index()?;
		let order_list = order::order_list(
			self.scheme,
			self.total_tilts,
			zero_tilt_index,
			self.group_size,
			self.groups_centered
		)?;
		let order_list = validate::validate_order_list(order_list, self.total_tilts, LengthPolicy::Strict)?;
		Ok(TiltOrderResult {
			order_list,
			zero_tilt_index
		})
	}

	pub fn assign_order_and_dose(&self, dose_per_tilt: f64, pre_dose: f64) -> Result<DoseAssignment,TiltOrderError> {
		let result = self.tilt_order()?;
		let doses = result.doses(dose_per_tilt, pre_dose);
		Ok(DoseAssignment {
			order_list: result.order_list,
			doses
		})
	}

	/// A human-readable description of the tilt series, for the log
	pub fn summary(&self) -> String {
		let starting_angle =
			if self.scheme.uses_starting_angle() {
				format!(" starting from {} degrees", self.starting_angle)
			} else {
				String::new()
			};
		let groups =
			if self.scheme.uses_groups() && self.group_size > 1 {
				format!(" in {} groups of {}", if self.groups_centered { "centred" } else { "uncentred" }, self.group_size)
			} else {
				String::new()
			};
		format!("Tilt series from {} to {} degrees in steps of {} degrees{} ({} tilts in total) using a {} tilt scheme{}",
			self.min_angle,
			self.max_angle(),
			self.angle_step,
			starting_angle,
			self.total_tilts,
			self.scheme,
			groups
		)
	}
}


/// Finds the tilt closest to the starting angle. Ties go to the lowest index.
pub fn zero_tilt_index(min_angle: f64, angle_step: f64, total_tilts: u32, starting_angle: f64) -> Result<usize,TiltOrderError> {

	if total_tilts == 0 {
		return Err(TiltOrderError::EmptySeries);
	}

	let mut best_i = 0;
	let mut best_dist = f64::INFINITY;
	for i in 0 .. total_tilts as usize {
		let angle = min_angle + angle_step*(i as f64);
		let dist = (angle - starting_angle).abs();
		if dist < best_dist {
			best_i = i;
			best_dist = dist;
		}
	}

	Ok(best_i)
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiltOrderResult {
	/// `order_list[i]` is the 1-based acquisition number of the tilt at physical position `i`
	pub order_list: Vec<u32>,
	pub zero_tilt_index: usize
}

impl TiltOrderResult {

	pub fn doses(&self, dose_per_tilt: f64, pre_dose: f64) -> Vec<f64> {
		doses_from_order(&self.order_list, dose_per_tilt, pre_dose)
	}
}


#[derive(Debug, Clone, PartialEq)]
pub struct DoseAssignment {
	pub order_list: Vec<u32>,
	/// cumulative dose at each physical position, after the tilt was recorded
	pub doses: Vec<f64>
}


/// Cumulative dose for each tilt, assuming every tilt got the same dose
pub fn doses_from_order(order_list: &[u32], dose_per_tilt: f64, pre_dose: f64) -> Vec<f64> {
	order_list.iter()
		.map(|&order| (order as f64)*dose_per_tilt + pre_dose)
		.collect()
}


/// Motion correction wants the dose at the start of each movie rather than at the end
pub fn initial_doses(doses: &[f64], dose_per_movie: f64) -> Vec<f64> {
	doses.iter()
		.enumerate()
		.map(|(i, &dose)| {
			let initial = dose - dose_per_movie;
			if initial < 0.0 {
				warn!("Initial dose for tilt {} can not be less than zero ({}), using 0 instead. Check the tilt order.", i + 1, initial);
				0.0
			} else {
				initial
			}
		})
		.collect()
}
