use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::error::TiltOrderError;
use crate::validate::{parse_dose, parse_order};


pub const DEFAULT_FILENAME: &str = "tilt.order";


/// A `tilt.order` file: one line per tilt in physical (angle) order,
/// with the acquisition number and optionally the cumulative dose after the tilt was recorded.
///
/// eg:
/// ```text
/// 7	21.000000
/// 5	15.000000
/// 3	9.000000
/// 1	3.000000
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TiltOrderFile {
	pub order_list: Vec<u32>,
	pub doses: Option<Vec<f64>>
}

impl TiltOrderFile {

	pub fn new(order_list: Vec<u32>, doses: Option<Vec<f64>>) -> Self {
		Self {
			order_list,
			doses
		}
	}

	pub fn parse(txt: &str) -> Result<Self,TiltOrderError> {

		let mut order_fields = Vec::<&str>::new();
		let mut dose_fields = Vec::<&str>::new();
		for line in txt.lines() {
			let mut fields = line.split_whitespace();
			if let Some(field) = fields.next() {
				order_fields.push(field);
			}
			if let Some(field) = fields.next() {
				dose_fields.push(field);
			}
		}

		let order_list = order_fields.into_iter()
			.map(parse_order)
			.collect::<Result<Vec<_>,_>>()?;

		let doses =
			if dose_fields.is_empty() {
				None
			} else if dose_fields.len() == order_list.len() {
				let doses = dose_fields.into_iter()
					.map(parse_dose)
					.collect::<Result<Vec<_>,_>>()?;
				Some(doses)
			} else {
				warn!("Tilt order file is formatted incorrectly: {} of {} lines have doses, ignoring the doses", dose_fields.len(), order_list.len());
				None
			};

		Ok(Self {
			order_list,
			doses
		})
	}

	pub fn read(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let txt = fs::read_to_string(path)
			.context(format!("Failed to read tilt order file: {}", path.to_string_lossy()))?;
		Self::parse(&txt)
			.context(format!("Failed to parse tilt order file: {}", path.to_string_lossy()))
	}

	pub fn to_text(&self) -> String {
		match &self.doses {
			Some(doses) =>
				self.order_list.iter()
					.zip(doses)
					.map(|(order, dose)| format!("{}\t{:.6}\n", order, dose))
					.collect(),
			None =>
				self.order_list.iter()
					.map(|order| format!("{}\n", order))
					.collect()
		}
	}

	/// Writes the file, unless one already exists and we're not allowed to overwrite it.
	/// Returns true if the file was written.
	pub fn write(&self, path: impl AsRef<Path>, overwrite: bool) -> Result<bool> {

		let path = path.as_ref();

		if let Some(doses) = &self.doses {
			if doses.len() != self.order_list.len() {
				bail!("Tilt order has {} entries but there are {} doses", self.order_list.len(), doses.len());
			}
		}

		let exists = path.try_exists()
			.context(format!("Failed to check tilt order file: {}", path.to_string_lossy()))?;
		if exists && !overwrite {
			info!("Tilt order file already exists, not overwriting: {}", path.to_string_lossy());
			return Ok(false);
		}

		fs::write(path, self.to_text())
			.context(format!("Failed to write tilt order file: {}", path.to_string_lossy()))?;
		info!("Wrote tilt order file: {}", path.to_string_lossy());

		Ok(true)
	}
}
