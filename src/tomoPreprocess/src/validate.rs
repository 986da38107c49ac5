use tracing::warn;

use crate::error::{display_list, TiltOrderError};


/// What to do with order and dose lists that are longer than the tilt series.
/// Lists that are too short are always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
	/// keep the first entries and warn
	#[default]
	Truncate,
	/// reject the list
	Strict
}

impl LengthPolicy {

	pub fn from_strict(strict: bool) -> Self {
		if strict {
			LengthPolicy::Strict
		} else {
			LengthPolicy::Truncate
		}
	}
}


#[derive(Debug, Clone, Copy)]
enum ListKind {
	Order,
	Dose
}

impl ListKind {

	fn label(&self) -> &'static str {
		match self {
			ListKind::Order => "Tilt order",
			ListKind::Dose => "Dose list"
		}
	}

	fn length_error(&self, supplied: usize, total_tilts: u32) -> TiltOrderError {
		match self {
			ListKind::Order => TiltOrderError::BadOrderLength { supplied, total_tilts },
			ListKind::Dose => TiltOrderError::BadDoseLength { supplied, total_tilts }
		}
	}
}


fn fit_length<T: ToString>(mut list: Vec<T>, total_tilts: u32, policy: LengthPolicy, kind: ListKind) -> Result<Vec<T>,TiltOrderError> {

	let total = total_tilts as usize;
	let too_long = list.len() > total;
	if list.len() < total || (too_long && policy == LengthPolicy::Strict) {
		return Err(kind.length_error(list.len(), total_tilts));
	}

	if too_long {
		list.truncate(total);
		warn!("{} supplied is too long. Truncating to {}", kind.label(), display_list(&list));
	}

	Ok(list)
}


/// Checks the order list has one entry per tilt and is a permutation of `1 ..= total_tilts`
pub fn validate_order_list(order_list: Vec<u32>, total_tilts: u32, policy: LengthPolicy) -> Result<Vec<u32>,TiltOrderError> {

	let order_list = fit_length(order_list, total_tilts, policy, ListKind::Order)?;

	let mut sorted = order_list.clone();
	sorted.sort_unstable();
	let is_permutation = sorted.iter()
		.zip(1 ..= total_tilts)
		.all(|(&obs, exp)| obs == exp);
	if !is_permutation {
		return Err(TiltOrderError::NonPermutation {
			order: display_list(&order_list),
			total_tilts
		});
	}

	Ok(order_list)
}


/// Checks the dose list has one entry per tilt and converts the entries to numbers
pub fn validate_dose_list<S: AsRef<str>>(doses: &[S], total_tilts: u32, policy: LengthPolicy) -> Result<Vec<f64>,TiltOrderError> {

	let doses = doses.iter()
		.map(|dose| dose.as_ref().trim())
		.collect::<Vec<_>>();
	let doses = fit_length(doses, total_tilts, policy, ListKind::Dose)?;

	doses.into_iter()
		.map(parse_dose)
		.collect()
}


/// Same as `validate_dose_list`, for doses that are already numbers
pub fn validate_doses(doses: Vec<f64>, total_tilts: u32, policy: LengthPolicy) -> Result<Vec<f64>,TiltOrderError> {

	let doses = fit_length(doses, total_tilts, policy, ListKind::Dose)?;

	if let Some(dose) = doses.iter().find(|dose| !dose.is_finite()) {
		return Err(TiltOrderError::BadDoseValue {
			value: dose.to_string()
		});
	}

	Ok(doses)
}


/// Parses a comma-delimited list of acquisition numbers, eg `3,2,1,4,5`
pub fn parse_order_list(list: &str) -> Result<Vec<u32>,TiltOrderError> {
	split_list(list)
		.into_iter()
		.map(parse_order)
		.collect()
}


/// Splits a comma-delimited list, without interpreting the entries
pub fn split_list(list: &str) -> Vec<&str> {
	list.split(',')
		.map(str::trim)
		.collect()
}


pub(crate) fn parse_order(value: &str) -> Result<u32,TiltOrderError> {
	value.trim()
		.parse::<u32>()
		.map_err(|_| TiltOrderError::BadOrderValue {
			value: value.to_string()
		})
}


pub(crate) fn parse_dose(value: &str) -> Result<f64,TiltOrderError> {
	value.trim()
		.parse::<f64>()
		.ok()
		.filter(|dose| dose.is_finite())
		.ok_or_else(|| TiltOrderError::BadDoseValue {
			value: value.to_string()
		})
}
