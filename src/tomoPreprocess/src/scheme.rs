use std::fmt;
use std::str::FromStr;

use crate::error::TiltOrderError;


/// The order in which a microscope visits the tilt angles of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TiltScheme {
	ContinuousPositive,
	ContinuousNegative,
	BidirectionalPositive,
	BidirectionalNegative,
	DoseSymmetricPositive,
	DoseSymmetricNegative
}

impl TiltScheme {

	pub const ALL: [TiltScheme; 6] = [
		TiltScheme::ContinuousPositive,
		TiltScheme::ContinuousNegative,
		TiltScheme::BidirectionalPositive,
		TiltScheme::BidirectionalNegative,
		TiltScheme::DoseSymmetricPositive,
		TiltScheme::DoseSymmetricNegative
	];

	pub fn name(&self) -> &'static str {
		match self {
			TiltScheme::ContinuousPositive => "continuous_positive",
			TiltScheme::ContinuousNegative => "continuous_negative",
			TiltScheme::BidirectionalPositive => "bidirectional_positive",
			TiltScheme::BidirectionalNegative => "bidirectional_negative",
			TiltScheme::DoseSymmetricPositive => "dose_symmetric_positive",
			TiltScheme::DoseSymmetricNegative => "dose_symmetric_negative"
		}
	}

	/// continuous schemes always start at one end, so they ignore the starting angle
	pub fn uses_starting_angle(&self) -> bool {
		!matches!(self, TiltScheme::ContinuousPositive | TiltScheme::ContinuousNegative)
	}

	pub fn uses_groups(&self) -> bool {
		matches!(self, TiltScheme::DoseSymmetricPositive | TiltScheme::DoseSymmetricNegative)
	}

	pub fn accepted_names() -> String {
		Self::ALL.iter()
			.map(TiltScheme::name)
			.collect::<Vec<_>>()
			.join(", ")
	}
}

impl FromStr for TiltScheme {

	type Err = TiltOrderError;

	fn from_str(s: &str) -> Result<Self,Self::Err> {
		Self::ALL.iter()
			.find(|scheme| scheme.name() == s)
			.copied()
			.ok_or_else(|| TiltOrderError::InvalidScheme {
				name: s.to_string(),
				accepted: Self::accepted_names()
			})
	}
}

impl fmt::Display for TiltScheme {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
