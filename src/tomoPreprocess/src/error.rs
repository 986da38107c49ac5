use thiserror::Error;


/// Everything that can go wrong while computing or checking a tilt order
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TiltOrderError {

	#[error("Tilt scheme not supported: {name}. Accepted tilt schemes are {accepted}")]
	InvalidScheme {
		name: String,
		accepted: String
	},

	#[error("Tilt order must be a continuous set of integers from 1 to {total_tilts}, got: {order}")]
	NonPermutation {
		order: String,
		total_tilts: u32
	},

	#[error("Tilt order supplied has {supplied} entries, but the tilt series has {total_tilts} tilts")]
	BadOrderLength {
		supplied: usize,
		total_tilts: u32
	},

	#[error("Dose list supplied has {supplied} entries, but the tilt series has {total_tilts} tilts")]
	BadDoseLength {
		supplied: usize,
		total_tilts: u32
	},

	#[error("Tilt order entries must be integers, got: {value}")]
	BadOrderValue {
		value: String
	},

	#[error("Doses must be numbers, got: {value}")]
	BadDoseValue {
		value: String
	},

	#[error("Tilt number {tilt_num} is outside the tilt series 1 ..= {total_tilts}")]
	TiltOutOfRange {
		tilt_num: u32,
		total_tilts: u32
	},

	#[error("Zero tilt index {zero_tilt_index} is outside the tilt series of {total_tilts} tilts")]
	CentreOutOfRange {
		zero_tilt_index: usize,
		total_tilts: u32
	},

	#[error("Group size must be at least 1")]
	InvalidGroupSize,

	#[error("Tilt series has no tilts")]
	EmptySeries
}


pub(crate) fn display_list<T: ToString>(list: &[T]) -> String {
	list.iter()
		.map(T::to_string)
		.collect::<Vec<_>>()
		.join(", ")
}
