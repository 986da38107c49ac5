use std::cmp::min;

use crate::error::TiltOrderError;
use crate::scheme::TiltScheme;


/// Computes the 1-based acquisition number of a single tilt.
///
/// `tilt_num` is the 1-based physical position of the tilt in the series (sorted by angle),
/// and `zero_tilt_index` is the 0-based physical position of the tilt the acquisition started from.
/// `group_size` and `groups_centered` only matter for the dose-symmetric schemes.
///
/// Calling this for every tilt in `1 ..= total_tilts` gives a permutation of `1 ..= total_tilts`.
pub fn tilt_order(
	scheme: TiltScheme,
	tilt_num: u32,
	total_tilts: u32,
	zero_tilt_index: usize,
	group_size: u32,
	groups_centered: bool
) -> Result<u32,TiltOrderError> {

	check_series(total_tilts, zero_tilt_index, group_size)?;
	if tilt_num < 1 || tilt_num > total_tilts {
		return Err(TiltOrderError::TiltOutOfRange {
			tilt_num,
			total_tilts
		});
	}

	let centre = zero_tilt_index as u32 + 1;

	let order = match scheme {

		TiltScheme::ContinuousPositive => tilt_num,

		TiltScheme::ContinuousNegative => total_tilts - tilt_num + 1,

		// walk up from the centre, then come back for the negative side
		TiltScheme::BidirectionalPositive =>
			if tilt_num >= centre {
				tilt_num - centre + 1
			} else {
				total_tilts - tilt_num + 1
			},

		// walk down from the centre, then come back for the positive side
		TiltScheme::BidirectionalNegative =>
			if tilt_num <= centre {
				centre - tilt_num + 1
			} else {
				tilt_num
			},

		TiltScheme::DoseSymmetricPositive | TiltScheme::DoseSymmetricNegative =>
			DoseSymmetric::new(scheme, total_tilts, centre, group_size, groups_centered)
				.order_of(tilt_num)?
	};

	Ok(order)
}


/// Computes the acquisition number of every tilt in the series, in physical order
pub fn order_list(
	scheme: TiltScheme,
	total_tilts: u32,
	zero_tilt_index: usize,
	group_size: u32,
	groups_centered: bool
) -> Result<Vec<u32>,TiltOrderError> {

	check_series(total_tilts, zero_tilt_index, group_size)?;

	match scheme {

		// walk the whole series once, instead of once per tilt
		TiltScheme::DoseSymmetricPositive | TiltScheme::DoseSymmetricNegative => {
			let centre = zero_tilt_index as u32 + 1;
			DoseSymmetric::new(scheme, total_tilts, centre, group_size, groups_centered).order_list()
		}

		_ => (1 ..= total_tilts)
			.map(|tilt_num| tilt_order(scheme, tilt_num, total_tilts, zero_tilt_index, group_size, groups_centered))
			.collect()
	}
}


/// Inverts an order list: entry `k` is the 0-based physical index of the tilt acquired `k+1`-th.
/// The order list must already be a valid permutation.
pub fn acquisition_sequence(order_list: &[u32]) -> Vec<usize> {
	let mut sequence = vec![0; order_list.len()];
	for (i, &order) in order_list.iter().enumerate() {
		sequence[order as usize - 1] = i;
	}
	sequence
}


fn check_series(total_tilts: u32, zero_tilt_index: usize, group_size: u32) -> Result<(),TiltOrderError> {
	if total_tilts == 0 {
		return Err(TiltOrderError::EmptySeries);
	}
	if zero_tilt_index >= total_tilts as usize {
		return Err(TiltOrderError::CentreOutOfRange {
			zero_tilt_index,
			total_tilts
		});
	}
	if group_size == 0 {
		return Err(TiltOrderError::InvalidGroupSize);
	}
	Ok(())
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
	Minus,
	Plus
}

impl Side {

	fn opposite(self) -> Self {
		match self {
			Side::Minus => Side::Plus,
			Side::Plus => Side::Minus
		}
	}
}


/// A dose-symmetric series, split into the symmetric window around the centre
/// and the tail of the longer side, which is collected continuously once the short side runs out.
struct DoseSymmetric {
	total_tilts: u32,
	centre: u32,
	/// tilts from the centre to the nearest end of the series, counting the centre
	edge_distance: u32,
	walk: GroupWalk
}

impl DoseSymmetric {

	fn new(scheme: TiltScheme, total_tilts: u32, centre: u32, group_size: u32, groups_centered: bool) -> Self {

		let lead =
			if scheme == TiltScheme::DoseSymmetricNegative {
				Side::Minus
			} else {
				Side::Plus
			};

		// the biggest window around the centre that has the same number of tilts on both sides
		let edge_distance = min(centre, total_tilts - centre + 1);

		Self {
			total_tilts,
			centre,
			edge_distance,
			walk: GroupWalk::new(lead, edge_distance - 1, group_size, groups_centered)
		}
	}

	fn subseries_offset(&self) -> u32 {
		self.centre - self.edge_distance
	}

	/// the order of tilts outside the symmetric window
	fn tail_order(&self, tilt_num: u32) -> Option<u32> {
		if tilt_num <= self.subseries_offset() {
			Some(self.total_tilts - tilt_num + 1)
		} else if tilt_num >= self.centre + self.edge_distance {
			Some(tilt_num)
		} else {
			None
		}
	}

	fn order_of(&self, tilt_num: u32) -> Result<u32,TiltOrderError> {
		if let Some(order) = self.tail_order(tilt_num) {
			return Ok(order);
		}
		let (minus, plus) = self.walk.orders();
		self.window_order(tilt_num, &minus, &plus)
			.ok_or_else(|| self.out_of_range(tilt_num))
	}

	fn order_list(&self) -> Result<Vec<u32>,TiltOrderError> {
		let (minus, plus) = self.walk.orders();
		(1 ..= self.total_tilts)
			.map(|tilt_num| {
				self.tail_order(tilt_num)
					.or_else(|| self.window_order(tilt_num, &minus, &plus))
					.ok_or_else(|| self.out_of_range(tilt_num))
			})
			.collect()
	}

	fn out_of_range(&self, tilt_num: u32) -> TiltOrderError {
		TiltOrderError::TiltOutOfRange {
			tilt_num,
			total_tilts: self.total_tilts
		}
	}

	fn window_order(&self, tilt_num: u32, minus: &[u32], plus: &[u32]) -> Option<u32> {
		if tilt_num == self.centre {
			Some(1)
		} else if tilt_num > self.centre {
			plus.get((tilt_num - self.centre - 1) as usize).copied()
		} else {
			minus.get((self.centre - tilt_num - 1) as usize).copied()
		}
	}
}


/// Alternating outward walk over the symmetric part of a dose-symmetric series.
///
/// The centre itself is always acquired first, then groups of tilts are taken from each side in turn,
/// starting with the `lead` side, each group walking away from the centre.
struct GroupWalk {
	lead: Side,
	reach: u32,
	group_size: u32,
	lead_first_group: u32
}

impl GroupWalk {

	fn new(lead: Side, reach: u32, group_size: u32, groups_centered: bool) -> Self {

		// uncentred groups count the centre as part of the first group on the lead side,
		// which pulls every group boundary on that side one step in
		let lead_first_group =
			if groups_centered || group_size == 1 {
				group_size
			} else {
				group_size - 1
			};

		Self {
			lead,
			reach,
			group_size,
			lead_first_group
		}
	}

	/// Acquisition numbers of the minus and plus sides, indexed by distance from the centre (0 is the closest)
	fn orders(&self) -> (Vec<u32>, Vec<u32>) {

		let reach = self.reach as usize;
		let mut minus = Vec::with_capacity(reach);
		let mut plus = Vec::with_capacity(reach);

		let mut acquired = 1;
		let mut side = self.lead;
		let mut group_size = self.lead_first_group as usize;
		while minus.len() < reach || plus.len() < reach {

			let orders = match side {
				Side::Minus => &mut minus,
				Side::Plus => &mut plus
			};

			// a side that ran out just passes its turn
			let count = min(group_size, reach - orders.len());
			for _ in 0 .. count {
				acquired += 1;
				orders.push(acquired);
			}

			side = side.opposite();
			group_size = self.group_size as usize;
		}

		(minus, plus)
	}
}
