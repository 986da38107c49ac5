use std::sync::Arc;

use anyhow::{bail, Result};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use tracing::{debug, info};

use crate::mrc::Mrc;


// critical exposure curve constants, from Grant & Grigorieff 2015
pub const A: f64 = 0.245;
pub const B: f64 = -1.665;
pub const C: f64 = 2.81;


/// The exposure (in e-/A^2) at which the signal at spatial frequency `freq` (in 1/A) falls to 1/e
pub fn critical_exposure(freq: f64) -> f64 {
	A*freq.powf(B) + C
}


/// Radial spatial frequency (in 1/A) of every pixel of an image's (or volume's) Fourier transform,
/// in the unshifted layout the FFT produces (zero frequency at index 0).
pub struct FrequencyMap {
	nx: usize,
	ny: usize,
	nz: usize,
	freqs: Vec<f64>
}

impl FrequencyMap {

	pub fn new(nx: usize, ny: usize, pixel_size: f64) -> Self {
		Self::volume(nx, ny, 1, pixel_size)
	}

	pub fn volume(nx: usize, ny: usize, nz: usize, pixel_size: f64) -> Self {

		let step = |n: usize| 1.0/((n as f64)*pixel_size);
		let (x_step, y_step, z_step) = (step(nx), step(ny), step(nz));

		let mut freqs = Vec::with_capacity(nx*ny*nz);
		for z in 0 .. nz {
			let fz = z_step*(signed_index(z, nz) as f64);
			for y in 0 .. ny {
				let fy = y_step*(signed_index(y, ny) as f64);
				for x in 0 .. nx {
					let fx = x_step*(signed_index(x, nx) as f64);
					freqs.push((fx*fx + fy*fy + fz*fz).sqrt());
				}
			}
		}

		Self {
			nx,
			ny,
			nz,
			freqs
		}
	}

	pub fn nx(&self) -> usize {
		self.nx
	}

	pub fn ny(&self) -> usize {
		self.ny
	}

	pub fn nz(&self) -> usize {
		self.nz
	}

	pub fn get(&self, x: usize, y: usize, z: usize) -> f64 {
		self.freqs[(z*self.ny + y)*self.nx + x]
	}

	pub fn values(&self) -> &[f64] {
		&self.freqs
	}
}


/// maps an FFT index to its signed frequency index, eg for n=4: 0,1,-2,-1
fn signed_index(i: usize, n: usize) -> isize {
	let half = n/2;
	((i + half) % n) as isize - half as isize
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DoseFilter {

	/// attenuates each frequency by the damage done by the cumulative dose
	DoseWeight {
		dose: f64
	},

	/// boosts frequencies of an image averaged over a whole tilt series,
	/// to undo the average attenuation of dose weighting
	Sharpen {
		dose_per_tilt: f64,
		pre_dose: f64,
		number_of_tilts: u32
	}
}

impl DoseFilter {

	pub fn value(&self, freq: f64) -> f64 {

		// the DC term is never attenuated
		if freq <= 0.0 {
			return 1.0;
		}

		match *self {

			DoseFilter::DoseWeight { dose } =>
				(-dose/(2.0*critical_exposure(freq))).exp(),

			DoseFilter::Sharpen { dose_per_tilt, pre_dose, number_of_tilts } => {
				let t = -1.0/(2.0*critical_exposure(freq));
				let n = number_of_tilts as f64;
				let q = (t*(dose_per_tilt + pre_dose)).exp()*(1.0 - (t*dose_per_tilt*n).exp())
					/(n*(1.0 - (t*dose_per_tilt).exp()));
				if q.is_finite() && q != 0.0 {
					1.0/q
				} else {
					1.0
				}
			}
		}
	}

	pub fn array(&self, freqs: &FrequencyMap) -> Vec<f64> {
		freqs.values()
			.iter()
			.map(|&freq| self.value(freq))
			.collect()
	}
}


/// Applies Fourier-space filters to images (or volumes) of a fixed size
pub struct FourierFilter {
	nx: usize,
	ny: usize,
	nz: usize,
	/// x, y, z plans
	fft: [Arc<dyn Fft<f64>>; 3],
	ifft: [Arc<dyn Fft<f64>>; 3],
	buf: Vec<Complex64>,
	line: Vec<Complex64>
}

impl FourierFilter {

	pub fn new(nx: usize, ny: usize) -> Self {
		Self::volume(nx, ny, 1)
	}

	pub fn volume(nx: usize, ny: usize, nz: usize) -> Self {
		let mut planner = FftPlanner::<f64>::new();
		Self {
			nx,
			ny,
			nz,
			fft: [nx, ny, nz].map(|n| planner.plan_fft_forward(n)),
			ifft: [nx, ny, nz].map(|n| planner.plan_fft_inverse(n)),
			buf: vec![Complex64::new(0.0, 0.0); nx*ny*nz],
			line: vec![Complex64::new(0.0, 0.0); ny.max(nz)]
		}
	}

	/// Filters the data in place. Both the data and the filter are in z(y(x)) order.
	pub fn apply(&mut self, data: &mut [f32], filter: &[f64]) -> Result<()> {

		let n = self.nx*self.ny*self.nz;
		if data.len() != n || filter.len() != n {
			bail!("Expected {}x{}x{} data and filter, got {} voxels and {} filter values", self.nx, self.ny, self.nz, data.len(), filter.len());
		}

		for (b, &v) in self.buf.iter_mut().zip(data.iter()) {
			*b = Complex64::new(v as f64, 0.0);
		}

		self.transform(false);
		for (b, &f) in self.buf.iter_mut().zip(filter) {
			*b *= f;
		}
		self.transform(true);

		// rustfft doesn't normalize the inverse transform
		let scale = 1.0/(n as f64);
		for (v, b) in data.iter_mut().zip(&self.buf) {
			*v = (b.re*scale) as f32;
		}

		Ok(())
	}

	fn transform(&mut self, inverse: bool) {

		let (nx, ny, nz) = (self.nx, self.ny, self.nz);
		let plans =
			if inverse {
				&self.ifft
			} else {
				&self.fft
			};

		// rows are contiguous, so transform them all at once
		plans[0].process(&mut self.buf);

		for z in 0 .. nz {
			for x in 0 .. nx {
				transform_line(&mut self.buf, &mut self.line[.. ny], &plans[1], z*nx*ny + x, nx);
			}
		}

		if nz > 1 {
			for y in 0 .. ny {
				for x in 0 .. nx {
					transform_line(&mut self.buf, &mut self.line[.. nz], &plans[2], y*nx + x, nx*ny);
				}
			}
		}
	}
}


/// transforms the strided line starting at `start`, using `line` as scratch space
fn transform_line(buf: &mut [Complex64], line: &mut [Complex64], fft: &Arc<dyn Fft<f64>>, start: usize, stride: usize) {
	for (i, v) in line.iter_mut().enumerate() {
		*v = buf[start + i*stride];
	}
	fft.process(line);
	for (i, v) in line.iter().enumerate() {
		buf[start + i*stride] = *v;
	}
}


/// Dose weights every image of a stack with its own cumulative dose.
/// The images must be in the same (physical) order as the doses.
pub fn dose_weight_stack(mrc: &mut Mrc, doses: &[f64], pixel_size: f64) -> Result<()> {

	if doses.len() != mrc.nz() as usize {
		bail!("Stack has {} images, but {} doses were given", mrc.nz(), doses.len());
	}

	let (nx, ny) = (mrc.nx() as usize, mrc.ny() as usize);
	debug!("Calculating frequency array ...");
	let freqs = FrequencyMap::new(nx, ny, pixel_size);
	let mut fourier = FourierFilter::new(nx, ny);

	for (z, &dose) in doses.iter().enumerate() {
		info!("Filtering image {} of {} with dose {}", z + 1, doses.len(), dose);
		let filter = DoseFilter::DoseWeight { dose }.array(&freqs);
		fourier.apply(mrc.image_mut(z as u32), &filter)?;
	}

	Ok(())
}


/// Applies the same filter to every image of a stack
pub fn filter_stack(mrc: &mut Mrc, filter: DoseFilter, pixel_size: f64) -> Result<()> {

	let (nx, ny) = (mrc.nx() as usize, mrc.ny() as usize);
	let filter = filter.array(&FrequencyMap::new(nx, ny, pixel_size));
	let mut fourier = FourierFilter::new(nx, ny);

	for z in 0 .. mrc.nz() {
		debug!("Filtering image {} of {}", z + 1, mrc.nz());
		fourier.apply(mrc.image_mut(z), &filter)?;
	}

	Ok(())
}


/// Applies a filter to the whole volume at once, so frequencies along z are filtered too
pub fn filter_volume(mrc: &mut Mrc, filter: DoseFilter, pixel_size: f64) -> Result<()> {

	let (nx, ny, nz) = (mrc.nx() as usize, mrc.ny() as usize, mrc.nz() as usize);
	debug!("Calculating 3D frequency array ...");
	let filter = filter.array(&FrequencyMap::volume(nx, ny, nz, pixel_size));

	FourierFilter::volume(nx, ny, nz)
		.apply(mrc.voxels_mut(), &filter)
}
