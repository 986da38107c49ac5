use galvanic_assert::{assert_that, matchers::*};

use tomo_preprocess::dose_filter::{critical_exposure, dose_weight_stack, filter_stack, filter_volume, DoseFilter, FourierFilter, FrequencyMap};
use tomo_preprocess::logging;
use tomo_preprocess::mrc::Mrc;


fn assert_close(obs: &[f32], exp: &[f32]) {
	assert_that!(&obs.len(), eq(exp.len()));
	for (o, e) in obs.iter().zip(exp) {
		assert_that!(&(o - e).abs(), lt(1e-4));
	}
}


/// a little image with some structure at every frequency
fn test_image(nx: usize, ny: usize) -> Vec<f32> {
	(0 .. nx*ny)
		.map(|i| {
			let x = (i % nx) as f32;
			let y = (i / nx) as f32;
			(x*0.7).sin() + (y*1.3).cos() + if (x as usize + y as usize) % 2 == 0 { 1.0 } else { -0.5 }
		})
		.collect()
}


#[test]
fn frequency_map() {

	let freqs = FrequencyMap::new(4, 4, 2.0);
	assert_that!(&freqs.nx(), eq(4));
	assert_that!(&freqs.ny(), eq(4));
	assert_that!(&freqs.nz(), eq(1));
	assert_that!(&freqs.values().len(), eq(16));

	// zero frequency stays in the corner
	assert_that!(&freqs.get(0, 0, 0), eq(0.0));

	// one step is 1/(n*pixel size), and the upper half wraps to negative frequencies
	assert_that!(&freqs.get(1, 0, 0), eq(0.125));
	assert_that!(&freqs.get(3, 0, 0), eq(0.125));
	assert_that!(&freqs.get(2, 0, 0), eq(0.25));
	assert_that!(&freqs.get(0, 3, 0), eq(0.125));
	assert_that!(&(freqs.get(1, 1, 0) - 0.125*2f64.sqrt()).abs(), lt(1e-12));
}


#[test]
fn frequency_map_volume() {

	let freqs = FrequencyMap::volume(4, 2, 8, 2.0);
	assert_that!(&freqs.nz(), eq(8));
	assert_that!(&freqs.values().len(), eq(64));
	assert_that!(&freqs.get(0, 0, 0), eq(0.0));

	// z gets its own step, and wraps like x and y
	assert_that!(&freqs.get(0, 0, 1), eq(0.0625));
	assert_that!(&freqs.get(0, 0, 7), eq(0.0625));
	assert_that!(&freqs.get(0, 0, 4), eq(0.25));
	assert_that!(&(freqs.get(1, 1, 4) - (0.125f64.powi(2) + 0.25f64.powi(2) + 0.25f64.powi(2)).sqrt()).abs(), lt(1e-12));
}


#[test]
fn critical_exposure_falls_with_resolution() {
	assert_that!(&critical_exposure(0.25), lt(critical_exposure(0.1)));
	assert_that!(&critical_exposure(0.1), lt(critical_exposure(0.05)));
	assert_that!(&(critical_exposure(1.0) - (0.245 + 2.81)).abs(), lt(1e-12));
}


#[test]
fn dose_weight_values() {

	// the DC term is never touched
	assert_that!(&DoseFilter::DoseWeight { dose: 100.0 }.value(0.0), eq(1.0));

	// no dose, no damage
	assert_that!(&DoseFilter::DoseWeight { dose: 0.0 }.value(0.2), eq(1.0));

	// more dose, more damage
	let low = DoseFilter::DoseWeight { dose: 10.0 }.value(0.2);
	let high = DoseFilter::DoseWeight { dose: 40.0 }.value(0.2);
	assert_that!(&high, lt(low));
	assert_that!(&low, lt(1.0));
	assert_that!(&0.0, lt(high));
}


#[test]
fn sharpen_values() {

	let filter = DoseFilter::Sharpen {
		dose_per_tilt: 3.0,
		pre_dose: 0.0,
		number_of_tilts: 41
	};
	assert_that!(&filter.value(0.0), eq(1.0));

	// sharpening boosts everything else
	for freq in [0.01, 0.1, 0.2, 0.4] {
		let value = filter.value(freq);
		assert_that!(&value.is_finite(), eq(true));
		assert_that!(&1.0, lt(value));
	}

	// and boosts high frequencies more
	assert_that!(&filter.value(0.1), lt(filter.value(0.3)));

	// degenerate settings fall back to no filter
	let filter = DoseFilter::Sharpen {
		dose_per_tilt: 0.0,
		pre_dose: 0.0,
		number_of_tilts: 41
	};
	assert_that!(&filter.value(0.2), eq(1.0));
}


#[test]
fn fourier_filter_identity() {

	let (nx, ny) = (8, 6);
	let image = test_image(nx, ny);

	let mut filtered = image.clone();
	FourierFilter::new(nx, ny)
		.apply(&mut filtered, &vec![1.0; nx*ny])
		.expect("apply");
	assert_close(&filtered, &image);
}


#[test]
fn fourier_filter_volume_identity() {

	let (nx, ny, nz) = (6, 4, 5);
	let volume = (0 .. nz)
		.flat_map(|z| test_image(nx, ny).into_iter().map(move |v| v*(z as f32 + 1.0)))
		.collect::<Vec<_>>();

	let mut filtered = volume.clone();
	FourierFilter::volume(nx, ny, nz)
		.apply(&mut filtered, &vec![1.0; nx*ny*nz])
		.expect("apply");
	assert_close(&filtered, &volume);
}


#[test]
fn fourier_filter_keeps_mean() {

	let (nx, ny) = (8, 8);
	let image = test_image(nx, ny);

	let freqs = FrequencyMap::new(nx, ny, 1.5);
	let filter = DoseFilter::DoseWeight { dose: 80.0 }.array(&freqs);
	let mut filtered = image.clone();
	FourierFilter::new(nx, ny)
		.apply(&mut filtered, &filter)
		.expect("apply");

	let mean = |v: &[f32]| v.iter().map(|&x| x as f64).sum::<f64>()/(v.len() as f64);
	assert_that!(&(mean(&filtered) - mean(&image)).abs(), lt(1e-4));

	// but the rest gets smoothed out
	let variance = |v: &[f32]| {
		let m = mean(v);
		v.iter().map(|&x| (x as f64 - m).powi(2)).sum::<f64>()
	};
	assert_that!(&variance(&filtered), lt(variance(&image)));
}


#[test]
fn fourier_filter_wrong_size() {
	let mut image = vec![0f32; 12];
	let result = FourierFilter::new(4, 4)
		.apply(&mut image, &vec![1.0; 16]);
	assert_that!(&result.is_err(), eq(true));
}


#[test]
fn dose_weight_stack_per_image() {
	let _logging = logging::init_test();

	let (nx, ny) = (8, 8);
	let image = test_image(nx, ny);
	let mut mrc = Mrc::new(nx as u32, ny as u32, 2);
	mrc.image_mut(0).copy_from_slice(&image);
	mrc.image_mut(1).copy_from_slice(&image);

	dose_weight_stack(&mut mrc, &[0.0, 50.0], 1.0)
		.expect("dose weight");

	// the first image had no dose, so it's unchanged
	assert_close(mrc.image(0), &image);

	// the second wasn't
	let diff = mrc.image(1).iter()
		.zip(&image)
		.map(|(a, b)| (a - b).abs())
		.fold(0f32, f32::max);
	assert_that!(&1e-3, lt(diff));
}


#[test]
fn dose_weight_stack_wrong_count() {
	let _logging = logging::init_test();

	let mut mrc = Mrc::new(4, 4, 3);
	assert_that!(&dose_weight_stack(&mut mrc, &[1.0, 2.0], 1.0).is_err(), eq(true));
}


#[test]
fn sharpen_stack() {
	let _logging = logging::init_test();

	let (nx, ny) = (6, 6);
	let image = test_image(nx, ny);
	let mut mrc = Mrc::new(nx as u32, ny as u32, 1);
	mrc.image_mut(0).copy_from_slice(&image);

	let filter = DoseFilter::Sharpen {
		dose_per_tilt: 2.0,
		pre_dose: 1.0,
		number_of_tilts: 30
	};
	filter_stack(&mut mrc, filter, 2.0)
		.expect("sharpen");

	let sharpened = mrc.image(0).to_vec();
	assert_that!(&(sharpened != image), eq(true));
}


/// every section is flat, and the sign flips from one section to the next
fn z_stripes(n: u32) -> Mrc {
	let mut mrc = Mrc::new_volume(n, n, n);
	for z in 0 .. n {
		let v = if z % 2 == 0 { 1.0 } else { -1.0 };
		mrc.image_mut(z).fill(v);
	}
	mrc
}


#[test]
fn sharpen_volume_along_z() {
	let _logging = logging::init_test();

	let filter = DoseFilter::Sharpen {
		dose_per_tilt: 3.0,
		pre_dose: 0.0,
		number_of_tilts: 41
	};

	// one section at a time, flat sections only have a DC term, so nothing changes
	let mut sections = z_stripes(8);
	filter_stack(&mut sections, filter, 1.0)
		.expect("sharpen");
	assert_close(sections.voxels(), z_stripes(8).voxels());

	// but in 3D the stripes are the z Nyquist frequency, which gets boosted
	let mut volume = z_stripes(8);
	filter_volume(&mut volume, filter, 1.0)
		.expect("sharpen");
	let gain = filter.value(0.5) as f32;
	assert_that!(&1.0, lt(gain));
	let expected = z_stripes(8).voxels()
		.iter()
		.map(|v| v*gain)
		.collect::<Vec<_>>();
	for (o, e) in volume.voxels().iter().zip(&expected) {
		assert_that!(&((o - e)/e).abs(), lt(1e-4));
	}
}
