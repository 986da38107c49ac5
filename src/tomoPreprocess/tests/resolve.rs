mod util;


use galvanic_assert::{assert_that, matchers::*};

use tomo_preprocess::logging;
use tomo_preprocess::resolve::{resolve_doses, resolve_order, series_files, DoseRate, OrderOrigin, OrderSources, SchemeArgs};
use tomo_preprocess::LengthPolicy;

use crate::util::series_dir::SeriesDir;


fn dose_symmetric() -> SchemeArgs {
	SchemeArgs {
		tilt_scheme: Some("dose_symmetric_positive".to_string()),
		min_angle: Some(-9.0),
		angle_step: Some(3.0),
		..SchemeArgs::default()
	}
}


#[test]
fn from_scheme() {
	let _logging = logging::init_test();

	let sources = OrderSources {
		scheme: dose_symmetric(),
		..OrderSources::default()
	};
	let resolved = resolve_order(&sources, 7, LengthPolicy::Truncate)
		.expect("resolve");
	assert_that!(&resolved.order_list, eq(vec![7, 5, 3, 1, 2, 4, 6]));
	assert_that!(&resolved.doses, eq(None));
	assert_that!(&matches!(resolved.origin, OrderOrigin::Scheme(_)), eq(true));

	let resolved = resolved.with_derived_doses(Some(DoseRate { dose_per_tilt: 2.0, pre_dose: 1.0 }), 7, LengthPolicy::Truncate)
		.expect("doses");
	assert_that!(&resolved.doses, eq(Some(vec![15.0, 11.0, 7.0, 3.0, 5.0, 9.0, 13.0])));
}


#[test]
fn from_custom_order() {
	let _logging = logging::init_test();

	let sources = OrderSources {
		custom_order: Some("3,2,1,4,5,6".to_string()),
		..OrderSources::default()
	};

	// too long for 5 tilts, so the 6 gets dropped
	let resolved = resolve_order(&sources, 5, LengthPolicy::Truncate)
		.expect("resolve");
	assert_that!(&resolved.order_list, eq(vec![3, 2, 1, 4, 5]));
	assert_that!(&resolved.origin, eq(OrderOrigin::CustomOrder));

	assert_that!(&resolve_order(&sources, 5, LengthPolicy::Strict).is_err(), eq(true));
	assert_that!(&resolve_order(&sources, 7, LengthPolicy::Truncate).is_err(), eq(true));
}


#[test]
fn custom_order_excludes_scheme() {
	let sources = OrderSources {
		custom_order: Some("1,2,3".to_string()),
		scheme: dose_symmetric(),
		..OrderSources::default()
	};
	assert_that!(&resolve_order(&sources, 3, LengthPolicy::Truncate).is_err(), eq(true));
}


#[test]
fn from_file_wins() {
	let _logging = logging::init_test();

	let dir = SeriesDir::new();
	let path = dir.write("tilt.order", "2\t8.0\n1\t4.0\n3\t12.0\n");

	let sources = OrderSources {
		tilt_order_file: Some(path.clone()),
		custom_order: Some("1,2,3".to_string()),
		scheme: dose_symmetric()
	};
	let resolved = resolve_order(&sources, 3, LengthPolicy::Truncate)
		.expect("resolve");
	assert_that!(&resolved.origin, eq(OrderOrigin::TiltOrderFile(path)));
	assert_that!(&resolved.order_list, eq(vec![2, 1, 3]));

	// doses from the file aren't replaced by derived ones
	let resolved = resolved.with_derived_doses(Some(DoseRate { dose_per_tilt: 1.0, pre_dose: 0.0 }), 3, LengthPolicy::Truncate)
		.expect("doses");
	assert_that!(&resolved.doses, eq(Some(vec![8.0, 4.0, 12.0])));
}


#[test]
fn missing_file_falls_back() {
	let _logging = logging::init_test();

	let dir = SeriesDir::new();
	let sources = OrderSources {
		tilt_order_file: Some(dir.file("tilt.order")),
		custom_order: Some("2,1,3".to_string()),
		..OrderSources::default()
	};
	let resolved = resolve_order(&sources, 3, LengthPolicy::Truncate)
		.expect("resolve");
	assert_that!(&resolved.origin, eq(OrderOrigin::CustomOrder));
}


#[test]
fn bad_file() {
	let _logging = logging::init_test();

	let dir = SeriesDir::new();
	let sources = OrderSources {
		tilt_order_file: Some(dir.write("tilt.order", "1\n1\n3\n")),
		..OrderSources::default()
	};
	assert_that!(&resolve_order(&sources, 3, LengthPolicy::Truncate).is_err(), eq(true));
}


#[test]
fn scheme_argument_errors() {

	// missing arguments
	let sources = OrderSources::default();
	assert_that!(&resolve_order(&sources, 3, LengthPolicy::Truncate).is_err(), eq(true));

	// unknown scheme
	let sources = OrderSources {
		scheme: SchemeArgs {
			tilt_scheme: Some("sideways".to_string()),
			..dose_symmetric()
		},
		..OrderSources::default()
	};
	assert_that!(&resolve_order(&sources, 3, LengthPolicy::Truncate).is_err(), eq(true));

	// continuous schemes don't have a starting angle
	let sources = OrderSources {
		scheme: SchemeArgs {
			tilt_scheme: Some("continuous_positive".to_string()),
			starting_angle: Some(10.0),
			..dose_symmetric()
		},
		..OrderSources::default()
	};
	assert_that!(&resolve_order(&sources, 3, LengthPolicy::Truncate).is_err(), eq(true));

	// or groups
	let sources = OrderSources {
		scheme: SchemeArgs {
			tilt_scheme: Some("bidirectional_positive".to_string()),
			group_size: Some(2),
			..dose_symmetric()
		},
		..OrderSources::default()
	};
	assert_that!(&resolve_order(&sources, 3, LengthPolicy::Truncate).is_err(), eq(true));
}


#[test]
fn doses_custom_series_wins() {
	let _logging = logging::init_test();

	let sources = OrderSources {
		scheme: dose_symmetric(),
		..OrderSources::default()
	};
	let doses = resolve_doses(&sources, Some("1, 2,3"), None, 3, LengthPolicy::Truncate)
		.expect("doses");
	assert_that!(&doses, eq(vec![1.0, 2.0, 3.0]));

	assert_that!(&resolve_doses(&sources, Some("1,2,x"), None, 3, LengthPolicy::Truncate).is_err(), eq(true));
}


#[test]
fn doses_need_a_rate() {
	let _logging = logging::init_test();

	let sources = OrderSources {
		scheme: dose_symmetric(),
		..OrderSources::default()
	};
	assert_that!(&resolve_doses(&sources, None, None, 7, LengthPolicy::Truncate).is_err(), eq(true));

	let doses = resolve_doses(&sources, None, Some(DoseRate { dose_per_tilt: 3.0, pre_dose: 0.0 }), 7, LengthPolicy::Truncate)
		.expect("doses");
	assert_that!(&doses, eq(vec![21.0, 15.0, 9.0, 3.0, 6.0, 12.0, 18.0]));
}


#[test]
fn series_files_sorted() {

	let dir = SeriesDir::new();
	for name in ["tilt_03.tif", "tilt_01.tif", "tilt_02.tif", "notes.txt", "tilt.order"] {
		dir.write(name, "");
	}

	let files = series_files(&dir, "*.tif")
		.expect("files")
		.into_iter()
		.map(|path| path.file_name().expect("name").to_string_lossy().to_string())
		.collect::<Vec<_>>();
	assert_that!(&files, eq(vec!["tilt_01.tif".to_string(), "tilt_02.tif".to_string(), "tilt_03.tif".to_string()]));
}


#[test]
fn series_files_folder_with_brackets() {

	// folder names aren't patterns
	let dir = SeriesDir::new();
	let folder = dir.subdir("TS[1]");
	dir.write("TS[1]/a.mrc", "");
	dir.write("TS[1]/b.mrc", "");

	let files = series_files(&folder, "*.mrc")
		.expect("files");
	assert_that!(&files.len(), eq(2));
}


#[test]
fn series_files_none() {

	let dir = SeriesDir::new();
	dir.write("tilt_01.tif", "");

	let result = series_files(&dir, "*.mrc");
	assert_that!(&result.is_err(), eq(true));

	let result = series_files(&dir, "[");
	assert_that!(&result.is_err(), eq(true));
}
