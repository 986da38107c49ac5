use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use toml::{Table, Value};

use crate::order_file;
use crate::validate::LengthPolicy;


/// Config is the contents of the optional config.toml.
/// Anything missing from the file keeps its default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
	pub tilt_order: ConfigTiltOrder,
	pub dose_weight: ConfigDoseWeight
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTiltOrder {
	/// name of the tilt order file inside each tilt series folder
	pub filename: String,
	pub overwrite: bool,
	pub strict_lengths: bool
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDoseWeight {
	/// appended to the stem of dose weighted files, eg `tomo.st` -> `tomo_dw.st`
	pub file_append: String,
	pub sharpen_file_append: String
}

impl Default for Config {
	fn default() -> Self {
		Self {
			tilt_order: ConfigTiltOrder {
				filename: order_file::DEFAULT_FILENAME.to_string(),
				overwrite: false,
				strict_lengths: false
			},
			dose_weight: ConfigDoseWeight {
				file_append: "dw".to_string(),
				sharpen_file_append: "dw_sharpened".to_string()
			}
		}
	}
}

impl Config {

	pub fn read(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let toml = fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file at: {}", path.to_string_lossy()))?;
		Self::parse(&toml)
			.with_context(|| format!("Failed to parse config file at: {}", path.to_string_lossy()))
	}

	pub fn parse(toml: &str) -> Result<Self> {

		let toml = toml.parse::<Table>()
			.context("Config file is not valid TOML")?;

		let mut config = Config::default();

		if let Some(toml_tilt_order) = section(&toml, "tilt_order")? {
			if let Some(filename) = get_str(toml_tilt_order, "tilt_order", "filename")? {
				config.tilt_order.filename = filename.to_string();
			}
			if let Some(overwrite) = get_bool(toml_tilt_order, "tilt_order", "overwrite")? {
				config.tilt_order.overwrite = overwrite;
			}
			if let Some(strict_lengths) = get_bool(toml_tilt_order, "tilt_order", "strict_lengths")? {
				config.tilt_order.strict_lengths = strict_lengths;
			}
		}

		if let Some(toml_dose_weight) = section(&toml, "dose_weight")? {
			if let Some(file_append) = get_str(toml_dose_weight, "dose_weight", "file_append")? {
				config.dose_weight.file_append = file_append.to_string();
			}
			if let Some(file_append) = get_str(toml_dose_weight, "dose_weight", "sharpen_file_append")? {
				config.dose_weight.sharpen_file_append = file_append.to_string();
			}
		}

		Ok(config)
	}

	pub fn length_policy(&self) -> LengthPolicy {
		LengthPolicy::from_strict(self.tilt_order.strict_lengths)
	}
}


fn section<'t>(toml: &'t Table, name: &str) -> Result<Option<&'t Table>> {
	toml.get(name)
		.map(|value| {
			value.as_table()
				.context(format!("{} key is not a table", name))
		})
		.transpose()
}


fn get<'t, T>(table: &'t Table, section: &str, key: &str, kind: &str, f: impl FnOnce(&'t Value) -> Option<T>) -> Result<Option<T>> {
	table.get(key)
		.map(|value| {
			f(value)
				.context(format!("{}.{} was not a {}", section, key, kind))
		})
		.transpose()
}

fn get_str<'t>(table: &'t Table, section: &str, key: &str) -> Result<Option<&'t str>> {
	get(table, section, key, "string", Value::as_str)
}

fn get_bool(table: &Table, section: &str, key: &str) -> Result<Option<bool>> {
	get(table, section, key, "boolean", Value::as_bool)
}
