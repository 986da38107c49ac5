pub mod order;
pub mod dose_weight;
pub mod sharpen;


use anyhow::{bail, Result};
use tracing::info;

use crate::logging::ResultExt;


/// Runs the job for every tilt series, without letting one failure stop the others
fn for_each_series<T>(items: &[T], name: impl Fn(&T) -> String, mut f: impl FnMut(&T) -> Result<()>) -> Result<()> {

	let mut failed = 0;
	for item in items {
		let name = name(item);
		info!("Tilt series: {}", name);
		let result = f(item)
			.map_err(|e| e.context(format!("Failed to process tilt series: {}", name)))
			.log_err();
		if result.is_err() {
			failed += 1;
		}
	}

	if failed > 0 {
		bail!("{} of {} tilt series failed", failed, items.len());
	}

	Ok(())
}
