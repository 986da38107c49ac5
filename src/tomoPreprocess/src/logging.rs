use std::env;
use std::io::{self, IsTerminal};
use std::ops::Deref;

use anyhow::{Context, Result};
use display_error_chain::ErrorChainExt;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::UtcOffset;
use tracing::error;
use tracing::dispatcher::DefaultGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tracing_subscriber::fmt::format::{Format, Full};
use tracing_subscriber::fmt::time::OffsetTime;


/// When set, replaces the `--log` filter
pub const LOG_ENV: &str = "TOMO_PREPROCESS_LOG";


/// Logs to stderr, leaving stdout for the tilt order tables.
/// Colors only when stderr is a terminal, so job logs stay plain text.
pub fn init(log: impl AsRef<str>) -> Result<()> {

	let filter = match env::var(LOG_ENV) {
		Ok(log_env) => log_filter(&log_env)
			.context(format!("Bad {} environment variable", LOG_ENV))?,
		Err(_) => log_filter(log)?
	};

	let log_subscriber = FmtSubscriber::builder()
		.with_env_filter(filter)
		.event_format(log_format())
		.with_ansi(io::stderr().is_terminal())
		.with_writer(io::stderr)
		.finish();

	tracing::subscriber::set_global_default(log_subscriber)
		.context("Failed to set logging subscriber")?;

	Ok(())
}


/// Logs everything from this crate to the test harness, only for the current thread.
/// Drop the guard to stop logging.
pub fn init_test() -> DefaultGuard {

	let subscriber = FmtSubscriber::builder()
		.with_env_filter(EnvFilter::new("tomo_preprocess=trace"))
		.event_format(log_format())
		.with_test_writer()
		.finish();

	tracing::subscriber::set_default(subscriber)
}


/// Parses a filter like `tomo_preprocess=debug`
pub fn log_filter(log: impl AsRef<str>) -> Result<EnvFilter> {
	let log = log.as_ref();
	EnvFilter::builder()
		.parse(log)
		.context(format!("Failed to parse log filter: {}", log))
}


fn log_format() -> Format<Full,OffsetTime<&'static [FormatItem<'static>]>> {

	let time_format = format_description!(
		version = 2,
		"[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory]:[offset_minute]"
	);

	let time_offset = UtcOffset::current_local_offset()
		.unwrap_or(UtcOffset::UTC);

	Format::default()
		.with_timer(OffsetTime::new(time_offset, time_format))
		.with_target(false)
}


pub trait ResultExt<T> {

	/// Logs the error with its whole chain of causes
	fn log_err(self) -> Result<T,()>;
}

impl<T> ResultExt<T> for Result<T,anyhow::Error> {

	fn log_err(self) -> Result<T,()> {
		self.map_err(|e| {
			error!("{}", e.deref().chain());
		})
	}
}
