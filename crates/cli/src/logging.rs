use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter used when `RUST_LOG` is unset.
///
/// Without `-v` only the failed-command line from `figma-use` reaches stderr;
/// discovery, socket and encoder chatter from the `fu*` crates stays off so
/// the JSON envelope on stdout is the whole story. `-v` adds command progress
/// and lets library warnings through (dropped inbound frames, page hiccups).
/// `-vv` shows the debug stream, including every request id on the debugging
/// channel and every framed node change.
fn default_directives(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "error,fu=off,fu_runtime=off,fu_protocol=off",
		1 => "info,fu=warn,fu_runtime=warn,fu_protocol=warn",
		_ => "debug",
	}
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the verbosity.
pub fn init_logging(verbosity: u8) {
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quiet_run_silences_library_crates() {
		let quiet = default_directives(0);
		for krate in ["fu", "fu_runtime", "fu_protocol"] {
			assert!(quiet.contains(&format!("{krate}=off")), "{quiet}");
		}
		assert!(default_directives(1).starts_with("info,"));
		assert_eq!(default_directives(2), default_directives(7));
		for verbosity in 0..3 {
			assert!(EnvFilter::try_new(default_directives(verbosity)).is_ok());
		}
	}
}
