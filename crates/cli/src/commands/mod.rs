pub(crate) mod build;
pub(crate) mod convert;

use std::path::Path;
use std::process;

use hlapi_core::{Api, LinkStats, ObjectFactory};
use hlapi_reader::SourceFormat;

use crate::config::Config;
use crate::{report_error, OutputFormat};

/// Read `input` and link it, exiting with status 1 on any failure.
pub(crate) fn load_api(
    input: &Path,
    from: Option<SourceFormat>,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) -> (Api, LinkStats) {
    let format = match config.source_format(from, input) {
        Ok(f) => f,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let streams = match hlapi_reader::read(input, format) {
        Ok(s) => s,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    let span = tracing::info_span!("build", input = %input.display(), format = %format);
    match ObjectFactory::new(&streams).with_span(span).build_with_stats() {
        Ok(built) => built,
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    let err_json = serde_json::to_string_pretty(&e.to_json_value())
                        .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
                    eprintln!("{}", err_json);
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("build error: {}", e);
                    }
                }
            }
            process::exit(1);
        }
    }
}
