use std::path::Path;
use std::process;

use hlapi_reader::SourceFormat;
use hlapi_writer::OutputFormat as ArtifactFormat;
use serde_json::json;

use crate::config::Config;
use crate::{report_error, OutputFormat};

pub(crate) struct ConvertOptions<'a> {
    pub input: &'a Path,
    pub from: Option<SourceFormat>,
    pub to: Option<ArtifactFormat>,
    pub out: Option<&'a Path>,
}

pub(crate) fn cmd_convert(
    options: ConvertOptions<'_>,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) {
    let format = match config.artifact_format(options.to) {
        Ok(f) => f,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let dir = config.output_dir(options.out);

    let (api, _) = super::load_api(options.input, options.from, config, output, quiet);

    let written = match hlapi_writer::write(&api, format, config.title(), &dir) {
        Ok(paths) => paths,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    tracing::info!(format = %format, files = written.len(), "conversion complete");

    match output {
        OutputFormat::Json => {
            let paths: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
            let result = json!({
                "format": format.to_string(),
                "version": api.current_version(),
                "written": paths,
            });
            let pretty = serde_json::to_string_pretty(&result)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            if !quiet {
                for path in &written {
                    println!("{}", path.display());
                }
            }
        }
    }
}
