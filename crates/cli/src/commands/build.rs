use std::path::Path;

use hlapi_core::{Api, LinkStats};
use hlapi_reader::SourceFormat;
use serde_json::json;

use crate::config::Config;
use crate::OutputFormat;

pub(crate) fn cmd_build(
    input: &Path,
    from: Option<SourceFormat>,
    config: &Config,
    output: OutputFormat,
    quiet: bool,
) {
    let (api, stats) = super::load_api(input, from, config, output, quiet);

    match output {
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&summary_json(&api, &stats))
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            println!("{}", api);
            if !quiet {
                for object in api.objects() {
                    let fields: usize = object
                        .procedures
                        .iter()
                        .map(|p| hlapi_core::model::flatten_fields(&p.fields).len())
                        .sum();
                    println!(
                        "  {}: {} procedures, {} fields, {} events, {} instances",
                        object.name,
                        object.procedures.len(),
                        fields,
                        object.events.len(),
                        object.instances.len()
                    );
                }
            }
        }
    }
}

fn summary_json(api: &Api, stats: &LinkStats) -> serde_json::Value {
    let objects: Vec<serde_json::Value> = api
        .objects()
        .iter()
        .map(|o| {
            json!({
                "name": o.name,
                "layer": o.layer,
                "resource": o.resource,
                "procedures": o.procedures.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
                "events": o.events.len(),
                "instances": o.instances.len(),
            })
        })
        .collect();

    json!({
        "version": api.current_version(),
        "objects": objects,
        "response_codes": api.response_codes().len(),
        "records": {
            "procedures": stats.procedures,
            "fields": stats.fields,
            "events": stats.events,
            "instances": stats.instances,
        },
    })
}
