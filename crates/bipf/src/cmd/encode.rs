use std::fs;

use tracing::debug;

use crate::cmd::{read_stdin, EncodeArgs};
use crate::exit::{bipf_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::json;
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let text = match (&args.json, &args.file) {
        (Some(json), _) => json.clone().into_bytes(),
        (None, Some(path)) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        (None, None) => read_stdin()?,
    };

    let doc: serde_json::Value = serde_json::from_slice(&text)
        .map_err(|err| CliError::new(USAGE, format!("input is not valid JSON: {err}")))?;
    let value = json::to_value(&doc);
    let bytes = value
        .to_bytes()
        .map_err(|err| bipf_error("encode failed", err))?;
    debug!(size = bytes.len(), "encoded document");

    print_encoded(&bytes, format);
    Ok(SUCCESS)
}
