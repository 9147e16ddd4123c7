use bipf::Value;
use tracing::debug;

use crate::cmd::BinaryInputArgs;
use crate::exit::{bipf_error, CliResult, SUCCESS};
use crate::output::{print_value, OutputFormat};

pub fn run(args: BinaryInputArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = args.read()?;
    debug!(size = bytes.len(), "decoding input");

    let value = Value::from_bytes(&bytes).map_err(|err| bipf_error("decode failed", err))?;
    print_value(&value, format);
    Ok(SUCCESS)
}
