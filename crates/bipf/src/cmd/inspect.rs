use bipf::wire::Reader;

use crate::cmd::BinaryInputArgs;
use crate::exit::{bipf_error, CliResult, SUCCESS};
use crate::output::{print_tags, OutputFormat, TagRow};

pub fn run(args: BinaryInputArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = args.read()?;
    let rows = walk_all(&bytes).map_err(|err| bipf_error("inspect failed", err))?;
    print_tags(&rows, format);
    Ok(SUCCESS)
}

/// Every tag of every top-level value in `data`, in wire order.
fn walk_all(data: &[u8]) -> bipf::Result<Vec<TagRow>> {
    let mut reader = Reader::new(data);
    let mut rows = Vec::new();
    while !reader.is_exhausted() {
        walk(&mut reader, &mut rows).map_err(|err| reader.annotate(err))?;
    }
    Ok(rows)
}

fn walk(reader: &mut Reader<'_>, rows: &mut Vec<TagRow>) -> bipf::Result<()> {
    let offset = reader.position();
    let tag = reader.read_tag()?;
    rows.push(TagRow {
        offset,
        depth: reader.depth(),
        discriminant: tag.discriminant.name(),
        length: tag.length,
    });

    if tag.discriminant.is_composite() {
        reader.read_children(tag, |r| walk(r, rows))
    } else {
        reader.read_exact(tag.length).map(|_| ())
    }
}
