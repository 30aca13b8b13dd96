use pktplan::demo;

use crate::cmd::CatalogueArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_catalogue, short_type_name, FieldRecord, OutputFormat, TypeRecord};

pub fn run(_args: CatalogueArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = demo::registry();

    let types: Vec<TypeRecord> = registry
        .registered()
        .into_iter()
        .map(|ty| TypeRecord {
            discriminator: ty.discriminator.to_string(),
            name: short_type_name(ty.name),
            fields: ty
                .fields
                .into_iter()
                .map(|field| FieldRecord {
                    name: field.name,
                    kind: field.kind.to_string(),
                    condition: field.condition.map(|c| c.to_string()),
                })
                .collect(),
        })
        .collect();

    print_catalogue(&types, format);
    Ok(SUCCESS)
}
