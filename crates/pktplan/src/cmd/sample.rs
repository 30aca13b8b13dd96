use pktplan::demo;

use crate::cmd::SampleArgs;
use crate::exit::{codec_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_sample, short_type_name, to_hex, OutputFormat, SampleRecord};

pub fn run(args: SampleArgs, format: OutputFormat) -> CliResult<i32> {
    if args.list {
        for (name, _) in demo::samples() {
            println!("{name}");
        }
        return Ok(SUCCESS);
    }

    let name = args
        .name
        .ok_or_else(|| CliError::new(USAGE, "sample name is required"))?;
    let packet = demo::sample(&name).ok_or_else(|| {
        let known: Vec<&str> = demo::samples().into_iter().map(|(n, _)| n).collect();
        CliError::new(
            USAGE,
            format!("unknown sample '{name}' (known: {})", known.join(", ")),
        )
    })?;

    let registry = demo::registry();
    let frame = registry
        .try_serialize(packet.as_ref())
        .map_err(|err| codec_error("encode sample", err))?;

    if let Some(path) = args.out {
        std::fs::write(&path, &frame)
            .map_err(|err| io_error(&format!("write {}", path.display()), err))?;
        tracing::info!(sample = %name, bytes = frame.len(), path = %path.display(), "wrote frame");
        return Ok(SUCCESS);
    }

    let record = SampleRecord {
        sample: name,
        packet_type: short_type_name(packet.type_name()),
        size: frame.len(),
        frame_hex: to_hex(&frame),
    };
    print_sample(&record, &frame, format);
    Ok(SUCCESS)
}
