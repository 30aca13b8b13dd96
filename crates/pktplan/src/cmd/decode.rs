use std::io::Read;

use bytes::Bytes;
use pktplan::demo::DemoCatalogue;
use pktplan::frame::{split_frame, FrameConfig};
use pktplan::{Decoded, RegistryBuilder, RegistryConfig};

use crate::cmd::DecodeArgs;
use crate::exit::{codec_error, frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{parse_hex, print_frames, short_type_name, FrameRecord, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args)?;
    let mut wire = if args.hex {
        let text = String::from_utf8(input)
            .map_err(|err| CliError::new(DATA_INVALID, format!("hex input: {err}")))?;
        Bytes::from(parse_hex(&text).map_err(|err| CliError::new(DATA_INVALID, err))?)
    } else {
        Bytes::from(input)
    };

    let config = RegistryConfig {
        frame: FrameConfig {
            multiplexed_id: args.multiplexed_id,
            ..FrameConfig::default()
        },
        strict_trailing_bytes: args.strict,
    };
    let registry = RegistryBuilder::with_config(config)
        .catalogue(&DemoCatalogue)
        .build();

    let mut records = Vec::new();
    let mut failure = None;
    while !wire.is_empty() {
        let context = format!("frame #{}", records.len());
        let frame = match split_frame(&mut wire, &registry.config().frame) {
            Ok(frame) => frame,
            Err(err) => {
                failure = Some(frame_error(&context, err));
                break;
            }
        };

        let mut record = FrameRecord::from_frame(records.len(), &frame);
        match registry.decode_frame(frame) {
            Ok(decoded) => {
                describe(&mut record, decoded);
                records.push(record);
            }
            Err(err) => {
                failure = Some(codec_error(&context, err));
                break;
            }
        }
    }

    tracing::debug!(frames = records.len(), "decoded input");
    print_frames(&records, format);

    match failure {
        Some(err) => Err(err),
        None => Ok(SUCCESS),
    }
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    let mut input = Vec::new();
    match &args.input {
        Some(path) if path.as_os_str() != "-" => {
            input = std::fs::read(path)
                .map_err(|err| io_error(&format!("read {}", path.display()), err))?;
        }
        _ => {
            std::io::stdin()
                .read_to_end(&mut input)
                .map_err(|err| io_error("read stdin", err))?;
        }
    }
    Ok(input)
}

fn describe(record: &mut FrameRecord, decoded: Decoded) {
    match decoded {
        Decoded::Packet(packet) => {
            record.status = "decoded";
            record.packet_type = Some(short_type_name(packet.type_name()));
            record.packet = Some(format!("{packet:?}"));
        }
        Decoded::UnknownMessage(_) => record.status = "unknown-message",
        Decoded::UnknownModule(_) => record.status = "unknown-module",
    }
}
