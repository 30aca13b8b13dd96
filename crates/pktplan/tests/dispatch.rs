use bytes::{BufMut, Bytes, BytesMut};
use pktplan::demo::{
    self, player_flags, ChatModule, Color, DimensionUpdate, PingModule, PlayerUpdate, RawPayload,
    SubMessageId,
};
use pktplan::frame::FrameError;
use pktplan::registry::CodecError;
use pktplan::wire::WireError;
use pktplan::{Decoded, Packet, PacketRegistry, RegistryBuilder, RegistryConfig};

fn decode_one<T: pktplan::PacketType>(registry: &PacketRegistry, wire: &mut Bytes) -> T {
    let packet = registry
        .deserialize(wire)
        .expect("frame should decode")
        .into_packet()
        .expect("frame should map to a registered type");
    packet
        .downcast::<T>()
        .map(|boxed| *boxed)
        .expect("packet should have the expected type")
}

#[test]
fn dimension_update_without_port() {
    let registry = demo::registry();
    let packet = DimensionUpdate {
        sub_type: SubMessageId::ChangeServer,
        content: "hello".to_string(),
        port: 1234,
    };

    let mut wire = registry.serialize(&packet);
    assert_eq!(
        wire.as_ref(),
        &[0x0B, 0x00, 67, 0x02, 0x00, 0x05, b'h', b'e', b'l', b'l', b'o']
    );

    let decoded: DimensionUpdate = decode_one(&registry, &mut wire);
    assert_eq!(decoded.sub_type, SubMessageId::ChangeServer);
    assert_eq!(decoded.content, "hello");
    assert_eq!(decoded.port, 0);
}

#[test]
fn dimension_update_with_port() {
    let registry = demo::registry();
    let packet = DimensionUpdate {
        sub_type: SubMessageId::ChangeCustomizedServer,
        content: "x".to_string(),
        port: 7777,
    };

    let mut wire = registry.serialize(&packet);
    assert_eq!(
        wire.as_ref(),
        &[0x09, 0x00, 67, 0x03, 0x00, 0x01, b'x', 0x61, 0x1E]
    );
    assert_eq!(decode_one::<DimensionUpdate>(&registry, &mut wire), packet);
}

#[test]
fn module_packet_frame_layout() {
    let registry = demo::registry();
    let wire = registry.serialize(&PingModule { sequence: 1 });
    assert_eq!(
        wire.as_ref(),
        &[0x09, 0x00, 82, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00]
    );
}

#[test]
fn player_update_bit_gating_changes_length() {
    let registry = demo::registry();
    let mut packet = PlayerUpdate {
        flags: 0,
        player_id: 9,
        x: 10,
        y: 20,
        health: 30,
        has_title: false,
        title: String::new(),
    };

    let bare = registry.serialize(&packet).len();
    packet.flags = player_flags::POSITION;
    let with_position = registry.serialize(&packet).len();
    packet.flags |= player_flags::HEALTH;
    let with_health = registry.serialize(&packet).len();

    assert_eq!(with_position - bare, 8);
    assert_eq!(with_health - with_position, 2);

    packet.has_title = true;
    packet.title = "mayor".to_string();
    let mut wire = registry.serialize(&packet);
    assert_eq!(wire.len(), with_health + 6);
    assert_eq!(decode_one::<PlayerUpdate>(&registry, &mut wire), packet);
}

#[test]
fn player_update_roundtrips_every_flag_combination() {
    let registry = demo::registry();
    for flags in [0, player_flags::POSITION, player_flags::HEALTH, 0b0000_0101] {
        for has_title in [false, true] {
            let packet = PlayerUpdate {
                flags,
                player_id: 1,
                x: if flags & player_flags::POSITION != 0 { -5 } else { 0 },
                y: if flags & player_flags::POSITION != 0 { 77 } else { 0 },
                health: if flags & player_flags::HEALTH != 0 { 100 } else { 0 },
                has_title,
                title: if has_title { "t".to_string() } else { String::new() },
            };
            let mut wire = registry.serialize(&packet);
            assert_eq!(decode_one::<PlayerUpdate>(&registry, &mut wire), packet);
        }
    }
}

#[test]
fn raw_tail_takes_body_minus_preceding_fields() {
    let registry = demo::registry();
    let mut wire = BytesMut::new();
    wire.put_u16_le(2 + 1 + 2 + 5);
    wire.put_u8(100);
    wire.put_i16_le(7);
    wire.put_slice(&[1, 2, 3, 4, 5]);
    let mut wire = wire.freeze();

    let decoded: RawPayload = decode_one(&registry, &mut wire);
    assert_eq!(decoded.channel, 7);
    assert_eq!(decoded.data.as_ref(), &[1, 2, 3, 4, 5]);
}

#[test]
fn custom_codec_field_roundtrips() {
    let registry = demo::registry();
    let chat = ChatModule {
        author: 3,
        color: Color { r: 1, g: 2, b: 3 },
        text: "hi".to_string(),
    };

    let mut wire = registry.serialize(&chat);
    assert_eq!(&wire[2..5], &[82, 0x01, 0x00]);
    assert_eq!(&wire[6..9], &[1, 2, 3]);
    assert_eq!(decode_one::<ChatModule>(&registry, &mut wire), chat);
}

#[test]
fn length_prefix_bounds_each_frame() {
    let registry = demo::registry();
    let mut buf = BytesMut::new();
    registry
        .serialize_into(&PingModule { sequence: 5 }, &mut buf)
        .unwrap();
    registry
        .serialize_into(
            &DimensionUpdate {
                sub_type: SubMessageId::GetOnlineInfo,
                content: String::new(),
                port: 0,
            },
            &mut buf,
        )
        .unwrap();
    buf.put_slice(&[0xFF, 0xFE, 0xFD]);
    let mut wire = buf.freeze();

    assert_eq!(decode_one::<PingModule>(&registry, &mut wire).sequence, 5);
    assert_eq!(
        decode_one::<DimensionUpdate>(&registry, &mut wire).sub_type,
        SubMessageId::GetOnlineInfo
    );
    assert_eq!(wire.as_ref(), &[0xFF, 0xFE, 0xFD]);
}

#[test]
fn unknown_ids_do_not_stop_the_stream() {
    let registry = demo::registry();
    let mut buf = BytesMut::new();
    buf.put_slice(&[0x05, 0x00, 0xC8, 0xAA, 0xBB]);
    buf.put_slice(&[0x06, 0x00, 82, 0x63, 0x00, 0xCC]);
    registry
        .serialize_into(&PingModule { sequence: 42 }, &mut buf)
        .unwrap();
    let mut wire = buf.freeze();

    assert!(matches!(
        registry.deserialize(&mut wire).unwrap(),
        Decoded::UnknownMessage(200)
    ));
    assert!(matches!(
        registry.deserialize(&mut wire).unwrap(),
        Decoded::UnknownModule(99)
    ));
    assert_eq!(decode_one::<PingModule>(&registry, &mut wire).sequence, 42);
}

#[test]
fn invalid_enum_value_is_a_decode_error() {
    let registry = demo::registry();
    let mut wire = Bytes::from_static(&[0x06, 0x00, 67, 0x09, 0x00, 0x00]);

    let err = registry.deserialize(&mut wire).unwrap_err();
    match err {
        CodecError::Plan(pktplan::plan::PlanError::Field { field, source, .. }) => {
            assert_eq!(field, "sub_type");
            assert!(matches!(source, WireError::InvalidEnum { value: 9, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn short_length_prefix_is_rejected() {
    let registry = demo::registry();
    let mut wire = Bytes::from_static(&[0x02, 0x00]);
    assert!(matches!(
        registry.deserialize(&mut wire),
        Err(CodecError::Frame(FrameError::InvalidLength(2)))
    ));
}

#[test]
fn strict_mode_rejects_trailing_body_bytes() {
    let registry = RegistryBuilder::with_config(RegistryConfig {
        strict_trailing_bytes: true,
        ..RegistryConfig::default()
    })
    .catalogue(&demo::DemoCatalogue)
    .build();

    let mut wire = Bytes::from_static(&[0x0A, 0x00, 82, 0x02, 0x00, 1, 0, 0, 0, 0xEE]);
    assert!(matches!(
        registry.deserialize(&mut wire),
        Err(CodecError::TrailingBytes { remaining: 1, .. })
    ));

    let mut wire = Bytes::from_static(&[0x0A, 0x00, 82, 0x02, 0x00, 1, 0, 0, 0, 0xEE]);
    let lenient = demo::registry();
    assert_eq!(decode_one::<PingModule>(&lenient, &mut wire).sequence, 1);
}

#[test]
fn registry_is_shared_across_threads() {
    let registry = demo::registry();

    std::thread::scope(|scope| {
        for worker in 0..4i32 {
            let registry = &registry;
            scope.spawn(move || {
                for sequence in 0..100 {
                    let packet = PingModule {
                        sequence: worker * 1000 + sequence,
                    };
                    let mut wire = registry.serialize(&packet);
                    let decoded: PingModule = decode_one(registry, &mut wire);
                    assert_eq!(decoded, packet);
                }
            });
        }
    });
}

#[test]
fn boxed_packets_serialize_through_the_trait_object() {
    let registry = demo::registry();
    let boxed: Vec<Box<dyn Packet>> = vec![
        Box::new(PingModule { sequence: 3 }),
        Box::new(RawPayload {
            channel: 1,
            data: Bytes::from_static(b"abc"),
        }),
    ];

    let mut buf = BytesMut::new();
    for packet in &boxed {
        registry.serialize_into(packet.as_ref(), &mut buf).unwrap();
    }
    let mut wire = buf.freeze();

    let first = registry.deserialize(&mut wire).unwrap().into_packet().unwrap();
    let second = registry.deserialize(&mut wire).unwrap().into_packet().unwrap();
    assert_eq!(first.discriminator(), boxed[0].discriminator());
    assert_eq!(second.discriminator(), boxed[1].discriminator());
    assert!(wire.is_empty());
}
