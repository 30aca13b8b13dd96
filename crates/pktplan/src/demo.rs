//! Sample catalogue used by the CLI and the integration tests.
//!
//! It covers each field form once: an enum through [`EnumCodec`], a
//! struct through a hand-written [`CustomCodec`], bit and flag conditions,
//! a computed property, a raw tail, and two module packets under the
//! multiplexed id.

use bytes::{BufMut, Bytes, BytesMut};
use pktplan_plan::{Condition, Discriminator, Packet, PacketSchema, PacketType};
use pktplan_registry::{Catalogue, PacketRegistry, RegistryBuilder};
use pktplan_wire::{ByteSource, CustomCodec, EnumCodec, Result as WireResult};

/// What a [`DimensionUpdate`] asks the proxy to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubMessageId {
    #[default]
    ClientAddress,
    ChangeServer,
    ChangeCustomizedServer,
    GetOnlineInfo,
}

impl From<SubMessageId> for i16 {
    fn from(id: SubMessageId) -> i16 {
        match id {
            SubMessageId::ClientAddress => 1,
            SubMessageId::ChangeServer => 2,
            SubMessageId::ChangeCustomizedServer => 3,
            SubMessageId::GetOnlineInfo => 4,
        }
    }
}

impl TryFrom<i16> for SubMessageId {
    type Error = i16;

    fn try_from(raw: i16) -> Result<Self, i16> {
        match raw {
            1 => Ok(SubMessageId::ClientAddress),
            2 => Ok(SubMessageId::ChangeServer),
            3 => Ok(SubMessageId::ChangeCustomizedServer),
            4 => Ok(SubMessageId::GetOnlineInfo),
            other => Err(other),
        }
    }
}

/// Server-switch and address exchange between a client and a proxy.
///
/// `port` is only on the wire for `ChangeCustomizedServer`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionUpdate {
    pub sub_type: SubMessageId,
    pub content: String,
    pub port: u16,
}

impl PacketType for DimensionUpdate {
    const DISCRIMINATOR: Discriminator = Discriminator::Message(67);

    fn schema() -> PacketSchema<Self> {
        PacketSchema::<Self>::new()
            .custom("sub_type", |p| &p.sub_type, |p, v| p.sub_type = v)
            .text("content", |p| p.content.as_str(), |p, v| p.content = v)
            .flag_property("has_port", |p| {
                p.sub_type == SubMessageId::ChangeCustomizedServer
            })
            .u16("port", |p| p.port, |p, v| p.port = v)
            .when(Condition::flag("has_port"))
    }
}

/// Bits of [`PlayerUpdate::flags`].
pub mod player_flags {
    pub const POSITION: u8 = 1 << 0;
    pub const HEALTH: u8 = 1 << 2;
}

/// Partial player state; absent parts are omitted from the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerUpdate {
    pub flags: u8,
    pub player_id: u8,
    pub x: i32,
    pub y: i32,
    pub health: i16,
    pub has_title: bool,
    pub title: String,
}

impl PacketType for PlayerUpdate {
    const DISCRIMINATOR: Discriminator = Discriminator::Message(13);

    fn schema() -> PacketSchema<Self> {
        PacketSchema::<Self>::new()
            .u8("flags", |p| p.flags, |p, v| p.flags = v)
            .u8("player_id", |p| p.player_id, |p, v| p.player_id = v)
            .i32("x", |p| p.x, |p, v| p.x = v)
            .when(Condition::bit("flags", 0))
            .i32("y", |p| p.y, |p, v| p.y = v)
            .when(Condition::bit("flags", 0))
            .i16("health", |p| p.health, |p, v| p.health = v)
            .when(Condition::bit("flags", 2))
            .bool("has_title", |p| p.has_title, |p, v| p.has_title = v)
            .text("title", |p| p.title.as_str(), |p, v| p.title = v)
            .when(Condition::flag("has_title"))
    }
}

/// Opaque bytes forwarded on a numbered channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPayload {
    pub channel: i16,
    pub data: Bytes,
}

impl PacketType for RawPayload {
    const DISCRIMINATOR: Discriminator = Discriminator::Message(100);

    fn schema() -> PacketSchema<Self> {
        PacketSchema::<Self>::new()
            .i16("channel", |p| p.channel, |p, v| p.channel = v)
            .raw_tail("data", |p| p.data.as_ref(), |p, v| p.data = v)
    }
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Three bytes, red first.
#[derive(Debug, Default)]
pub struct ColorCodec;

impl CustomCodec for ColorCodec {
    type Value = Color;

    fn write(&self, value: &Color, dst: &mut BytesMut) -> WireResult<()> {
        dst.put_slice(&[value.r, value.g, value.b]);
        Ok(())
    }

    fn read(&self, src: &mut ByteSource) -> WireResult<Color> {
        Ok(Color {
            r: src.read_u8()?,
            g: src.read_u8()?,
            b: src.read_u8()?,
        })
    }
}

/// Chat line, sent as module 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatModule {
    pub author: u8,
    pub color: Color,
    pub text: String,
}

impl PacketType for ChatModule {
    const DISCRIMINATOR: Discriminator = Discriminator::Module(1);

    fn schema() -> PacketSchema<Self> {
        PacketSchema::<Self>::new()
            .u8("author", |p| p.author, |p, v| p.author = v)
            .custom("color", |p| &p.color, |p, v| p.color = v)
            .text("text", |p| p.text.as_str(), |p, v| p.text = v)
    }
}

/// Keep-alive, sent as module 2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PingModule {
    pub sequence: i32,
}

impl PacketType for PingModule {
    const DISCRIMINATOR: Discriminator = Discriminator::Module(2);

    fn schema() -> PacketSchema<Self> {
        PacketSchema::<Self>::new().i32("sequence", |p| p.sequence, |p, v| p.sequence = v)
    }
}

/// Installs every demo packet type and the codecs they need.
#[derive(Debug, Default)]
pub struct DemoCatalogue;

impl Catalogue for DemoCatalogue {
    fn install(&self, builder: RegistryBuilder) -> RegistryBuilder {
        builder
            .codec(EnumCodec::<SubMessageId, i16>::new())
            .codec(ColorCodec)
            .packet::<DimensionUpdate>()
            .packet::<PlayerUpdate>()
            .packet::<RawPayload>()
            .packet::<ChatModule>()
            .packet::<PingModule>()
    }
}

/// Registry holding the demo catalogue with default config.
pub fn registry() -> PacketRegistry {
    RegistryBuilder::new().catalogue(&DemoCatalogue).build()
}

/// Named sample packets, one or more per demo type.
pub fn samples() -> Vec<(&'static str, Box<dyn Packet>)> {
    vec![
        (
            "dimension-update",
            Box::new(DimensionUpdate {
                sub_type: SubMessageId::ChangeServer,
                content: "lobby".to_string(),
                port: 0,
            }),
        ),
        (
            "dimension-update-port",
            Box::new(DimensionUpdate {
                sub_type: SubMessageId::ChangeCustomizedServer,
                content: "127.0.0.1".to_string(),
                port: 7777,
            }),
        ),
        (
            "player-update",
            Box::new(PlayerUpdate {
                flags: player_flags::POSITION | player_flags::HEALTH,
                player_id: 4,
                x: 1200,
                y: -64,
                health: 400,
                has_title: true,
                title: "builder".to_string(),
            }),
        ),
        (
            "raw-payload",
            Box::new(RawPayload {
                channel: 3,
                data: Bytes::from_static(b"\x00\x01\x02\x03"),
            }),
        ),
        (
            "chat",
            Box::new(ChatModule {
                author: 2,
                color: Color {
                    r: 255,
                    g: 200,
                    b: 0,
                },
                text: "hello".to_string(),
            }),
        ),
        ("ping", Box::new(PingModule { sequence: 1 })),
    ]
}

/// Look up a sample by name.
pub fn sample(name: &str) -> Option<Box<dyn Packet>> {
    samples()
        .into_iter()
        .find(|(sample, _)| *sample == name)
        .map(|(_, packet)| packet)
}
