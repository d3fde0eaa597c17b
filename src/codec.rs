//! Binary codec for LIFX LAN protocol frames.
//!
//! Wire format (all multi-byte integers little-endian):
//! ```text
//! [size:2][origin:2b|tagged:1b|addressable:1b|protocol:12b][source:4]
//! [target:8][reserved:6][flags:1][sequence:1]
//! [reserved:8][type:2][reserved:2][payload:N]
//! ```
//! Total header size: 36 bytes. `size` covers header and payload.

use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::device::DeviceId;
use crate::errors::DecodeError;
use crate::types::Hsbk;

/// Size of the fixed frame header in bytes.
pub const HEADER_SIZE: usize = 36;

/// Protocol number carried by every frame.
pub const PROTOCOL_NUMBER: u16 = 1024;

/// UDP port LIFX devices listen on.
pub const LIFX_PORT: u16 = 56700;

/// Service code advertised in `StateService` for the UDP transport.
pub const SERVICE_UDP: u8 = 1;

/// Bytes reserved for a device label on the wire.
pub const LABEL_SIZE: usize = 32;
const TARGET_SIZE: usize = 8;

const ADDRESSABLE_BIT: u16 = 1 << 12;
const TAGGED_BIT: u16 = 1 << 13;
const PROTOCOL_MASK: u16 = 0x0fff;
const RES_REQUIRED_BIT: u8 = 0b01;
const ACK_REQUIRED_BIT: u8 = 0b10;

/// Message types understood by the codec.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum MessageKind {
    GetService = 2,
    StateService = 3,
    GetPower = 20,
    SetPower = 21,
    StatePower = 22,
    Acknowledgement = 45,
    LightGet = 101,
    LightSetColor = 102,
    LightState = 107,
}

impl MessageKind {
    /// Look up a kind from its wire type number.
    ///
    /// ```
    /// use lifx_lights_rs::MessageKind;
    ///
    /// assert_eq!(MessageKind::create(107), Some(MessageKind::LightState));
    /// assert_eq!(MessageKind::create(9999), None);
    /// ```
    pub fn create(value: u16) -> Option<Self> {
        MessageKind::iter().find(|kind| kind.id() == value)
    }

    pub fn id(self) -> u16 {
        self as u16
    }

    /// Fixed payload size for this kind.
    pub fn payload_size(self) -> usize {
        match self {
            MessageKind::GetService
            | MessageKind::GetPower
            | MessageKind::Acknowledgement
            | MessageKind::LightGet => 0,
            MessageKind::SetPower | MessageKind::StatePower => 2,
            MessageKind::StateService => 5,
            MessageKind::LightSetColor => 1 + Hsbk::WIRE_SIZE + 4,
            MessageKind::LightState => Hsbk::WIRE_SIZE + 2 + 2 + LABEL_SIZE + 8,
        }
    }
}

/// A typed frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Discovery request, broadcast to every device.
    GetService,
    /// Discovery reply: a service the device exposes and its port.
    StateService { service: u8, port: u32 },
    GetPower,
    /// Set the power level: 0 is off, 65535 is on.
    SetPower { level: u16 },
    StatePower { level: u16 },
    Acknowledgement,
    LightGet,
    /// Change the color over `duration` milliseconds.
    LightSetColor { color: Hsbk, duration: u32 },
    /// A device's current color, power level and label.
    ///
    /// The label travels as at most [`LABEL_SIZE`] bytes of UTF-8. A longer
    /// label is cut at the last character boundary that fits when encoded, so
    /// it only survives an encode/decode round trip when it fits. Build the
    /// message with [`Message::light_state`] to apply the cut up front.
    LightState {
        color: Hsbk,
        power: u16,
        label: String,
    },
}

impl Message {
    /// A `LightState` whose label is already limited to [`LABEL_SIZE`] bytes.
    ///
    /// ```
    /// use lifx_lights_rs::{Frame, Header, Hsbk, Message, decode};
    ///
    /// let message = Message::light_state(Hsbk::default(), 65535, &"x".repeat(40));
    /// let frame = Frame::new(Header::default(), message);
    /// assert_eq!(decode(&frame.encode()).unwrap(), frame);
    /// ```
    pub fn light_state(color: Hsbk, power: u16, label: &str) -> Self {
        Message::LightState {
            color,
            power,
            label: fit_label(label).to_string(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::GetService => MessageKind::GetService,
            Message::StateService { .. } => MessageKind::StateService,
            Message::GetPower => MessageKind::GetPower,
            Message::SetPower { .. } => MessageKind::SetPower,
            Message::StatePower { .. } => MessageKind::StatePower,
            Message::Acknowledgement => MessageKind::Acknowledgement,
            Message::LightGet => MessageKind::LightGet,
            Message::LightSetColor { .. } => MessageKind::LightSetColor,
            Message::LightState { .. } => MessageKind::LightState,
        }
    }

    fn write_payload(&self, out: &mut Writer<'_>) {
        match self {
            Message::GetService
            | Message::GetPower
            | Message::Acknowledgement
            | Message::LightGet => {}
            Message::StateService { service, port } => {
                out.u8(*service);
                out.u32(*port);
            }
            Message::SetPower { level } | Message::StatePower { level } => out.u16(*level),
            Message::LightSetColor { color, duration } => {
                out.u8(0);
                out.hsbk(color);
                out.u32(*duration);
            }
            Message::LightState {
                color,
                power,
                label,
            } => {
                out.hsbk(color);
                out.u16(0);
                out.u16(*power);
                out.bytes(&label_to_bytes(label));
                out.skip(8);
            }
        }
    }

    fn read_payload(kind: MessageKind, payload: &[u8]) -> Result<Self, DecodeError> {
        let mut c = Cursor::new(payload);
        let message = match kind {
            MessageKind::GetService => Message::GetService,
            MessageKind::StateService => Message::StateService {
                service: c.read_u8()?,
                port: c.read_u32::<LittleEndian>()?,
            },
            MessageKind::GetPower => Message::GetPower,
            MessageKind::SetPower => Message::SetPower {
                level: c.read_u16::<LittleEndian>()?,
            },
            MessageKind::StatePower => Message::StatePower {
                level: c.read_u16::<LittleEndian>()?,
            },
            MessageKind::Acknowledgement => Message::Acknowledgement,
            MessageKind::LightGet => Message::LightGet,
            MessageKind::LightSetColor => {
                let _reserved = c.read_u8()?;
                Message::LightSetColor {
                    color: read_hsbk(&mut c)?,
                    duration: c.read_u32::<LittleEndian>()?,
                }
            }
            MessageKind::LightState => {
                let color = read_hsbk(&mut c)?;
                let _reserved = c.read_i16::<LittleEndian>()?;
                let power = c.read_u16::<LittleEndian>()?;
                let mut label = [0u8; LABEL_SIZE];
                std::io::Read::read_exact(&mut c, &mut label)?;
                let _reserved = c.read_u64::<LittleEndian>()?;
                Message::LightState {
                    color,
                    power,
                    label: label_from_bytes(&label),
                }
            }
        };
        Ok(message)
    }
}

/// Routing fields of the frame header.
///
/// The size, protocol number and message type are derived when encoding and
/// checked when decoding, so they are not stored here.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Set when `target` is [`DeviceId::ALL`] and the frame addresses everyone.
    pub tagged: bool,
    /// Client identifier; devices echo it in replies.
    pub source: u32,
    /// Device the frame is for (outbound) or from (inbound).
    pub target: DeviceId,
    pub ack_required: bool,
    pub res_required: bool,
    pub sequence: u8,
}

/// One binary message exchanged with a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub message: Message,
}

impl Frame {
    pub fn new(header: Header, message: Message) -> Self {
        Frame { header, message }
    }

    /// Total encoded length in bytes, header included.
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.message.kind().payload_size()
    }

    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        decode(bytes)
    }
}

/// Encode a frame, computing and embedding its total size.
///
/// # Examples
///
/// ```
/// use lifx_lights_rs::{DeviceId, Frame, Header, Message, decode, encode};
///
/// let frame = Frame::new(
///     Header { tagged: true, source: 7, target: DeviceId::ALL, ..Default::default() },
///     Message::GetService,
/// );
/// let bytes = encode(&frame);
/// assert_eq!(bytes.len(), 36);
/// assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), 36);
/// assert_eq!(decode(&bytes).unwrap(), frame);
/// ```
pub fn encode(frame: &Frame) -> Vec<u8> {
    let size = frame.size();
    let mut buf = vec![0u8; size];
    let mut out = Writer::new(&mut buf);

    let header = &frame.header;
    let mut protocol = PROTOCOL_NUMBER | ADDRESSABLE_BIT;
    if header.tagged {
        protocol |= TAGGED_BIT;
    }
    let mut flags = 0u8;
    if header.res_required {
        flags |= RES_REQUIRED_BIT;
    }
    if header.ack_required {
        flags |= ACK_REQUIRED_BIT;
    }

    out.u16(size as u16);
    out.u16(protocol);
    out.u32(header.source);
    out.bytes(header.target.as_bytes());
    out.skip(TARGET_SIZE - 6);
    out.skip(6);
    out.u8(flags);
    out.u8(header.sequence);
    out.skip(8);
    out.u16(frame.message.kind().id());
    out.skip(2);

    frame.message.write_payload(&mut out);
    buf
}

/// Decode one frame from a datagram.
///
/// # Errors
///
/// - [`DecodeError::MalformedFrame`] when the buffer is shorter than the
///   header, shorter than the size it declares, carries the wrong protocol
///   number, or its payload is shorter than the layout of its type.
/// - [`DecodeError::SizeMismatch`] when the buffer is longer than the size
///   it declares, or the declared size is smaller than a header.
/// - [`DecodeError::UnknownMessageType`] for type numbers outside
///   [`MessageKind`].
pub fn decode(bytes: &[u8]) -> Result<Frame, DecodeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DecodeError::MalformedFrame(format!(
            "need at least {HEADER_SIZE} bytes, got {}",
            bytes.len()
        )));
    }

    let mut c = Cursor::new(bytes);
    let declared = usize::from(c.read_u16::<LittleEndian>()?);
    if declared > bytes.len() {
        return Err(DecodeError::MalformedFrame(format!(
            "truncated frame: header declares {declared} bytes, got {}",
            bytes.len()
        )));
    }
    if declared != bytes.len() {
        return Err(DecodeError::SizeMismatch {
            declared,
            actual: bytes.len(),
        });
    }

    let protocol = c.read_u16::<LittleEndian>()?;
    if protocol & PROTOCOL_MASK != PROTOCOL_NUMBER {
        return Err(DecodeError::MalformedFrame(format!(
            "unsupported protocol number {}",
            protocol & PROTOCOL_MASK
        )));
    }
    let source = c.read_u32::<LittleEndian>()?;

    let mut target = [0u8; TARGET_SIZE];
    std::io::Read::read_exact(&mut c, &mut target)?;
    let mut id = [0u8; 6];
    id.copy_from_slice(&target[..6]);

    c.set_position(22);
    let flags = c.read_u8()?;
    let sequence = c.read_u8()?;

    c.set_position(32);
    let type_number = c.read_u16::<LittleEndian>()?;
    let kind =
        MessageKind::create(type_number).ok_or(DecodeError::UnknownMessageType(type_number))?;

    let header = Header {
        tagged: protocol & TAGGED_BIT != 0,
        source,
        target: DeviceId(id),
        ack_required: flags & ACK_REQUIRED_BIT != 0,
        res_required: flags & RES_REQUIRED_BIT != 0,
        sequence,
    };
    let message = Message::read_payload(kind, &bytes[HEADER_SIZE..])?;
    Ok(Frame { header, message })
}

/// Sequential little-endian writer over a buffer sized by [`Frame::size`].
struct Writer<'a> {
    buf: &'a mut [u8],
    at: usize,
}

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Writer { buf, at: 0 }
    }

    fn u8(&mut self, v: u8) {
        self.buf[self.at] = v;
        self.at += 1;
    }

    fn u16(&mut self, v: u16) {
        LittleEndian::write_u16(&mut self.buf[self.at..self.at + 2], v);
        self.at += 2;
    }

    fn u32(&mut self, v: u32) {
        LittleEndian::write_u32(&mut self.buf[self.at..self.at + 4], v);
        self.at += 4;
    }

    fn hsbk(&mut self, color: &Hsbk) {
        self.u16(color.hue);
        self.u16(color.saturation);
        self.u16(color.brightness);
        self.u16(color.kelvin);
    }

    fn bytes(&mut self, v: &[u8]) {
        self.buf[self.at..self.at + v.len()].copy_from_slice(v);
        self.at += v.len();
    }

    /// Reserved bytes stay zero.
    fn skip(&mut self, n: usize) {
        self.at += n;
    }
}

fn read_hsbk(c: &mut Cursor<&[u8]>) -> std::io::Result<Hsbk> {
    Ok(Hsbk {
        hue: c.read_u16::<LittleEndian>()?,
        saturation: c.read_u16::<LittleEndian>()?,
        brightness: c.read_u16::<LittleEndian>()?,
        kelvin: c.read_u16::<LittleEndian>()?,
    })
}

/// The longest prefix of `label` that fits the wire, ending on a character boundary.
fn fit_label(label: &str) -> &str {
    let mut end = label.len().min(LABEL_SIZE);
    while !label.is_char_boundary(end) {
        end -= 1;
    }
    &label[..end]
}

/// NUL padded to 32 bytes.
fn label_to_bytes(label: &str) -> [u8; LABEL_SIZE] {
    let fitted = fit_label(label).as_bytes();
    let mut out = [0u8; LABEL_SIZE];
    out[..fitted.len()].copy_from_slice(fitted);
    out
}

fn label_from_bytes(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
