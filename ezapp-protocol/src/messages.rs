//! Command codes and request decoding
//!
//! Requests use codes 0x00-0x06. A response carries the request code
//! with bit 6 set (0x40-0x46) and echoes the request's sequence byte.

use crate::frame::Frame;

/// Protocol version reported in the config response
pub const PROTOCOL_VERSION: u8 = 1;

/// Bit set in a command code to mark a response
pub const RESPONSE_FLAG: u8 = 0x40;

// Request codes: App → Unit
pub const REQ_CONFIG: u8 = 0x00;
pub const REQ_FIELD: u8 = 0x01;
pub const REQ_POLL: u8 = 0x02;
pub const REQ_UPDATE: u8 = 0x03;
pub const REQ_EXTENDED: u8 = 0x04;
pub const REQ_LOGIN: u8 = 0x05;
pub const REQ_UPEXT: u8 = 0x06;

// Response codes: Unit → App
pub const RES_CONFIG: u8 = REQ_CONFIG | RESPONSE_FLAG;
pub const RES_FIELD: u8 = REQ_FIELD | RESPONSE_FLAG;
pub const RES_POLL: u8 = REQ_POLL | RESPONSE_FLAG;
pub const RES_UPDATE: u8 = REQ_UPDATE | RESPONSE_FLAG;
pub const RES_EXTENDED: u8 = REQ_EXTENDED | RESPONSE_FLAG;
pub const RES_LOGIN: u8 = REQ_LOGIN | RESPONSE_FLAG;
pub const RES_UPEXT: u8 = REQ_UPEXT | RESPONSE_FLAG;

/// Request command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Unit configuration snapshot
    Config = REQ_CONFIG,
    /// Field type and config query
    Field = REQ_FIELD,
    /// Bulk value poll
    Poll = REQ_POLL,
    /// Masked value write
    Update = REQ_UPDATE,
    /// Extended payload read
    Extended = REQ_EXTENDED,
    /// Authentication attempt
    Login = REQ_LOGIN,
    /// Extended payload write
    UpExt = REQ_UPEXT,
}

impl Command {
    /// Parse a request code
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            REQ_CONFIG => Some(Command::Config),
            REQ_FIELD => Some(Command::Field),
            REQ_POLL => Some(Command::Poll),
            REQ_UPDATE => Some(Command::Update),
            REQ_EXTENDED => Some(Command::Extended),
            REQ_LOGIN => Some(Command::Login),
            REQ_UPEXT => Some(Command::UpExt),
            _ => None,
        }
    }

    /// Request code on the wire
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Code used by the matching response
    pub fn response_code(self) -> u8 {
        self.to_byte() | RESPONSE_FLAG
    }
}

/// Operation applied by an update request to a 16-bit field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MaskOp {
    /// Replace the value
    Set,
    /// Set the operand's bits
    Or,
    /// Keep only the operand's bits
    And,
    /// Toggle the operand's bits
    Xor,
}

// Wire values
const MASK_SET: u8 = 0;
const MASK_OR: u8 = 1;
const MASK_AND: u8 = 2;
const MASK_XOR: u8 = 3;

impl MaskOp {
    /// Parse a mask operation from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MASK_SET => Some(MaskOp::Set),
            MASK_OR => Some(MaskOp::Or),
            MASK_AND => Some(MaskOp::And),
            MASK_XOR => Some(MaskOp::Xor),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            MaskOp::Set => MASK_SET,
            MaskOp::Or => MASK_OR,
            MaskOp::And => MASK_AND,
            MaskOp::Xor => MASK_XOR,
        }
    }

    /// Apply the operation to `current`
    pub fn apply(self, current: u16, operand: u16) -> u16 {
        match self {
            MaskOp::Set => operand,
            MaskOp::Or => current | operand,
            MaskOp::And => current & operand,
            MaskOp::Xor => current ^ operand,
        }
    }
}

/// A decoded request
///
/// Short payloads never fail to decode: missing bytes read as zero, the
/// same as the stale-buffer reads a tiny receiver would perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request<'a> {
    /// Send the unit configuration
    Config,
    /// Describe one field
    Field { index: u8 },
    /// Report `count` values starting at `start`
    Poll { start: u8, count: u8 },
    /// Apply `op` with `data` to a field value; `op` is `None` for an unknown mask byte
    Update {
        index: u8,
        op: Option<MaskOp>,
        data: u16,
    },
    /// Send a field's extended payload
    Extended { index: u8 },
    /// Try a password
    Login { password: &'a [u8] },
    /// Replace a field's extended payload
    UpExt { index: u8, data: &'a [u8] },
}

fn byte_at(payload: &[u8], index: usize) -> u8 {
    payload.get(index).copied().unwrap_or(0)
}

impl<'a> Request<'a> {
    /// Decode a request frame, or `None` for an unknown command
    pub fn from_frame<const N: usize>(frame: &'a Frame<N>) -> Option<Self> {
        let payload = &frame.payload[..];
        let request = match Command::from_byte(frame.cmd)? {
            Command::Config => Request::Config,
            Command::Field => Request::Field {
                index: byte_at(payload, 0),
            },
            // payload[1] is reserved
            Command::Poll => Request::Poll {
                start: byte_at(payload, 0),
                count: byte_at(payload, 2),
            },
            Command::Update => Request::Update {
                index: byte_at(payload, 0),
                op: MaskOp::from_byte(byte_at(payload, 1)),
                data: u16::from_le_bytes([byte_at(payload, 2), byte_at(payload, 3)]),
            },
            Command::Extended => Request::Extended {
                index: byte_at(payload, 0),
            },
            Command::Login => {
                let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
                Request::Login {
                    password: &payload[..end],
                }
            }
            Command::UpExt => Request::UpExt {
                index: byte_at(payload, 0),
                data: payload.get(1..).unwrap_or(&[]),
            },
        };
        Some(request)
    }

    /// Command this request was decoded from
    pub fn command(&self) -> Command {
        match self {
            Request::Config => Command::Config,
            Request::Field { .. } => Command::Field,
            Request::Poll { .. } => Command::Poll,
            Request::Update { .. } => Command::Update,
            Request::Extended { .. } => Command::Extended,
            Request::Login { .. } => Command::Login,
            Request::UpExt { .. } => Command::UpExt,
        }
    }
}
