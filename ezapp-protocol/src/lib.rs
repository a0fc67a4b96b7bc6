//! EZApp Lynx serial protocol
//!
//! This crate defines the framed byte protocol spoken between a phone
//! running the EZApp Lynx app and a small microcontroller exposing a GUI
//! as a list of fields. The app drives every exchange: it sends a
//! request frame and the unit answers with exactly one response frame.
//!
//! # Protocol Overview
//!
//! All messages use the same escaped frame format:
//! ```text
//! ┌──────┬─────┬─────┬─────────────┬──────────┬──────┐
//! │ SOF  │ SEQ │ CMD │ PAYLOAD     │ CHECKSUM │ EOF  │
//! │ 0x7E │ 1B  │ 1B  │ 0–32B       │ 1B (XOR) │ 0x7D │
//! └──────┴─────┴─────┴─────────────┴──────────┴──────┘
//! ```
//!
//! SOF, EOF and ESC (0x7C) never appear between the markers: they are
//! sent as ESC followed by the byte XOR 0x20. A corrupt frame is answered
//! with a NACK (command 0x6E) and otherwise dropped.

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;

pub use frame::{
    ByteSink, Frame, FrameError, FrameParser, FrameWriter, CMD_NACK, EOF, ESC, MAX_PAYLOAD_SIZE,
    SOF,
};
pub use messages::{Command, MaskOp, Request, PROTOCOL_VERSION};
