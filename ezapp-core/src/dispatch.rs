//! Command dispatcher
//!
//! Turns one valid request frame into exactly one response frame, or
//! none for an unknown command. Every response echoes the request's
//! sequence byte and carries the request code with bit 6 set.
//!
//! | Request  | Response payload                                        |
//! |----------|---------------------------------------------------------|
//! | CONFIG   | version, 19-byte unit config                            |
//! | FIELD    | index, type, 8-byte config, label, 0                    |
//! | POLL     | start, count, flags u16, count × value u16              |
//! | UPDATE   | as POLL with count 1                                    |
//! | EXTENDED | index, flags u16, extended payload                      |
//! | LOGIN    | result, flags u16                                       |
//! | UPEXT    | as EXTENDED                                             |
//!
//! Nothing here fails outward: bad indices read as the zeroed record and
//! refused writes answer with the unchanged state. Payloads never exceed
//! [`MAX_PAYLOAD_SIZE`]: POLL answers at most [`MAX_POLL_VALUES`] values
//! and long strings are cut short.

use ezapp_hal::PersistentStorage;
use ezapp_protocol::{
    ByteSink, Command, Frame, FrameWriter, Request, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
};

use crate::auth::Authenticator;
use crate::field::FieldIndex;
use crate::registry::{FieldStore, Registry};

/// Most values one POLL response carries after its 4-byte header
pub const MAX_POLL_VALUES: u8 = ((MAX_PAYLOAD_SIZE - 4) / 2) as u8;

/// Answer one request frame
///
/// Returns true if a response was written to `sink`.
pub fn dispatch<const N: usize, F, E, A, W>(
    frame: &Frame<N>,
    registry: &mut Registry<F, E>,
    auth: &mut A,
    sink: &mut W,
) -> bool
where
    F: FieldStore,
    E: PersistentStorage,
    A: Authenticator + ?Sized,
    W: ByteSink + ?Sized,
{
    let Some(request) = Request::from_frame(frame) else {
        #[cfg(feature = "defmt")]
        defmt::debug!("ignoring unknown command {=u8:#x}", frame.cmd);
        return false;
    };
    let seq = frame.seq;
    let cmd = request.command().response_code();

    match request {
        Request::Config => {
            #[cfg(feature = "defmt")]
            defmt::trace!("config snapshot: {}", registry.unit());
            let mut out = FrameWriter::begin(sink, seq, cmd);
            out.byte(PROTOCOL_VERSION);
            out.bytes(&registry.unit().to_bytes());
            out.finish();
            registry.clear_config_changed();
        }
        Request::Field { index } => {
            let field = registry.field(index);
            let mut out = FrameWriter::begin(sink, seq, cmd);
            out.byte(index);
            out.byte(field.caps.type_byte());
            out.bytes(field.config.as_bytes());
            registry.transmit_label(index, &mut out);
            out.finish();
        }
        Request::Poll { start, count } => {
            send_values(registry, sink, seq, cmd, start, count);
        }
        Request::Update { index, op, data } => {
            if !registry.apply_update(index, op, data) {
                #[cfg(feature = "defmt")]
                defmt::debug!("update of field {=u8} refused", index);
            }
            send_values(registry, sink, seq, cmd, index, 1);
        }
        Request::Extended { index } => {
            send_extended(registry, sink, seq, cmd, index);
            if registry.field(index).caps.clear_on_read {
                registry.clear_value(index);
            }
        }
        Request::Login { password } => {
            let accepted = auth.login(password, registry.unit_mut());
            #[cfg(feature = "defmt")]
            defmt::info!("login {}", if accepted { "accepted" } else { "rejected" });
            let mut out = FrameWriter::begin(sink, seq, cmd);
            out.byte(u8::from(accepted));
            out.u16_le(registry.unit().poll_flags.bits());
            out.finish();
        }
        Request::UpExt { index, data } => {
            if let Err(_e) = registry.write_ext(index, data) {
                #[cfg(feature = "defmt")]
                defmt::debug!("extended write to field {=u8} refused: {}", index, _e);
            }
            send_extended(registry, sink, seq, cmd, index);
        }
    }
    true
}

/// Poll-shaped response: start, count, flags, then the values
fn send_values<F, E, W>(
    registry: &Registry<F, E>,
    sink: &mut W,
    seq: u8,
    cmd: u8,
    start: FieldIndex,
    count: u8,
) where
    F: FieldStore,
    E: PersistentStorage,
    W: ByteSink + ?Sized,
{
    let count = count.min(MAX_POLL_VALUES);
    let flags = registry.unit().poll_flags;
    let hide = flags.auth_level.hides_values();
    let mut out = FrameWriter::begin(sink, seq, cmd);
    out.byte(start);
    out.byte(count);
    out.u16_le(flags.bits());
    for offset in 0..count {
        let value = if hide {
            0
        } else {
            registry.peek_value(start.wrapping_add(offset))
        };
        out.u16_le(value);
    }
    out.finish();
}

fn send_extended<F, E, W>(
    registry: &mut Registry<F, E>,
    sink: &mut W,
    seq: u8,
    cmd: u8,
    index: FieldIndex,
) where
    F: FieldStore,
    E: PersistentStorage,
    W: ByteSink + ?Sized,
{
    let flags = registry.unit().poll_flags.bits();
    let mut out = FrameWriter::begin(sink, seq, cmd);
    out.byte(index);
    out.u16_le(flags);
    registry.transmit_ext(index, &mut out);
    out.finish();
}

/// Response code for a request command byte, if the command is known
pub fn response_code(cmd: u8) -> Option<u8> {
    Command::from_byte(cmd).map(Command::response_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{OpenAccess, PasswordAuth};
    use crate::config::AuthLevel;
    use crate::field::FieldType;
    use crate::registry::{StaticFields, DEFAULT_TITLE};
    use ezapp_hal::NoStorage;
    use ezapp_protocol::messages::{
        REQ_CONFIG, REQ_EXTENDED, REQ_FIELD, REQ_LOGIN, REQ_POLL, REQ_UPDATE, REQ_UPEXT,
        RES_CONFIG, RES_EXTENDED, RES_FIELD, RES_LOGIN, RES_POLL, RES_UPDATE, RES_UPEXT,
    };
    use ezapp_protocol::{FrameParser, MaskOp};
    use heapless::Vec;

    type TestRegistry = Registry<StaticFields<8>, NoStorage>;

    /// Dispatch a request and decode the single response
    fn roundtrip(
        registry: &mut TestRegistry,
        auth: &mut impl Authenticator,
        cmd: u8,
        payload: &[u8],
    ) -> Option<Frame> {
        let request = Frame::<32>::new(0x5A, cmd, payload).unwrap();
        let mut wire = Vec::<u8, 256>::new();
        if !dispatch(&request, registry, auth, &mut wire) {
            assert!(wire.is_empty());
            return None;
        }
        let mut parser: FrameParser = FrameParser::new();
        let response = parser.feed_bytes(&wire).unwrap().unwrap();
        assert_eq!(response.seq, 0x5A);
        Some(response)
    }

    fn registry_with_value(value: u16) -> (TestRegistry, FieldIndex) {
        let mut registry = Registry::new(StaticFields::new(), NoStorage);
        let index = registry.add_slider("Level", 1000).unwrap();
        registry.set_value(index, value);
        (registry, index)
    }

    #[test]
    fn test_field_zero_is_title() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let response = roundtrip(&mut registry, &mut OpenAccess, REQ_FIELD, &[0]).unwrap();

        assert_eq!(response.cmd, RES_FIELD);
        assert_eq!(response.payload[0], 0);
        assert_eq!(response.payload[1], FieldType::String as u8);
        let label = &response.payload[10..];
        assert_eq!(&label[..label.len() - 1], DEFAULT_TITLE.as_bytes());
        assert_eq!(label.last(), Some(&0));
    }

    #[test]
    fn test_field_out_of_range_is_zeroed() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let response = roundtrip(&mut registry, &mut OpenAccess, REQ_FIELD, &[9]).unwrap();
        assert_eq!(&response.payload[..], &[9, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_config_clears_changed_flag() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        registry.set_key(0x0102_0304);
        let response = roundtrip(&mut registry, &mut OpenAccess, REQ_CONFIG, &[]).unwrap();

        assert_eq!(response.cmd, RES_CONFIG);
        assert_eq!(response.payload.len(), 20);
        assert_eq!(response.payload[0], PROTOCOL_VERSION);
        // field count 1, config changed
        assert_eq!(&response.payload[1..5], &[1, 0, 0x04, 0]);
        assert_eq!(&response.payload[16..20], &[4, 3, 2, 1]);
        assert!(!registry.unit().poll_flags.config_changed);
    }

    #[test]
    fn test_masked_updates() {
        let (mut registry, index) = registry_with_value(0x00FF);
        let response = roundtrip(
            &mut registry,
            &mut OpenAccess,
            REQ_UPDATE,
            &[index, MaskOp::And as u8, 0x0F, 0x00],
        )
        .unwrap();
        assert_eq!(response.cmd, RES_UPDATE);
        assert_eq!(registry.peek_value(index), 0x000F);
        assert_eq!(&response.payload[..2], &[index, 1]);
        assert_eq!(&response.payload[4..], &[0x0F, 0x00]);
        assert!(registry.get_kbhit(index));

        registry.set_value(index, 0x0001);
        roundtrip(&mut registry, &mut OpenAccess, REQ_UPDATE, &[index, 1, 0x02, 0]);
        assert_eq!(registry.peek_value(index), 0x0003);

        roundtrip(&mut registry, &mut OpenAccess, REQ_UPDATE, &[index, 3, 0xFF, 0]);
        assert_eq!(registry.peek_value(index), 0x00FC);

        roundtrip(&mut registry, &mut OpenAccess, REQ_UPDATE, &[index, 0, 0x34, 0x12]);
        assert_eq!(registry.peek_value(index), 0x1234);

        // unknown mask op
        roundtrip(&mut registry, &mut OpenAccess, REQ_UPDATE, &[index, 7, 0, 0]);
        assert_eq!(registry.peek_value(index), 0x1234);
    }

    #[test]
    fn test_update_refused_unless_open() {
        for level in [AuthLevel::ReadOnly, AuthLevel::Locked] {
            let (mut registry, index) = registry_with_value(0x00FF);
            registry.set_auth_level(level);
            roundtrip(&mut registry, &mut OpenAccess, REQ_UPDATE, &[index, 0, 0, 0]);
            assert_eq!(registry.peek_value(index), 0x00FF);
            assert!(!registry.get_kbhit(index));
        }
    }

    #[test]
    fn test_poll_values_and_locked_masking() {
        let (mut registry, index) = registry_with_value(0xBEEF);
        let response = roundtrip(&mut registry, &mut OpenAccess, REQ_POLL, &[index, 0, 2]).unwrap();
        assert_eq!(response.cmd, RES_POLL);
        // value then the missing field past the end
        assert_eq!(&response.payload[4..], &[0xEF, 0xBE, 0, 0]);

        registry.set_auth_level(AuthLevel::Locked);
        let response = roundtrip(&mut registry, &mut OpenAccess, REQ_POLL, &[index, 0, 1]).unwrap();
        assert_eq!(&response.payload[..], &[index, 1, 0x06, 0x00, 0, 0]);
        assert_eq!(registry.peek_value(index), 0xBEEF);
    }

    #[test]
    fn test_extended_clear_on_read() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let alert = registry.add_alert("Alarm", 1, 8).unwrap();
        registry.raise_alert(alert, b"Hot");
        registry.clear_config_changed();

        let response = roundtrip(&mut registry, &mut OpenAccess, REQ_EXTENDED, &[alert]).unwrap();
        assert_eq!(response.cmd, RES_EXTENDED);
        assert_eq!(&response.payload[..], &[alert, 0, 0, b'H', b'o', b't', 0]);
        assert_eq!(registry.peek_value(alert), 0);
    }

    #[test]
    fn test_upext_writes_and_replies() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let input = registry.add_text_input("Name", b"", 8).unwrap();
        registry.clear_config_changed();

        let response =
            roundtrip(&mut registry, &mut OpenAccess, REQ_UPEXT, &[input, b'L', b'y']).unwrap();
        assert_eq!(response.cmd, RES_UPEXT);
        assert_eq!(&response.payload[..], &[input, 0, 0, b'L', b'y', 0]);
        assert!(registry.get_kbhit(input));
    }

    #[test]
    fn test_upext_rejections_leave_payload() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let rom = registry.add_string_rom("Model", "Lynx").unwrap();
        let input = registry.add_text_input("Name", b"old", 8).unwrap();

        roundtrip(&mut registry, &mut OpenAccess, REQ_UPEXT, &[rom, b'X']);
        let text: Vec<u8, 8> = registry.get_value_string(rom);
        assert_eq!(&text[..], b"Lynx");

        registry.set_read_only(input, true);
        roundtrip(&mut registry, &mut OpenAccess, REQ_UPEXT, &[input, b'n']);
        assert!(!registry.get_kbhit(input));
        let text: Vec<u8, 8> = registry.get_value_string(input);
        assert_eq!(&text[..], b"old");
    }

    #[test]
    fn test_upext_ignores_auth_level() {
        for level in [AuthLevel::ReadOnly, AuthLevel::Locked] {
            let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
            let input = registry.add_text_input("Name", b"old", 8).unwrap();
            assert!(registry.is_ext_writable(input));
            registry.set_auth_level(level);

            roundtrip(&mut registry, &mut OpenAccess, REQ_UPEXT, &[input, b'n', b'e', b'w']);
            assert!(registry.get_kbhit(input));
            let text: Vec<u8, 8> = registry.get_value_string(input);
            assert_eq!(&text[..], b"new");
        }
    }

    #[test]
    fn test_poll_count_fits_payload() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let response = roundtrip(&mut registry, &mut OpenAccess, REQ_POLL, &[0, 0, 20]).unwrap();
        assert_eq!(response.payload[1], MAX_POLL_VALUES);
        assert_eq!(response.payload.len(), 4 + 2 * usize::from(MAX_POLL_VALUES));
        assert!(response.payload.len() <= MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_long_label_is_cut_to_fit() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        let index = registry
            .add_slider("A slider label far too long for one frame", 10)
            .unwrap();
        let response = roundtrip(&mut registry, &mut OpenAccess, REQ_FIELD, &[index]).unwrap();
        assert_eq!(response.payload.len(), MAX_PAYLOAD_SIZE);
        assert_eq!(&response.payload[10..20], b"A slider l");
        assert_eq!(response.payload.last(), Some(&0));
    }

    #[test]
    fn test_login() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        registry.set_auth_level(AuthLevel::Locked);
        registry.clear_config_changed();
        let mut auth = PasswordAuth::new(b"lynx");

        let response = roundtrip(&mut registry, &mut auth, REQ_LOGIN, b"cat\0").unwrap();
        assert_eq!(response.cmd, RES_LOGIN);
        assert_eq!(&response.payload[..], &[0, 0x02, 0x00]);

        let response = roundtrip(&mut registry, &mut auth, REQ_LOGIN, b"lynx\0").unwrap();
        assert_eq!(&response.payload[..], &[1, 0x00, 0x00]);
        assert_eq!(registry.auth_level(), AuthLevel::Open);
    }

    #[test]
    fn test_unknown_command_is_silent() {
        let mut registry = TestRegistry::new(StaticFields::new(), NoStorage);
        assert!(roundtrip(&mut registry, &mut OpenAccess, 0x07, &[]).is_none());
        assert!(roundtrip(&mut registry, &mut OpenAccess, 0x42, &[]).is_none());
        assert_eq!(response_code(0x02), Some(0x42));
        assert_eq!(response_code(0x6E), None);
    }
}
