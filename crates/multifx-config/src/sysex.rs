//! SysEx codec for the pedal's remote-control protocol.
//!
//! Every message is a 7-bit-safe SysEx frame:
//!
//! ```text
//! F0 7D <sender> <command> <payload...> F7
//! ```
//!
//! `7D` is the non-commercial manufacturer id. Older firmware omits the
//! sender byte (`F0 7D <command> ...`); the decoder accepts both forms by
//! looking at the byte after the manufacturer id, since sender ids are all
//! below `0x10` and command codes are all above it. Leading `F0` and trailing
//! `F7` are optional on input, as some MIDI stacks strip them.
//!
//! Decoding is all-or-nothing: a malformed message yields a [`SysexError`]
//! and no command, never a partially filled patch.
//!
//! Floating values (gains, levels) travel as Q16.16 fixed point spread over
//! five 7-bit bytes, least significant group first.
//!
//! # Example
//!
//! ```rust
//! use multifx_config::sysex::{self, Message, sender};
//! use multifx_engine::EngineCommand;
//!
//! let bytes = [0xF0, 0x7D, sender::APP, 0x20, 3, 1, 100, 0xF7];
//! let decoded = sysex::decode(&bytes).unwrap();
//! assert_eq!(
//!     decoded.message,
//!     Message::Command(EngineCommand::SetParam { slot: 3, id: 1, value: 100 })
//! );
//!
//! let round = sysex::encode_command(sender::FIRMWARE, &EngineCommand::SetEnabled {
//!     slot: 2,
//!     enabled: false,
//! });
//! assert_eq!(round, Some(vec![0xF0, 0x7D, 0x01, 0x21, 2, 0, 0xF7]));
//! ```

use multifx_core::{
    ButtonBinding, ButtonMode, ChannelPolicy, MAX_PARAMS, MAX_SLOTS, NUM_BUTTONS, ParamValue,
    PatchDescriptor, ROUTE_INPUT_WIRE, SlotDescriptor, Tap, db_to_linear, linear_to_db,
};
use multifx_engine::EngineCommand;
use thiserror::Error;

/// SysEx start byte.
pub const SYSEX_START: u8 = 0xF0;
/// SysEx end byte.
pub const SYSEX_END: u8 = 0xF7;
/// Non-commercial manufacturer id.
pub const MANUFACTURER_ID: u8 = 0x7D;

/// Bytes per slot record in a patch dump.
pub const SLOT_RECORD_LEN: usize = 10 + 2 * MAX_PARAMS;

/// Input gain a patch dump implies when it carries no gain section.
pub const DEFAULT_INPUT_GAIN_DB: f32 = 18.0;
/// Output gain a patch dump implies when it carries no gain section.
pub const DEFAULT_OUTPUT_GAIN_DB: f32 = 0.0;

/// Sender ids.
pub mod sender {
    /// Unknown or legacy (no sender byte).
    pub const UNKNOWN: u8 = 0x00;
    /// Pedal firmware.
    pub const FIRMWARE: u8 = 0x01;
    /// Plugin host.
    pub const PLUGIN: u8 = 0x02;
    /// Companion editor app.
    pub const APP: u8 = 0x03;
}

/// Command codes (editor to pedal).
pub mod cmd {
    /// Ask for a [`super::resp::PATCH_DUMP`].
    pub const REQUEST_PATCH: u8 = 0x12;
    /// Replace the whole patch; payload as a patch dump.
    pub const LOAD_PATCH: u8 = 0x14;
    /// `slot id value`
    pub const SET_PARAM: u8 = 0x20;
    /// `slot enabled`
    pub const SET_ENABLED: u8 = 0x21;
    /// `slot type`
    pub const SET_TYPE: u8 = 0x22;
    /// `slot left right`, 127 meaning the hardware input
    pub const SET_ROUTING: u8 = 0x23;
    /// `slot flag`
    pub const SET_SUM_TO_MONO: u8 = 0x24;
    /// `slot dry wet`
    pub const SET_MIX: u8 = 0x25;
    /// `slot policy`
    pub const SET_CHANNEL_POLICY: u8 = 0x26;
    /// Q16.16 dB
    pub const SET_INPUT_GAIN: u8 = 0x27;
    /// Q16.16 dB
    pub const SET_OUTPUT_GAIN: u8 = 0x28;
    /// Ask for effect metadata.
    pub const REQUEST_META: u8 = 0x32;
}

/// Response codes (pedal to editor).
pub mod resp {
    /// Full patch.
    pub const PATCH_DUMP: u8 = 0x13;
    /// Levels and load, four Q16.16 values.
    pub const STATUS_UPDATE: u8 = 0x42;
}

/// Why a message was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SysexError {
    /// Nothing between the framing bytes.
    #[error("empty message")]
    Empty,

    /// First byte is not our manufacturer id.
    #[error("manufacturer id {0:#04x} is not {MANUFACTURER_ID:#04x}")]
    WrongManufacturer(u8),

    /// Command code this codec does not know.
    #[error("unknown command {0:#04x}")]
    UnknownCommand(u8),

    /// Message ends before its payload does.
    #[error("command {command:#04x} needs {expected} payload bytes, got {actual}")]
    Truncated {
        /// Command code.
        command: u8,
        /// Payload bytes required.
        expected: usize,
        /// Payload bytes present.
        actual: usize,
    },

    /// Slot index past the board.
    #[error("slot {0} out of range")]
    SlotOutOfRange(u8),

    /// A patch was expected but the message carries something else.
    #[error("expected a patch message, got command {0:#04x}")]
    NotAPatch(u8),
}

/// Sum of a patch and the global gains that travel with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchDump {
    /// Decoded patch.
    pub patch: PatchDescriptor,
    /// Input gain in dB.
    pub input_gain_db: f32,
    /// Output gain in dB.
    pub output_gain_db: f32,
}

impl PatchDump {
    /// Dump with the default gains.
    pub const fn new(patch: PatchDescriptor) -> Self {
        Self {
            patch,
            input_gain_db: DEFAULT_INPUT_GAIN_DB,
            output_gain_db: DEFAULT_OUTPUT_GAIN_DB,
        }
    }

    /// Engine intents that load this dump: the patch, then both gains.
    pub fn commands(&self) -> [EngineCommand; 3] {
        [
            EngineCommand::ApplyPatch(self.patch),
            EngineCommand::SetInputGain(db_to_linear(self.input_gain_db)),
            EngineCommand::SetOutputGain(db_to_linear(self.output_gain_db)),
        ]
    }
}

/// Periodic level and load report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    /// Input peak (linear).
    pub input_level: f32,
    /// Output peak (linear).
    pub output_level: f32,
    /// Average processing load, 0..1.
    pub cpu_avg: f32,
    /// Peak processing load since the last report, 0..1.
    pub cpu_max: f32,
}

/// A decoded message body.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// An intent for the engine.
    Command(EngineCommand),
    /// `LOAD_PATCH`.
    LoadPatch(PatchDump),
    /// `PATCH_DUMP` response.
    PatchDump(PatchDump),
    /// `REQUEST_PATCH`.
    RequestPatch,
    /// `REQUEST_META`.
    RequestMeta,
    /// `STATUS_UPDATE` response.
    Status(Status),
}

/// A decoded message and who sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Sender id, [`sender::UNKNOWN`] for legacy framing.
    pub sender: u8,
    /// Message body.
    pub message: Message,
}

// ---------------------------------------------------------------------------
// Q16.16
// ---------------------------------------------------------------------------

/// Converts to Q16.16, rounding half up.
#[inline]
pub fn float_to_q16(value: f32) -> i32 {
    (value * 65536.0 + 0.5) as i32
}

/// Spreads a Q16.16 word over five 7-bit bytes, low group first.
pub fn pack_q16(value: i32) -> [u8; 5] {
    let u = value as u32;
    [
        (u & 0x7F) as u8,
        ((u >> 7) & 0x7F) as u8,
        ((u >> 14) & 0x7F) as u8,
        ((u >> 21) & 0x7F) as u8,
        ((u >> 28) & 0x7F) as u8,
    ]
}

/// Reassembles five 7-bit bytes into a float.
pub fn unpack_q16(bytes: &[u8; 5]) -> f32 {
    let u = u32::from(bytes[0] & 0x7F)
        | (u32::from(bytes[1] & 0x7F) << 7)
        | (u32::from(bytes[2] & 0x7F) << 14)
        | (u32::from(bytes[3] & 0x7F) << 21)
        | (u32::from(bytes[4] & 0x7F) << 28);
    u as i32 as f32 / 65536.0
}

fn push_q16(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&pack_q16(float_to_q16(value)));
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode_tap(tap: Tap) -> u8 {
    match tap {
        Tap::Input => ROUTE_INPUT_WIRE,
        Tap::Slot(k) => k & 0x7F,
    }
}

fn decode_tap(byte: u8) -> Tap {
    if byte == ROUTE_INPUT_WIRE {
        Tap::Input
    } else {
        Tap::Slot(byte)
    }
}

fn frame(sender: u8, command: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 5);
    out.extend_from_slice(&[SYSEX_START, MANUFACTURER_ID, sender & 0x7F, command]);
    out.extend(payload.iter().map(|b| b & 0x7F));
    out.push(SYSEX_END);
    out
}

fn push_slot(out: &mut Vec<u8>, index: usize, slot: &SlotDescriptor) {
    out.extend_from_slice(&[
        index as u8,
        slot.type_id,
        u8::from(slot.enabled),
        encode_tap(slot.input_left),
        encode_tap(slot.input_right),
        u8::from(slot.sum_to_mono),
        slot.dry,
        slot.wet,
        slot.channel_policy as u8,
        slot.params().len() as u8,
    ]);
    for p in &slot.params {
        out.extend_from_slice(&[p.id, p.value]);
    }
}

fn encode_dump(sender: u8, command: u8, dump: &PatchDump) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + MAX_SLOTS * SLOT_RECORD_LEN + 2 * NUM_BUTTONS + 10);
    payload.push(dump.patch.slot_count() as u8);
    for (index, slot) in dump.patch.all_slots().iter().enumerate() {
        push_slot(&mut payload, index, slot);
    }
    for binding in &dump.patch.buttons {
        payload.push(binding.slot.map_or(ROUTE_INPUT_WIRE, |s| s & 0x7F));
        payload.push(binding.mode as u8);
    }
    push_q16(&mut payload, dump.input_gain_db);
    push_q16(&mut payload, dump.output_gain_db);
    frame(sender, command, &payload)
}

/// `PATCH_DUMP` response for `dump`.
///
/// All twelve slot records are written, described or not; the first payload
/// byte says how many are described.
pub fn encode_patch_dump(sender: u8, dump: &PatchDump) -> Vec<u8> {
    encode_dump(sender, resp::PATCH_DUMP, dump)
}

/// `LOAD_PATCH` command for `dump`; same layout as [`encode_patch_dump`].
pub fn encode_load_patch(sender: u8, dump: &PatchDump) -> Vec<u8> {
    encode_dump(sender, cmd::LOAD_PATCH, dump)
}

/// `REQUEST_PATCH`.
pub fn encode_request_patch(sender: u8) -> Vec<u8> {
    frame(sender, cmd::REQUEST_PATCH, &[])
}

/// `REQUEST_META`.
pub fn encode_request_meta(sender: u8) -> Vec<u8> {
    frame(sender, cmd::REQUEST_META, &[])
}

/// `STATUS_UPDATE`.
pub fn encode_status(sender: u8, status: &Status) -> Vec<u8> {
    let mut payload = Vec::with_capacity(20);
    for v in [
        status.input_level,
        status.output_level,
        status.cpu_avg,
        status.cpu_max,
    ] {
        push_q16(&mut payload, v);
    }
    frame(sender, resp::STATUS_UPDATE, &payload)
}

/// Wire form of an engine intent.
///
/// Gains are converted from linear to dB. Returns `None` for intents the
/// protocol has no message for (`SetTempo`, which the pedal derives from its
/// own tap-tempo switch). `ApplyPatch` becomes a `LOAD_PATCH` with default
/// gains.
pub fn encode_command(sender: u8, command: &EngineCommand) -> Option<Vec<u8>> {
    let bytes = match *command {
        EngineCommand::SetParam { slot, id, value } => {
            frame(sender, cmd::SET_PARAM, &[slot, id, value])
        }
        EngineCommand::SetEnabled { slot, enabled } => {
            frame(sender, cmd::SET_ENABLED, &[slot, u8::from(enabled)])
        }
        EngineCommand::SetType { slot, type_id } => frame(sender, cmd::SET_TYPE, &[slot, type_id]),
        EngineCommand::SetRouting { slot, left, right } => frame(
            sender,
            cmd::SET_ROUTING,
            &[slot, encode_tap(left), encode_tap(right)],
        ),
        EngineCommand::SetSumToMono { slot, enabled } => {
            frame(sender, cmd::SET_SUM_TO_MONO, &[slot, u8::from(enabled)])
        }
        EngineCommand::SetMix { slot, dry, wet } => frame(sender, cmd::SET_MIX, &[slot, dry, wet]),
        EngineCommand::SetChannelPolicy { slot, policy } => {
            frame(sender, cmd::SET_CHANNEL_POLICY, &[slot, policy as u8])
        }
        EngineCommand::SetInputGain(gain) => frame(
            sender,
            cmd::SET_INPUT_GAIN,
            &pack_q16(float_to_q16(linear_to_db(gain))),
        ),
        EngineCommand::SetOutputGain(gain) => frame(
            sender,
            cmd::SET_OUTPUT_GAIN,
            &pack_q16(float_to_q16(linear_to_db(gain))),
        ),
        EngineCommand::ApplyPatch(patch) => encode_load_patch(sender, &PatchDump::new(patch)),
        EngineCommand::SetTempo(_) => return None,
    };
    Some(bytes)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Strips optional framing and masks every byte to seven bits.
fn body(bytes: &[u8]) -> Vec<u8> {
    let start = usize::from(bytes.first() == Some(&SYSEX_START));
    let end = if bytes.len() > start && bytes.last() == Some(&SYSEX_END) {
        bytes.len() - 1
    } else {
        bytes.len()
    };
    bytes[start..end].iter().map(|b| b & 0x7F).collect()
}

fn require(command: u8, payload: &[u8], expected: usize) -> Result<(), SysexError> {
    if payload.len() < expected {
        return Err(SysexError::Truncated {
            command,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn slot_index(raw: u8) -> Result<u8, SysexError> {
    if usize::from(raw) >= MAX_SLOTS {
        return Err(SysexError::SlotOutOfRange(raw));
    }
    Ok(raw)
}

fn q16_at(payload: &[u8], offset: usize) -> f32 {
    let mut group = [0u8; 5];
    group.copy_from_slice(&payload[offset..offset + 5]);
    unpack_q16(&group)
}

fn decode_slot(record: &[u8]) -> SlotDescriptor {
    let mut slot = SlotDescriptor::off(0);
    slot.type_id = record[1];
    slot.enabled = record[2] != 0;
    slot.input_left = decode_tap(record[3]);
    slot.input_right = decode_tap(record[4]);
    slot.sum_to_mono = record[5] != 0;
    slot.dry = record[6];
    slot.wet = record[7];
    slot.channel_policy = ChannelPolicy::from_raw(record[8]);
    let count = usize::from(record[9]).min(MAX_PARAMS);
    let params: Vec<ParamValue> = record[10..]
        .chunks_exact(2)
        .take(count)
        .map(|pair| ParamValue::new(pair[0], pair[1]))
        .collect();
    slot.replace_params(&params);
    slot
}

/// Decodes the payload of a `PATCH_DUMP` or `LOAD_PATCH` (starting at the
/// slot-count byte).
pub fn decode_patch_payload(command: u8, payload: &[u8]) -> Result<PatchDump, SysexError> {
    let slots_len = 1 + MAX_SLOTS * SLOT_RECORD_LEN;
    require(command, payload, slots_len)?;

    let mut patch = PatchDescriptor::empty();
    for (index, record) in payload[1..slots_len]
        .chunks_exact(SLOT_RECORD_LEN)
        .enumerate()
    {
        if let Some(slot) = patch.slot_mut(index) {
            *slot = decode_slot(record);
        }
    }
    patch.set_slot_count(usize::from(payload[0]));

    let mut offset = slots_len;
    if payload.len() >= offset + 2 * NUM_BUTTONS {
        for binding in &mut patch.buttons {
            let slot = payload[offset];
            *binding = ButtonBinding {
                slot: (slot != ROUTE_INPUT_WIRE).then_some(slot),
                mode: ButtonMode::from_raw(payload[offset + 1]),
            };
            offset += 2;
        }
    }

    let mut dump = PatchDump::new(patch);
    if payload.len() >= offset + 10 {
        dump.input_gain_db = q16_at(payload, offset);
        dump.output_gain_db = q16_at(payload, offset + 5);
    }
    Ok(dump)
}

fn decode_body(command: u8, payload: &[u8]) -> Result<Message, SysexError> {
    let message = match command {
        cmd::SET_PARAM => {
            require(command, payload, 3)?;
            Message::Command(EngineCommand::SetParam {
                slot: slot_index(payload[0])?,
                id: payload[1],
                value: payload[2],
            })
        }
        cmd::SET_ENABLED => {
            require(command, payload, 2)?;
            Message::Command(EngineCommand::SetEnabled {
                slot: slot_index(payload[0])?,
                enabled: payload[1] != 0,
            })
        }
        cmd::SET_TYPE => {
            require(command, payload, 2)?;
            Message::Command(EngineCommand::SetType {
                slot: slot_index(payload[0])?,
                type_id: payload[1],
            })
        }
        cmd::SET_ROUTING => {
            require(command, payload, 3)?;
            Message::Command(EngineCommand::SetRouting {
                slot: slot_index(payload[0])?,
                left: decode_tap(payload[1]),
                right: decode_tap(payload[2]),
            })
        }
        cmd::SET_SUM_TO_MONO => {
            require(command, payload, 2)?;
            Message::Command(EngineCommand::SetSumToMono {
                slot: slot_index(payload[0])?,
                enabled: payload[1] != 0,
            })
        }
        cmd::SET_MIX => {
            require(command, payload, 3)?;
            Message::Command(EngineCommand::SetMix {
                slot: slot_index(payload[0])?,
                dry: payload[1],
                wet: payload[2],
            })
        }
        cmd::SET_CHANNEL_POLICY => {
            require(command, payload, 2)?;
            Message::Command(EngineCommand::SetChannelPolicy {
                slot: slot_index(payload[0])?,
                policy: ChannelPolicy::from_raw(payload[1]),
            })
        }
        cmd::SET_INPUT_GAIN => {
            require(command, payload, 5)?;
            Message::Command(EngineCommand::SetInputGain(db_to_linear(q16_at(payload, 0))))
        }
        cmd::SET_OUTPUT_GAIN => {
            require(command, payload, 5)?;
            Message::Command(EngineCommand::SetOutputGain(db_to_linear(q16_at(payload, 0))))
        }
        cmd::REQUEST_PATCH => Message::RequestPatch,
        cmd::REQUEST_META => Message::RequestMeta,
        cmd::LOAD_PATCH => Message::LoadPatch(decode_patch_payload(command, payload)?),
        resp::PATCH_DUMP => Message::PatchDump(decode_patch_payload(command, payload)?),
        resp::STATUS_UPDATE => {
            require(command, payload, 20)?;
            Message::Status(Status {
                input_level: q16_at(payload, 0),
                output_level: q16_at(payload, 5),
                cpu_avg: q16_at(payload, 10),
                cpu_max: q16_at(payload, 15),
            })
        }
        other => return Err(SysexError::UnknownCommand(other)),
    };
    Ok(message)
}

/// Splits a masked body into sender, command and payload.
fn header(body: &[u8]) -> Result<(u8, u8, &[u8]), SysexError> {
    let (&manufacturer, rest) = body.split_first().ok_or(SysexError::Empty)?;
    if manufacturer != MANUFACTURER_ID {
        return Err(SysexError::WrongManufacturer(manufacturer));
    }
    let (&first, rest) = rest.split_first().ok_or(SysexError::Empty)?;
    if first >= 0x10 {
        return Ok((sender::UNKNOWN, first, rest));
    }
    let (&command, payload) = rest.split_first().ok_or(SysexError::Empty)?;
    Ok((first, command, payload))
}

/// Decodes one message, framed or not.
pub fn decode(bytes: &[u8]) -> Result<Decoded, SysexError> {
    let body = body(bytes);
    let (sender, command, payload) = header(&body)?;
    let message = decode_body(command, payload);
    #[cfg(feature = "tracing")]
    if let Err(ref e) = message {
        tracing::debug!(sender, command, error = %e, "rejected sysex message");
    }
    Ok(Decoded {
        sender,
        message: message?,
    })
}

/// Decodes a message that must carry a whole patch (`PATCH_DUMP` or
/// `LOAD_PATCH`).
pub fn decode_patch(bytes: &[u8]) -> Result<PatchDump, SysexError> {
    let body = body(bytes);
    let (_, command, payload) = header(&body)?;
    match command {
        cmd::LOAD_PATCH | resp::PATCH_DUMP => decode_patch_payload(command, payload),
        other => Err(SysexError::NotAPatch(other)),
    }
}
