//! Lock-free intent queue from the control plane to the audio thread.
//!
//! The control plane (remote protocol handler, footswitches, a UI) never
//! touches the engine directly. It pushes [`EngineCommand`]s into a bounded
//! single-producer/single-consumer ring buffer; the audio thread drains the
//! queue at the start of each block with [`Engine::drain_commands`] and only
//! then evaluates audio, so a patch change can never be observed half-applied.
//!
//! Push and pop are wait-free and never allocate. Commands are plain `Copy`
//! values, including whole patches, so nothing is freed on the audio thread.
//!
//! ```rust
//! use multifx_engine::{Engine, EngineCommand, command_channel};
//! use multifx_core::NoBuffers;
//!
//! let mut engine = Engine::new(48000.0, &mut NoBuffers);
//! let (mut tx, mut rx) = command_channel(64);
//!
//! tx.send(EngineCommand::SetTempo(120.0)).unwrap();
//! engine.drain_commands(&mut rx);
//! assert_eq!(engine.tempo(), Some(120.0));
//! ```
//!
//! [`Engine::drain_commands`]: crate::Engine::drain_commands

use multifx_core::{ChannelPolicy, PatchDescriptor, Tap};

/// Queue size used by [`command_channel`] callers that have no better figure.
///
/// A full patch load from the remote protocol arrives as one
/// [`EngineCommand::ApplyPatch`], so bursts stay small.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// A control-plane intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    /// Set one parameter, `value` in `0..=127`.
    SetParam {
        /// Slot index.
        slot: u8,
        /// Parameter id.
        id: u8,
        /// Wire value.
        value: u8,
    },
    /// Enable or bypass a slot.
    SetEnabled {
        /// Slot index.
        slot: u8,
        /// New state.
        enabled: bool,
    },
    /// Change a slot's effect type.
    SetType {
        /// Slot index.
        slot: u8,
        /// Effect type id.
        type_id: u8,
    },
    /// Change a slot's input taps.
    SetRouting {
        /// Slot index.
        slot: u8,
        /// Left tap.
        left: Tap,
        /// Right tap.
        right: Tap,
    },
    /// Toggle summing a slot's input to mono.
    SetSumToMono {
        /// Slot index.
        slot: u8,
        /// New state.
        enabled: bool,
    },
    /// Change a slot's dry and wet levels (`0..=127`).
    SetMix {
        /// Slot index.
        slot: u8,
        /// Dry level.
        dry: u8,
        /// Wet level.
        wet: u8,
    },
    /// Change a slot's channel policy.
    SetChannelPolicy {
        /// Slot index.
        slot: u8,
        /// New policy.
        policy: ChannelPolicy,
    },
    /// Replace the whole patch.
    ApplyPatch(PatchDescriptor),
    /// Set the tempo in BPM.
    SetTempo(f32),
    /// Set the input gain (linear).
    SetInputGain(f32),
    /// Set the output gain (linear).
    SetOutputGain(f32),
}

/// Control-plane side of the queue.
pub struct CommandSender {
    producer: rtrb::Producer<EngineCommand>,
}

impl CommandSender {
    /// Queues a command without blocking.
    ///
    /// Returns the command back when the queue is full.
    pub fn send(&mut self, command: EngineCommand) -> Result<(), EngineCommand> {
        self.producer.push(command).map_err(|rtrb::PushError::Full(command)| {
            #[cfg(feature = "tracing")]
            tracing::warn!(?command, "command queue full");
            command
        })
    }

    /// Free space in the queue.
    pub fn free_slots(&self) -> usize {
        self.producer.slots()
    }

    /// Whether the audio side has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }
}

/// Audio-thread side of the queue.
pub struct CommandReceiver {
    consumer: rtrb::Consumer<EngineCommand>,
}

impl CommandReceiver {
    /// Takes the oldest pending command, if any.
    pub fn pop(&mut self) -> Option<EngineCommand> {
        self.consumer.pop().ok()
    }

    /// Number of pending commands.
    pub fn pending(&self) -> usize {
        self.consumer.slots()
    }
}

/// Creates a bounded command queue.
///
/// The sender belongs to the control plane, the receiver to the thread that
/// runs the engine.
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (producer, consumer) = rtrb::RingBuffer::new(capacity);
    (CommandSender { producer }, CommandReceiver { consumer })
}
