#![warn(missing_docs)]
/*! M17 protocol core: bit-exact framing, forward-error-correction (FEC),
and the link-setup/stream/packet/IP frame model needed to interoperate
with the reference M17 implementation and with on-air and over-IP
M17 peers.

This crate is purely computational. It has no I/O, no threads, and no
timers: callers pass in byte buffers or soft-bit arrays and get back
frame objects or byte buffers. The only stateful object in the crate
is [`lich::LichCollector`], which accumulates the six LICH chunks of
one in-progress stream.

# Layout

```text
  bits, crc, address, type_field, constants   (leaf primitives)
           |
  golay, convolutional, puncture, viterbi     (FEC building blocks)
  interleave, randomize
           |
  lsf, lich, stream_frame, packet, ip_frame,  (frame model)
  bert
           |
  pipeline                                     (end-to-end glue)
```

Voice payload, AES/ECDSA cryptography, and RF modulation are out of
scope: the core treats the stream payload as an opaque 16-byte blob
and passes META fields through unchanged when ENCRYPTION is set.
*/

pub mod address;
pub mod bert;
pub mod bits;
pub mod constants;
pub mod convolutional;
pub mod crc;
pub mod golay;
pub mod interleave;
pub mod ip_frame;
pub mod lich;
pub mod lsf;
pub mod packet;
pub mod pipeline;
pub mod puncture;
pub mod randomize;
pub mod stream_frame;
pub mod type_field;
pub mod viterbi;

/// M17 core error.
///
/// Every fallible operation in this crate returns one of these kinds,
/// never a raw parse panic. The core does not retry and does not treat
/// any of these as fatal to the process: a caller decides what to do
/// with a dropped frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed callsign, out-of-range numeric, or wrong buffer length.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// LSF, IP, or packet checksum did not match.
    #[error("CRC mismatch: expected {expected:#06x}, got {got:#06x}")]
    CrcMismatch {
        /// CRC value computed over the frame's covered bytes.
        expected: u16,
        /// CRC value found in the frame's trailing CRC field.
        got: u16,
    },

    /// An IP frame did not begin with the `"M17 "` magic bytes.
    #[error("bad magic bytes")]
    BadMagic,

    /// Golay or Viterbi could not recover a valid codeword or path
    /// within the tolerance for its code.
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// Missing, duplicate, or out-of-order packet or LICH chunks.
    #[error("reassembly error: {0}")]
    ReassemblyError(String),

    /// The TYPE field encodes a layout version the caller opted out of.
    #[error("unsupported TYPE version")]
    UnsupportedVersion,
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
