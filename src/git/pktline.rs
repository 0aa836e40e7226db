//! Pkt-line framing for the Git smart-HTTP protocol.
//!
//! ```text
//! ┌────────────┬──────────────────────────┐
//! │ Length     │ Payload                  │
//! │ 4 hex chars│ length - 4 bytes         │
//! └────────────┴──────────────────────────┘
//! ```
//!
//! The length counts its own four bytes. `0000` is the flush packet and
//! never carries a payload.

use std::io::{self, Write};

use thiserror::Error;

/// Size of the hex length prefix.
pub const PREFIX_LEN: usize = 4;

/// Largest frame git accepts, prefix included.
pub const MAX_PKT_LEN: usize = 65520;

/// Largest payload that fits in one frame.
pub const MAX_PAYLOAD_LEN: usize = MAX_PKT_LEN - PREFIX_LEN;

/// The flush packet.
pub const FLUSH_PKT: &[u8; 4] = b"0000";

/// Side-band channel selector, sent as the first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Band {
    /// Pack data (or the report-status stream on push).
    Data = 1,
    /// Progress messages shown to the user as `remote: ...`.
    Progress = 2,
}

/// Write `payload` as a single pkt-line.
///
/// The prefix and the payload are written separately, so a failing sink
/// can leave a frame half written.
pub fn write_pkt_line<W: Write + ?Sized>(w: &mut W, payload: &[u8]) -> io::Result<()> {
    write_prefix(w, payload.len())?;
    w.write_all(payload)
}

/// Write a payload on a side-band channel.
pub fn write_sideband<W: Write + ?Sized>(w: &mut W, band: Band, payload: &[u8]) -> io::Result<()> {
    write_prefix(w, payload.len() + 1)?;
    w.write_all(&[band as u8])?;
    w.write_all(payload)
}

/// Write the `0000` flush packet.
pub fn write_flush<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    w.write_all(FLUSH_PKT)
}

fn write_prefix<W: Write + ?Sized>(w: &mut W, payload_len: usize) -> io::Result<()> {
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("pkt-line payload of {payload_len} bytes exceeds {MAX_PAYLOAD_LEN}"),
        ));
    }
    let prefix = format!("{:04x}", payload_len + PREFIX_LEN);
    w.write_all(prefix.as_bytes())
}

/// A decoded pkt-line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PktLine<'a> {
    /// A data frame and its payload.
    Data(&'a [u8]),
    /// The `0000` flush packet.
    Flush,
}

/// Errors raised while decoding pkt-lines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PktLineError {
    /// Fewer bytes than the prefix or the announced length.
    #[error("truncated pkt-line: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// Prefix is not four hex digits.
    #[error("invalid pkt-line length prefix {0:?}")]
    InvalidPrefix(String),

    /// Length of 1 to 3, which no frame can have.
    #[error("invalid pkt-line length {0}")]
    InvalidLength(usize),
}

/// Decode the first pkt-line in `input`, returning it with the rest of the input.
pub fn read_pkt_line(input: &[u8]) -> Result<(PktLine<'_>, &[u8]), PktLineError> {
    if input.len() < PREFIX_LEN {
        return Err(PktLineError::Truncated {
            needed: PREFIX_LEN,
            available: input.len(),
        });
    }
    let (prefix, rest) = input.split_at(PREFIX_LEN);
    let prefix = std::str::from_utf8(prefix)
        .ok()
        .filter(|p| p.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| PktLineError::InvalidPrefix(String::from_utf8_lossy(prefix).into_owned()))?;
    let len = usize::from_str_radix(prefix, 16)
        .map_err(|_| PktLineError::InvalidPrefix(prefix.to_string()))?;

    match len {
        0 => Ok((PktLine::Flush, rest)),
        1..=3 => Err(PktLineError::InvalidLength(len)),
        _ => {
            let payload_len = len - PREFIX_LEN;
            if rest.len() < payload_len {
                return Err(PktLineError::Truncated {
                    needed: len,
                    available: input.len(),
                });
            }
            let (payload, rest) = rest.split_at(payload_len);
            Ok((PktLine::Data(payload), rest))
        }
    }
}
