//! Stackmat timer packets and the hardware input adapter
//!
//! A Stackmat-style mat streams fixed-size ASCII packets:
//!
//! ```text
//! status  M  S  S  d  d [d]  checksum  '\n' '\r'
//! ```
//!
//! Digits are ASCII. Older devices send hundredths (two fraction digits),
//! newer ones milliseconds (three). The checksum byte is 64 plus the sum of
//! the digit values.

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::timer::TimerEvent;

const TERMINATOR: [u8; 2] = [b'\n', b'\r'];
const CHECKSUM_BASE: u32 = 64;
/// Longest run of bytes kept while waiting for a terminator
const MAX_PENDING: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketStatus {
    Idle,
    /// Both hands held long enough; lifting starts the timer
    Armed,
    Running,
    Stopped,
    LeftHand,
    RightHand,
    BothHands,
}

impl PacketStatus {
    fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            b'I' => PacketStatus::Idle,
            b'A' => PacketStatus::Armed,
            b' ' => PacketStatus::Running,
            b'S' => PacketStatus::Stopped,
            b'L' => PacketStatus::LeftHand,
            b'R' => PacketStatus::RightHand,
            b'C' => PacketStatus::BothHands,
            _ => return None,
        })
    }

    pub fn both_hands_down(self) -> bool {
        matches!(self, PacketStatus::BothHands | PacketStatus::Armed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    pub status: PacketStatus,
    pub time_ms: u64,
}

impl Packet {
    /// Parse one packet body (terminator already stripped)
    pub fn parse(body: &[u8]) -> Result<Self> {
        let digit_count = match body.len() {
            7 => 5,
            8 => 6,
            n => return Err(Error::Packet(format!("unexpected packet length {n}"))),
        };

        let status = PacketStatus::from_byte(body[0])
            .ok_or_else(|| Error::Packet(format!("unknown status byte {:#04x}", body[0])))?;

        let digits = body[1..=digit_count]
            .iter()
            .map(|b| {
                if b.is_ascii_digit() {
                    Ok(u64::from(b - b'0'))
                } else {
                    Err(Error::Packet(format!("non-digit byte {b:#04x}")))
                }
            })
            .collect::<Result<Vec<u64>>>()?;

        let expected = CHECKSUM_BASE + digits.iter().map(|d| *d as u32).sum::<u32>();
        let checksum = u32::from(body[digit_count + 1]);
        if checksum != expected {
            return Err(Error::Packet(format!(
                "checksum mismatch: got {checksum}, expected {expected}"
            )));
        }

        let minutes = digits[0];
        let seconds = digits[1] * 10 + digits[2];
        let fraction = match digit_count {
            5 => (digits[3] * 10 + digits[4]) * 10,
            _ => digits[3] * 100 + digits[4] * 10 + digits[5],
        };

        Ok(Self {
            status,
            time_ms: minutes * 60_000 + seconds * 1000 + fraction,
        })
    }
}

/// Splits a raw byte stream into packets
#[derive(Debug, Default)]
pub struct PacketDecoder {
    pending: Vec<u8>,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes. Every complete frame yields a packet or an error;
    /// a bad frame is dropped and decoding resumes after its terminator.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<Packet>> {
        self.pending.extend_from_slice(bytes);
        let mut out = Vec::new();

        while let Some(pos) = self
            .pending
            .windows(TERMINATOR.len())
            .position(|w| w == TERMINATOR)
        {
            let frame: Vec<u8> = self.pending.drain(..pos + TERMINATOR.len()).collect();
            out.push(Packet::parse(&frame[..pos]));
        }

        if self.pending.len() > MAX_PENDING {
            let excess = self.pending.len() - MAX_PENDING;
            self.pending.drain(..excess);
            trace!(excess, "Dropped unterminated packet bytes");
        }

        out
    }
}

/// Turns the packet stream into timer events by comparing each packet with
/// the previous one.
#[derive(Debug)]
pub struct StackmatAdapter {
    decoder: PacketDecoder,
    last: Option<Packet>,
    last_seen_ms: Option<u64>,
    signal_timeout_ms: u64,
    signal_lost: bool,
}

impl StackmatAdapter {
    pub fn new(signal_timeout_ms: u64) -> Self {
        Self {
            decoder: PacketDecoder::new(),
            last: None,
            last_seen_ms: None,
            signal_timeout_ms,
            signal_lost: false,
        }
    }

    /// Feed bytes read from the device at `now_ms`
    pub fn feed(&mut self, bytes: &[u8], now_ms: u64) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        for packet in self.decoder.push(bytes) {
            match packet {
                Ok(packet) => {
                    self.last_seen_ms = Some(now_ms);
                    self.signal_lost = false;
                    events.extend(self.transition(packet));
                }
                Err(e) => warn!(error = %e, "Dropping bad stackmat packet"),
            }
        }
        events
    }

    /// Report `SignalLost` once if the device has gone quiet
    pub fn check_signal(&mut self, now_ms: u64) -> Option<TimerEvent> {
        let silent_ms = now_ms.saturating_sub(self.last_seen_ms?);
        if self.signal_lost || silent_ms < self.signal_timeout_ms {
            return None;
        }
        self.signal_lost = true;
        warn!(silent_ms, "Stackmat signal lost");
        Some(TimerEvent::SignalLost)
    }

    fn transition(&mut self, packet: Packet) -> Vec<TimerEvent> {
        use PacketStatus::*;

        let prev = self.last.replace(packet);
        let prev_status = prev.map(|p| p.status).unwrap_or(Idle);
        let status = packet.status;
        trace!(?status, time_ms = packet.time_ms, "Stackmat packet");

        let mut events = Vec::new();

        if status.both_hands_down() && !prev_status.both_hands_down() && prev_status != Running {
            events.push(TimerEvent::Engage);
        }

        if prev_status.both_hands_down() && !status.both_hands_down() && status != Stopped {
            events.push(TimerEvent::Release);
        }

        match status {
            Running => events.push(TimerEvent::HardwareTick(packet.time_ms)),
            Stopped if prev_status != Stopped => {
                debug!(time_ms = packet.time_ms, "Stackmat stopped");
                events.push(TimerEvent::HardwareStop(packet.time_ms));
            }
            Idle if packet.time_ms == 0 && prev.map(|p| p.time_ms > 0).unwrap_or(false) => {
                debug!("Stackmat reset");
                events.push(TimerEvent::HardwareReset);
            }
            _ => {}
        }

        events
    }
}
