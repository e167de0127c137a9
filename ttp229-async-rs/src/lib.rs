//! An asynchronous, `no_std` driver for the TTP229 capacitive touch keypad.
//!
//! The TTP229 reports its 8 or 16 key states as a bitmask clocked out over a
//! two-wire serial interface: a host-driven clock plus an active-low data
//! line that the device also pulses to announce a touch. This crate bit-bangs
//! that readback over `embedded-hal` pins and turns the raw bitmask samples
//! into discrete press and release events, one transition per call.
//!
//! The main entry point is the [`Ttp229`] struct. In [`EventMode::Interrupt`]
//! the data line's rising edge is awaited through `embedded-hal-async`'s
//! `Wait` trait, so the host does not have to poll the device continuously;
//! in [`EventMode::Polling`] every call samples the bus directly.
//!
//! The protocol carries no acknowledgement or checksum: a disconnected
//! keypad is indistinguishable from one with nothing pressed. Simultaneous
//! multi-key (chorded) touches are not supported, matching the device's
//! single-key mode.
//!
//! # Usage
//!
//! See the `keypad-tester` crate for a full ESP32-S3 dispatch loop wired to
//! this driver.

#![cfg_attr(not(test), no_std)]

pub mod err;
pub mod event;
pub mod keypad;

mod irq;
mod state;

pub use err::LineError;
pub use event::{ButtonEvent, KeyCount};
pub use irq::EdgeFlags;
pub use keypad::Ttp229;
pub use state::EventMode;
