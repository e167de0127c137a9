//! Core implementation of the TTP229 touch keypad driver.

use embassy_time::{block_for, Duration};
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::digital::Wait;

use crate::err::LineError;
use crate::event::{ButtonEvent, KeyCount};
use crate::state::{EventMode, KeypadState};

/// Half of one readback clock cycle. The TTP229 tops out at 512 kHz, so 1 us
/// per half cycle leaves a comfortable margin.
const HALF_CYCLE: Duration = Duration::from_micros(1);

/// A driver for the TTP229 capacitive touch keypad.
///
/// The device exposes two lines: SCL, driven by the host and idle-high, and
/// SDO, an active-low data output that the device also pulses to signal a
/// touch. In [`EventMode::Interrupt`] that pulse's rising edge is awaited via
/// [`wait_for_event`](Self::wait_for_event); in [`EventMode::Polling`] the
/// caller samples on its own schedule and should leave at least 2.5 ms
/// between reads so the device's output register resets.
///
/// Only one key at a time is supported, matching the device's default
/// single-key mode. Event ordering under true simultaneous multi-key touches
/// is unspecified.
pub struct Ttp229<TSCL, TSDO> {
    scl: TSCL,
    sdo: TSDO,
    state: KeypadState,
}

impl<TSCL, TSDO, TPINERR> Ttp229<TSCL, TSDO>
where
    TPINERR: core::fmt::Debug,
    TSCL: OutputPin<Error = TPINERR>,
    TSDO: InputPin<Error = TPINERR> + Wait,
{
    /// Creates a new `Ttp229` driver instance.
    ///
    /// # Arguments
    ///
    /// * `scl` - Output pin wired to the keypad's clock line.
    /// * `sdo` - Input pin wired to the keypad's data line.
    /// * `key_count` - 8- or 16-key board variant.
    /// * `mode` - Edge-interrupt or pure-polling event delivery.
    pub fn new(scl: TSCL, sdo: TSDO, key_count: KeyCount, mode: EventMode) -> Self {
        Self {
            scl,
            sdo,
            state: KeypadState::new(key_count, mode),
        }
    }

    /// Parks the clock line idle-high and clears all event state.
    pub fn init(&mut self) -> Result<(), LineError<TPINERR>> {
        self.scl.set_high().map_err(LineError::Clock)?;
        self.state.reset();
        log::trace!("ttp229: init, {} keys", self.state.key_count().keys());
        Ok(())
    }

    /// Clocks out one full bitmask sample. Bit *i* set means key *i + 1* is
    /// touched; a disconnected device reads as all-unset.
    ///
    /// The delays are blocking on purpose: the device resets its shift
    /// register when the bus idles for about 2 ms, so the frame must not
    /// yield to the executor halfway through.
    pub fn read_raw(&mut self) -> Result<u16, LineError<TPINERR>> {
        let mut mask = 0u16;
        for bit in 0..self.state.key_count().keys() {
            self.scl.set_low().map_err(LineError::Clock)?;
            block_for(HALF_CYCLE);
            self.scl.set_high().map_err(LineError::Clock)?;
            // SDO is active-low: low = touched.
            if self.sdo.is_low().map_err(LineError::Data)? {
                mask |= 1 << bit;
            }
            block_for(HALF_CYCLE);
        }
        log::trace!("ttp229: raw bitmask {mask:#06x}");
        Ok(mask)
    }

    /// Samples the keypad and returns the full bitmask of touched keys.
    ///
    /// This is the polling accessor: the sample (plus any not-yet-reported
    /// bits) becomes the driver's new notion of current truth, so a
    /// subsequent [`button_event`](Self::button_event) diffs against it.
    pub fn button_status(&mut self) -> Result<u16, LineError<TPINERR>> {
        let raw = self.read_raw()?;
        Ok(self.state.absorb_status(raw))
    }

    /// Returns at most one press or release transition.
    ///
    /// In interrupt mode this returns `Ok(None)` without touching the bus
    /// when no edge is pending, so it is cheap to call in a loop. When an
    /// event carries [`more_pending`](ButtonEvent::more_pending) the edge
    /// stays latched and the next call reads again immediately.
    pub fn button_event(&mut self) -> Result<Option<ButtonEvent>, LineError<TPINERR>> {
        if !self.state.needs_sample() {
            return Ok(None);
        }

        let raw = self.read_raw()?;
        // A still-asserted line means the device has not finished its 2 ms
        // reset window; the edge it emits on letting go must not count.
        let still_asserted = self.sdo.is_low().map_err(LineError::Data)?;
        let event = self.state.process_event_sample(raw, still_asserted);

        if let Some(ev) = event {
            log::debug!(
                "ttp229: key {} {}",
                ev.key,
                if ev.released { "released" } else { "pressed" }
            );
        }
        Ok(event)
    }

    /// `true` when a call to [`button_event`](Self::button_event) may yield
    /// something. Always `true` in polling mode.
    pub fn has_event(&self) -> bool {
        self.state.has_event()
    }

    /// Interrupt mode: parks until a rising edge on the data line latches an
    /// event, swallowing the device's trailing reset edge when one is due.
    /// Returns immediately when an event is already pending, or always in
    /// polling mode.
    ///
    /// No edge machinery runs outside this call, so a bit-banged read can
    /// never be preempted by edge handling.
    pub async fn wait_for_event(&mut self) -> Result<(), LineError<TPINERR>> {
        match self.state.flags() {
            None => return Ok(()),
            Some(flags) if flags.pending() => return Ok(()),
            Some(_) => {}
        }
        loop {
            self.sdo
                .wait_for_rising_edge()
                .await
                .map_err(LineError::Data)?;
            if self.state.notify_edge() {
                return Ok(());
            }
            log::trace!("ttp229: swallowed trailing reset edge");
        }
    }

    /// The edge latch, when interrupt mode is configured.
    ///
    /// Exposed so a raw GPIO interrupt handler can drive
    /// [`EdgeFlags::notify_edge`](crate::EdgeFlags::notify_edge) directly
    /// instead of parking a task in [`wait_for_event`](Self::wait_for_event).
    pub fn edge_flags(&self) -> Option<&crate::EdgeFlags> {
        self.state.flags()
    }

    /// Diagnostic count of accepted edges; 0 in polling mode.
    pub fn edge_count(&self) -> u32 {
        self.state.flags().map(|flags| flags.edge_count()).unwrap_or(0)
    }
}
