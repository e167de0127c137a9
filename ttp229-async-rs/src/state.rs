//! Event bookkeeping between bitmask samples.
//!
//! Tracks the last *reported* bitmask (not the last sampled one), the bits
//! observed but not yet surfaced as events, and the pending-edge flags. The
//! hardware-facing half of the driver lives in [`crate::keypad`]; everything
//! here is plain state so it can be exercised with synthetic samples.

use crate::event::{next_transition, ButtonEvent, KeyCount};
use crate::irq::EdgeFlags;

/// How button transitions reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMode {
    /// No interrupt line; the caller polls continuously and every sample is
    /// consumed in full as it is taken.
    Polling,
    /// The data line doubles as a rising-edge interrupt source; reads happen
    /// only after an edge has been latched.
    Interrupt,
}

pub(crate) struct IrqState {
    pub flags: EdgeFlags,
    /// Bits seen asserted in a sample but not yet reported as presses.
    pub unhandled: u16,
}

pub(crate) enum Coordination {
    Polling,
    Interrupt(IrqState),
}

pub(crate) struct KeypadState {
    key_count: KeyCount,
    /// Bit k set iff the last reported event for key k + 1 was a press.
    reported: u16,
    coordination: Coordination,
}

impl KeypadState {
    pub fn new(key_count: KeyCount, mode: EventMode) -> Self {
        let coordination = match mode {
            EventMode::Polling => Coordination::Polling,
            EventMode::Interrupt => Coordination::Interrupt(IrqState {
                flags: EdgeFlags::new(),
                unhandled: 0,
            }),
        };
        Self {
            key_count,
            reported: 0,
            coordination,
        }
    }

    pub fn key_count(&self) -> KeyCount {
        self.key_count
    }

    pub fn reset(&mut self) {
        self.reported = 0;
        if let Coordination::Interrupt(irq) = &mut self.coordination {
            irq.unhandled = 0;
            irq.flags.clear_pending();
            irq.flags.set_ignore_next(false);
        }
    }

    pub fn flags(&self) -> Option<&EdgeFlags> {
        match &self.coordination {
            Coordination::Interrupt(irq) => Some(&irq.flags),
            Coordination::Polling => None,
        }
    }

    pub fn notify_edge(&self) -> bool {
        match self.flags() {
            Some(flags) => flags.notify_edge(),
            None => false,
        }
    }

    /// Polling mode always reports readiness; interrupt mode only after a
    /// latched edge.
    pub fn has_event(&self) -> bool {
        match self.flags() {
            Some(flags) => flags.pending(),
            None => true,
        }
    }

    /// Whether the event path should touch the hardware at all.
    pub fn needs_sample(&self) -> bool {
        self.has_event()
    }

    /// Status path: the sample becomes the new reported truth wholesale, and
    /// any interrupt bookkeeping is consumed with it.
    pub fn absorb_status(&mut self, raw: u16) -> u16 {
        let mut value = raw;
        if let Coordination::Interrupt(irq) = &mut self.coordination {
            irq.flags.clear_pending();
            value |= irq.unhandled;
            irq.unhandled = 0;
        }
        self.reported = value;
        value
    }

    /// Event path: diff the sample against the reported state and surface at
    /// most one transition.
    ///
    /// `data_still_asserted` is the level of the data line right after the
    /// read; a still-asserted line means the device has not finished its 2 ms
    /// reset window and its trailing edge must be ignored.
    pub fn process_event_sample(
        &mut self,
        raw: u16,
        data_still_asserted: bool,
    ) -> Option<ButtonEvent> {
        let current = match &self.coordination {
            Coordination::Interrupt(irq) => raw | irq.unhandled,
            Coordination::Polling => raw,
        };

        let event = next_transition(self.reported, current);
        if let Some(ev) = event {
            let bit = 1u16 << (ev.key - 1);
            if ev.released {
                self.reported &= !bit;
            } else {
                self.reported |= bit;
                if let Coordination::Interrupt(irq) = &mut self.coordination {
                    // Keys still held but not yet reported must survive until
                    // a later sample without needing a fresh physical change.
                    irq.unhandled = current & !self.reported;
                }
            }
        }

        if let Coordination::Interrupt(irq) = &mut self.coordination {
            match event {
                Some(ev) if ev.more_pending => {
                    log::trace!("ttp229: more changes outstanding, edge stays latched");
                }
                // Also reached when the diff found nothing despite a latched
                // edge; clearing keeps a timing mismatch from wedging the
                // pending flag forever.
                _ => irq.flags.clear_pending(),
            }
            irq.flags.set_ignore_next(data_still_asserted);
        }

        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interrupt_state() -> KeypadState {
        KeypadState::new(KeyCount::Sixteen, EventMode::Interrupt)
    }

    /// Latches an edge and processes one sample, the way the driver does
    /// after `wait_for_event`.
    fn on_edge(state: &mut KeypadState, raw: u16) -> Option<ButtonEvent> {
        state.notify_edge();
        assert!(state.needs_sample());
        state.process_event_sample(raw, false)
    }

    #[test]
    fn no_change_is_an_idempotent_no_op() {
        let mut state = interrupt_state();
        assert_eq!(on_edge(&mut state, 0x0000), None);
        // The stray edge is consumed rather than left latched.
        assert!(!state.has_event());

        let mut polling = KeypadState::new(KeyCount::Sixteen, EventMode::Polling);
        assert_eq!(polling.process_event_sample(0x0000, false), None);
        assert_eq!(polling.process_event_sample(0x0000, false), None);
    }

    #[test]
    fn reported_state_tracks_every_key() {
        let mut state = KeypadState::new(KeyCount::Sixteen, EventMode::Polling);
        for key in 1..=16u8 {
            let mask = 1u16 << (key - 1);
            let ev = state.process_event_sample(mask, false).unwrap();
            assert_eq!((ev.key, ev.released), (key, false));
            assert_eq!(state.reported, mask);

            let ev = state.process_event_sample(0, false).unwrap();
            assert_eq!((ev.key, ev.released), (key, true));
            assert_eq!(state.reported, 0);
        }
    }

    #[test]
    fn press_then_hold_then_release_sequence() {
        // 0x0000 -> 0x0001 -> 0x0003 -> 0x0002, one edge per device change.
        let mut state = interrupt_state();

        let ev = on_edge(&mut state, 0x0001).unwrap();
        assert_eq!((ev.key, ev.released, ev.more_pending), (1, false, false));
        assert!(!state.has_event());

        let ev = on_edge(&mut state, 0x0003).unwrap();
        assert_eq!((ev.key, ev.released, ev.more_pending), (2, false, false));
        assert!(!state.has_event());

        let ev = on_edge(&mut state, 0x0002).unwrap();
        assert_eq!((ev.key, ev.released, ev.more_pending), (1, true, false));
        assert!(!state.has_event());
        assert_eq!(state.reported, 0x0002);
    }

    #[test]
    fn simultaneous_presses_drain_over_two_calls() {
        let mut state = interrupt_state();

        let ev = on_edge(&mut state, 0x0005).unwrap();
        assert_eq!((ev.key, ev.released, ev.more_pending), (1, false, true));
        // The edge stays latched, so the follow-up read needs no new edge.
        assert!(state.has_event());

        let ev = state.process_event_sample(0x0005, false).unwrap();
        assert_eq!((ev.key, ev.released, ev.more_pending), (3, false, false));
        assert!(!state.has_event());
        assert_eq!(state.reported, 0x0005);
    }

    #[test]
    fn unhandled_bits_survive_without_a_fresh_change() {
        let mut state = interrupt_state();
        assert_eq!(on_edge(&mut state, 0x0005).map(|ev| ev.key), Some(1));

        // Device register dropped back to only key 3 held; the stashed bit
        // still surfaces as the press that was never reported.
        let ev = state.process_event_sample(0x0004, false).unwrap();
        assert_eq!((ev.key, ev.released), (3, false));
    }

    #[test]
    fn release_queued_behind_press_keeps_edge_latched() {
        let mut state = interrupt_state();
        assert_eq!(on_edge(&mut state, 0x0001).map(|ev| ev.key), Some(1));

        // Key 1 lifted and key 2 touched within one sample window.
        let ev = on_edge(&mut state, 0x0002).unwrap();
        assert_eq!((ev.key, ev.released, ev.more_pending), (2, false, true));
        assert!(state.has_event());

        let ev = state.process_event_sample(0x0002, false).unwrap();
        assert_eq!((ev.key, ev.released, ev.more_pending), (1, true, false));
        assert!(!state.has_event());
    }

    #[test]
    fn polling_mode_is_always_ready() {
        let state = KeypadState::new(KeyCount::Eight, EventMode::Polling);
        assert!(state.has_event());
        assert!(state.needs_sample());
        assert!(state.flags().is_none());
        // Edges are meaningless without an interrupt line.
        assert!(!state.notify_edge());
    }

    #[test]
    fn status_read_consumes_all_bookkeeping() {
        let mut state = interrupt_state();
        assert_eq!(on_edge(&mut state, 0x0005).map(|ev| ev.key), Some(1));
        assert!(state.has_event());

        // Sample says only key 2 now; the unreported key 3 folds in.
        let status = state.absorb_status(0x0002);
        assert_eq!(status, 0x0006);
        assert_eq!(state.reported, 0x0006);
        assert!(!state.has_event());

        // Bookkeeping is gone: the next event diffs against the new truth.
        assert_eq!(state.process_event_sample(0x0006, false), None);
    }

    #[test]
    fn still_asserted_line_arms_suppression() {
        let mut state = interrupt_state();
        state.notify_edge();
        state.process_event_sample(0x8000, true);

        // The trailing reset edge is swallowed; a genuine one latches again.
        assert!(!state.notify_edge());
        assert!(!state.has_event());
        assert!(state.notify_edge());
        assert!(state.has_event());
    }
}
