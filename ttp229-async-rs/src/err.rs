//! Error types for the TTP229 driver.

use core::fmt::{self, Debug};

/// An error from one of the two protocol lines.
pub enum LineError<TPINERR> {
    /// Driving the clock output failed.
    Clock(TPINERR),
    /// Sampling or waiting on the data input failed.
    Data(TPINERR),
}

impl<TPINERR: Debug> Debug for LineError<TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock(err) => write!(f, "Clock({err:?})"),
            Self::Data(err) => write!(f, "Data({err:?})"),
        }
    }
}
