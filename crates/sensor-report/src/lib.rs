//! Sensor Reporting
//!
//! Acquires battery and IR range samples, converts them to physical units and
//! renders the fixed-shape ASCII sentences streamed over the UART.

mod adc;
mod calibration;
mod error;
mod sentence;

pub use adc::{Acquisition, AnalogFrontEnd, RawSample, SimulatedAdc};
pub use calibration::{Calibration, Reading};
pub use error::ReportError;
pub use sentence::{ReportFormat, Sentence, SentenceBuf, SENTENCE_CAPACITY};
