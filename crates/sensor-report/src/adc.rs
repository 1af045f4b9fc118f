//! Analog acquisition

use crate::calibration::{Calibration, Reading};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One conversion of both channels, in raw counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    /// Battery sense channel
    pub battery: u16,
    /// IR range channel
    pub distance: u16,
}

/// ADC peripheral with manually started conversions
pub trait AnalogFrontEnd {
    /// Begin sampling and converting both channels
    fn start_conversion(&mut self);

    /// Poll the conversion-done flag
    fn conversion_done(&mut self) -> bool;

    /// Read the results and clear the done flag
    fn read(&mut self) -> RawSample;
}

/// Per-tick acquisition state machine
///
/// Every poll either starts the first conversion, notices a finished one
/// (reading it and immediately starting the next) or does nothing.
pub struct Acquisition<A> {
    adc: A,
    calibration: Calibration,
    converting: bool,
    latest: Option<Reading>,
    completed: u64,
    rejected: u64,
}

impl<A: AnalogFrontEnd> Acquisition<A> {
    /// Create an idle acquisition over `adc`
    pub fn new(adc: A, calibration: Calibration) -> Self {
        Self {
            adc,
            calibration,
            converting: false,
            latest: None,
            completed: 0,
            rejected: 0,
        }
    }

    /// Advance by one tick; returns a fresh reading when one completed
    pub fn poll(&mut self) -> Option<Reading> {
        if !self.converting {
            self.adc.start_conversion();
            self.converting = true;
            return None;
        }

        if !self.adc.conversion_done() {
            return None;
        }

        let raw = self.adc.read();
        self.adc.start_conversion();

        match self.calibration.reading(raw) {
            Ok(reading) => {
                self.completed += 1;
                self.latest = Some(reading);
                Some(reading)
            }
            Err(e) => {
                self.rejected += 1;
                warn!("Discarding conversion: {}", e);
                None
            }
        }
    }

    /// Most recent valid reading
    pub fn latest(&self) -> Option<&Reading> {
        self.latest.as_ref()
    }

    /// Conversions accepted
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Conversions rejected as out of range
    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Active calibration
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }
}

/// Deterministic ADC simulation (no hardware required)
///
/// The battery slowly sags from 4.2 V and the range channel sweeps a
/// triangle wave, so successive reports differ in a predictable way.
#[derive(Debug, Clone)]
pub struct SimulatedAdc {
    /// Polls a conversion takes before the done flag rises
    conversion_polls: u32,
    /// Polls left on the running conversion
    remaining: Option<u32>,
    /// Conversions finished so far
    conversions: u32,
}

impl SimulatedAdc {
    /// Battery channel count at full charge (1.4 V pin, 4.2 V battery)
    const BATTERY_FULL: u16 = 434;
    /// Range sweep bounds
    const SWEEP_MIN: u16 = 100;
    const SWEEP_MAX: u16 = 700;

    /// Create an ADC whose conversions take `conversion_polls` polls
    pub fn new(conversion_polls: u32) -> Self {
        debug!("Simulated ADC, {} polls per conversion", conversion_polls);
        Self {
            conversion_polls,
            remaining: None,
            conversions: 0,
        }
    }

    /// Conversions finished so far
    pub fn conversions(&self) -> u32 {
        self.conversions
    }

    fn sample(&self) -> RawSample {
        let n = self.conversions;
        let sag = ((n / 100) % 40) as u16;

        let span = u32::from(Self::SWEEP_MAX - Self::SWEEP_MIN);
        let phase = n.wrapping_mul(7) % (2 * span);
        let offset = if phase < span { phase } else { 2 * span - phase };

        RawSample {
            battery: Self::BATTERY_FULL - sag,
            distance: Self::SWEEP_MIN + offset as u16,
        }
    }
}

impl Default for SimulatedAdc {
    fn default() -> Self {
        Self::new(1)
    }
}

impl AnalogFrontEnd for SimulatedAdc {
    fn start_conversion(&mut self) {
        self.remaining = Some(self.conversion_polls);
    }

    fn conversion_done(&mut self) -> bool {
        match self.remaining {
            Some(0) => true,
            Some(n) => {
                self.remaining = Some(n - 1);
                n == 1
            }
            None => false,
        }
    }

    fn read(&mut self) -> RawSample {
        let sample = self.sample();
        self.conversions = self.conversions.wrapping_add(1);
        self.remaining = None;
        sample
    }
}
