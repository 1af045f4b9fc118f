//! ADC Calibration

use crate::adc::RawSample;
use crate::error::ReportError;
use serde::{Deserialize, Serialize};

/// Conversion from raw counts to physical units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// ADC reference voltage (V)
    pub vref: f32,
    /// Converter resolution in bits
    pub resolution_bits: u8,
    /// Battery sense divider; the pin sees 1/`battery_divider` of VBAT
    pub battery_divider: f32,
    /// IR range polynomial `c0 + c1 v + c2 v^2 + c3 v^3 + c4 v^4` (metres)
    pub distance_coefficients: [f32; 5],
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            vref: 3.3,
            resolution_bits: 10,
            battery_divider: 3.0,
            distance_coefficients: [2.34, -4.74, 4.06, -1.60, 0.24],
        }
    }
}

/// A calibrated sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Counts as converted
    pub raw: RawSample,
    /// Battery voltage (V)
    pub battery_v: f32,
    /// Distance to target (m)
    pub distance_m: f32,
}

impl Calibration {
    /// Check the parameters before use
    pub fn validate(&self) -> Result<(), ReportError> {
        if !(1..=16).contains(&self.resolution_bits) {
            return Err(ReportError::InvalidCalibration(
                "resolution_bits must be within 1..=16",
            ));
        }
        if !(self.vref > 0.0) {
            return Err(ReportError::InvalidCalibration("vref must be positive"));
        }
        if !(self.battery_divider > 0.0) {
            return Err(ReportError::InvalidCalibration(
                "battery_divider must be positive",
            ));
        }
        Ok(())
    }

    /// Largest count the converter produces
    pub fn full_scale(&self) -> u16 {
        let bits = u32::from(self.resolution_bits.clamp(1, 16));
        ((1u32 << bits) - 1) as u16
    }

    /// Validate a single count against full scale
    pub fn check_raw(&self, field: &'static str, value: u16) -> Result<(), ReportError> {
        let max = self.full_scale();
        if value > max {
            Err(ReportError::OutOfRange { field, value, max })
        } else {
            Ok(())
        }
    }

    /// Voltage at the pin
    pub fn pin_volts(&self, raw: u16) -> f32 {
        f32::from(raw) / f32::from(self.full_scale()) * self.vref
    }

    /// Battery voltage behind the divider
    pub fn battery_volts(&self, raw: u16) -> f32 {
        self.pin_volts(raw) * self.battery_divider
    }

    /// Distance from the IR sensor output
    pub fn distance_m(&self, raw: u16) -> f32 {
        let v = self.pin_volts(raw);
        self.distance_coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * v + c)
    }

    /// Validate and convert a sample
    pub fn reading(&self, raw: RawSample) -> Result<Reading, ReportError> {
        self.check_raw("battery", raw.battery)?;
        self.check_raw("distance", raw.distance)?;
        Ok(Reading {
            raw,
            battery_v: self.battery_volts(raw.battery),
            distance_m: self.distance_m(raw.distance),
        })
    }
}
