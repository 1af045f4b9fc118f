//! Output sentences
//!
//! Three fixed ASCII shapes are supported:
//!
//! | format    | shape                 | example              |
//! |-----------|-----------------------|----------------------|
//! | `raw`     | `ADC: <count>\n`      | `ADC: 434\n`         |
//! | `voltage` | ` ADC:<volts> `       | ` ADC:4.200000 `     |
//! | `sens`    | `$SENS,<m>,<v>*`      | `$SENS,0.300,4.200*` |

use crate::calibration::Reading;
use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

/// Longest sentence a report may produce
pub const SENTENCE_CAPACITY: usize = 20;

/// Which sentence shape the node emits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Raw battery count
    Raw,
    /// Battery voltage, six decimals
    Voltage,
    /// Distance and battery voltage, three decimals each
    #[default]
    Sens,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(ReportFormat::Raw),
            "voltage" => Ok(ReportFormat::Voltage),
            "sens" => Ok(ReportFormat::Sens),
            _ => Err(ReportError::InvalidFormat(s.to_string())),
        }
    }
}

/// Fixed-capacity text buffer a sentence is rendered into
#[derive(Clone, Copy)]
pub struct SentenceBuf {
    bytes: [u8; SENTENCE_CAPACITY],
    len: usize,
}

impl SentenceBuf {
    /// Empty buffer
    pub const fn new() -> Self {
        Self {
            bytes: [0; SENTENCE_CAPACITY],
            len: 0,
        }
    }

    /// Rendered bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Rendered text
    pub fn as_str(&self) -> &str {
        // Only whole `&str` fragments are ever copied in.
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SentenceBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Write for SentenceBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        if end > SENTENCE_CAPACITY {
            return Err(fmt::Error);
        }
        self.bytes[self.len..end].copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

impl fmt::Debug for SentenceBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SentenceBuf").field(&self.as_str()).finish()
    }
}

/// One report line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentence {
    /// Raw battery count
    Raw(u16),
    /// Battery voltage
    Voltage(f32),
    /// Distance (m) and battery voltage (V)
    Sens { distance: f32, battery: f32 },
}

impl Sentence {
    /// Build the sentence for `reading` in the requested shape
    pub fn from_reading(format: ReportFormat, reading: &Reading) -> Self {
        match format {
            ReportFormat::Raw => Sentence::Raw(reading.raw.battery),
            ReportFormat::Voltage => Sentence::Voltage(reading.battery_v),
            ReportFormat::Sens => Sentence::Sens {
                distance: reading.distance_m,
                battery: reading.battery_v,
            },
        }
    }

    /// Render into a fixed-size buffer
    pub fn render(&self) -> Result<SentenceBuf, ReportError> {
        let mut buf = SentenceBuf::new();
        write!(buf, "{}", self).map_err(|_| ReportError::Overflow {
            capacity: SENTENCE_CAPACITY,
        })?;
        Ok(buf)
    }

    /// Parse a line produced by [`Sentence::render`]
    pub fn parse(line: &str) -> Result<Self, ReportError> {
        if let Some(body) = line.strip_prefix("$SENS,") {
            let body = body
                .strip_suffix('*')
                .ok_or_else(|| ReportError::InvalidFormat(line.to_string()))?;
            let (distance, battery) = body
                .split_once(',')
                .ok_or_else(|| ReportError::InvalidFormat(line.to_string()))?;
            return Ok(Sentence::Sens {
                distance: parse_number("distance", distance)?,
                battery: parse_number("battery", battery)?,
            });
        }

        if let Some(body) = line.strip_prefix("ADC: ") {
            let body = body
                .strip_suffix('\n')
                .ok_or_else(|| ReportError::InvalidFormat(line.to_string()))?;
            return Ok(Sentence::Raw(parse_number("count", body)?));
        }

        if let Some(body) = line.strip_prefix(" ADC:") {
            let body = body
                .strip_suffix(' ')
                .ok_or_else(|| ReportError::InvalidFormat(line.to_string()))?;
            return Ok(Sentence::Voltage(parse_number("voltage", body)?));
        }

        Err(ReportError::InvalidFormat(line.to_string()))
    }
}

fn parse_number<T: FromStr>(field: &'static str, text: &str) -> Result<T, ReportError> {
    text.parse().map_err(|_| ReportError::InvalidNumber {
        field,
        text: text.to_string(),
    })
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentence::Raw(count) => writeln!(f, "ADC: {}", count),
            Sentence::Voltage(volts) => write!(f, " ADC:{:.6} ", volts),
            Sentence::Sens { distance, battery } => {
                write!(f, "$SENS,{:.3},{:.3}*", distance, battery)
            }
        }
    }
}
