use crate::wire::{ByteReader, ByteWriter, WireError};

/// Top-level game state riding along with every flush. Every field is
/// optional on the wire (presence boolean first); an absent field means
/// "unchanged, do not touch the client-side value".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameStateMeta {
    pub timestamp: Option<f64>,
    pub cycle_start: Option<f64>,
    pub cycle_duration: Option<f64>,
    pub wave_number: Option<u8>,
    pub wave_state: Option<String>,
    pub phase_start: Option<f64>,
    pub phase_duration: Option<f64>,
    pub is_full_state: bool,
}

fn write_opt_f64(writer: &mut ByteWriter, value: Option<f64>) {
    writer.write_bool(value.is_some());
    if let Some(value) = value {
        writer.write_f64(value);
    }
}

fn read_opt_f64(reader: &mut ByteReader) -> Result<Option<f64>, WireError> {
    Ok(if reader.read_bool()? {
        Some(reader.read_f64()?)
    } else {
        None
    })
}

impl GameStateMeta {
    pub fn encode(&self, writer: &mut ByteWriter) {
        write_opt_f64(writer, self.timestamp);
        write_opt_f64(writer, self.cycle_start);
        write_opt_f64(writer, self.cycle_duration);

        writer.write_bool(self.wave_number.is_some());
        if let Some(wave) = self.wave_number {
            writer.write_u8(wave);
        }

        writer.write_bool(self.wave_state.is_some());
        if let Some(state) = &self.wave_state {
            writer.write_string(state);
        }

        write_opt_f64(writer, self.phase_start);
        write_opt_f64(writer, self.phase_duration);

        writer.write_bool(true);
        writer.write_bool(self.is_full_state);
    }

    pub fn decode(reader: &mut ByteReader) -> Result<Self, WireError> {
        let timestamp = read_opt_f64(reader)?;
        let cycle_start = read_opt_f64(reader)?;
        let cycle_duration = read_opt_f64(reader)?;

        let wave_number = if reader.read_bool()? {
            Some(reader.read_u8()?)
        } else {
            None
        };

        let wave_state = if reader.read_bool()? {
            Some(reader.read_string()?)
        } else {
            None
        };

        let phase_start = read_opt_f64(reader)?;
        let phase_duration = read_opt_f64(reader)?;

        let is_full_state = if reader.read_bool()? {
            reader.read_bool()?
        } else {
            false
        };

        Ok(Self {
            timestamp,
            cycle_start,
            cycle_duration,
            wave_number,
            wave_state,
            phase_start,
            phase_duration,
            is_full_state,
        })
    }
}
