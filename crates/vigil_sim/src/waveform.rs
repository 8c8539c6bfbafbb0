//! Waveform recording for simulation output.
//!
//! The [`WaveformRecorder`] trait abstracts waveform output. [`VcdRecorder`]
//! implements the IEEE 1364 Value Change Dump (VCD) format, producing text
//! files that can be viewed in GTKWave, Surfer, or other waveform viewers.

use std::io::Write;

use vigil_common::Logic;

use crate::error::SimError;
use crate::value::SimSignalId;

/// Trait for recording simulation waveforms.
pub trait WaveformRecorder {
    /// Registers a single-bit signal for recording.
    fn register_signal(&mut self, id: SimSignalId, name: &str) -> Result<(), SimError>;

    /// Opens a new scope (hierarchy level) in the waveform.
    fn begin_scope(&mut self, name: &str) -> Result<(), SimError>;

    /// Closes the current scope.
    fn end_scope(&mut self) -> Result<(), SimError>;

    /// Records a value change at the given time (in femtoseconds).
    fn record_change(&mut self, time_fs: u64, id: SimSignalId, value: Logic)
        -> Result<(), SimError>;

    /// Finalizes the waveform output (flush, write trailer, etc.).
    fn finalize(&mut self) -> Result<(), SimError>;
}

/// VCD (Value Change Dump) format recorder following IEEE 1364.
///
/// Signal identifiers use printable ASCII characters starting from `!` (0x21).
pub struct VcdRecorder<W: Write> {
    writer: W,
    /// Identifier code per registered signal, indexed by raw signal id.
    id_codes: Vec<Option<String>>,
    next_id: u32,
    header_written: bool,
    current_time: Option<u64>,
}

impl<W: Write> VcdRecorder<W> {
    /// Creates a new VCD recorder writing to the given output.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            id_codes: Vec::new(),
            next_id: 0,
            header_written: false,
            current_time: None,
        }
    }

    /// Consumes the recorder and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn ensure_header(&mut self) -> Result<(), SimError> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        writeln!(self.writer, "$version")?;
        writeln!(self.writer, "  vigil cycle kernel")?;
        writeln!(self.writer, "$end")?;
        writeln!(self.writer, "$timescale")?;
        writeln!(self.writer, "  1fs")?;
        writeln!(self.writer, "$end")?;
        Ok(())
    }

    /// Generates a VCD identifier code from a sequential index.
    ///
    /// Multi-character codes are generated for indices >= 94.
    fn make_id_code(index: u32) -> String {
        let mut result = String::new();
        let mut idx = index;
        loop {
            let c = (b'!' + (idx % 94) as u8) as char;
            result.push(c);
            idx /= 94;
            if idx == 0 {
                break;
            }
            idx -= 1;
        }
        result
    }
}

impl<W: Write> WaveformRecorder for VcdRecorder<W> {
    fn register_signal(&mut self, id: SimSignalId, name: &str) -> Result<(), SimError> {
        let code = Self::make_id_code(self.next_id);
        self.next_id += 1;
        writeln!(self.writer, "$var wire 1 {code} {name} $end")?;

        let slot = id.as_raw() as usize;
        if self.id_codes.len() <= slot {
            self.id_codes.resize(slot + 1, None);
        }
        self.id_codes[slot] = Some(code);
        Ok(())
    }

    fn begin_scope(&mut self, name: &str) -> Result<(), SimError> {
        self.ensure_header()?;
        writeln!(self.writer, "$scope module {name} $end")?;
        Ok(())
    }

    fn end_scope(&mut self) -> Result<(), SimError> {
        writeln!(self.writer, "$upscope $end")?;
        Ok(())
    }

    fn record_change(
        &mut self,
        time_fs: u64,
        id: SimSignalId,
        value: Logic,
    ) -> Result<(), SimError> {
        self.ensure_header()?;

        if self.current_time != Some(time_fs) {
            if self.current_time.is_none() {
                writeln!(self.writer, "$enddefinitions $end")?;
                writeln!(self.writer, "$dumpvars")?;
            }
            writeln!(self.writer, "#{time_fs}")?;
            self.current_time = Some(time_fs);
        }

        // Unregistered signals are not part of the dump.
        if let Some(Some(code)) = self.id_codes.get(id.as_raw() as usize) {
            writeln!(self.writer, "{}{code}", value.vcd_char())?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), SimError> {
        if self.current_time.is_none() {
            self.ensure_header()?;
            writeln!(self.writer, "$enddefinitions $end")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_recorder() -> VcdRecorder<Vec<u8>> {
        VcdRecorder::new(Vec::new())
    }

    fn output(rec: VcdRecorder<Vec<u8>>) -> String {
        String::from_utf8(rec.into_inner()).unwrap()
    }

    #[test]
    fn id_codes_are_printable() {
        assert_eq!(VcdRecorder::<Vec<u8>>::make_id_code(0), "!");
        assert_eq!(VcdRecorder::<Vec<u8>>::make_id_code(1), "\"");
        assert_eq!(VcdRecorder::<Vec<u8>>::make_id_code(93), "~");
        assert_eq!(VcdRecorder::<Vec<u8>>::make_id_code(94).len(), 2);
    }

    #[test]
    fn header_and_vars() {
        let mut rec = make_recorder();
        rec.begin_scope("solo_squash").unwrap();
        rec.register_signal(SimSignalId::from_raw(0), "clk").unwrap();
        rec.register_signal(SimSignalId::from_raw(1), "hsync").unwrap();
        rec.end_scope().unwrap();
        rec.finalize().unwrap();

        let out = output(rec);
        assert!(out.contains("$timescale"));
        assert!(out.contains("$scope module solo_squash $end"));
        assert!(out.contains("$var wire 1 ! clk $end"));
        assert!(out.contains("$var wire 1 \" hsync $end"));
        assert!(out.contains("$enddefinitions $end"));
    }

    #[test]
    fn changes_grouped_by_timestamp() {
        let mut rec = make_recorder();
        rec.begin_scope("top").unwrap();
        rec.register_signal(SimSignalId::from_raw(0), "clk").unwrap();
        rec.register_signal(SimSignalId::from_raw(1), "tx").unwrap();
        rec.end_scope().unwrap();

        rec.record_change(0, SimSignalId::from_raw(0), Logic::Zero).unwrap();
        rec.record_change(0, SimSignalId::from_raw(1), Logic::X).unwrap();
        rec.record_change(20, SimSignalId::from_raw(0), Logic::One).unwrap();
        rec.record_change(20, SimSignalId::from_raw(1), Logic::Z).unwrap();
        rec.finalize().unwrap();

        let out = output(rec);
        assert!(out.contains("$dumpvars"));
        assert_eq!(out.matches("#0\n").count(), 1);
        assert_eq!(out.matches("#20\n").count(), 1);
        assert!(out.contains("0!\nx\"\n#20\n1!\nz\"\n"));
    }

    #[test]
    fn unregistered_signal_is_skipped() {
        let mut rec = make_recorder();
        rec.record_change(5, SimSignalId::from_raw(9), Logic::One).unwrap();
        rec.finalize().unwrap();
        let out = output(rec);
        assert!(out.contains("#5"));
        assert!(!out.contains("1!"));
    }
}
