//! candump log replay
//!
//! Reads frames recorded with `candump -L`:
//!
//! ```text
//! (1697040000.123456) vcan0 1A0#5703
//! (1697040000.223456) vcan0 18FF0001#0102030405060708
//! ```
//!
//! Three hex digits mark a standard identifier, eight an extended one.
//! Remote frames (`ID#R`), blank lines and `#` comments are skipped.

use super::{FrameSource, ReadOutcome};
use crate::types::{CanFrame, DecoderError, Result, MAX_PAYLOAD_LEN};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Frame source replaying a candump log
pub struct ReplaySource {
    lines: Box<dyn BufRead + Send>,
    name: String,
    line_no: usize,
    frames: usize,
}

impl ReplaySource {
    /// Open a candump log file
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Opening replay log: {:?}", path);

        if !path.exists() {
            return Err(DecoderError::ConfigError(format!(
                "replay log not found: {:?}",
                path
            )));
        }

        let file = File::open(path)?;
        Ok(Self::from_reader(
            BufReader::new(file),
            path.display().to_string(),
        ))
    }

    /// Replay frames from any buffered reader
    pub fn from_reader(reader: impl BufRead + Send + 'static, name: impl Into<String>) -> Self {
        Self {
            lines: Box::new(reader),
            name: name.into(),
            line_no: 0,
            frames: 0,
        }
    }
}

impl FrameSource for ReplaySource {
    fn describe(&self) -> String {
        format!("candump replay {}", self.name)
    }

    fn read_frame(&mut self) -> Result<ReadOutcome> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.lines.read_line(&mut line)? == 0 {
                log::info!("Replay finished after {} frames", self.frames);
                return Ok(ReadOutcome::EndOfStream);
            }
            self.line_no += 1;

            match parse_candump_line(&line) {
                Ok(Some(frame)) => {
                    self.frames += 1;
                    return Ok(ReadOutcome::Frame(frame));
                }
                Ok(None) => continue,
                Err(reason) => {
                    return Err(DecoderError::ReplayParseError {
                        line: self.line_no,
                        reason,
                    })
                }
            }
        }
    }
}

/// Parse one candump log line
///
/// Returns `Ok(None)` for lines that carry no data frame.
pub fn parse_candump_line(line: &str) -> std::result::Result<Option<CanFrame>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let timestamp = fields.next().ok_or("missing timestamp")?;
    if !(timestamp.starts_with('(') && timestamp.ends_with(')')) {
        return Err(format!("malformed timestamp '{}'", timestamp));
    }
    let _interface = fields.next().ok_or("missing interface")?;
    let frame = fields.next().ok_or("missing frame")?;

    let (id_str, data_str) = frame
        .split_once('#')
        .ok_or_else(|| format!("missing '#' in '{}'", frame))?;

    let is_extended = match id_str.len() {
        3 => false,
        8 => true,
        _ => return Err(format!("identifier '{}' must have 3 or 8 hex digits", id_str)),
    };
    let can_id = u32::from_str_radix(id_str, 16).map_err(|e| format!("bad identifier '{}': {}", id_str, e))?;

    if data_str.starts_with('R') {
        return Ok(None);
    }
    if data_str.starts_with('#') {
        return Err("CAN FD frames are not supported".to_string());
    }

    let data = parse_hex_payload(data_str)?;
    Ok(Some(CanFrame {
        can_id,
        data,
        is_extended,
    }))
}

fn parse_hex_payload(hex: &str) -> std::result::Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in '{}'", hex));
    }
    if hex.len() / 2 > MAX_PAYLOAD_LEN {
        return Err(format!("payload '{}' longer than {} bytes", hex, MAX_PAYLOAD_LEN));
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            let pair = hex.get(i..i + 2).ok_or_else(|| format!("bad hex in '{}'", hex))?;
            u8::from_str_radix(pair, 16).map_err(|_| format!("bad hex byte '{}'", pair))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_standard_frame() {
        let frame = parse_candump_line("(1697040000.123456) vcan0 1A0#5703").unwrap().unwrap();
        assert_eq!(frame, CanFrame::new(0x1A0, &[0x57, 0x03]));
    }

    #[test]
    fn test_parse_extended_frame() {
        let frame = parse_candump_line("(0.0) can0 18FF0001#0102").unwrap().unwrap();
        assert_eq!(frame.can_id, 0x18FF_0001);
        assert!(frame.is_extended);
        assert_eq!(frame.data, vec![1, 2]);
    }

    #[test]
    fn test_parse_empty_payload() {
        let frame = parse_candump_line("(0.0) can0 1A0#").unwrap().unwrap();
        assert_eq!(frame.dlc(), 0);
    }

    #[test]
    fn test_skipped_lines() {
        assert_eq!(parse_candump_line(""), Ok(None));
        assert_eq!(parse_candump_line("   "), Ok(None));
        assert_eq!(parse_candump_line("# recorded on the bench"), Ok(None));
        assert_eq!(parse_candump_line("(0.0) can0 1A0#R"), Ok(None));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_candump_line("vcan0 1A0#5703").is_err());
        assert!(parse_candump_line("(0.0) vcan0").is_err());
        assert!(parse_candump_line("(0.0) vcan0 1A05703").is_err());
        assert!(parse_candump_line("(0.0) vcan0 1A#5703").is_err());
        assert!(parse_candump_line("(0.0) vcan0 1A0#570").is_err());
        assert!(parse_candump_line("(0.0) vcan0 1A0#ZZ03").is_err());
        assert!(parse_candump_line("(0.0) vcan0 1A0#000102030405060708").is_err());
        assert!(parse_candump_line("(0.0) vcan0 1A0##1").is_err());
    }

    #[test]
    fn test_replay_reader() {
        let log = "(0.1) vcan0 1A0#5703\n\n(0.2) vcan0 1A0#R\n(0.3) vcan0 1A0#00FF\n";
        let mut source = ReplaySource::from_reader(Cursor::new(log), "memory");

        assert_eq!(
            source.read_frame().unwrap(),
            ReadOutcome::Frame(CanFrame::new(0x1A0, &[0x57, 0x03]))
        );
        assert_eq!(
            source.read_frame().unwrap(),
            ReadOutcome::Frame(CanFrame::new(0x1A0, &[0x00, 0xFF]))
        );
        assert_eq!(source.read_frame().unwrap(), ReadOutcome::EndOfStream);
    }

    #[test]
    fn test_replay_error_carries_line_number() {
        let log = "(0.1) vcan0 1A0#5703\n(0.2) vcan0 garbage\n";
        let mut source = ReplaySource::from_reader(Cursor::new(log), "memory");

        assert!(matches!(source.read_frame().unwrap(), ReadOutcome::Frame(_)));
        match source.read_frame() {
            Err(DecoderError::ReplayParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_replay_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "(1697040000.000000) vcan0 1A0#5703").unwrap();
        file.flush().unwrap();

        let mut source = ReplaySource::open(file.path()).unwrap();
        assert!(matches!(source.read_frame().unwrap(), ReadOutcome::Frame(_)));
        assert_eq!(source.read_frame().unwrap(), ReadOutcome::EndOfStream);
    }

    #[test]
    fn test_replay_file_not_found() {
        assert!(ReplaySource::open(Path::new("nonexistent.log")).is_err());
    }
}
