//! Sequential line reader feeding the worker pool.

use std::io::BufRead;

use crossbeam_channel::Sender;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::ParseError;
use crate::parser::{MovementRecord, parse_movement};

/// Line counters collected while dispatching one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub lines_read: u64,
    pub dispatched: u64,
    pub rejected: u64,
}

/// A line the parser refused, with its 1-based position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line_number: u64,
    pub reason: ParseError,
}

/// Outcome of parsing an input without aggregating it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub lines_read: u64,
    pub valid: u64,
    pub rejected: Vec<RejectedLine>,
}

/// Reads `reader` line by line and pushes every parsed record to `movements`.
///
/// Malformed lines, including lines that are not valid UTF-8, are logged and
/// dropped. `movements` is consumed and dropped on return, which closes the
/// channel for the workers. An I/O error from the reader is logged and
/// treated as end of input.
pub fn dispatch<R: BufRead>(reader: R, movements: Sender<MovementRecord>) -> DispatchReport {
    let mut report = DispatchReport::default();

    for (line_number, parsed) in parsed_lines(reader) {
        report.lines_read += 1;

        match parsed {
            Ok(movement) => {
                // Blocks until a worker is free when the channel is unbuffered
                if movements.send(movement).is_err() {
                    error!(line_number, "All workers are gone, stopping dispatch");
                    break;
                }
                report.dispatched += 1;
            }
            Err(e) => {
                debug!(line_number, error = %e, "Dropping malformed line");
                report.rejected += 1;
            }
        }
    }

    drop(movements);

    info!(
        lines_read = report.lines_read,
        dispatched = report.dispatched,
        rejected = report.rejected,
        "Input exhausted, distribution channel closed"
    );
    report
}

/// Parses every line of `reader` and reports the ones that would be dropped.
pub fn check_lines<R: BufRead>(reader: R) -> CheckReport {
    let mut report = CheckReport::default();

    for (line_number, parsed) in parsed_lines(reader) {
        report.lines_read += 1;
        match parsed {
            Ok(_) => report.valid += 1,
            Err(reason) => {
                warn!(line_number, error = %reason, "Line would be dropped");
                report.rejected.push(RejectedLine {
                    line_number,
                    reason,
                });
            }
        }
    }

    report
}

fn parsed_lines<R: BufRead>(
    mut reader: R,
) -> impl Iterator<Item = (u64, Result<MovementRecord, ParseError>)> {
    let mut buf = Vec::new();
    let mut line_number = 0u64;

    std::iter::from_fn(move || {
        buf.clear();
        line_number += 1;

        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                // Invalid UTF-8 becomes U+FFFD and fails parsing like any other bad line
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                Some((line_number, parse_movement(line)))
            }
            Err(e) => {
                error!(line_number, error = %e, "Failed to read input, treating as end of input");
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, unbounded};
    use std::io::Cursor;
    use std::thread;

    const INPUT: &str = "[user:a] [type:x] [ammount:10]\n\
                         garbage line no colons\n\
                         [user:b] [type:x] [ammount:20]\n\
                         [user:c] [type:y] [ammount:nope]\n";

    #[test]
    fn test_dispatch_forwards_valid_lines_in_order() {
        let (tx, rx) = unbounded();
        let report = dispatch(Cursor::new(INPUT), tx);

        assert_eq!(
            report,
            DispatchReport {
                lines_read: 4,
                dispatched: 2,
                rejected: 2,
            }
        );

        let received: Vec<_> = rx.iter().map(|m| m.user).collect();
        assert_eq!(received, vec!["a", "b"]);
    }

    #[test]
    fn test_dispatch_closes_channel() {
        let (tx, rx) = unbounded::<MovementRecord>();
        dispatch(Cursor::new(""), tx);
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_dispatch_blocks_on_rendezvous_channel() {
        let (tx, rx) = bounded(0);
        let handle = thread::spawn(move || dispatch(Cursor::new(INPUT), tx));

        let first = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert_eq!(first.amount + second.amount, 30);

        let report = handle.join().unwrap();
        assert_eq!(report.dispatched, 2);
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_dispatch_stops_when_receivers_gone() {
        let (tx, rx) = bounded(0);
        drop(rx);
        let report = dispatch(Cursor::new(INPUT), tx);
        assert_eq!(report.dispatched, 0);
        assert_eq!(report.lines_read, 1);
    }

    #[test]
    fn test_invalid_utf8_line_is_dropped_and_reading_continues() {
        let mut bytes = b"[user:a] [type:x] [ammount:1]\n".to_vec();
        bytes.extend_from_slice(b"no\xFF\n");
        for amount in 2..=6 {
            bytes.extend_from_slice(format!("[user:b] [type:x] [ammount:{amount}]\n").as_bytes());
        }

        let (tx, rx) = unbounded();
        let report = dispatch(Cursor::new(bytes), tx);

        assert_eq!(
            report,
            DispatchReport {
                lines_read: 7,
                dispatched: 6,
                rejected: 1,
            }
        );
        assert_eq!(rx.iter().map(|m| m.amount).sum::<u64>(), 21);
    }

    #[test]
    fn test_invalid_utf8_inside_value_is_kept_lossy() {
        let bytes = b"[user:\xFFa] [type:x] [ammount:3]\r\n".to_vec();
        let (tx, rx) = unbounded();
        let report = dispatch(Cursor::new(bytes), tx);

        assert_eq!(report.dispatched, 1);
        let movement = rx.recv().unwrap();
        assert_eq!(movement.user, "\u{FFFD}a");
        assert_eq!(movement.amount, 3);
    }

    #[test]
    fn test_last_line_without_newline() {
        let (tx, rx) = unbounded();
        let report = dispatch(Cursor::new("[user:a] [type:x] [ammount:9]"), tx);
        assert_eq!(report.dispatched, 1);
        assert_eq!(rx.recv().unwrap().amount, 9);
    }

    struct FailingReader;

    impl std::io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk gone"))
        }
    }

    #[test]
    fn test_io_error_ends_input() {
        let (tx, rx) = unbounded();
        let report = dispatch(std::io::BufReader::new(FailingReader), tx);
        assert_eq!(report, DispatchReport::default());
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_check_lines_reports_rejections() {
        let report = check_lines(Cursor::new(INPUT));

        assert_eq!(report.lines_read, 4);
        assert_eq!(report.valid, 2);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].line_number, 2);
        assert!(matches!(
            report.rejected[0].reason,
            ParseError::MalformedRecord { .. }
        ));
        assert_eq!(report.rejected[1].line_number, 4);
        assert!(matches!(
            report.rejected[1].reason,
            ParseError::InvalidAmount { .. }
        ));
    }
}
