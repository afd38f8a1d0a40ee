//! Opaque-stdout fallback for suites the registry does not recognize.
//!
//! Grounded on `adamtc007-ob-poc`'s `base64` usage for capturing raw
//! payload bodies verbatim: spec §9 requires that adding a new benchmark
//! never be blocked on writing its parser first, so any unrecognized suite
//! name still produces a usable record — the stdout is captured as-is and
//! aggregation is skipped (spec §4.5, §9 "Opaque-stdout fallback").

use base64::Engine;

/// Bound on how much raw stdout is retained, to keep `results.json` from
/// growing unboundedly on a chatty or runaway benchmark process.
const MAX_CAPTURED_BYTES: usize = 64 * 1024;

/// Base64-encode `stdout`, truncated to [`MAX_CAPTURED_BYTES`] bytes.
pub fn capture(stdout: &str) -> String {
    let bytes = stdout.as_bytes();
    let truncated = &bytes[..bytes.len().min(MAX_CAPTURED_BYTES)];
    base64::engine::general_purpose::STANDARD.encode(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_output() {
        let encoded = capture("hello benchmark");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"hello benchmark");
    }

    #[test]
    fn truncates_output_past_the_capture_bound() {
        let huge = "x".repeat(MAX_CAPTURED_BYTES * 2);
        let encoded = capture(&huge);
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded.len(), MAX_CAPTURED_BYTES);
    }
}
