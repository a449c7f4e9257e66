//! Result protocol: sentinel-framed JSON on the child's stdout
//!
//! The wrapper prints the marker line, one JSON payload line, and the marker
//! line again, after everything the snippet itself printed. The decoder
//! splits the captured stream back into user text and the structured frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::result::ExecutionResult;
use crate::runner::RawProcessOutput;
use crate::{BreakwaterError, Result};

/// Sentinel marker line separating user output from the result payload.
pub const RESULT_MARKER: &str = "<<breakwater:result>>";

/// The machine-readable payload the wrapper emits between the markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultFrame {
    pub success: bool,
    #[serde(default)]
    pub output: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Decode a finished child's streams into an [`ExecutionResult`].
///
/// A malformed frame is a typed [`BreakwaterError::Protocol`] error, never a
/// panic. When the markers are absent entirely the exit code decides: zero
/// means success with the whole stream as user stdout, non-zero means failure
/// with stderr (or stdout when stderr is empty) as the message. The returned
/// result's `duration` is zero; the orchestrator stamps it.
///
/// A snippet whose last print omits the trailing newline glues the first
/// marker onto its own line; the marker is matched as a line suffix and the
/// prefix stays part of user stdout.
pub fn decode(raw: &RawProcessOutput) -> Result<ExecutionResult> {
    let lines: Vec<&str> = raw.stdout.lines().collect();
    let markers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| line.ends_with(RESULT_MARKER).then_some(idx))
        .collect();

    match markers.as_slice() {
        [] => Ok(decode_unframed(raw)),
        [_] => Err(BreakwaterError::Protocol(
            "result frame is not closed: found one sentinel marker, expected two".to_string(),
        )),
        [first, second, ..] => {
            let mut user_stdout = join_lines(&lines[..*first]);
            let marker_line = lines[*first];
            user_stdout.push_str(&marker_line[..marker_line.len() - RESULT_MARKER.len()]);
            let payload: Vec<&str> = lines[first + 1..*second]
                .iter()
                .copied()
                .filter(|line| !line.trim().is_empty())
                .collect();

            let [line] = payload.as_slice() else {
                return Err(BreakwaterError::Protocol(format!(
                    "expected exactly one payload line between markers, found {}",
                    payload.len()
                )));
            };

            let frame: ResultFrame = serde_json::from_str(line).map_err(|err| {
                BreakwaterError::Protocol(format!("malformed result payload: {err}"))
            })?;

            Ok(ExecutionResult {
                success: frame.success,
                output: frame.output,
                error: frame.error,
                stdout: user_stdout,
                duration: Duration::ZERO,
            })
        }
    }
}

fn decode_unframed(raw: &RawProcessOutput) -> ExecutionResult {
    if raw.exit_code == 0 {
        ExecutionResult::ok(None, raw.stdout.clone(), Duration::ZERO)
    } else {
        let message = if raw.stderr.trim().is_empty() {
            raw.stdout.clone()
        } else {
            raw.stderr.clone()
        };
        ExecutionResult::failed(
            format!("process exited with code {}: {message}", raw.exit_code),
            raw.stdout.clone(),
            Duration::ZERO,
        )
    }
}

fn join_lines(lines: &[&str]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(stdout: &str, stderr: &str, exit_code: i32) -> RawProcessOutput {
        RawProcessOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    #[test]
    fn decodes_framed_result_and_user_stdout() {
        let stdout = format!(
            "hello\nworld\n{RESULT_MARKER}\n{}\n{RESULT_MARKER}\n",
            json!({"success": true, "output": 42, "error": null})
        );
        let result = decode(&raw(&stdout, "", 0)).unwrap();

        assert!(result.success);
        assert_eq!(result.output, Some(json!(42)));
        assert_eq!(result.stdout, "hello\nworld\n");
        assert_eq!(result.error, None);
    }

    #[test]
    fn marker_glued_to_an_unterminated_user_line_still_decodes() {
        // print('hi', end='') leaves the stream mid-line when the wrapper
        // emits the first marker.
        let stdout = format!(
            "hi{RESULT_MARKER}\n{}\n{RESULT_MARKER}\n",
            json!({"success": true, "output": 1, "error": null})
        );
        let result = decode(&raw(&stdout, "", 0)).unwrap();

        assert!(result.success);
        assert_eq!(result.output, Some(json!(1)));
        assert_eq!(result.stdout, "hi");
    }

    #[test]
    fn decodes_failure_frame() {
        let stdout = format!(
            "{RESULT_MARKER}\n{}\n{RESULT_MARKER}\n",
            json!({"success": false, "output": null, "error": "Trace: boom"})
        );
        let result = decode(&raw(&stdout, "", 0)).unwrap();

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Trace: boom"));
        assert_eq!(result.stdout, "");
    }

    #[test]
    fn garbage_between_markers_is_a_protocol_error() {
        let stdout = format!("{RESULT_MARKER}\nnot json at all\n{RESULT_MARKER}\n");
        let err = decode(&raw(&stdout, "", 0)).unwrap_err();
        assert!(matches!(err, BreakwaterError::Protocol(_)), "{err}");
    }

    #[test]
    fn multiple_payload_lines_are_a_protocol_error() {
        let stdout = format!("{RESULT_MARKER}\n{{}}\n{{}}\n{RESULT_MARKER}\n");
        let err = decode(&raw(&stdout, "", 0)).unwrap_err();
        assert!(matches!(err, BreakwaterError::Protocol(_)), "{err}");
    }

    #[test]
    fn unclosed_frame_is_a_protocol_error() {
        let stdout = format!("output text\n{RESULT_MARKER}\n");
        let err = decode(&raw(&stdout, "", 0)).unwrap_err();
        assert!(matches!(err, BreakwaterError::Protocol(_)), "{err}");
    }

    #[test]
    fn missing_markers_with_zero_exit_is_success() {
        let result = decode(&raw("just text\n", "", 0)).unwrap();
        assert!(result.success);
        assert_eq!(result.output, None);
        assert_eq!(result.stdout, "just text\n");
    }

    #[test]
    fn missing_markers_with_nonzero_exit_uses_stderr() {
        let result = decode(&raw("partial\n", "SyntaxError: oops\n", 1)).unwrap();
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("SyntaxError"));
    }

    #[test]
    fn missing_markers_with_nonzero_exit_falls_back_to_stdout() {
        let result = decode(&raw("the only clue\n", "  \n", 2)).unwrap();
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("the only clue"));
    }
}
