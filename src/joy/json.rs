//! # JSON Lines Input
//!
//! Reads joystick samples and parameter updates from a line-oriented stream.
//!
//! ## Message Format
//!
//! One JSON object per line, tagged by `type`:
//!
//! ```text
//! {"type":"joy","axes":[0.0,0.8],"buttons":[0,0,0,0,0,1]}
//! {"type":"set_parameters","parameters":[{"name":"scale_linear.x","value":0.7}]}
//! ```
//!
//! Blank lines are skipped. Lines that fail to decode are logged and skipped
//! so one bad line never stops the stream.

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::JoySample;
use crate::error::Result;
use crate::params::{Parameter, ParameterStore};

/// One decoded line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// An input sample.
    Joy(JoySample),
    /// A parameter update batch.
    SetParameters { parameters: Vec<Parameter> },
}

/// Counters for one stream. `samples` counts samples delivered to the receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStats {
    pub samples: u64,
    pub parameter_batches: u64,
    pub rejected_batches: u64,
    pub malformed: u64,
}

/// Decodes one line. Returns `Ok(None)` for blank lines.
///
/// # Errors
///
/// Returns [`crate::error::TeleopError::Json`] if the line is not a valid message.
///
/// # Examples
///
/// ```
/// use teleop_twist::joy::json::{parse_line, InboundMessage};
///
/// let msg = parse_line(r#"{"type":"joy","axes":[0.5],"buttons":[1]}"#)?;
/// assert!(matches!(msg, Some(InboundMessage::Joy(_))));
/// assert!(parse_line("   ")?.is_none());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_line(line: &str) -> Result<Option<InboundMessage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Reads messages until end of input.
///
/// Samples are forwarded to `samples` in order; parameter batches are
/// applied to `store`. Returns early, without error, once the sample
/// receiver is gone.
///
/// # Errors
///
/// Returns an I/O error if reading from `reader` fails.
pub async fn read_messages<R>(
    reader: R,
    samples: mpsc::Sender<JoySample>,
    store: ParameterStore,
) -> Result<LineStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = LineStats::default();

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(InboundMessage::Joy(sample))) => {
                if samples.send(sample).await.is_err() {
                    debug!("Sample receiver closed, stopping input");
                    break;
                }
                stats.samples += 1;
            }
            Ok(Some(InboundMessage::SetParameters { parameters })) => {
                stats.parameter_batches += 1;
                if store.set_parameters(&parameters).is_err() {
                    stats.rejected_batches += 1;
                }
            }
            Err(e) => {
                stats.malformed += 1;
                warn!("Skipping malformed input line: {}", e);
            }
        }
    }

    Ok(stats)
}
