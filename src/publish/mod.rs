//! # Command Publishing Module
//!
//! Delivers velocity commands to whatever drives the robot.
//!
//! [`CommandSink`] is the seam the node publishes through. [`JsonLinesSink`]
//! writes one JSON object per command to any async writer:
//!
//! ```text
//! {"stamp":"2024-05-01T12:00:00.000000Z","linear":{"x":0.4,"y":0.0,"z":0.0},"angular":{"x":0.0,"y":0.0,"z":0.0}}
//! ```

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::teleop::Twist;

/// Destination for velocity commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandSink: Send {
    /// Publishes one command.
    async fn publish(&mut self, twist: &Twist) -> Result<()>;
}

#[derive(Serialize)]
struct CommandRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    stamp: Option<String>,
    #[serde(flatten)]
    twist: &'a Twist,
}

/// Writes commands as JSON lines, flushing after each one.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
    stamp: bool,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// `stamp` adds an RFC 3339 UTC timestamp to every record.
    pub fn new(writer: W, stamp: bool) -> Self {
        Self { writer, stamp }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn encode(&self, twist: &Twist) -> Result<Vec<u8>> {
        let record = CommandRecord {
            stamp: self
                .stamp
                .then(|| Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
            twist,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        Ok(line)
    }
}

#[async_trait]
impl<W> CommandSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(&mut self, twist: &Twist) -> Result<()> {
        let line = self.encode(twist)?;
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
