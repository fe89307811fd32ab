//! # Teleop Node
//!
//! Runs the controller over a stream of samples.
//!
//! Each sample is processed against the newest configuration snapshot and
//! any resulting command is published. A parameter update that lands
//! between two samples therefore takes effect from the second one.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::TeleopConfig;
use crate::error::Result;
use crate::joy::JoySample;
use crate::publish::CommandSink;
use crate::teleop::{Mode, TeleopController, Twist};

/// Number of published commands between status log messages.
pub const STATUS_INTERVAL: u64 = 1000;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub samples: u64,
    pub published: u64,
    pub publish_failures: u64,
}

/// Controller, configuration feed and command sink.
pub struct TeleopNode<S> {
    controller: TeleopController,
    config: watch::Receiver<Arc<TeleopConfig>>,
    sink: S,
    stats: NodeStats,
    last_status: u64,
}

impl<S: CommandSink> TeleopNode<S> {
    pub fn new(config: watch::Receiver<Arc<TeleopConfig>>, sink: S) -> Self {
        Self {
            controller: TeleopController::new(),
            config,
            sink,
            stats: NodeStats::default(),
            last_status: 0,
        }
    }

    pub fn controller(&self) -> &TeleopController {
        &self.controller
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    /// Processes one sample and publishes the command, if any.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if publishing fails. The controller state
    /// has already advanced by then, except that an undelivered stop
    /// command is produced again on the next disabled sample.
    pub async fn handle_sample(&mut self, sample: &JoySample) -> Result<Option<Twist>> {
        if self.config.has_changed().unwrap_or(false) {
            debug!("Using updated configuration");
        }
        let config = Arc::clone(&self.config.borrow_and_update());

        self.stats.samples += 1;
        let Some(twist) = self.controller.process(sample, &config) else {
            return Ok(None);
        };

        if let Err(e) = self.sink.publish(&twist).await {
            if self.controller.mode() == Mode::Disabled && twist.is_zero() {
                debug!("Stop command not delivered, will resend");
                self.controller.rearm_stop();
            }
            return Err(e);
        }
        self.stats.published += 1;

        if self.stats.published - self.last_status >= STATUS_INTERVAL {
            info!(
                "Published {} commands from {} samples (mode: {})",
                self.stats.published,
                self.stats.samples,
                self.controller.mode()
            );
            self.last_status = self.stats.published;
        }

        Ok(Some(twist))
    }

    /// Consumes samples until every sender is gone.
    ///
    /// Publish failures are logged and counted; the loop keeps going.
    pub async fn run(mut self, mut samples: mpsc::Receiver<JoySample>) -> NodeStats {
        info!("Teleop node running");

        while let Some(sample) = samples.recv().await {
            if let Err(e) = self.handle_sample(&sample).await {
                self.stats.publish_failures += 1;
                warn!("Failed to publish command: {}", e);
            }
        }

        info!(
            "Input closed: {} samples, {} commands published",
            self.stats.samples, self.stats.published
        );
        self.stats
    }
}
