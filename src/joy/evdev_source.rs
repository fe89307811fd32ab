//! # Gamepad Input Module
//!
//! Reads a Linux gamepad through evdev and assembles [`JoySample`]s.
//!
//! ## Device Detection
//!
//! A device qualifies as a gamepad when it reports both:
//! - an `ABS_X` absolute axis
//! - a `BTN_SOUTH` key
//!
//! ## Sample Layout
//!
//! Sample indices follow the device's supported-code order. On a typical
//! pad that reports `ABS_X, ABS_Y, ABS_Z, ABS_RX, ABS_RY, ABS_RZ, ABS_HAT0X,
//! ABS_HAT0Y`, axis index 0 is `ABS_X` and index 6 is the D-pad X hat.
//!
//! | Code range | Raw range | Normalized |
//! |------------|-----------|------------|
//! | Sticks and triggers | `axis_min..=axis_max` | -1.0 ..= 1.0 |
//! | `ABS_HAT0X..=ABS_HAT3Y` | -1 / 0 / 1 | -1.0 / 0.0 / 1.0 |
//!
//! Key values are reported as 0 (released) or 1 (pressed or autorepeat).
//! A sample is emitted on every `SYN_REPORT`.
//!
//! ## Usage
//!
//! ```no_run
//! use teleop_twist::config::InputConfig;
//! use teleop_twist::joy::evdev_source::{GamepadDevice, SampleAssembler};
//!
//! let mut device = GamepadDevice::open(None)?;
//! let mut assembler = SampleAssembler::for_device(&device, &InputConfig::default());
//!
//! loop {
//!     for event in device.fetch_events()? {
//!         if let Some(sample) = assembler.process_event(&event) {
//!             println!("{:?}", sample);
//!         }
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind, Key, Synchronization};
use std::path::Path;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::JoySample;
use crate::config::InputConfig;
use crate::error::{Result, TeleopError};

const INPUT_DIR: &str = "/dev/input";

/// Raw range of hat (D-pad) axes.
const HAT_MIN: i32 = -1;
const HAT_MAX: i32 = 1;

/// Open evdev gamepad.
pub struct GamepadDevice {
    device: Device,
    device_path: String,
}

impl std::fmt::Debug for GamepadDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadDevice")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl GamepadDevice {
    /// Opens `path`, or the first gamepad under `/dev/input` when `None`.
    ///
    /// Candidates are tried in sorted path order so the choice is stable
    /// when several pads are connected.
    ///
    /// # Errors
    ///
    /// - `Device`: the given path cannot be opened or is not a gamepad
    /// - `DeviceNotFound`: auto-detection found no gamepad
    pub fn open(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::open_path(Path::new(path)),
            None => Self::scan(Path::new(INPUT_DIR)),
        }
    }

    fn open_path(path: &Path) -> Result<Self> {
        let device = Device::open(path)
            .map_err(|e| TeleopError::Device(format!("Failed to open {}: {}", path.display(), e)))?;

        if !is_gamepad(&device) {
            return Err(TeleopError::Device(format!(
                "{} does not report ABS_X and BTN_SOUTH",
                path.display()
            )));
        }

        let device_path = path.to_string_lossy().to_string();
        info!("Opened gamepad at: {}", device_path);
        Ok(Self { device, device_path })
    }

    fn scan(input_dir: &Path) -> Result<Self> {
        if !input_dir.exists() {
            return Err(TeleopError::Device(format!(
                "{} directory not found",
                input_dir.display()
            )));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| {
                TeleopError::Device(format!("Failed to read {}: {}", input_dir.display(), e))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TeleopError::Device(format!("Failed to read directory entry: {}", e)))?;

        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with("event"));
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found gamepad at: {}", device_path);
                        return Ok(Self { device, device_path });
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TeleopError::DeviceNotFound)
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Supported absolute axes, in code order.
    pub fn axes(&self) -> Vec<AbsoluteAxisType> {
        self.device
            .supported_absolute_axes()
            .map(|axes| axes.iter().collect())
            .unwrap_or_default()
    }

    /// Supported keys, in code order.
    pub fn keys(&self) -> Vec<Key> {
        self.device
            .supported_keys()
            .map(|keys| keys.iter().collect())
            .unwrap_or_default()
    }

    /// Fetches pending events. Blocks until at least one is available.
    ///
    /// # Errors
    ///
    /// Returns `Device` if the read fails, e.g. after a disconnect.
    pub fn fetch_events(&mut self) -> Result<impl Iterator<Item = InputEvent> + '_> {
        self.device
            .fetch_events()
            .map_err(|e| TeleopError::Device(format!("Failed to fetch events: {}", e)))
    }
}

fn is_gamepad(device: &Device) -> bool {
    let has_stick = device
        .supported_absolute_axes()
        .is_some_and(|axes| axes.contains(AbsoluteAxisType::ABS_X));
    let has_button = device
        .supported_keys()
        .is_some_and(|keys| keys.contains(Key::BTN_SOUTH));
    has_stick && has_button
}

fn is_hat(axis: AbsoluteAxisType) -> bool {
    (AbsoluteAxisType::ABS_HAT0X.0..=AbsoluteAxisType::ABS_HAT3Y.0).contains(&axis.0)
}

/// Maps a raw value in `min..=max` onto -1.0..=1.0.
fn normalize(raw: i32, min: i32, max: i32) -> f64 {
    let span = f64::from(max) - f64::from(min);
    if span <= 0.0 {
        return 0.0;
    }
    let value = 2.0 * (f64::from(raw) - f64::from(min)) / span - 1.0;
    value.clamp(-1.0, 1.0)
}

/// Turns evdev events into [`JoySample`]s.
///
/// Holds the latest value of every axis and key; a `SYN_REPORT` emits a
/// copy of that state. Axes start at 0.0 and keys at 0.
#[derive(Debug, Clone)]
pub struct SampleAssembler {
    axes: Vec<AbsoluteAxisType>,
    keys: Vec<Key>,
    axis_min: i32,
    axis_max: i32,
    reversed: Vec<bool>,
    sample: JoySample,
}

impl SampleAssembler {
    #[must_use]
    pub fn new(axes: Vec<AbsoluteAxisType>, keys: Vec<Key>, input: &InputConfig) -> Self {
        let mut reversed = vec![false; axes.len()];
        for &index in &input.reverse_axes {
            match reversed.get_mut(index) {
                Some(flag) => *flag = true,
                None => warn!("Ignoring reverse_axes index {} (device has {} axes)", index, axes.len()),
            }
        }

        let sample = JoySample::new(vec![0.0; axes.len()], vec![0; keys.len()]);
        Self {
            axes,
            keys,
            axis_min: input.axis_min,
            axis_max: input.axis_max,
            reversed,
            sample,
        }
    }

    /// Builds an assembler for the device's own axis and key layout.
    #[must_use]
    pub fn for_device(device: &GamepadDevice, input: &InputConfig) -> Self {
        let assembler = Self::new(device.axes(), device.keys(), input);
        info!(
            "Gamepad layout: {} axes, {} buttons",
            assembler.axes.len(),
            assembler.keys.len()
        );
        assembler
    }

    /// Current state, as the next sample would report it.
    pub fn sample(&self) -> &JoySample {
        &self.sample
    }

    /// Applies one event. Returns a sample on `SYN_REPORT`.
    pub fn process_event(&mut self, event: &InputEvent) -> Option<JoySample> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                if let Some(index) = self.axes.iter().position(|a| *a == axis) {
                    self.sample.axes[index] = self.normalize_axis(index, axis, event.value());
                }
                None
            }
            InputEventKind::Key(key) => {
                if let Some(index) = self.keys.iter().position(|k| *k == key) {
                    self.sample.buttons[index] = i32::from(event.value() != 0);
                }
                None
            }
            InputEventKind::Synchronization(Synchronization::SYN_REPORT) => Some(self.sample.clone()),
            _ => None,
        }
    }

    fn normalize_axis(&self, index: usize, axis: AbsoluteAxisType, raw: i32) -> f64 {
        let value = if is_hat(axis) {
            normalize(raw, HAT_MIN, HAT_MAX)
        } else {
            normalize(raw, self.axis_min, self.axis_max)
        };
        if self.reversed[index] {
            -value
        } else {
            value
        }
    }
}

/// Reads the device on a dedicated thread and forwards samples to `samples`.
///
/// The thread ends when the receiver is dropped or the device fails.
///
/// # Errors
///
/// Returns an I/O error if the thread cannot be spawned.
pub fn spawn_reader(
    mut device: GamepadDevice,
    mut assembler: SampleAssembler,
    samples: mpsc::Sender<JoySample>,
) -> Result<thread::JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("gamepad-reader".to_string())
        .spawn(move || {
            let mut count: u64 = 0;
            let result = read_loop(&mut device, &mut assembler, &samples, &mut count);
            match result {
                Ok(()) => info!("Gamepad reader stopped after {} samples", count),
                Err(e) => warn!("Gamepad reader failed after {} samples: {}", count, e),
            }
        })?;
    Ok(handle)
}

fn read_loop(
    device: &mut GamepadDevice,
    assembler: &mut SampleAssembler,
    samples: &mpsc::Sender<JoySample>,
    count: &mut u64,
) -> Result<()> {
    loop {
        for event in device.fetch_events()? {
            if let Some(sample) = assembler.process_event(&event) {
                if samples.blocking_send(sample).is_err() {
                    debug!("Sample receiver closed, stopping gamepad reader");
                    return Ok(());
                }
                *count += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    fn make_axis_event(axis: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, axis.0, value)
    }

    fn make_key_event(key: Key, pressed: bool) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), if pressed { 1 } else { 0 })
    }

    fn make_sync_event() -> InputEvent {
        InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0)
    }

    fn assembler(input: &InputConfig) -> SampleAssembler {
        SampleAssembler::new(
            vec![
                AbsoluteAxisType::ABS_X,
                AbsoluteAxisType::ABS_Y,
                AbsoluteAxisType::ABS_HAT0X,
            ],
            vec![Key::BTN_SOUTH, Key::BTN_EAST, Key::BTN_TR],
            input,
        )
    }

    // ==================== Normalize Tests ====================

    #[test]
    fn test_normalize_endpoints() {
        assert_eq!(normalize(0, 0, 255), -1.0);
        assert_eq!(normalize(255, 0, 255), 1.0);
        assert_eq!(normalize(-1, -1, 1), -1.0);
        assert_eq!(normalize(0, -1, 1), 0.0);
        assert_eq!(normalize(1, -1, 1), 1.0);
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        assert_eq!(normalize(300, 0, 255), 1.0);
        assert_eq!(normalize(-20, 0, 255), -1.0);
    }

    #[test]
    fn test_normalize_empty_range() {
        assert_eq!(normalize(10, 5, 5), 0.0);
    }

    #[test]
    fn test_is_hat() {
        assert!(is_hat(AbsoluteAxisType::ABS_HAT0X));
        assert!(is_hat(AbsoluteAxisType::ABS_HAT3Y));
        assert!(!is_hat(AbsoluteAxisType::ABS_X));
        assert!(!is_hat(AbsoluteAxisType::ABS_RZ));
    }

    // ==================== Assembler Tests ====================

    #[test]
    fn test_initial_sample_is_neutral() {
        let assembler = assembler(&InputConfig::default());
        assert_eq!(assembler.sample().axes, vec![0.0, 0.0, 0.0]);
        assert_eq!(assembler.sample().buttons, vec![0, 0, 0]);
    }

    #[test]
    fn test_sample_emitted_on_sync_only() {
        let mut assembler = assembler(&InputConfig::default());

        assert!(assembler
            .process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 255))
            .is_none());
        assert!(assembler.process_event(&make_key_event(Key::BTN_TR, true)).is_none());

        let sample = assembler.process_event(&make_sync_event()).unwrap();
        assert_eq!(sample.axes, vec![1.0, 0.0, 0.0]);
        assert_eq!(sample.buttons, vec![0, 0, 1]);
    }

    #[test]
    fn test_state_persists_across_reports() {
        let mut assembler = assembler(&InputConfig::default());

        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_Y, 0));
        assembler.process_event(&make_sync_event());
        assembler.process_event(&make_key_event(Key::BTN_SOUTH, true));
        let sample = assembler.process_event(&make_sync_event()).unwrap();

        assert_eq!(sample.axes[1], -1.0);
        assert_eq!(sample.buttons[0], 1);
    }

    #[test]
    fn test_hat_uses_own_range() {
        let mut assembler = assembler(&InputConfig::default());

        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_HAT0X, -1));
        let sample = assembler.process_event(&make_sync_event()).unwrap();

        assert_eq!(sample.axes[2], -1.0);
    }

    #[test]
    fn test_custom_axis_range() {
        let input = InputConfig {
            axis_min: -32768,
            axis_max: 32767,
            ..InputConfig::default()
        };
        let mut assembler = assembler(&input);

        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 32767));
        let sample = assembler.process_event(&make_sync_event()).unwrap();

        assert_eq!(sample.axes[0], 1.0);
    }

    #[test]
    fn test_reverse_axes() {
        let input = InputConfig {
            reverse_axes: vec![1, 42],
            ..InputConfig::default()
        };
        let mut assembler = assembler(&input);

        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 255));
        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_Y, 255));
        let sample = assembler.process_event(&make_sync_event()).unwrap();

        assert_eq!(sample.axes[0], 1.0);
        assert_eq!(sample.axes[1], -1.0);
    }

    #[test]
    fn test_key_release_and_autorepeat() {
        let mut assembler = assembler(&InputConfig::default());

        assembler.process_event(&InputEvent::new(EventType::KEY, Key::BTN_EAST.code(), 2));
        assert_eq!(assembler.sample().buttons[1], 1);

        assembler.process_event(&make_key_event(Key::BTN_EAST, false));
        assert_eq!(assembler.sample().buttons[1], 0);
    }

    #[test]
    fn test_unknown_codes_ignored() {
        let mut assembler = assembler(&InputConfig::default());
        let before = assembler.sample().clone();

        assembler.process_event(&make_axis_event(AbsoluteAxisType::ABS_MISC, 100));
        assembler.process_event(&make_key_event(Key::BTN_MODE, true));

        assert_eq!(*assembler.sample(), before);
    }

    #[test]
    fn test_non_report_sync_ignored() {
        let mut assembler = assembler(&InputConfig::default());
        let event = InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_DROPPED.0, 0);
        assert!(assembler.process_event(&event).is_none());
    }

    // ==================== Device Tests ====================

    #[test]
    fn test_open_missing_path() {
        let result = GamepadDevice::open(Some("/nonexistent/event0"));
        assert!(matches!(result, Err(TeleopError::Device(_))));
    }

    #[test]
    fn test_scan_missing_directory() {
        let result = GamepadDevice::scan(Path::new("/nonexistent/input"));
        assert!(matches!(result, Err(TeleopError::Device(_))));
    }

    #[test]
    fn test_scan_directory_without_event_nodes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mouse0"), b"").unwrap();

        let result = GamepadDevice::scan(dir.path());
        assert!(matches!(result, Err(TeleopError::DeviceNotFound)));
    }
}
