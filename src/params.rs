//! # Parameter Module
//!
//! Runtime updates of the `[teleop]` configuration.
//!
//! Updates arrive as batches of named [`Parameter`]s. A batch is checked for
//! value kinds first; one mismatch rejects the whole batch and nothing is
//! applied. Accepted batches replace the configuration snapshot held by the
//! [`ParameterStore`], so the controller always computes a sample against a
//! single consistent generation.
//!
//! ## Parameter names
//!
//! | Name | Kind |
//! |------|------|
//! | `require_enable_button` | boolean |
//! | `enable_button`, `enable_turbo_button`, `enable_autorun_button` | integer |
//! | `axis_linear.{x,y,z}` | integer |
//! | `axis_angular.{yaw,pitch,roll}` | integer |
//! | `axis_angular_adjustment.{yaw,pitch,roll}` | integer |
//! | `scale_linear[_turbo\|_autorun].{x,y,z}` | double |
//! | `scale_angular[_turbo\|_autorun].{yaw,pitch,roll}` | double |
//!
//! Names outside this table are ignored.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::TeleopConfig;
use crate::error::ParameterError;
use crate::teleop::axis::{Axis, AxisMap, ScaleMap};

/// Value carried by a parameter update.
///
/// In JSON, `1` is an [`ParameterValue::Integer`] and `1.0` a
/// [`ParameterValue::Double`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

/// Kind of value a known parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Bool,
    Integer,
    Double,
}

impl ParameterKind {
    fn describe(self) -> &'static str {
        match self {
            ParameterKind::Bool => "boolean",
            ParameterKind::Integer => "integer",
            ParameterKind::Double => "double",
        }
    }
}

/// One named parameter update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParameterValue,
}

impl Parameter {
    /// Creates a parameter update.
    pub fn new(name: impl Into<String>, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Target of a known parameter inside [`TeleopConfig`].
#[derive(Debug, Clone, Copy)]
enum Slot {
    RequireEnableButton,
    EnableButton,
    EnableTurboButton,
    EnableAutorunButton,
    AxisLinear(Axis),
    AxisAngular(Axis),
    AxisAngularAdjustment(Axis),
    ScaleLinear(Axis),
    ScaleLinearTurbo(Axis),
    ScaleLinearAutorun(Axis),
    ScaleAngular(Axis),
    ScaleAngularTurbo(Axis),
    ScaleAngularAutorun(Axis),
}

impl Slot {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "require_enable_button" => return Some(Slot::RequireEnableButton),
            "enable_button" => return Some(Slot::EnableButton),
            "enable_turbo_button" => return Some(Slot::EnableTurboButton),
            "enable_autorun_button" => return Some(Slot::EnableAutorunButton),
            _ => {}
        }

        let (group, key) = name.split_once('.')?;
        let axis = Axis::from_name(key)?;
        let linear = Axis::LINEAR.contains(&axis);

        let slot = match (group, linear) {
            ("axis_linear", true) => Slot::AxisLinear(axis),
            ("axis_angular", false) => Slot::AxisAngular(axis),
            ("axis_angular_adjustment", false) => Slot::AxisAngularAdjustment(axis),
            ("scale_linear", true) => Slot::ScaleLinear(axis),
            ("scale_linear_turbo", true) => Slot::ScaleLinearTurbo(axis),
            ("scale_linear_autorun", true) => Slot::ScaleLinearAutorun(axis),
            ("scale_angular", false) => Slot::ScaleAngular(axis),
            ("scale_angular_turbo", false) => Slot::ScaleAngularTurbo(axis),
            ("scale_angular_autorun", false) => Slot::ScaleAngularAutorun(axis),
            _ => return None,
        };
        Some(slot)
    }

    fn kind(self) -> ParameterKind {
        match self {
            Slot::RequireEnableButton => ParameterKind::Bool,
            Slot::EnableButton
            | Slot::EnableTurboButton
            | Slot::EnableAutorunButton
            | Slot::AxisLinear(_)
            | Slot::AxisAngular(_)
            | Slot::AxisAngularAdjustment(_) => ParameterKind::Integer,
            _ => ParameterKind::Double,
        }
    }
}

/// Returns the value kind `name` accepts, or `None` for unknown names.
///
/// ```
/// use teleop_twist::params::{parameter_kind, ParameterKind};
///
/// assert_eq!(parameter_kind("axis_angular.yaw"), Some(ParameterKind::Integer));
/// assert_eq!(parameter_kind("scale_linear_turbo.x"), Some(ParameterKind::Double));
/// assert_eq!(parameter_kind("axis_linear.yaw"), None);
/// ```
#[must_use]
pub fn parameter_kind(name: &str) -> Option<ParameterKind> {
    Slot::parse(name).map(Slot::kind)
}

impl TeleopConfig {
    /// Applies a batch of parameter updates.
    ///
    /// Every known parameter is kind-checked before anything is written, so
    /// a rejected batch leaves `self` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::TypeMismatch`] naming the first parameter
    /// whose value has the wrong kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use teleop_twist::config::TeleopConfig;
    /// use teleop_twist::params::{Parameter, ParameterValue};
    ///
    /// let mut config = TeleopConfig::default();
    /// let batch = [
    ///     Parameter::new("enable_button", ParameterValue::Integer(4)),
    ///     Parameter::new("scale_linear.x", ParameterValue::Integer(1)),
    /// ];
    ///
    /// assert!(config.apply_parameters(&batch).is_err());
    /// assert_eq!(config.enable_button, 5);
    /// ```
    pub fn apply_parameters(&mut self, parameters: &[Parameter]) -> Result<(), ParameterError> {
        let mut updates = Vec::with_capacity(parameters.len());

        for parameter in parameters {
            let Some(slot) = Slot::parse(&parameter.name) else {
                debug!("Ignoring unknown parameter '{}'", parameter.name);
                continue;
            };
            let kind = slot.kind();
            let accepted = matches!(
                (kind, &parameter.value),
                (ParameterKind::Bool, ParameterValue::Bool(_))
                    | (ParameterKind::Integer, ParameterValue::Integer(_))
                    | (ParameterKind::Double, ParameterValue::Double(_))
            );
            if !accepted {
                return Err(ParameterError::TypeMismatch {
                    name: parameter.name.clone(),
                    expected: kind.describe(),
                });
            }
            updates.push((slot, &parameter.value));
        }

        for (slot, value) in updates {
            self.assign(slot, value);
        }
        Ok(())
    }

    fn assign(&mut self, slot: Slot, value: &ParameterValue) {
        fn set_index(map: &mut AxisMap, axis: Axis, value: &ParameterValue) {
            if let ParameterValue::Integer(index) = value {
                map.insert(axis, *index);
            }
        }
        fn set_scale(map: &mut ScaleMap, axis: Axis, value: &ParameterValue) {
            if let ParameterValue::Double(scale) = value {
                map.insert(axis, *scale);
            }
        }

        match (slot, value) {
            (Slot::RequireEnableButton, ParameterValue::Bool(flag)) => self.require_enable_button = *flag,
            (Slot::EnableButton, ParameterValue::Integer(index)) => self.enable_button = *index,
            (Slot::EnableTurboButton, ParameterValue::Integer(index)) => self.enable_turbo_button = *index,
            (Slot::EnableAutorunButton, ParameterValue::Integer(index)) => self.enable_autorun_button = *index,
            (Slot::AxisLinear(axis), _) => set_index(&mut self.axis_linear, axis, value),
            (Slot::AxisAngular(axis), _) => set_index(&mut self.axis_angular, axis, value),
            (Slot::AxisAngularAdjustment(axis), _) => set_index(&mut self.axis_angular_adjustment, axis, value),
            (Slot::ScaleLinear(axis), _) => set_scale(&mut self.scale_linear, axis, value),
            (Slot::ScaleLinearTurbo(axis), _) => set_scale(&mut self.scale_linear_turbo, axis, value),
            (Slot::ScaleLinearAutorun(axis), _) => set_scale(&mut self.scale_linear_autorun, axis, value),
            (Slot::ScaleAngular(axis), _) => set_scale(&mut self.scale_angular, axis, value),
            (Slot::ScaleAngularTurbo(axis), _) => set_scale(&mut self.scale_angular_turbo, axis, value),
            (Slot::ScaleAngularAutorun(axis), _) => set_scale(&mut self.scale_angular_autorun, axis, value),
            _ => {}
        }
    }
}

/// Shared owner of the current [`TeleopConfig`] snapshot.
///
/// Cloning the store is cheap; all clones update the same snapshot.
/// Readers take an `Arc` per sample via [`ParameterStore::snapshot`] or a
/// [`watch::Receiver`] from [`ParameterStore::subscribe`].
#[derive(Debug, Clone)]
pub struct ParameterStore {
    tx: Arc<watch::Sender<Arc<TeleopConfig>>>,
}

impl ParameterStore {
    /// Creates a store holding `config`.
    #[must_use]
    pub fn new(config: TeleopConfig) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(config));
        Self { tx: Arc::new(tx) }
    }

    /// Returns the current configuration generation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TeleopConfig> {
        Arc::clone(&self.tx.borrow())
    }

    /// Returns a receiver that observes every accepted update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<TeleopConfig>> {
        self.tx.subscribe()
    }

    /// Validates and applies a parameter batch.
    ///
    /// The candidate is built and swapped in while holding the channel lock,
    /// so concurrent batches never overwrite each other.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason; the current snapshot is unchanged.
    pub fn set_parameters(&self, parameters: &[Parameter]) -> Result<(), ParameterError> {
        let mut outcome = Ok(());

        self.tx.send_if_modified(|current| {
            let mut candidate = TeleopConfig::clone(current);
            match candidate.apply_parameters(parameters) {
                Ok(()) => {
                    *current = Arc::new(candidate);
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });

        match &outcome {
            Ok(()) => info!("Applied {} parameter update(s)", parameters.len()),
            Err(e) => warn!("{}", e),
        }
        outcome
    }
}
