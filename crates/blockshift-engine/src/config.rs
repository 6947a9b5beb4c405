use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DragConfigError {
    #[error("activation threshold must be a finite, non-negative distance (got {0})")]
    InvalidThreshold(f64),

    #[error("preview opacity must be between 0 and 1 (got {0})")]
    InvalidOpacity(f32),
}

/// Tunables for the block drag gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Pointer travel (device-independent pixels) before an armed grip starts dragging
    pub activation_threshold: f64,
    /// Horizontal distance from the grip's right edge to the point probed for the block
    pub grip_probe_offset: f64,
    pub preview_opacity: f32,
    pub indicator_thickness: f64,
    /// Presentation class marking the selected node; stripped from preview clones
    pub selected_class: String,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 8.0,
            grip_probe_offset: 50.0,
            preview_opacity: 0.5,
            indicator_thickness: 2.0,
            selected_class: "is-selected".to_string(),
        }
    }
}

impl DragConfig {
    pub fn validate(&self) -> Result<(), DragConfigError> {
        if !self.activation_threshold.is_finite() || self.activation_threshold < 0.0 {
            return Err(DragConfigError::InvalidThreshold(self.activation_threshold));
        }
        if !(0.0..=1.0).contains(&self.preview_opacity) {
            return Err(DragConfigError::InvalidOpacity(self.preview_opacity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = DragConfig::default();
        assert_eq!(config.activation_threshold, 8.0);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_threshold_rejected(#[case] threshold: f64) {
        let config = DragConfig {
            activation_threshold: threshold,
            ..DragConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DragConfigError::InvalidThreshold(_))
        ));
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    fn test_invalid_opacity_rejected(#[case] opacity: f32) {
        let config = DragConfig {
            preview_opacity: opacity,
            ..DragConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(DragConfigError::InvalidOpacity(opacity))
        );
    }
}
