//! Physical collaborators driven by resource handlers
//!
//! Handlers never touch hardware directly. They validate a request, call the
//! matching device trait, and only commit the new state when the device call
//! succeeds.

use resource_model::ResourceError;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a device collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    #[error("Device rejected command: {0}")]
    Rejected(String),
}

impl From<DeviceError> for ResourceError {
    fn from(err: DeviceError) -> Self {
        ResourceError::Internal(err.to_string())
    }
}

/// Display backlight
pub trait Backlight: Send + Sync {
    fn set_level(&self, level: u8) -> Result<(), DeviceError>;
}

/// Audio track playback
pub trait PlayerDevice: Send + Sync {
    /// Start playing `track` from the beginning
    fn play(&self, track: Option<&str>) -> Result<(), DeviceError>;
    fn pause(&self) -> Result<(), DeviceError>;
    fn resume(&self) -> Result<(), DeviceError>;
    fn stop(&self) -> Result<(), DeviceError>;
}

/// Output volume and mute
pub trait AudioOutput: Send + Sync {
    fn set_volume(&self, volume: u8) -> Result<(), DeviceError>;
    fn set_mute(&self, mute: bool) -> Result<(), DeviceError>;
}

/// A single on/off output line
pub trait SwitchOutput: Send + Sync {
    fn set_on(&self, on: bool) -> Result<(), DeviceError>;
}

/// Device that accepts every command and does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl NullDevice {
    pub fn shared() -> Arc<Self> {
        Arc::new(NullDevice)
    }
}

impl Backlight for NullDevice {
    fn set_level(&self, _level: u8) -> Result<(), DeviceError> {
        Ok(())
    }
}

impl PlayerDevice for NullDevice {
    fn play(&self, _track: Option<&str>) -> Result<(), DeviceError> {
        Ok(())
    }

    fn pause(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn resume(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn stop(&self) -> Result<(), DeviceError> {
        Ok(())
    }
}

impl AudioOutput for NullDevice {
    fn set_volume(&self, _volume: u8) -> Result<(), DeviceError> {
        Ok(())
    }

    fn set_mute(&self, _mute: bool) -> Result<(), DeviceError> {
        Ok(())
    }
}

impl SwitchOutput for NullDevice {
    fn set_on(&self, _on: bool) -> Result<(), DeviceError> {
        Ok(())
    }
}
