use resource_model::schema::audio::{MAX_VOLUME, MIN_VOLUME, MUTE, RESOURCE_TYPE, VOLUME};
use resource_model::{Representation, Result};
use std::sync::Arc;

use crate::device::AudioOutput;
use crate::handler::{int_in_range, ResourceHandler};

/// Output volume and mute control
pub struct AudioControlHandler {
    volume: i64,
    mute: bool,
    output: Arc<dyn AudioOutput>,
}

impl AudioControlHandler {
    pub fn new(volume: u8, output: Arc<dyn AudioOutput>) -> Self {
        Self {
            volume: (volume as i64).clamp(MIN_VOLUME, MAX_VOLUME),
            mute: false,
            output,
        }
    }

    pub fn volume(&self) -> i64 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }
}

impl ResourceHandler for AudioControlHandler {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn representation(&self) -> Representation {
        Representation::new()
            .with(VOLUME, self.volume)
            .with(MUTE, self.mute)
    }

    fn update(&mut self, fragment: &Representation) -> Result<()> {
        let volume = int_in_range(fragment, VOLUME, MIN_VOLUME..=MAX_VOLUME)?;
        let mute = fragment.get_bool(MUTE)?;

        if let Some(volume) = volume {
            self.output.set_volume(volume as u8)?;
        }
        if let Some(mute) = mute {
            self.output.set_mute(mute)?;
        }

        if let Some(volume) = volume {
            self.volume = volume;
        }
        if let Some(mute) = mute {
            self.mute = mute;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::RecordingDevice;
    use resource_model::ResourceError;

    #[test]
    fn test_volume_and_mute_applied_together() {
        let device = RecordingDevice::new();
        let mut handler = AudioControlHandler::new(20, device.clone());

        handler
            .update(&Representation::new().with(VOLUME, 35).with(MUTE, true))
            .unwrap();

        assert_eq!(handler.volume(), 35);
        assert!(handler.is_muted());
        assert_eq!(device.calls(), vec!["volume 35", "mute true"]);
    }

    #[test]
    fn test_bad_mute_rejects_valid_volume() {
        let device = RecordingDevice::new();
        let mut handler = AudioControlHandler::new(20, device.clone());

        let err = handler
            .update(&Representation::new().with(VOLUME, 35).with(MUTE, "yes"))
            .unwrap_err();

        assert!(matches!(err, ResourceError::Validation(_)));
        assert_eq!(handler.volume(), 20);
        assert!(device.calls().is_empty());
    }
}
