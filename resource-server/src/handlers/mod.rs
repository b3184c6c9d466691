//! Concrete resource handlers and the tagged variant that dispatches to them

mod audio;
mod brightness;
mod media_player;
mod switch;

pub use audio::AudioControlHandler;
pub use brightness::BrightnessHandler;
pub use media_player::MediaPlayerHandler;
pub use switch::BinarySwitchHandler;

use resource_model::{Representation, Result};

use crate::handler::{ReadMode, ResourceHandler};

/// Every handler a platform can host, keyed by resource type
pub enum ResourceKind {
    Brightness(BrightnessHandler),
    MediaPlayer(MediaPlayerHandler),
    AudioControl(AudioControlHandler),
    BinarySwitch(BinarySwitchHandler),
}

impl ResourceKind {
    fn inner(&self) -> &dyn ResourceHandler {
        match self {
            ResourceKind::Brightness(h) => h,
            ResourceKind::MediaPlayer(h) => h,
            ResourceKind::AudioControl(h) => h,
            ResourceKind::BinarySwitch(h) => h,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ResourceHandler {
        match self {
            ResourceKind::Brightness(h) => h,
            ResourceKind::MediaPlayer(h) => h,
            ResourceKind::AudioControl(h) => h,
            ResourceKind::BinarySwitch(h) => h,
        }
    }

    pub fn as_media_player_mut(&mut self) -> Option<&mut MediaPlayerHandler> {
        match self {
            ResourceKind::MediaPlayer(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_brightness_mut(&mut self) -> Option<&mut BrightnessHandler> {
        match self {
            ResourceKind::Brightness(h) => Some(h),
            _ => None,
        }
    }
}

impl ResourceHandler for ResourceKind {
    fn resource_type(&self) -> &'static str {
        self.inner().resource_type()
    }

    fn read_mode(&self) -> ReadMode {
        self.inner().read_mode()
    }

    fn representation(&self) -> Representation {
        self.inner().representation()
    }

    fn update(&mut self, fragment: &Representation) -> Result<()> {
        self.inner_mut().update(fragment)
    }
}

impl From<BrightnessHandler> for ResourceKind {
    fn from(h: BrightnessHandler) -> Self {
        ResourceKind::Brightness(h)
    }
}

impl From<MediaPlayerHandler> for ResourceKind {
    fn from(h: MediaPlayerHandler) -> Self {
        ResourceKind::MediaPlayer(h)
    }
}

impl From<AudioControlHandler> for ResourceKind {
    fn from(h: AudioControlHandler) -> Self {
        ResourceKind::AudioControl(h)
    }
}

impl From<BinarySwitchHandler> for ResourceKind {
    fn from(h: BinarySwitchHandler) -> Self {
        ResourceKind::BinarySwitch(h)
    }
}
