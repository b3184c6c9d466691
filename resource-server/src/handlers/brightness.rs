use resource_model::schema::brightness::{BRIGHTNESS, MAX, MIN, RESOURCE_TYPE};
use resource_model::{Representation, Result};
use std::sync::Arc;

use crate::device::Backlight;
use crate::handler::{int_in_range, ReadMode, ResourceHandler};

/// Dimmable display backlight
///
/// Reads are deferred: the level is rendered on the worker pool and the
/// requester gets an in-progress acknowledgement first.
pub struct BrightnessHandler {
    level: i64,
    backlight: Arc<dyn Backlight>,
}

impl BrightnessHandler {
    pub fn new(initial: u8, backlight: Arc<dyn Backlight>) -> Self {
        Self {
            level: (initial as i64).clamp(MIN, MAX),
            backlight,
        }
    }

    pub fn level(&self) -> i64 {
        self.level
    }
}

impl ResourceHandler for BrightnessHandler {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn read_mode(&self) -> ReadMode {
        ReadMode::Deferred
    }

    fn representation(&self) -> Representation {
        Representation::new().with(BRIGHTNESS, self.level)
    }

    fn update(&mut self, fragment: &Representation) -> Result<()> {
        if let Some(level) = int_in_range(fragment, BRIGHTNESS, MIN..=MAX)? {
            self.backlight.set_level(level as u8)?;
            tracing::debug!("Brightness changed: {} -> {}", self.level, level);
            self.level = level;
        }
        Ok(())
    }
}
