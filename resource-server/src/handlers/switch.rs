use resource_model::schema::binary_switch::{RESOURCE_TYPE, VALUE};
use resource_model::{Representation, Result};
use std::sync::Arc;

use crate::device::SwitchOutput;
use crate::handler::ResourceHandler;

/// On/off actuator such as a relay or an LED line
pub struct BinarySwitchHandler {
    on: bool,
    output: Arc<dyn SwitchOutput>,
}

impl BinarySwitchHandler {
    pub fn new(on: bool, output: Arc<dyn SwitchOutput>) -> Self {
        Self { on, output }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl ResourceHandler for BinarySwitchHandler {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn representation(&self) -> Representation {
        Representation::new().with(VALUE, self.on)
    }

    fn update(&mut self, fragment: &Representation) -> Result<()> {
        if let Some(on) = fragment.get_bool(VALUE)? {
            self.output.set_on(on)?;
            self.on = on;
        }
        Ok(())
    }
}
