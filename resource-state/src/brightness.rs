use resource_model::schema::brightness::{BRIGHTNESS, MAX, MIN};
use resource_model::{Representation, ResourceError, Result};

use crate::reconciler::{Reconciled, Rejection, StateMachine};
use crate::sink::StateSink;

/// Local mirror of a remote light level
#[derive(Debug, Clone, Default)]
pub struct BrightnessMachine {
    level: i64,
}

impl BrightnessMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> i64 {
        self.level
    }

    /// Fragment asking the resource for `level`
    pub fn request_for(level: i64) -> Result<Representation> {
        if !(MIN..=MAX).contains(&level) {
            return Err(ResourceError::Validation(format!(
                "brightness {} outside {}..={}",
                level, MIN, MAX
            )));
        }
        Ok(Representation::new().with(BRIGHTNESS, level))
    }
}

impl StateMachine for BrightnessMachine {
    type State = i64;

    fn current(&self) -> i64 {
        self.level
    }

    fn apply(&mut self, rep: &Representation, sink: &dyn StateSink<i64>) -> Reconciled {
        let level = match rep.get_int(BRIGHTNESS) {
            Ok(Some(level)) => level,
            Ok(None) => return Reconciled::Applied { state_changed: false },
            Err(_) => return Reconciled::Rejected(Rejection::WrongType(BRIGHTNESS.to_string())),
        };

        if !(MIN..=MAX).contains(&level) {
            return Reconciled::Rejected(Rejection::OutOfRange {
                name: BRIGHTNESS.to_string(),
                value: level,
            });
        }

        let state_changed = level != self.level;
        self.level = level;
        sink.on_state_applied(level, None);
        Reconciled::Applied { state_changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NoopSink;
    use rstest::rstest;

    #[rstest]
    #[case(0, true)]
    #[case(100, true)]
    #[case(-5, false)]
    #[case(250, false)]
    fn test_apply_checks_range(#[case] level: i64, #[case] accepted: bool) {
        let mut machine = BrightnessMachine::new();
        let outcome = machine.apply(&Representation::new().with(BRIGHTNESS, level), &NoopSink);
        assert_eq!(outcome.is_applied(), accepted);
        assert_eq!(machine.level(), if accepted { level } else { 0 });
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut machine = BrightnessMachine::new();
        let outcome = machine.apply(&Representation::new().with(BRIGHTNESS, "dim"), &NoopSink);
        assert!(matches!(outcome, Reconciled::Rejected(Rejection::WrongType(_))));
    }

    #[test]
    fn test_request_for_validates() {
        assert!(BrightnessMachine::request_for(50).is_ok());
        assert!(BrightnessMachine::request_for(101).is_err());
    }
}
