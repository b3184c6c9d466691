//! Local model of a remote media player
//!
//! The player learns its valid state names from the first representation
//! that carries `mediaStates`; later lists are ignored. Until then every
//! `state` is rejected. A state name maps to [`PlayerState`] by its position
//! in that list, and only the first three positions have a local meaning.
//!
//! `title`, `playList` and `select` update whenever present, independent of
//! whether `state` was accepted.

use resource_model::schema::media_player::{MEDIA_STATES, PLAY_LIST, SELECT, STATE, TITLE};
use resource_model::{PlayerState, Representation, ResourceError, Result, Value};

use crate::reconciler::{Reconciled, Rejection, StateMachine};
use crate::sink::StateSink;

#[derive(Debug, Clone, Default)]
pub struct PlayerMachine {
    valid_states: Option<Vec<String>>,
    state: PlayerState,
    title: Option<String>,
    playlist: Option<Vec<String>>,
    selected: Option<i64>,
}

impl PlayerMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn valid_states(&self) -> Option<&[String]> {
        self.valid_states.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn playlist(&self) -> Option<&[String]> {
        self.playlist.as_deref()
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    /// Fragment asking the resource to enter `target`
    ///
    /// Uses the resource's own name for the state, so it fails until the
    /// valid states are known.
    pub fn request_for(&self, target: PlayerState) -> Result<Representation> {
        let names = self.valid_states.as_ref().ok_or_else(|| {
            ResourceError::Validation("valid player states are not known yet".to_string())
        })?;
        let name = names.get(target.ordinal()).ok_or_else(|| {
            ResourceError::Validation(format!("resource has no name for {}", target))
        })?;
        Ok(Representation::new().with(STATE, name.clone()))
    }

    /// Playing pauses; anything else plays
    pub fn toggle_target(&self) -> PlayerState {
        match self.state {
            PlayerState::Playing => PlayerState::Paused,
            PlayerState::Idle | PlayerState::Paused => PlayerState::Playing,
        }
    }

    pub fn select_request(&self, index: usize) -> Result<Representation> {
        if let Some(playlist) = &self.playlist {
            if index >= playlist.len() {
                return Err(ResourceError::Validation(format!(
                    "track {} outside playlist of {}",
                    index,
                    playlist.len()
                )));
            }
        }
        Ok(Representation::new().with(SELECT, index as i64))
    }

    fn learn_states(&mut self, rep: &Representation) {
        match rep.get(MEDIA_STATES) {
            None => {}
            Some(Value::StrList(list)) => {
                if let Some(known) = &self.valid_states {
                    if known != list {
                        tracing::debug!("Ignoring later player states {:?}; keeping {:?}", list, known);
                    }
                } else {
                    tracing::debug!("Learned player states {:?}", list);
                    self.valid_states = Some(list.clone());
                }
            }
            Some(other) => {
                tracing::warn!("Ignoring {} of type {}", MEDIA_STATES, other.type_name());
            }
        }
    }

    fn apply_auxiliary(&mut self, rep: &Representation, sink: &dyn StateSink<PlayerState>) {
        if let Some(value) = rep.get(TITLE) {
            match value {
                Value::Str(title) => {
                    if self.title.as_deref() != Some(title.as_str()) {
                        self.title = Some(title.clone());
                        sink.on_attribute_applied(TITLE, value);
                    }
                }
                other => tracing::warn!("Ignoring {} of type {}", TITLE, other.type_name()),
            }
        }

        if let Some(value) = rep.get(PLAY_LIST) {
            match value {
                Value::StrList(list) => {
                    if self.playlist.as_ref() != Some(list) {
                        self.playlist = Some(list.clone());
                        sink.on_attribute_applied(PLAY_LIST, value);
                    }
                }
                other => tracing::warn!("Ignoring {} of type {}", PLAY_LIST, other.type_name()),
            }
        }

        if let Some(value) = rep.get(SELECT) {
            match value {
                Value::Int(index) => {
                    if self.selected != Some(*index) {
                        self.selected = Some(*index);
                        sink.on_attribute_applied(SELECT, value);
                    }
                }
                other => tracing::warn!("Ignoring {} of type {}", SELECT, other.type_name()),
            }
        }
    }

    fn resolve_state(&self, value: &Value) -> std::result::Result<PlayerState, Rejection> {
        let name = value
            .as_str()
            .ok_or_else(|| Rejection::WrongType(STATE.to_string()))?;
        let names = self.valid_states.as_ref().ok_or(Rejection::StatesUnknown)?;
        let index = names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Rejection::UnknownState(name.to_string()))?;
        PlayerState::from_ordinal(index).ok_or_else(|| Rejection::UnmappedState(name.to_string()))
    }
}

impl StateMachine for PlayerMachine {
    type State = PlayerState;

    fn current(&self) -> PlayerState {
        self.state
    }

    fn apply(&mut self, rep: &Representation, sink: &dyn StateSink<PlayerState>) -> Reconciled {
        self.learn_states(rep);
        self.apply_auxiliary(rep, sink);

        let Some(value) = rep.get(STATE) else {
            return Reconciled::Applied {
                state_changed: false,
            };
        };

        match self.resolve_state(value) {
            Ok(state) => {
                let state_changed = state != self.state;
                self.state = state;
                let title = match state {
                    PlayerState::Playing => self.title.as_deref(),
                    _ => None,
                };
                sink.on_state_applied(state, title);
                Reconciled::Applied { state_changed }
            }
            Err(rejection) => Reconciled::Rejected(rejection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ChannelSink, NoopSink, SinkEvent};
    use rstest::rstest;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn with_states(list: &[&str]) -> Representation {
        Representation::new().with(MEDIA_STATES, names(list))
    }

    fn learned() -> PlayerMachine {
        let mut machine = PlayerMachine::new();
        machine.apply(&with_states(&["Idle", "Playing", "Paused"]), &NoopSink);
        machine
    }

    #[test]
    fn test_state_before_valid_states_is_rejected() {
        let mut machine = PlayerMachine::new();
        let outcome = machine.apply(&Representation::new().with(STATE, "Playing"), &NoopSink);
        assert_eq!(outcome, Reconciled::Rejected(Rejection::StatesUnknown));
        assert_eq!(machine.state(), PlayerState::Idle);
    }

    #[test]
    fn test_states_and_state_in_one_representation() {
        let mut machine = PlayerMachine::new();
        let rep = with_states(&["Idle", "Playing", "Paused"]).with(STATE, "Paused");

        let outcome = machine.apply(&rep, &NoopSink);

        assert_eq!(outcome, Reconciled::Applied { state_changed: true });
        assert_eq!(machine.state(), PlayerState::Paused);
    }

    #[test]
    fn test_first_states_list_wins() {
        let mut machine = learned();
        machine.apply(&with_states(&["Stopped", "Running", "Held"]), &NoopSink);

        let outcome = machine.apply(&Representation::new().with(STATE, "Running"), &NoopSink);

        assert!(matches!(outcome, Reconciled::Rejected(Rejection::UnknownState(_))));
        assert_eq!(machine.valid_states().unwrap()[0], "Idle");
    }

    #[rstest]
    #[case("Bogus", Rejection::UnknownState("Bogus".to_string()))]
    #[case("Buffering", Rejection::UnmappedState("Buffering".to_string()))]
    fn test_invalid_state_keeps_current(#[case] name: &str, #[case] expected: Rejection) {
        let mut machine = PlayerMachine::new();
        machine.apply(
            &with_states(&["Idle", "Playing", "Paused", "Buffering"]).with(STATE, "Playing"),
            &NoopSink,
        );

        let outcome = machine.apply(&Representation::new().with(STATE, name), &NoopSink);

        assert_eq!(outcome, Reconciled::Rejected(expected));
        assert_eq!(machine.state(), PlayerState::Playing);
    }

    #[test]
    fn test_non_string_state_is_rejected() {
        let mut machine = learned();
        let outcome = machine.apply(&Representation::new().with(STATE, 1), &NoopSink);
        assert_eq!(outcome, Reconciled::Rejected(Rejection::WrongType(STATE.to_string())));
    }

    #[test]
    fn test_auxiliary_fields_apply_independently() {
        let mut machine = learned();
        let rep = Representation::new()
            .with(TITLE, "Song")
            .with(PLAY_LIST, names(&["Song", "Other"]))
            .with(STATE, "Bogus");

        machine.apply(&rep, &NoopSink);
        machine.apply(&Representation::new(), &NoopSink);

        assert_eq!(machine.title(), Some("Song"));
        assert_eq!(machine.playlist().unwrap().len(), 2);
        assert_eq!(machine.state(), PlayerState::Idle);
    }

    #[test]
    fn test_sink_sees_title_only_while_playing() {
        let (sink, events) = ChannelSink::<PlayerState>::new();
        let mut machine = learned();

        machine.apply(
            &Representation::new().with(TITLE, "Song").with(STATE, "Playing"),
            &sink,
        );
        machine.apply(&Representation::new().with(STATE, "Paused"), &sink);

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                SinkEvent::Attribute {
                    name: TITLE.to_string(),
                    value: Value::from("Song"),
                },
                SinkEvent::State {
                    state: PlayerState::Playing,
                    title: Some("Song".to_string()),
                },
                SinkEvent::State {
                    state: PlayerState::Paused,
                    title: None,
                },
            ]
        );
    }

    #[rstest]
    #[case(PlayerState::Idle, PlayerState::Playing)]
    #[case(PlayerState::Playing, PlayerState::Paused)]
    #[case(PlayerState::Paused, PlayerState::Playing)]
    fn test_toggle_target(#[case] from: PlayerState, #[case] to: PlayerState) {
        let mut machine = learned();
        machine.state = from;
        assert_eq!(machine.toggle_target(), to);
    }

    #[test]
    fn test_request_uses_resource_names() {
        let mut machine = PlayerMachine::new();
        assert!(machine.request_for(PlayerState::Playing).is_err());

        machine.apply(&with_states(&["Stopped", "Running", "Held"]), &NoopSink);
        let fragment = machine.request_for(PlayerState::Playing).unwrap();

        assert_eq!(fragment.get_str(STATE).unwrap(), Some("Running"));
    }

    #[test]
    fn test_select_request_checks_known_playlist() {
        let mut machine = learned();
        assert!(machine.select_request(5).is_ok());

        machine.apply(&Representation::new().with(PLAY_LIST, names(&["a"])), &NoopSink);
        assert!(machine.select_request(5).is_err());
        assert_eq!(
            machine.select_request(0).unwrap().get_int(SELECT).unwrap(),
            Some(0)
        );
    }
}
