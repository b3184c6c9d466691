//! Playlist driven audio player resource
//!
//! Attributes:
//!
//! - `mediaStates`: the valid state names, ordered Idle, Playing, Paused (read-only)
//! - `state`: current state name; must be one of the first three `mediaStates`
//! - `title`: title of the selected track, empty when the playlist is empty (read-only)
//! - `playList`: track titles (read-only)
//! - `select`: index of the selected track
//!
//! Writing `state` drives the player device: entering Playing resumes a
//! paused track or starts the selected one, Playing to Paused pauses, and
//! entering Idle stops whatever is loaded. Writing the current state again
//! has no device effect but still counts as a committed change.

use resource_model::schema::media_player::{
    DEFAULT_STATE_NAMES, MEDIA_STATES, PLAY_LIST, RESOURCE_TYPE, SELECT, STATE, TITLE,
};
use resource_model::{PlayerState, Representation, ResourceError, Result};
use std::sync::Arc;

use crate::device::PlayerDevice;
use crate::handler::ResourceHandler;

/// Device command chosen for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceAction {
    None,
    Play(usize),
    Pause,
    Resume,
    Stop,
}

pub struct MediaPlayerHandler {
    state_names: Vec<String>,
    playlist: Vec<String>,
    state: PlayerState,
    selected: usize,
    /// Track currently loaded in the device, if any
    loaded: Option<usize>,
    device: Arc<dyn PlayerDevice>,
}

impl MediaPlayerHandler {
    pub fn new(playlist: Vec<String>, device: Arc<dyn PlayerDevice>) -> Self {
        Self {
            state_names: DEFAULT_STATE_NAMES.iter().map(|s| s.to_string()).collect(),
            playlist,
            state: PlayerState::Idle,
            selected: 0,
            loaded: None,
            device,
        }
    }

    /// Advertise different names for Idle, Playing and Paused
    pub fn with_state_names(mut self, names: [&str; 3]) -> Self {
        self.state_names = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn title(&self) -> &str {
        self.track(self.selected).unwrap_or("")
    }

    fn track(&self, index: usize) -> Option<&str> {
        self.playlist.get(index).map(String::as_str)
    }

    fn parse_state(&self, name: &str) -> Result<PlayerState> {
        PlayerState::from_name(name, &self.state_names).ok_or_else(|| {
            ResourceError::Validation(format!(
                "state '{}' is not one of {:?}",
                name,
                &self.state_names[..self.state_names.len().min(3)]
            ))
        })
    }

    fn parse_select(&self, index: i64) -> Result<usize> {
        if index < 0 || index as usize >= self.playlist.len() {
            return Err(ResourceError::Validation(format!(
                "select index {} outside playlist of {} tracks",
                index,
                self.playlist.len()
            )));
        }
        Ok(index as usize)
    }

    fn plan(&self, target: PlayerState, selected: usize) -> DeviceAction {
        let same_track = self.loaded == Some(selected);
        match target {
            PlayerState::Idle if self.loaded.is_some() => DeviceAction::Stop,
            PlayerState::Idle => DeviceAction::None,
            PlayerState::Playing => match self.state {
                PlayerState::Playing if same_track => DeviceAction::None,
                PlayerState::Paused if same_track => DeviceAction::Resume,
                _ => DeviceAction::Play(selected),
            },
            PlayerState::Paused => match self.state {
                PlayerState::Playing if same_track => DeviceAction::Pause,
                _ if self.loaded.is_some() && !same_track => DeviceAction::Stop,
                _ => DeviceAction::None,
            },
        }
    }

    fn execute(&self, action: DeviceAction) -> Result<()> {
        match action {
            DeviceAction::None => {}
            DeviceAction::Play(index) => self.device.play(self.track(index))?,
            DeviceAction::Pause => self.device.pause()?,
            DeviceAction::Resume => self.device.resume()?,
            DeviceAction::Stop => self.device.stop()?,
        }
        Ok(())
    }

    fn commit(&mut self, action: DeviceAction, state: PlayerState, selected: usize) {
        match action {
            DeviceAction::Play(index) => self.loaded = Some(index),
            DeviceAction::Stop => self.loaded = None,
            _ => {}
        }
        if state == PlayerState::Idle {
            self.loaded = None;
        }
        if state != self.state {
            tracing::debug!("Player state {} -> {}", self.state, state);
        }
        self.state = state;
        self.selected = selected;
    }

    /// The device finished the loaded track
    ///
    /// Advances to the next track and keeps playing, or wraps to the first
    /// track and goes Idle after the last one.
    pub fn track_completed(&mut self) -> Result<()> {
        if self.state != PlayerState::Playing {
            return Err(ResourceError::Validation(format!(
                "track completion while {}",
                self.state
            )));
        }

        let next = self.selected + 1;
        if next < self.playlist.len() {
            self.execute(DeviceAction::Play(next))?;
            self.commit(DeviceAction::Play(next), PlayerState::Playing, next);
        } else {
            self.commit(DeviceAction::Stop, PlayerState::Idle, 0);
        }
        Ok(())
    }
}

impl ResourceHandler for MediaPlayerHandler {
    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn representation(&self) -> Representation {
        Representation::new()
            .with(MEDIA_STATES, self.state_names.clone())
            .with(STATE, self.state_names[self.state.ordinal()].clone())
            .with(TITLE, self.title())
            .with(PLAY_LIST, self.playlist.clone())
            .with(SELECT, self.selected as i64)
    }

    fn update(&mut self, fragment: &Representation) -> Result<()> {
        let target = match fragment.get_str(STATE)? {
            Some(name) => self.parse_state(name)?,
            None => self.state,
        };
        let selected = match fragment.get_int(SELECT)? {
            Some(index) => self.parse_select(index)?,
            None => self.selected,
        };

        let action = self.plan(target, selected);
        self.execute(action)?;
        self.commit(action, target, selected);
        Ok(())
    }
}
