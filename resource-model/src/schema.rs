//! Resource type strings and attribute names understood by ocres peers
//!
//! Servers and clients agree on these names; neither side treats an
//! attribute outside this list as an error.

use std::fmt;

/// Dimmable light level
pub mod brightness {
    pub const RESOURCE_TYPE: &str = "oic.r.light.brightness";
    pub const BRIGHTNESS: &str = "brightness";
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 100;
}

/// Playlist driven audio player
pub mod media_player {
    pub const RESOURCE_TYPE: &str = "x.com.intel.demo.mp3player";
    /// Ordered list of valid state names, by ordinal Idle, Playing, Paused
    pub const MEDIA_STATES: &str = "mediaStates";
    pub const STATE: &str = "state";
    pub const TITLE: &str = "title";
    pub const PLAY_LIST: &str = "playList";
    pub const SELECT: &str = "select";
    pub const DEFAULT_STATE_NAMES: [&str; 3] = ["Idle", "Playing", "Paused"];
}

/// Output volume and mute
pub mod audio {
    pub const RESOURCE_TYPE: &str = "oic.r.audio";
    pub const VOLUME: &str = "volume";
    pub const MUTE: &str = "mute";
    pub const MIN_VOLUME: i64 = 0;
    pub const MAX_VOLUME: i64 = 100;
}

/// On/off actuator
pub mod binary_switch {
    pub const RESOURCE_TYPE: &str = "oic.r.switch.binary";
    pub const VALUE: &str = "value";
}

/// Interface every resource answers on
pub const BASELINE_INTERFACE: &str = "oic.if.baseline";

/// Playback state shared by the media player resource and its clients
///
/// The wire carries a state as a name from the resource's `mediaStates`
/// list; the position of that name in the list is the ordinal below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl PlayerState {
    pub const ALL: [PlayerState; 3] = [PlayerState::Idle, PlayerState::Playing, PlayerState::Paused];

    pub fn ordinal(self) -> usize {
        match self {
            PlayerState::Idle => 0,
            PlayerState::Playing => 1,
            PlayerState::Paused => 2,
        }
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    /// Resolve a state name against a learned list of valid names
    pub fn from_name(name: &str, valid_states: &[String]) -> Option<Self> {
        valid_states
            .iter()
            .position(|s| s == name)
            .and_then(Self::from_ordinal)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(media_player::DEFAULT_STATE_NAMES[self.ordinal()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("Idle", Some(PlayerState::Idle))]
    #[case("Playing", Some(PlayerState::Playing))]
    #[case("Paused", Some(PlayerState::Paused))]
    #[case("Stopped", None)]
    #[case("Bogus", None)]
    fn test_from_name(#[case] name: &str, #[case] expected: Option<PlayerState>) {
        let valid = names(&["Idle", "Playing", "Paused", "Stopped"]);
        assert_eq!(PlayerState::from_name(name, &valid), expected);
    }

    #[test]
    fn test_ordinals_round_trip() {
        for state in PlayerState::ALL {
            assert_eq!(PlayerState::from_ordinal(state.ordinal()), Some(state));
        }
        assert_eq!(PlayerState::from_ordinal(3), None);
    }
}
