use std::fmt;
use std::str::FromStr;

/// Player input the simulation understands.
///
/// The discriminant order is the agent's output layout: index 0 is `Left`,
/// 3 is `Rotate`. Changing it invalidates every trained network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Left,
    Right,
    Down,
    Rotate,
}

/// Number of distinct actions (size of the Q-network output).
pub const ACTION_COUNT: usize = 4;

impl Action {
    pub const ALL: [Action; ACTION_COUNT] =
        [Action::Left, Action::Right, Action::Down, Action::Rotate];

    /// Position of this action in [`Action::ALL`].
    pub fn index(self) -> usize {
        match self {
            Action::Left => 0,
            Action::Right => 1,
            Action::Down => 2,
            Action::Rotate => 3,
        }
    }

    /// Inverse of [`Action::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Translation applied by this action, `None` for rotation.
    pub fn delta(self) -> Option<(i32, i32)> {
        match self {
            Action::Left => Some((-1, 0)),
            Action::Right => Some((1, 0)),
            Action::Down => Some((0, 1)),
            Action::Rotate => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Right => "right",
            Action::Down => "down",
            Action::Rotate => "rotate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}' (expected left, right, down or rotate)")]
pub struct ParseActionError(String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Action::Left),
            "right" => Ok(Action::Right),
            "down" => Ok(Action::Down),
            "rotate" => Ok(Action::Rotate),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}
