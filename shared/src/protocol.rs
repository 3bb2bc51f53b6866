//! Wire types exchanged between clients and the server.
//!
//! Every call is a single [`Envelope`] carrying a [`Request`], answered by
//! exactly one [`Response`] holding a full [`WorldSnapshot`]. Commands carry a
//! per-client sequence number so the server can drop retransmissions.

use crate::grid::{Grid, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const PROTOCOL_VERSION: u32 = 1;

/// Where `register` places a new player.
pub const SPAWN_POSITION: Position = Position::new(3, 3);
pub const STARTING_LIVES: u32 = 3;

pub type ClientId = String;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub x: i32,
    pub y: i32,
    pub lives: u32,
    pub last_applied_sequence: u32,
}

impl PlayerState {
    pub fn spawn(sequence: u32) -> Self {
        Self {
            x: SPAWN_POSITION.x,
            y: SPAWN_POSITION.y,
            lives: STARTING_LIVES,
            last_applied_sequence: sequence,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Payload of an `update_position` command.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PositionUpdate {
    pub x: i32,
    pub y: i32,
    pub lives: Option<u32>,
}

impl PositionUpdate {
    pub fn new(pos: Position, lives: Option<u32>) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            lives,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Parses the textual detail layout `X:<int>,Y:<int>` with an optional
    /// `;VIDAS:<int>` suffix.
    pub fn parse(detail: &str) -> Result<Self, DetailError> {
        let malformed = || DetailError::Malformed(detail.to_string());

        let (coords, lives) = match detail.trim().split_once(';') {
            Some((coords, lives)) => (coords, Some(lives)),
            None => (detail.trim(), None),
        };

        let (x, y) = coords
            .trim()
            .strip_prefix("X:")
            .and_then(|rest| rest.split_once(",Y:"))
            .ok_or_else(malformed)?;
        let x = x.trim().parse::<i32>().map_err(|_| malformed())?;
        let y = y.trim().parse::<i32>().map_err(|_| malformed())?;

        let lives = match lives {
            Some(part) => Some(
                part.trim()
                    .strip_prefix("VIDAS:")
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .ok_or_else(malformed)?,
            ),
            None => None,
        };

        Ok(Self { x, y, lives })
    }

    /// Renders the update in the textual detail layout.
    pub fn to_detail(&self) -> String {
        match self.lives {
            Some(lives) => format!("X:{},Y:{};VIDAS:{}", self.x, self.y, lives),
            None => format!("X:{},Y:{}", self.x, self.y),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetailError {
    #[error("malformed position detail {0:?}")]
    Malformed(String),
    #[error("unknown action {0:?}")]
    UnknownAction(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Action {
    Register,
    UpdatePosition(PositionUpdate),
    Interact,
    /// Action name plus free-text detail, as older clients send them.
    Legacy { action: String, detail: String },
}

impl Action {
    /// Resolves a textual action/detail pair into a typed action.
    pub fn from_legacy(action: &str, detail: &str) -> Result<Action, DetailError> {
        match action {
            "register" => Ok(Action::Register),
            "update_position" => PositionUpdate::parse(detail).map(Action::UpdatePosition),
            "interact" => Ok(Action::Interact),
            other => Err(DetailError::UnknownAction(other.to_string())),
        }
    }

    /// Typed form of this action; legacy payloads are parsed.
    pub fn resolve(&self) -> Result<Action, DetailError> {
        match self {
            Action::Legacy { action, detail } => Action::from_legacy(action, detail),
            typed => Ok(typed.clone()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Action::Register => "register",
            Action::UpdatePosition(_) => "update_position",
            Action::Interact => "interact",
            Action::Legacy { action, .. } => action,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Command {
    pub client_id: ClientId,
    pub sequence: u32,
    pub action: Action,
}

impl Command {
    pub fn new(client_id: impl Into<ClientId>, sequence: u32, action: Action) -> Self {
        Self {
            client_id: client_id.into(),
            sequence,
            action,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Request {
    FetchState { client_id: ClientId },
    ExecuteCommand(Command),
}

/// Versioned wrapper around every request frame.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub version: u32,
    pub request: Request,
}

impl Envelope {
    pub fn new(request: Request) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            request,
        }
    }
}

/// Machine-readable result category of a call.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    StateSent,
    Registered,
    AlreadyRegistered,
    Moved,
    Blocked,
    Interacted,
    Duplicate,
    MalformedDetail,
    UnknownAction,
    UnknownClient,
    VersionMismatch,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Full copy of the authoritative world.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub grid: Grid,
    pub players: HashMap<ClientId, PlayerState>,
    pub status: String,
    pub game_over: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Response {
    pub success: bool,
    pub message: String,
    pub outcome: Outcome,
    pub snapshot: WorldSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_only() {
        let update = PositionUpdate::parse("X:5,Y:7").unwrap();
        assert_eq!(update, PositionUpdate { x: 5, y: 7, lives: None });
    }

    #[test]
    fn test_parse_position_and_lives() {
        let update = PositionUpdate::parse("X:5,Y:5;VIDAS:2").unwrap();
        assert_eq!(update.position(), Position::new(5, 5));
        assert_eq!(update.lives, Some(2));
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_negatives() {
        let update = PositionUpdate::parse(" X:-1,Y: 4 ; VIDAS:0 ").unwrap();
        assert_eq!(update, PositionUpdate { x: -1, y: 4, lives: Some(0) });
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for detail in [
            "garbage",
            "",
            "X:1",
            "X:a,Y:2",
            "Y:2,X:1",
            "X:1,Y:2;LIVES:3",
            "X:1,Y:2;VIDAS:-1",
            "X:1,Y:2;VIDAS:",
        ] {
            assert_eq!(
                PositionUpdate::parse(detail),
                Err(DetailError::Malformed(detail.to_string())),
                "detail {:?} should be rejected",
                detail
            );
        }
    }

    #[test]
    fn test_detail_rendering_matches_parser() {
        let with_lives = PositionUpdate::new(Position::new(2, 9), Some(1));
        assert_eq!(with_lives.to_detail(), "X:2,Y:9;VIDAS:1");
        let without = PositionUpdate::new(Position::new(2, 9), None);
        assert_eq!(without.to_detail(), "X:2,Y:9");
        assert_eq!(PositionUpdate::parse(&with_lives.to_detail()), Ok(with_lives));
    }

    #[test]
    fn test_legacy_actions_resolve() {
        let legacy = Action::Legacy {
            action: "update_position".into(),
            detail: "X:5,Y:5".into(),
        };
        assert_eq!(
            legacy.resolve(),
            Ok(Action::UpdatePosition(PositionUpdate { x: 5, y: 5, lives: None }))
        );
        assert_eq!(Action::from_legacy("register", "ignored"), Ok(Action::Register));
        assert_eq!(Action::from_legacy("interact", ""), Ok(Action::Interact));
        assert_eq!(
            Action::from_legacy("dance", ""),
            Err(DetailError::UnknownAction("dance".into()))
        );
        assert_eq!(legacy.name(), "update_position");
    }

    #[test]
    fn test_envelope_carries_current_version() {
        let envelope = Envelope::new(Request::FetchState {
            client_id: "Jogador-1".into(),
        });
        assert_eq!(envelope.version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = Envelope::new(Request::ExecuteCommand(Command::new(
            "Jogador-7",
            4,
            Action::UpdatePosition(PositionUpdate { x: 1, y: 2, lives: Some(3) }),
        )));
        let bytes = bincode::serialize(&envelope).unwrap();
        let decoded: Envelope = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_spawned_player() {
        let player = PlayerState::spawn(1);
        assert_eq!(player.position(), SPAWN_POSITION);
        assert_eq!(player.lives, STARTING_LIVES);
        assert_eq!(player.last_applied_sequence, 1);
    }
}
