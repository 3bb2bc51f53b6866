//! Types shared by the server, the client and the test tooling: grid cells,
//! the grid itself, the wire protocol and its framing.

pub mod cell;
pub mod grid;
pub mod protocol;
pub mod transport;

pub use cell::{Cell, Color};
pub use grid::{Grid, MapError, MapLayout, Position};
pub use protocol::{
    Action, ClientId, Command, DetailError, Envelope, Outcome, PlayerState, PositionUpdate,
    Request, Response, WorldSnapshot, PROTOCOL_VERSION, SPAWN_POSITION, STARTING_LIVES,
};

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:1234";
pub const DEFAULT_MAP_PATH: &str = "mapa.txt";
