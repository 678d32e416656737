//! Error types for the room layer.

use anteroom_protocol::{ErrorCode, PlayerId, RoomId};

/// Rejections from a [`ReadyBarrier`](crate::ReadyBarrier).
///
/// None of these mutate the barrier: a rejected confirmation leaves the
/// confirmed set exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadyError {
    /// The player already confirmed for this start attempt.
    #[error("player {0} is already ready")]
    AlreadyReady(PlayerId),

    /// The player is not part of this start attempt.
    #[error("player {0} is not part of this start attempt")]
    UnknownPlayer(PlayerId),

    /// The supplied token does not match the one issued to the player.
    #[error("invalid ready token for player {0}")]
    InvalidToken(PlayerId),
}

/// Errors that can occur during room and registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The player is already registered to a room.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// No room with this id exists.
    #[error("room {0} does not exist")]
    RoomDoesNotExist(RoomId),

    /// The room has no free player slot.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is not in any room, or not in this one.
    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    /// Only the owner may perform this operation.
    #[error("player {0} is not the owner of room {1}")]
    NotOwner(PlayerId, RoomId),

    /// The room is already starting or in progress.
    #[error("game in room {0} already started")]
    AlreadyStarted(RoomId),

    /// There is no start attempt to cancel.
    #[error("game in room {0} is not starting")]
    NotStarting(RoomId),

    /// A ready confirmation arrived while the room was not starting.
    #[error("unexpected ready in room {0}")]
    UnexpectedReady(RoomId),

    /// The player is part of the running ready handshake and cannot leave.
    #[error("game start in progress in room {0}")]
    GameStartInProgress(RoomId),

    /// The ready barrier rejected a confirmation.
    #[error(transparent)]
    Ready(#[from] ReadyError),
}

impl RoomError {
    /// The wire error code reported to the client.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AlreadyInRoom(..) => ErrorCode::AlreadyInRoom,
            Self::RoomDoesNotExist(_) => ErrorCode::RoomDoesNotExist,
            Self::RoomFull(_) => ErrorCode::RoomFull,
            Self::NotInRoom(_) => ErrorCode::NotInRoom,
            Self::NotOwner(..) => ErrorCode::NotOwner,
            Self::AlreadyStarted(_) => ErrorCode::AlreadyStarted,
            Self::NotStarting(_) => ErrorCode::NotStarting,
            Self::UnexpectedReady(_) => ErrorCode::UnexpectedReady,
            Self::GameStartInProgress(_) => ErrorCode::GameStartInProgress,
            Self::Ready(ReadyError::AlreadyReady(_)) => ErrorCode::AlreadyReady,
            Self::Ready(ReadyError::UnknownPlayer(_)) => ErrorCode::UnknownPlayer,
            Self::Ready(ReadyError::InvalidToken(_)) => ErrorCode::InvalidToken,
        }
    }
}
