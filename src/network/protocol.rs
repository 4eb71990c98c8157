use crate::error::SessionError;
use crate::game::Game;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shortest prefix the server will run a user search for.
pub const MIN_USER_PREFIX: usize = 3;

/// Discriminator carried in every packet's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Login,
    SignUp,
    GameRequest,
    JoinRequest,
    MoveRequest,
    UserListRequest,
    UserList,
    Game,
    Ack,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUp {
    pub username: String,
    pub password: String,
}

/// Ask the server to create a game. No opponent means a public game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCreate {
    pub name: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub game: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub game: String,
    pub src: usize,
    pub dst: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserListRequest {
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<String>,
}

/// Generic success/failure reply. `message` is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Ack {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Ack {
            success: false,
            message: message.into(),
        }
    }
}

/// Everything that crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    // Client -> Server
    Login(Login),
    SignUp(SignUp),
    GameRequest(GameCreate),
    JoinRequest(JoinRequest),
    MoveRequest(MoveRequest),
    UserListRequest(UserListRequest),

    // Server -> Client
    UserList(UserList),
    Game(Game),
    Ack(Ack),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Login(_) => MessageType::Login,
            Message::SignUp(_) => MessageType::SignUp,
            Message::GameRequest(_) => MessageType::GameRequest,
            Message::JoinRequest(_) => MessageType::JoinRequest,
            Message::MoveRequest(_) => MessageType::MoveRequest,
            Message::UserListRequest(_) => MessageType::UserListRequest,
            Message::UserList(_) => MessageType::UserList,
            Message::Game(_) => MessageType::Game,
            Message::Ack(_) => MessageType::Ack,
        }
    }

    pub fn login(username: &str, password: &str) -> Self {
        Message::Login(Login {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn sign_up(username: &str, password: &str) -> Self {
        Message::SignUp(SignUp {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn create_game(name: &str, owner: &str, opponent: Option<&str>) -> Self {
        Message::GameRequest(GameCreate {
            name: name.to_string(),
            owner: owner.to_string(),
            opponent: opponent.map(str::to_string),
        })
    }

    pub fn user_search(prefix: &str) -> Self {
        Message::UserListRequest(UserListRequest {
            prefix: prefix.to_string(),
        })
    }

    pub fn ack(success: bool, message: impl Into<String>) -> Self {
        Message::Ack(Ack {
            success,
            message: message.into(),
        })
    }

    pub fn as_ack(&self) -> Option<&Ack> {
        match self {
            Message::Ack(ack) => Some(ack),
            _ => None,
        }
    }

    pub fn as_game(&self) -> Option<&Game> {
        match self {
            Message::Game(game) => Some(game),
            _ => None,
        }
    }

    pub fn as_user_list(&self) -> Option<&UserList> {
        match self {
            Message::UserList(list) => Some(list),
            _ => None,
        }
    }
}

/// Wire envelope: one message plus correlation ids.
///
/// `id` is assigned by the sender; a reply names the request it answers in
/// `reply_to`. Encoded as one JSON object per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<u64>,
    #[serde(flatten)]
    pub data: Message,
}

impl Packet {
    pub fn request(id: u64, data: Message) -> Self {
        Packet {
            id,
            reply_to: None,
            data,
        }
    }

    pub fn reply(id: u64, reply_to: u64, data: Message) -> Self {
        Packet {
            id,
            reply_to: Some(reply_to),
            data,
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.data.message_type()
    }

    pub fn data(&self) -> &Message {
        &self.data
    }

    pub fn into_data(self) -> Message {
        self.data
    }

    pub fn to_json(&self) -> String {
        // A Packet is plain data with string keys; encoding cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(line: &str) -> Result<Packet, SessionError> {
        serde_json::from_str(line.trim()).map_err(SessionError::malformed)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
