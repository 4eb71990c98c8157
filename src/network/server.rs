use crate::game::Game;
use crate::network::protocol::{
    GameCreate, JoinRequest, Login, Message, MoveRequest, Packet, SignUp, UserList,
    UserListRequest, MIN_USER_PREFIX,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Accounts and open games. Everything lives in memory.
#[derive(Debug, Default)]
pub struct Lobby {
    // username -> password
    users: HashMap<String, String>,
    games: HashMap<String, Game>,
}

/// Per-connection state.
#[derive(Debug, Default)]
pub struct Connection {
    user: Option<String>,
}

impl Connection {
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(&self, name: &str) -> Option<&Game> {
        self.games.get(name)
    }

    /// Answer one request. Failures come back as a negative `Ack`.
    pub fn handle(&mut self, conn: &mut Connection, message: Message) -> Message {
        match message {
            Message::SignUp(req) => self.sign_up(req),
            Message::Login(req) => self.login(conn, req),
            Message::UserListRequest(req) => self.user_list(conn, req),
            Message::GameRequest(req) => self.create_game(conn, req),
            Message::JoinRequest(req) => self.join_game(conn, req),
            Message::MoveRequest(req) => self.move_disk(conn, req),
            other => {
                warn!(kind = ?other.message_type(), "unexpected message from client");
                Message::ack(false, "Unexpected message")
            }
        }
    }

    fn sign_up(&mut self, req: SignUp) -> Message {
        let username = req.username.trim();
        if username.is_empty() || req.password.is_empty() {
            return Message::ack(false, "Username and password are required");
        }
        if self.users.contains_key(username) {
            return Message::ack(false, "Username already taken");
        }
        info!(user = username, "account created");
        self.users.insert(username.to_string(), req.password);
        Message::ack(true, "Account created")
    }

    fn login(&mut self, conn: &mut Connection, req: Login) -> Message {
        let username = req.username.trim();
        match self.users.get(username) {
            Some(password) if *password == req.password => {
                info!(user = username, "logged in");
                conn.user = Some(username.to_string());
                Message::ack(true, format!("Welcome, {}", username))
            }
            _ => Message::ack(false, "Invalid username or password"),
        }
    }

    fn user_list(&self, conn: &Connection, req: UserListRequest) -> Message {
        if req.prefix.chars().count() < MIN_USER_PREFIX {
            return Message::ack(
                false,
                format!("Type at least {} characters to search", MIN_USER_PREFIX),
            );
        }
        let mut users: Vec<String> = self
            .users
            .keys()
            .filter(|name| name.starts_with(&req.prefix))
            .filter(|name| conn.user() != Some(name.as_str()))
            .cloned()
            .collect();
        users.sort();
        Message::UserList(UserList { users })
    }

    fn create_game(&mut self, conn: &Connection, req: GameCreate) -> Message {
        let Some(user) = conn.user() else {
            return Message::ack(false, "Please log in first");
        };
        if req.owner != user {
            return Message::ack(false, "You can only create games for yourself");
        }
        let name = req.name.trim();
        if name.is_empty() {
            return Message::ack(false, "Game name is required");
        }
        if self.games.contains_key(name) {
            return Message::ack(false, format!("A game named '{}' already exists", name));
        }

        let game = match req.opponent.as_deref() {
            None => Game::new(name, user),
            Some(opponent) if opponent == user => {
                return Message::ack(false, "You cannot play against yourself")
            }
            Some(opponent) if !self.users.contains_key(opponent) => {
                return Message::ack(false, format!("Unknown player '{}'", opponent))
            }
            Some(opponent) => Game::with_opponent(name, user, opponent),
        };

        info!(game = name, owner = user, public = game.is_public_game(), "game created");
        self.games.insert(name.to_string(), game.clone());
        Message::Game(game)
    }

    fn join_game(&mut self, conn: &Connection, req: JoinRequest) -> Message {
        let Some(user) = conn.user() else {
            return Message::ack(false, "Please log in first");
        };
        let Some(game) = self.games.get_mut(&req.game) else {
            return Message::ack(false, format!("No game named '{}'", req.game));
        };
        if !game.join(user) {
            return Message::ack(false, "That game is not open");
        }
        info!(game = %req.game, user, "joined game");
        Message::Game(game.clone())
    }

    fn move_disk(&mut self, conn: &Connection, req: MoveRequest) -> Message {
        let Some(user) = conn.user() else {
            return Message::ack(false, "Please log in first");
        };
        let Some(game) = self.games.get_mut(&req.game) else {
            return Message::ack(false, format!("No game named '{}'", req.game));
        };
        if game.is_public_game() {
            return Message::ack(false, "Waiting for an opponent to join");
        }
        if game.player_color(user) != Some(game.turn()) {
            return Message::ack(false, "It is not your turn");
        }
        if !game.move_disk(req.src, req.dst) {
            return Message::ack(false, "Illegal move");
        }
        debug!(game = %req.game, user, src = req.src, dst = req.dst, "move accepted");
        Message::Game(game.clone())
    }
}

pub async fn start_server(addr: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "server started");
    serve(listener, Arc::new(Mutex::new(Lobby::new()))).await
}

/// Accept connections forever, one task per client.
pub async fn serve(listener: TcpListener, lobby: Arc<Mutex<Lobby>>) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        let lobby = Arc::clone(&lobby);

        tokio::spawn(async move {
            info!(%peer, "client connected");
            match handle_connection(socket, lobby).await {
                Ok(()) => info!(%peer, "client disconnected"),
                Err(e) => warn!(%peer, error = %e, "error handling connection"),
            }
        });
    }
}

async fn handle_connection(socket: TcpStream, lobby: Arc<Mutex<Lobby>>) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut conn = Connection::default();
    let mut next_id = 1;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = match Packet::from_json(&line) {
            Ok(request) => {
                let id = request.id;
                let data = lobby.lock().await.handle(&mut conn, request.into_data());
                Packet::reply(next_id, id, data)
            }
            Err(e) => {
                warn!(error = %e, "malformed request");
                let reply = Message::ack(false, "Malformed request");
                match request_id(&line) {
                    Some(id) => Packet::reply(next_id, id, reply),
                    None => Packet::request(next_id, reply),
                }
            }
        };
        next_id += 1;

        let json = reply.to_json() + "\n";
        writer.write_all(json.as_bytes()).await?;
    }
    Ok(())
}

/// Numeric `id` of a line that is JSON but not a valid request.
fn request_id(line: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(line).ok()?.get("id")?.as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Color, Disk};

    fn ack(message: &Message) -> (bool, &str) {
        let ack = message.as_ack().expect("expected an Ack");
        (ack.success, ack.message.as_str())
    }

    fn lobby_with(users: &[&str]) -> Lobby {
        let mut lobby = Lobby::new();
        for user in users {
            let reply = lobby.handle(&mut Connection::default(), Message::sign_up(user, "pw"));
            assert!(ack(&reply).0);
        }
        lobby
    }

    fn logged_in(lobby: &mut Lobby, user: &str) -> Connection {
        let mut conn = Connection::default();
        let reply = lobby.handle(&mut conn, Message::login(user, "pw"));
        assert!(ack(&reply).0, "login failed for {}", user);
        conn
    }

    #[test]
    fn duplicate_sign_up_is_refused() {
        let mut lobby = lobby_with(&["alice"]);
        let reply = lobby.handle(&mut Connection::default(), Message::sign_up("alice", "x"));
        assert_eq!(ack(&reply), (false, "Username already taken"));
        let reply = lobby.handle(&mut Connection::default(), Message::sign_up("  ", "x"));
        assert!(!ack(&reply).0);
        let reply = lobby.handle(&mut Connection::default(), Message::login("", "x"));
        assert!(!ack(&reply).0);
    }

    #[test]
    fn usernames_are_trimmed_on_login_too() {
        let mut lobby = Lobby::new();
        let mut conn = Connection::default();
        lobby.handle(&mut conn, Message::sign_up(" dave ", "pw"));
        let reply = lobby.handle(&mut conn, Message::login(" dave ", "pw"));
        assert_eq!(ack(&reply), (true, "Welcome, dave"));
        assert_eq!(conn.user(), Some("dave"));
    }

    #[test]
    fn login_checks_password() {
        let mut lobby = lobby_with(&["alice"]);
        let mut conn = Connection::default();
        let reply = lobby.handle(&mut conn, Message::login("alice", "wrong"));
        assert_eq!(ack(&reply), (false, "Invalid username or password"));
        assert_eq!(conn.user(), None);

        let reply = lobby.handle(&mut conn, Message::login("alice", "pw"));
        assert_eq!(ack(&reply), (true, "Welcome, alice"));
        assert_eq!(conn.user(), Some("alice"));
    }

    #[test]
    fn user_search_needs_three_characters() {
        let mut lobby = lobby_with(&["alice", "albert", "alfred", "bob"]);
        let mut conn = logged_in(&mut lobby, "alfred");

        let reply = lobby.handle(&mut conn, Message::user_search("al"));
        assert!(!ack(&reply).0);

        let reply = lobby.handle(&mut conn, Message::user_search("alb"));
        assert_eq!(reply.as_user_list().unwrap().users, vec!["albert"]);

        // sorted, without the requester
        let reply = lobby.handle(&mut conn, Message::user_search("alf"));
        assert!(reply.as_user_list().unwrap().users.is_empty());
        lobby.handle(&mut Connection::default(), Message::sign_up("alfie", "pw"));
        let reply = lobby.handle(&mut conn, Message::user_search("alf"));
        assert_eq!(reply.as_user_list().unwrap().users, vec!["alfie"]);
    }

    #[test]
    fn create_public_and_private_games() {
        let mut lobby = lobby_with(&["alice", "bob"]);
        let mut conn = logged_in(&mut lobby, "alice");

        let reply = lobby.handle(&mut conn, Message::create_game("open", "alice", None));
        assert!(reply.as_game().unwrap().is_public_game());

        let reply = lobby.handle(&mut conn, Message::create_game("duel", "alice", Some("bob")));
        let game = reply.as_game().unwrap();
        assert!(!game.is_public_game());
        assert_eq!(game.player_color("bob"), Some(Color::White));

        let reply = lobby.handle(&mut conn, Message::create_game("duel", "alice", None));
        assert!(!ack(&reply).0);
    }

    #[test]
    fn malformed_game_requests_are_refused() {
        let mut lobby = lobby_with(&["alice", "bob"]);
        let reply = lobby.handle(
            &mut Connection::default(),
            Message::create_game("g", "alice", None),
        );
        assert_eq!(ack(&reply), (false, "Please log in first"));

        let mut conn = logged_in(&mut lobby, "alice");
        for request in [
            Message::create_game("g", "bob", None),
            Message::create_game("  ", "alice", None),
            Message::create_game("g", "alice", Some("alice")),
            Message::create_game("g", "alice", Some("nobody")),
        ] {
            assert!(!ack(&lobby.handle(&mut conn, request)).0);
        }
        assert!(lobby.game("g").is_none());
    }

    #[test]
    fn join_then_play() {
        let mut lobby = lobby_with(&["alice", "bob", "carol"]);
        let mut alice = logged_in(&mut lobby, "alice");
        let mut bob = logged_in(&mut lobby, "bob");
        let mut carol = logged_in(&mut lobby, "carol");
        lobby.handle(&mut alice, Message::create_game("open", "alice", None));

        let join = |game: &str| Message::JoinRequest(JoinRequest { game: game.into() });
        let mv = |src, dst| {
            Message::MoveRequest(MoveRequest {
                game: "open".into(),
                src,
                dst,
            })
        };

        assert_eq!(
            ack(&lobby.handle(&mut alice, mv(9, 13))),
            (false, "Waiting for an opponent to join")
        );
        assert_eq!(lobby.game("open").unwrap().turn(), Color::Red);

        assert!(lobby.handle(&mut bob, join("open")).as_game().is_some());
        assert!(!ack(&lobby.handle(&mut carol, join("open"))).0);
        assert!(!ack(&lobby.handle(&mut carol, join("missing"))).0);

        // white may not open
        assert_eq!(ack(&lobby.handle(&mut bob, mv(21, 17))), (false, "It is not your turn"));
        assert_eq!(ack(&lobby.handle(&mut alice, mv(9, 5))), (false, "Illegal move"));
        assert_eq!(ack(&lobby.handle(&mut carol, mv(9, 13))), (false, "It is not your turn"));

        let reply = lobby.handle(&mut alice, mv(9, 13));
        let game = reply.as_game().unwrap();
        assert_eq!(game.get_square(13).unwrap(), Disk::RedMan);
        assert_eq!(game.turn(), Color::White);
        assert!(lobby.handle(&mut bob, mv(21, 17)).as_game().is_some());
        assert_eq!(lobby.game("open").unwrap().turn(), Color::Red);
    }

    #[test]
    fn request_id_is_recovered_from_bad_payloads() {
        assert_eq!(request_id(r#"{"id":4,"type":"NOPE","data":{}}"#), Some(4));
        assert_eq!(request_id(r#"{"id":"x","type":"LOGIN"}"#), None);
        assert_eq!(request_id("{not json"), None);
    }

    #[test]
    fn replies_are_not_accepted_as_requests() {
        let mut lobby = Lobby::new();
        let reply = lobby.handle(&mut Connection::default(), Message::ack(true, "hi"));
        assert_eq!(ack(&reply), (false, "Unexpected message"));
    }
}
