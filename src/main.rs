use anyhow::{bail, Context, Result};
use checkers_net::config::NetConfig;
use checkers_net::game::Game;
use checkers_net::network::protocol::{JoinRequest, Message, MoveRequest};
use checkers_net::network::{start_server, ClientSession};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "checkers-net", about = "Play checkers over TCP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the game server
    Server {
        /// Listen address, defaults to `server_addr` from the config file
        #[arg(long)]
        addr: Option<String>,
    },
    /// Connect to a server and play from the terminal
    Client {
        #[arg(long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = NetConfig::load_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    match cli.command {
        Command::Server { addr } => {
            let addr = addr.unwrap_or_else(|| config.server_addr.clone());
            start_server(&addr).await
        }
        Command::Client { addr } => {
            let addr = addr.unwrap_or_else(|| config.server_addr.clone());
            run_client(&addr, &config).await
        }
    }
}

const HELP: &str = "\
commands:
  signup <user> <password>
  login <user> <password>
  users <prefix>
  create <game> [opponent]
  join <game>
  move <src> <dst>
  board
  quit";

async fn run_client(addr: &str, config: &NetConfig) -> Result<()> {
    let session = ClientSession::connect(addr, config)
        .await
        .with_context(|| format!("could not connect to {}", addr))?;
    println!("Connected to {}.\n{}", addr, HELP);

    let mut user: Option<String> = None;
    let mut current: Option<Game> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        if command == "quit" {
            break;
        }
        if command == "board" {
            match &current {
                Some(game) => print_game(game),
                None => println!("No game yet."),
            }
            continue;
        }

        let message = match build_request(command, args, user.as_deref(), current.as_ref()) {
            Ok(message) => message,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        let login_as = match &message {
            Message::Login(login) => Some(login.username.clone()),
            _ => None,
        };

        let reply = match session.request(message).await {
            Ok(reply) => reply,
            Err(e) => {
                println!("Request failed: {}", e);
                if session.is_closed() {
                    break;
                }
                continue;
            }
        };
        match reply.into_data() {
            Message::Ack(ack) => {
                println!("{}", ack.message);
                if ack.success && login_as.is_some() {
                    user = login_as;
                }
            }
            Message::UserList(list) if list.users.is_empty() => println!("No matching users."),
            Message::UserList(list) => println!("{}", list.users.join("\n")),
            Message::Game(game) => {
                print_game(&game);
                current = Some(game);
            }
            other => println!("Unexpected reply: {:?}", other.message_type()),
        }
    }

    session.close();
    info!("client finished");
    Ok(())
}

fn build_request(
    command: &str,
    args: &[&str],
    user: Option<&str>,
    current: Option<&Game>,
) -> Result<Message> {
    let message = match (command, args) {
        ("signup", [name, password]) => Message::sign_up(name, password),
        ("login", [name, password]) => Message::login(name, password),
        ("users", [prefix]) => Message::user_search(prefix),
        ("create", [game, rest @ ..]) if rest.len() <= 1 => {
            let Some(owner) = user else {
                bail!("Log in first.");
            };
            Message::create_game(game, owner, rest.first().copied())
        }
        ("join", [game]) => Message::JoinRequest(JoinRequest {
            game: game.to_string(),
        }),
        ("move", [src, dst]) => {
            let Some(game) = current else {
                bail!("Create or join a game first.");
            };
            Message::MoveRequest(MoveRequest {
                game: game.name().to_string(),
                src: src.parse().context("src must be a square number")?,
                dst: dst.parse().context("dst must be a square number")?,
            })
        }
        _ => bail!("{}", HELP),
    };
    Ok(message)
}

fn print_game(game: &Game) {
    let opponent = game
        .player_two()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "(open seat)".to_string());
    println!("{}: {} vs {}", game.name(), game.player_one(), opponent);
    print!("{}", game.board());
    println!("{} to move", game.turn());
}
