//! Inspect the cards a seed deals, or replay a whole game offline.
//!
//! Usage:
//!   cargo run --features mocks --bin card-replay -- decode --seed 0x1b2c --turn 3 --json
//!   cargo run --features mocks --bin card-replay -- replay --seed 0x1b2c --actions 24 --bell-on-match

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use commonware_utils::{from_hex_formatted, hex};
use ethers::types::{Address, U256};
use mollinalli_client::{mocks::MockChain, Error, Session, Stream};
use mollinalli_execution::{bell_symbol, decode, seed_bytes, symbol_tally};
use mollinalli_types::{CardBatch, GameConfig, DEFAULT_MAX_ACTION, SEED_BYTES};
use serde::Serialize;
use tracing::{warn, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Decode MolliNalli seeds and replay games offline")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the three cards visible at a turn
    Decode {
        #[arg(long)]
        seed: String,

        #[arg(long, default_value_t = 0)]
        turn: u64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Play a game against an in-memory contract
    Replay {
        #[arg(long)]
        seed: String,

        #[arg(long, default_value_t = DEFAULT_MAX_ACTION)]
        actions: u8,

        #[arg(long)]
        max_per_round: Option<u8>,

        /// Ring whenever four of a kind is showing instead of always passing
        #[arg(long)]
        bell_on_match: bool,
    },
}

#[derive(Serialize)]
struct DecodeReport {
    seed: String,
    turn: u64,
    cards: CardBatch,
    tally: [u8; 4],
    bell: Option<String>,
}

fn parse_seed(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = from_hex_formatted(&padded).ok_or_else(|| anyhow!("invalid seed hex"))?;
    if bytes.len() > SEED_BYTES {
        bail!("seed longer than {SEED_BYTES} bytes");
    }
    Ok(U256::from_big_endian(&bytes))
}

fn run_decode(seed: U256, turn: u64, json: bool) -> Result<()> {
    let cards = decode(seed, turn);
    let tally = symbol_tally(seed, turn);
    let bell = bell_symbol(seed, turn);
    if json {
        let report = DecodeReport {
            seed: hex(&seed_bytes(seed)),
            turn,
            cards,
            tally,
            bell: bell.map(|symbol| symbol.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("turn {turn}: {cards}");
    println!("tally: chog={} moyaki={} molandak={}", tally[1], tally[2], tally[3]);
    match bell {
        Some(symbol) => println!("bell: ring ({symbol})"),
        None => println!("bell: pass"),
    }
    Ok(())
}

async fn run_replay(seed: U256, actions: u8, config: GameConfig, bell_on_match: bool) -> Result<()> {
    let address = Address::repeat_byte(0x01);
    let chain = MockChain::new(config, address);
    chain.set_next_deal(seed);
    let mut events = Stream::new(chain.subscribe(), address);

    let mut session = Session::connect(address, chain.clone(), chain.clone())
        .await
        .context("failed to connect")?;
    session.join().await?;
    session.start().await?;
    session.refresh().await?;

    for _ in 0..actions {
        let view = session.view();
        let bell = bell_on_match && view.bell_expected.unwrap_or(false);
        let before = view.cards;
        match session.action(bell).await {
            Ok(outcome) => {
                let shown = before.map(|cards| cards.to_string()).unwrap_or_default();
                println!(
                    "#{:>2} {} {} {}{}{}",
                    outcome.progress.action_count,
                    shown,
                    if bell { "ring" } else { "pass" },
                    if outcome.is_correct() { "ok" } else { "miss" },
                    if outcome.reseeded { " (redraw)" } else { "" },
                    if outcome.round_ended { " (round over)" } else { "" },
                );
            }
            Err(Error::ActionsClosed(stage)) => {
                println!("stopped: {stage}");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    chain.close_subscriptions();
    while let Some(item) = events.next().await {
        match item {
            Ok(event) => {
                session.handle_event(event);
            }
            Err(Error::ConnectionClosed) => break,
            Err(err) => warn!(error = %err, "skipping event"),
        }
    }

    let view = session.refresh().await?;
    println!(
        "stage={} score={} actions={}",
        view.stage, view.score, view.action_count
    );
    if let Some(result) = view.result() {
        println!(
            "result: score={} actions={} end_time={}",
            result.player.score, result.player.action_count, result.timestamp
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    match args.command {
        Command::Decode { seed, turn, json } => run_decode(parse_seed(&seed)?, turn, json),
        Command::Replay {
            seed,
            actions,
            max_per_round,
            bell_on_match,
        } => {
            let config = GameConfig::new(
                actions.max(DEFAULT_MAX_ACTION),
                max_per_round.unwrap_or(actions.max(1)),
            );
            run_replay(parse_seed(&seed)?, actions, config, bell_on_match).await
        }
    }
}
