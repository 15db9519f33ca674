//! `dmt`: operator CLI for the Denali token issuance ledger.

mod request;
mod state;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dmt_ledger::{
    format_units, load_config, AccountId, EventSink, IssuanceLedger, LedgerEvent, Operation,
    TracingSink,
};
use ed25519_dalek::SigningKey;
use rand::{rngs::OsRng, RngCore};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::request::SignedRequest;
use crate::state::StateFile;

/// Denali token issuance ledger
#[derive(Parser, Debug)]
#[command(name = "dmt", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an ed25519 keypair; the public key is the account id
    Keygen {
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Build a ledger from a TOML config and write the state file
    Init {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        state: PathBuf,
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },
    /// Print a signed request for one operation as a JSON line
    Sign {
        #[arg(long)]
        sk_hex: String,
        #[arg(long, default_value_t = 0)]
        nonce: u64,
        /// Operation as JSON, e.g. '{"op":"self_mint","tokens":1000}'
        #[arg(long)]
        op: String,
    },
    /// Verify and apply signed requests (one JSON object per line)
    Apply {
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        requests: PathBuf,
    },
    /// Print supply, phase and optionally one account
    Show {
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        account: Option<AccountId>,
    },
    /// Check the state file against its state root and invariants
    Verify {
        #[arg(long)]
        state: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Keygen { out_dir } => keygen_cmd(&out_dir),
        Command::Init {
            config,
            state,
            force,
        } => init_cmd(&config, &state, force),
        Command::Sign { sk_hex, nonce, op } => sign_cmd(&sk_hex, nonce, &op),
        Command::Apply { state, requests } => apply_cmd(&state, &requests),
        Command::Show { state, account } => show_cmd(&state, account.as_ref()),
        Command::Verify { state } => verify_cmd(&state),
    }
}

fn keygen_cmd(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("mkdir {}", out_dir.display()))?;

    let mut sk_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut sk_bytes);
    let sk = SigningKey::from_bytes(&sk_bytes);
    let pk = sk.verifying_key();

    fs::write(out_dir.join("sk.hex"), hex::encode(sk_bytes))?;
    fs::write(out_dir.join("pk.hex"), hex::encode(pk.as_bytes()))?;
    println!("{}", AccountId::new(pk.to_bytes()));
    info!(out_dir = %out_dir.display(), "keypair written");
    Ok(())
}

fn parse_sk_hex(sk_hex: &str) -> Result<SigningKey> {
    let bytes = hex::decode(sk_hex.trim()).context("invalid sk-hex")?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("sk-hex must be 32 bytes (64 hex chars)"))?;
    Ok(SigningKey::from_bytes(&arr))
}

fn init_cmd(config_path: &Path, state_path: &Path, force: bool) -> Result<()> {
    if state_path.exists() && !force {
        bail!(
            "{} already exists (pass --force to overwrite)",
            state_path.display()
        );
    }
    let config = load_config(config_path)?;
    let ledger = IssuanceLedger::from_config(&config)?;
    StateFile::new(&ledger).save(state_path)?;
    info!(
        administrator = %ledger.owner(),
        total_supply = %format_units(ledger.total_supply()),
        phase = %ledger.phase(),
        "ledger initialised"
    );
    Ok(())
}

fn sign_cmd(sk_hex: &str, nonce: u64, op_json: &str) -> Result<()> {
    let sk = parse_sk_hex(sk_hex)?;
    let operation: Operation = serde_json::from_str(op_json).context("parse --op")?;
    let request = SignedRequest::sign(&sk, nonce, operation)?;
    println!("{}", serde_json::to_string(&request)?);
    Ok(())
}

fn apply_cmd(state_path: &Path, requests_path: &Path) -> Result<()> {
    let mut state = StateFile::load(state_path)?;
    let mut ledger = state.restore()?;
    let input = fs::read_to_string(requests_path)
        .with_context(|| format!("read requests {}", requests_path.display()))?;

    let summary = apply_requests(&mut state, &mut ledger, &input)?;

    state.ledger = ledger.snapshot();
    state.save(state_path)?;
    info!(
        applied = summary.applied,
        rejected = summary.rejected,
        stale = summary.stale,
        height = ledger.height(),
        total_supply = %format_units(ledger.total_supply()),
        "requests processed"
    );
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ApplySummary {
    applied: usize,
    rejected: usize,
    stale: usize,
}

/// Apply JSON-line requests in order.
///
/// A request whose signature verifies consumes its nonce even when the ledger
/// rejects the operation, so it can never be replayed later.
fn apply_requests(
    state: &mut StateFile,
    ledger: &mut IssuanceLedger,
    input: &str,
) -> Result<ApplySummary> {
    let mut log = TracingSink;
    let mut summary = ApplySummary::default();
    for (idx, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lineno = idx + 1;
        let request: SignedRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(err) => {
                warn!(line = lineno, %err, "unparseable request skipped");
                summary.rejected += 1;
                continue;
            }
        };
        if let Err(err) = request.verify() {
            warn!(line = lineno, %err, "request signature rejected");
            summary.rejected += 1;
            continue;
        }
        if !state.is_fresh(&request.caller, request.nonce) {
            info!(
                line = lineno,
                caller = %request.caller,
                nonce = request.nonce,
                "stale nonce, request skipped"
            );
            summary.stale += 1;
            continue;
        }
        state.consume(request.caller, request.nonce);

        let mut events: Vec<LedgerEvent> = Vec::new();
        if let Err(err) = ledger.apply(&request.caller, &request.operation, &mut events) {
            warn!(
                line = lineno,
                caller = %request.caller,
                op = request.operation.name(),
                kind = ?err.kind(),
                %err,
                "request rejected"
            );
            summary.rejected += 1;
            continue;
        }
        for event in events {
            println!("{}", serde_json::to_string(&event)?);
            log.record(event);
        }
        summary.applied += 1;
    }
    Ok(summary)
}

fn show_cmd(state_path: &Path, account: Option<&AccountId>) -> Result<()> {
    let ledger = StateFile::load(state_path)?.restore()?;
    let token = ledger.token();
    let policy = ledger.policy();

    println!("token:            {} ({}), {} decimals", token.name, token.symbol, token.decimals);
    println!("administrator:    {}", ledger.owner());
    println!("height:           {}", ledger.height());
    println!("phase:            {}", ledger.phase());
    println!("total supply:     {}", format_units(ledger.total_supply()));
    println!("remaining:        {}", format_units(policy.remaining(ledger.total_supply())));
    println!("minting finished: {}", ledger.minting_finished());
    println!("owner mint limit: {}", format_units(policy.owner_mint_limit));
    println!("owner mint cap:   {}", format_units(policy.owner_mint_cap));
    println!("self mint limit:  {}", format_units(policy.self_mint_limit));
    println!("supply cap:       {}", format_units(policy.total_supply_cap));

    if let Some(account) = account {
        println!();
        println!("account:          {account}");
        println!("balance:          {}", format_units(ledger.balance_of(account)));
        println!("owner minted:     {}", format_units(ledger.owner_mint_count(account)));
        println!("self minted:      {}", format_units(ledger.self_mint_count(account)));
        println!("administrator:    {}", ledger.is_administrator(account));
    }
    Ok(())
}

fn verify_cmd(state_path: &Path) -> Result<()> {
    let ledger = StateFile::load(state_path)?.restore()?;
    println!(
        "verify: OK (height {}, state root {})",
        ledger.height(),
        hex::encode(ledger.state_root())
    );
    Ok(())
}
