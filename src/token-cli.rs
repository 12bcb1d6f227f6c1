//! A small CLI tool for minting and checking voter token payloads.
//! This reads the same store directory as the server, so the payloads it
//! prints are exactly those the server accepts.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, ArgMatches, Command};

use pemilu_backend::model::{
    election::Election,
    id::Id,
    identity::{LoginError, Operators},
    store::FileStore,
    token::{self, TokenClaim},
};

const PROGRAM_NAME: &str = "token-cli";

const ABOUT_TEXT: &str = "Mint and inspect voter token payloads.

EXIT CODES:
     0: Success.
   255: Ran successfully, but the token was rejected.
 Other: Error.";

const STORE: &str = "STORE";
const VOTER_ID: &str = "VOTER_ID";
const PAYLOAD: &str = "PAYLOAD";

const STORE_HELP: &str = "The election store directory, as configured by `store_path`";

const PAYLOAD_HELP: &str = "A file holding the scanned payload, or `-` for standard input";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    let store = Arg::new(STORE)
        .long("store")
        .help(STORE_HELP)
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set);

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .subcommand_required(true)
        .subcommand(
            Command::new("mint")
                .about("Print the token payload for a registered voter")
                .arg(store.clone().required(true))
                .arg(Arg::new(VOTER_ID).action(ArgAction::Set).required(true)),
        )
        .subcommand(
            Command::new("inspect")
                .about("Decode a payload, and check it against a store if one is given")
                .arg(store)
                .arg(
                    Arg::new(PAYLOAD)
                        .help(PAYLOAD_HELP)
                        .action(ArgAction::Set)
                        .required(true),
                ),
        )
}

/// Errors that this program may produce.
#[derive(Debug, Eq, PartialEq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// The store could not be read, or the voter does not exist.
    Store(String),
    /// The token was rejected for the contained reason.
    Rejected(LoginError),
}

fn open(store: &Path) -> Result<Election, Error> {
    let store = FileStore::open(store).map_err(|e| Error::Store(e.to_string()))?;
    Election::open(Box::new(store), Operators::default()).map_err(|e| Error::Store(e.to_string()))
}

/// Mint the payload for one voter.
fn mint(store: &Path, voter_id: &str) -> Result<String, Error> {
    open(store)?
        .voter_token(&Id::from(voter_id))
        .map_err(|e| Error::Store(e.to_string()))
}

/// Decode a payload and, given a store, check whether it would log in.
fn inspect(raw: &str, store: Option<&Path>) -> Result<TokenClaim, Error> {
    let claim = token::decode(raw).map_err(|e| Error::Rejected(e.into()))?;
    if let Some(store) = store {
        open(store)?
            .login_with_token(raw)
            .map_err(Error::Rejected)?;
    }
    Ok(claim)
}

fn read_payload(source: &str) -> Result<String, Error> {
    if source == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .map_err(|e| Error::IO(e.to_string()))?;
        Ok(raw)
    } else {
        fs::read_to_string(source).map_err(|e| Error::IO(e.to_string()))
    }
}

fn describe(claim: &TokenClaim) {
    let unknown = "-".to_string();
    println!("Unique ID:  {}", claim.unique_id);
    println!("NISN:       {}", claim.nisn.as_ref().unwrap_or(&unknown));
    println!("Name:       {}", claim.full_name.as_ref().unwrap_or(&unknown));
    println!("Username:   {}", claim.username.as_ref().unwrap_or(&unknown));
    println!("Born in:    {}", claim.birth_place.as_ref().unwrap_or(&unknown));
    println!("Born on:    {}", claim.birth_date.as_ref().unwrap_or(&unknown));
}

/// Run the chosen subcommand, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let result = match args.subcommand() {
        Some(("mint", args)) => {
            // Required arguments are guaranteed to be present.
            let store: &PathBuf = args.get_one(STORE).unwrap();
            let voter_id: &String = args.get_one(VOTER_ID).unwrap();
            mint(store, voter_id).map(|payload| println!("{payload}"))
        }
        Some(("inspect", args)) => {
            let store = args.get_one::<PathBuf>(STORE).map(PathBuf::as_path);
            let source: &String = args.get_one(PAYLOAD).unwrap();
            read_payload(source)
                .and_then(|raw| inspect(&raw, store))
                .map(|claim| {
                    describe(&claim);
                    if store.is_some() {
                        println!("Token accepted.");
                    }
                })
        }
        _ => unreachable!("a subcommand is required"),
    };

    match result {
        Ok(()) => 0,
        Err(Error::IO(msg)) => {
            println!("IO error: {msg}");
            1
        }
        Err(Error::Store(msg)) => {
            println!("Store error: {msg}");
            1
        }
        Err(Error::Rejected(err)) => {
            println!("Token rejected: {err}");
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use pemilu_backend::model::{seed::BUDI_TOKEN, token::MalformedToken};

    use super::*;

    fn seeded_store() -> PathBuf {
        let random: u32 = rand::random();
        let dir = std::env::temp_dir().join(format!("pemilu-token-cli-{random}"));
        open(&dir).unwrap().seed_demo().unwrap();
        dir
    }

    #[test]
    fn mint_and_inspect() {
        // This test actually enters backend code, so enable logging.
        log4rs_test_utils::test_logging::init_logging_once_for(["pemilu_backend"], None, None);

        let dir = seeded_store();
        assert_eq!(Ok(BUDI_TOKEN.to_string()), mint(&dir, "3"));
        assert!(matches!(mint(&dir, "42"), Err(Error::Store(_))));

        let claim = inspect(BUDI_TOKEN, Some(&dir)).unwrap();
        assert_eq!(Some("Budi Santoso".to_string()), claim.full_name);

        // Sari is registered but not verified.
        let sari = mint(&dir, "2").unwrap();
        assert_eq!(
            Err(Error::Rejected(LoginError::NotVerified("Sari Dewi".to_string()))),
            inspect(&sari, Some(&dir))
        );
        // Without a store only the payload itself is checked.
        assert!(inspect(&sari, None).is_ok());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn malformed_payload() {
        assert_eq!(
            Err(Error::Rejected(LoginError::Token(MalformedToken::MissingUniqueId))),
            inspect("Nama: Budi Santoso", None)
        );
    }
}
