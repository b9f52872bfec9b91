//! Command line arguments

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "funifier-lottery",
    version,
    about = "Query lottery winners and participants from the Funifier API",
    long_about = "Query lottery winners and participants from the Funifier API.\n\n\
                  Results are printed as a table and exported to CSV."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Funifier API key
    #[arg(long, env = "FUNIFIER_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Funifier application secret
    #[arg(long, env = "FUNIFIER_APP_SECRET", hide_env_values = true, global = true)]
    pub secret: Option<String>,

    /// JSON configuration variable holding an APIConfigsDTO
    #[arg(long, value_name = "FILE", global = true)]
    pub config_var: Option<PathBuf>,

    /// Settings file (default: the per-user config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Override the API host
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override the API version
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Do not print result tables
    #[arg(long, global = true)]
    pub no_table: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Export the winners of a lottery with their addresses
    Winners(WinnersArgs),

    /// Count (or list) the participants of a lottery ticket
    Participants(ParticipantsArgs),

    /// Count the winners of a lottery
    WinnersCount(WinnersCountArgs),

    /// Count the tickets a player holds
    PlayerTickets(PlayerTicketsArgs),

    /// List the most recent lottery UIDs
    LotteryUids(LotteryUidsArgs),

    /// List the lotteries created between two dates
    Lotteries(LotteriesArgs),

    /// Write a commented settings file
    GenerateConfig(GenerateConfigArgs),
}

#[derive(Args)]
pub struct WinnersArgs {
    #[arg(long)]
    pub lottery_uid: String,

    #[arg(long)]
    pub ticket_uid: String,

    /// CSV path (default: <LOTTERY_UID>.csv in the export directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also count the ticket's participants
    #[arg(long)]
    pub with_count: bool,
}

#[derive(Args)]
pub struct ParticipantsArgs {
    #[arg(long)]
    pub ticket_uid: String,

    /// Only consider the last N days
    #[arg(long, value_name = "N")]
    pub days: Option<u32>,

    /// List participants instead of counting them
    #[arg(long)]
    pub list: bool,

    /// CSV path for the participant list
    #[arg(short, long, value_name = "PATH", requires = "list")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct WinnersCountArgs {
    #[arg(long)]
    pub lottery_uid: String,

    /// Only consider the last N days
    #[arg(long, value_name = "N")]
    pub days: Option<u32>,
}

#[derive(Args)]
pub struct PlayerTicketsArgs {
    #[arg(long)]
    pub player_uid: String,

    #[arg(long)]
    pub ticket_uid: String,
}

#[derive(Args)]
pub struct LotteryUidsArgs {
    /// Number of lottery entries to read
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub last: u32,

    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct LotteriesArgs {
    /// First day, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub from: String,

    /// Last day, YYYY-MM-DD
    #[arg(long, value_name = "DATE")]
    pub to: String,

    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct GenerateConfigArgs {
    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_winners() {
        let cli = Cli::try_parse_from([
            "funifier-lottery",
            "--api-key",
            "key",
            "--secret",
            "secret",
            "winners",
            "--lottery-uid",
            "L1",
            "--ticket-uid",
            "TK1",
            "--with-count",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("key"));
        match cli.command {
            Command::Winners(args) => {
                assert_eq!(args.lottery_uid, "L1");
                assert_eq!(args.ticket_uid, "TK1");
                assert!(args.with_count);
                assert!(args.output.is_none());
            }
            _ => panic!("expected winners"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "funifier-lottery",
            "winners-count",
            "--lottery-uid",
            "L1",
            "--days",
            "0",
            "-vv",
            "--no-table",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_table);
        match cli.command {
            Command::WinnersCount(args) => assert_eq!(args.days, Some(0)),
            _ => panic!("expected winners-count"),
        }
    }

    #[test]
    fn test_missing_lottery_uid_is_rejected() {
        assert!(Cli::try_parse_from(["funifier-lottery", "winners", "--ticket-uid", "TK1"]).is_err());
    }
}
