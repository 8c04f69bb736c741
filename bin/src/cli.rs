use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(version, subcommand_required = true, arg_required_else_help = true)]
#[command(name = "hb", bin_name = "hb", version)]
#[command(about = "Daily ERC-20 balance history of a wallet")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Balance of a wallet for every day of a date range
    #[command(alias = "h")]
    History(HistoryArgs),

    /// Last block produced at or before local midnight of a date
    #[command(alias = "b")]
    Block(BlockArgs),

    /// Show or change the stored defaults
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Token symbol from the network's token list, or a contract address
    #[arg(short, long)]
    pub token: String,

    /// Wallet address, defaults to the wallet in the config
    #[arg(short, long, env = "HB_WALLET")]
    pub wallet: Option<String>,

    /// Network name, defaults to the network in the config or Mainnet
    #[arg(short, long)]
    pub network: Option<String>,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Print the series reduced for charting
    #[arg(long)]
    pub chart: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BlockArgs {
    /// Day (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: NaiveDate,

    #[arg(short, long)]
    pub network: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Set the default wallet
    #[arg(long)]
    pub wallet: Option<String>,

    /// Set the default network
    #[arg(long)]
    pub network: Option<String>,
}
