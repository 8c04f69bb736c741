use chrono::NaiveDate;
use console::style;
use hb_common::series::{BalanceSample, DisplayPoint};
use hb_utils::{
    alloy::StringExt,
    config::Config,
    disk_storage::DiskStorageInterface,
    historic_balances::{
        downsample, local_midnight,
        series_fetcher::SeriesRequest,
        BalanceSeriesFetcher, BlockResolver, RpcChainReader, SeriesReport,
    },
    network::{Network, NetworkStore},
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cli::{BlockArgs, Commands, ConfigArgs, HistoryArgs};

const DEFAULT_NETWORK: &str = "Mainnet";

pub async fn handle(cmd: Commands) -> hb_utils::Result<()> {
    match cmd {
        Commands::History(args) => history(args).await,
        Commands::Block(args) => block(args).await,
        Commands::Config(args) => config(args),
    }
}

fn network(name: Option<String>, config: &Config) -> hb_utils::Result<Network> {
    let name = name
        .or_else(|| config.network.clone())
        .unwrap_or_else(|| DEFAULT_NETWORK.to_string());
    Network::from_name(&name)
}

/// Cancelled on Ctrl-C, so a long fetch can be abandoned cleanly.
fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_clone.cancel();
        }
    });
    cancel
}

async fn history(args: HistoryArgs) -> hb_utils::Result<()> {
    let config = Config::load()?;
    let network = network(args.network, &config)?;
    let wallet = match args.wallet {
        Some(wallet) => wallet,
        None => config.get_wallet()?.to_string(),
    };

    let (token, listed) = network.resolve_token(&args.token)?;
    let symbol = listed
        .as_ref()
        .map(|t| t.symbol.clone())
        .unwrap_or_else(|| token.to_string());

    let mut request = SeriesRequest::new(&token.to_string(), &wallet, args.from, args.to);
    if let Some(listed) = &listed {
        request = request.with_decimals(listed.decimals);
    }

    let fetcher = BalanceSeriesFetcher::new(
        RpcChainReader::from_network(&network)?,
        config.history.fetch_options()?,
    );
    let report = fetcher
        .fetch_until_cancelled(&request, &ctrl_c_token())
        .await?;

    let chart = args
        .chart
        .then(|| downsample(&report.samples, config.history.downsample_options()));

    if args.json {
        let view = ReportView::new(&network, &symbol, &wallet, &report, chart.as_deref());
        println!("{}", to_json(&view)?);
        return Ok(());
    }

    match chart {
        Some(points) => {
            for point in points {
                println!("{}  {} {symbol}", point.date, point.balance);
            }
        }
        None => {
            println!("{} {symbol} held by {wallet} on {network}", style("Balance of").dim());
            for sample in &report.samples {
                println!("{sample}");
            }
        }
    }

    for failure in &report.failures {
        eprintln!(
            "{} no balance for {}: {}",
            style("warning:").yellow(),
            failure.date,
            failure.reason
        );
    }

    Ok(())
}

async fn block(args: BlockArgs) -> hb_utils::Result<()> {
    let config = Config::load()?;
    let network = network(args.network, &config)?;
    let options = config.history.fetch_options()?;

    let reader = RpcChainReader::from_network(&network)?;
    let resolver = BlockResolver::new(&reader, options.read_policy);
    let target = local_midnight(args.date, options.utc_offset)?;

    let number = resolver
        .resolve_block_at_or_before(target)
        .await?
        .ok_or(hb_utils::Error::TargetBeforeGenesis { target })?;

    println!(
        "{number} is the last block on {network} at or before {}",
        target.with_timezone(&options.utc_offset).to_rfc3339()
    );
    Ok(())
}

fn config(args: ConfigArgs) -> hb_utils::Result<()> {
    if let Some(wallet) = args.wallet {
        Config::set_wallet(wallet.parse_as_address()?)?;
    }

    if let Some(name) = args.network {
        let store = NetworkStore::load_and_update()?;
        let network = store
            .get_by_name(&name)
            .ok_or(hb_utils::Error::NetworkNotFound(name))?;
        Config::set_network(network.name)?;
    }

    let config = Config::load()?;
    println!("{}", style(Config::path()?.display()).dim());
    println!(
        "{}",
        toml::to_string_pretty(&config)
            .map_err(|e| hb_utils::Error::TomlFormattingFailed(format!("{config:?}"), e))?
    );
    println!("{}", style(NetworkStore::path()?.display()).dim());
    for network in NetworkStore::load_and_update()?.networks {
        println!("{network}");
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> hb_utils::Result<String> {
    serde_json::to_string_pretty(value).map_err(hb_utils::Error::JsonFormattingFailed)
}

#[derive(Serialize)]
struct ReportView<'a> {
    network: &'a str,
    chain_id: u32,
    token: &'a str,
    wallet: &'a str,
    samples: &'a [BalanceSample],
    failures: Vec<FailureView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    chart: Option<&'a [DisplayPoint]>,
}

#[derive(Serialize)]
struct FailureView {
    date: NaiveDate,
    reason: String,
}

impl<'a> ReportView<'a> {
    fn new(
        network: &'a Network,
        token: &'a str,
        wallet: &'a str,
        report: &'a SeriesReport,
        chart: Option<&'a [DisplayPoint]>,
    ) -> Self {
        Self {
            network: &network.name,
            chain_id: network.chain_id,
            token,
            wallet,
            samples: &report.samples,
            failures: report
                .failures
                .iter()
                .map(|failure| FailureView {
                    date: failure.date,
                    reason: failure.reason.to_string(),
                })
                .collect(),
            chart,
        }
    }
}
