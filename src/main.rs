//! Ethereum node JSON-RPC command line client
//!
//! ```text
//! ethereumd <method> [params...]       call any RPC method, e.g. eth_getBalance 0x.. latest
//! ethereumd <method>Async [params...]  same, through the background path
//! ethereumd wei-to-ether <hex>
//! ethereumd ether-to-wei <decimal>
//! ```

use anyhow::Context;
use ethereumd::{Config, Dispatch, Ether, EthRpcClient};
use serde_json::Value;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const USAGE: &str = "usage: ethereumd <method> [params...] | wei-to-ether <hex> | ether-to-wei <decimal>";
const DEFAULT_HOST: &str = "localhost";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout only carries results
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let command = args.next().context(USAGE)?;
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "wei-to-ether" => {
            let hex = single_arg(&rest)?;
            println!("{}", ethereumd::wei_to_ether(hex)?);
        }
        "ether-to-wei" => {
            let ether: Ether = single_arg(&rest)?.parse()?;
            println!("{}", ethereumd::ether_to_wei(ether));
        }
        method => run_method(method, &rest).await?,
    }

    Ok(())
}

/// Resolve the endpoint from `ETHEREUMD_URL`, or from
/// `ETHEREUMD_SCHEME` / `ETHEREUMD_HOST` / `ETHEREUMD_PORT`
fn config_from_env() -> anyhow::Result<Config> {
    config_from_vars(|key| std::env::var(key).ok())
}

fn config_from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    if let Some(url) = var("ETHEREUMD_URL") {
        return Ok(Config::from_url(&url)?);
    }

    let mut config = Config {
        host: DEFAULT_HOST.to_string(),
        ..Config::default()
    };
    if let Some(scheme) = var("ETHEREUMD_SCHEME") {
        config.scheme = scheme.parse()?;
    }
    if let Some(host) = var("ETHEREUMD_HOST") {
        config.host = host;
    }
    if let Some(port) = var("ETHEREUMD_PORT") {
        config.port = port
            .parse()
            .with_context(|| format!("invalid ETHEREUMD_PORT: {}", port))?;
    }
    Ok(config)
}

async fn run_method(name: &str, args: &[String]) -> anyhow::Result<()> {
    let client = EthRpcClient::new(config_from_env()?)?;
    info!("RPC endpoint: {}", client.endpoint());

    let params: Vec<Value> = args.iter().map(|arg| parse_param(arg)).collect();

    let response = match client.dispatch(name, params).await {
        Dispatch::Completed(outcome) => outcome?,
        Dispatch::Pending(handle) => {
            info!("Dispatched {} in the background", name);
            handle.await??
        }
    };

    println!("{}", serde_json::to_string_pretty(response.result())?);
    Ok(())
}

fn single_arg(args: &[String]) -> anyhow::Result<&str> {
    match args {
        [arg] => Ok(arg.as_str()),
        _ => anyhow::bail!(USAGE),
    }
}

/// JSON literals pass through, anything else is sent as a string
fn parse_param(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}
