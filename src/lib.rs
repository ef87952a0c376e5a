//! Ethereum node JSON-RPC client
//!
//! Formats calls as JSON-RPC 2.0 envelopes, posts them to a node over HTTP and
//! classifies each outcome as a result, a node-reported [`RpcError::Protocol`]
//! error, or a [`RpcError::Transport`] failure. The [`units`] module converts
//! between hex wei quantities and exact ether amounts.
//!
//! ```no_run
//! use ethereumd::{Callbacks, EthRpcClient};
//!
//! # async fn run() -> ethereumd::Result<()> {
//! let client = EthRpcClient::from_url("http://127.0.0.1:8545")?;
//!
//! let balance = client.get_balance("0x00000000219ab540356cbb839cbe05303d7705fa", "latest").await?;
//! println!("{} ETH", balance);
//!
//! let chain_id = client.call("eth_chainId", ()).await?;
//! println!("chain id {}", chain_id.result());
//!
//! let pending = client.call_async(
//!     "eth_gasPrice",
//!     (),
//!     Callbacks::new().on_success(|r| println!("gas price {}", r.result())),
//! );
//! pending.await.ok();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod rpc_client;
pub mod types;
pub mod units;

pub use config::{Config, Scheme};
pub use error::{Result, RpcError};
pub use ethnum::U256;
pub use rpc_client::{Callbacks, Dispatch, EthRpcClient};
pub use types::{ErrorObject, RpcRequest, RpcResponse};
pub use units::{decode_hex, encode_hex, ether_to_wei, wei_to_ether, Ether};
