//! Ethereum JSON-RPC client

use ethnum::U256;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Result, RpcError};
use crate::types::{RpcRequest, RpcResponse};
use crate::units::{self, Ether};

type SuccessCallback = Box<dyn FnOnce(&RpcResponse) + Send>;
type FailureCallback = Box<dyn FnOnce(&RpcError) + Send>;

/// Optional continuations for [`EthRpcClient::request_async`].
///
/// At most one of them runs, once, when the exchange settles.
#[derive(Default)]
pub struct Callbacks {
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, f: impl FnOnce(&RpcResponse) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_failure(mut self, f: impl FnOnce(&RpcError) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(f));
        self
    }

    fn settle(self, outcome: &Result<RpcResponse>) {
        match outcome {
            Ok(response) => {
                if let Some(f) = self.on_success {
                    f(response);
                }
            }
            Err(err) => {
                if let Some(f) = self.on_failure {
                    f(err);
                }
            }
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// Outcome of [`EthRpcClient::dispatch`]
#[derive(Debug)]
pub enum Dispatch {
    Completed(Result<RpcResponse>),
    Pending(JoinHandle<Result<RpcResponse>>),
}

/// Ethereum RPC client
///
/// Clones share the transport and the request id counter.
#[derive(Debug, Clone)]
pub struct EthRpcClient {
    client: Client,
    config: Config,
    endpoint: Url,
    request_id: Arc<AtomicU64>,
}

impl EthRpcClient {
    /// Create a new RPC client
    pub fn new(config: Config) -> Result<Self> {
        let endpoint = config.base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RpcError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            endpoint,
            request_id: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Create a client from a connection URL such as `http://127.0.0.1:8545`
    pub fn from_url(url: &str) -> Result<Self> {
        Self::new(Config::from_url(url)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn transport(&self) -> &Client {
        &self.client
    }

    /// Replace the HTTP transport, e.g. with one carrying custom middleware
    pub fn set_transport(&mut self, client: Client) -> &mut Self {
        self.client = client;
        self
    }

    /// Id of the most recently built request, 0 before the first one
    pub fn current_id(&self) -> u64 {
        self.request_id.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn envelope<P: Serialize>(&self, method: &str, params: P) -> Result<RpcRequest> {
        let params = serde_json::to_value(params)?;
        Ok(RpcRequest::new(method, params, self.next_id()))
    }

    /// Make a JSON-RPC call and wait for its outcome
    pub async fn request<P: Serialize>(&self, method: &str, params: P) -> Result<RpcResponse> {
        let request = self.envelope(method, params)?;
        self.send(request).await
    }

    /// Start a JSON-RPC call in the background and return immediately.
    ///
    /// Must be called from within a Tokio runtime. The returned handle yields
    /// the same outcome that was handed to `callbacks`.
    pub fn request_async<P: Serialize>(
        &self,
        method: &str,
        params: P,
        callbacks: Callbacks,
    ) -> JoinHandle<Result<RpcResponse>> {
        let request = self.envelope(method, params);
        let client = self.clone();

        tokio::spawn(async move {
            let outcome = match request {
                Ok(request) => client.send(request).await,
                Err(err) => Err(err),
            };
            callbacks.settle(&outcome);
            outcome
        })
    }

    /// Call any RPC method by name
    pub async fn call<P: Serialize>(&self, method: &str, params: P) -> Result<RpcResponse> {
        self.request(method, params).await
    }

    /// Call any RPC method by name without waiting
    pub fn call_async<P: Serialize>(
        &self,
        method: &str,
        params: P,
        callbacks: Callbacks,
    ) -> JoinHandle<Result<RpcResponse>> {
        self.request_async(method, params, callbacks)
    }

    /// Call a method by name, going through the async path when the name
    /// carries an `Async` suffix (matched case-insensitively), so that
    /// `eth_getBalanceAsync` runs `eth_getBalance` in the background.
    pub async fn dispatch<P: Serialize>(&self, name: &str, params: P) -> Dispatch {
        match strip_async_suffix(name) {
            Some(method) => Dispatch::Pending(self.call_async(method, params, Callbacks::new())),
            None => Dispatch::Completed(self.call(name, params).await),
        }
    }

    async fn send(&self, request: RpcRequest) -> Result<RpcResponse> {
        debug!("Sending {} (id={})", request.method, request.id);

        let outcome = self.exchange(&request).await;
        if let Err(e) = &outcome {
            warn!("{} (id={}) failed: {}", request.method, request.id, e);
        }
        outcome
    }

    async fn exchange(&self, request: &RpcRequest) -> Result<RpcResponse> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        // A decodable error body wins over the HTTP status
        match RpcResponse::from_slice(&body, status.as_u16()) {
            Ok(decoded) if decoded.is_error() => decoded.into_outcome(),
            Ok(decoded) if status.is_success() && decoded.has_result() => Ok(decoded),
            Ok(_) if status.is_success() => Err(RpcError::Transport {
                message: format!("HTTP status {}, body has neither result nor error", status),
                status: Some(status.as_u16()),
            }),
            Ok(_) => Err(RpcError::Transport {
                message: format!("HTTP status {}", status),
                status: Some(status.as_u16()),
            }),
            Err(e) => Err(RpcError::Transport {
                message: format!("HTTP status {}, undecodable body: {}", status, e),
                status: Some(status.as_u16()),
            }),
        }
    }

    /// Get the latest block number
    pub async fn block_number(&self) -> Result<U256> {
        let hex: String = self.request("eth_blockNumber", ()).await?.result_as()?;
        units::decode_hex(&hex)
    }

    /// Get the balance of an address at a block tag such as `latest`
    pub async fn get_balance(&self, address: &str, block: &str) -> Result<Ether> {
        let hex: String = self
            .request("eth_getBalance", (address, block))
            .await?
            .result_as()?;
        units::wei_to_ether(&hex)
    }

    pub fn wei_to_ether(&self, wei_hex: &str) -> Result<Ether> {
        units::wei_to_ether(wei_hex)
    }

    pub fn ether_to_wei(&self, ether: Ether) -> String {
        units::ether_to_wei(ether)
    }

    pub fn decode_hex(&self, input: &str) -> Result<U256> {
        units::decode_hex(input)
    }

    pub fn encode_hex(&self, value: impl Into<U256>) -> String {
        units::encode_hex(value)
    }
}

fn strip_async_suffix(name: &str) -> Option<&str> {
    const SUFFIX: &str = "async";

    let split = name.len().checked_sub(SUFFIX.len()).filter(|&i| i > 0)?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (method, suffix) = name.split_at(split);
    suffix.eq_ignore_ascii_case(SUFFIX).then_some(method)
}
