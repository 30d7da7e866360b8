//! EIP-6963 wire types and the EIP-1193 provider handle.
//!
//! Field names on [`ProviderInfo`] and [`RequestArguments`] follow the
//! standardized schema exactly; they must not be renamed at the wire boundary.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// EIP-1193 `ProviderRpcError`.
///
/// Wallets reject requests with this shape. The broker never produces one, it
/// only forwards handles whose futures may resolve to it.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("provider rpc error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProviderRpcError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const CHAIN_DISCONNECTED: i64 = 4901;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(Self::USER_REJECTED, "User Rejected Request")
    }

    pub fn unauthorized() -> Self {
        Self::new(Self::UNAUTHORIZED, "Unauthorized")
    }

    pub fn unsupported_method(method: &str) -> Self {
        Self::new(
            Self::UNSUPPORTED_METHOD,
            format!("Unsupported Method: {method}"),
        )
    }

    pub fn disconnected() -> Self {
        Self::new(Self::DISCONNECTED, "Disconnected")
    }

    pub fn chain_disconnected() -> Self {
        Self::new(Self::CHAIN_DISCONNECTED, "Chain Disconnected")
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

// ---------------------------------------------------------------------------
// Announcement metadata
// ---------------------------------------------------------------------------

/// Metadata a wallet extension reports about itself.
///
/// `uuid` is regenerated by the wallet on every announcement cycle; use
/// `rdns` as the stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub uuid: String,
    pub name: String,
    /// Icon as a URI, normally an RFC-2397 data URI.
    pub icon: String,
    /// Reverse-DNS identifier, e.g. `io.metamask`.
    pub rdns: String,
}

impl ProviderInfo {
    /// Parse the icon as a URI.
    pub fn icon_uri(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.icon)
    }
}

// ---------------------------------------------------------------------------
// Request arguments
// ---------------------------------------------------------------------------

/// `params` of an EIP-1193 request: an ordered sequence or a keyed mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestParams {
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

/// Argument to [`Eip1193Provider::request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
}

impl RequestArguments {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
        }
    }

    pub fn with_array(mut self, params: Vec<Value>) -> Self {
        self.params = Some(RequestParams::Array(params));
        self
    }

    pub fn with_object(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(RequestParams::Object(params));
        self
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// The EIP-1193 provider interface a wallet hands out in its announcement.
///
/// This crate does not implement any RPC method. Handles are opaque to the
/// broker: it stores and forwards them to the caller, who picks one and talks
/// to the wallet through it.
pub trait Eip1193Provider: Send + Sync {
    fn request(
        &self,
        args: RequestArguments,
    ) -> impl Future<Output = Result<Value, ProviderRpcError>> + Send;
}

/// Boxed future returned by [`Eip1193ProviderDyn::request_dyn`].
pub type RequestFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Value, ProviderRpcError>> + Send + 'a>>;

/// Object-safe version of [`Eip1193Provider`], using boxed futures.
///
/// Auto-implemented for every `T: Eip1193Provider + 'static`.
pub trait Eip1193ProviderDyn: Send + Sync {
    fn request_dyn(&self, args: RequestArguments) -> RequestFuture<'_>;
}

impl<T: Eip1193Provider + 'static> Eip1193ProviderDyn for T {
    fn request_dyn(&self, args: RequestArguments) -> RequestFuture<'_> {
        Box::pin(self.request(args))
    }
}

/// Shared, type-erased provider handle.
pub type ProviderHandle = Arc<dyn Eip1193ProviderDyn>;

// ---------------------------------------------------------------------------
// Provider detail
// ---------------------------------------------------------------------------

/// Payload of an `announceProvider` event: `{ info, provider }`.
#[derive(Clone)]
pub struct ProviderDetail {
    pub info: ProviderInfo,
    pub provider: ProviderHandle,
}

impl ProviderDetail {
    pub fn new(info: ProviderInfo, provider: ProviderHandle) -> Self {
        Self { info, provider }
    }

    pub fn rdns(&self) -> &str {
        &self.info.rdns
    }

    /// Whether both records come from the same wallet, across cycles.
    pub fn same_wallet(&self, other: &ProviderDetail) -> bool {
        self.info.rdns == other.info.rdns
    }
}

impl fmt::Debug for ProviderDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDetail")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Keep the first record per `rdns`, in receipt order.
pub fn unique_by_rdns(details: &[ProviderDetail]) -> Vec<ProviderDetail> {
    let mut seen = HashSet::new();
    details
        .iter()
        .filter(|d| seen.insert(d.rdns().to_string()))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
