//! Wallet balance provider: the capability that answers native-currency
//! balance queries for an address. Availability depends on the environment,
//! so callers probe it with [`BalanceProvider::is_available`] before use.

use std::future::Future;

use alloy::{
    primitives::U256,
    providers::{DynProvider, Provider},
};

use crate::alloy::{format_native_balance, StringExt};

pub trait BalanceProvider: Send + Sync + 'static {
    fn is_available(&self) -> bool;

    /// Native balance of `address` in the smallest unit (wei).
    fn native_balance(&self, address: &str) -> impl Future<Output = crate::Result<U256>> + Send;
}

/// Balance provider backed by a JSON-RPC endpoint. Without an RPC URL the
/// capability is absent.
#[derive(Clone, Default)]
pub struct RpcBalanceProvider {
    provider: Option<DynProvider>,
}

impl RpcBalanceProvider {
    pub fn new(rpc_url: Option<&str>) -> crate::Result<Self> {
        let provider = rpc_url.map(|url| url.to_alloy_provider()).transpose()?;
        Ok(Self { provider })
    }
}

impl BalanceProvider for RpcBalanceProvider {
    fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    async fn native_balance(&self, address: &str) -> crate::Result<U256> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(crate::Error::ProviderUnavailable)?;
        let owner = address.parse_as_address()?;

        provider
            .get_balance(owner)
            .await
            .map_err(|error| crate::Error::BalanceQueryFailed {
                address: address.to_string(),
                error: Box::new(error),
            })
    }
}

/// Fetches the native balance of `address` as a decimal ether string.
pub async fn fetch_balance<P: BalanceProvider>(provider: &P, address: &str) -> crate::Result<String> {
    if !provider.is_available() {
        return Err(crate::Error::ProviderUnavailable);
    }

    provider
        .native_balance(address)
        .await
        .map(format_native_balance)
}
