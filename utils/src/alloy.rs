use alloy::{
    primitives::{utils::format_ether, Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
};
use url::Url;

pub trait StringExt {
    fn parse_as_address(&self) -> crate::Result<Address>;

    fn parse_as_url(&self) -> crate::Result<Url>;

    fn to_alloy_provider(&self) -> crate::Result<DynProvider>;
}

impl StringExt for str {
    fn parse_as_address(&self) -> crate::Result<Address> {
        self.trim()
            .parse::<Address>()
            .map_err(|_| crate::Error::InvalidAddress(self.to_string()))
    }

    fn parse_as_url(&self) -> crate::Result<Url> {
        self.parse()
            .map_err(|e| crate::Error::UrlParsingFailed(self.to_string(), e))
    }

    fn to_alloy_provider(&self) -> crate::Result<DynProvider> {
        self.parse_as_url()
            .map(|rpc_url| ProviderBuilder::new().connect_http(rpc_url).erased())
    }
}

impl StringExt for String {
    fn parse_as_address(&self) -> crate::Result<Address> {
        self.as_str().parse_as_address()
    }

    fn parse_as_url(&self) -> crate::Result<Url> {
        self.as_str().parse_as_url()
    }

    fn to_alloy_provider(&self) -> crate::Result<DynProvider> {
        self.as_str().to_alloy_provider()
    }
}

/// Formats a wei amount in ether, dropping trailing fractional zeros but
/// keeping at least one fractional digit (`1.5`, `2.0`).
pub fn format_native_balance(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{formatted}.0"),
    }
}
