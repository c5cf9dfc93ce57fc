use std::{future::Future, time::Duration};

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::{alloy::StringExt, reqwest::build_client, Reqwest};

pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

/// One raw `(timestamp, price)` sample as returned by the price history API.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceSample {
    pub timestamp_ms: i64,
    pub price: f64,
}

/// Source of historical price samples for an asset.
pub trait PriceHistoryApi: Send + Sync + 'static {
    /// Samples for `coin_id` between `from` and `to` (seconds since epoch),
    /// in the order the source returned them.
    fn market_chart_range(
        &self,
        coin_id: &str,
        from: i64,
        to: i64,
    ) -> impl Future<Output = crate::Result<Vec<PriceSample>>> + Send;
}

#[derive(Debug, Deserialize)]
struct MarketChartRangeResponse {
    prices: Option<Vec<(i64, f64)>>,
}

pub struct CoinGecko {
    client: Client,
    base_url: Url,
    vs_currency: String,
}

impl CoinGecko {
    pub fn new(base_url: &str, vs_currency: &str, timeout: Option<Duration>) -> crate::Result<Self> {
        let base_url = base_url.parse_as_url()?;
        if base_url.cannot_be_a_base() {
            return Err(crate::Error::UrlCannotBeBase(base_url));
        }

        Ok(Self {
            client: build_client(timeout)?,
            base_url,
            vs_currency: vs_currency.to_string(),
        })
    }

    fn range_url(&self, coin_id: &str) -> crate::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| crate::Error::UrlCannotBeBase(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["coins", coin_id, "market_chart", "range"]);
        Ok(url)
    }
}

impl PriceHistoryApi for CoinGecko {
    async fn market_chart_range(
        &self,
        coin_id: &str,
        from: i64,
        to: i64,
    ) -> crate::Result<Vec<PriceSample>> {
        let response = Reqwest::get(&self.client, self.range_url(coin_id)?)
            .query(&[
                ("vs_currency", self.vs_currency.clone()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ])
            .receive_json::<MarketChartRangeResponse>()
            .await?;

        let prices = response
            .prices
            .ok_or_else(|| crate::Error::PricesMissing(coin_id.to_string()))?;

        Ok(prices
            .into_iter()
            .map(|(timestamp_ms, price)| PriceSample {
                timestamp_ms,
                price,
            })
            .collect())
    }
}
