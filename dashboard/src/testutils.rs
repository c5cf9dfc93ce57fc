use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::primitives::U256;
use chainwatch_utils::{
    balance::BalanceProvider,
    coingecko::{PriceHistoryApi, PriceSample},
};
use tokio::sync::oneshot;

/// Balance provider with canned balances. Addresses without a balance fail
/// like a malformed address would. Gated addresses resolve when the test
/// sends on the gate.
pub struct FakeBalances {
    available: bool,
    calls: AtomicUsize,
    balances: HashMap<String, U256>,
    gates: Mutex<HashMap<String, oneshot::Receiver<U256>>>,
}

impl FakeBalances {
    pub fn new() -> Self {
        Self {
            available: true,
            calls: AtomicUsize::new(0),
            balances: HashMap::new(),
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn with_balance(mut self, address: &str, wei: u128) -> Self {
        self.balances.insert(address.to_string(), U256::from(wei));
        self
    }

    pub fn gate(&self, address: &str) -> oneshot::Sender<U256> {
        let (tr, rc) = oneshot::channel();
        self.gates.lock().unwrap().insert(address.to_string(), rc);
        tr
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BalanceProvider for FakeBalances {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn native_balance(&self, address: &str) -> chainwatch_utils::Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gates.lock().unwrap().remove(address);
        if let Some(gate) = gate {
            return gate
                .await
                .map_err(|_| chainwatch_utils::Error::InvalidAddress(address.to_string()));
        }

        self.balances
            .get(address)
            .copied()
            .ok_or_else(|| chainwatch_utils::Error::InvalidAddress(address.to_string()))
    }
}

#[derive(Clone, Debug)]
pub enum FakeResponse {
    Samples(Vec<PriceSample>),
    MissingPrices,
    Offline,
}

/// Price history API that records every call. A gated coin id waits for the
/// test to send its response, others get the default response.
pub struct FakePriceApi {
    default: FakeResponse,
    calls: Mutex<Vec<(String, i64, i64)>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<FakeResponse>>>,
}

impl FakePriceApi {
    pub fn new(default: FakeResponse) -> Self {
        Self {
            default,
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn gate(&self, coin_id: &str) -> oneshot::Sender<FakeResponse> {
        let (tr, rc) = oneshot::channel();
        self.gates.lock().unwrap().insert(coin_id.to_string(), rc);
        tr
    }

    pub fn calls(&self) -> Vec<(String, i64, i64)> {
        self.calls.lock().unwrap().clone()
    }
}

impl PriceHistoryApi for FakePriceApi {
    async fn market_chart_range(
        &self,
        coin_id: &str,
        from: i64,
        to: i64,
    ) -> chainwatch_utils::Result<Vec<PriceSample>> {
        self.calls
            .lock()
            .unwrap()
            .push((coin_id.to_string(), from, to));

        let gate = self.gates.lock().unwrap().remove(coin_id);
        let response = match gate {
            Some(gate) => gate.await.unwrap_or(FakeResponse::Offline),
            None => self.default.clone(),
        };

        match response {
            FakeResponse::Samples(samples) => Ok(samples),
            FakeResponse::MissingPrices => {
                Err(chainwatch_utils::Error::PricesMissing(coin_id.to_string()))
            }
            FakeResponse::Offline => Err(chainwatch_utils::Error::Internet(
                "https://api.coingecko.com/api/v3"
                    .parse()
                    .unwrap(),
            )),
        }
    }
}

pub fn sample(timestamp_ms: i64, price: f64) -> PriceSample {
    PriceSample {
        timestamp_ms,
        price,
    }
}
