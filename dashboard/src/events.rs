use chainwatch_utils::coingecko::PriceSample;

use crate::watchlist::BalanceEntry;

/// Everything that can change dashboard state: user input from the
/// front-end and results coming back from spawned queries.
#[derive(Debug)]
pub enum Event {
    AddressInput(String),
    AddAddress,

    TokenInput(String),
    StartDateInput(String),
    EndDateInput(String),
    FetchHistory,

    BalanceUpdate {
        address: String,
        balance: BalanceEntry,
    },
    HistoryUpdate {
        generation: u64,
        result: chainwatch_utils::Result<Vec<PriceSample>>,
    },
}

impl Event {
    pub fn is_input(&self) -> bool {
        !matches!(
            self,
            Event::BalanceUpdate { .. } | Event::HistoryUpdate { .. }
        )
    }
}
