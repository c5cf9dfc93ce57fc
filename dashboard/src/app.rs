use std::sync::Arc;

use chainwatch_utils::{
    balance::{BalanceProvider, RpcBalanceProvider},
    coingecko::{CoinGecko, PriceHistoryApi},
    config::Config,
};
use chrono::{Local, TimeZone};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{historical::HistoricalRangeFetcher, watchlist::Watchlist, Event};

/// Owns both dashboard components and the channel through which every state
/// change arrives. State is only mutated in [`Dashboard::handle_event`].
pub struct Dashboard<P, A, Tz = Local>
where
    P: BalanceProvider,
    A: PriceHistoryApi,
    Tz: TimeZone,
{
    balance_provider: Arc<P>,
    price_api: Arc<A>,
    watchlist: Watchlist,
    history: HistoricalRangeFetcher<Tz>,
    event_tr: UnboundedSender<Event>,
    event_rc: UnboundedReceiver<Event>,
}

impl Dashboard<RpcBalanceProvider, CoinGecko, Local> {
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let balance_provider = RpcBalanceProvider::new(config.rpc_url.as_deref())?;
        if !balance_provider.is_available() {
            tracing::warn!("no rpc_url configured, balances will be unavailable");
        }

        let price_api = CoinGecko::new(
            &config.price_api_url,
            &config.vs_currency,
            config.http_timeout(),
        )?;

        Ok(Self::new(
            balance_provider,
            price_api,
            HistoricalRangeFetcher::new(config.response_policy),
        ))
    }
}

impl<P, A, Tz> Dashboard<P, A, Tz>
where
    P: BalanceProvider,
    A: PriceHistoryApi,
    Tz: TimeZone,
{
    pub fn new(balance_provider: P, price_api: A, history: HistoricalRangeFetcher<Tz>) -> Self {
        let (event_tr, event_rc) = mpsc::unbounded_channel();
        Self {
            balance_provider: Arc::new(balance_provider),
            price_api: Arc::new(price_api),
            watchlist: Watchlist::default(),
            history,
            event_tr,
            event_rc,
        }
    }

    /// Sender for front-ends to feed input events.
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.event_tr.clone()
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn history(&self) -> &HistoricalRangeFetcher<Tz> {
        &self.history
    }

    pub fn handle_event(&mut self, event: Event) {
        tracing::trace!(input = event.is_input(), ?event, "handling event");

        match event {
            Event::AddressInput(input) => self.watchlist.set_input(input),
            Event::AddAddress => {
                self.watchlist
                    .submit_input(&self.balance_provider, &self.event_tr);
            }

            Event::TokenInput(token) => self.history.set_token(token),
            Event::StartDateInput(date) => self.history.set_start_date(date),
            Event::EndDateInput(date) => self.history.set_end_date(date),
            Event::FetchHistory => {
                if let Err(error) = self.history.request_history(&self.price_api, &self.event_tr)
                {
                    tracing::debug!(%error, "history request rejected");
                }
            }

            Event::BalanceUpdate { address, balance } => {
                if !self.watchlist.update_balance(&address, balance) {
                    tracing::debug!(%address, "balance update for untracked address");
                }
            }
            Event::HistoryUpdate { generation, result } => {
                self.history.apply_response(generation, result);
            }
        }
    }

    /// No balance query or history request is outstanding.
    pub fn is_settled(&self) -> bool {
        self.watchlist.pending() == 0 && self.history.in_flight() == 0
    }

    /// Waits for the next event and handles it.
    pub async fn next_event(&mut self) {
        // The dashboard holds a sender itself, so the channel never closes here.
        if let Some(event) = self.event_rc.recv().await {
            self.handle_event(event);
        }
    }

    /// Handles events until everything outstanding has resolved. There is no
    /// timeout: a request that never resolves keeps this pending.
    pub async fn settle(&mut self) {
        loop {
            // Input events queued by a front-end may start new work.
            while let Ok(event) = self.event_rc.try_recv() {
                self.handle_event(event);
            }
            if self.is_settled() {
                break;
            }
            self.next_event().await;
        }
    }
}
