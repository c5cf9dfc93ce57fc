use std::{collections::HashMap, sync::Arc};

use chainwatch_utils::balance::{fetch_balance, BalanceProvider};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    series::{ChartSeries, TableRow},
    Event,
};

pub const DATASET_LABEL: &str = "Token Balances (ETH)";
const PENDING_TEXT: &str = "Loading...";

#[derive(Clone, Debug, Default, PartialEq)]
pub enum BalanceEntry {
    #[default]
    Pending,
    /// Decimal string in ether.
    Resolved(String),
    Unavailable,
}

impl BalanceEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self, BalanceEntry::Pending)
    }

    /// Value used on the chart, pending and unavailable entries plot as zero.
    pub fn chart_value(&self) -> f64 {
        match self {
            BalanceEntry::Resolved(balance) => balance.parse().unwrap_or(0.0),
            BalanceEntry::Pending | BalanceEntry::Unavailable => 0.0,
        }
    }

    pub fn display(&self) -> &str {
        match self {
            BalanceEntry::Pending => PENDING_TEXT,
            BalanceEntry::Resolved(balance) => balance,
            BalanceEntry::Unavailable => "0",
        }
    }
}

/// Ordered, deduplicated set of tracked addresses and their balances.
#[derive(Debug, Default)]
pub struct Watchlist {
    input: String,
    addresses: Vec<String>,
    balances: HashMap<String, BalanceEntry>,
}

impl Watchlist {
    pub fn set_input(&mut self, input: String) {
        self.input = input;
    }

    /// Adds whatever is currently in the address input.
    pub fn submit_input<P: BalanceProvider>(
        &mut self,
        provider: &Arc<P>,
        transmitter: &UnboundedSender<Event>,
    ) -> bool {
        let address = self.input.clone();
        self.add_address(&address, provider, transmitter)
    }

    /// Starts tracking `address` and spawns its balance query. Blank input and
    /// already tracked addresses are ignored. Returns whether the address was added.
    pub fn add_address<P: BalanceProvider>(
        &mut self,
        address: &str,
        provider: &Arc<P>,
        transmitter: &UnboundedSender<Event>,
    ) -> bool {
        if address.trim().is_empty() || self.balances.contains_key(address) {
            return false;
        }

        self.addresses.push(address.to_string());
        self.balances
            .insert(address.to_string(), BalanceEntry::Pending);

        spawn_balance_query(
            Arc::clone(provider),
            address.to_string(),
            transmitter.clone(),
        );

        true
    }

    /// Records a resolved balance against the address it was queried for.
    pub fn update_balance(&mut self, address: &str, balance: BalanceEntry) -> bool {
        match self.balances.get_mut(address) {
            Some(entry) => {
                *entry = balance;
                true
            }
            None => false,
        }
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn balance(&self, address: &str) -> Option<&BalanceEntry> {
        self.balances.get(address)
    }

    pub fn pending(&self) -> usize {
        self.balances.values().filter(|b| b.is_pending()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn chart_series(&self) -> ChartSeries {
        let mut series = ChartSeries::new(DATASET_LABEL);
        for address in &self.addresses {
            let value = self
                .balances
                .get(address)
                .map(BalanceEntry::chart_value)
                .unwrap_or_default();
            series.push(address.clone(), value);
        }
        series
    }

    pub fn rows(&self) -> Vec<TableRow> {
        self.addresses
            .iter()
            .map(|address| TableRow {
                label: address.clone(),
                value: self
                    .balances
                    .get(address)
                    .map(BalanceEntry::display)
                    .unwrap_or(PENDING_TEXT)
                    .to_string(),
            })
            .collect()
    }
}

fn spawn_balance_query<P: BalanceProvider>(
    provider: Arc<P>,
    address: String,
    transmitter: UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        let balance = match fetch_balance(provider.as_ref(), &address).await {
            Ok(balance) => BalanceEntry::Resolved(balance),
            Err(chainwatch_utils::Error::ProviderUnavailable) => {
                tracing::warn!(%address, "no wallet balance provider found, balance unavailable");
                BalanceEntry::Unavailable
            }
            Err(error) => {
                tracing::warn!(%address, ?error, "error fetching balance");
                BalanceEntry::Unavailable
            }
        };

        // Receiver is gone only if the dashboard was dropped, nothing to update then.
        let _ = transmitter.send(Event::BalanceUpdate { address, balance });
    });
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use tokio::sync::mpsc;

    use super::*;
    use crate::testutils::FakeBalances;

    const A: &str = "0x00000000000000000000000000000000000000aa";
    const B: &str = "0x00000000000000000000000000000000000000bb";

    async fn recv_balance(
        rc: &mut mpsc::UnboundedReceiver<Event>,
    ) -> (String, BalanceEntry) {
        match rc.recv().await {
            Some(Event::BalanceUpdate { address, balance }) => (address, balance),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn adding_twice_keeps_one_entry_and_one_query() {
        let provider = Arc::new(FakeBalances::new().with_balance(A, 1_500_000_000_000_000_000));
        let (tr, mut rc) = mpsc::unbounded_channel();
        let mut watchlist = Watchlist::default();

        assert!(watchlist.add_address(A, &provider, &tr));
        assert!(!watchlist.add_address(A, &provider, &tr));

        assert_eq!(watchlist.addresses(), &[A.to_string()]);
        assert_eq!(watchlist.balance(A), Some(&BalanceEntry::Pending));

        let (address, balance) = recv_balance(&mut rc).await;
        watchlist.update_balance(&address, balance);
        assert_eq!(
            watchlist.balance(A),
            Some(&BalanceEntry::Resolved("1.5".to_string()))
        );

        // Re-adding after resolution is still a no-op.
        assert!(!watchlist.add_address(A, &provider, &tr));
        assert_eq!(provider.calls(), 1);
        assert!(rc.try_recv().is_err());
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let provider = Arc::new(FakeBalances::new());
        let (tr, _rc) = mpsc::unbounded_channel();
        let mut watchlist = Watchlist::default();

        watchlist.set_input("   ".to_string());
        assert!(!watchlist.submit_input(&provider, &tr));
        assert!(watchlist.is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn missing_wallet_marks_balance_unavailable() {
        let provider = Arc::new(FakeBalances::unavailable());
        let (tr, mut rc) = mpsc::unbounded_channel();
        let mut watchlist = Watchlist::default();

        watchlist.set_input(A.to_string());
        assert!(watchlist.submit_input(&provider, &tr));
        assert_eq!(watchlist.addresses(), &[A.to_string()]);

        let (address, balance) = recv_balance(&mut rc).await;
        assert_eq!(balance, BalanceEntry::Unavailable);
        watchlist.update_balance(&address, balance);

        assert_eq!(watchlist.balance(A), Some(&BalanceEntry::Unavailable));
        assert_eq!(watchlist.rows()[0].value, "0");
        // The probe fails before any balance query is made.
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn provider_fault_marks_only_that_address_unavailable() {
        let provider = Arc::new(FakeBalances::new().with_balance(B, 2_000_000_000_000_000_000));
        let (tr, mut rc) = mpsc::unbounded_channel();
        let mut watchlist = Watchlist::default();

        watchlist.add_address("garbage", &provider, &tr);
        watchlist.add_address(B, &provider, &tr);

        for _ in 0..2 {
            let (address, balance) = recv_balance(&mut rc).await;
            watchlist.update_balance(&address, balance);
        }

        assert_eq!(
            watchlist.balance("garbage"),
            Some(&BalanceEntry::Unavailable)
        );
        assert_eq!(
            watchlist.balance(B),
            Some(&BalanceEntry::Resolved("2.0".to_string()))
        );
    }

    #[tokio::test]
    async fn out_of_order_resolution_binds_to_origin() {
        let provider = Arc::new(FakeBalances::new());
        let gate_a = provider.gate(A);
        let gate_b = provider.gate(B);
        let (tr, mut rc) = mpsc::unbounded_channel();
        let mut watchlist = Watchlist::default();

        watchlist.add_address(A, &provider, &tr);
        watchlist.add_address(B, &provider, &tr);

        gate_b
            .send(U256::from(3_000_000_000_000_000_000u128))
            .unwrap();
        let (address, balance) = recv_balance(&mut rc).await;
        assert_eq!(address, B);
        watchlist.update_balance(&address, balance);

        assert_eq!(watchlist.balance(A), Some(&BalanceEntry::Pending));
        assert_eq!(
            watchlist.balance(B),
            Some(&BalanceEntry::Resolved("3.0".to_string()))
        );
        assert_eq!(watchlist.pending(), 1);

        gate_a
            .send(U256::from(250_000_000_000_000_000u128))
            .unwrap();
        let (address, balance) = recv_balance(&mut rc).await;
        assert_eq!(address, A);
        watchlist.update_balance(&address, balance);

        assert_eq!(
            watchlist.balance(A),
            Some(&BalanceEntry::Resolved("0.25".to_string()))
        );
        assert_eq!(watchlist.pending(), 0);
        assert_eq!(watchlist.addresses(), &[A.to_string(), B.to_string()]);
    }

    #[test]
    fn chart_series_follows_insertion_order() {
        let mut watchlist = Watchlist::default();
        for address in [B, A, "0xcc"] {
            watchlist.addresses.push(address.to_string());
            watchlist
                .balances
                .insert(address.to_string(), BalanceEntry::Pending);
        }
        watchlist.update_balance(A, BalanceEntry::Resolved("0.5".to_string()));
        watchlist.update_balance("0xcc", BalanceEntry::Unavailable);

        let series = watchlist.chart_series();
        assert_eq!(series.dataset_label, DATASET_LABEL);
        assert_eq!(series.labels, vec![B, A, "0xcc"]);
        assert_eq!(series.values, vec![0.0, 0.5, 0.0]);

        let rows = watchlist.rows();
        assert_eq!(rows[0].value, "Loading...");
        assert_eq!(rows[1].value, "0.5");
        assert_eq!(rows[2].value, "0");
    }

    #[test]
    fn update_for_untracked_address_is_ignored() {
        let mut watchlist = Watchlist::default();
        assert!(!watchlist.update_balance(A, BalanceEntry::Unavailable));
        assert!(watchlist.balance(A).is_none());
    }
}
