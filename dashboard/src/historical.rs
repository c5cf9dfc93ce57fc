//! Historical price range queries: validates the user's token and date range,
//! asks the price history API for samples and normalizes them into a
//! chronological series of [`PricePoint`]s.
//!
//! Requests are not blocked while one is in flight. Every request gets a
//! generation number, and the [`ResponsePolicy`] decides whether a response
//! from an older generation may still overwrite the state.

use std::{str::FromStr, sync::Arc};

use chainwatch_utils::{
    coingecko::{PriceHistoryApi, PriceSample},
    config::ResponsePolicy,
};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    error::QueryError,
    series::{ChartSeries, TableRow},
    Event,
};

pub const DATASET_LABEL: &str = "Price (USD)";
const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
const DATE_LABEL_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq)]
pub struct PricePoint {
    pub date: String,
    /// Rounded half away from zero to 2 decimals.
    pub price: f64,
    label: String,
}

impl PricePoint {
    pub fn price_label(&self) -> &str {
        &self.label
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum QueryState {
    #[default]
    Idle,
    Loading,
    Success(Vec<PricePoint>),
    Error(QueryError),
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn series(&self) -> &[PricePoint] {
        match self {
            QueryState::Success(points) => points,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            QueryState::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Start and end of a query, both at midnight UTC of the entered calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn from_inputs(start: &str, end: &str) -> Result<Self, QueryError> {
        let (Some(start), Some(end)) = (parse_date_input(start), parse_date_input(end)) else {
            return Err(QueryError::MissingInput);
        };

        if start > end {
            return Err(QueryError::StartAfterEnd);
        }
        if start == end {
            return Err(QueryError::StartEqualsEnd);
        }

        Ok(Self { start, end })
    }

    pub fn start_secs(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_secs(&self) -> i64 {
        self.end.timestamp()
    }
}

fn parse_date_input(input: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(input.trim(), DATE_INPUT_FORMAT)
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Converts raw samples into price points, labelling each with its calendar
/// date in `tz`. Fails if any sample cannot be represented.
pub fn normalize_samples<Tz: TimeZone>(
    samples: &[PriceSample],
    tz: &Tz,
) -> Option<Vec<PricePoint>> {
    samples
        .iter()
        .map(|sample| {
            let date = tz
                .timestamp_millis_opt(sample.timestamp_ms)
                .single()?
                .date_naive()
                .format(DATE_LABEL_FORMAT)
                .to_string();
            let (price, label) = round_price(sample.price)?;
            Some(PricePoint { date, price, label })
        })
        .collect()
}

/// Rounded price and its two-decimal label.
fn round_price(price: f64) -> Option<(f64, String)> {
    if !price.is_finite() {
        return None;
    }
    // Shortest round-trip text keeps 100.005 as written rather than its binary expansion.
    match Decimal::from_str(&price.to_string()) {
        Ok(decimal) => {
            let rounded = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            Some((rounded.to_f64()?, format!("{rounded:.2}")))
        }
        // Out of Decimal's range an f64 has no fractional digits left to round.
        Err(_) => Some((price, format!("{price:.2}"))),
    }
}

pub struct HistoricalRangeFetcher<Tz: TimeZone = Local> {
    token: String,
    start_date: String,
    end_date: String,
    state: QueryState,
    policy: ResponsePolicy,
    tz: Tz,
    issued: u64,
    in_flight: usize,
}

impl HistoricalRangeFetcher<Local> {
    pub fn new(policy: ResponsePolicy) -> Self {
        Self::with_time_zone(policy, Local)
    }
}

impl<Tz: TimeZone> HistoricalRangeFetcher<Tz> {
    pub fn with_time_zone(policy: ResponsePolicy, tz: Tz) -> Self {
        Self {
            token: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            state: QueryState::Idle,
            policy,
            tz,
            issued: 0,
            in_flight: 0,
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = token;
    }

    pub fn set_start_date(&mut self, date: String) {
        self.start_date = date;
    }

    pub fn set_end_date(&mut self, date: String) {
        self.end_date = date;
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Number of issued requests whose response has not arrived yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Whether a front-end should offer to submit. The fetcher itself accepts
    /// requests at any time.
    pub fn can_request(&self) -> bool {
        !self.state.is_loading()
    }

    fn validate(&self) -> Result<(String, DateRange), QueryError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(QueryError::MissingInput);
        }
        let range = DateRange::from_inputs(&self.start_date, &self.end_date)?;
        Ok((token.to_string(), range))
    }

    /// Validates the current inputs and, if they pass, spawns exactly one
    /// request to `api`. Returns the generation of the issued request.
    pub fn request_history<A: PriceHistoryApi>(
        &mut self,
        api: &Arc<A>,
        transmitter: &UnboundedSender<Event>,
    ) -> Result<u64, QueryError> {
        let (token, range) = match self.validate() {
            Ok(validated) => validated,
            Err(error) => {
                self.state = QueryState::Error(error.clone());
                return Err(error);
            }
        };

        self.issued += 1;
        self.in_flight += 1;
        self.state = QueryState::Loading;

        let generation = self.issued;
        let api = Arc::clone(api);
        let transmitter = transmitter.clone();
        let (from, to) = (range.start_secs(), range.end_secs());

        tokio::spawn(async move {
            let result = api.market_chart_range(&token, from, to).await;
            if let Err(error) = &result {
                tracing::warn!(%token, from, to, ?error, "failed to fetch historical data");
            }
            // Receiver is gone only if the dashboard was dropped.
            let _ = transmitter.send(Event::HistoryUpdate { generation, result });
        });

        Ok(generation)
    }

    /// Applies the response for `generation`. Returns false if the policy
    /// discarded it as stale.
    pub fn apply_response(
        &mut self,
        generation: u64,
        result: chainwatch_utils::Result<Vec<PriceSample>>,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.policy == ResponsePolicy::LatestIssued && generation != self.issued {
            tracing::debug!(
                generation,
                latest = self.issued,
                "dropping superseded history response"
            );
            return false;
        }

        self.state = match result {
            Ok(samples) => match normalize_samples(&samples, &self.tz) {
                Some(points) => QueryState::Success(points),
                None => {
                    tracing::warn!(generation, "history response has unrepresentable samples");
                    QueryState::Error(QueryError::FetchFailed)
                }
            },
            Err(_) => QueryState::Error(QueryError::FetchFailed),
        };

        true
    }

    pub fn chart_title(&self) -> String {
        format!("{} Price History", self.token.trim().to_uppercase())
    }

    pub fn chart_series(&self) -> ChartSeries {
        let mut series = ChartSeries::new(DATASET_LABEL);
        for point in self.state.series() {
            series.push(point.date.clone(), point.price);
        }
        series
    }

    pub fn rows(&self) -> Vec<TableRow> {
        self.state
            .series()
            .iter()
            .map(|point| TableRow {
                label: point.date.clone(),
                value: point.price_label().to_string(),
            })
            .collect()
    }
}
