//! Loading the visa table for the current passport.
//!
//! Fetches are asynchronous and may finish out of order. [`VisaTableSlot`]
//! hands out a ticket per request and only accepts the newest one, so a slow
//! answer for an earlier passport can never overwrite a later one.

use crate::codes::Iso2Code;
use crate::visa::VisaTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    Live,
    /// Built-in static data; the API was unreachable.
    Fallback,
}

/// Identity of one in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    id: u64,
    passport: Iso2Code,
}

impl RequestTicket {
    pub fn passport(&self) -> &Iso2Code {
        &self.passport
    }
}

#[derive(Debug, Default)]
pub struct VisaTableSlot {
    latest: u64,
    passport: Option<Iso2Code>,
    table: VisaTable,
    source: Option<TableSource>,
}

impl VisaTableSlot {
    /// Start loading for a new passport. The previous table is dropped
    /// right away: it belongs to another passport.
    pub fn begin(&mut self, passport: Iso2Code) -> RequestTicket {
        self.latest += 1;
        self.passport = Some(passport.clone());
        self.table = VisaTable::default();
        self.source = None;
        RequestTicket {
            id: self.latest,
            passport,
        }
    }

    /// Apply a finished fetch. Returns false (and changes nothing) when a
    /// newer request or a clear happened since `ticket` was issued.
    pub fn complete(&mut self, ticket: RequestTicket, table: VisaTable, source: TableSource) -> bool {
        if ticket.id != self.latest {
            tracing::debug!(passport = %ticket.passport, "discarding stale visa table");
            return false;
        }
        self.table = table;
        self.source = Some(source);
        true
    }

    /// Forget the table and invalidate anything still in flight.
    pub fn clear(&mut self) {
        self.latest += 1;
        self.passport = None;
        self.table = VisaTable::default();
        self.source = None;
    }

    pub fn table(&self) -> &VisaTable {
        &self.table
    }

    pub fn passport(&self) -> Option<&Iso2Code> {
        self.passport.as_ref()
    }

    pub fn source(&self) -> Option<TableSource> {
        self.source
    }
}

#[cfg(feature = "net")]
pub use client::{FetchError, FetchOutcome, VisaClient};

#[cfg(feature = "net")]
mod client {
    use std::time::Duration;

    use thiserror::Error;

    use super::TableSource;
    use crate::codes::{Iso2Code, parse_iso2};
    use crate::fallback::fallback_table;
    use crate::visa::VisaTable;

    #[derive(Debug, Error)]
    pub enum FetchError {
        #[error("invalid country code {0:?}: expected two letters")]
        InvalidCode(String),
        #[error("visa API request failed: {0}")]
        Http(#[from] reqwest::Error),
        #[error("visa API returned HTTP {0}")]
        Status(u16),
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FetchOutcome {
        pub table: VisaTable,
        pub source: TableSource,
    }

    /// Client for the `/visa-status/{code}` endpoint served by the proxy.
    #[derive(Debug, Clone)]
    pub struct VisaClient {
        http: reqwest::Client,
        base_url: String,
    }

    impl VisaClient {
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
            let http = reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(concat!("visa-map-rs/", env!("CARGO_PKG_VERSION")))
                .build()?;
            Ok(Self {
                http,
                base_url: base_url.into(),
            })
        }

        pub async fn fetch(&self, passport: &str) -> Result<VisaTable, FetchError> {
            let code = parse_iso2(passport).ok_or_else(|| FetchError::InvalidCode(passport.to_string()))?;
            let url = format!("{}/visa-status/{code}", self.base_url.trim_end_matches('/'));

            let resp = self.http.get(&url).send().await?;
            if !resp.status().is_success() {
                return Err(FetchError::Status(resp.status().as_u16()));
            }
            Ok(resp.json::<VisaTable>().await?)
        }

        /// Fetch, degrading to the built-in table on timeout or failure so a
        /// chosen passport always has some color information.
        pub async fn fetch_or_fallback(&self, passport: &Iso2Code) -> FetchOutcome {
            match self.fetch(passport.as_str()).await {
                Ok(table) => FetchOutcome {
                    table,
                    source: TableSource::Live,
                },
                Err(err) => {
                    tracing::warn!(passport = %passport, error = %err, "visa API unavailable, using fallback data");
                    FetchOutcome {
                        table: fallback_table(passport),
                        source: TableSource::Fallback,
                    }
                }
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visa::VisaStatus;

    fn table(code: &str) -> VisaTable {
        [(Iso2Code::new(code), VisaStatus::VisaFree)].into_iter().collect()
    }

    #[test]
    fn newest_request_wins() {
        let mut slot = VisaTableSlot::default();
        let slow = slot.begin(Iso2Code::new("FR"));
        let fast = slot.begin(Iso2Code::new("DE"));

        assert!(slot.complete(fast, table("AT"), TableSource::Live));
        assert!(!slot.complete(slow, table("BE"), TableSource::Live));
        assert_eq!(slot.table(), &table("AT"));
        assert_eq!(slot.passport(), Some(&Iso2Code::new("DE")));
    }

    #[test]
    fn begin_drops_previous_passport_data() {
        let mut slot = VisaTableSlot::default();
        let t = slot.begin(Iso2Code::new("FR"));
        slot.complete(t, table("JP"), TableSource::Live);
        slot.begin(Iso2Code::new("DE"));
        assert!(slot.table().is_empty());
        assert_eq!(slot.passport(), Some(&Iso2Code::new("DE")));
        assert_eq!(slot.source(), None);
    }

    #[test]
    fn clear_invalidates_in_flight_requests() {
        let mut slot = VisaTableSlot::default();
        let t = slot.begin(Iso2Code::new("FR"));
        slot.clear();
        assert!(!slot.complete(t, table("JP"), TableSource::Fallback));
        assert!(slot.table().is_empty());
        assert_eq!(slot.passport(), None);
    }
}
