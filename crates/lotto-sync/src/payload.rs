//! # Outbox Payloads
//!
//! The JSON payload shapes carried by sync tasks and parked outbox entries.
//!
//! Every write the agent performs is first encoded into one of these
//! payloads. The happy path decodes it immediately; the failure path parks
//! the same JSON in `sync_outbox`, so a retry days later replays exactly
//! what the original flush would have written.
//!
//! Jurisdiction scoping travels inside the payload: the replay of an entry
//! parked under Maryland must not leak into DC rows even if the store's
//! settings changed in between.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use lotto_core::types::{GameInfo, StateCode, StoreSettings, TicketBox};

/// Entity type tags used in sync tasks and `sync_outbox.entity_type`.
pub mod entity {
    pub const BOX: &str = "BOX";
    pub const BOX_DELETE: &str = "BOX_DELETE";
    pub const GAME: &str = "GAME";
    pub const GAME_DELETE: &str = "GAME_DELETE";
    pub const SETTINGS: &str = "SETTINGS";
    pub const SUMMARY: &str = "SUMMARY";
    pub const COUNTERS_CLEAR: &str = "COUNTERS_CLEAR";
}

/// One box's full state plus its current-day counters.
///
/// Replay upserts both the box row and the daily counter row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxPayload {
    pub state: StateCode,
    pub business_date: NaiveDate,
    pub ticket_box: TicketBox,
}

/// Box removal: the row and its current-day counters both go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxDeletePayload {
    pub state: StateCode,
    pub business_date: NaiveDate,
    pub box_number: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePayload {
    pub state: StateCode,
    pub game: GameInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDeletePayload {
    pub state: StateCode,
    pub game_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    pub settings: StoreSettings,
}

/// One box's archived figures inside a [`SummaryPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedBoxSale {
    pub box_number: u32,
    pub ticket_price_cents: i64,
    pub last_scanned_ticket_number: Option<i64>,
    pub tickets_sold: i64,
    pub total_amount_sold_cents: i64,
}

/// A whole business day to archive (replace-or-insert by date).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPayload {
    pub state: StateCode,
    pub business_date: NaiveDate,
    pub day_of_week: String,
    pub total_tickets_sold: i64,
    pub total_amount_sold_cents: i64,
    pub box_sales: Vec<ArchivedBoxSale>,
    /// Archive-and-reset also drops the day's restore counters.
    pub clear_counters: bool,
}

/// Drop one business date's restore counters (discard-position reset).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountersClearPayload {
    pub state: StateCode,
    pub business_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_payload_roundtrip() {
        let payload = BoxPayload {
            state: StateCode::Md,
            business_date: "2026-08-30".parse().unwrap(),
            ticket_box: TicketBox::unconfigured(5),
        };

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"state\":\"MD\""));

        let back: BoxPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ticket_box.box_number, 5);
        assert_eq!(back.business_date, payload.business_date);
    }
}
