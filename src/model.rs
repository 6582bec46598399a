use crate::api::session::Session;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Fields of a single plant (`usina`) as reported by the service.
pub type PlantSummary = Map<String, Value>;

/// Totals across every plant visible to the account.
pub type AggregateTotals = Map<String, Value>;

/// Plant id to plant name.
pub type PlantDirectory = BTreeMap<String, String>;

/// Handle to the SunWEG API for one account.
///
/// Every operation takes `&mut Api`: a re-login replaces the token in place, so
/// calls against the same handle must not overlap.
#[derive(Debug)]
pub struct Api {
    pub api_url: String,
    pub(crate) session: Session,
    pub(crate) client: reqwest::Client,
}

impl Api {
    pub fn session(&self) -> &Session {
        &self.session
    }
}
