#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use rocket::{Build, Rocket, State};
use std::sync::Mutex;
use std::time::Instant;
use sunweg_rs::api;
use sunweg_rs::model::Api;

mod metrics;

/// Five minutes, as the service only refreshes its figures every few minutes.
const DEFAULT_INTERVAL: i64 = 300;

#[derive(Clone, serde::Deserialize)]
pub struct SunwegConfig {
    api_url: String,
    username: String,
    password: String,
    /// Plant to report on; the first plant of the account when unset.
    plant_id: Option<String>,
    interval: u64,
}

/// Structure containing state for API handlers.
pub struct StateData {
    /// Held for the whole of a poll so requests never share a session concurrently.
    api: tokio::sync::Mutex<Api>,
    plant_id: String,
    interval: u64,
    /// Timestamp of last poll attempt via `metrics::collect()`
    timestamp: Mutex<Option<Instant>>,
}

impl StateData {
    /// Updates `timestamp` to `now()`.
    fn touch(&self) {
        if let Ok(mut ts) = self.timestamp.lock() {
            *ts = Some(Instant::now());
        } else {
            log::trace!("Unable to lock timestamp mutex, will refresh again")
        }
    }

    /// Checks whether `interval_secs` elapsed since last `touch()`
    fn interval_elapsed(&self, interval_secs: u64) -> bool {
        let elapsed_opt = self
            .timestamp
            .lock()
            .ok()
            .and_then(|a| a.map(|b| b.elapsed().as_secs()));

        if let Some(elapsed) = elapsed_opt {
            elapsed >= interval_secs
        } else {
            /* If there is None timestamp/elapsed, always return true to trigger action */
            true
        }
    }
}

pub fn read_settings() -> Result<SunwegConfig, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .set_default("api_url", api::API_URL)?
        .set_default("interval", DEFAULT_INTERVAL)?
        .merge(config::Environment::with_prefix("SUNWEG"))?;

    settings.try_into()
}

#[get("/metrics")]
async fn metrics_route(state: &State<StateData>) -> Result<String, api::Error> {
    {
        let mut api = state.api.lock().await;

        if state.interval_elapsed(state.interval) {
            if let Err(e) = metrics::collect(&mut api, &state.plant_id).await {
                log::error!("SunWEG poll failed, serving last known values: {}", e);
            }
            state.touch();
        } else {
            log::info!("interval time not yet elapsed since last run; returning cached result")
        }
    }

    metrics::read()
}

/// Plants of the account, to find the id to configure as `SUNWEG_PLANT_ID`.
#[get("/plants")]
async fn plants_route(state: &State<StateData>) -> Result<String, api::Error> {
    let mut api = state.api.lock().await;
    api::login(&mut api).await?;
    let plants = api::list_plants(&mut api).await?;

    serde_json::to_string_pretty(&plants).map_err(|e| api::Error::InternalError(e.to_string()))
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let settings = read_settings().expect("Configuration error");
    let api = api::api(settings.api_url, settings.username, settings.password)
        .expect("Unable to set up HTTP client");

    let plant_id = settings.plant_id.unwrap_or_default();
    if plant_id.is_empty() {
        log::info!("No plant configured, reporting on the first plant of the account");
    }

    let state = StateData {
        api: tokio::sync::Mutex::new(api),
        plant_id,
        interval: settings.interval,
        timestamp: Mutex::new(None),
    };

    rocket::build()
        .manage(state)
        .mount("/", routes![metrics_route, plants_route])
}
