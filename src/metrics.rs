use prometheus::{Encoder, GaugeVec, IntCounterVec, TextEncoder};
use serde_json::Map;
use sunweg_rs::api::{self, response};
use sunweg_rs::model::{AggregateTotals, Api, PlantSummary};
use sunweg_rs::numeric::{self, parse_numeric, Multipliers};
use sunweg_rs::Error;

lazy_static! {
    static ref TOTAL_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "sunweg_total",
            "figures summed over every plant of the account",
        ),
        &["sensor", "unit"],
    )
    .unwrap();
    static ref PLANT_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("sunweg_plant", "figures of the monitored plant"),
        &["plant_id", "sensor", "unit"],
    )
    .unwrap();
    static ref UPDATE_FAILURES: IntCounterVec = register_int_counter_vec!(
        opts!(
            "sunweg_update_failures_total",
            "failed polls of the SunWEG API by kind of failure",
        ),
        &["kind"],
    )
    .unwrap();
}

/// A published figure: which field it is read from and how to normalize it.
struct Sensor {
    key: &'static str,
    field: &'static str,
    unit: &'static str,
    multipliers: Option<&'static Multipliers<'static>>,
}

impl Sensor {
    const fn new(
        key: &'static str,
        field: &'static str,
        unit: &'static str,
        multipliers: Option<&'static Multipliers<'static>>,
    ) -> Self {
        Sensor {
            key,
            field,
            unit,
            multipliers,
        }
    }

    fn read(&self, record: &Map<String, serde_json::Value>) -> Option<f64> {
        parse_numeric(record.get(self.field), self.multipliers)
    }
}

const TOTAL_SENSORS: [Sensor; 11] = [
    Sensor::new("energy_today", "energia_gerada_hoje", "kWh", Some(numeric::ENERGY)),
    Sensor::new("energy_month", "energia_gerada_mes", "kWh", Some(numeric::ENERGY)),
    Sensor::new("energy_total", "energia_gerada_total", "kWh", Some(numeric::ENERGY)),
    Sensor::new("active_power", "potencia_ativa_total", "kW", Some(numeric::POWER)),
    Sensor::new("capacity", "capacidade_usinas", "kW", Some(numeric::CAPACITY)),
    Sensor::new("trees_planted", "arvores_plantadas", "trees", None),
    Sensor::new("km_driven_electric", "km_rodado_eletrico", "km", None),
    Sensor::new("reduced_carbon_total", "reduz_carbono_total", "t", None),
    Sensor::new("money_saved_today", "total_economizado_hoje", "BRL", None),
    Sensor::new("money_saved_total", "total_economizado_acumulado", "BRL", None),
    Sensor::new("number_of_plants", "quantidade_usinas", "plants", None),
];

const PLANT_SENSORS: [Sensor; 6] = [
    Sensor::new("energy_day", "energiadia", "kWh", Some(numeric::ENERGY)),
    Sensor::new("energy_month", "energia_mes", "kWh", Some(numeric::ENERGY)),
    Sensor::new("power", "potencia", "kW", Some(numeric::POWER)),
    Sensor::new("capacity", "capacidade", "kW", Some(numeric::CAPACITY)),
    Sensor::new("yield_day", "yield_dia", "", None),
    Sensor::new("yield_month", "yield_mes", "", None),
];

/// Set every gauge the record has a value for; drop the ones it has not.
fn publish(
    gauge: &GaugeVec,
    labels: &[&str],
    sensors: &[Sensor],
    record: &Map<String, serde_json::Value>,
) {
    for sensor in sensors {
        let mut values = labels.to_vec();
        values.push(sensor.key);
        values.push(sensor.unit);

        match sensor.read(record) {
            Some(value) => gauge.with_label_values(&values).set(value),
            None => {
                /* Nothing to remove if it never had a value */
                let _ = gauge.remove_label_values(&values);
            }
        }
    }
}

fn publish_totals(totals: &AggregateTotals) {
    publish(&TOTAL_GAUGE, &[], &TOTAL_SENSORS, totals);
}

/// Plant figures are labelled with the id the service reports for the plant,
/// which differs from `plant_id` when the configured plant was not found.
fn publish_plant(summary: &PlantSummary, plant_id: &str) {
    if summary.is_empty() {
        log::warn!("No plant returned for id {}", plant_id);
        return;
    }

    let id = summary
        .get("id")
        .and_then(response::as_key)
        .unwrap_or_else(|| plant_id.to_owned());
    publish(&PLANT_GAUGE, &[id.as_str()], &PLANT_SENSORS, summary);
}

fn failure_kind(error: &Error) -> &'static str {
    if error.is_auth_error() {
        "auth"
    } else if error.is_api_error() {
        "api"
    } else {
        "communication"
    }
}

async fn fetch(api: &mut Api, plant_id: &str) -> Result<(PlantSummary, AggregateTotals), Error> {
    if !api.session().is_authenticated() {
        api::login(api).await?;
    }

    let summary = api::fetch_summary(api, plant_id).await?;
    let totals = api::fetch_totals(api).await?;
    Ok((summary, totals))
}

/// Poll plant `plant_id` and the account totals, updating Prometheus exporter registry.
///
/// Gauges are only touched when both requests succeed; otherwise they keep the
/// figures of the last successful poll.
pub async fn collect(api: &mut Api, plant_id: &str) -> Result<(), Error> {
    match fetch(api, plant_id).await {
        Ok((summary, totals)) => {
            publish_plant(&summary, plant_id);
            publish_totals(&totals);
            Ok(())
        }
        Err(e) => {
            UPDATE_FAILURES.with_label_values(&[failure_kind(&e)]).inc();
            Err(e)
        }
    }
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| Error::InternalError(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| Error::InternalError(e.to_string()))
}
