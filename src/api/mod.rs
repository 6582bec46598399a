pub mod endpoint;
pub mod error;
pub mod response;
pub mod session;

use crate::model;
pub use error::Error;
use http::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use response::{GetDadosResumo, GetTotalizadores, Record};
use serde_json::{json, Value};
use session::{Credentials, Session};

pub const API_URL: &str = "https://api.sunweg.net/v2";

const USER_AGENT: &str = "Mozilla/5.0";
const ACCEPT_ANY: &str = "application/json, text/plain, */*";
const AUTH_TOKEN: &str = "X-Auth-Token-Update";

/// Whether the single re-login allowed per request has been spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reauth {
    NotAttempted,
    Attempted,
}

pub fn api(api_url: String, username: String, password: String) -> Result<model::Api, Error> {
    let client = reqwest::ClientBuilder::new()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::InternalError(e.to_string()))?;

    Ok(model::Api {
        api_url: api_url.trim_end_matches('/').to_owned(),
        session: Session::new(Credentials { username, password }),
        client,
    })
}

/// Authenticate with the stored credentials and replace the session token.
pub async fn login(api: &mut model::Api) -> Result<(), Error> {
    let url = format!("{}{}", api.api_url, endpoint::LOGIN);
    let credentials = api.session.credentials();

    /* No CAPTCHA fields: the service accepts API logins without them */
    let request_body = json!({
        "usuario": credentials.username,
        "senha": credentials.password,
        "rememberMe": false,
        "aceito": false,
    });

    let response = api
        .client
        .post(url)
        .header(CONTENT_TYPE, "application/json;charset=UTF-8")
        .header(ACCEPT, ACCEPT_ANY)
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        log::error!("Authentication failed, status {}", status);
        return Err(Error::AuthError(format!(
            "Authentication failed: HTTP {}",
            status.as_u16()
        )));
    }

    let text = response.text().await?;
    let value = serde_json::from_str::<Value>(&text)
        .map_err(|_| Error::invalid_response(endpoint::LOGIN, &text))?;

    let token = Some(&value)
        .filter(|v| response::is_success(v))
        .and_then(|v| v.get("token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());

    match token {
        Some(token) => {
            api.session.replace_token(token.to_owned());
            log::debug!("Logged in successfully, token set");
            Ok(())
        }
        None if response::mentions_captcha(&value) => {
            log::error!("Authentication rejected, CAPTCHA required");
            Err(Error::CaptchaRequired(
                "The service asked for a CAPTCHA token".to_string(),
            ))
        }
        None => {
            log::error!("Authentication response missing token");
            Err(Error::AuthError(
                "Invalid credentials or unexpected response".to_string(),
            ))
        }
    }
}

/// Authenticated GET returning the parsed JSON body.
///
/// A 401 triggers one re-login and one resend; whatever the resend returns is final.
async fn get(
    api: &mut model::Api,
    endpoint: &endpoint::Endpoint,
    query: &[(&str, &str)],
) -> Result<Value, Error> {
    let url = format!("{}{}", api.api_url, endpoint);
    let mut reauth = Reauth::NotAttempted;

    let response = loop {
        let request = api
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, ACCEPT_ANY)
            .header(AUTH_TOKEN, api.session.token()?);

        let response = request.send().await?;
        let status = response.status();

        match (status, reauth) {
            (StatusCode::UNAUTHORIZED, Reauth::NotAttempted) => {
                log::warn!("Token appears to have expired, attempting reauthentication");
                reauth = Reauth::Attempted;
                login(api).await?;
            }
            (status, _) if status.is_client_error() || status.is_server_error() => {
                return Err(Error::HttpStatus {
                    endpoint: endpoint.to_owned(),
                    status,
                });
            }
            _ => break response,
        }
    };

    let text = response.text().await?;
    log::trace!("endpoint: {}, response_text: {}", endpoint, text);

    serde_json::from_str::<Value>(&text).map_err(|_| Error::invalid_response(endpoint, &text))
}

fn ensure_success(endpoint: &endpoint::Endpoint, value: Value) -> Result<Value, Error> {
    if response::is_success(&value) {
        Ok(value)
    } else {
        Err(Error::Unsuccessful {
            endpoint: endpoint.to_owned(),
            body: value
                .to_string()
                .chars()
                .take(error::EXCERPT_LEN)
                .collect(),
        })
    }
}

/// Unfiltered plant list; see `endpoint::ALL_PLANTS_QUERY`.
async fn plants(api: &mut model::Api) -> Result<Vec<Record>, Error> {
    get(api, endpoint::SUMMARY, &endpoint::ALL_PLANTS_QUERY)
        .await
        .and_then(|value| ensure_success(endpoint::SUMMARY, value))
        .map(serde_json::from_value::<GetDadosResumo>)?
        .map(|response| response.usinas.unwrap_or_default())
        .map_err(|_| Error::UnexpectedApiResponse(endpoint::SUMMARY.to_owned()))
}

/// Pick `plant_id` out of `usinas`, falling back to the first plant, or nothing.
pub fn select_plant(usinas: Vec<Record>, plant_id: &str) -> model::PlantSummary {
    let position = usinas
        .iter()
        .position(|usina| {
            usina.get("id").and_then(response::as_key).as_deref() == Some(plant_id)
        })
        .unwrap_or(0);

    usinas.into_iter().nth(position).unwrap_or_default()
}

/// Current figures of `plant_id`.
///
/// The whole plant list is requested and filtered here rather than asking the
/// service for one plant: its server-side filter fails intermittently.
pub async fn fetch_summary(
    api: &mut model::Api,
    plant_id: &str,
) -> Result<model::PlantSummary, Error> {
    plants(api)
        .await
        .map(|usinas| select_plant(usinas, plant_id))
}

/// Totals across all plants of the account.
pub async fn fetch_totals(api: &mut model::Api) -> Result<model::AggregateTotals, Error> {
    get(api, endpoint::TOTALS, &[])
        .await
        .and_then(|value| ensure_success(endpoint::TOTALS, value))
        .map(serde_json::from_value::<GetTotalizadores>)?
        .map(|response| response.dados.unwrap_or_default())
        .map_err(|_| Error::UnexpectedApiResponse(endpoint::TOTALS.to_owned()))
}

/// Plant id to name for every plant with both fields set.
///
/// Only used to offer a choice of plants, so a failed listing yields an empty
/// directory. Transport and authentication failures are still returned.
pub async fn list_plants(api: &mut model::Api) -> Result<model::PlantDirectory, Error> {
    let usinas = match plants(api).await {
        Ok(usinas) => usinas,
        Err(e) if e.is_auth_error() || !e.is_api_error() => return Err(e),
        Err(e) => {
            log::warn!("Unable to list plants: {}", e);
            return Ok(model::PlantDirectory::new());
        }
    };

    Ok(usinas
        .iter()
        .filter_map(|usina| {
            let id = usina.get("id").and_then(response::as_key)?;
            let name = usina.get("nome").and_then(response::as_key)?;
            Some((id, name))
        })
        .collect())
}
