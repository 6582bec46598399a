use serde::Deserialize;
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

/* GET /getdadosresumo */
#[derive(Deserialize)]
pub struct GetDadosResumo {
    #[serde(default)]
    pub usinas: Option<Vec<Record>>,
}

/* GET /gettotalizadores */
#[derive(Deserialize)]
pub struct GetTotalizadores {
    #[serde(default)]
    pub dados: Option<Record>,
}

/// `success` flag of a response body; anything but `true` counts as failure.
pub fn is_success(value: &Value) -> bool {
    value
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Whether a rejected login hints at a CAPTCHA challenge, either as a field or in a message.
pub fn mentions_captcha(value: &Value) -> bool {
    value.to_string().to_lowercase().contains("captcha")
}

/// Render an identifier field the way plant ids are compared: strings as they
/// are, numbers in their decimal form, anything else (null included) as absent.
pub fn as_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_owned()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
