use http::StatusCode;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use std::fmt;
use std::io::Cursor;

/// Maximum number of characters of an unparseable body kept for diagnostics.
pub const EXCERPT_LEN: usize = 100;

#[derive(Debug, Clone)]
pub enum Error {
    /// Credentials rejected, no token in the login response or no token to call with.
    AuthError(String),
    /// The service asked for a CAPTCHA token we cannot provide.
    CaptchaRequired(String),
    /// Non-success HTTP status from an authenticated endpoint.
    HttpStatus {
        endpoint: String,
        status: StatusCode,
    },
    /// Body parsed but `success` was not true.
    Unsuccessful { endpoint: String, body: String },
    /// Body could not be parsed as JSON.
    InvalidResponse { endpoint: String, excerpt: String },
    /// JSON did not have the expected shape.
    UnexpectedApiResponse(String),
    /// DNS, connection, timeout and other transport failures.
    CommunicationError(String),
    InternalError(String),
}

impl Error {
    /// Authentication failures; the caller may need new credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::AuthError(_) | Error::CaptchaRequired(_))
    }

    /// Any failure reported by the service itself, authentication included.
    pub fn is_api_error(&self) -> bool {
        !matches!(self, Error::CommunicationError(_) | Error::InternalError(_))
    }

    pub(crate) fn invalid_response(endpoint: &str, body: &str) -> Self {
        Error::InvalidResponse {
            endpoint: endpoint.to_owned(),
            excerpt: body.chars().take(EXCERPT_LEN).collect(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::CommunicationError(e.to_string())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AuthError(s) => write!(f, "authentication failed: {}", s),
            Error::CaptchaRequired(s) => write!(f, "login requires a CAPTCHA: {}", s),
            Error::HttpStatus { endpoint, status } => {
                write!(f, "HTTP {} when fetching {}", status.as_u16(), endpoint)
            }
            Error::Unsuccessful { endpoint, body } => {
                write!(f, "unsuccessful response from {}: {}", endpoint, body)
            }
            Error::InvalidResponse { endpoint, excerpt } => {
                write!(f, "unexpected content for {}: {}...", endpoint, excerpt)
            }
            Error::UnexpectedApiResponse(endpoint) => {
                write!(f, "unexpected response shape from {}", endpoint)
            }
            Error::CommunicationError(s) => {
                write!(f, "error communicating with SunWEG API: {}", s)
            }
            Error::InternalError(s) => write!(f, "internal error: {}", s),
        }
    }
}

impl std::error::Error for Error {}

fn html(status: Status, title: &str, detail: String) -> response::Result<'static> {
    let body = format!(
        "<html><body><h3>{}</h3><code>{}</code></body></html>",
        title, detail
    );
    Response::build()
        .status(status)
        .sized_body(body.len(), Cursor::new(body))
        .header(ContentType::new("text", "html"))
        .ok()
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        if self.is_auth_error() {
            return html(
                Status::Forbidden,
                "403 Forbidden",
                format!("Error while authenticating to SunWEG: {}", self),
            );
        }
        match self {
            Error::CommunicationError(_) => html(
                Status::BadGateway,
                "502 Bad Gateway",
                format!("SunWEG unreachable: {}", self),
            ),
            _ => html(
                Status::InternalServerError,
                "500 Internal Server Error",
                self.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn auth_errors_are_api_errors() {
        let auth = Error::AuthError("bad credentials".to_string());
        assert!(auth.is_auth_error());
        assert!(auth.is_api_error());

        let captcha = Error::CaptchaRequired("captcha".to_string());
        assert!(captcha.is_auth_error());
        assert!(captcha.is_api_error());
    }

    #[test]
    fn communication_is_not_api_error() {
        let e = Error::CommunicationError("connection refused".to_string());
        assert!(!e.is_api_error());
        assert!(!e.is_auth_error());

        let e = Error::HttpStatus {
            endpoint: "/gettotalizadores".to_string(),
            status: StatusCode::UNAUTHORIZED,
        };
        assert!(e.is_api_error());
        assert!(!e.is_auth_error());
    }

    #[test]
    fn invalid_response_is_truncated() {
        let body = "<html>".repeat(50);
        match Error::invalid_response("/getdadosresumo", &body) {
            Error::InvalidResponse { endpoint, excerpt } => {
                assert_eq!("/getdadosresumo", endpoint);
                assert_eq!(EXCERPT_LEN, excerpt.chars().count());
                assert!(body.starts_with(&excerpt));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }
}
