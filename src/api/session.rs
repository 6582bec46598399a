use super::Error;
use std::fmt;

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials plus the token handed out by the last successful login.
///
/// The token is only ever replaced as a whole; a rejected token is not cleared,
/// the next login overwrites it.
pub struct Session {
    credentials: Credentials,
    token: Option<String>,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Session {
            credentials,
            token: None,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Token for an authenticated call; fails before anything hits the network.
    pub(crate) fn token(&self) -> Result<&str, Error> {
        self.token
            .as_deref()
            .ok_or_else(|| Error::AuthError("Attempted to call API without a token".to_string()))
    }

    pub(crate) fn replace_token(&mut self, token: String) {
        self.token = Some(token);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credentials", &self.credentials)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn session() -> Session {
        Session::new(Credentials {
            username: "user@example.com".to_string(),
            password: "hunter2".to_string(),
        })
    }

    #[test]
    fn starts_unauthenticated() {
        let session = session();
        assert!(!session.is_authenticated());
        assert!(matches!(session.token(), Err(Error::AuthError(_))));
    }

    #[test]
    fn token_replaced_wholesale() {
        let mut session = session();
        session.replace_token("first".to_string());
        assert_eq!("first", session.token().unwrap());
        session.replace_token("second".to_string());
        assert_eq!("second", session.token().unwrap());
    }

    #[test]
    fn secrets_not_in_debug_output() {
        let mut session = session();
        session.replace_token("secret-token".to_string());
        let printed = format!("{:?}", session);
        assert!(printed.contains("user@example.com"));
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("secret-token"));
    }
}
