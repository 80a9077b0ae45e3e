use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use constant_time_eq::constant_time_eq;
use zeroize::Zeroizing;

/// Realm advertised in `WWW-Authenticate` challenges.
pub const REALM: &str = "Galeria";

/// The single login/password pair that may access the gallery.
#[derive(Clone)]
pub struct Credentials {
    login: String,
    password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: Zeroizing<String>) -> Self {
        Self {
            login: login.into(),
            password,
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    /// Compare a presented pair against the configured one.
    ///
    /// Both fields are always compared so a wrong login costs the same as a
    /// wrong password.
    pub fn verify(&self, presented: &BasicCredentials) -> bool {
        let login_ok =
            constant_time_eq(self.login.as_bytes(), presented.login.as_bytes());
        let password_ok = constant_time_eq(
            self.password.as_bytes(),
            presented.password.as_bytes(),
        );
        login_ok & password_ok
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A login/password pair decoded from an `Authorization` header.
pub struct BasicCredentials {
    pub login: String,
    pub password: Zeroizing<String>,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// Decode `Basic <base64(login:password)>`.
///
/// The scheme is matched case-insensitively. Returns `None` for any other
/// scheme, invalid base64, non UTF-8 payloads or a payload without a colon.
/// The password may itself contain colons.
pub fn parse_basic_authorization(value: &str) -> Option<BasicCredentials> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = Zeroizing::new(STANDARD.decode(encoded.trim()).ok()?);
    let text = std::str::from_utf8(&decoded).ok()?;
    let (login, password) = text.split_once(':')?;

    Some(BasicCredentials {
        login: login.to_string(),
        password: Zeroizing::new(password.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_for(login: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{login}:{password}")))
    }

    fn credentials() -> Credentials {
        Credentials::new("guest", Zeroizing::new("s3cret".to_string()))
    }

    #[test]
    fn parses_a_well_formed_header() {
        let parsed = parse_basic_authorization(&header_for("guest", "s3cret"))
            .expect("valid header");
        assert_eq!(parsed.login, "guest");
        assert_eq!(parsed.password.as_str(), "s3cret");
    }

    #[test]
    fn password_may_contain_colons() {
        let parsed = parse_basic_authorization(&header_for("guest", "a:b:c"))
            .expect("valid header");
        assert_eq!(parsed.password.as_str(), "a:b:c");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let header = header_for("guest", "s3cret").replacen("Basic", "bAsIc", 1);
        assert!(parse_basic_authorization(&header).is_some());
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(parse_basic_authorization("Bearer abc").is_none());
        assert!(parse_basic_authorization("Basic").is_none());
        assert!(parse_basic_authorization("Basic !!!not-base64!!!").is_none());
        let no_colon = format!("Basic {}", STANDARD.encode("guest"));
        assert!(parse_basic_authorization(&no_colon).is_none());
    }

    #[test]
    fn verify_requires_both_fields() {
        let creds = credentials();
        let ok = parse_basic_authorization(&header_for("guest", "s3cret")).unwrap();
        let wrong_pw = parse_basic_authorization(&header_for("guest", "nope")).unwrap();
        let wrong_login = parse_basic_authorization(&header_for("admin", "s3cret")).unwrap();
        let prefix = parse_basic_authorization(&header_for("guest", "s3cre")).unwrap();

        assert!(creds.verify(&ok));
        assert!(!creds.verify(&wrong_pw));
        assert!(!creds.verify(&wrong_login));
        assert!(!creds.verify(&prefix));
    }

    #[test]
    fn debug_hides_the_password() {
        let rendered = format!("{:?}", credentials());
        assert!(!rendered.contains("s3cret"));
    }
}
