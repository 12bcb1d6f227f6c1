use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use log::debug;
use rocket::{
    http::{Cookie, CookieJar, SameSite},
    time::Duration,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;

use super::{KeyValueStore, StoreError};

/// Per-client storage for an HTTP session: each key is a cookie whose value
/// is a JWT signed with the server secret.
///
/// Expired, forged, or renamed cookies read back as absent, so a client can
/// never plant a value the server did not write.
pub struct CookieStore<'r> {
    jar: &'r CookieJar<'r>,
    config: &'r Config,
}

impl<'r> CookieStore<'r> {
    pub fn new(jar: &'r CookieJar<'r>, config: &'r Config) -> Self {
        Self { jar, config }
    }
}

/// Cookie claims: the stored value, the key it was written under, and an
/// expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(rename = "sub")]
    key: String,
    #[serde(rename = "val")]
    value: String,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

impl KeyValueStore for CookieStore<'_> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        // Pending cookies include anything written earlier in this request.
        let cookie = match self.jar.get_pending(key) {
            Some(cookie) => cookie,
            None => return Ok(None),
        };

        let claims = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(self.config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data: TokenData<Claims>| data.claims);

        match claims {
            Ok(claims) if claims.key == key => Ok(Some(claims.value)),
            Ok(_) => {
                debug!("Ignoring cookie `{key}` signed for a different key");
                Ok(None)
            }
            Err(e) => {
                debug!("Ignoring cookie `{key}`: {e}");
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let ttl = self.config.session_ttl();
        let claims = Claims {
            key: key.to_string(),
            value: value.to_string(),
            expire_at: Utc::now() + ttl,
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret()),
        )?;

        self.jar.add(
            Cookie::build(key.to_string(), token)
                .max_age(Duration::seconds(ttl.num_seconds()))
                .http_only(true)
                .same_site(SameSite::Strict)
                .finish(),
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.jar.remove(Cookie::named(key.to_string()));
        Ok(())
    }
}
