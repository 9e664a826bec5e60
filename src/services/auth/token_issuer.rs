use serde::Serialize;
use uuid::Uuid;

use crate::services::auth::jwt::{IssuerError, JwtIssuer};
use crate::services::oauth::{Arguments, BindingMode};

#[derive(Debug, Serialize)]
struct AccessTokenClaims {
    iss: String,
    aud: String,
    sub: String,
    client_id: String,
    iat: i64,
    exp: i64,
    jti: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cnf: Option<CnfClaim>,
}

// Confirmation claim of a sender-constrained token (RFC 9449 section 6.1).
#[derive(Debug, Serialize)]
struct CnfClaim {
    jkt: String,
}

#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub access_token: String,
    pub binding: BindingMode,
    pub expires_in: u64,
}

#[derive(Clone, Debug)]
pub struct TokenIssuer {
    jwt: JwtIssuer,
}

impl TokenIssuer {
    pub fn new(jwt: JwtIssuer) -> Self {
        Self { jwt }
    }

    /// Issue an access token.
    ///
    /// The key binding is passed explicitly: `Some(jkt)` mints a DPoP-bound
    /// token carrying `cnf.jkt`, `None` mints a bearer token.
    pub fn issue_access_token(
        &self,
        subject: &str,
        client_id: &str,
        scope: &Arguments,
        jkt: Option<&str>,
    ) -> Result<IssuedAccessToken, IssuerError> {
        let now = chrono::Utc::now().timestamp();
        let exp = now + self.jwt.ttl_seconds() as i64;

        let claims = AccessTokenClaims {
            iss: self.jwt.issuer().to_string(),
            aud: self.jwt.audience().to_string(),
            sub: subject.to_string(),
            client_id: client_id.to_string(),
            iat: now,
            exp,
            jti: Uuid::new_v4().to_string(),
            scope: (!scope.is_empty()).then(|| scope.to_space_delimited()),
            cnf: jkt.map(|jkt| CnfClaim {
                jkt: jkt.to_string(),
            }),
        };

        let binding = if claims.cnf.is_some() {
            BindingMode::Dpop
        } else {
            BindingMode::Bearer
        };

        Ok(IssuedAccessToken {
            access_token: self.jwt.sign(&claims)?,
            binding,
            expires_in: self.jwt.ttl_seconds(),
        })
    }
}
