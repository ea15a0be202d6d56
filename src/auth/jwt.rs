use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::Error};

/// Checks signature and expiry of an HS256 token signed with the shared secret.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
