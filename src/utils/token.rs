use crate::middleware::auth::Claims;
use crate::models::user::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

pub fn issue_token(
    user: &User,
    secret: &str,
    expiration_hours: i64,
) -> jsonwebtoken::errors::Result<String> {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(expiration_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user.username.clone(),
        exp,
        role: Some(user.role().to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_token(token: &str, secret: &str) -> jsonwebtoken::errors::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> User {
        User {
            id: 1,
            username: "ada".into(),
            password_hash: String::new(),
            is_admin,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips_role() {
        let token = issue_token(&user(true), "secret", 1).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "ada");
        assert_eq!(claims.role.as_deref(), Some("admin"));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&user(false), "secret", 1).unwrap();
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(&user(false), "secret", -2).unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }
}
