use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::{model::user::User, models::Claims};

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

pub fn generate_access_token(user: &User, secret: &str, ttl: usize) -> Result<String, Error> {
    let claims = Claims {
        user_id: user.id.clone(),
        sub: user.email.clone(),
        role: user.role.to_string(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        employee_id: user.employee_id.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn operator() -> User {
        User {
            id: "3".into(),
            name: "Pedro Costa".into(),
            email: "pedro@mdv.ao".into(),
            role: Role::Operator,
            employee_id: Some("c1".into()),
            active: true,
        }
    }

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let token = generate_access_token(&operator(), "secret", 900).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "pedro@mdv.ao");
        assert_eq!(claims.role, "operator");
        assert_eq!(claims.employee_id.as_deref(), Some("c1"));

        assert!(verify_token(&token, "other").is_err());
    }
}
