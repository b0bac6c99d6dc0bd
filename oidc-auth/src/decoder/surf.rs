use super::{id_claim, parse_object, string_claim, Decoder};
use crate::error::Error;
use crate::user::User;

/// Decoder for SURFconext, see
/// <https://wiki.surfnet.nl/display/surfconextdev/OpenID+Connect+features>.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfDecoder;

impl Decoder for SurfDecoder {
    fn decode(&self, body: &[u8]) -> Result<User, Error> {
        let claims = parse_object(body)?;
        Ok(User {
            id: id_claim(&claims, "eduid"),
            login: string_claim(&claims, "eduperson_principal_name"),
            email: string_claim(&claims, "email"),
            full_name: string_claim(&claims, "name"),
            first_name: string_claim(&claims, "given_name"),
            last_name: string_claim(&claims, "family_name"),
            permissions: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_surf_claims() {
        let body = br#"{
            "eduid": "e-123",
            "eduperson_principal_name": "student@uni.test",
            "email": "student@uni.test",
            "given_name": "Sam",
            "family_name": "Student",
            "name": "Sam Student"
        }"#;

        let user = SurfDecoder.decode(body).unwrap();
        assert_eq!(user.id, "e-123");
        assert_eq!(user.login, "student@uni.test");
        assert_eq!(user.full_name, "Sam Student");
    }

    #[test]
    fn test_decode_malformed() {
        assert!(SurfDecoder.decode(b"<html>").is_err());
    }
}
