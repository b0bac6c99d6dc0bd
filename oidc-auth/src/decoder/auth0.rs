use super::{parse_object, string_claim, Decoder};
use crate::error::Error;
use crate::user::User;

/// Prefix Auth0 puts in front of subjects federated from Google.
const GOOGLE_SUBJECT_PREFIX: &str = "google-oauth2|";

/// Decoder for Auth0 userinfo responses, see <https://auth0.com/docs>.
#[derive(Debug, Clone, Copy, Default)]
pub struct Auth0Decoder;

impl Decoder for Auth0Decoder {
    fn decode(&self, body: &[u8]) -> Result<User, Error> {
        let claims = parse_object(body)?;
        let subject = string_claim(&claims, "sub");

        Ok(User {
            id: subject
                .strip_prefix(GOOGLE_SUBJECT_PREFIX)
                .unwrap_or(&subject)
                .to_string(),
            login: string_claim(&claims, "nickname"),
            email: string_claim(&claims, "email"),
            full_name: string_claim(&claims, "name"),
            first_name: string_claim(&claims, "given_name"),
            last_name: string_claim(&claims, "family_name"),
            permissions: Vec::new(),
        })
    }
}
