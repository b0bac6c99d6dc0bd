use super::{id_claim, parse_object, string_claim, string_list_claim, Decoder};
use crate::error::Error;
use crate::user::User;

/// Generic decoder mapping same-named JSON fields onto [`User`].
///
/// Reads `id`, `login`, `email`, `fullName`, `firstName`, `lastName` and `permissions`.
/// A numeric `id` is kept as its decimal string.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<User, Error> {
        let claims = parse_object(body)?;
        Ok(User {
            id: id_claim(&claims, "id"),
            login: string_claim(&claims, "login"),
            email: string_claim(&claims, "email"),
            full_name: string_claim(&claims, "fullName"),
            first_name: string_claim(&claims, "firstName"),
            last_name: string_claim(&claims, "lastName"),
            permissions: string_list_claim(&claims, "permissions"),
        })
    }
}
