use crate::codec::{Decodable, Encodable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;

/// Represented as json data
///
/// Encoding a `Json` always produces `application/json`, whatever the request
/// accepts; decoding reads the body as JSON unless it is labelled protobuf.
///
/// # Example
/// ```
/// # use serde::Deserialize;
/// # use micro_message::codec::Json;
/// # use micro_message::protocol::{Response, ResponseError};
/// # #[allow(dead_code)]
/// #[derive(Deserialize, Debug)]
/// struct User {
///     name: String,
///     zip: String,
/// }
///
/// fn user(response: &mut Response) -> Result<User, ResponseError> {
///     let Json(user) = response.decode()?;
///     Ok(user)
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> Encodable for Json<T> {
    fn encode_json<W: io::Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer(writer, &self.0)
    }
}

impl<T: DeserializeOwned> Decodable for Json<T> {
    fn decode_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes).map(Json)
    }
}
