use crate::codec::{Decodable, Encodable};
use bytes::{Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;

/// Represented as a protobuf message
///
/// The wrapped message is encoded as protobuf when the request's `Accept`
/// header asks for it, and as JSON otherwise, so `T` needs both forms.
///
/// # Example
/// ```
/// # use serde::{Deserialize, Serialize};
/// # use micro_message::codec::Protobuf;
/// # use micro_message::protocol::Response;
/// #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
/// struct Ping {
///     #[prost(uint64, tag = "1")]
///     seq: u64,
/// }
///
/// let mut response = Response::default();
/// response.encode(Protobuf(Ping { seq: 1 }));
///
/// let Protobuf(ping): Protobuf<Ping> = response.decode().unwrap();
/// assert_eq!(ping.seq, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Protobuf<T>(pub T);

impl<T> Protobuf<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Serializes a message to its protobuf wire form.
pub fn marshal<M: prost::Message>(message: &M) -> Result<Bytes, prost::EncodeError> {
    let mut buf = BytesMut::with_capacity(message.encoded_len());
    message.encode(&mut buf)?;
    Ok(buf.freeze())
}

impl<T: prost::Message + Serialize> Encodable for Protobuf<T> {
    fn encode_protobuf(&self) -> Option<Result<Bytes, prost::EncodeError>> {
        Some(marshal(&self.0))
    }

    fn encode_json<W: io::Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer(writer, &self.0)
    }
}

impl<T: prost::Message + Default + DeserializeOwned> Decodable for Protobuf<T> {
    fn decode_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes).map(Protobuf)
    }

    fn decode_protobuf(bytes: &[u8]) -> Option<Result<Self, prost::DecodeError>> {
        Some(T::decode(bytes).map(Protobuf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
    struct Point {
        #[prost(sint32, tag = "1")]
        x: i32,
        #[prost(sint32, tag = "2")]
        y: i32,
        #[prost(string, tag = "3")]
        label: String,
    }

    #[test]
    fn marshal_matches_prost() {
        let point = Point { x: -3, y: 4, label: "p".into() };
        let bytes = marshal(&point).unwrap();
        assert_eq!(bytes.as_ref(), prost::Message::encode_to_vec(&point).as_slice());
    }

    #[test]
    fn both_forms_available() {
        let point = Protobuf(Point { x: 1, y: 2, label: String::new() });
        let wire = point.encode_protobuf().unwrap().unwrap();

        let Protobuf(decoded) = Protobuf::<Point>::decode_protobuf(&wire).unwrap().unwrap();
        assert_eq!(decoded, point.0);

        let mut json = Vec::new();
        point.encode_json(&mut json).unwrap();
        let Protobuf(from_json) = Protobuf::<Point>::decode_json(&json).unwrap();
        assert_eq!(from_json, point.0);
    }

    #[test]
    fn truncated_wire_data() {
        // field 3, length-delimited, claims 5 bytes but carries 1
        let result = Protobuf::<Point>::decode_protobuf(b"\x1a\x05a").unwrap();
        assert!(result.is_err());
    }
}
