use http::{Request, header};
use micro_message::codec::{Json, Protobuf};
use micro_message::protocol::body::Body;
use micro_message::protocol::{RequestHeader, Response};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Clone, PartialEq, prost::Message, Serialize, Deserialize)]
struct Greeting {
    #[prost(string, tag = "1")]
    message: String,
}

fn request(accept: &str) -> RequestHeader {
    Request::builder().uri("/greet").header(header::ACCEPT, accept).body(()).map(RequestHeader::from).unwrap_or_default()
}

fn greet(request: RequestHeader) -> Response {
    let mut response = Response::new(request);
    response.encode(Protobuf(Greeting { message: "hello world".into() }));
    response
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    for accept in ["application/json", "application/protobuf"] {
        let mut response = greet(request(accept));
        let content_type = response.headers().and_then(|headers| headers.get(header::CONTENT_TYPE)).cloned();
        info!(accept, ?content_type, payload_size = ?response.payload_size(), "encoded");

        match response.decode::<Protobuf<Greeting>>() {
            Ok(Protobuf(greeting)) => info!(message = %greeting.message, "decoded"),
            Err(e) => error!(cause = %e, "failed to decode"),
        }
    }

    // a foreign stream is copied into memory before it is appended to
    let mut response = Response::new(request("application/json"));
    response.encode(Body::from_reader(&b"streamed "[..]));
    if let Err(e) = response.write_all(b"and buffered") {
        error!(cause = %e, "failed to write");
    }
    match response.decode::<Json<String>>() {
        Ok(_) => info!("plain text decoded as json"),
        Err(e) => info!(cause = %e, %response, "body is not json"),
    }
}
