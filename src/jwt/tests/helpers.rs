use crate::config::EngineConfig;
use crate::jwt::codec::{base64_url_encode, encode_signing_input, Claims};
use crate::jwt::sign::sign;
use crate::jwt::JwtService;
use crate::keys::PrivateKey;
use crate::test_support::single_key_provider;
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub(super) const ISSUER: &str = "https://idp.example.com";

pub(super) fn service_with(key: PrivateKey) -> JwtService {
    let mut config = EngineConfig::default();
    config.jwt.issuer = ISSUER.to_string();
    let provider = single_key_provider(&config.jwt.preferred_key_id, key);
    JwtService::new(&provider, &config).expect("service")
}

pub(super) fn claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => map,
        other => panic!("claims must be an object: {other}"),
    }
}

/// Signs arbitrary header and payload maps with `key`.
pub(super) fn sign_token(key: &PrivateKey, header: Value, payload: Value) -> String {
    let header = claims(header);
    let payload = claims(payload);
    let signing_input = encode_signing_input(&header, &payload).expect("signing input");
    let signature = sign(signing_input.as_bytes(), key.sign_algorithm(), key).expect("sign");
    format!("{}.{}", signing_input, base64_url_encode(&signature))
}

pub(super) fn token_with_claims(key: &PrivateKey, kid: &str, payload: Value) -> String {
    let alg = key.sign_algorithm().jws_algorithm().as_str();
    sign_token(key, json!({"alg": alg, "typ": "JWT", "kid": kid}), payload)
}

pub(super) fn tamper_payload(token: &str, payload: Value) -> String {
    let mut parts = token.split('.');
    let header = parts.next().expect("header");
    let _ = parts.next().expect("payload");
    let signature = parts.next().expect("signature");
    let payload = base64_url_encode(&serde_json::to_vec(&payload).expect("payload json"));
    format!("{header}.{payload}.{signature}")
}

/// Serves the given `(status line, body)` responses in order, one per
/// connection, from a background thread.
pub(super) fn serve_http_sequence(
    responses: Vec<(&'static str, String)>,
) -> (String, Arc<AtomicUsize>, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr = listener.local_addr().expect("addr");
    let count = Arc::new(AtomicUsize::new(0));
    let count_thread = Arc::clone(&count);
    let handle = thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_secs(10);
        while count_thread.load(Ordering::SeqCst) < responses.len() && Instant::now() < deadline {
            match listener.accept() {
                Ok((mut stream, _)) => {
                    let _ = stream.set_nonblocking(false);
                    let idx = count_thread.fetch_add(1, Ordering::SeqCst);
                    let (status, body) = &responses[idx];
                    let mut buf = [0u8; 2048];
                    let _ = stream.read(&mut buf);
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes());
                    let _ = stream.flush();
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });
    (format!("http://{}/jwks", addr), count, handle)
}

pub(super) fn serve_jwks(body: String) -> (String, Arc<AtomicUsize>, thread::JoinHandle<()>) {
    serve_http_sequence(vec![("200 OK", body)])
}
