#![allow(dead_code)]

use p256::ecdsa::SigningKey as P256SigningKey;
use p256::pkcs8::{EncodePrivateKey, LineEnding};
use rand::thread_rng;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use token_engine::{
    EngineConfig, Error, JwtService, OAuthAppConfig, PemKeyProvider, UserProvider, UserRecord,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;

pub const ISSUER: &str = "https://idp.example.com";

const READ_TIMEOUT: Duration = Duration::from_millis(500);
const MAX_READ_DURATION: Duration = Duration::from_secs(6);
const MAX_HEADER_BYTES: usize = 64 * 1024;

pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl CapturedRequest {
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Answers exactly one connection with `response` and reports the request.
pub async fn serve_once(
    response: impl AsRef<[u8]>,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();
    let response = response.as_ref().to_vec();

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let req = read_request(&mut stream).await;
            let _ = tx.send(req);
            let _ = stream.write_all(&response).await;
        }
    });

    (format!("http://{}", addr), rx)
}

pub fn json_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let deadline = Instant::now() + MAX_READ_DURATION;
    let header_end = loop {
        if buf.len() >= MAX_HEADER_BYTES {
            panic!("request headers too large");
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            panic!("timed out reading request headers");
        }
        let read = match timeout(remaining.min(READ_TIMEOUT), stream.read(&mut chunk)).await {
            Ok(Ok(read)) => read,
            Ok(Err(e)) => panic!("read_request I/O error: {e}"),
            Err(_) => continue,
        };
        if read == 0 {
            break None;
        }
        buf.extend_from_slice(&chunk[..read]);
        if let Some(pos) = find_header_end(&buf) {
            break Some(pos);
        }
    };

    let Some(header_end) = header_end else {
        return CapturedRequest {
            method: "<incomplete>".to_string(),
            path: "<eof>".to_string(),
            headers: Vec::new(),
        };
    };
    let header_str = String::from_utf8_lossy(&buf[..header_end]);
    let mut lines = header_str.split("\r\n");
    let mut parts = lines.next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();
    CapturedRequest {
        method,
        path,
        headers,
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

pub fn p256_key_pem() -> String {
    P256SigningKey::random(&mut thread_rng())
        .to_pkcs8_pem(LineEnding::LF)
        .expect("pkcs8 pem")
        .to_string()
}

/// A fresh directory under the system temp dir.
pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("token-engine-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

/// Engine backed by a freshly generated P-256 key registered as `default-key`.
pub fn engine() -> JwtService {
    let provider = PemKeyProvider::builder()
        .add_pem("default-key", p256_key_pem().as_bytes(), None)
        .expect("add pem")
        .build()
        .expect("provider");
    let mut config = EngineConfig::default();
    config.jwt.issuer = ISSUER.to_string();
    JwtService::new(&provider, &config).expect("engine")
}

pub fn applications(apps: Vec<OAuthAppConfig>) -> HashMap<String, OAuthAppConfig> {
    apps.into_iter()
        .map(|app| (app.client_id.clone(), app))
        .collect()
}

/// Users keyed by id, each with a JSON attribute document and groups.
#[derive(Default)]
pub struct StaticUsers {
    pub users: HashMap<String, (serde_json::Value, Vec<String>)>,
}

impl UserProvider for StaticUsers {
    fn get_user(&self, user_id: &str) -> Result<UserRecord, Error> {
        let (attributes, _) = self
            .users
            .get(user_id)
            .ok_or_else(|| Error::UserLookup(format!("unknown user {user_id}")))?;
        Ok(UserRecord {
            id: user_id.to_string(),
            attributes: Some(serde_json::to_vec(attributes)?),
        })
    }

    fn get_user_groups(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<String>, Error> {
        let (_, groups) = self
            .users
            .get(user_id)
            .ok_or_else(|| Error::UserLookup(format!("unknown user {user_id}")))?;
        Ok(groups.iter().skip(offset).take(limit).cloned().collect())
    }
}
