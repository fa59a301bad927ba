use prediction_relay::{
    Result,
    config::ServerConfig,
    llm::{LlmClient, Predictor},
    server::{PredictionResponse, Server, ServerHandle},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    task::JoinHandle,
};

pub const TEST_MODEL: &str = "llama3.2:latest";

pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
    pub task: JoinHandle<Result<()>>,
}

/// Create a server config bound to an ephemeral local port
pub fn create_test_server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

pub async fn spawn_server(llm: Arc<dyn LlmClient>) -> TestServer {
    spawn_server_with(llm, create_test_server_config()).await
}

pub async fn spawn_server_with(llm: Arc<dyn LlmClient>, config: ServerConfig) -> TestServer {
    let server = Server::bind(&config, Predictor::new(llm, TEST_MODEL))
        .await
        .expect("Failed to bind test server");
    let addr = server.local_addr().unwrap();
    let handle = server.handle();
    let task = tokio::spawn(server.run());

    TestServer { addr, handle, task }
}

/// Writes `payload`, optionally half-closes, and returns every byte the server sent.
pub async fn send_raw(addr: SocketAddr, payload: &[u8], close_write: bool) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(payload).await.unwrap();
    if close_write {
        stream.shutdown().await.unwrap();
    }

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    reply
}

/// Sends a JSON request and decodes the single response line.
pub async fn request_prediction(addr: SocketAddr, request: serde_json::Value) -> PredictionResponse {
    let reply = send_raw(addr, request.to_string().as_bytes(), false).await;
    decode_reply(&reply)
}

pub fn decode_reply(reply: &[u8]) -> PredictionResponse {
    assert_eq!(reply.last(), Some(&b'\n'), "response must end with a newline");
    serde_json::from_slice(reply).expect("response is not a prediction object")
}
