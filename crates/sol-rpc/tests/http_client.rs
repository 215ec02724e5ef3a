//! Exercises `HttpRpcClient` against a one-shot local HTTP responder.

use serde_json::{json, Value};
use sol_rpc::{HttpRpcClient, RpcConfig, RpcError, SolanaRpc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accept one connection, capture the JSON body, reply with `status` and `body`.
async fn serve_once(status: u16, body: Value) -> (String, JoinHandle<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let (header_end, content_length) = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map(|v| v.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                break (pos + 4, length);
            }
        };
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }

        let request: Value =
            serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap();

        let payload = body.to_string();
        let reply = format!(
            "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
            payload.len()
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}"), handle)
}

fn client_for(url: &str) -> HttpRpcClient {
    let config = RpcConfig::new(url).unwrap().with_timeout_secs(5);
    HttpRpcClient::new(&config).unwrap()
}

#[tokio::test]
async fn latest_blockhash_round_trip() {
    let (url, server) = serve_once(
        200,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 1 },
                "value": {
                    "blockhash": "11111111111111111111111111111111",
                    "lastValidBlockHeight": 150
                }
            }
        }),
    )
    .await;

    let checkpoint = client_for(&url).get_latest_blockhash().await.unwrap();
    assert_eq!(checkpoint.blockhash, [0u8; 32]);
    assert_eq!(checkpoint.last_valid_block_height, 150);

    let request = server.await.unwrap();
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "getLatestBlockhash");
    assert_eq!(request["params"][0]["commitment"], "confirmed");
}

#[tokio::test]
async fn send_transaction_posts_base64_with_preflight() {
    let (url, server) = serve_once(
        200,
        json!({ "jsonrpc": "2.0", "id": 1, "result": "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW" }),
    )
    .await;

    let signature = client_for(&url)
        .send_transaction(&[1, 2, 3])
        .await
        .unwrap();
    assert!(signature.starts_with("5VERv8"));

    let request = server.await.unwrap();
    assert_eq!(request["method"], "sendTransaction");
    assert_eq!(request["params"][0], "AQID");
    assert_eq!(request["params"][1]["encoding"], "base64");
    assert_eq!(request["params"][1]["skipPreflight"], false);
    assert_eq!(request["params"][1]["preflightCommitment"], "confirmed");
}

#[tokio::test]
async fn node_rejection_surfaces_as_rpc_error() {
    let (url, server) = serve_once(
        200,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32002, "message": "Transaction simulation failed: Blockhash not found" }
        }),
    )
    .await;

    let err = client_for(&url).send_transaction(&[0u8; 4]).await.unwrap_err();
    assert!(matches!(err, RpcError::Rpc { code: -32002, .. }));
    assert!(!err.is_transport());
    server.await.unwrap();
}

#[tokio::test]
async fn missing_account_is_none() {
    let (url, server) = serve_once(
        200,
        json!({ "jsonrpc": "2.0", "id": 1, "result": { "context": { "slot": 9 }, "value": null } }),
    )
    .await;

    let info = client_for(&url).get_account_info(&[7u8; 32]).await.unwrap();
    assert!(info.is_none());

    let request = server.await.unwrap();
    assert_eq!(request["method"], "getAccountInfo");
    assert_eq!(request["params"][1]["encoding"], "base64");
}

#[tokio::test]
async fn token_accounts_query_filters_by_token_program() {
    let (url, server) = serve_once(
        200,
        json!({ "jsonrpc": "2.0", "id": 1, "result": { "context": { "slot": 3 }, "value": [] } }),
    )
    .await;

    let accounts = client_for(&url)
        .get_token_accounts_by_owner(&[8u8; 32])
        .await
        .unwrap();
    assert!(accounts.is_empty());

    let request = server.await.unwrap();
    assert_eq!(request["method"], "getTokenAccountsByOwner");
    assert_eq!(
        request["params"][1]["programId"],
        "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
    );
    assert_eq!(request["params"][2]["encoding"], "base64");
}

#[tokio::test]
async fn rent_exemption_minimum_is_plain_result() {
    let (url, server) =
        serve_once(200, json!({ "jsonrpc": "2.0", "id": 1, "result": 2_039_280 })).await;

    let lamports = client_for(&url)
        .get_minimum_balance_for_rent_exemption(165)
        .await
        .unwrap();
    assert_eq!(lamports, 2_039_280);

    let request = server.await.unwrap();
    assert_eq!(request["method"], "getMinimumBalanceForRentExemption");
    assert_eq!(request["params"][0], 165);
}

#[tokio::test]
async fn http_failure_without_json_is_transport() {
    let (url, server) = serve_once(503, json!("service unavailable")).await;

    let err = client_for(&url).get_balance(&[1u8; 32]).await.unwrap_err();
    assert!(err.is_transport(), "got {err:?}");
    server.await.unwrap();
}

#[tokio::test]
async fn rate_limited_json_error_is_transport() {
    let (url, server) = serve_once(
        429,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32429, "message": "rate limited" }
        }),
    )
    .await;

    let err = client_for(&url).send_transaction(&[0u8; 4]).await.unwrap_err();
    assert!(matches!(err, RpcError::Transport(_)), "got {err:?}");
    assert!(err.to_string().contains("429"));
    server.await.unwrap();
}

#[tokio::test]
async fn unreachable_endpoint_is_transport() {
    // Bind then drop to obtain a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client_for(&format!("http://{addr}"))
        .get_latest_blockhash()
        .await
        .unwrap_err();
    assert!(err.is_transport(), "got {err:?}");
}
