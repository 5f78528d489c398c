use super::Dispatcher;
use crate::domain::constants::RpcErrorCode;
use crate::domain::errors::{ExplorerError, RequestError};
use crate::domain::models::BlockSource;
use crate::domain::rpc::{JsonRpcRequest, JsonRpcResponse, RpcOutcome};
use crate::domain::transform::{transform_block, transform_block_transactions, transform_transaction};
use crate::infrastructure::explorer_client::{short_signature, ExplorerClient};
use crate::infrastructure::upstream::UpstreamProxy;
use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::Instrument;
use typed_builder::TypedBuilder;

/// Routes JSON-RPC requests to the explorer-backed handlers or to the upstream node.
///
/// `getTransaction` and `getBlock` are answered from the explorer; every other
/// method, `getHealth` included, is forwarded unchanged.
#[derive(Clone, TypedBuilder)]
pub struct RpcDispatcher<E, P> {
    explorer: E,
    proxy: P,
    #[builder(default)]
    block_source: BlockSource,
}

#[async_trait::async_trait]
impl<E, P> Dispatcher for RpcDispatcher<E, P>
where
    E: ExplorerClient + Send + Sync + 'static,
    P: UpstreamProxy + Send + Sync + 'static,
{
    async fn dispatch(&self, request: JsonRpcRequest, raw_body: Bytes) -> RpcOutcome {
        let span = tracing::info_span!("rpc", method = %request.method, id = %request.id);
        async move {
            match request.method.as_str() {
                "getTransaction" => RpcOutcome::Response(self.get_transaction(&request).await),
                "getBlock" => RpcOutcome::Response(self.get_block(&request).await),
                _ => self.forward(&request, raw_body).await,
            }
        }
        .instrument(span)
        .await
    }
}

impl<E, P> RpcDispatcher<E, P>
where
    E: ExplorerClient + Send + Sync,
    P: UpstreamProxy + Send + Sync,
{
    async fn get_transaction(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let signature = match request
            .param(0)
            .and_then(Value::as_str)
            .filter(|signature| !signature.is_empty())
        {
            Some(signature) => signature,
            None => return JsonRpcResponse::invalid_params(id, RequestError::MissingSignature),
        };

        let start = Instant::now();
        match self.explorer.fetch_transaction(signature).await {
            Ok(tx) => {
                tracing::info!(
                    "getTransaction {}... slot={} {}ms",
                    short_signature(signature),
                    tx.block_id,
                    start.elapsed().as_millis()
                );
                result_response(id, &transform_transaction(&tx))
            }
            Err(e) => {
                tracing::info!(
                    "getTransaction {}... {} {}ms",
                    short_signature(signature),
                    miss_reason(&e),
                    start.elapsed().as_millis()
                );
                JsonRpcResponse::success(id, Value::Null)
            }
        }
    }

    async fn get_block(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        let slot = match parse_slot(request.param(0)) {
            Ok(slot) => slot,
            Err(e) => return JsonRpcResponse::invalid_params(id, e),
        };

        let start = Instant::now();
        let fetched = match self.block_source {
            BlockSource::Detail => self.explorer.fetch_block_detail(slot).await.map(|block| {
                (
                    block.transactions.len(),
                    result_response(id.clone(), &transform_block(&block)),
                )
            }),
            BlockSource::Transactions => self
                .explorer
                .fetch_block_transactions(slot)
                .await
                .map(|transactions| {
                    (
                        transactions.len(),
                        result_response(
                            id.clone(),
                            &transform_block_transactions(slot, &transactions),
                        ),
                    )
                }),
        };

        match fetched {
            Ok((count, response)) => {
                tracing::info!(
                    "getBlock {} txs={} {}ms",
                    slot,
                    count,
                    start.elapsed().as_millis()
                );
                response
            }
            Err(e) => {
                tracing::info!(
                    "getBlock {} {} {}ms",
                    slot,
                    miss_reason(&e),
                    start.elapsed().as_millis()
                );
                JsonRpcResponse::success(id, Value::Null)
            }
        }
    }

    async fn forward(&self, request: &JsonRpcRequest, raw_body: Bytes) -> RpcOutcome {
        let start = Instant::now();
        match self.proxy.forward(raw_body).await {
            Ok(response) => {
                tracing::debug!(
                    "proxied {} status={} {}ms",
                    request.method,
                    response.status,
                    start.elapsed().as_millis()
                );
                RpcOutcome::Proxied(response)
            }
            Err(e) => {
                tracing::error!("Upstream rpc error for {}: {:?}", request.method, e);
                RpcOutcome::Response(JsonRpcResponse::error(
                    request.id.clone(),
                    RpcErrorCode::INTERNAL_ERROR,
                    "Internal error",
                ))
            }
        }
    }
}

fn miss_reason(error: &ExplorerError) -> &'static str {
    if error.is_not_found() {
        "not found"
    } else {
        "unavailable"
    }
}

fn parse_slot(param: Option<&Value>) -> Result<u64, RequestError> {
    match param {
        None | Some(Value::Null) => Err(RequestError::MissingSlot),
        Some(value) => value.as_u64().ok_or(RequestError::InvalidSlot),
    }
}

fn result_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            tracing::error!("Failed to encode result: {:?}", e);
            JsonRpcResponse::error(id, RpcErrorCode::INTERNAL_ERROR, "Internal error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ProxyError;
    use crate::domain::models::{ExplorerBlock, ExplorerTransaction};
    use crate::domain::rpc::ProxiedResponse;
    use crate::infrastructure::explorer_client::MockExplorerClient;
    use crate::infrastructure::upstream::MockUpstreamProxy;
    use serde_json::json;

    const SIGNATURE: &str =
        "5gB15Z6S7ev7s1iv818RHrMY1uD54HHEukjBXtmusdmPHjTFzEFx3EUtJY9L9ijMHhqA5veGzttXvuhq6DUik31X";

    fn request(body: Value) -> (JsonRpcRequest, Bytes) {
        let raw = Bytes::from(serde_json::to_vec(&body).unwrap());
        (serde_json::from_value(body).unwrap(), raw)
    }

    fn dispatcher(
        explorer: MockExplorerClient,
        proxy: MockUpstreamProxy,
    ) -> RpcDispatcher<MockExplorerClient, MockUpstreamProxy> {
        RpcDispatcher::builder()
            .explorer(explorer)
            .proxy(proxy)
            .build()
    }

    fn response(outcome: RpcOutcome) -> JsonRpcResponse {
        match outcome {
            RpcOutcome::Response(response) => response,
            RpcOutcome::Proxied(proxied) => panic!("unexpected proxied response: {:?}", proxied),
        }
    }

    fn explorer_transaction() -> ExplorerTransaction {
        ExplorerTransaction {
            trans_id: SIGNATURE.to_string(),
            block_id: 161800848,
            trans_time: Some(1765738852),
            fee: 6431,
            log_messages: vec!["log1".to_string(), "log2".to_string()],
            recent_blockhash: Some("hash".to_string()),
            status: 1,
            ..Default::default()
        }
    }

    fn explorer_block() -> ExplorerBlock {
        serde_json::from_value(json!({
            "blockHeight": 161800848,
            "blockTime": 1765738852,
            "slot": 161800900,
            "blockhash": "blockhash123",
            "parentSlot": 161800899,
            "previousBlockhash": "prevhash123",
            "transactions": [{
                "transaction": {
                    "signatures": ["sig1"],
                    "message": {
                        "accountKeys": [{"pubkey": "key1", "writable": true, "signer": true, "source": "transaction"}],
                        "header": null,
                        "instructions": [{"programId": "key1", "accounts": [], "data": "data", "stackHeight": 1}],
                        "recentBlockhash": "hash"
                    }
                },
                "meta": {
                    "computeUnitsConsumed": 100,
                    "err": null,
                    "fee": 1000,
                    "innerInstructions": [],
                    "logMessages": [],
                    "postBalances": [100],
                    "postTokenBalances": [],
                    "preBalances": [200],
                    "preTokenBalances": [],
                    "rewards": null,
                    "status": {"Ok": null}
                },
                "version": 0
            }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn get_transaction_without_signature_is_invalid_params() {
        let mut explorer = MockExplorerClient::new();
        explorer.expect_fetch_transaction().never();
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getTransaction", "params": []}));
        let response = response(dispatcher.dispatch(req, raw).await);

        let error = response.error_object().unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "missing signature");
    }

    #[tokio::test]
    async fn get_transaction_with_empty_signature_is_invalid_params() {
        let mut explorer = MockExplorerClient::new();
        explorer.expect_fetch_transaction().never();
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getTransaction", "params": [""]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        assert_eq!(response.error_object().unwrap().code, -32602);
    }

    #[tokio::test]
    async fn get_transaction_returns_transformed_record() {
        let mut explorer = MockExplorerClient::new();
        explorer
            .expect_fetch_transaction()
            .withf(|signature| signature.to_string() == SIGNATURE)
            .times(1)
            .returning(|_| Ok(explorer_transaction()));
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getTransaction", "params": [SIGNATURE]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        let result = response.result().unwrap();
        assert_eq!(result["slot"], json!(161800848));
        assert_eq!(result["meta"]["fee"], json!(6431));
        assert_eq!(result["meta"]["err"], Value::Null);
        assert_eq!(response.id, json!(1));
    }

    #[tokio::test]
    async fn get_transaction_not_found_is_null_result() {
        let mut explorer = MockExplorerClient::new();
        explorer
            .expect_fetch_transaction()
            .returning(|_| Err(ExplorerError::NotFound));
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getTransaction", "params": ["notfound"]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        assert_eq!(response.result(), Some(&Value::Null));
    }

    #[tokio::test]
    async fn explorer_failure_is_indistinguishable_from_not_found() {
        let mut explorer = MockExplorerClient::new();
        explorer
            .expect_fetch_transaction()
            .returning(|_| Err(ExplorerError::Status(500)));
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getTransaction", "params": ["broken"]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        assert_eq!(response.result(), Some(&Value::Null));
    }

    #[tokio::test]
    async fn get_block_without_slot_is_invalid_params() {
        let mut explorer = MockExplorerClient::new();
        explorer.expect_fetch_block_detail().never();
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getBlock", "params": []}));
        let response = response(dispatcher.dispatch(req, raw).await);

        let error = response.error_object().unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "missing slot");
    }

    #[tokio::test]
    async fn get_block_with_non_numeric_slot_is_invalid_params() {
        let mut explorer = MockExplorerClient::new();
        explorer.expect_fetch_block_detail().never();
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getBlock", "params": ["latest"]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        let error = response.error_object().unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "invalid slot");
    }

    #[tokio::test]
    async fn get_block_not_found_is_null_result() {
        let mut explorer = MockExplorerClient::new();
        explorer
            .expect_fetch_block_detail()
            .returning(|_| Err(ExplorerError::NotFound));
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getBlock", "params": [161800848]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        assert_eq!(response.result(), Some(&Value::Null));
    }

    #[tokio::test]
    async fn get_block_explorer_failure_is_null_result() {
        let mut explorer = MockExplorerClient::new();
        explorer
            .expect_fetch_block_transactions()
            .withf(|slot| *slot == 161800848)
            .returning(|_| Err(ExplorerError::Status(500)));
        let dispatcher = RpcDispatcher::builder()
            .explorer(explorer)
            .proxy(MockUpstreamProxy::new())
            .block_source(BlockSource::Transactions)
            .build();

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getBlock", "params": [161800848]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        assert_eq!(response.result(), Some(&Value::Null));
        assert!(response.error_object().is_none());
    }

    #[test]
    fn miss_reason_separates_not_found_from_failures() {
        assert_eq!(miss_reason(&ExplorerError::NotFound), "not found");
        assert_eq!(miss_reason(&ExplorerError::Status(500)), "unavailable");
        assert_eq!(miss_reason(&ExplorerError::Unsuccessful), "unavailable");
        assert_eq!(miss_reason(&ExplorerError::MissingData), "unavailable");
    }

    #[tokio::test]
    async fn get_block_returns_transformed_block() {
        let mut explorer = MockExplorerClient::new();
        explorer
            .expect_fetch_block_detail()
            .withf(|slot| *slot == 161800848)
            .times(1)
            .returning(|_| Ok(explorer_block()));
        let dispatcher = dispatcher(explorer, MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getBlock", "params": [161800848]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        let result = response.result().unwrap();
        assert_eq!(result["blockHeight"], json!(161800848));
        assert_eq!(result["transactions"].as_array().unwrap().len(), 1);
        assert_eq!(
            result["transactions"][0]["transaction"]["message"]["instructions"][0]["programIdIndex"],
            json!(0)
        );
    }

    #[tokio::test]
    async fn get_block_from_transaction_list() {
        let mut explorer = MockExplorerClient::new();
        explorer.expect_fetch_block_detail().never();
        explorer
            .expect_fetch_block_transactions()
            .withf(|slot| *slot == 42)
            .returning(|_| Ok(vec![explorer_transaction()]));
        let dispatcher = RpcDispatcher::builder()
            .explorer(explorer)
            .proxy(MockUpstreamProxy::new())
            .block_source(BlockSource::Transactions)
            .build();

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getBlock", "params": [42]}));
        let response = response(dispatcher.dispatch(req, raw).await);

        let result = response.result().unwrap();
        assert_eq!(result["blockHeight"], json!(42));
        assert_eq!(result["transactions"][0]["slot"], json!(161800848));
    }

    #[tokio::test]
    async fn unknown_methods_are_forwarded_unmodified() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"getSlot"}"#;
        let upstream_body = r#"{"jsonrpc":"2.0","result":123456789012345678901234567890,"id":1}"#;

        let mut proxy = MockUpstreamProxy::new();
        proxy
            .expect_forward()
            .withf(move |raw| raw.as_ref() == body.as_bytes())
            .times(1)
            .returning(move |_| {
                Ok(ProxiedResponse {
                    status: 200,
                    body: Bytes::from_static(upstream_body.as_bytes()),
                })
            });
        let dispatcher = dispatcher(MockExplorerClient::new(), proxy);

        let req: JsonRpcRequest = serde_json::from_str(body).unwrap();
        let outcome = dispatcher.dispatch(req, Bytes::from_static(body.as_bytes())).await;

        assert_eq!(
            outcome,
            RpcOutcome::Proxied(ProxiedResponse {
                status: 200,
                body: Bytes::from_static(upstream_body.as_bytes()),
            })
        );
    }

    #[tokio::test]
    async fn get_health_is_forwarded() {
        let mut proxy = MockUpstreamProxy::new();
        proxy.expect_forward().times(1).returning(|_| {
            Ok(ProxiedResponse {
                status: 200,
                body: Bytes::from_static(br#"{"jsonrpc":"2.0","result":"ok","id":1}"#),
            })
        });
        let dispatcher = dispatcher(MockExplorerClient::new(), proxy);

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 1, "method": "getHealth"}));

        assert!(matches!(
            dispatcher.dispatch(req, raw).await,
            RpcOutcome::Proxied(_)
        ));
    }

    #[tokio::test]
    async fn proxy_failure_is_internal_error() {
        let mut proxy = MockUpstreamProxy::new();
        proxy.expect_forward().returning(|_| {
            let error = reqwest::Client::new().get("not a url").build().unwrap_err();
            Err(ProxyError::Request(error))
        });
        let dispatcher = dispatcher(MockExplorerClient::new(), proxy);

        let (req, raw) = request(json!({"jsonrpc": "2.0", "id": 9, "method": "getSlot"}));
        let response = response(dispatcher.dispatch(req, raw).await);

        assert_eq!(response.error_object().unwrap().code, -32603);
        assert_eq!(response.id, json!(9));
    }

    #[tokio::test]
    async fn missing_id_is_answered_with_zero() {
        let dispatcher = dispatcher(MockExplorerClient::new(), MockUpstreamProxy::new());

        let (req, raw) = request(json!({"jsonrpc": "2.0", "method": "getTransaction"}));
        let response = response(dispatcher.dispatch(req, raw).await);

        assert_eq!(response.id, json!(0));
    }
}
