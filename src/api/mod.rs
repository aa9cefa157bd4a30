mod balance;
mod chain;
mod health;
mod messages;
pub mod models;
mod nodes;
mod wallet;

use actix_web::HttpResponse;
use actix_web::web::{self, ServiceConfig};

use crate::error::ChainError;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::mine_block)
            .service(chain::receive_block)
            .service(messages::post_message)
            .service(messages::post_signed_message)
            .service(messages::get_pending)
            .service(messages::get_messages_for)
            .service(balance::get_balance)
            .service(nodes::register_node)
            .service(nodes::list_nodes)
            .service(nodes::synchronize)
            .service(wallet::create_wallet),
    );
}

/// Map a core error onto an HTTP status with the error text as body.
pub fn error_response(e: &ChainError) -> HttpResponse {
    let mut builder = match e {
        ChainError::Authorization => HttpResponse::Unauthorized(),
        ChainError::DuplicateBlock(_) => HttpResponse::Conflict(),
        ChainError::Network(_) => HttpResponse::BadGateway(),
        ChainError::Persistence(_) | ChainError::Serialization(_) => {
            HttpResponse::InternalServerError()
        }
        _ => HttpResponse::BadRequest(),
    };
    builder.body(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::init_routes;
    use crate::config::Config;
    use crate::message::Message;
    use crate::node::Node;
    use crate::store::FileStore;
    use crate::sync::HttpTransport;
    use crate::wallet::NodeKey;
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    fn test_node() -> (TempDir, web::Data<Node>) {
        let dir = tempdir().unwrap();
        let cfg = Config {
            difficulty: 1,
            ..Config::default()
        };
        let node = Node::bootstrap(
            &cfg,
            NodeKey::generate(),
            Box::new(FileStore::new(dir.path().join("chain.json"))),
            Arc::new(HttpTransport::new(1).unwrap()),
        );
        (dir, web::Data::new(node))
    }

    #[actix_web::test]
    async fn health_and_chain_listing() {
        let (_dir, node) = test_node();
        let app =
            test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/health/").to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get().uri("/api/v1/chain/").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["length"], 1);
        assert_eq!(body["chain"][0]["previousHash"], "");
    }

    #[actix_web::test]
    async fn mine_then_query_balance() {
        let (_dir, node) = test_node();
        let app =
            test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/mine/")
            .set_json(serde_json::json!({ "miner_address": "miner" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["mined_index"], 1);

        let req = test::TestRequest::get().uri("/api/v1/balance/miner/").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["balance"], 10);
    }

    #[actix_web::test]
    async fn rejected_submissions_map_to_client_errors() {
        let (_dir, node) = test_node();
        let app =
            test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/message/")
            .set_json(serde_json::json!({ "toAddress": "bob", "amount": 100 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let unsigned = Message::new("x", Some(node.address().to_string()), "bob", 0);
        let req = test::TestRequest::post()
            .uri("/api/v1/message/signed/")
            .set_json(&unsigned)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let genesis = node.chain()[0].clone();
        node.mine_pending(None).unwrap();
        let tip = node.chain()[1].clone();
        let req = test::TestRequest::post()
            .uri("/api/v1/block/")
            .set_json(&tip)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_ne!(genesis.hash, tip.hash);
    }

    #[actix_web::test]
    async fn peers_can_be_registered() {
        let (_dir, node) = test_node();
        let app =
            test::init_service(App::new().app_data(node.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/nodes/register/")
            .set_json(serde_json::json!({ "url": "http://localhost:3001" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["nodes"][0], "http://localhost:3001");
        assert_eq!(node.peers(), vec!["http://localhost:3001"]);
    }
}
