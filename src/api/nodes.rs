use actix_web::{HttpResponse, Responder, get, post, web};

use super::error_response;
use super::models::{NodeUrlRequest, NodesResponse};
use crate::node::Node;

#[post("/nodes/register/")]
pub async fn register_node(
    node: web::Data<Node>,
    body: web::Json<NodeUrlRequest>,
) -> impl Responder {
    let url = body.into_inner().url.trim().to_string();
    if url.is_empty() {
        return HttpResponse::BadRequest().body("url required");
    }
    node.register_peer(url);
    HttpResponse::Ok().json(NodesResponse { nodes: node.peers() })
}

#[get("/nodes/")]
pub async fn list_nodes(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(NodesResponse { nodes: node.peers() })
}

/// Pull the given peer's chain and replace ours with it.
#[post("/sync/")]
pub async fn synchronize(
    node: web::Data<Node>,
    body: web::Json<NodeUrlRequest>,
) -> impl Responder {
    match node.pull_from(body.url.trim()).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => error_response(&e),
    }
}
