use actix_web::{HttpResponse, Responder, get, post, web};
use log::warn;

use super::error_response;
use super::models::{CreateMessageRequest, PendingResponse};
use crate::message::Message;
use crate::node::Node;

/// Message signed by this node's wallet.
#[post("/message/")]
pub async fn post_message(
    node: web::Data<Node>,
    body: web::Json<CreateMessageRequest>,
) -> impl Responder {
    match node.submit_own_message(body.into_inner().into_draft()) {
        Ok(msg) => HttpResponse::Ok().json(msg),
        Err(e) => {
            warn!("POST /message/ - rejected: {e}");
            error_response(&e)
        }
    }
}

/// Message signed by the client.
#[post("/message/signed/")]
pub async fn post_signed_message(
    node: web::Data<Node>,
    body: web::Json<Message>,
) -> impl Responder {
    match node.submit_message(body.into_inner()) {
        Ok(msg) => HttpResponse::Ok().json(msg),
        Err(e) => {
            warn!("POST /message/signed/ - rejected: {e}");
            error_response(&e)
        }
    }
}

#[get("/pending/")]
pub async fn get_pending(node: web::Data<Node>) -> impl Responder {
    let messages = node.pending();
    HttpResponse::Ok().json(PendingResponse {
        size: messages.len(),
        messages,
    })
}

#[get("/messages/{address}/")]
pub async fn get_messages_for(node: web::Data<Node>, path: web::Path<(String,)>) -> impl Responder {
    let address = path.into_inner().0;
    HttpResponse::Ok().json(node.messages_for(&address))
}
