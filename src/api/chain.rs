use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::error_response;
use super::models::{
    BlockAcceptedResponse, ChainResponse, MineRequest, MineResponse, ValidateResponse,
};
use crate::blockchain::Block;
use crate::node::Node;

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(node: web::Data<Node>) -> impl Responder {
    let chain = node.chain();
    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        difficulty: node.difficulty(),
        chain,
    })
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(ValidateResponse {
        valid: node.is_valid(),
        length: node.chain_len(),
    })
}

/// Mine the pending pool into a new block, then notify peers.
/// The PoW search runs on the blocking pool.
#[post("/mine/")]
pub async fn mine_block(
    node: web::Data<Node>,
    req: Option<web::Json<MineRequest>>,
) -> impl Responder {
    let miner_address = req
        .and_then(|r| r.into_inner().miner_address)
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let worker = node.clone();
    let mined = web::block(move || worker.mine_pending(miner_address.as_deref())).await;

    let block = match mined {
        Ok(Ok(block)) => block,
        Ok(Err(e)) => {
            warn!("POST /mine/ - failed: {e}");
            return error_response(&e);
        }
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };

    let peers_notified = node.broadcast_block(&block).len();
    let resp = MineResponse {
        mined_index: node.chain_len().saturating_sub(1),
        hash: block.hash.clone(),
        nonce: block.nonce,
        messages: block.messages.len(),
        peers_notified,
    };
    info!(
        "MINER - sealed block #{} (hash={}, nonce={})",
        resp.mined_index, resp.hash, resp.nonce
    );
    HttpResponse::Ok().json(resp)
}

/// Block mined by a peer.
#[post("/block/")]
pub async fn receive_block(node: web::Data<Node>, body: web::Json<Block>) -> impl Responder {
    let block = body.into_inner();
    let hash = block.hash.clone();
    match node.receive_block(block) {
        Ok(()) => HttpResponse::Ok().json(BlockAcceptedResponse {
            accepted: true,
            hash,
        }),
        Err(e) => {
            warn!("POST /block/ - rejected {hash}: {e}");
            error_response(&e)
        }
    }
}
