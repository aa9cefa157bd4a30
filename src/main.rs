mod api;
mod blockchain;
mod config;
mod error;
mod message;
mod node;
mod store;
mod sync;
mod wallet;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use config::Config;
use node::Node;
use store::FileStore;
use sync::HttpTransport;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    let key = config.node_key().map_err(std::io::Error::other)?;
    let transport = HttpTransport::new(config.peer_timeout_secs).map_err(std::io::Error::other)?;

    let node = Node::bootstrap(
        &config,
        key,
        Box::new(FileStore::new(&config.chain_file)),
        Arc::new(transport),
    );
    info!(
        "⛓️ Starting messenger chain at http://{}:{} (wallet {}, difficulty {})",
        config.host,
        config.port,
        node.address(),
        config.difficulty
    );

    let state = web::Data::new(node);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
