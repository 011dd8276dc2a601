use rust_router::config::{Config, DEFAULT_CONFIG_PATH};
use rust_router::logger;
use rust_router::server::shutdown_signal;
use rust_router::{Request, ResponseWriter, Router};
use serde_json::json;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load_from(DEFAULT_CONFIG_PATH)?;
    logger::init(&cfg.logging);

    // Create the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        info!("Using {workers} worker threads");
    } else {
        info!("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let mut router = Router::with_options(cfg.server_options());

    if let Some(policy) = cfg.cors.clone() {
        router.set_cors(policy);
    }
    if let Some(root) = &cfg.static_files.root {
        router.serve_static_files(root);
    }

    router
        .get("/health", |_req: Request, mut res: ResponseWriter| async move {
            res.json(&json!({ "status": "ok" }))?;
            Ok(res)
        })?
        .get("/hello/:name", |req: Request, mut res: ResponseWriter| async move {
            let name = req.param("name").unwrap_or("world").to_string();
            res.send(format!("Hello, {name}!"))?;
            Ok(res)
        })?
        .all("/echo", |req: Request, mut res: ResponseWriter| async move {
            if let Some(content_type) = req.header("content-type") {
                res.set("Content-Type", content_type);
            }
            res.send(req.body().clone())?;
            Ok(res)
        })?;

    router.listen_on(addr, cfg.tls_options()).await?;

    shutdown_signal().await?;
    router.close().await?;
    Ok(())
}
