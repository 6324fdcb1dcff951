use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use anyhow::Context;
use log::{error, info};

use svetse_core::{Brain, Chain, Coordinator, CoordinatorHandle, Message, PersistenceWorker, SvetseConfig};

/// State shared by every HTTP worker.
struct SharedData {
	handle: CoordinatorHandle,
	brain: Arc<Brain>,
	chain: Arc<Chain>,
	nickname: String,
}

/// HTTP PUT endpoint `/v1/learn`
///
/// Queues the request body for learning and returns immediately.
#[put("/v1/learn")]
async fn put_learn(data: web::Data<SharedData>, body: String) -> impl Responder {
	data.handle.submit_learn(body);
	HttpResponse::Accepted().finish()
}

/// HTTP GET endpoint `/v1/reply`
///
/// Returns a reply generated after everything queued so far is learned.
#[get("/v1/reply")]
async fn get_reply(data: web::Data<SharedData>) -> impl Responder {
	let handle = data.handle.clone();
	match web::block(move || handle.request_reply()).await {
		Ok(Ok(reply)) => HttpResponse::Ok().body(reply),
		Ok(Err(e)) => {
			error!("Could not get a reply: {e}");
			HttpResponse::ServiceUnavailable().finish()
		}
		Err(e) => {
			error!("Reply task failed: {e}");
			HttpResponse::InternalServerError().finish()
		}
	}
}

/// HTTP POST endpoint `/v1/message`
///
/// Treats the body as a chat line. Lines mentioning the bot's nickname are
/// learned and answered; other lines are only learned (204).
#[post("/v1/message")]
async fn post_message(data: web::Data<SharedData>, body: String) -> impl Responder {
	let message = Message::route(&body, &data.nickname);
	let handle = data.handle.clone();
	match web::block(move || handle.dispatch(message)).await {
		Ok(Ok(Some(reply))) => HttpResponse::Ok().body(reply),
		Ok(Ok(None)) => HttpResponse::NoContent().finish(),
		Ok(Err(e)) => {
			error!("Could not handle message: {e}");
			HttpResponse::ServiceUnavailable().finish()
		}
		Err(e) => {
			error!("Message task failed: {e}");
			HttpResponse::InternalServerError().finish()
		}
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().json(data.chain.stats())
}

/// HTTP PUT endpoint `/v1/save`
///
/// Writes a snapshot now instead of waiting for the next tick.
#[put("/v1/save")]
async fn put_save(data: web::Data<SharedData>) -> impl Responder {
	let brain = Arc::clone(&data.brain);
	match web::block(move || brain.save()).await {
		Ok(Ok(())) => HttpResponse::Ok().body("Brain saved"),
		Ok(Err(e)) => {
			error!("Could not save brain to disk: {e}");
			HttpResponse::InternalServerError().body("Failed to save brain")
		}
		Err(e) => {
			error!("Save task failed: {e}");
			HttpResponse::InternalServerError().finish()
		}
	}
}

/// Main entry point for the server.
///
/// Opens the brain, starts the learn/reply workers and the persistence worker,
/// then serves the HTTP ingress until the server stops. The brain is saved
/// one last time on the way out.
///
/// # Notes
/// - Configuration comes from `$SVETSE_CONFIG` or `./svetse.toml`.
/// - Failing to open the brain location is fatal.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = SvetseConfig::load().context("failed to load configuration")?;
	let brain = Arc::new(
		Brain::open(&config.brain_path, config.prefix)
			.with_context(|| format!("failed to open brain {}", config.brain_path.display()))?,
	);
	let persistence = PersistenceWorker::spawn(Arc::clone(&brain), config.save_interval())
		.context("failed to start persistence worker")?;
	let coordinator = Coordinator::start(brain.chain(), config.words).context("failed to start workers")?;

	let shared_data = web::Data::new(SharedData {
		handle: coordinator.handle(),
		brain: Arc::clone(&brain),
		chain: brain.chain(),
		nickname: config.nickname.clone(),
	});

	info!("Listening on {}:{}", config.server.host, config.server.port);
	let server = HttpServer::new({
		let shared_data = shared_data.clone();
		move || {
			App::new()
				.wrap(Cors::permissive())
				.app_data(shared_data.clone())
				.service(put_learn)
				.service(get_reply)
				.service(post_message)
				.service(get_stats)
				.service(put_save)
		}
	})
		.bind((config.server.host.as_str(), config.server.port))
		.with_context(|| format!("failed to bind {}:{}", config.server.host, config.server.port))?
		.run();
	server.await.context("server error")?;

	coordinator.shutdown();
	persistence.stop();
	Ok(())
}
