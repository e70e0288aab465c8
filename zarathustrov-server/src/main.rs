use std::collections::BTreeMap;
use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use serde::{Deserialize, Serialize};

use zarathustrov_core::model::cache;
use zarathustrov_core::model::snapshot::APPEARANCES_KEY;
use zarathustrov_core::{CorpusRange, Generator, GeneratorConfig, ModelBuilder, Tree};

/// Largest `max_len` a client may ask for.
const MAX_LEN_LIMIT: usize = 10_000;

/// Largest `max_attempts` a client may ask for.
const MAX_ATTEMPTS_LIMIT: usize = 1_000;

/// Preview server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "zarathustrov-server", about = "Serves Markov-generated posts over HTTP")]
struct ServerConfig {
	/// Corpus text file
	#[arg(long, env = "ZARATHUSTROV_CORPUS", default_value = "assets/corpus.txt")]
	corpus: PathBuf,

	/// First byte of the corpus to learn from
	#[arg(long, env = "ZARATHUSTROV_START", default_value = "0")]
	start: usize,

	/// Byte after the last one to learn from
	#[arg(long, env = "ZARATHUSTROV_END")]
	end: Option<usize>,

	/// Always rebuild the tree instead of using the binary cache
	#[arg(long)]
	no_cache: bool,

	/// Default maximum post length
	#[arg(long, default_value = "280")]
	max_len: usize,

	/// Words always capitalized (repeatable or comma separated)
	#[arg(long = "proper-noun", value_delimiter = ',', default_values_t = [String::from("i"), String::from("zarathustra")])]
	proper_nouns: Vec<String>,

	/// Address to bind
	#[arg(long, env = "ZARATHUSTROV_HOST", default_value = "127.0.0.1")]
	host: String,

	/// Port to bind
	#[arg(long, env = "ZARATHUSTROV_PORT", default_value = "5000")]
	port: u16,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	max_len: Option<usize>,
	max_attempts: Option<usize>,
}

/// Read-only state shared by every worker, no lock needed.
struct SharedData {
	tree: Tree,
	config: GeneratorConfig,
}

#[derive(Serialize)]
struct Stats {
	keys: usize,
	total: u64,
}

impl GenerateParams {
	/// Applies the query parameters on top of the server defaults.
	fn generator_config(&self, defaults: &GeneratorConfig) -> Result<GeneratorConfig, String> {
		let max_len = self.max_len.unwrap_or(defaults.max_len);
		if max_len == 0 || max_len > MAX_LEN_LIMIT {
			return Err(format!("max_len must be between 1 and {}", MAX_LEN_LIMIT));
		}

		let max_attempts = self.max_attempts.unwrap_or(defaults.max_attempts);
		if max_attempts == 0 || max_attempts > MAX_ATTEMPTS_LIMIT {
			return Err(format!("max_attempts must be between 1 and {}", MAX_ATTEMPTS_LIMIT));
		}

		Ok(GeneratorConfig { max_len, max_attempts, ..defaults.clone() })
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Generates one post from the shared tree.
/// Returns the text as the response body.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<SharedData>, query: web::Query<GenerateParams>) -> impl Responder {
	let config = match query.generator_config(&data.config) {
		Ok(c) => c,
		Err(e) => return HttpResponse::BadRequest().body(e),
	};

	let generator = match Generator::new(&data.tree, config) {
		Ok(g) => g,
		Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
	};

	match generator.generate(&mut rand::rng()) {
		Ok(text) => HttpResponse::Ok().body(text),
		Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().json(Stats { keys: data.tree.len(), total: data.tree.total() })
}

/// HTTP GET endpoint `/v1/successors/{token}`
///
/// Returns the successor counts of a key in the snapshot format.
#[get("/v1/successors/{token}")]
async fn get_successors(data: web::Data<SharedData>, path: web::Path<String>) -> impl Responder {
	let token = path.into_inner().to_ascii_lowercase();
	let node = match data.tree.node(&token) {
		Some(node) => node,
		None => return HttpResponse::NotFound().body(format!("Unknown token '{}'", token)),
	};

	let mut entries: BTreeMap<&str, u64> = node.successors().collect();
	entries.insert(APPEARANCES_KEY, node.appearances());
	HttpResponse::Ok().json(entries)
}

fn load_tree(config: &ServerConfig) -> Result<Tree, zarathustrov_core::ModelError> {
	let range = CorpusRange::new(config.start, config.end);
	if config.no_cache {
		ModelBuilder::from_file(&config.corpus, range)
	} else {
		cache::load_or_build(&config.corpus, range)
	}
}

/// Main entry point for the server.
///
/// Builds the tree once, shares it read-only between workers,
/// and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	let config = ServerConfig::parse();
	env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

	let tree = load_tree(&config).map_err(|e| {
		error!("Cannot load corpus {}: {}", config.corpus.display(), e);
		std::io::Error::other(e)
	})?;

	let generator_config = GeneratorConfig { max_len: config.max_len, ..GeneratorConfig::default() }
		.with_proper_nouns(&config.proper_nouns);
	if let Err(e) = Generator::new(&tree, generator_config.clone()) {
		error!("Cannot generate from {}: {}", config.corpus.display(), e);
		return Err(std::io::Error::other(e));
	}

	let shared_data = web::Data::new(SharedData { tree, config: generator_config });

	info!("Listening on {}:{}", config.host, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET"]))
			.app_data(shared_data.clone())
			.service(get_generated)
			.service(get_stats)
			.service(get_successors)
	})
		.bind((config.host.as_str(), config.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::http::StatusCode;
	use actix_web::test;

	fn shared_data() -> web::Data<SharedData> {
		let tree = ModelBuilder::from_corpus(b"the cat sat. the dog ran!", CorpusRange::full()).unwrap();
		web::Data::new(SharedData { tree, config: GeneratorConfig::default() })
	}

	macro_rules! app {
		() => {
			test::init_service(
				App::new()
					.app_data(shared_data())
					.service(get_generated)
					.service(get_stats)
					.service(get_successors),
			)
			.await
		};
	}

	#[actix_web::test]
	async fn test_generate() {
		let app = app!();
		let req = test::TestRequest::get().uri("/v1/generate?max_len=100").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::OK);

		let body = test::read_body(resp).await;
		let text = std::str::from_utf8(&body).unwrap();
		assert!(text.len() <= 100);
		assert!(text.ends_with('.') || text.ends_with('!'), "{text}");
	}

	#[actix_web::test]
	async fn test_generate_rejects_bad_params() {
		let app = app!();
		for uri in ["/v1/generate?max_len=0", "/v1/generate?max_attempts=0", "/v1/generate?max_len=99999"] {
			let req = test::TestRequest::get().uri(uri).to_request();
			let resp = test::call_service(&app, req).await;
			assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
		}
	}

	#[actix_web::test]
	async fn test_stats() {
		let app = app!();
		let req = test::TestRequest::get().uri("/v1/stats").to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["keys"], 5);
		assert_eq!(body["total"], 6);
	}

	#[actix_web::test]
	async fn test_successors() {
		let app = app!();
		let req = test::TestRequest::get().uri("/v1/successors/The").to_request();
		let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
		assert_eq!(body["cat"], 1);
		assert_eq!(body["dog"], 1);
		assert_eq!(body["_appearances"], 2);

		let req = test::TestRequest::get().uri("/v1/successors/zebra").to_request();
		let resp = test::call_service(&app, req).await;
		assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	}

	#[actix_web::test]
	async fn test_params_fall_back_to_defaults() {
		let params = GenerateParams { max_len: None, max_attempts: Some(3) };
		let config = params.generator_config(&GeneratorConfig::default()).unwrap();
		assert_eq!(config.max_len, 280);
		assert_eq!(config.max_attempts, 3);
		assert!(config.proper_nouns.contains("i"));
	}
}
