// src/state.rs
// Shared application state handed to every HTTP handler via `State<Arc<AppState>>`.
// Grounded in the teacher's `state.rs::AppState::new` wiring order: config ->
// store -> cache -> clients -> derived NLP/perf components.

use std::sync::Arc;

use crate::cache::{CacheBackend, InProcessBackend, LayeredCache};
use crate::clients::embedding::EmbeddingClient;
use crate::clients::entity_extractor_client::LlmEntityExtractor;
use crate::clients::rerank::RerankClient;
use crate::clients::trajectory::TrajectoryClient;
use crate::config::AppConfig;
use crate::error::SearchResult;
use crate::nlp::entity_extractor::CachedEntityExtractor;
use crate::nlp::intent_router::IntentRouter;
use crate::nlp::query_parser::QueryParser;
use crate::ontology::ONTOLOGY;
use crate::perf::PerformanceTracker;
use crate::store::StoreAdapter;

pub struct AppState {
    pub config: &'static AppConfig,
    pub store: StoreAdapter,
    pub cache: LayeredCache,
    pub embedding_client: Arc<EmbeddingClient>,
    pub rerank_client: Option<RerankClient>,
    pub trajectory_client: Option<Arc<TrajectoryClient>>,
    pub query_parser: QueryParser<LlmEntityExtractor>,
    pub perf: PerformanceTracker,
}

impl AppState {
    pub async fn new(config: &'static AppConfig) -> SearchResult<Self> {
        let store = StoreAdapter::connect(config.store.clone()).await?;

        let cache_backend: Arc<dyn CacheBackend> = match &config.cache.redis_url {
            #[cfg(feature = "redis-cache")]
            Some(url) => Arc::new(
                crate::cache::RedisBackend::connect(url)
                    .await
                    .map_err(|e| crate::error::SearchError::dependency_unready(format!("redis connect: {e}")))?,
            ),
            _ => Arc::new(InProcessBackend::new()),
        };
        let cache = LayeredCache::new(cache_backend, &config.cache);

        let embedding_client = Arc::new(EmbeddingClient::new(config.embedding.clone()));

        let rerank_client = if config.rerank.enabled {
            let audience = config.rerank.audience.clone();
            let mint: crate::clients::rerank::Minter = Box::new(move |aud: &str| {
                format!("static-token-for-{}-{}", audience, aud)
            });
            Some(RerankClient::new(config.rerank.clone(), mint))
        } else {
            None
        };

        let trajectory_client = if config.trajectory.enabled {
            let client = Arc::new(TrajectoryClient::new(config.trajectory.clone()));
            client.spawn_health_poll();
            Some(client)
        } else {
            None
        };

        let intent_router = Arc::new(IntentRouter::new(
            embedding_client.clone() as Arc<dyn crate::nlp::intent_router::Embedder>,
            config.nlp.intent_confidence_threshold,
        ));
        intent_router.initialize().await?;

        let entity_extractor = CachedEntityExtractor::new(
            LlmEntityExtractor::new(config.entity_extractor.clone()),
            config.nlp.extraction_timeout_ms,
        );

        let query_parser = QueryParser::new(
            intent_router,
            entity_extractor,
            &ONTOLOGY,
            config.nlp.expansion_depth,
            config.nlp.expansion_min_confidence,
            config.nlp.expansion_decay,
            config.nlp.expansion_cap,
            config.nlp.intent_confidence_threshold,
        );

        let perf = PerformanceTracker::new(config.perf_window_size);

        Ok(Self {
            config,
            store,
            cache,
            embedding_client,
            rerank_client,
            trajectory_client,
            query_parser,
            perf,
        })
    }
}
