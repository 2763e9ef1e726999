// src/config/mod.rs
// Central configuration, composed from domain sub-configs. Each sub-config
// loads from environment variables; the whole thing is loaded once into a
// process-wide `CONFIG` static.

pub mod helpers;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: helpers::env_or("SEARCH_HOST", "0.0.0.0"),
            port: helpers::env_parsed_or("SEARCH_PORT", 8080u16),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    pub schema: String,
    pub embeddings_table: String,
    pub profiles_table: String,
    pub embedding_dimensions: usize,
    pub pool_min: u32,
    pub pool_max: u32,
    pub idle_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub statement_timeout_ms: u64,
    pub auto_migrate: bool,
    pub ann_search_list_size: u32,
    pub rrf_enabled: bool,
    pub rrf_k: f64,
    pub per_method_limit: u32,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            url: helpers::require_env("STORE_DATABASE_URL"),
            schema: helpers::env_or("STORE_SCHEMA", "public"),
            embeddings_table: helpers::env_or("STORE_EMBEDDINGS_TABLE", "candidate_embeddings"),
            profiles_table: helpers::env_or("STORE_PROFILES_TABLE", "candidate_profiles"),
            embedding_dimensions: helpers::env_parsed_or("STORE_EMBEDDING_DIMENSIONS", 1536usize),
            pool_min: helpers::env_parsed_or("STORE_POOL_MIN", 2u32),
            pool_max: helpers::env_parsed_or("STORE_POOL_MAX", 20u32),
            idle_timeout_secs: helpers::env_parsed_or("STORE_IDLE_TIMEOUT_SECS", 300u64),
            connect_timeout_secs: helpers::env_parsed_or("STORE_CONNECT_TIMEOUT_SECS", 5u64),
            statement_timeout_ms: helpers::env_parsed_or("STORE_STATEMENT_TIMEOUT_MS", 2_000u64),
            auto_migrate: helpers::env_parsed_or("STORE_AUTO_MIGRATE", false),
            ann_search_list_size: helpers::env_parsed_or("STORE_ANN_SEARCH_LIST_SIZE", 100u32),
            rrf_enabled: helpers::env_parsed_or("STORE_RRF_ENABLED", true),
            rrf_k: helpers::env_parsed_or("STORE_RRF_K", 60.0f64),
            per_method_limit: helpers::env_parsed_or("STORE_PER_METHOD_LIMIT", 100u32),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub disabled: bool,
    pub redis_url: Option<String>,
    pub prefix: String,
    pub search_ttl_secs: i64,
    pub embedding_ttl_secs: i64,
    pub rerank_ttl_secs: i64,
    pub specialty_ttl_secs: i64,
    pub jitter_pct: f64,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            disabled: helpers::env_parsed_or("CACHE_DISABLE", false),
            redis_url: std::env::var("CACHE_REDIS_URL").ok(),
            prefix: helpers::env_or("CACHE_PREFIX", "hh"),
            search_ttl_secs: helpers::env_parsed_or("CACHE_SEARCH_TTL_SECS", 600i64),
            embedding_ttl_secs: helpers::env_parsed_or("CACHE_EMBEDDING_TTL_SECS", 3_600i64),
            rerank_ttl_secs: helpers::env_parsed_or("CACHE_RERANK_TTL_SECS", 21_600i64),
            specialty_ttl_secs: helpers::env_parsed_or("CACHE_SPECIALTY_TTL_SECS", 86_400i64),
            jitter_pct: helpers::env_parsed_or("CACHE_JITTER_PCT", 0.20f64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingClientConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub audience: String,
    pub dimensions: usize,
}

impl EmbeddingClientConfig {
    pub fn from_env() -> Self {
        Self {
            url: helpers::require_env("EMBED_SERVICE_URL"),
            timeout_ms: helpers::env_parsed_or("EMBED_TIMEOUT_MS", 1_500u64),
            retries: helpers::env_parsed_or("EMBED_RETRIES", 2u32),
            audience: helpers::env_or("EMBED_AUDIENCE", ""),
            dimensions: helpers::env_parsed_or("STORE_EMBEDDING_DIMENSIONS", 1536usize),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityExtractorClientConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl EntityExtractorClientConfig {
    pub fn from_env() -> Self {
        Self {
            url: helpers::env_or("ENTITY_EXTRACTOR_SERVICE_URL", ""),
            timeout_ms: helpers::env_parsed_or("ENTITY_EXTRACTOR_TIMEOUT_MS", 100u64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankClientConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub audience: String,
    pub candidate_limit: usize,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_cooldown_secs: u64,
}

impl RerankClientConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: helpers::env_parsed_or("RERANK_ENABLED", false),
            url: helpers::env_or("RERANK_SERVICE_URL", ""),
            timeout_ms: helpers::env_parsed_or("RERANK_TIMEOUT_MS", 800u64),
            retries: helpers::env_parsed_or("RERANK_RETRIES", 2u32),
            audience: helpers::env_or("RERANK_AUDIENCE", ""),
            candidate_limit: helpers::env_parsed_or("RERANK_CANDIDATE_LIMIT", 50usize),
            circuit_breaker_threshold: helpers::env_parsed_or("RERANK_CB_THRESHOLD", 5u32),
            circuit_breaker_cooldown_secs: helpers::env_parsed_or("RERANK_CB_COOLDOWN_SECS", 30u64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryClientConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_ms: u64,
    pub poll_interval_secs: u64,
}

impl TrajectoryClientConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: helpers::env_parsed_or("ML_TRAJECTORY_ENABLED", false),
            url: helpers::env_or("ML_TRAJECTORY_URL", ""),
            timeout_ms: helpers::env_parsed_or("ML_TRAJECTORY_TIMEOUT_MS", 500u64),
            poll_interval_secs: helpers::env_parsed_or("ML_TRAJECTORY_POLL_INTERVAL_SECS", 30u64),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    pub enabled: bool,
    pub intent_confidence_threshold: f32,
    pub extraction_timeout_ms: u64,
    pub expansion_depth: usize,
    pub expansion_min_confidence: f32,
    pub expansion_decay: f32,
    pub expansion_cap: usize,
}

impl NlpConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: helpers::env_parsed_or("NLP_ENABLED", true),
            intent_confidence_threshold: helpers::env_parsed_or(
                "NLP_INTENT_CONFIDENCE_THRESHOLD",
                0.6f32,
            ),
            extraction_timeout_ms: helpers::env_parsed_or("NLP_EXTRACTION_TIMEOUT_MS", 100u64),
            expansion_depth: helpers::env_parsed_or("NLP_EXPANSION_DEPTH", 1usize),
            expansion_min_confidence: helpers::env_parsed_or(
                "NLP_EXPANSION_MIN_CONFIDENCE",
                0.8f32,
            ),
            expansion_decay: helpers::env_parsed_or("NLP_EXPANSION_DECAY", 0.6f32),
            expansion_cap: helpers::env_parsed_or("NLP_EXPANSION_CAP", 25usize),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: helpers::env_or("SEARCH_LOG_LEVEL", "info"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
    pub embedding: EmbeddingClientConfig,
    pub entity_extractor: EntityExtractorClientConfig,
    pub rerank: RerankClientConfig,
    pub trajectory: TrajectoryClientConfig,
    pub nlp: NlpConfig,
    pub logging: LoggingConfig,
    pub bias_concentration_threshold: f64,
    pub diversity_min_candidates: usize,
    pub perf_window_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            server: ServerConfig::from_env(),
            store: StoreConfig::from_env(),
            cache: CacheConfig::from_env(),
            embedding: EmbeddingClientConfig::from_env(),
            entity_extractor: EntityExtractorClientConfig::from_env(),
            rerank: RerankClientConfig::from_env(),
            trajectory: TrajectoryClientConfig::from_env(),
            nlp: NlpConfig::from_env(),
            logging: LoggingConfig::from_env(),
            bias_concentration_threshold: helpers::env_parsed_or(
                "BIAS_CONCENTRATION_THRESHOLD",
                0.70f64,
            ),
            diversity_min_candidates: helpers::env_parsed_or("DIVERSITY_MIN_CANDIDATES", 5usize),
            perf_window_size: helpers::env_parsed_or("PERF_WINDOW_SIZE", 500usize),
        }
    }

    pub fn bind_address(&self) -> String {
        self.server.bind_address()
    }
}
