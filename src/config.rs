use serde::Deserialize;

/// Tunables of the recommendation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    pub cache_ttl_secs: u64,
    pub preference_cache_capacity: usize,
    pub period_to_fatigue_days: i64, // window for the fatigue check
    pub amount_to_fatigue: i64,      // consumptions inside that window
    pub period_to_analyze_days: i64, // window for the consumption bonus
    pub default_serving_grams: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60 * 60,
            preference_cache_capacity: 100,
            period_to_fatigue_days: 30,
            amount_to_fatigue: 10,
            period_to_analyze_days: 100,
            default_serving_grams: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub recommendation: RecommendationConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let defaults = RecommendationConfig::default();
        let recommendation = RecommendationConfig {
            cache_ttl_secs: env_or("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            preference_cache_capacity: env_or(
                "PREFERENCE_CACHE_CAPACITY",
                defaults.preference_cache_capacity,
            ),
            period_to_fatigue_days: env_or("PERIOD_TO_FATIGUE_DAYS", defaults.period_to_fatigue_days),
            amount_to_fatigue: env_or("AMOUNT_TO_FATIGUE", defaults.amount_to_fatigue),
            period_to_analyze_days: env_or("PERIOD_TO_ANALYZE_DAYS", defaults.period_to_analyze_days),
            default_serving_grams: env_or("DEFAULT_SERVING_GRAMS", defaults.default_serving_grams),
        };
        Ok(Self {
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            recommendation,
        })
    }

    /// Identity of the target database, used as the catalog cache key.
    /// Credentials never end up in it.
    pub fn database_identity(&self) -> String {
        match self.database_url.rsplit_once('@') {
            Some((_, host_and_db)) => host_and_db.to_string(),
            None => self.database_url.clone(),
        }
    }
}
