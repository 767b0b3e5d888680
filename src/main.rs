//! GenStudio server entrypoint.
//!
//! Loads configuration, connects storage, wires the tier resolver, usage
//! limiter, and orchestrator over their adapters, and serves the HTTP API.

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use genstudio::adapters::http::dto::ProviderKind;
use genstudio::adapters::http::{app_router, AppState};
use genstudio::adapters::postgres::{
    FreeTiersSource, PaidTiersSource, PgTierAdmin, PgTokenLedger, PgUsageStore, ProfilesSource,
};
use genstudio::adapters::providers::{
    MusicConfig, MusicProvider, SlidesConfig, SlidesProvider, SpeechConfig, SpeechProvider,
    VideoConfig, VideoProvider,
};
use genstudio::application::{GenerationOrchestrator, TierResolver, UsageLimiter};
use genstudio::config::{AppConfig, ProviderSettings};
use genstudio::domain::billing::BillingWebhookVerifier;
use genstudio::ports::{GenerationProvider, TierSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Tier sources in priority order: paid enrollments win over free ones,
    // and the legacy profiles table is the last resort.
    let sources: Vec<Arc<dyn TierSource>> = vec![
        Arc::new(PaidTiersSource::new(pool.clone())),
        Arc::new(FreeTiersSource::new(pool.clone())),
        Arc::new(ProfilesSource::new(pool.clone())),
    ];
    let resolver = Arc::new(TierResolver::new(
        sources,
        config.billing.grace_period_days,
    ));
    let limiter = Arc::new(UsageLimiter::new(Arc::new(PgUsageStore::new(
        pool.clone(),
    ))));
    let ledger = Arc::new(PgTokenLedger::new(pool.clone()));
    let orchestrator = Arc::new(GenerationOrchestrator::new(
        resolver.clone(),
        limiter.clone(),
        ledger.clone(),
    ));

    let providers = build_providers(&config)?;

    let state = AppState {
        resolver,
        limiter,
        orchestrator,
        providers: Arc::new(providers),
        poll_options: config.providers.poll.to_options(),
        webhook_verifier: Arc::new(BillingWebhookVerifier::new(Secret::new(
            config.billing.webhook_secret.clone(),
        ))),
        tier_admin: Arc::new(PgTierAdmin::new(pool.clone())),
        ledger,
    };

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "genstudio listening");

    axum::serve(listener, app_router(state)).await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_providers(
    config: &AppConfig,
) -> Result<HashMap<ProviderKind, Arc<dyn GenerationProvider>>, Box<dyn std::error::Error>> {
    let mut providers: HashMap<ProviderKind, Arc<dyn GenerationProvider>> = HashMap::new();

    let video = video_config(&config.providers.video);
    providers.insert(ProviderKind::Video, Arc::new(VideoProvider::new(video)?));

    let speech = speech_config(&config.providers.speech);
    providers.insert(ProviderKind::Speech, Arc::new(SpeechProvider::new(speech)?));

    let music = music_config(&config.providers.music);
    providers.insert(ProviderKind::Music, Arc::new(MusicProvider::new(music)?));

    let slides = slides_config(&config.providers.slides);
    providers.insert(ProviderKind::Slides, Arc::new(SlidesProvider::new(slides)?));

    Ok(providers)
}

fn video_config(settings: &ProviderSettings) -> VideoConfig {
    let mut config = VideoConfig::new(Secret::new(settings.api_key.clone()));
    if let Some(url) = &settings.base_url {
        config = config.with_base_url(url);
    }
    config
}

fn speech_config(settings: &ProviderSettings) -> SpeechConfig {
    let mut config = SpeechConfig::new(Secret::new(settings.api_key.clone()));
    if let Some(url) = &settings.base_url {
        config = config.with_base_url(url);
    }
    config
}

fn music_config(settings: &ProviderSettings) -> MusicConfig {
    let mut config = MusicConfig::new(Secret::new(settings.api_key.clone()));
    if let Some(url) = &settings.base_url {
        config = config.with_base_url(url);
    }
    config
}

fn slides_config(settings: &ProviderSettings) -> SlidesConfig {
    let mut config = SlidesConfig::new(Secret::new(settings.api_key.clone()));
    if let Some(url) = &settings.base_url {
        config = config.with_base_url(url);
    }
    config
}
