use std::sync::Arc;
use std::time::Duration;

use vulnwatch_common::broker::StreamConfig;
use vulnwatch_engine::audit::{AuditSink, MemoryAuditSink, PgAuditSink};
use vulnwatch_engine::clock::SystemClock;
use vulnwatch_engine::cooldown::{CooldownStore, MemoryCooldownStore, PgCooldownStore};
use vulnwatch_engine::directory::StaticDirectory;
use vulnwatch_engine::dispatch::{
    DiscordDispatcher, DispatchCoordinator, EmailDispatcher, InAppDispatcher, SlackDispatcher,
    SmtpMailTransport, WebhookDispatcher,
};
use vulnwatch_engine::inbox::{
    AllowAll, MemoryNotificationStore, NotificationStore, PgNotificationStore,
};
use vulnwatch_engine::rules::RuleStore;
use vulnwatch_engine::{EngineConfig, RuleEngine};

use vulnwatch_server::broker::{
    connect_jetstream, ensure_stream, EventPublisher, InMemoryPublisher, NatsPublisher,
    StreamingAuditSink,
};
use vulnwatch_server::config::{ServiceConfig, SmtpConfig};
use vulnwatch_server::consumer::{create_pull_consumer, worth_redelivering, ConsumerLoop};
use vulnwatch_server::metrics::ServiceMetrics;
use vulnwatch_server::rest::{self, AppState};
use vulnwatch_server::storage;

fn smtp_transport(cfg: &SmtpConfig, provider: &str) -> Option<Arc<SmtpMailTransport>> {
    match SmtpMailTransport::new(
        provider,
        &cfg.host,
        cfg.port,
        &cfg.username,
        &cfg.password,
        cfg.from.clone(),
    ) {
        Ok(t) => Some(Arc::new(t)),
        Err(e) => {
            tracing::error!(provider, error = %e, "smtp transport setup failed");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServiceConfig::from_env();
    let metrics = ServiceMetrics::new();

    // Persistence: Postgres when configured, in-memory otherwise.
    let pool = match &config.database_url {
        Some(url) => {
            let pool = storage::connect(url).await.expect("database connect failed");
            let applied = storage::run_migrations(&pool)
                .await
                .expect("migrations failed");
            if !applied.is_empty() {
                tracing::info!(count = applied.len(), "applied migrations");
            }
            Some(pool)
        }
        None => None,
    };

    let cooldowns: Arc<dyn CooldownStore> = match &pool {
        Some(pool) => Arc::new(PgCooldownStore::new(pool.clone())),
        None => Arc::new(MemoryCooldownStore::new()),
    };
    let audit: Arc<dyn AuditSink> = match &pool {
        Some(pool) => Arc::new(PgAuditSink::new(pool.clone())),
        None => Arc::new(MemoryAuditSink::new()),
    };
    let notifications: Arc<dyn NotificationStore> = match &pool {
        Some(pool) => Arc::new(PgNotificationStore::new(pool.clone())),
        None => Arc::new(MemoryNotificationStore::new()),
    };

    // Broker: NATS JetStream when configured, recording stand-in otherwise.
    let (publisher, js): (Arc<dyn EventPublisher>, _) = match &config.nats_url {
        Some(url) => {
            let js = connect_jetstream(url).await.expect("nats connect failed");
            ensure_stream(&js, &StreamConfig::default())
                .await
                .expect("stream setup failed");
            (Arc::new(NatsPublisher::new(js.clone())), Some(js))
        }
        None => {
            tracing::warn!("NATS_URL not set, events stay in-process");
            (Arc::new(InMemoryPublisher::new()), None)
        }
    };

    let audit: Arc<dyn AuditSink> =
        Arc::new(StreamingAuditSink::new(audit, publisher.clone()));

    let directory = Arc::new(StaticDirectory::from_spec(&config.owner_emails));
    let clock = Arc::new(SystemClock);

    let mut coordinator = DispatchCoordinator::new(audit.clone(), clock.clone())
        .register(Arc::new(InAppDispatcher::new(
            notifications.clone(),
            Arc::new(AllowAll),
        )))
        .register(Arc::new(
            SlackDispatcher::new(Duration::from_secs(5)).expect("http client build failed"),
        ))
        .register(Arc::new(
            DiscordDispatcher::new(Duration::from_secs(5)).expect("http client build failed"),
        ))
        .register(Arc::new(
            WebhookDispatcher::new(Duration::from_secs(10)).expect("http client build failed"),
        ));

    if let Some(smtp) = config.smtp.as_ref().and_then(|c| smtp_transport(c, "primary")) {
        let mut email = EmailDispatcher::new(smtp, directory.clone());
        if let Some(fallback) = config
            .smtp_fallback
            .as_ref()
            .and_then(|c| smtp_transport(c, "fallback"))
        {
            email = email.with_secondary(fallback);
        }
        coordinator = coordinator.register(Arc::new(email));
    } else {
        tracing::warn!("smtp not configured, email channel records skips");
    }

    let engine = Arc::new(RuleEngine::new(
        RuleStore::new(),
        cooldowns,
        Arc::new(coordinator),
        audit,
        clock,
        EngineConfig {
            max_concurrent_rules: config.max_concurrent_rules,
        },
    ));

    // Broker-fed evaluation path.
    let consumer_handle = match js {
        Some(js) => {
            let consumer = create_pull_consumer(&js)
                .await
                .expect("consumer setup failed");
            let engine = engine.clone();
            let metrics = metrics.clone();
            tokio::spawn(async move {
                let consumer_loop = ConsumerLoop::new(consumer, 32);
                let result = consumer_loop
                    .run(|vuln| {
                        let engine = engine.clone();
                        let metrics = metrics.clone();
                        async move {
                            let start = std::time::Instant::now();
                            let outcomes = engine.on_vulnerability(&vuln, None).await;
                            metrics.record_eval_latency(start);
                            metrics.record_outcomes(&outcomes);

                            for outcome in &outcomes {
                                if let vulnwatch_engine::RuleOutcome::Failed {
                                    rule_id,
                                    stage,
                                    error,
                                } = outcome
                                {
                                    tracing::error!(%rule_id, stage, %error, "rule round failed");
                                }
                            }
                            // Redelivery only when no rule got past its
                            // cooldown acquire; re-running a round that
                            // dispatched anything would duplicate alerts for
                            // rules whose window has already lapsed.
                            if worth_redelivering(&outcomes) {
                                return Err("cooldown store rejected every matched rule".into());
                            }
                            Ok(())
                        }
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "consumer loop exited");
                }
            })
        }
        None => tokio::spawn(std::future::pending::<()>()),
    };

    let app_state = AppState {
        engine,
        publisher,
        metrics,
    };
    let rest_app = rest::router(app_state);
    let rest_addr = config.rest_addr;

    let rest_handle = tokio::spawn(async move {
        tracing::info!(%rest_addr, "REST server starting");
        let listener = tokio::net::TcpListener::bind(rest_addr).await.unwrap();
        axum::serve(listener, rest_app).await.unwrap();
    });

    tokio::select! {
        r = consumer_handle => { if let Err(e) = r { tracing::error!("consumer: {e}"); } }
        r = rest_handle => { if let Err(e) = r { tracing::error!("REST: {e}"); } }
    }
}
