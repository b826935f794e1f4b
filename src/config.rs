// src/config.rs

use std::{env, str::FromStr, sync::Arc};

use anyhow::Context;

use crate::{
    common::security::{BcryptHasher, CredentialHasher, JwtIssuer, TokenIssuer},
    db::{MemoryStore, PgStore, Store},
    domain::Outcome,
    services::{
        AuditService, AuthService, CatalogService, ComplaintService, LinkService,
        MessageService, OrderService,
    },
};

// Configuração lida do ambiente (com .env opcional)
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub bcrypt_cost: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5)?,
            bcrypt_cost: parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} inválido: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth_service: AuthService,
    pub link_service: LinkService,
    pub catalog_service: CatalogService,
    pub order_service: OrderService,
    pub complaint_service: ComplaintService,
    pub message_service: MessageService,
    pub audit_service: AuditService,
}

impl AppState {
    // Conecta no Postgres quando há DATABASE_URL; senão sobe com o store em memória
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let hasher = Arc::new(BcryptHasher::new(settings.bcrypt_cost));
        let tokens = Arc::new(JwtIssuer::new(&settings.jwt_secret, settings.jwt_ttl_hours));

        let store: Arc<dyn Store> = match &settings.database_url {
            Some(url) => {
                let pg = PgStore::connect(url, settings.db_max_connections).await?;

                // Faz o app rodar as migrações do SQLx na inicialização
                sqlx::migrate!()
                    .run(pg.pool())
                    .await
                    .context("Falha ao rodar as migrações do banco de dados.")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(pg)
            }
            None => {
                tracing::warn!("⚠️ DATABASE_URL não definida: usando store em memória (dados voláteis).");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_parts(store, hasher, tokens))
    }

    /// Monta o gráfico de dependências sobre um store já pronto.
    pub fn with_parts(
        store: Arc<dyn Store>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            auth_service: AuthService::new(store.clone(), hasher, tokens),
            link_service: LinkService::new(store.clone()),
            catalog_service: CatalogService::new(store.clone()),
            order_service: OrderService::new(store.clone()),
            complaint_service: ComplaintService::new(store.clone()),
            message_service: MessageService::new(store.clone()),
            audit_service: AuditService::new(store.clone()),
            store,
        }
    }

    /// Grava a auditoria da operação e devolve o valor.
    /// Falha na auditoria é só logada: a mutação já foi confirmada.
    pub async fn finish<T>(&self, outcome: Outcome<T>) -> T {
        if let Err(e) = self.audit_service.record(&outcome.events).await {
            tracing::warn!(
                "Falha ao gravar {} evento(s) de auditoria: {}",
                outcome.events.len(),
                e
            );
        }
        outcome.value
    }
}
