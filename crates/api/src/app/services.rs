use std::{convert::Infallible, sync::Arc, time::Duration};

use anyhow::Context;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use rolekit_auth::{AuthorizationService, Permissions, RoleRepository, UserRepository};
use rolekit_core::UserId;
use rolekit_events::{EventBus, EventEnvelope, InMemoryEventBus, RbacEvent};
use rolekit_infra::{
    InMemoryRoleRepository, InMemoryUserRepository, PostgresRoleRepository,
    PostgresUserRepository, ensure_schema,
};

use crate::authz::ADMIN_PERMISSIONS;
use crate::config::ApiConfig;

pub type RbacBus = InMemoryEventBus<EventEnvelope<RbacEvent>>;

const BOOTSTRAP_ROLE_NAME: &str = "Administrator";

/// Realtime message broadcast via SSE.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    /// `None` goes to every subscriber; otherwise only to this user.
    #[serde(skip)]
    pub audience: Option<UserId>,
    pub topic: String,
    pub payload: serde_json::Value,
}

impl RealtimeMessage {
    fn from_envelope(env: &EventEnvelope<RbacEvent>) -> Self {
        let event = env.payload();
        Self {
            audience: event.audience().cloned(),
            topic: event.event_type().to_string(),
            payload: serde_json::json!({
                "event_id": env.event_id().to_string(),
                "occurred_at": env.occurred_at().to_rfc3339(),
                "event": event,
            }),
        }
    }

    pub fn visible_to(&self, user_id: &UserId) -> bool {
        self.audience.as_ref().is_none_or(|audience| audience == user_id)
    }
}

pub struct AppServices {
    authz: Arc<AuthorizationService>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

impl AppServices {
    pub fn authz(&self) -> &AuthorizationService {
        &self.authz
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }
}

/// Wire repositories, the event bus and the SSE relay.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let (roles, users) = repositories(config).await?;

    let bus: Arc<RbacBus> = Arc::new(InMemoryEventBus::new());
    let authz = Arc::new(AuthorizationService::from_repositories(roles, users, bus.clone()));

    // Realtime channel (SSE): lossy broadcast, audience-filtered per connection.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    // Background subscriber: bus -> realtime channel. Ends when the bus is dropped.
    {
        let sub = bus.subscribe();
        let realtime_tx = realtime_tx.clone();
        tokio::task::spawn_blocking(move || {
            while let Ok(env) = sub.recv() {
                // Err only means nobody is listening right now.
                let _ = realtime_tx.send(RealtimeMessage::from_envelope(&env));
            }
        });
    }

    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(&authz, admin)
            .await
            .context("failed to bootstrap administrator")?;
    }

    Ok(AppServices { authz, realtime_tx })
}

async fn repositories(
    config: &ApiConfig,
) -> anyhow::Result<(Arc<dyn RoleRepository>, Arc<dyn UserRepository>)> {
    let Some(url) = &config.database_url else {
        tracing::info!("using in-memory role and user stores");
        return Ok((
            Arc::new(InMemoryRoleRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
        ));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("failed to connect to DATABASE_URL")?;
    ensure_schema(&pool).await.context("failed to create rbac schema")?;
    tracing::info!("using postgres role and user stores");

    Ok((
        Arc::new(PostgresRoleRepository::new(pool.clone())),
        Arc::new(PostgresUserRepository::new(pool)),
    ))
}

/// Make sure `admin` holds a role with every admin permission.
///
/// Reuses an existing "Administrator" role across restarts.
async fn bootstrap_admin(
    authz: &AuthorizationService,
    admin: &UserId,
) -> Result<(), rolekit_auth::AuthzError> {
    let permissions = Permissions::many(ADMIN_PERMISSIONS);
    let existing = authz
        .roles()
        .list_roles()
        .await?
        .into_iter()
        .find(|role| role.name == BOOTSTRAP_ROLE_NAME);

    let role_id = match existing {
        Some(role) => {
            authz.roles().add_permissions(&permissions, &role.id).await?;
            role.id
        }
        None => authz.roles().create_role(BOOTSTRAP_ROLE_NAME, &permissions).await?.id,
    };

    authz.users().set_user_role(admin, Some(&role_id)).await?;
    tracing::info!(user_id = %admin, role_id = %role_id, "bootstrap administrator ready");
    Ok(())
}

/// Build an SSE stream of change notifications visible to `user_id`.
pub fn user_sse_stream(
    services: Arc<AppServices>,
    user_id: UserId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if m.visible_to(&user_id) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use rolekit_core::RoleId;

    use super::*;

    #[test]
    fn user_role_changes_only_reach_the_affected_user() {
        let u1 = UserId::parse("u1").unwrap();
        let u2 = UserId::parse("u2").unwrap();

        let assigned = RealtimeMessage::from_envelope(&EventEnvelope::now(RbacEvent::UserRoleChanged {
            user_id: u1.clone(),
            role_id: None,
        }));
        assert!(assigned.visible_to(&u1));
        assert!(!assigned.visible_to(&u2));

        let deleted = RealtimeMessage::from_envelope(&EventEnvelope::now(RbacEvent::RoleDeleted {
            role_id: RoleId::parse("r1").unwrap(),
        }));
        assert!(deleted.visible_to(&u1) && deleted.visible_to(&u2));
        assert_eq!(deleted.topic, "rbac.role.deleted");
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let config = ApiConfig {
            bootstrap_admin: Some(UserId::parse("root").unwrap()),
            ..ApiConfig::default()
        };
        let services = build_services(&config).await.unwrap();
        let root = UserId::parse("root").unwrap();
        bootstrap_admin(services.authz(), &root).await.unwrap();

        let roles = services.authz().roles().list_roles().await.unwrap();
        assert_eq!(roles.len(), 1);
        assert!(
            services
                .authz()
                .user_can(&Permissions::many(ADMIN_PERMISSIONS), Some(&root))
                .await
                .unwrap()
        );
    }
}
