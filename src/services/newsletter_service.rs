use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::config::AppState;
use crate::entities::newsletter_subscriber::{self, Entity as Subscriber};
use crate::models::auth_model::CurrentUser;
use crate::models::blog_model::PaginationMeta;
use crate::models::newsletter_model::*;
use crate::services::email_service::Notifier;
use crate::utils::validator_utils::normalize_email;

pub struct NewsletterService;

impl NewsletterService {
    /// Subscribing an address that unsubscribed earlier reactivates the same
    /// row instead of inserting a second one; the email column is unique.
    pub async fn subscribe(
        state: &AppState,
        email: String,
    ) -> Result<SubscriberResponse, (StatusCode, &'static str, String)> {
        let email = normalize_email(&email);

        let existing = Subscriber::find()
            .filter(newsletter_subscriber::Column::Email.eq(&email))
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        if let Some(existing) = existing {
            if existing.is_active {
                return Err((
                    StatusCode::CONFLICT,
                    "ALREADY_SUBSCRIBED",
                    "This email is already subscribed".to_string(),
                ));
            }

            let mut active: newsletter_subscriber::ActiveModel = existing.into();
            active.is_active = Set(true);
            active.subscription_date = Set(Utc::now());
            active.unsubscribed_at = Set(None);

            let updated = active.update(&state.db).await.map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_WRITE_ERR",
                    "Failed to resubscribe".to_string(),
                )
            })?;
            return Ok(SubscriberResponse::from(updated));
        }

        let saved = newsletter_subscriber::ActiveModel {
            id: NotSet,
            public_id: Set(Uuid::new_v4()),
            email: Set(email),
            is_active: Set(true),
            subscription_date: Set(Utc::now()),
            unsubscribed_at: Set(None),
        }
        .insert(&state.db)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                format!("Failed to subscribe: {}", e),
            )
        })?;

        Ok(SubscriberResponse::from(saved))
    }

    pub async fn unsubscribe(
        state: &AppState,
        email: String,
    ) -> Result<SubscriberResponse, (StatusCode, &'static str, String)> {
        let email = normalize_email(&email);

        let existing = Subscriber::find()
            .filter(newsletter_subscriber::Column::Email.eq(&email))
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::NOT_FOUND,
                "NOT_SUBSCRIBED",
                "This email is not subscribed".to_string(),
            ))?;

        if !existing.is_active {
            return Err((
                StatusCode::BAD_REQUEST,
                "ALREADY_UNSUBSCRIBED",
                "This email has already unsubscribed".to_string(),
            ));
        }

        let mut active: newsletter_subscriber::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.unsubscribed_at = Set(Some(Utc::now()));

        let updated = active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to unsubscribe".to_string(),
            )
        })?;

        Ok(SubscriberResponse::from(updated))
    }

    pub async fn check(
        state: &AppState,
        email: String,
    ) -> Result<SubscriptionCheckResponse, (StatusCode, &'static str, String)> {
        let email = normalize_email(&email);

        let existing = Subscriber::find()
            .filter(newsletter_subscriber::Column::Email.eq(&email))
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        Ok(SubscriptionCheckResponse {
            email,
            subscribed: existing.map(|s| s.is_active).unwrap_or(false),
        })
    }

    pub async fn list(
        state: &AppState,
        current_user: &CurrentUser,
        params: SubscriberListParams,
    ) -> Result<SubscriberListResponse, (StatusCode, &'static str, String)> {
        Self::require_admin(current_user)?;

        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(20).clamp(1, 100);

        let mut query = Subscriber::find();
        if let Some(is_active) = params.is_active {
            query = query.filter(newsletter_subscriber::Column::IsActive.eq(is_active));
        }
        if let Some(search) = params.search {
            query = query.filter(newsletter_subscriber::Column::Email.contains(&search));
        }
        query = query.order_by_desc(newsletter_subscriber::Column::SubscriptionDate);

        let paginator = query.paginate(&state.db, limit);
        let total = paginator.num_items().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Count failed".to_string(),
            )
        })?;
        let subscribers = paginator.fetch_page(page - 1).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Fetch failed".to_string(),
            )
        })?;

        Ok(SubscriberListResponse {
            data: subscribers
                .into_iter()
                .map(SubscriberResponse::from)
                .collect(),
            meta: PaginationMeta { total, page, limit },
        })
    }

    pub async fn get(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
    ) -> Result<SubscriberResponse, (StatusCode, &'static str, String)> {
        Self::require_admin(current_user)?;

        Ok(SubscriberResponse::from(
            Self::find_by_public_id(state, public_id).await?,
        ))
    }

    pub async fn update(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
        payload: UpdateSubscriberRequest,
    ) -> Result<SubscriberResponse, (StatusCode, &'static str, String)> {
        Self::require_admin(current_user)?;

        let model = Self::find_by_public_id(state, public_id).await?;
        let was_active = model.is_active;

        let new_email = payload.email.as_deref().map(normalize_email);
        if let Some(email) = &new_email {
            let taken = Subscriber::find()
                .filter(newsletter_subscriber::Column::Email.eq(email))
                .filter(newsletter_subscriber::Column::Id.ne(model.id))
                .one(&state.db)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_ERR",
                        "Database error".to_string(),
                    )
                })?;
            if taken.is_some() {
                return Err((
                    StatusCode::CONFLICT,
                    "SUBSCRIBER_EXISTS",
                    "Another subscriber already uses this email".to_string(),
                ));
            }
        }

        let mut active: newsletter_subscriber::ActiveModel = model.into();
        if let Some(email) = new_email {
            active.email = Set(email);
        }
        if let Some(is_active) = payload.is_active {
            active.is_active = Set(is_active);
            if was_active && !is_active {
                active.unsubscribed_at = Set(Some(Utc::now()));
            } else if !was_active && is_active {
                active.unsubscribed_at = Set(None);
            }
        }

        let updated = active.update(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_WRITE_ERR",
                "Failed to update subscriber".to_string(),
            )
        })?;

        Ok(SubscriberResponse::from(updated))
    }

    pub async fn delete(
        state: &AppState,
        current_user: &CurrentUser,
        public_id: Uuid,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        Self::require_admin(current_user)?;

        let model = Self::find_by_public_id(state, public_id).await?;

        Subscriber::delete_by_id(model.id)
            .exec(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_WRITE_ERR",
                    "Failed to delete subscriber".to_string(),
                )
            })?;

        Ok(())
    }

    pub async fn bulk(
        state: &AppState,
        current_user: &CurrentUser,
        payload: BulkSubscriberRequest,
    ) -> Result<u64, (StatusCode, &'static str, String)> {
        Self::require_admin(current_user)?;

        if payload.ids.is_empty() {
            return Ok(0);
        }

        let filter = newsletter_subscriber::Column::PublicId.is_in(payload.ids);

        let affected = match payload.action {
            BulkSubscriberAction::Activate => Subscriber::update_many()
                .col_expr(
                    newsletter_subscriber::Column::IsActive,
                    sea_query::Expr::value(true),
                )
                .col_expr(
                    newsletter_subscriber::Column::UnsubscribedAt,
                    sea_query::Expr::value(Option::<chrono::DateTime<Utc>>::None),
                )
                .filter(filter)
                .exec(&state.db)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_WRITE_ERR",
                        "Bulk activate failed".to_string(),
                    )
                })?
                .rows_affected,
            BulkSubscriberAction::Deactivate => Subscriber::update_many()
                .col_expr(
                    newsletter_subscriber::Column::IsActive,
                    sea_query::Expr::value(false),
                )
                .col_expr(
                    newsletter_subscriber::Column::UnsubscribedAt,
                    sea_query::Expr::value(Some(Utc::now())),
                )
                .filter(filter)
                .exec(&state.db)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_WRITE_ERR",
                        "Bulk deactivate failed".to_string(),
                    )
                })?
                .rows_affected,
            BulkSubscriberAction::Delete => Subscriber::delete_many()
                .filter(filter)
                .exec(&state.db)
                .await
                .map_err(|_| {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DB_WRITE_ERR",
                        "Bulk delete failed".to_string(),
                    )
                })?
                .rows_affected,
        };

        Ok(affected)
    }

    pub async fn stats(
        state: &AppState,
        current_user: &CurrentUser,
    ) -> Result<NewsletterStatsResponse, (StatusCode, &'static str, String)> {
        Self::require_admin(current_user)?;

        let total = Subscriber::find().count(&state.db).await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DB_ERR",
                "Database error".to_string(),
            )
        })?;
        let active = Subscriber::find()
            .filter(newsletter_subscriber::Column::IsActive.eq(true))
            .count(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?;

        Ok(NewsletterStatsResponse {
            total,
            active,
            unsubscribed: total - active,
        })
    }

    /// Fan-out to every active subscriber. Best effort by design: individual
    /// delivery failures are logged and skipped, and the publish that
    /// triggered this never observes them.
    pub async fn broadcast_new_post<N: Notifier>(
        db: &DatabaseConnection,
        notifier: &N,
        title: &str,
        link: &str,
    ) {
        let subscribers = match Subscriber::find()
            .filter(newsletter_subscriber::Column::IsActive.eq(true))
            .all(db)
            .await
        {
            Ok(subscribers) => subscribers,
            Err(e) => {
                tracing::warn!(error = %e, "newsletter fan-out aborted, subscriber query failed");
                return;
            }
        };

        let subject = format!("New post: {}", title);
        let html_body = format!(
            "<h3>{}</h3>
            <p>A new post has just been published.</p>
            <a href=\"{}\">Read it here</a>",
            title, link
        );

        let mut sent = 0usize;
        let mut failed = 0usize;
        for subscriber in &subscribers {
            match notifier.deliver(&subscriber.email, &subject, &html_body).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(to = %subscriber.email, error = %e, "newsletter delivery failed");
                }
            }
        }

        tracing::info!(title, sent, failed, "newsletter fan-out finished");
    }

    fn require_admin(
        current_user: &CurrentUser,
    ) -> Result<(), (StatusCode, &'static str, String)> {
        if !current_user.actor().is_admin() {
            return Err((
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                "Administrator access required".to_string(),
            ));
        }
        Ok(())
    }

    async fn find_by_public_id(
        state: &AppState,
        public_id: Uuid,
    ) -> Result<newsletter_subscriber::Model, (StatusCode, &'static str, String)> {
        Subscriber::find()
            .filter(newsletter_subscriber::Column::PublicId.eq(public_id))
            .one(&state.db)
            .await
            .map_err(|_| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DB_ERR",
                    "Database error".to_string(),
                )
            })?
            .ok_or((
                StatusCode::NOT_FOUND,
                "SUBSCRIBER_NOT_FOUND",
                "Subscriber not found".to_string(),
            ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        fail_for: Option<String>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: None,
            }
        }

        fn failing_for(email: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: Some(email.to_string()),
            }
        }
    }

    impl Notifier for RecordingNotifier {
        async fn deliver(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), String> {
            if self.fail_for.as_deref() == Some(to) {
                return Err("delivery refused".to_string());
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    fn subscriber(id: i64, email: &str) -> newsletter_subscriber::Model {
        newsletter_subscriber::Model {
            id,
            public_id: Uuid::new_v4(),
            email: email.to_string(),
            is_active: true,
            subscription_date: Utc::now(),
            unsubscribed_at: None,
        }
    }

    #[tokio::test]
    async fn resubscribing_reactivates_the_existing_record() {
        let dormant = newsletter_subscriber::Model {
            id: 5,
            public_id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            is_active: false,
            subscription_date: Utc::now(),
            unsubscribed_at: Some(Utc::now()),
        };
        let revived = newsletter_subscriber::Model {
            is_active: true,
            unsubscribed_at: None,
            ..dormant.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![dormant.clone()]])
            .append_query_results([vec![revived]])
            .into_connection();
        let state = crate::config::AppState::with_mock_db(&db);

        let res = NewsletterService::subscribe(&state, " Reader@Example.COM ".to_string())
            .await
            .unwrap();
        assert!(res.is_active);
        assert!(res.unsubscribed_at.is_none());
        assert_eq!(res.id, dormant.public_id);

        // The dormant row is revived in place; no second row appears.
        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("UPDATE"));
        assert!(!log.contains("INSERT"));
    }

    #[tokio::test]
    async fn changing_a_subscriber_to_a_taken_email_is_a_conflict() {
        let target = newsletter_subscriber::Model {
            id: 5,
            public_id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            is_active: true,
            subscription_date: Utc::now(),
            unsubscribed_at: None,
        };
        let other = newsletter_subscriber::Model {
            id: 6,
            public_id: Uuid::new_v4(),
            email: "b@example.com".to_string(),
            is_active: true,
            subscription_date: Utc::now(),
            unsubscribed_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target.clone()]])
            .append_query_results([vec![other]])
            .into_connection();
        let state = crate::config::AppState::with_mock_db(&db);

        let admin = CurrentUser {
            id: 1,
            public_id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: "admin@pressroom.dev".to_string(),
            role: crate::entities::user::UserRole::Admin,
        };
        let err = NewsletterService::update(
            &state,
            &admin,
            target.public_id,
            UpdateSubscriberRequest {
                email: Some("B@example.com".to_string()),
                is_active: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
        assert_eq!(err.1, "SUBSCRIBER_EXISTS");
    }

    #[tokio::test]
    async fn broadcast_reaches_every_active_subscriber() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                subscriber(1, "a@example.com"),
                subscriber(2, "b@example.com"),
            ]])
            .into_connection();

        let notifier = RecordingNotifier::new();
        NewsletterService::broadcast_new_post(&db, &notifier, "Hello", "http://x/blogs/hello")
            .await;

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "a@example.com");
        assert_eq!(sent[0].1, "New post: Hello");
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_stop_the_rest() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                subscriber(1, "a@example.com"),
                subscriber(2, "b@example.com"),
                subscriber(3, "c@example.com"),
            ]])
            .into_connection();

        let notifier = RecordingNotifier::failing_for("a@example.com");
        NewsletterService::broadcast_new_post(&db, &notifier, "Hello", "http://x/blogs/hello")
            .await;

        let sent = notifier.sent.lock().unwrap();
        let recipients: Vec<&str> = sent.iter().map(|(to, _)| to.as_str()).collect();
        assert_eq!(recipients, ["b@example.com", "c@example.com"]);
    }
}
