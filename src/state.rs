use crate::absence::StoreAbsenceCollector;
use crate::calendar::{CalendarGridBuilder, VisibilityPolicy};
use crate::clock::Clock;
use crate::config::Config;
use crate::lifecycle::ApplicationLifecycle;
use crate::lifecycle::notify::NotificationSink;
use crate::lifecycle::signer::Ed25519Signer;
use crate::lifecycle::working_time::HolidayAwareCalculator;
use crate::model::person::{Person, PersonId};
use crate::store::{Backend, CategoryCatalog};
use crate::utils::category_cache::CachedCategoryCatalog;
use actix_web::error::ErrorForbidden;
use std::sync::Arc;

/// Services shared by every request handler.
pub struct AppState {
    pub store: Arc<dyn Backend>,
    pub lifecycle: ApplicationLifecycle,
    pub calendar: CalendarGridBuilder<dyn Backend>,
    pub categories: Arc<CachedCategoryCatalog>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new<B>(
        backend: Arc<B>,
        config: &Config,
        notifications: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        B: Backend + 'static,
    {
        let catalog: Arc<dyn CategoryCatalog> = backend.clone();
        let categories = Arc::new(CachedCategoryCatalog::new(
            catalog,
            config.category_cache_ttl,
        ));
        let store: Arc<dyn Backend> = backend;

        let calculator = Arc::new(HolidayAwareCalculator::new(
            store.clone(),
            config.hours_per_working_day,
        ));
        let lifecycle = ApplicationLifecycle::new(
            store.clone(),
            calculator,
            Arc::new(Ed25519Signer),
            notifications,
            clock.clone(),
        );
        let calendar = CalendarGridBuilder::new(
            store.clone(),
            categories.clone(),
            Arc::new(StoreAbsenceCollector::new(store.clone())),
            VisibilityPolicy::new(config.privileged_roles.clone()),
        );

        Self {
            store,
            lifecycle,
            calendar,
            categories,
            clock,
        }
    }

    /// Resolves a person referenced by a token or request.
    pub async fn person(&self, id: PersonId) -> actix_web::Result<Person> {
        let person = self
            .store
            .person(id)
            .await
            .map_err(crate::error::ApiError::from)?;
        match person {
            Some(person) if person.is_active() => Ok(person),
            Some(_) => Err(ErrorForbidden("Person is inactive")),
            None => Err(crate::error::ApiError::NotFound(format!("person {}", id)).into()),
        }
    }
}
