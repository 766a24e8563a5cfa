use std::sync::Arc;
use ticketdesk_booking::{BookingManager, BookingPolicy, PaymentManager, SearchService};
use ticketdesk_core::{BookingRepository, RouteRepository, UnitOfWork, UserRepository};
use ticketdesk_store::app_config::BusinessRules;
use ticketdesk_store::MemoryStore;
use crate::accounts::AccountService;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingManager>,
    pub payments: Arc<PaymentManager>,
    pub search: Arc<SearchService>,
    pub accounts: Arc<AccountService>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UnitOfWork>,
        routes: Arc<dyn RouteRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
        rules: &BusinessRules,
        auth: AuthConfig,
    ) -> Self {
        let policy = BookingPolicy {
            cancellation_cutoff_hours: rules.cancellation_cutoff_hours,
            default_page_size: rules.default_page_size,
            max_page_size: rules.max_page_size,
        };

        Self {
            bookings: Arc::new(BookingManager::new(store.clone(), routes.clone(), bookings, policy)),
            payments: Arc::new(PaymentManager::new(store)),
            search: Arc::new(SearchService::new(routes)),
            accounts: Arc::new(AccountService::new(users)),
            auth,
        }
    }

    /// Every repository backed by one in-process store.
    pub fn in_memory(store: MemoryStore, rules: &BusinessRules, auth: AuthConfig) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store.clone(), store.clone(), store, rules, auth)
    }
}
