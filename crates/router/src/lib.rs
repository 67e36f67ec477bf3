//! Ties the store, session manager, and provider registry into the request
//! dispatcher and the supporting services (event bus, settings sync,
//! aggregated model listing, per-session advisory locks).

pub mod bootstrap;
pub mod dispatcher;
pub mod event_bus;
pub mod locks;
pub mod models_cache;
pub mod settings;

pub use bootstrap::build_factory;
pub use dispatcher::Dispatcher;
pub use event_bus::EventBus;
pub use locks::SessionLocks;
pub use models_cache::ModelsCache;
pub use settings::SettingsService;
