//! In-process stand-ins for the external listing store and event log.
//!
//! Both adapters honour the port contracts exactly and can be seeded from
//! JSON fixture files read through `cap_std`.

mod event_log;
mod fixtures;
mod listing_repository;

pub use event_log::InMemoryEventLog;
pub use fixtures::{FixtureLoadError, load_json_array};
pub use listing_repository::InMemoryListingRepository;
