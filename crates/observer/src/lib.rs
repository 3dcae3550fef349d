pub mod config;
pub mod diff;
pub mod host;
pub mod identity;
pub mod record;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod snapshot;

mod error;
mod observer;

pub use config::ObserveConfig;
pub use error::{ObserverError, SubscriberError};
pub use host::{AttrRef, NodeCategory, ObservedTree};
pub use observer::{Delivery, MutationObserver, ObserverCommand, Subscriber, TickReport};
pub use record::{MutationKind, MutationRecord};
pub use settings::{ObserverSettings, SettingsError};
