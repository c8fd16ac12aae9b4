//! ClassQuest Store - document store and identity collaborator interfaces

pub mod api;
pub mod cache;
pub mod document;
pub mod identity;
pub mod memory;

pub use api::{DocumentStore, OrderBy, QueryFilter, Subscription};
pub use cache::{CachedStore, DocumentCache};
pub use document::Document;
pub use identity::{ActorRole, IdentityProvider, StaticIdentity, UserIdentity};
pub use memory::MemoryStore;
