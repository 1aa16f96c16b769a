//! Service layer - listings, writes and admissions on top of a document store

pub mod actor;
pub mod admissions;
pub mod aggregate;
pub mod listing;
pub mod paginator;
pub mod records;

pub use actor::{Access, ActorContext, Role};
pub use admissions::AdmissionService;
pub use aggregate::{resolve_page, Aggregate};
pub use listing::ListingService;
pub use paginator::Paginator;
pub use records::RecordService;
