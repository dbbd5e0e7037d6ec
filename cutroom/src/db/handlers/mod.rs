//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` (a pooled connection or an open transaction)
//! and implements [`Repository`] for its table. Callers that need a read-modify-write to be
//! atomic open a transaction and hand it to the repository:
//!
//! ```ignore
//! use cutroom::db::handlers::{PortfolioItems, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let mut repo = PortfolioItems::new(&mut tx);
//! let before = repo.get_by_id(id).await?;
//! let after = repo.update(id, &request).await?;
//! tx.commit().await?;
//! ```

pub mod about_video;
pub mod applications;
pub mod contacts;
pub mod jobs;
pub mod portfolio;
pub mod reels;
pub mod repository;
pub mod showreels;
pub mod team;
pub mod users;

pub use about_video::AboutVideos;
pub use applications::Applications;
pub use contacts::Contacts;
pub use jobs::Jobs;
pub use portfolio::PortfolioItems;
pub use reels::Reels;
pub use repository::Repository;
pub use showreels::Showreels;
pub use team::TeamMembers;
pub use users::Users;
