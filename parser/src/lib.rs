mod error;
pub mod ingest;
pub mod record;
pub mod roster;
pub mod schema;
pub mod state;
pub mod timeline;
pub mod types;

pub use error::*;
pub use ingest::{ParsedMatch, parse};
pub use record::TelemetryRecord;
pub use roster::Entity;
pub use state::{ResolvedState, StateResolver};
pub use strum;
pub use timeline::Timeline;

#[cfg(feature = "arc")]
pub type Rc<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub type Rc<T> = std::rc::Rc<T>;
