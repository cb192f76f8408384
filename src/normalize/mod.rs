pub mod events;
pub mod fallback;
pub mod lookup;
pub mod schema;
pub mod snapshot;
pub mod team;

pub use events::{extract, extract_with};
pub use fallback::{summary_stats, synthesize, synthesize_events, SummaryStats, SynthesisParams};
pub use lookup::coerce_numeric;
pub use schema::resolve;
pub use snapshot::{roster, SnapshotBuilder};
pub use team::{TeamResolver, RIFT_TEAMS, VALORANT_TEAMS};
