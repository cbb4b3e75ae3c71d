//! Persistent history of finished tests.
mod record;
mod store;


pub use record::{EndpointSummary, HistoryRecord, ResultSummary};
pub use store::{
    DEFAULT_LIST_LIMIT, HISTORY_CAP, HistoryStore, JsonFileHistoryStore, MemoryHistoryStore,
};
