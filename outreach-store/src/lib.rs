pub mod backends;
pub mod config;
pub mod directory;
pub mod error;
pub mod r#trait;
pub mod types;

pub use backends::MemoryStore;
pub use config::StoreConfig;
pub use directory::{
    AccountDirectory, ContactDirectory, MemoryAccountDirectory, MemoryContactDirectory,
};
pub use error::{Result, StoreError};
pub use r#trait::CampaignStore;
pub use types::{
    Campaign, CampaignFilter, CampaignLog, CampaignPage, CampaignUpdate, LogPage, LogUpdate,
    NewCampaignRecord, NewLogRecord, StatusCounts,
};
