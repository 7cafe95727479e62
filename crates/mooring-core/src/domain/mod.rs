//! Domain model (IDs, file payload, asset status, records, reports, errors).

pub mod asset;
pub mod errors;
pub mod file;
pub mod ids;
pub mod record;
pub mod report;
pub mod state;

pub use asset::LocalAsset;
pub use errors::{GatewayError, RegistryError, ReleaseError};
pub use file::FileData;
pub use ids::{LocalHandle, RemoteId, RemoteUrl, SessionId};
pub use record::CommittedAssetRecord;
pub use report::{
    CommitReport, DeletionOutcome, FailedUpload, FlushReport, HandleMapping, SaveReport,
};
pub use state::AssetStatus;
