mod aggregator;
mod artwork;
mod auth;
mod sources;

pub use aggregator::AggregationEvent;
pub use aggregator::AggregationReport;
pub use aggregator::ArtworkFailure;
pub use aggregator::CancelToken;
pub use aggregator::DedupPolicy;
pub use aggregator::JobState;
pub use aggregator::PlaylistAggregator;
pub use aggregator::SourceFailure;
pub use aggregator::SourceOutcome;
pub use aggregator::TrackFailure;
pub use aggregator::TrackStage;
pub use artwork::ArtworkDirectory;
pub use artwork::ImageStore;
pub use auth::RefreshPolicy;
pub use auth::TokenManager;
pub use sources::load_sources;
pub use sources::parse_sources;
