use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use thiserror::Error;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::{
    error::{ApiError, AuthError, Error},
    info,
    management::artwork::ImageStore,
    spotify::{client::Executor, extract, playlist},
    types::{SourcePlaylist, Track},
    warning,
};

/// What happens when the same track id shows up more than once in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// Add every occurrence, in the order encountered.
    #[default]
    Preserve,
    /// Add only the first occurrence across all sources of the run.
    SkipSeen,
}

/// Cooperative cancellation flag, checked between sources and between tracks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a run is. Every transition is published as
/// [`AggregationEvent::StateChanged`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Created,
    FetchingSource(usize),
    FetchingTrack(usize, usize),
    AddingTrack(usize, usize),
    Failed(usize, String),
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceFailure {
    #[error("not a playlist URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("cancelled with {remaining} of {listed} tracks not attempted")]
    Cancelled { remaining: usize, listed: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStage {
    Fetch,
    Add,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFailure {
    pub track_id: String,
    pub stage: TrackStage,
    pub error: ApiError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkFailure {
    pub track_id: String,
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub index: usize,
    pub display_name: String,
    pub url: String,
    pub playlist_id: Option<String>,
    pub failure: Option<SourceFailure>,
    pub added: Vec<Track>,
    pub track_failures: Vec<TrackFailure>,
    pub artwork_failures: Vec<ArtworkFailure>,
    pub skipped_duplicates: usize,
}

impl SourceOutcome {
    fn new(index: usize, source: &SourcePlaylist) -> Self {
        Self {
            index,
            display_name: source.display_name.clone(),
            url: source.playlist_url.clone(),
            playlist_id: None,
            failure: None,
            added: Vec::new(),
            track_failures: Vec::new(),
            artwork_failures: Vec::new(),
            skipped_duplicates: 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationEvent {
    StateChanged(JobState),
    SourceStarted { index: usize, name: String },
    SourceFailed { index: usize, cause: String },
    TrackAdded { index: usize, track: Track },
    TrackFailed { index: usize, track_id: String, cause: String },
    Finished,
}

/// The final state of a run: one outcome per source that was reached, in
/// input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationReport {
    pub destination: String,
    pub sources: Vec<SourceOutcome>,
    pub cancelled: bool,
}

impl AggregationReport {
    pub fn sources_succeeded(&self) -> usize {
        self.sources.iter().filter(|s| s.succeeded()).count()
    }

    pub fn sources_failed(&self) -> usize {
        self.sources.len() - self.sources_succeeded()
    }

    pub fn tracks_added(&self) -> usize {
        self.sources.iter().map(|s| s.added.len()).sum()
    }

    pub fn tracks_failed(&self) -> usize {
        self.sources.iter().map(|s| s.track_failures.len()).sum()
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources.iter().filter(|s| !s.succeeded())
    }

    pub fn failed_tracks(&self) -> impl Iterator<Item = &TrackFailure> {
        self.sources.iter().flat_map(|s| s.track_failures.iter())
    }

    /// Track ids in the order they were added to the destination.
    pub fn added_track_ids(&self) -> Vec<String> {
        self.sources
            .iter()
            .flat_map(|s| s.added.iter().map(|t| t.id.clone()))
            .collect()
    }
}

/// Per-run bookkeeping. Lives only for the duration of one `aggregate` call.
#[derive(Debug)]
struct AggregationJob {
    destination: String,
    sources: Vec<SourcePlaylist>,
    state: JobState,
    outcomes: Vec<SourceOutcome>,
    /// Track ids already added to the destination in this run.
    seen: HashSet<String>,
}

impl AggregationJob {
    fn new(destination: impl Into<String>, sources: Vec<SourcePlaylist>) -> Self {
        Self {
            destination: destination.into(),
            sources,
            state: JobState::Created,
            outcomes: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn into_report(self) -> AggregationReport {
        AggregationReport {
            destination: self.destination,
            sources: self.outcomes,
            cancelled: self.state == JobState::Cancelled,
        }
    }
}

/// Clears the running flag when a run ends, including on panic.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct PlaylistAggregator {
    api: Arc<dyn Executor>,
    images: Arc<dyn ImageStore>,
    dedup: DedupPolicy,
    events: Option<UnboundedSender<AggregationEvent>>,
    running: AtomicBool,
}

impl PlaylistAggregator {
    pub fn new(api: Arc<dyn Executor>, images: Arc<dyn ImageStore>) -> Self {
        Self {
            api,
            images,
            dedup: DedupPolicy::default(),
            events: None,
            running: AtomicBool::new(false),
        }
    }

    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<AggregationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Runs [`aggregate`](Self::aggregate) on its own task.
    pub fn spawn(
        self: Arc<Self>,
        destination: String,
        sources: Vec<SourcePlaylist>,
        cancel: CancelToken,
    ) -> JoinHandle<Result<AggregationReport, Error>> {
        tokio::spawn(async move { self.aggregate(&destination, &sources, &cancel).await })
    }

    /// Merges every source playlist into `destination`, best effort.
    ///
    /// Sources and their tracks are processed strictly in input order. A
    /// source whose URL or listing fails is recorded and skipped; a track
    /// whose lookup or add fails is recorded and skipped. Artwork problems
    /// are logged and never prevent the add. Tracks already added stay in
    /// place when the run is cancelled; a source interrupted by cancellation
    /// is reported as [`SourceFailure::Cancelled`].
    ///
    /// An authentication failure ends the run with [`Error::Auth`], since no
    /// further call can succeed without a new token. Fails with
    /// [`Error::Busy`] while another run on this aggregator is in flight.
    pub async fn aggregate(
        &self,
        destination: &str,
        sources: &[SourcePlaylist],
        cancel: &CancelToken,
    ) -> Result<AggregationReport, Error> {
        let _guard = RunGuard::acquire(&self.running).ok_or(Error::Busy)?;
        let mut job = AggregationJob::new(destination, sources.to_vec());

        for index in 0..job.sources.len() {
            if cancel.is_cancelled() {
                self.transition(&mut job, JobState::Cancelled);
                break;
            }

            let source = job.sources[index].clone();
            let mut outcome = SourceOutcome::new(index, &source);
            self.transition(&mut job, JobState::FetchingSource(index));
            self.emit(AggregationEvent::SourceStarted {
                index,
                name: source.display_name.clone(),
            });

            match self.process_source(&mut job, &mut outcome, cancel).await {
                Ok(()) => {}
                Err(SourceFailure::Api(ApiError::Auth(error))) => {
                    self.abort(&mut job, index, &error);
                    return Err(Error::Auth(error));
                }
                Err(failure @ SourceFailure::Cancelled { .. }) => {
                    warning!("Source {} interrupted: {}", source.display_name, failure);
                    outcome.failure = Some(failure);
                    self.transition(&mut job, JobState::Cancelled);
                }
                Err(failure) => {
                    warning!(
                        "Skipping source {} ({}): {}",
                        source.display_name,
                        source.playlist_url,
                        failure
                    );
                    self.transition(&mut job, JobState::Failed(index, failure.to_string()));
                    self.emit(AggregationEvent::SourceFailed {
                        index,
                        cause: failure.to_string(),
                    });
                    outcome.failure = Some(failure);
                }
            }

            job.outcomes.push(outcome);
        }

        if job.state != JobState::Cancelled {
            self.transition(&mut job, JobState::Completed);
        }
        self.emit(AggregationEvent::Finished);

        let report = job.into_report();
        info!(
            "Merged {} of {} sources, {} tracks added, {} tracks failed",
            report.sources_succeeded(),
            report.sources.len(),
            report.tracks_added(),
            report.tracks_failed()
        );
        Ok(report)
    }

    async fn process_source(
        &self,
        job: &mut AggregationJob,
        outcome: &mut SourceOutcome,
        cancel: &CancelToken,
    ) -> Result<(), SourceFailure> {
        let index = outcome.index;
        let playlist_id = extract::extract_playlist_id(&outcome.url)
            .ok_or_else(|| SourceFailure::InvalidUrl(outcome.url.clone()))?;
        outcome.playlist_id = Some(playlist_id.clone());

        let track_ids = playlist::get_playlist_track_ids(self.api.as_ref(), &playlist_id).await?;

        for (position, track_id) in track_ids.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(SourceFailure::Cancelled {
                    remaining: track_ids.len() - position,
                    listed: track_ids.len(),
                });
            }

            if self.dedup == DedupPolicy::SkipSeen && job.seen.contains(track_id) {
                outcome.skipped_duplicates += 1;
                continue;
            }

            self.transition(job, JobState::FetchingTrack(index, position));
            self.process_track(job, outcome, position, track_id)
                .await
                .map_err(|e| SourceFailure::Api(ApiError::Auth(e)))?;
        }

        Ok(())
    }

    /// Per-track failures are recorded on `outcome`. Only an authentication
    /// failure is returned.
    async fn process_track(
        &self,
        job: &mut AggregationJob,
        outcome: &mut SourceOutcome,
        position: usize,
        track_id: &str,
    ) -> Result<(), AuthError> {
        let index = outcome.index;
        let fetched = match playlist::get_track_json(self.api.as_ref(), track_id).await {
            Ok(json) => extract::extract_track_meta(&json),
            Err(e) => Err(e),
        };

        let track = match fetched {
            Ok(track) => track,
            Err(ApiError::Auth(error)) => return Err(error),
            Err(error) => {
                self.record_track_failure(outcome, track_id, TrackStage::Fetch, error);
                return Ok(());
            }
        };

        if let Err(cause) = self.save_artwork(&track).await {
            warning!("Artwork for track {} not saved: {}", track.id, cause);
            outcome.artwork_failures.push(ArtworkFailure {
                track_id: track.id.clone(),
                cause,
            });
        }

        self.transition(job, JobState::AddingTrack(index, position));
        match playlist::add_track_to_playlist(self.api.as_ref(), &job.destination, &track.id).await
        {
            Ok(()) => {
                job.seen.insert(track_id.to_string());
                self.emit(AggregationEvent::TrackAdded {
                    index,
                    track: track.clone(),
                });
                outcome.added.push(track);
            }
            Err(ApiError::Auth(error)) => return Err(error),
            Err(error) => self.record_track_failure(outcome, track_id, TrackStage::Add, error),
        }
        Ok(())
    }

    fn transition(&self, job: &mut AggregationJob, state: JobState) {
        job.state = state.clone();
        self.emit(AggregationEvent::StateChanged(state));
    }

    fn abort(&self, job: &mut AggregationJob, index: usize, error: &AuthError) {
        warning!("Merge stopped at source {}: {}", index, error);
        self.transition(job, JobState::Failed(index, error.to_string()));
        self.emit(AggregationEvent::SourceFailed {
            index,
            cause: error.to_string(),
        });
        self.emit(AggregationEvent::Finished);
    }

    async fn save_artwork(&self, track: &Track) -> Result<(), String> {
        let Some(url) = &track.album_image_url else {
            return Ok(());
        };

        let bytes = self.api.download(url).await.map_err(|e| e.to_string())?;
        self.images.save(&bytes, &track.id).await?;
        Ok(())
    }

    fn record_track_failure(
        &self,
        outcome: &mut SourceOutcome,
        track_id: &str,
        stage: TrackStage,
        error: ApiError,
    ) {
        warning!("Track {} failed ({:?}): {}", track_id, stage, error);
        self.emit(AggregationEvent::TrackFailed {
            index: outcome.index,
            track_id: track_id.to_string(),
            cause: error.to_string(),
        });
        outcome.track_failures.push(TrackFailure {
            track_id: track_id.to_string(),
            stage,
            error,
        });
    }

    fn emit(&self, event: AggregationEvent) {
        if let Some(events) = &self.events {
            // the receiver going away only means nobody is watching
            let _ = events.send(event);
        }
    }
}
