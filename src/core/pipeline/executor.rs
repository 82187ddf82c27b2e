//! Pipeline execution implementation.

use super::stats::{Outcome, RunStatistics};
use crate::core::fingerprint::FingerprintRegistry;
use crate::core::geocode::{
    GeocodeConfig, PlaceName, PlaceResolver, RemotePlaceResolver, SpatialGeocodeCache,
};
use crate::core::metadata::{ExifMetadataExtractor, MetadataExtractor};
use crate::core::organize::{copy_new, date_prefix, folder_name, DestinationAllocator};
use crate::core::scanner::{PhotoFile, ScanConfig, WalkDirScanner};
use crate::error::{OrganizerError, Result};
use crate::events::{
    null_sender, Event, EventSender, IngestEvent, IngestProgress, PipelineEvent, PipelinePhase,
    RunSummary,
};
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// A photo copied into the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopiedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
}

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Final tally
    pub summary: RunSummary,
    /// Every copy made, in completion order
    pub copied: Vec<CopiedFile>,
    /// Per-file and scan errors (non-fatal)
    pub errors: Vec<String>,
    /// Location queries answered from the geocode cache
    pub geocode_hits: usize,
    /// Location queries sent to the resolver
    pub geocode_lookups: usize,
    /// Worker threads used
    pub workers: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Folder to read photos from
    pub source: PathBuf,
    /// Library root; defaults to `{source}_Organized` beside the source
    pub destination: Option<PathBuf>,
    /// Concurrent workers
    pub workers: usize,
    /// Scanner configuration
    pub scan_config: ScanConfig,
    /// Geocoding client settings for the default resolver
    pub geocode: GeocodeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: None,
            workers: default_workers(),
            scan_config: ScanConfig::default(),
            geocode: GeocodeConfig::default(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// `{source folder name}_Organized`, next to the source folder
///
/// The source is resolved first so `.` and `dir/..` name the real folder
/// rather than landing inside the tree being organized.
pub fn default_destination(source: &Path) -> PathBuf {
    let source = fs::canonicalize(source)
        .or_else(|_| std::path::absolute(source))
        .unwrap_or_else(|_| source.to_path_buf());
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Photos".to_string());
    let parent = source.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{}_Organized", name))
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    extractor: Option<Box<dyn MetadataExtractor>>,
    resolver: Option<Box<dyn PlaceResolver>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            extractor: None,
            resolver: None,
        }
    }

    /// Folder to organize
    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.source = source.into();
        self
    }

    /// Library root to copy into
    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.config.destination = Some(destination.into());
        self
    }

    /// Number of concurrent workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Settings for the default Nominatim resolver
    pub fn geocode_config(mut self, config: GeocodeConfig) -> Self {
        self.config.geocode = config;
        self
    }

    /// Replace the EXIF extractor
    pub fn metadata_extractor(mut self, extractor: Box<dyn MetadataExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Replace the Nominatim resolver
    pub fn place_resolver(mut self, resolver: Box<dyn PlaceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        if self.config.workers == 0 {
            return Err(OrganizerError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.config.source.as_os_str().is_empty() {
            return Err(OrganizerError::Config("no source folder given".to_string()));
        }

        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => Box::new(RemotePlaceResolver::nominatim(&self.config.geocode)?),
        };

        let destination = self
            .config
            .destination
            .clone()
            .unwrap_or_else(|| default_destination(&self.config.source));

        Ok(Pipeline {
            destination,
            config: self.config,
            extractor: self
                .extractor
                .unwrap_or_else(|| Box::new(ExifMetadataExtractor)),
            places: SpatialGeocodeCache::new(resolver),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared by the workers of one run
struct RunState {
    registry: FingerprintRegistry,
    allocator: DestinationAllocator,
    stats: RunStatistics,
    errors: Mutex<Vec<String>>,
    copied: Mutex<Vec<CopiedFile>>,
}

impl RunState {
    fn new() -> Self {
        Self {
            registry: FingerprintRegistry::new(),
            allocator: DestinationAllocator::new(),
            stats: RunStatistics::new(),
            errors: Mutex::new(Vec::new()),
            copied: Mutex::new(Vec::new()),
        }
    }

    fn push_error(&self, message: String) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

/// What happened to a file that did not fail
enum Ingested {
    Copied(CopiedFile),
    Duplicate,
}

/// The organize pipeline
///
/// The geocode cache lives as long as the pipeline, so repeated runs reuse
/// earlier lookups. Fingerprints, folder counters and statistics are fresh
/// for every run.
pub struct Pipeline {
    config: PipelineConfig,
    destination: PathBuf,
    extractor: Box<dyn MetadataExtractor>,
    places: SpatialGeocodeCache,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Library root this pipeline copies into
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult> {
        let start_time = Instant::now();

        events.send(Event::Pipeline(PipelineEvent::Started));
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan = match scanner.scan_with_events(&self.config.source, events) {
            Ok(scan) => scan,
            Err(e) => {
                events.send(Event::Pipeline(PipelineEvent::Error {
                    message: e.to_string(),
                }));
                return Err(e.into());
            }
        };

        if let Err(e) = fs::create_dir_all(&self.destination) {
            warn!(
                "Could not create destination {}: {}",
                self.destination.display(),
                e
            );
        }

        let state = RunState::new();
        for error in &scan.errors {
            state.push_error(error.to_string());
        }

        let photos = scan.photos;
        let total = photos.len();
        let workers = self.config.workers;

        info!(
            "Organizing {} photos from {} into {} with {} workers",
            total,
            self.config.source.display(),
            self.destination.display(),
            workers
        );

        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Ingesting,
        }));
        events.send(Event::Ingest(IngestEvent::Started {
            total_photos: total,
            workers,
        }));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("organizer-{}", i))
            .build()
            .map_err(|e| OrganizerError::Config(e.to_string()))?;

        pool.install(|| {
            photos.par_iter().for_each(|photo| {
                let outcome = self.ingest_guarded(photo, &state, events);
                let completed = state.stats.record(outcome);

                events.send(Event::Ingest(IngestEvent::Progress(IngestProgress {
                    completed,
                    total,
                    current_path: photo.path.clone(),
                })));
            });
        });

        let summary = state.stats.summary();
        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Finished: {} processed, {} duplicates, {} errors in {} ms",
            summary.processed, summary.duplicates, summary.errors, duration_ms
        );

        events.send(Event::Pipeline(PipelineEvent::Completed { summary }));

        Ok(PipelineResult {
            summary,
            copied: state
                .copied
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
            errors: state
                .errors
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
            geocode_hits: self.places.hits(),
            geocode_lookups: self.places.lookups(),
            workers,
            duration_ms,
        })
    }

    /// Ingest one file, turning errors and panics into an error outcome
    fn ingest_guarded(&self, photo: &PhotoFile, state: &RunState, events: &EventSender) -> Outcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.ingest(photo, state)));

        let failure = match result {
            Ok(Ok(Ingested::Copied(copied))) => {
                events.send(Event::Ingest(IngestEvent::Copied {
                    source: copied.source.clone(),
                    destination: copied.destination.clone(),
                }));
                state
                    .copied
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(copied);
                return Outcome::Processed;
            }
            Ok(Ok(Ingested::Duplicate)) => {
                debug!("Duplicate found: {}", photo.path.display());
                events.send(Event::Ingest(IngestEvent::Duplicate {
                    path: photo.path.clone(),
                }));
                return Outcome::Duplicate;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("unexpected failure: {}", panic_message(&*payload)),
        };

        warn!("Error processing {}: {}", photo.path.display(), failure);
        events.send(Event::Ingest(IngestEvent::Error {
            path: photo.path.clone(),
            message: failure.clone(),
        }));
        state.push_error(format!("{}: {}", photo.path.display(), failure));
        Outcome::Error
    }

    fn ingest(&self, photo: &PhotoFile, state: &RunState) -> Result<Ingested> {
        let record = self.extractor.extract(&photo.path)?;

        if !state.registry.try_claim(&record.fingerprint) {
            return Ok(Ingested::Duplicate);
        }

        let place = match record.location {
            Some(point) => self.places.resolve(point),
            None => PlaceName::Unknown,
        };

        let folder = self.destination.join(folder_name(record.taken_at, &place));
        let destination =
            state
                .allocator
                .allocate(&folder, &date_prefix(record.taken_at), &record.extension)?;

        let bytes = copy_new(&photo.path, &destination)?;

        Ok(Ingested::Copied(CopiedFile {
            source: photo.path.clone(),
            destination,
            bytes,
        }))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fingerprint::Fingerprint;
    use crate::core::geocode::{GeoPoint, OfflineResolver};
    use crate::core::metadata::PhotoRecord;
    use crate::error::MetadataError;
    use chrono::NaiveDate;
    use std::fs::File;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Dates every photo 2021-04-05 and fails on files named `broken.*`
    struct FixedDateExtractor;

    impl MetadataExtractor for FixedDateExtractor {
        fn extract(&self, path: &Path) -> std::result::Result<PhotoRecord, MetadataError> {
            if path.file_stem().and_then(|s| s.to_str()) == Some("broken") {
                return Err(MetadataError::Unreadable {
                    path: path.to_path_buf(),
                    reason: "corrupt header".to_string(),
                });
            }
            if path.file_stem().and_then(|s| s.to_str()) == Some("explode") {
                panic!("decoder bug");
            }
            Ok(PhotoRecord {
                taken_at: NaiveDate::from_ymd_opt(2021, 4, 5)
                    .unwrap()
                    .and_hms_opt(9, 30, 0)
                    .unwrap(),
                location: Some(GeoPoint::new(45.0, 7.0)),
                original_name: String::new(),
                extension: ".jpg".to_string(),
                fingerprint: Fingerprint::of_file(path)?,
            })
        }
    }

    fn write(dir: &Path, name: &str, content: &[u8]) {
        File::create(dir.join(name)).unwrap().write_all(content).unwrap();
    }

    fn pipeline(source: &Path, destination: &Path) -> Pipeline {
        Pipeline::builder()
            .source(source)
            .destination(destination)
            .workers(4)
            .metadata_extractor(Box::new(FixedDateExtractor))
            .place_resolver(Box::new(OfflineResolver))
            .build()
            .unwrap()
    }

    #[test]
    fn default_destination_sits_beside_the_source() {
        assert_eq!(
            default_destination(Path::new("/photos/Backup")),
            PathBuf::from("/photos/Backup_Organized")
        );
    }

    #[test]
    fn default_destination_resolves_current_directory() {
        let cwd = fs::canonicalize(".").unwrap();
        let expected = cwd.parent().unwrap().join(format!(
            "{}_Organized",
            cwd.file_name().unwrap().to_string_lossy()
        ));

        assert_eq!(default_destination(Path::new(".")), expected);
    }

    #[test]
    fn default_destination_resolves_parent_components() {
        let temp_dir = TempDir::new().unwrap();
        let root = fs::canonicalize(temp_dir.path()).unwrap();
        fs::create_dir_all(root.join("Phone").join("DCIM")).unwrap();

        let destination = default_destination(&root.join("Phone").join("DCIM").join(".."));

        assert_eq!(destination, root.join("Phone_Organized"));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let result = Pipeline::builder()
            .source("/photos")
            .workers(0)
            .place_resolver(Box::new(OfflineResolver))
            .build();
        assert!(matches!(result, Err(OrganizerError::Config(_))));
    }

    #[test]
    fn builder_defaults_destination() {
        let pipeline = Pipeline::builder()
            .source("/photos/Trip")
            .place_resolver(Box::new(OfflineResolver))
            .build()
            .unwrap();
        assert_eq!(pipeline.destination(), Path::new("/photos/Trip_Organized"));
        assert!(pipeline.config.workers >= 1);
    }

    #[test]
    fn missing_source_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("out");

        let result = pipeline(&temp_dir.path().join("missing"), &destination).run();

        assert!(matches!(result, Err(OrganizerError::Scan(_))));
        assert!(!destination.exists());
    }

    #[test]
    fn empty_source_completes_with_zero_counts() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in");
        fs::create_dir_all(&source).unwrap();

        let result = pipeline(&source, &temp_dir.path().join("out")).run().unwrap();

        assert_eq!(result.summary, RunSummary::default());
        assert!(temp_dir.path().join("out").is_dir());
    }

    #[test]
    fn failures_and_panics_are_counted_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in");
        fs::create_dir_all(&source).unwrap();
        write(&source, "good.jpg", b"good");
        write(&source, "broken.jpg", b"bad");
        write(&source, "explode.jpg", b"boom");

        let result = pipeline(&source, &temp_dir.path().join("out")).run().unwrap();

        assert_eq!(result.summary.total, 3);
        assert_eq!(result.summary.processed, 1);
        assert_eq!(result.summary.errors, 2);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().any(|e| e.contains("corrupt header")));
        assert!(result.errors.iter().any(|e| e.contains("decoder bug")));
    }

    #[test]
    fn identical_content_is_copied_once() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in");
        fs::create_dir_all(source.join("nested")).unwrap();
        for i in 0..10 {
            write(&source, &format!("copy{i}.jpg"), b"same pixels");
        }
        write(&source.join("nested"), "other.jpg", b"other pixels");

        let out = temp_dir.path().join("out");
        let result = pipeline(&source, &out).run().unwrap();

        assert_eq!(result.summary.processed, 2);
        assert_eq!(result.summary.duplicates, 9);
        assert_eq!(result.copied.len(), 2);

        let mut names: Vec<_> = fs::read_dir(out.join("2021"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["2021-04-05_IMG0001.jpg", "2021-04-05_IMG0002.jpg"]);
    }

    /// Dates every photo 2023-08-14; files named `north.*` sit about 2 km
    /// north of the rest, all in Lisbon
    struct LisbonExtractor;

    impl MetadataExtractor for LisbonExtractor {
        fn extract(&self, path: &Path) -> std::result::Result<PhotoRecord, MetadataError> {
            let location = if path.file_stem().and_then(|s| s.to_str()) == Some("north") {
                GeoPoint::new(38.7403, -9.1393)
            } else {
                GeoPoint::new(38.7223, -9.1393)
            };
            Ok(PhotoRecord {
                taken_at: NaiveDate::from_ymd_opt(2023, 8, 14)
                    .unwrap()
                    .and_hms_opt(18, 0, 0)
                    .unwrap(),
                location: Some(location),
                original_name: String::new(),
                extension: ".jpg".to_string(),
                fingerprint: Fingerprint::of_file(path)?,
            })
        }
    }

    struct CountingResolver {
        calls: Arc<AtomicUsize>,
    }

    impl PlaceResolver for CountingResolver {
        fn resolve(&self, _point: GeoPoint) -> PlaceName {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PlaceName::Known("Lisboa".to_string())
        }
    }

    #[test]
    fn nearby_photos_share_a_place_folder_and_one_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in");
        fs::create_dir_all(&source).unwrap();
        write(&source, "center.jpg", b"tram");
        write(&source, "north.jpg", b"castle");
        write(&source, "zz_copy.jpg", b"tram");

        let calls = Arc::new(AtomicUsize::new(0));
        let out = temp_dir.path().join("out");
        let pipeline = Pipeline::builder()
            .source(&source)
            .destination(&out)
            .workers(1)
            .metadata_extractor(Box::new(LisbonExtractor))
            .place_resolver(Box::new(CountingResolver {
                calls: Arc::clone(&calls),
            }))
            .build()
            .unwrap();

        let result = pipeline.run().unwrap();

        assert_eq!(
            result.summary,
            RunSummary {
                total: 3,
                processed: 2,
                duplicates: 1,
                errors: 0,
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.geocode_lookups, 1);
        assert_eq!(result.geocode_hits, 1);

        let mut names: Vec<_> = fs::read_dir(out.join("2023 - Lisboa"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["2023-08-14_IMG0001.jpg", "2023-08-14_IMG0002.jpg"]);
        assert!(!out.join("2023").exists());
    }

    #[test]
    fn events_report_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in");
        fs::create_dir_all(&source).unwrap();
        write(&source, "a.jpg", b"a");
        write(&source, "b.jpg", b"a");
        write(&source, "broken.jpg", b"c");

        let (sender, receiver) = crate::events::EventChannel::new();
        let result = pipeline(&source, &temp_dir.path().join("out"))
            .run_with_events(&sender)
            .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        let progress = events
            .iter()
            .filter(|e| matches!(e, Event::Ingest(IngestEvent::Progress(_))))
            .count();
        let duplicates = events
            .iter()
            .filter(|e| matches!(e, Event::Ingest(IngestEvent::Duplicate { .. })))
            .count();

        assert_eq!(progress, 3);
        assert_eq!(duplicates, 1);
        assert!(matches!(
            events.last(),
            Some(Event::Pipeline(PipelineEvent::Completed { summary })) if *summary == result.summary
        ));
    }
}
