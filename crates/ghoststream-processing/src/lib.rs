//! GhostStream Processing Library
//!
//! The ingestion pipeline: probing, resolution policy, transcoding, invariant
//! validation, thumbnails, and the orchestrator that sequences them through to
//! object storage and the catalog.

pub mod command;
pub mod pipeline;
pub mod policy;
pub mod prober;
pub mod progress;
pub mod queue;
pub mod report;
pub mod thumbnail;
pub mod transcode;
pub mod validator;

pub use command::{CommandError, CommandOutput, CommandRunner, SystemCommandRunner};
pub use pipeline::{inspect, IngestOptions, IngestPipeline, IngestRequest, PipelineConfig};
pub use policy::{choose_cap, is_compliant, plan, plan_scale};
pub use prober::MediaProber;
pub use progress::{NoopProgress, ProgressEvent, ProgressListener, TracingProgress};
pub use queue::{IngestQueue, JobOutcome, QueueReport};
pub use report::{Analysis, PlanReport};
pub use thumbnail::{Thumbnail, ThumbnailGenerator};
pub use transcode::{TranscodeEngine, TranscodedMedia};
pub use validator::{InvariantValidator, ValidatedMedia};
