pub mod factory;
pub mod file_sampler;
pub mod http_sampler;
pub mod sampler;

pub use factory::{SamplerFactory, UriSamplerFactory};
pub use file_sampler::FileSnapshotSampler;
pub use http_sampler::HttpSnapshotSampler;
pub use sampler::FrameSampler;
