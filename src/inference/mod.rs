pub mod gateway;
pub mod http_gateway;
pub mod service;

pub use gateway::{InferenceGateway, InferenceRequest};
pub use http_gateway::HttpInferenceGateway;
pub use service::{InferenceService, InferenceServiceBuilder, into_inference_error};
