use crate::common::LabelSet;
use crate::error::InferenceError;
use crate::inference::{InferenceGateway, InferenceRequest};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder};

/// Cloneable handle every monitor calls inference through.
pub type InferenceService = BoxCloneService<InferenceRequest, LabelSet, BoxError>;

#[derive(Clone)]
pub struct GatewayService {
    inner: Arc<dyn InferenceGateway>,
}

impl GatewayService {
    pub fn new(inner: Arc<dyn InferenceGateway>) -> Self {
        Self { inner }
    }
}

impl Service<InferenceRequest> for GatewayService {
    type Response = LabelSet;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: InferenceRequest) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move { inner.infer(&request).await.map_err(BoxError::from) })
    }
}

pub struct InferenceServiceBuilder {
    gateway: Arc<dyn InferenceGateway>,
    timeout: Option<Duration>,
}

impl InferenceServiceBuilder {
    pub fn new(gateway: Arc<dyn InferenceGateway>) -> Self {
        Self {
            gateway,
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> InferenceService {
        let service = ServiceBuilder::new()
            .option_layer(self.timeout.map(TimeoutLayer::new))
            .service(GatewayService::new(self.gateway));
        BoxCloneService::new(service)
    }
}

/// Recovers the gateway's error from whatever the tower stack returned.
pub fn into_inference_error(err: BoxError) -> InferenceError {
    if err.is::<Elapsed>() {
        return InferenceError::Unavailable("inference timed out".to_string());
    }
    match err.downcast::<InferenceError>() {
        Ok(e) => *e,
        Err(other) => InferenceError::Unavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::EncodedFrame;
    use crate::common::frame::test_png;
    use async_trait::async_trait;
    use chrono::Utc;
    use image::ImageFormat;
    use tower::ServiceExt;

    struct FixedGateway {
        delay: Duration,
        result: Result<LabelSet, InferenceError>,
    }

    #[async_trait]
    impl InferenceGateway for FixedGateway {
        async fn infer(&self, _request: &InferenceRequest) -> Result<LabelSet, InferenceError> {
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    fn request() -> InferenceRequest {
        InferenceRequest::new(EncodedFrame::new(
            "dock",
            test_png(),
            ImageFormat::Png,
            Utc::now(),
        ))
    }

    #[tokio::test]
    async fn passes_labels_through() {
        let labels: LabelSet = ["person".to_string()].into_iter().collect();
        let service = InferenceServiceBuilder::new(Arc::new(FixedGateway {
            delay: Duration::ZERO,
            result: Ok(labels.clone()),
        }))
        .build();

        assert_eq!(service.oneshot(request()).await.unwrap(), labels);
    }

    #[tokio::test]
    async fn gateway_errors_survive_the_stack() {
        let service = InferenceServiceBuilder::new(Arc::new(FixedGateway {
            delay: Duration::ZERO,
            result: Err(InferenceError::Rejected("bad payload".to_string())),
        }))
        .timeout(Duration::from_secs(1))
        .build();

        let err = into_inference_error(service.oneshot(request()).await.unwrap_err());
        assert_eq!(err, InferenceError::Rejected("bad payload".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_maps_to_unavailable() {
        let service = InferenceServiceBuilder::new(Arc::new(FixedGateway {
            delay: Duration::from_secs(10),
            result: Ok(LabelSet::new()),
        }))
        .timeout(Duration::from_secs(2))
        .build();

        let err = into_inference_error(service.oneshot(request()).await.unwrap_err());
        assert!(err.is_unavailable());
    }
}
