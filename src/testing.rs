//! Scripted collaborators shared by the monitor and scheduler tests.

use crate::common::frame::test_png;
use crate::common::{CameraConfig, EncodedFrame, LabelSet};
use crate::error::{CaptureError, InferenceError};
use crate::inference::{InferenceGateway, InferenceRequest};
use crate::intake::{FrameSampler, SamplerFactory};
use async_trait::async_trait;
use chrono::Utc;
use image::ImageFormat;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub fn labels(items: &[&str]) -> LabelSet {
    items.iter().map(|s| s.to_string()).collect()
}

/// Per-camera call accounting kept by [`ScriptedGateway`].
#[derive(Default)]
pub struct CallStats {
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

/// Answers from a queue of scripted results per camera, falling back to a
/// default once the queue is empty. Each call sleeps for the camera's delay.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<String, VecDeque<Result<LabelSet, InferenceError>>>>,
    fallback: Mutex<HashMap<String, Result<LabelSet, InferenceError>>>,
    delays: Mutex<HashMap<String, Duration>>,
    stats: Mutex<HashMap<String, Arc<CallStats>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, camera_id: &str, result: Result<LabelSet, InferenceError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(camera_id.to_string())
            .or_default()
            .push_back(result);
    }

    pub fn set_fallback(&self, camera_id: &str, result: Result<LabelSet, InferenceError>) {
        self.fallback
            .lock()
            .unwrap()
            .insert(camera_id.to_string(), result);
    }

    pub fn set_delay(&self, camera_id: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(camera_id.to_string(), delay);
    }

    pub fn stats(&self, camera_id: &str) -> Arc<CallStats> {
        self.stats
            .lock()
            .unwrap()
            .entry(camera_id.to_string())
            .or_default()
            .clone()
    }

    pub fn calls(&self, camera_id: &str) -> usize {
        self.stats(camera_id).calls.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<CallStats>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn infer(&self, request: &InferenceRequest) -> Result<LabelSet, InferenceError> {
        let camera_id = request.camera_id.as_str();
        let stats = self.stats(camera_id);
        stats.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        let _guard = InFlight(stats);

        let delay = self
            .delays
            .lock()
            .unwrap()
            .get(camera_id)
            .copied()
            .unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(camera_id)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| {
            self.fallback
                .lock()
                .unwrap()
                .get(camera_id)
                .cloned()
                .unwrap_or_else(|| Ok(LabelSet::new()))
        })
    }
}

/// Hands out a valid PNG, or the scripted capture failures first. While
/// `hang` is set a sample never completes.
pub struct StaticSampler {
    camera_id: String,
    failures: Arc<Mutex<VecDeque<CaptureError>>>,
    hang: Arc<AtomicBool>,
    _lease: Arc<()>,
}

#[async_trait]
impl FrameSampler for StaticSampler {
    async fn sample(&mut self) -> Result<EncodedFrame, CaptureError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(EncodedFrame::new(
            self.camera_id.clone(),
            test_png(),
            ImageFormat::Png,
            Utc::now(),
        ))
    }
}

/// Opens [`StaticSampler`]s. Every open sampler holds a clone of `lease`, so
/// its strong count shows how many samplers are still alive.
#[derive(Default)]
pub struct StaticSamplerFactory {
    pub lease: Arc<()>,
    failures: Arc<Mutex<VecDeque<CaptureError>>>,
    hang: Arc<AtomicBool>,
    open_failures: Mutex<VecDeque<CaptureError>>,
    pub opened: AtomicUsize,
}

impl StaticSamplerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_sample(&self, err: CaptureError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn hang_samples(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn fail_next_open(&self, err: CaptureError) {
        self.open_failures.lock().unwrap().push_back(err);
    }

    pub fn live_samplers(&self) -> usize {
        Arc::strong_count(&self.lease) - 1
    }
}

impl SamplerFactory for StaticSamplerFactory {
    fn open(&self, camera: &CameraConfig) -> Result<Box<dyn FrameSampler>, CaptureError> {
        if let Some(err) = self.open_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticSampler {
            camera_id: camera.camera_id().to_string(),
            failures: self.failures.clone(),
            hang: self.hang.clone(),
            _lease: self.lease.clone(),
        }))
    }
}

/// Accepts one connection on a loopback port, answers it with a canned
/// response and hands back the raw request it read.
pub async fn serve_once(
    status_line: &str,
    content_type: &str,
    body: Vec<u8>,
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_line,
        content_type,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(&body);

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;
        stream.write_all(&response).await.unwrap();
        let _ = stream.shutdown().await;
        request
    });
    (format!("http://{}", addr), server)
}

/// A loopback address nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = stream.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..read]);
        if request_complete(&request) {
            break;
        }
    }
    String::from_utf8_lossy(&request).into_owned()
}

fn request_complete(request: &[u8]) -> bool {
    let Some(head_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&request[..head_end]).to_ascii_lowercase();
    if head.contains("transfer-encoding: chunked") {
        return request.ends_with(b"0\r\n\r\n");
    }
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= head_end + 4 + content_length
}
