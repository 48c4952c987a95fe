//! Device orchestrator: check, reset and upload on a bounded worker pool

use log::{debug, error, info, warn};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Notify, Semaphore};

use super::cache::DeviceInfoCache;
use super::handle::{OperationHandle, OperationOutcome};
use crate::codec::ImageCodec;
use crate::config::{AppConfig, DeviceConfig};
use crate::errors::{PixerError, ProtocolError, Result};
use crate::models::{
    CheckResult, DeviceEndpoint, DeviceInfo, DeviceStatus, ResetResult, UploadInfo,
    UploadProgress, UploadResult, UploadStage,
};
use crate::protocol::{ClientOptions, Connector, ProtocolClient, TcpConnector};

/// Invoked on the worker at the start of every upload stage
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Invoked on the worker with the final record, before the handle resolves
pub type CompletionCallback<T> = Box<dyn FnOnce(&T) + Send>;

const SHUTDOWN_MESSAGE: &str = "service is shut down";

/// Runs device operations against one fixed endpoint.
///
/// Each operation opens its own session; sessions are never shared. The pool
/// only bounds how many operations run at once. The frame itself serves a
/// single peer, so concurrent device-bound operations may still fail at the
/// socket layer.
#[derive(Clone)]
pub struct DeviceOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    endpoint: DeviceEndpoint,
    device: DeviceConfig,
    options: ClientOptions,
    codec: ImageCodec,
    connector: Arc<dyn Connector>,
    workers: Arc<Semaphore>,
    cache: DeviceInfoCache,
    closed: AtomicBool,
    /// Operations accepted by `submit` that have not resolved yet
    pending: AtomicUsize,
    drained: Notify,
}

/// Counts one accepted operation until dropped, panics included
struct PendingGuard {
    inner: Arc<Inner>,
}

impl PendingGuard {
    fn new(inner: Arc<Inner>) -> Self {
        inner.pending.fetch_add(1, Ordering::SeqCst);
        Self { inner }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.inner.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.drained.notify_waiters();
        }
    }
}

impl DeviceOrchestrator {
    /// Orchestrator talking plain TCP to the configured endpoint
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_connector(config, Arc::new(TcpConnector))
    }

    pub fn with_connector(config: &AppConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Inner {
                endpoint: config.device.endpoint(),
                device: config.device.clone(),
                options: ClientOptions::from(&config.device),
                codec: ImageCodec::from_config(&config.image),
                connector,
                workers: Arc::new(Semaphore::new(config.service.workers)),
                cache: DeviceInfoCache::new(config.service.cache_ttl()),
                closed: AtomicBool::new(false),
                pending: AtomicUsize::new(0),
                drained: Notify::new(),
            }),
        })
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.inner.endpoint
    }

    pub fn codec(&self) -> &ImageCodec {
        &self.inner.codec
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Query battery and firmware versions; a successful check refreshes the cache
    pub fn check_device(&self) -> OperationHandle<CheckResult> {
        self.check_device_with(None)
    }

    pub fn check_device_with(
        &self,
        on_complete: Option<CompletionCallback<CheckResult>>,
    ) -> OperationHandle<CheckResult> {
        self.submit(on_complete, |inner| async move { inner.run_check().await })
    }

    /// Probe the device and send the reset command
    pub fn reset_device(&self) -> OperationHandle<ResetResult> {
        self.reset_device_with(None)
    }

    pub fn reset_device_with(
        &self,
        on_complete: Option<CompletionCallback<ResetResult>>,
    ) -> OperationHandle<ResetResult> {
        self.submit(on_complete, |inner| async move { inner.run_reset().await })
    }

    /// Validate, convert and upload an image
    pub fn upload_image(
        &self,
        image_data: Vec<u8>,
        on_progress: Option<ProgressCallback>,
    ) -> OperationHandle<UploadResult> {
        self.upload_image_with(image_data, on_progress, None)
    }

    pub fn upload_image_with(
        &self,
        image_data: Vec<u8>,
        on_progress: Option<ProgressCallback>,
        on_complete: Option<CompletionCallback<UploadResult>>,
    ) -> OperationHandle<UploadResult> {
        self.submit(on_complete, move |inner| async move {
            inner.run_upload(image_data, on_progress).await
        })
    }

    /// Read an image file on the worker, then upload it
    pub fn upload_image_file(
        &self,
        path: impl Into<PathBuf>,
        on_progress: Option<ProgressCallback>,
    ) -> OperationHandle<UploadResult> {
        self.upload_image_file_with(path, on_progress, None)
    }

    pub fn upload_image_file_with(
        &self,
        path: impl Into<PathBuf>,
        on_progress: Option<ProgressCallback>,
        on_complete: Option<CompletionCallback<UploadResult>>,
    ) -> OperationHandle<UploadResult> {
        let path = path.into();
        self.submit(on_complete, move |inner| async move {
            match tokio::fs::read(&path).await {
                Ok(image_data) => inner.run_upload(image_data, on_progress).await,
                Err(e) => {
                    let message = if e.kind() == std::io::ErrorKind::NotFound {
                        format!("File not found: {}", path.display())
                    } else {
                        format!("Error reading file: {}", e)
                    };
                    error!("{}", message);
                    UploadResult::failed(message)
                }
            }
        })
    }

    /// Cached device snapshot; never touches the network
    pub fn get_device_status(&self) -> DeviceStatus {
        match self.inner.cache.get() {
            Some((device_info, age)) => DeviceStatus {
                success: true,
                device_info: Some(device_info),
                cached: true,
                age_seconds: Some(age.as_secs_f64()),
                error: None,
            },
            None => DeviceStatus {
                success: false,
                device_info: None,
                cached: false,
                age_seconds: None,
                error: Some("No cached data available".to_string()),
            },
        }
    }

    pub fn cached_device_info(&self) -> Option<DeviceInfo> {
        self.inner.cache.get().map(|(info, _)| info)
    }

    /// Stop accepting work and wait until every accepted operation, running
    /// or still queued for a worker, has resolved.
    ///
    /// Later submissions resolve immediately with an error.
    pub async fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!("Pixer service already shutting down");
        }

        loop {
            let drained = self.inner.drained.notified();
            if self.inner.pending.load(Ordering::SeqCst) == 0 {
                break;
            }
            drained.await;
        }

        info!("Pixer service shutdown complete");
    }

    fn submit<T, F, Fut>(
        &self,
        on_complete: Option<CompletionCallback<T>>,
        operation: F,
    ) -> OperationHandle<T>
    where
        T: OperationOutcome + Unpin,
        F: FnOnce(Arc<Inner>) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        // Counted before the flag is read so shutdown either sees this
        // operation or this call sees the flag
        let guard = PendingGuard::new(self.inner.clone());
        if self.is_shut_down() {
            drop(guard);
            let result = T::failed(SHUTDOWN_MESSAGE.to_string());
            if let Some(callback) = on_complete {
                callback(&result);
            }
            return OperationHandle::ready(result);
        }

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let result = match inner.workers.clone().acquire_owned().await {
                Ok(permit) => {
                    let result = operation(inner.clone()).await;
                    drop(permit);
                    result
                }
                Err(_) => T::failed(SHUTDOWN_MESSAGE.to_string()),
            };
            if let Some(callback) = on_complete {
                callback(&result);
            }
            drop(guard);
            result
        });

        OperationHandle::spawned(handle)
    }
}

impl Inner {
    fn client(&self) -> ProtocolClient {
        ProtocolClient::with_connector(
            self.endpoint.clone(),
            self.connector.clone(),
            self.options.clone(),
        )
    }

    async fn connect(&self, client: &mut ProtocolClient) -> Result<()> {
        client
            .connect(self.device.connect_attempts, self.device.retry_delay())
            .await
    }

    async fn run_check(&self) -> CheckResult {
        let mut result = CheckResult::new();

        let mut client = self.client();
        let outcome = match self.connect(&mut client).await {
            Ok(()) => client.get_device_info().await,
            Err(e) => Err(e),
        };
        client.close().await;

        match outcome {
            Ok(device_info) => {
                result.success = device_info.connected && device_info.error.is_none();
                if result.success {
                    info!("Device check succeeded for {}", self.endpoint);
                    self.cache.store(device_info.clone());
                } else {
                    result.error = device_info
                        .error
                        .clone()
                        .or_else(|| Some("Device not responding".to_string()));
                }
                result.device_info = device_info;
            }
            Err(e) => {
                error!("Error checking device: {}", e);
                result.device_info.error = Some(e.to_string());
                result.error = Some(e.to_string());
            }
        }

        result
    }

    async fn run_reset(&self) -> ResetResult {
        let mut result = ResetResult::new();

        let mut client = self.client();
        let outcome = match self.connect(&mut client).await {
            Ok(()) => client.reset_device().await,
            Err(e) => Err(e),
        };
        client.close().await;

        match outcome {
            Ok(()) => {
                info!("Reset command delivered to {}", self.endpoint);
                result.success = true;
            }
            Err(e) => {
                error!("Error resetting device: {}", e);
                result.error = Some(e.to_string());
            }
        }

        result
    }

    async fn run_upload(
        &self,
        image_data: Vec<u8>,
        on_progress: Option<ProgressCallback>,
    ) -> UploadResult {
        let mut result = UploadResult::new();

        enter_stage(&mut result, &on_progress, UploadStage::Validating);
        let codec = self.codec.clone();
        let inspected = tokio::task::spawn_blocking(move || codec.inspect(&image_data)).await;
        let (image_info, decoded) = match inspected {
            Ok(inspected) => inspected,
            Err(e) => return fail(result, format!("Unexpected error: {}", e)),
        };
        let valid = image_info.valid;
        let invalid_reason = image_info.error.clone();
        result.image_info = Some(image_info);

        let decoded = match decoded {
            Some(img) if valid => img,
            _ => {
                let reason = invalid_reason.unwrap_or_else(|| "Unknown error".to_string());
                return fail(result, format!("Invalid image: {}", reason));
            }
        };

        enter_stage(&mut result, &on_progress, UploadStage::Processing);
        let codec = self.codec.clone();
        let frame = match tokio::task::spawn_blocking(move || codec.render(decoded)).await {
            Ok(Ok(frame)) => frame,
            Ok(Err(e)) => return fail(result, PixerError::from(e).to_string()),
            Err(e) => return fail(result, format!("Unexpected error: {}", e)),
        };

        enter_stage(&mut result, &on_progress, UploadStage::Connecting);
        let mut client = self.client();
        if let Err(e) = self.connect(&mut client).await {
            return fail(result, e.to_string());
        }
        if !client.test_connection().await {
            client.close().await;
            return fail(
                result,
                PixerError::from(ProtocolError::NotResponding).to_string(),
            );
        }

        enter_stage(&mut result, &on_progress, UploadStage::Uploading);
        let outcome = client
            .upload_image_data(&frame, self.device.chunk_size)
            .await;
        client.close().await;

        match outcome {
            Ok(report) => {
                result.upload_info = Some(UploadInfo {
                    success: true,
                    bytes_sent: report.bytes_sent,
                    total_bytes: report.total_bytes,
                    error: None,
                });
                result.success = true;
                info!(
                    "Uploaded {} byte frame to {}",
                    report.total_bytes, self.endpoint
                );
                enter_stage(&mut result, &on_progress, UploadStage::Complete);
                result
            }
            Err(e) => {
                let bytes_sent = match &e {
                    PixerError::Transfer(transfer) => transfer.bytes_sent,
                    _ => 0,
                };
                result.upload_info = Some(UploadInfo {
                    success: false,
                    bytes_sent,
                    total_bytes: frame.len(),
                    error: Some(e.to_string()),
                });
                fail(result, e.to_string())
            }
        }
    }
}

fn enter_stage(
    result: &mut UploadResult,
    on_progress: &Option<ProgressCallback>,
    stage: UploadStage,
) {
    result.stage = stage;
    debug!("Upload stage: {} ({}%)", stage, stage.progress());
    if let Some(callback) = on_progress {
        callback(UploadProgress::from(stage));
    }
}

/// Record `error` and keep the stage at which the upload stopped
fn fail(mut result: UploadResult, error: String) -> UploadResult {
    warn!("Upload failed during {}: {}", result.stage, error);
    result.error = Some(error);
    result
}
