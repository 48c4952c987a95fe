//! TCP session client for a Pixer frame

use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

use super::connector::{BoxedStream, Connector, TcpConnector};
use super::{
    BATTERY_LEVEL_COMMAND, BLE_VERSION_COMMAND, ITE_VERSION_COMMAND, MCU_VERSION_COMMAND,
    RESET_COMMAND, RESPONSE_BUFFER_SIZE, TEST_COMMAND, TEST_RESPONSE, UPLOAD_SENTINEL,
};
use crate::config::DeviceConfig;
use crate::errors::{ConnectionError, ProtocolError, Result, TransferError};
use crate::models::{BatteryLevel, DeviceEndpoint, DeviceInfo};

/// Timeouts and retry counts applied by a [`ProtocolClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Bound on each individual connect attempt
    pub connect_timeout: Duration,
    /// Bound on each read while waiting for a response
    pub read_timeout: Duration,
    /// I/O bound used for the whole of a frame upload
    pub upload_timeout: Duration,
    /// Reads attempted per command before giving up on a response
    pub command_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from(&DeviceConfig::default())
    }
}

impl From<&DeviceConfig> for ClientOptions {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            upload_timeout: config.upload_timeout(),
            command_retries: config.command_retries,
        }
    }
}

/// Byte counts of a completed upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReport {
    pub bytes_sent: usize,
    pub total_bytes: usize,
}

struct Session {
    stream: BoxedStream,
    io_timeout: Duration,
}

/// Client for one session with a Pixer frame.
///
/// A client is meant to be used for a single high-level operation:
/// `connect`, then one of `get_device_info` / `reset_device` /
/// `upload_image_data`, then `close`. Dropping the client releases any open
/// session, so early returns never leak a socket.
pub struct ProtocolClient {
    endpoint: DeviceEndpoint,
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    session: Option<Session>,
}

impl ProtocolClient {
    /// Client for `endpoint` over plain TCP with default timeouts
    pub fn new(endpoint: DeviceEndpoint) -> Self {
        Self::with_connector(endpoint, Arc::new(TcpConnector), ClientOptions::default())
    }

    pub fn with_connector(
        endpoint: DeviceEndpoint,
        connector: Arc<dyn Connector>,
        options: ClientOptions,
    ) -> Self {
        Self {
            endpoint,
            connector,
            options,
            session: None,
        }
    }

    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    /// True between a successful `connect` and `close` or a transport failure
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Establish a session, retrying up to `max_attempts` times with
    /// `retry_delay` between attempts
    pub async fn connect(&mut self, max_attempts: u32, retry_delay: Duration) -> Result<()> {
        self.close().await;

        let attempts = max_attempts.max(1);
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=attempts {
            match timeout(
                self.options.connect_timeout,
                self.connector.connect(&self.endpoint),
            )
            .await
            {
                Ok(Ok(stream)) => {
                    self.session = Some(Session {
                        stream,
                        io_timeout: self.options.read_timeout,
                    });
                    debug!("Connected to Pixer device at {}", self.endpoint);
                    return Ok(());
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => {
                    last_error = format!("timed out after {:?}", self.options.connect_timeout)
                }
            }

            debug!(
                "Connection attempt {}/{} to {} failed: {}",
                attempt, attempts, self.endpoint, last_error
            );
            if attempt < attempts {
                tokio::time::sleep(retry_delay).await;
            }
        }

        Err(ConnectionError::Unreachable {
            endpoint: self.endpoint.to_string(),
            attempts,
            last_error,
        }
        .into())
    }

    /// Send a command and wait for its answer.
    ///
    /// Returns `Ok(None)` when every one of the `timeout_retries` reads came
    /// back empty; transport failures are errors and end the session.
    pub async fn send_command(
        &mut self,
        command: &[u8],
        timeout_retries: u32,
    ) -> Result<Option<String>> {
        let label = String::from_utf8_lossy(command).into_owned();
        let session = self.session.as_mut().ok_or(ProtocolError::NotConnected)?;

        match exchange(session, command, timeout_retries, &label).await {
            Ok(Some(response)) => {
                debug!("Command: {}, Response: {}", label, response);
                Ok(Some(response))
            }
            Ok(None) => {
                warn!("No response received for command: {}", label);
                Ok(None)
            }
            Err(e) => {
                error!("Error sending command {}: {}", label, e);
                self.session = None;
                Err(ProtocolError::Io {
                    command: label,
                    message: e.to_string(),
                }
                .into())
            }
        }
    }

    /// Probe the device with `#TEST#`; healthy firmware answers `Hello PC!`
    pub async fn test_connection(&mut self) -> bool {
        match self
            .send_command(TEST_COMMAND, self.options.command_retries)
            .await
        {
            Ok(response) => response.as_deref() == Some(TEST_RESPONSE),
            Err(e) => {
                error!("Connection test failed: {}", e);
                false
            }
        }
    }

    /// Probe the device, then query battery level and firmware versions.
    ///
    /// A transport failure after the probe is recorded in `error` and the
    /// fields gathered so far are kept.
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo> {
        if !self.test_connection().await {
            return Err(ProtocolError::NotResponding.into());
        }

        let mut info = DeviceInfo {
            connected: true,
            ..Default::default()
        };

        if let Err(e) = self.query_info(&mut info).await {
            error!("Error getting device info: {}", e);
            info.error = Some(e.to_string());
        }

        Ok(info)
    }

    async fn query_info(&mut self, info: &mut DeviceInfo) -> Result<()> {
        let retries = self.options.command_retries;

        info.battery_level = self
            .send_command(BATTERY_LEVEL_COMMAND, retries)
            .await?
            .map(|raw| BatteryLevel::parse(&raw));
        info.ble_version = self.send_command(BLE_VERSION_COMMAND, retries).await?;
        info.ite_version = self.send_command(ITE_VERSION_COMMAND, retries).await?;
        info.mcu_version = self.send_command(MCU_VERSION_COMMAND, retries).await?;
        Ok(())
    }

    /// Probe the device and send `reset`.
    ///
    /// The device may drop the channel while rebooting, so no acknowledgement
    /// is read back.
    pub async fn reset_device(&mut self) -> Result<()> {
        if !self.test_connection().await {
            return Err(ProtocolError::NotResponding.into());
        }

        let session = self.session.as_mut().ok_or(ProtocolError::NotConnected)?;
        let io_timeout = session.io_timeout;
        if let Err(e) = write_fully(&mut session.stream, RESET_COMMAND, io_timeout).await {
            self.session = None;
            return Err(ProtocolError::Io {
                command: "reset".to_string(),
                message: e.to_string(),
            }
            .into());
        }

        debug!("Reset command sent to device");
        Ok(())
    }

    /// Stream `data` to the device in `chunk_size` pieces and terminate it
    /// with the upload sentinel.
    pub async fn upload_image_data(
        &mut self,
        data: &[u8],
        chunk_size: usize,
    ) -> Result<UploadReport> {
        let total_bytes = data.len();
        let upload_timeout = self.options.upload_timeout;
        let session = self.session.as_mut().ok_or(ProtocolError::NotConnected)?;
        session.io_timeout = upload_timeout;

        let mut bytes_sent = 0usize;
        let mut logged_decile = 0usize;

        for chunk in data.chunks(chunk_size.max(1)) {
            if let Err(e) =
                write_counted(&mut session.stream, chunk, upload_timeout, &mut bytes_sent).await
            {
                return Err(self.abort_transfer(bytes_sent, total_bytes, e));
            }

            let decile = bytes_sent * 10 / total_bytes;
            if decile > logged_decile {
                logged_decile = decile;
                debug!("Upload progress: {}%", decile * 10);
            }
        }

        if let Err(e) = write_fully(&mut session.stream, UPLOAD_SENTINEL, upload_timeout).await {
            return Err(self.abort_transfer(bytes_sent, total_bytes, e));
        }

        debug!("Successfully uploaded {} bytes", total_bytes);
        Ok(UploadReport {
            bytes_sent,
            total_bytes,
        })
    }

    fn abort_transfer(
        &mut self,
        bytes_sent: usize,
        total_bytes: usize,
        cause: std::io::Error,
    ) -> crate::errors::PixerError {
        error!(
            "Error uploading image data after {}/{} bytes: {}",
            bytes_sent, total_bytes, cause
        );
        self.session = None;
        TransferError {
            bytes_sent,
            total_bytes,
            message: cause.to_string(),
        }
        .into()
    }

    /// Close the session. Safe to call any number of times.
    pub async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.stream.shutdown().await {
                debug!("Error closing socket: {}", e);
            }
            debug!("Connection to {} closed", self.endpoint);
        }
    }
}

impl Drop for ProtocolClient {
    fn drop(&mut self) {
        if self.session.take().is_some() {
            debug!("Releasing unclosed session to {}", self.endpoint);
        }
    }
}

async fn exchange(
    session: &mut Session,
    command: &[u8],
    timeout_retries: u32,
    label: &str,
) -> std::io::Result<Option<String>> {
    write_fully(&mut session.stream, command, session.io_timeout).await?;

    let mut buf = [0u8; RESPONSE_BUFFER_SIZE];
    for retry in 1..=timeout_retries {
        match timeout(session.io_timeout, session.stream.read(&mut buf)).await {
            Ok(Ok(0)) => debug!(
                "Empty read for {} on retry {}/{}",
                label, retry, timeout_retries
            ),
            Ok(Ok(n)) => {
                let response = String::from_utf8_lossy(&buf[..n]).trim().to_string();
                if !response.is_empty() {
                    return Ok(Some(response));
                }
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => debug!("Timeout on retry {}/{}", retry, timeout_retries),
        }
    }
    Ok(None)
}

async fn write_fully(
    stream: &mut BoxedStream,
    bytes: &[u8],
    io_timeout: Duration,
) -> std::io::Result<()> {
    let mut written = 0;
    write_counted(stream, bytes, io_timeout, &mut written).await
}

/// Write all of `bytes`, adding every accepted byte to `counter`, then flush
async fn write_counted(
    stream: &mut BoxedStream,
    bytes: &[u8],
    io_timeout: Duration,
    counter: &mut usize,
) -> std::io::Result<()> {
    let mut offset = 0;
    while offset < bytes.len() {
        let n = timeout(io_timeout, stream.write(&bytes[offset..]))
            .await
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "write timed out"))??;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "device stopped accepting data",
            ));
        }
        offset += n;
        *counter += n;
    }
    timeout(io_timeout, stream.flush())
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "flush timed out"))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

    /// Hands out one end of an in-memory pipe
    struct PipeConnector {
        stream: Mutex<Option<DuplexStream>>,
    }

    #[async_trait]
    impl Connector for PipeConnector {
        async fn connect(&self, _endpoint: &DeviceEndpoint) -> std::io::Result<BoxedStream> {
            let stream = self.stream.lock().unwrap().take();
            stream
                .map(|s| Box::new(s) as BoxedStream)
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "used"))
        }
    }

    fn fast_options() -> ClientOptions {
        ClientOptions {
            connect_timeout: Duration::from_millis(200),
            read_timeout: Duration::from_millis(50),
            upload_timeout: Duration::from_millis(500),
            command_retries: 2,
        }
    }

    async fn connected_pair() -> (ProtocolClient, DuplexStream) {
        let (client_end, device_end) = duplex(64 * 1024);
        let connector = Arc::new(PipeConnector {
            stream: Mutex::new(Some(client_end)),
        });
        let mut client =
            ProtocolClient::with_connector(DeviceEndpoint::default(), connector, fast_options());
        client
            .connect(1, Duration::from_millis(1))
            .await
            .expect("pipe connect");
        (client, device_end)
    }

    #[tokio::test]
    async fn test_send_command_without_session_fails() {
        let mut client = ProtocolClient::new(DeviceEndpoint::default());
        let result = client.send_command(TEST_COMMAND, 1).await;
        assert!(matches!(
            result,
            Err(crate::errors::PixerError::Protocol(ProtocolError::NotConnected))
        ));
    }

    #[tokio::test]
    async fn test_silent_device_yields_no_response() {
        let (mut client, mut device) = connected_pair().await;

        let response = client
            .send_command(b"bleVersion", 2)
            .await
            .expect("no error");
        assert_eq!(response, None);
        assert!(client.is_connected());

        let mut buf = [0u8; 16];
        let n = device.read(&mut buf).await.expect("read command");
        assert_eq!(&buf[..n], b"bleVersion");
    }

    #[tokio::test]
    async fn test_response_is_trimmed() {
        let (mut client, mut device) = connected_pair().await;
        device
            .write_all(b"  42\r\n")
            .await
            .expect("preload response");

        let response = client.send_command(b"batteryLevel", 2).await.expect("ok");
        assert_eq!(response.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_wrong_greeting_fails_probe() {
        let (mut client, mut device) = connected_pair().await;
        device
            .write_all(b"Hello Mac!")
            .await
            .expect("preload response");

        assert!(!client.test_connection().await);
        let info = client.get_device_info().await;
        assert!(matches!(
            info,
            Err(crate::errors::PixerError::Protocol(ProtocolError::NotResponding))
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut client, _device) = connected_pair().await;
        assert!(client.is_connected());
        client.close().await;
        client.close().await;
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_upload_appends_sentinel() {
        let (mut client, mut device) = connected_pair().await;
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let report = client.upload_image_data(&data, 4096).await.expect("upload");
        assert_eq!(report.bytes_sent, data.len());
        client.close().await;

        let mut received = Vec::new();
        device.read_to_end(&mut received).await.expect("drain pipe");
        assert_eq!(received.len(), data.len() + UPLOAD_SENTINEL.len());
        assert!(received.ends_with(UPLOAD_SENTINEL));
        assert_eq!(&received[..data.len()], &data[..]);
    }
}
