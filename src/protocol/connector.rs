//! Transport seam between the protocol client and the network

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::models::DeviceEndpoint;

/// Byte stream carrying one device session
pub trait DeviceStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> DeviceStream for T {}

pub type BoxedStream = Box<dyn DeviceStream>;

/// Opens transport streams to a device endpoint
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &DeviceEndpoint) -> std::io::Result<BoxedStream>;
}

/// Plain TCP transport used against real hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoint: &DeviceEndpoint) -> std::io::Result<BoxedStream> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        // Commands are tiny and latency bound
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}
