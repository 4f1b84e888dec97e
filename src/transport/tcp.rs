use crate::prelude::*;
use crate::transport::{PromptDecoder, Transport};

use {
    async_trait::async_trait,
    bytes::BytesMut,
    net2::TcpStreamExt,
    tokio::io::{AsyncReadExt, AsyncWriteExt},
    tokio::net::TcpStream,
    tokio_util::codec::Decoder,
};

/// Line protocol over a plain TCP session.
pub struct TcpTransport {
    device: config::Device,
    stream: Option<TcpStream>,
    buf: BytesMut,
    decoder: PromptDecoder,
    timeout: Duration,
}

impl TcpTransport {
    pub fn new(device: config::Device) -> Self {
        let decoder = PromptDecoder::new(device.prompt());
        let timeout = device.monitoring_timeout();
        Self {
            device,
            stream: None,
            buf: BytesMut::with_capacity(4096),
            decoder,
            timeout,
        }
    }

    async fn read_reply(&mut self) -> Result<String, TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Disconnected)?;

        loop {
            if let Some(reply) = self.decoder.decode(&mut self.buf)? {
                return Ok(reply);
            }
            if stream.read_buf(&mut self.buf).await? == 0 {
                return Err(TransportError::Disconnected);
            }
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Disconnected)?;
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    fn check_banners(&self, reply: String) -> Result<String, TransportError> {
        if let Some(banner) = self
            .device
            .login_error_banners()
            .iter()
            .find(|b| reply.contains(b.as_str()))
        {
            return Err(TransportError::Auth(banner.clone()));
        }
        if self
            .device
            .error_banners()
            .iter()
            .any(|b| reply.contains(b.as_str()))
        {
            return Err(TransportError::ErrorBanner(reply));
        }
        Ok(reply)
    }

    fn drop_stream(&mut self) {
        if self.stream.take().is_some() {
            warn!("{}:{} session dropped", self.device.host(), self.device.port());
        }
        self.buf.clear();
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        self.drop_stream();

        let connect_timeout = self.device.connect_timeout();
        info!(
            "connecting to {}:{}",
            self.device.host(),
            self.device.port()
        );

        let stream = match tokio::time::timeout(
            connect_timeout,
            TcpStream::connect((self.device.host(), self.device.port())),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(TransportError::Timeout(connect_timeout)),
        };

        let std_stream = stream.into_std()?;
        if let Err(e) = std_stream.set_keepalive(Some(self.device.tcp_keepalive())) {
            warn!("Failed to set TCP keepalive: {}", e);
        }
        let stream = TcpStream::from_std(std_stream)?;

        if self.device.use_tcp_nodelay() {
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY: {}", e);
            }
        }

        self.stream = Some(stream);

        // the device greets with a banner that ends in its prompt
        let timeout = self.timeout;
        let banner = match tokio::time::timeout(timeout, self.read_reply()).await {
            Ok(Ok(banner)) => banner,
            Ok(Err(e)) => {
                self.drop_stream();
                return Err(e);
            }
            Err(_) => {
                self.drop_stream();
                return Err(TransportError::Timeout(timeout));
            }
        };
        if let Err(e) = self.check_banners(banner) {
            self.drop_stream();
            return Err(e);
        }

        info!("connected to {}:{}", self.device.host(), self.device.port());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, command: &str) -> Result<String, TransportError> {
        let line = if command.ends_with('\r') {
            command.to_string()
        } else {
            format!("{}\r", command)
        };

        let timeout = self.timeout;
        let result = tokio::time::timeout(timeout, async {
            self.write_line(&line).await?;
            self.read_reply().await
        })
        .await;

        match result {
            Ok(Ok(reply)) => self.check_banners(reply),
            Ok(Err(e)) => {
                if e.is_fatal() {
                    self.drop_stream();
                }
                Err(e)
            }
            Err(_) => {
                self.drop_stream();
                Err(TransportError::Timeout(timeout))
            }
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("shutdown of {}:{} failed: {}", self.device.host(), self.device.port(), e);
            }
            info!("disconnected from {}:{}", self.device.host(), self.device.port());
        }
        self.buf.clear();
    }
}
