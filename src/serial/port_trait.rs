//! Trait abstraction for the sensor's byte stream to enable testing

use async_trait::async_trait;
use std::io;
use tokio_serial::SerialPort;

/// Duplex byte stream to one sensor
#[async_trait]
pub trait SensorTransport: Send {
    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;

    /// Bytes that can be read right now without waiting
    fn bytes_available(&self) -> io::Result<usize>;

    /// Read whatever has arrived, waiting until at least one byte has.
    /// May return fewer bytes than `buf` holds.
    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

#[async_trait]
impl<T: SensorTransport + ?Sized> SensorTransport for Box<T> {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        (**self).flush().await
    }

    fn bytes_available(&self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_chunk(buf).await
    }
}

/// Wrapper around tokio_serial::SerialStream that implements SensorTransport
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

impl std::fmt::Debug for TokioSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioSerialPort")
            .field("name", &self.port.name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SensorTransport for TokioSerialPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.flush().await
    }

    fn bytes_available(&self) -> io::Result<usize> {
        self.port
            .bytes_to_read()
            .map(|count| count as usize)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    async fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        use tokio::io::AsyncReadExt;
        self.port.read(buf).await
    }
}
