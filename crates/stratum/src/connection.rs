use {
    crate::{Error, Result, MAX_MESSAGE_SIZE},
    snafu::ResultExt,
    std::{net::SocketAddr, time::Duration},
    tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::{
            tcp::{OwnedReadHalf, OwnedWriteHalf},
            TcpSocket, TcpStream,
        },
        time::timeout,
    },
};

use crate::error::IoSnafu;

/// Outcome of one [`ReadHalf::read_line`] poll: a complete line, an idle
/// timeout with nothing to report, or a clean peer disconnect. The idle
/// case exists so the receive loop never blocks forever and can notice a
/// stalled upstream and hand control back to the reconnect loop.
#[derive(Debug, PartialEq, Eq)]
pub enum LineEvent {
    Line(String),
    Idle,
    Closed,
}

/// A thin owned TCP connection to an upstream or downstream Stratum peer.
/// Carries no protocol state of its own; session bookkeeping (subscribe
/// fallback, capability flags, correlation of request ids) lives one layer
/// up, so the socket can be split and handed to independent receive/send
/// tasks, each with sole ownership of its half.
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    pub async fn connect(addr: SocketAddr, connect_timeout: Duration) -> Result<Self> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .context(IoSnafu)?;

        socket.set_keepalive(true).context(IoSnafu)?;

        let stream = timeout(connect_timeout, socket.connect(addr))
            .await
            .map_err(|_| Error::Timeout {
                elapsed: connect_timeout,
            })?
            .context(IoSnafu)?;

        Ok(Self::from_stream(stream))
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Splits into independently owned halves so the receive and send
    /// loops can run as separate tasks without sharing a lock over the
    /// socket itself.
    pub fn split(self) -> (ReadHalf, WriteHalf) {
        (
            ReadHalf {
                reader: self.reader,
            },
            WriteHalf {
                writer: self.writer,
            },
        )
    }

    pub async fn read_line(&mut self, idle_timeout: Duration) -> Result<LineEvent> {
        read_line(&mut self.reader, idle_timeout).await
    }

    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        write_line(&mut self.writer, line).await
    }
}

pub struct ReadHalf {
    reader: BufReader<OwnedReadHalf>,
}

impl ReadHalf {
    pub async fn read_line(&mut self, idle_timeout: Duration) -> Result<LineEvent> {
        read_line(&mut self.reader, idle_timeout).await
    }
}

pub struct WriteHalf {
    writer: OwnedWriteHalf,
}

impl WriteHalf {
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        write_line(&mut self.writer, line).await
    }
}

async fn read_line(
    reader: &mut BufReader<OwnedReadHalf>,
    idle_timeout: Duration,
) -> Result<LineEvent> {
    let mut buf = String::new();

    let read = match timeout(idle_timeout, reader.read_line(&mut buf)).await {
        Err(_) => return Ok(LineEvent::Idle),
        Ok(result) => result.context(IoSnafu)?,
    };

    if read == 0 {
        return Ok(LineEvent::Closed);
    }

    if buf.len() > MAX_MESSAGE_SIZE {
        return Err(Error::Malformed {
            reason: format!("line exceeds {MAX_MESSAGE_SIZE} byte limit"),
        });
    }

    Ok(LineEvent::Line(buf))
}

async fn write_line(writer: &mut OwnedWriteHalf, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes()).await.context(IoSnafu)?;
    if !line.ends_with('\n') {
        writer.write_all(b"\n").await.context(IoSnafu)?;
    }
    writer.flush().await.context(IoSnafu)?;
    Ok(())
}
