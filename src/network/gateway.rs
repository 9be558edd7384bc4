//! Line-delimited JSON gateway.
//!
//! Reads one [`GatewayEvent`] per line from any async reader and forwards it
//! into the bot's event channel. Outbound frames are written back one JSON
//! object per line.

use super::local::OutboundFrame;
use super::transport::GatewayEvent;
use bytes::BytesMut;
use futures_util::StreamExt;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::{debug, info, warn};

/// Longest accepted event line. Invocation payloads are small.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// One frame read from the gateway input.
#[derive(Debug, PartialEq, Eq)]
pub enum RawLine {
    /// A complete line without its terminator.
    Line(BytesMut),
    /// A line longer than the limit. Its bytes were discarded.
    Overlong(usize),
}

/// Newline-delimited byte codec that survives bad input.
///
/// Lines are returned as raw bytes so that encoding problems surface as a
/// parse failure of that one line. An overlong line is dropped while it is
/// being read and reported once its terminator arrives.
pub struct EventLineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
    /// Bytes dropped so far from the current overlong line.
    discarded: Option<usize>,
}

impl EventLineCodec {
    pub fn new(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarded: None,
        }
    }

    fn finish_line(&mut self, mut line: BytesMut) -> RawLine {
        if let Some(dropped) = self.discarded.take() {
            return RawLine::Overlong(dropped + line.len());
        }
        if line.last() == Some(&b'\n') {
            line.truncate(line.len() - 1);
        }
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if line.len() > self.max_len {
            return RawLine::Overlong(line.len());
        }
        RawLine::Line(line)
    }
}

impl Default for EventLineCodec {
    fn default() -> Self {
        Self::new(MAX_LINE_LENGTH)
    }
}

impl Decoder for EventLineCodec {
    type Item = RawLine;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RawLine>, io::Error> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;
            return Ok(Some(self.finish_line(line)));
        }

        if src.len() > self.max_len {
            *self.discarded.get_or_insert(0) += src.len();
            src.clear();
            self.next_index = 0;
        } else {
            self.next_index = src.len();
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<RawLine>, io::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        self.next_index = 0;
        if src.is_empty() {
            return Ok(self.discarded.take().map(RawLine::Overlong));
        }
        let rest = src.split();
        Ok(Some(self.finish_line(rest)))
    }
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_event(line: &[u8]) -> Result<Option<GatewayEvent>, serde_json::Error> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(line).map(Some)
}

/// Spawn a task reading events from `reader` into `events`.
///
/// Malformed, non-UTF-8 and overlong lines are logged and skipped. The task
/// ends at end of input, on a read error, or when the receiving side is
/// dropped.
pub fn spawn_reader<R>(reader: R, events: mpsc::Sender<GatewayEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = FramedRead::new(reader, EventLineCodec::default());
        let mut line_no = 0usize;

        while let Some(next) = lines.next().await {
            line_no += 1;
            let line = match next {
                Ok(RawLine::Line(line)) => line,
                Ok(RawLine::Overlong(len)) => {
                    warn!(line = line_no, len, limit = MAX_LINE_LENGTH, "Skipping overlong gateway line");
                    continue;
                }
                Err(e) => {
                    warn!(line = line_no, error = %e, "Gateway read failed");
                    break;
                }
            };

            match parse_event(&line) {
                Ok(Some(event)) => {
                    if events.send(event).await.is_err() {
                        debug!("Event receiver dropped, stopping gateway reader");
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(line = line_no, error = %e, "Skipping malformed gateway event"),
            }
        }

        info!(lines = line_no, "Gateway input closed");
    })
}

/// Spawn a task writing frames from `frames` to `writer` as JSON lines.
pub fn spawn_writer<W>(mut writer: W, mut frames: mpsc::UnboundedReceiver<OutboundFrame>) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            let mut line = match serde_json::to_string(&frame) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to encode outbound frame");
                    continue;
                }
            };
            line.push('\n');
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                warn!(error = %e, "Gateway write failed");
                break;
            }
            let _ = writer.flush().await;
        }
    })
}
