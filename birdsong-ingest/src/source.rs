use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

use crate::error::{IngestError, Result};
use crate::filter::StreamFilter;

/// Longest line accepted from upstream before the stream is treated as broken
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Lines read from an open upstream stream, in arrival order
pub type LineStream = BoxStream<'static, Result<String>>;

/// Something that can open a filtered status stream
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn open(&self, filter: &StreamFilter) -> Result<LineStream>;
}

/// Split a chunked byte stream into lines
///
/// Chunks are not aligned with lines; a status may arrive split across
/// several chunks. CRLF and LF terminators are both accepted.
pub fn lines_from_bytes<S, E>(chunks: S) -> LineStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let reader = StreamReader::new(chunks.map_err(std::io::Error::other));
    FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
        .map_err(IngestError::from)
        .boxed()
}
