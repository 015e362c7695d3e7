//! Incremental decoding of a response body into UTF-8 text fragments.
//!
//! Chunks arrive with arbitrary boundaries, so a multi-byte character may be
//! split across two (or more) reads. [`Utf8Decoder`] holds the incomplete tail
//! until the rest arrives. [`decode_text`] drives it over a byte stream and
//! yields fragments lazily, in arrival order.

use crate::error::{ClientError, DecodeError};
use async_stream::try_stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::trace;

/// Stateful UTF-8 decoder. Invalid sequences are fatal; only a truncated
/// trailing sequence is carried over to the next call.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
    consumed: u64,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `pending + chunk` as forms complete characters.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let valid = match std::str::from_utf8(&bytes) {
            Ok(_) => bytes.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => {
                return Err(DecodeError::InvalidSequence {
                    offset: self.consumed + err.valid_up_to() as u64,
                });
            }
        };

        self.pending = bytes.split_off(valid);
        let offset = self.consumed;
        self.consumed += valid as u64;

        String::from_utf8(bytes).map_err(|err| DecodeError::InvalidSequence {
            offset: offset + err.utf8_error().valid_up_to() as u64,
        })
    }

    /// Ends decoding. Bytes still pending here can never form a character.
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::Truncated {
                pending: self.pending.len(),
            })
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Exclusive handle on a response body. The body is dropped exactly once,
/// whichever way consumption ends.
pub(crate) struct BodyReader<S> {
    body: Option<S>,
}

impl<S, E> BodyReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    pub(crate) fn new(body: S) -> Self {
        Self { body: Some(body) }
    }

    /// Next chunk, or `None` once the body is exhausted (the body is released
    /// at that point).
    pub(crate) async fn read(&mut self) -> Result<Option<Bytes>, E> {
        let Some(body) = self.body.as_mut() else {
            return Ok(None);
        };

        match body.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(err)) => {
                self.release();
                Err(err)
            }
            None => {
                self.release();
                Ok(None)
            }
        }
    }

    pub(crate) fn release(&mut self) {
        if self.body.take().is_some() {
            trace!("response body released");
        }
    }
}

// Releases the body even if the consumer stops early.
impl<S> Drop for BodyReader<S> {
    fn drop(&mut self) {
        if self.body.take().is_some() {
            trace!("response body released on drop");
        }
    }
}

/// Lazily decodes `body` into text fragments.
///
/// Empty fragments are never yielded, so an empty body yields nothing. The
/// stream consumes `body` once and is not restartable. Read failures and
/// decode failures end the stream with that error.
pub fn decode_text<S, E>(body: S) -> impl Stream<Item = Result<String, ClientError>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    ClientError: From<E>,
{
    try_stream! {
        let mut reader = BodyReader::new(body);
        let mut decoder = Utf8Decoder::new();

        while let Some(chunk) = reader.read().await? {
            let decoded = decoder.decode(&chunk);
            if decoded.is_err() {
                reader.release();
            }
            let text = decoded?;
            trace!(bytes = chunk.len(), text_len = text.len(), "decoded chunk");
            if !text.is_empty() {
                yield text;
            }
        }

        // `read` released the body when it reported the end.
        decoder.finish()?;
    }
}
