// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! MCP stdio framing.
//!
//! One JSON-RPC message per line. The decoder yields the raw bytes of each
//! line with its terminator stripped and leaves text decoding to the caller,
//! so a line that is not valid UTF-8 reaches the JSON parser unaltered. The
//! encoder writes one compact JSON document followed by a single `\n`.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::constants::limits;
use crate::errors::ProbeError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest};

pub struct LineCodec {
    // Bytes already scanned for '\n' in the current buffer
    scanned: usize,
    max_line: usize,
}

impl LineCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line(limits::MAX_LINE_BYTES)
    }

    #[must_use]
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            scanned: 0,
            max_line,
        }
    }

    fn take_line(&mut self, src: &mut BytesMut, end: usize) -> Bytes {
        let mut line = src.split_to(end);
        self.scanned = 0;
        while matches!(line.last().copied(), Some(b'\n' | b'\r')) {
            line.truncate(line.len() - 1);
        }
        line.freeze()
    }

    fn encode_json<T: Serialize>(item: &T, dst: &mut BytesMut) -> Result<(), ProbeError> {
        let body = serde_json::to_vec(item)?;
        dst.reserve(body.len() + 1);
        dst.extend_from_slice(&body);
        dst.put_u8(b'\n');
        Ok(())
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = Bytes;
    type Error = ProbeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        trace!("Decoder attempting to read from {} bytes buffer", src.len());
        let start = self.scanned.min(src.len());
        if let Some(offset) = src[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset + 1;
            return Ok(Some(self.take_line(src, end)));
        }

        if src.len() > self.max_line {
            return Err(ProbeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("response line exceeds {} bytes", self.max_line),
            )));
        }
        self.scanned = src.len();
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            // Unterminated trailing output still counts as a line
            None if !src.is_empty() => {
                let end = src.len();
                Ok(Some(self.take_line(src, end)))
            }
            None => Ok(None),
        }
    }
}

impl<'a> Encoder<&'a JsonRpcRequest> for LineCodec {
    type Error = ProbeError;
    fn encode(&mut self, item: &'a JsonRpcRequest, dst: &mut BytesMut) -> Result<(), ProbeError> {
        Self::encode_json(item, dst)
    }
}

impl<'a> Encoder<&'a JsonRpcNotification> for LineCodec {
    type Error = ProbeError;
    fn encode(
        &mut self,
        item: &'a JsonRpcNotification,
        dst: &mut BytesMut,
    ) -> Result<(), ProbeError> {
        Self::encode_json(item, dst)
    }
}
