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

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Server stderr captured in the background.
///
/// The pipe is drained from spawn onwards so a chatty server never blocks on
/// a full pipe; `collect` returns whatever has arrived without waiting for EOF.
pub struct StderrCapture {
    rx: mpsc::UnboundedReceiver<String>,
}

impl StderrCapture {
    /// Spawns a background task to drain the server's stderr line by line.
    pub fn spawn<R>(stream: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stream);
            let mut line = Vec::new();

            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line).await {
                    Ok(0) => break, // Pipe closed
                    Ok(_) => {
                        let text = String::from_utf8_lossy(&line).into_owned();
                        trace!("server stderr: {}", text.trim_end());
                        // Keep the pipe open even once nobody is collecting
                        let _ = tx.send(text);
                    }
                    Err(e) => {
                        warn!("stderr drain stopped: {}", e);
                        break;
                    }
                }
            }
        });
        Self { rx }
    }

    /// Everything captured so far, concatenated in arrival order.
    pub fn collect(&mut self) -> String {
        let mut out = String::new();
        while let Ok(chunk) = self.rx.try_recv() {
            out.push_str(&chunk);
        }
        out
    }
}
