use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::{ErrorKind, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::channel::{ColorChannel, ColorRequest};
use crate::config::ListenConfig;
use crate::transport::Transport;

const RECV_BUFFER_SIZE: usize = 4096;
/// Longest line accepted before the client is considered broken
const MAX_LINE_LEN: usize = 1024;
const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Run-loop that feeds newline-delimited JSON color messages into a
/// [`ColorChannel`]
pub struct ColorServer<T: Transport> {
    listen: ListenConfig,
    channel: ColorChannel<T>,
    running: Arc<AtomicBool>,
    stats: Option<Stats>,
}

struct Stats {
    since: Instant,
    received: u64,
    rejected: u64,
    written: u64,
}

/// Clear `running` on SIGINT, SIGTERM or SIGHUP so the run-loop can blank the strip
pub fn install_signal_handler(running: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        info!("Shutting down...");
        running.store(false, Ordering::Relaxed);
    })
    .context("Could not set signal handler")
}

impl<T: Transport> ColorServer<T> {
    /// Create a server; `stats` enables a periodic rate report
    pub fn new(listen: ListenConfig, channel: ColorChannel<T>, stats: bool) -> Self {
        ColorServer {
            listen,
            channel,
            running: Arc::new(AtomicBool::new(true)),
            stats: stats.then(|| Stats {
                since: Instant::now(),
                received: 0,
                rejected: 0,
                written: 0,
            }),
        }
    }

    /// Get a clone of the running flag for signal handlers
    pub fn get_running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn channel(&self) -> &ColorChannel<T> {
        &self.channel
    }

    pub fn bind(&self) -> Result<TcpListener> {
        let addr = format!("{}:{}", self.listen.host, self.listen.port);
        let listener = TcpListener::bind(&addr).context(format!("Failed to bind to {}", addr))?;
        info!("Listening for color messages on {}", addr);
        Ok(listener)
    }

    /// Bind and serve until the running flag is cleared
    pub fn run(&mut self) -> Result<()> {
        let listener = self.bind()?;
        self.serve(listener)
    }

    pub fn serve(&mut self, listener: TcpListener) -> Result<()> {
        // Non-blocking so accept() can check the running flag periodically
        listener.set_nonblocking(true)?;

        while self.running.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, peer_addr)) => {
                    info!("Client connected from {}", peer_addr);

                    if let Err(e) = self.handle_client(stream) {
                        warn!("Error handling client {}: {}", peer_addr, e);
                    }

                    info!("Client {} disconnected", peer_addr);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    self.tick();
                    thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                    thread::sleep(Duration::from_millis(100));
                }
            }
        }

        Ok(())
    }

    /// Blank the strip; the driver rejects everything afterwards
    pub fn shutdown(&mut self) {
        info!("Turning off LEDs...");
        self.channel.driver_mut().close();
    }

    /// Decode one message line and pass it on. Bad lines are logged and skipped.
    pub fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<ColorRequest>(line) {
            Ok(request) => {
                // failures are logged by the channel
                let _ = self.channel.receive(request);
            }
            Err(e) => warn!("Ignoring malformed color message {:?}: {}", line, e),
        }
    }

    fn handle_client(&mut self, mut stream: TcpStream) -> Result<()> {
        stream
            .set_nonblocking(true)
            .context("Failed to set socket to non-blocking mode")?;

        let mut buffer = Vec::new();
        let mut read_buf = vec![0u8; RECV_BUFFER_SIZE];

        while self.running.load(Ordering::Relaxed) {
            // Drain everything available right now, handling lines as they complete
            loop {
                match stream.read(&mut read_buf) {
                    Ok(0) => {
                        self.drain_lines(&mut buffer);
                        return Ok(());
                    }
                    Ok(n) => {
                        buffer.extend_from_slice(&read_buf[..n]);
                        self.drain_lines(&mut buffer);
                        if buffer.len() > MAX_LINE_LEN {
                            anyhow::bail!("Line exceeds {} bytes without a newline", MAX_LINE_LEN);
                        }
                        if !self.running.load(Ordering::Relaxed) {
                            return Ok(());
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            self.tick();
            thread::sleep(Duration::from_millis(1));
        }

        Ok(())
    }

    /// Process every complete line in `buffer`, leaving any partial tail
    fn drain_lines(&mut self, buffer: &mut Vec<u8>) {
        while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=pos).collect();
            match std::str::from_utf8(&line) {
                Ok(text) => self.handle_line(text),
                Err(e) => warn!("Ignoring non UTF-8 message: {}", e),
            }
        }
    }

    /// Housekeeping between messages: coalesced frames and statistics
    fn tick(&mut self) {
        if let Err(e) = self.channel.driver_mut().service() {
            debug!("Deferred frame not written: {}", e);
        }
        self.report_stats();
    }

    fn report_stats(&mut self) {
        let Some(stats) = self.stats.as_mut() else {
            return;
        };
        let elapsed = stats.since.elapsed();
        if elapsed < STATS_INTERVAL {
            return;
        }

        let received = self.channel.updates_received();
        let rejected = self.channel.updates_rejected();
        let written = self.channel.driver().frames_written();
        let secs = elapsed.as_secs_f64();

        info!(
            "[Stats] Received: {:.1}/s, rejected: {}, written: {:.1} fps",
            (received - stats.received) as f64 / secs,
            rejected - stats.rejected,
            (written - stats.written) as f64 / secs
        );

        stats.since = Instant::now();
        stats.received = received;
        stats.rejected = rejected;
        stats.written = written;
    }
}
