use std::{
    io::{ErrorKind, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, info};

use super::Transport;

use crate::Error;

/// Accept loop polling period
const ACCEPT_PERIOD: Duration = Duration::from_millis(50);

/// [TcpBroadcast] listens on a local port and sends
/// every write to all connected clients.
/// With no client connected, data is silently dropped.
/// Client sockets never block the writer: a client whose
/// send buffer cannot take a whole write is disconnected.
#[derive(Debug)]
pub struct TcpBroadcast {
    local_addr: SocketAddr,
    clients: Arc<Mutex<Vec<TcpStream>>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TcpBroadcast {
    /// Binds `0.0.0.0:port` and starts accepting clients in the background.
    /// Port 0 picks any available port, see [Self::local_addr].
    pub fn bind(port: u16) -> Result<Self, Error> {
        let listener =
            TcpListener::bind(("0.0.0.0", port)).map_err(|e| Error::TcpBind(port, e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| Error::TcpBind(port, e))?;
        let local_addr = listener.local_addr().map_err(|e| Error::TcpBind(port, e))?;

        let clients = Arc::new(Mutex::new(Vec::<TcpStream>::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = {
            let clients = Arc::clone(&clients);
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || accept_loop(listener, clients, shutdown))
        };

        info!("tcp server listening on {}", local_addr);

        Ok(Self {
            local_addr,
            clients,
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connected clients
    pub fn clients(&self) -> usize {
        self.clients.lock().map(|clients| clients.len()).unwrap_or(0)
    }
}

fn accept_loop(listener: TcpListener, clients: Arc<Mutex<Vec<TcpStream>>>, shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let setup = stream
                    .set_nonblocking(true)
                    .and_then(|_| stream.set_nodelay(true));
                if let Err(e) = setup {
                    error!("{}: {}", peer, e);
                    continue;
                }
                info!("{} connected", peer);
                if let Ok(mut clients) = clients.lock() {
                    clients.push(stream);
                }
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_PERIOD);
            },
            Err(e) => {
                error!("accept error: {}", e);
                thread::sleep(ACCEPT_PERIOD);
            },
        }
    }
}

/// Single nonblocking write of `bytes`.
/// A short write would corrupt the client's frame stream, so it is an error.
fn send(client: &mut TcpStream, bytes: &[u8]) -> std::io::Result<()> {
    loop {
        match client.write(bytes) {
            Ok(n) if n == bytes.len() => return Ok(()),
            Ok(n) => {
                return Err(std::io::Error::new(
                    ErrorKind::WriteZero,
                    format!("short write ({}/{} bytes)", n, bytes.len()),
                ))
            },
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

impl Transport for TcpBroadcast {
    fn write(&mut self, bytes: &[u8]) -> usize {
        if self.handle.is_none() {
            return 0;
        }
        let mut clients = match self.clients.lock() {
            Ok(clients) => clients,
            Err(_) => return 0,
        };
        clients.retain_mut(|client| match send(client, bytes) {
            Ok(_) => true,
            Err(e) => {
                let peer = client
                    .peer_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_default();
                info!("{} disconnected: {}", peer, e);
                false
            },
        });
        bytes.len()
    }

    fn close(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("tcp server thread panicked");
            }
            if let Ok(mut clients) = self.clients.lock() {
                clients.clear();
            }
            debug!("tcp server {} closed", self.local_addr);
        }
    }
}

impl Drop for TcpBroadcast {
    fn drop(&mut self) {
        self.close();
    }
}
