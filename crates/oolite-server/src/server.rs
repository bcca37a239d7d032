//! Listener and per-connection thread management.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{error, info, warn};

use oolite_replica::ReplicaNode;
use oolite_types::NodeAddress;

use crate::connection;
use crate::error::ServerError;
use crate::handler::Handler;

/// A bound but not yet serving listener.
pub struct Server {
    listener: TcpListener,
    handler: Arc<Handler>,
    local: NodeAddress,
}

impl Server {
    /// Binds the listener. Pass port 0 to let the OS pick one; the chosen
    /// port is visible through [`Server::address`].
    pub fn bind(node: Arc<ReplicaNode>, bind: &NodeAddress) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(bind.to_string())?;
        Self::from_listener(node, listener)
    }

    /// Wraps an already-bound listener. Lets a harness reserve ports before
    /// it constructs the nodes that will serve on them.
    pub fn from_listener(
        node: Arc<ReplicaNode>,
        listener: TcpListener,
    ) -> Result<Self, ServerError> {
        let local_addr = listener.local_addr()?;
        let local = NodeAddress::new(local_addr.ip().to_string(), local_addr.port());
        info!(node = %node.id(), address = %local, "listening");
        Ok(Self {
            listener,
            handler: Arc::new(Handler::new(node)),
            local,
        })
    }

    /// The bound address, with any OS-assigned port resolved.
    pub fn address(&self) -> &NodeAddress {
        &self.local
    }

    /// Serves connections on the calling thread until the process exits.
    pub fn run(self) -> Result<(), ServerError> {
        self.accept_loop(&AtomicBool::new(false));
        Ok(())
    }

    /// Serves connections on a background thread. The returned handle stops
    /// the accept loop on [`ServerHandle::shutdown`] or drop.
    pub fn spawn(self) -> ServerHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let address = self.local.clone();
        let loop_shutdown = Arc::clone(&shutdown);
        let thread = thread::spawn(move || self.accept_loop(&loop_shutdown));
        ServerHandle {
            address,
            shutdown,
            thread: Some(thread),
        }
    }

    fn accept_loop(self, shutdown: &AtomicBool) {
        for incoming in self.listener.incoming() {
            if shutdown.load(Ordering::SeqCst) {
                break;
            }
            match incoming {
                Ok(stream) => {
                    let handler = Arc::clone(&self.handler);
                    thread::spawn(move || {
                        if let Err(error) = connection::serve(stream, &handler) {
                            warn!(%error, "connection ended with error");
                        }
                    });
                }
                Err(error) => {
                    error!(%error, "accept failed");
                }
            }
        }
    }
}

/// Handle to a background server. Shuts the accept loop down on drop;
/// established connections run to completion on their own threads.
pub struct ServerHandle {
    address: NodeAddress,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    /// Stops accepting and joins the accept loop.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.shutdown.store(true, Ordering::SeqCst);
        // The accept loop only observes the flag on its next wakeup; poke it
        // with a throwaway connection.
        let _ = TcpStream::connect(self.address.to_string());
        let _ = thread.join();
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
