//! UDP transport for the client.
//!
//! The macroquad frame loop can't await, so the socket lives on a background
//! thread running its own tokio runtime. Packets cross over unbounded
//! channels: the frame loop pushes with [`Connection::send`] and drains with
//! [`Connection::poll`] once per frame.

use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::Packet;
use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::sleep;

pub struct Connection {
    server_addr: SocketAddr,
    local_addr: SocketAddr,
    outbound: UnboundedSender<Packet>,
    inbound: UnboundedReceiver<Packet>,
    worker: Option<JoinHandle<()>>,
}

impl Connection {
    pub fn open(server_addr: &str, fake_ping_ms: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let server_addr: SocketAddr = server_addr.parse()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let socket = runtime.block_on(UdpSocket::bind("0.0.0.0:0"))?;
        let local_addr = socket.local_addr()?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let worker = std::thread::Builder::new()
            .name("client-network".to_string())
            .spawn(move || {
                runtime.block_on(pump(
                    socket,
                    server_addr,
                    fake_ping_ms,
                    outbound_rx,
                    inbound_tx,
                ))
            })?;

        info!("Client socket bound to {}", local_addr);

        Ok(Connection {
            server_addr,
            local_addr,
            outbound: outbound_tx,
            inbound: inbound_rx,
            worker: Some(worker),
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Queues a packet. Sends are fire-and-forget.
    pub fn send(&self, packet: Packet) {
        if self.outbound.send(packet).is_err() {
            warn!("Network worker stopped, dropping outbound packet");
        }
    }

    /// Every packet received since the last call, oldest first.
    pub fn poll(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();
        while let Ok(packet) = self.inbound.try_recv() {
            packets.push(packet);
        }
        packets
    }

    /// Sends `Disconnect` and waits for the worker to flush it.
    pub fn close(mut self) {
        self.send(Packet::Disconnect);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Network worker panicked");
            }
        }
    }
}

async fn pump(
    socket: UdpSocket,
    server_addr: SocketAddr,
    fake_ping_ms: u64,
    mut outbound: UnboundedReceiver<Packet>,
    inbound: UnboundedSender<Packet>,
) {
    let mut buffer = [0u8; 2048];

    loop {
        tokio::select! {
            result = socket.recv_from(&mut buffer) => {
                match result {
                    Ok((len, addr)) => {
                        if addr != server_addr {
                            debug!("Ignoring datagram from {}", addr);
                            continue;
                        }

                        if fake_ping_ms > 0 {
                            sleep(Duration::from_millis(fake_ping_ms / 2)).await;
                        }

                        match deserialize::<Packet>(&buffer[..len]) {
                            Ok(packet) => {
                                if inbound.send(packet).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Failed to decode packet from server: {}", e),
                        }
                    }
                    Err(e) => error!("Error receiving packet: {}", e),
                }
            }

            packet = outbound.recv() => {
                let Some(packet) = packet else {
                    break;
                };
                let closing = packet == Packet::Disconnect;

                if fake_ping_ms > 0 {
                    sleep(Duration::from_millis(fake_ping_ms / 2)).await;
                }

                match serialize(&packet) {
                    Ok(data) => {
                        if let Err(e) = socket.send_to(&data, server_addr).await {
                            error!("Failed to send packet: {}", e);
                        }
                    }
                    Err(e) => error!("Failed to encode packet: {}", e),
                }

                if closing {
                    break;
                }
            }
        }
    }

    debug!("Network worker exiting");
}
