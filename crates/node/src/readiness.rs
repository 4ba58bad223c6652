//! Single, short, best-effort checks of the endpoints of a node. A negative result is not an
//! error: callers repeat these under a deadline.

use std::{
    net::{TcpListener, TcpStream, ToSocketAddrs},
    path::Path,
};

use anyhow::{Context, Result};

use crate::constants::PROBE_TIMEOUT;

/// Checks whether a TCP connection to the RPC endpoint is accepted within [`PROBE_TIMEOUT`].
pub fn is_rpc_ready(host: &str, port: &str) -> bool {
    let Ok(addresses) = format!("{host}:{port}").to_socket_addrs() else {
        return false;
    };
    addresses
        .into_iter()
        .any(|address| TcpStream::connect_timeout(&address, PROBE_TIMEOUT).is_ok())
}

/// Checks whether the unix domain socket of the IPC endpoint accepts connections.
#[cfg(unix)]
pub fn is_ipc_ready(path: &Path) -> bool {
    use std::os::unix::net::UnixStream;

    UnixStream::connect(path).is_ok()
}

#[cfg(not(unix))]
pub fn is_ipc_ready(_: &Path) -> bool {
    false
}

/// Checks whether the port can be bound on the loopback interface.
pub fn is_port_open(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

/// Returns a port on the loopback interface that was free at the time of the call.
pub fn get_open_port() -> Result<u16> {
    let listener =
        TcpListener::bind(("127.0.0.1", 0)).context("Failed to bind to an ephemeral port")?;
    Ok(listener
        .local_addr()
        .context("Failed to get the address of the ephemeral port")?
        .port())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_probe_follows_the_listener() {
        // Arrange
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port().to_string();

        // Act
        let ready_while_listening = is_rpc_ready("127.0.0.1", &port);
        drop(listener);
        let ready_after_close = is_rpc_ready("127.0.0.1", &port);

        // Assert
        assert!(ready_while_listening);
        assert!(!ready_after_close);
    }

    #[test]
    fn rpc_probe_treats_malformed_endpoints_as_not_ready() {
        assert!(!is_rpc_ready("127.0.0.1", "not-a-port"));
    }

    #[test]
    fn open_ports_are_bindable() {
        // Act
        let port = get_open_port().expect("Failed to get an open port");

        // Assert
        assert!(is_port_open(port));
        let _listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
        assert!(!is_port_open(port));
    }

    #[cfg(unix)]
    #[test]
    fn ipc_probe_follows_the_socket() {
        use std::os::unix::net::UnixListener;

        // Arrange
        let directory = temp_dir::TempDir::new().unwrap();
        let path = directory.path().join("geth.ipc");
        let ready_before_bind = is_ipc_ready(&path);

        // Act
        let _listener = UnixListener::bind(&path).unwrap();
        let ready_after_bind = is_ipc_ready(&path);

        // Assert
        assert!(!ready_before_bind);
        assert!(ready_after_bind);
    }
}
