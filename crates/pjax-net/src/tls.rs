//! TLS streams for HTTPS fetches, backed by rustls + ring.
//!
//! Enabled by the `tls-rustls` feature. Servers are verified against
//! Mozilla's root CA bundle from `webpki-roots`.

use std::net::TcpStream;
use std::sync::{Arc, OnceLock};

use pjax_types::error::{PjaxError, Result};
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use rustls_pki_types::ServerName;

/// A blocking TLS session over a connected socket.
pub type TlsStream = StreamOwned<ClientConnection, TcpStream>;

/// Shared client configuration (one per process).
fn client_config() -> Arc<ClientConfig> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();
    let config = CONFIG.get_or_init(|| {
        let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Arc::new(config)
    });
    Arc::clone(config)
}

/// Wrap `stream` in a TLS session for `server_name`.
///
/// The handshake runs on the first read or write.
pub fn connect(stream: TcpStream, server_name: &str) -> Result<TlsStream> {
    let sni = ServerName::try_from(server_name.to_owned())
        .map_err(|e| PjaxError::Network(format!("invalid server name {server_name}: {e}")))?;
    let conn = ClientConnection::new(client_config(), sni)
        .map_err(|e| PjaxError::Network(format!("TLS init: {e}")))?;
    log::debug!("TLS session opened to {server_name}");
    Ok(StreamOwned::new(conn, stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn socket() -> TcpStream {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        TcpStream::connect(listener.local_addr().unwrap()).unwrap()
    }

    #[test]
    fn config_is_shared() {
        assert!(Arc::ptr_eq(&client_config(), &client_config()));
    }

    #[test]
    fn accepts_dns_and_ip_server_names() {
        assert!(connect(socket(), "site.test").is_ok());
        assert!(connect(socket(), "127.0.0.1").is_ok());
    }

    #[test]
    fn rejects_invalid_server_name() {
        let err = connect(socket(), "bad name!").unwrap_err();
        assert!(format!("{err}").contains("invalid server name"));
    }
}
