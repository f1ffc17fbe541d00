//! TLS-wrapped TCP transport for real (non-localhost) deployments. Each
//! party authenticates the other two with a small closed set of trusted
//! certificates rather than a public CA — the three helpers know each
//! other's identities ahead of time (spec §6 deployment note).

use std::io::BufReader;
use std::sync::Arc;

use async_trait::async_trait;
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore, ServerConfig};
use tokio::io::{split, AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_rustls::{TlsAcceptor, TlsConnector, TlsStream};

use crate::error::{Error, Result};
use crate::net::channel::Channel;
use crate::net::stats::Counters;

pub struct TlsChannel {
    reader: Mutex<ReadHalf<TlsStream<TcpStream>>>,
    writer: Mutex<WriteHalf<TlsStream<TcpStream>>>,
    counters: Counters,
}

fn load_certs(path: &str) -> Result<Vec<Certificate>> {
    let f = std::fs::File::open(path)?;
    let mut reader = BufReader::new(f);
    let raw = rustls_pemfile::certs(&mut reader).map_err(|e| Error::Transport(e.to_string()))?;
    Ok(raw.into_iter().map(Certificate).collect())
}

fn load_private_key(path: &str) -> Result<PrivateKey> {
    let f = std::fs::File::open(path)?;
    let mut reader = BufReader::new(f);
    let keys = rustls_pemfile::pkcs8_private_keys(&mut reader).map_err(|e| Error::Transport(e.to_string()))?;
    let key = keys
        .into_iter()
        .next()
        .ok_or_else(|| Error::Transport(format!("no private key found in {path}")))?;
    Ok(PrivateKey(key))
}

fn trust_store(trusted_cert_paths: &[String]) -> Result<RootCertStore> {
    let mut store = RootCertStore::empty();
    for path in trusted_cert_paths {
        for cert in load_certs(path)? {
            store.add(&cert).map_err(|e| Error::Transport(e.to_string()))?;
        }
    }
    Ok(store)
}

impl TlsChannel {
    /// Dials out to `addr` and performs a TLS client handshake, presenting
    /// our own certificate and verifying the peer against `trusted_certs`.
    pub async fn connect(
        addr: &str,
        server_name: &str,
        certificate_path: &str,
        private_key_path: &str,
        trusted_cert_paths: &[String],
    ) -> Result<Self> {
        let certs = load_certs(certificate_path)?;
        let key = load_private_key(private_key_path)?;
        let root_store = trust_store(trusted_cert_paths)?;
        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(root_store)
            .with_client_auth_cert(certs, key)
            .map_err(Error::Tls)?;
        let connector = TlsConnector::from(Arc::new(config));
        let tcp = TcpStream::connect(addr).await.map_err(|e| Error::Transport(e.to_string()))?;
        tcp.set_nodelay(true).ok();
        let server_name = server_name
            .try_into()
            .map_err(|_| Error::Transport(format!("invalid server name {server_name}")))?;
        let stream = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self::from_stream(TlsStream::Client(stream)))
    }

    /// Binds `addr`, accepts one inbound connection, and performs a TLS
    /// server handshake requiring the peer to present a certificate from
    /// `trusted_certs`.
    pub async fn accept(
        addr: &str,
        certificate_path: &str,
        private_key_path: &str,
        trusted_cert_paths: &[String],
    ) -> Result<Self> {
        let certs = load_certs(certificate_path)?;
        let key = load_private_key(private_key_path)?;
        let root_store = trust_store(trusted_cert_paths)?;
        let client_verifier = rustls::server::AllowAnyAuthenticatedClient::new(root_store);
        let config = ServerConfig::builder()
            .with_safe_defaults()
            .with_client_cert_verifier(Arc::new(client_verifier))
            .with_single_cert(certs, key)
            .map_err(Error::Tls)?;
        let acceptor = TlsAcceptor::from(Arc::new(config));
        let listener = TcpListener::bind(addr).await.map_err(|e| Error::Transport(e.to_string()))?;
        let (tcp, _) = listener.accept().await.map_err(|e| Error::Transport(e.to_string()))?;
        tcp.set_nodelay(true).ok();
        let stream = acceptor.accept(tcp).await.map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self::from_stream(TlsStream::Server(stream)))
    }

    fn from_stream(stream: TlsStream<TcpStream>) -> Self {
        let (r, w) = split(stream);
        TlsChannel {
            reader: Mutex::new(r),
            writer: Mutex::new(w),
            counters: Counters::default(),
        }
    }
}

#[async_trait]
impl Channel for TlsChannel {
    async fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut w = self.writer.lock().await;
        w.write_all(bytes).await.map_err(|e| Error::Transport(e.to_string()))?;
        self.counters.add_sent(bytes.len() as u64);
        Ok(())
    }

    async fn recv(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut r = self.reader.lock().await;
        r.read_exact(&mut buf).await.map_err(|e| Error::Transport(e.to_string()))?;
        self.counters.add_received(len as u64);
        Ok(buf)
    }

    fn stats(&self) -> &Counters {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use tempfile::NamedTempFile;

    use super::*;

    /// Self-signed cert used as its own trust root — mirrors the "small
    /// closed set of trusted certificates" deployment note above, with a
    /// single party standing in for all three.
    fn self_signed_pair() -> (NamedTempFile, NamedTempFile) {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let mut cert_file = NamedTempFile::new().unwrap();
        cert_file.write_all(cert.serialize_pem().unwrap().as_bytes()).unwrap();
        let mut key_file = NamedTempFile::new().unwrap();
        key_file.write_all(cert.serialize_private_key_pem().as_bytes()).unwrap();
        (cert_file, key_file)
    }

    #[tokio::test]
    async fn round_trips_a_message_over_a_mutually_authenticated_connection() {
        let (cert_file, key_file) = self_signed_pair();
        let cert_path = cert_file.path().to_str().unwrap().to_string();
        let key_path = key_file.path().to_str().unwrap().to_string();
        let addr = "127.0.0.1:18734".to_string();

        let server = tokio::spawn({
            let addr = addr.clone();
            let cert_path = cert_path.clone();
            let key_path = key_path.clone();
            let trust = vec![cert_path.clone()];
            async move { TlsChannel::accept(&addr, &cert_path, &key_path, &trust).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let client = TlsChannel::connect(&addr, "localhost", &cert_path, &key_path, &[cert_path.clone()])
            .await
            .unwrap();
        let server = server.await.unwrap().unwrap();

        client.send(b"hello").await.unwrap();
        let got = server.recv(5).await.unwrap();
        assert_eq!(got, b"hello");
        assert_eq!(client.stats().sent(), 5);
        assert_eq!(server.stats().received(), 5);
    }
}
