//! # Magline Server
//!
//! Server skeleton that owns an X25519 identity key. It loads its options,
//! loads or generates the identity and then idles until stopped; it does not
//! bind sockets or speak a wire protocol. Peers are expected to obtain the
//! identity's public PEM out of band and derive a shared secret with
//! [`magline_crypto::KeyPair::shared_secret`].

pub mod config;
pub mod errors;

pub use config::*;
pub use errors::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::errors::*;
}

use magline_crypto::KeyPair;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// How often the idle loop wakes to re-check the running flag
pub const IDLE_TICK: Duration = Duration::from_secs(1);

/// Load the identity key from a PEM file, or generate a fresh one
pub fn load_identity(path: Option<&Path>) -> ServerResult<KeyPair> {
    match path {
        Some(path) => {
            info!("Loading identity key from: {}", path.display());
            let pem = std::fs::read_to_string(path)?;
            Ok(KeyPair::from_pem(&pem)?)
        }
        None => {
            warn!("No private_key_path configured, generating an ephemeral identity key");
            Ok(KeyPair::generate()?)
        }
    }
}

/// Write a freshly generated private key to `path` and return the pair
pub fn generate_identity_file(path: &Path) -> ServerResult<KeyPair> {
    let identity = KeyPair::generate()?;
    std::fs::write(path, identity.private_key_pem()?)?;
    Ok(identity)
}

/// Main magline server
pub struct MaglineServer {
    /// Server options
    options: Options,
    /// X25519 identity
    identity: KeyPair,
    /// Running state
    running: AtomicBool,
    /// Wakes the idle loop on stop
    shutdown: Notify,
}

impl MaglineServer {
    /// Create a server from options and an initialized identity key
    pub fn new(options: Options, identity: KeyPair) -> ServerResult<Self> {
        options.validate()?;
        if !identity.is_initialized() {
            return Err(ServerError::Key(magline_crypto::CryptoError::Uninitialized));
        }

        Ok(Self {
            options,
            identity,
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
        })
    }

    /// Create a server, loading the identity named by the options
    pub fn from_options(options: Options) -> ServerResult<Self> {
        let identity = load_identity(options.private_key_path.as_deref())?;
        Self::new(options, identity)
    }

    /// Get server options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get the server's identity key pair
    pub fn identity(&self) -> &KeyPair {
        &self.identity
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the server until [`stop`](Self::stop) is called
    pub async fn run(&self) -> ServerResult<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ServerError::AlreadyRunning);
        }

        info!("Starting magline server on {}", self.options.address());
        info!("Identity public key:\n{}", self.identity.public_key_pem()?);

        let mut ticker = tokio::time::interval(IDLE_TICK);
        while self.is_running() {
            tokio::select! {
                _ = ticker.tick() => debug!("idle"),
                _ = self.shutdown.notified() => {}
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Stop the server
    pub fn stop(&self) {
        info!("Stopping magline server");
        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_server_creation() {
        let server = MaglineServer::new(Options::default(), KeyPair::generate().unwrap()).unwrap();
        assert!(!server.is_running());
        assert_eq!(server.options().port, DEFAULT_PORT);
        assert!(server.identity().is_initialized());
    }

    #[test]
    fn test_rejects_uninitialized_identity() {
        let result = MaglineServer::new(Options::default(), KeyPair::new());
        assert!(matches!(
            result,
            Err(ServerError::Key(magline_crypto::CryptoError::Uninitialized))
        ));
    }

    #[test]
    fn test_identity_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.pem");

        let generated = generate_identity_file(&path).unwrap();
        let options = Options::builder().private_key_path(&path).build().unwrap();
        let server = MaglineServer::from_options(options).unwrap();

        assert_eq!(
            server.identity().public_key_bytes().unwrap(),
            generated.public_key_bytes().unwrap()
        );
    }

    #[test]
    fn test_missing_identity_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options::builder()
            .private_key_path(dir.path().join("absent.pem"))
            .build()
            .unwrap();

        assert!(matches!(
            MaglineServer::from_options(options),
            Err(ServerError::Io(_))
        ));
    }

    #[test]
    fn test_malformed_identity_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.pem");
        std::fs::write(&path, "garbage").unwrap();

        let options = Options::builder().private_key_path(&path).build().unwrap();
        assert!(matches!(
            MaglineServer::from_options(options),
            Err(ServerError::Key(magline_crypto::CryptoError::MalformedPem(_)))
        ));
    }

    #[tokio::test]
    async fn test_run_and_stop() {
        let server = Arc::new(
            MaglineServer::new(Options::default(), KeyPair::generate().unwrap()).unwrap(),
        );

        let handle = tokio::spawn({
            let server = Arc::clone(&server);
            async move { server.run().await }
        });

        while !server.is_running() {
            tokio::task::yield_now().await;
        }
        assert!(matches!(server.run().await, Err(ServerError::AlreadyRunning)));

        server.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(!server.is_running());
    }
}
