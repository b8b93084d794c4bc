//! Web server

use crate::app::Service;
use crate::cli::CommandLineArgs;
use crate::error::AtlasError;

use axum::ServiceExt;
use axum_server::Handle;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::signal;
use tracing::{event, Level};

/// Returns the socket address to listen on.
pub fn listen_address(args: &CommandLineArgs) -> Result<SocketAddr, AtlasError> {
    let ip = args
        .host
        .parse::<IpAddr>()
        .map_err(|source| AtlasError::InvalidListenAddress {
            host: args.host.clone(),
            source,
        })?;
    Ok(SocketAddr::new(ip, args.port))
}

/// Serve the Incident Atlas service until a shutdown signal is received and in-flight requests
/// have drained.
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [crate::app::Service] to serve
pub async fn serve(args: &CommandLineArgs, service: Service) -> Result<(), AtlasError> {
    let addr = listen_address(args)?;
    let handle = Handle::new();
    tokio::spawn(drain_on_signal(
        handle.clone(),
        Duration::from_secs(args.graceful_shutdown_timeout),
    ));

    event!(Level::INFO, "Listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(service.into_make_service())
        .await
        .map_err(AtlasError::Server)?;
    event!(Level::INFO, "Server stopped");
    Ok(())
}

/// Wait for ctrl+c or, on Unix, SIGTERM. Returns the name of the signal received.
async fn termination_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result.map(|()| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.map(|()| "ctrl+c")
    }
}

/// Start a graceful shutdown of the server once a termination signal arrives.
///
/// Requests still running after `timeout` are dropped.
async fn drain_on_signal(handle: Handle, timeout: Duration) {
    match termination_signal().await {
        Ok(name) => {
            event!(
                Level::INFO,
                "{} received, draining requests for up to {}s",
                name,
                timeout.as_secs()
            );
            handle.graceful_shutdown(Some(timeout));
        }
        Err(err) => event!(Level::ERROR, "Failed to listen for shutdown signals: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app;
    use crate::dataset::Dataset;

    use clap::Parser;

    fn test_args(extra: &[&str]) -> CommandLineArgs {
        let mut argv = vec!["incident-atlas"];
        argv.extend_from_slice(extra);
        CommandLineArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn default_listen_address() {
        let addr = listen_address(&test_args(&[])).unwrap();
        assert_eq!("0.0.0.0:8080", addr.to_string());
    }

    #[test]
    fn ipv6_listen_address() {
        let addr = listen_address(&test_args(&["--host", "::1", "--port", "9000"])).unwrap();
        assert_eq!("[::1]:9000", addr.to_string());
    }

    #[test]
    fn invalid_listen_address() {
        let err = listen_address(&test_args(&["--host", "localhost:80"])).unwrap_err();
        assert_eq!(
            "invalid listen address localhost:80: invalid IP address syntax",
            format!("{}: {}", err, std::error::Error::source(&err).unwrap())
        );
    }

    #[tokio::test]
    async fn port_in_use() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port().to_string();
        let args = test_args(&["--host", "127.0.0.1", "--port", &port]);
        let service = app::service(&args, Dataset::default());
        let err = serve(&args, service).await.unwrap_err();
        assert!(matches!(err, AtlasError::Server(_)), "{err}");
    }
}
