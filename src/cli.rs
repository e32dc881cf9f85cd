//! Command line interface

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::path::PathBuf;
use thiserror::Error;

/// Lowest port the control panel may listen on
pub const MIN_PORT: u16 = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("invalid ip address '{0}'")]
    InvalidAddress(String),
    #[error("invalid tcp port '{0}'")]
    InvalidPort(String),
    #[error("tcp port {0} must be between {MIN_PORT} and 65535")]
    PortOutOfRange(u16),
    #[error("config file doesn't exist: {0}")]
    MissingConfigFile(String),
}

/// Where the HTTP server should listen, as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenSpec {
    /// Port only, on the default address
    Port(u16),
    Address(SocketAddr),
}

impl ListenSpec {
    pub const fn resolve(self, default_ip: IpAddr) -> SocketAddr {
        match self {
            Self::Port(port) => SocketAddr::new(default_ip, port),
            Self::Address(addr) => addr,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "studiocontroller",
    version,
    about = "Run Mikrotik router commands from a web control panel",
    after_help = "Hint: run with -g to generate a template config file that can be edited"
)]
pub struct Cli {
    /// Config file mapping the web page buttons and status fields to router commands
    #[arg(short = 'c', long = "config-file", value_parser = existing_file)]
    pub config_file: Option<PathBuf>,

    /// Listen address as ip:port, or just a port on the default address (e.g. 192.168.3.50:10000 or 10000)
    #[arg(short = 'p', long = "public-http", value_parser = parse_listen_spec)]
    pub public_http: Option<ListenSpec>,

    /// Write a template config file to the current directory and exit
    #[arg(short = 'g', long = "generate-dummy-config")]
    pub generate_dummy_config: bool,

    /// Runtime settings file (TOML, optional)
    #[arg(short = 's', long = "settings", default_value = "studiocontroller.toml")]
    pub settings: String,
}

/// Parse `ip:port` or a bare port
pub fn parse_listen_spec(raw: &str) -> Result<ListenSpec, CliError> {
    match raw.rsplit_once(':') {
        Some((ip, port)) => {
            let ip: IpAddr = ip
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse()
                .map_err(|_| CliError::InvalidAddress(ip.to_string()))?;
            Ok(ListenSpec::Address(SocketAddr::new(ip, parse_port(port)?)))
        }
        None => parse_port(raw).map(ListenSpec::Port),
    }
}

fn parse_port(raw: &str) -> Result<u16, CliError> {
    let port: u16 = raw
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidPort(raw.to_string()))?;
    if port < MIN_PORT {
        return Err(CliError::PortOutOfRange(port));
    }
    Ok(port)
}

fn existing_file(raw: &str) -> Result<PathBuf, CliError> {
    let path = PathBuf::from(raw);
    if path.is_file() {
        Ok(path)
    } else {
        Err(CliError::MissingConfigFile(raw.to_string()))
    }
}

/// Address of the interface used for outbound traffic, or loopback.
///
/// Connecting a UDP socket sends nothing; it only selects a route.
pub fn default_listen_ip() -> IpAddr {
    let probe = || -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect((Ipv4Addr::new(10, 255, 255, 255), 1))?;
        Ok(socket.local_addr()?.ip())
    };
    probe().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
