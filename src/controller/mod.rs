//! Studio controller application
//!
//! Web control panel for a Mikrotik router: buttons that run router commands
//! over SSH and status fields that poll them.

pub mod definitions;
pub mod endpoints;
pub mod html;
pub mod pages;
pub mod ssh;

pub use definitions::{ControllerDefinitions, DefinitionsError};
pub use endpoints::build_registry;
pub use ssh::{CommandRunner, SshError, SshRunner};

use crate::resources::ResourceLoader;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Read-only state captured by the endpoint handlers
pub struct AppContext {
    pub definitions: ControllerDefinitions,
    pub listen_addr: SocketAddr,
    pub resources: Arc<ResourceLoader>,
    pub runner: Arc<dyn CommandRunner>,
    pub ssh_timeout: Duration,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("definitions", &self.definitions)
            .field("listen_addr", &self.listen_addr)
            .field("resources", &self.resources)
            .field("ssh_timeout", &self.ssh_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    /// Records every call and answers with a fixed result
    #[derive(Clone, Default)]
    pub struct FakeRunner {
        stdout: Option<String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeRunner {
        pub fn ok(stdout: &str) -> Self {
            Self {
                stdout: Some(stdout.to_string()),
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(
            &self,
            host: &str,
            username: &str,
            command: &str,
            _timeout: Duration,
        ) -> Result<Vec<u8>, SshError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{username}@{host} {command}"));
            self.stdout
                .clone()
                .map(String::into_bytes)
                .ok_or_else(|| SshError::Failed {
                    target: format!("{username}@{host}"),
                    command: command.to_string(),
                    code: 255,
                    stderr: "Connection refused".to_string(),
                })
        }
    }

    pub fn context(
        static_root: &Path,
        definitions: ControllerDefinitions,
        runner: FakeRunner,
    ) -> AppContext {
        AppContext {
            definitions,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 10_000)),
            resources: Arc::new(ResourceLoader::new(
                None,
                static_root,
                vec!["index.html".to_string()],
            )),
            runner: Arc::new(runner),
            ssh_timeout: Duration::from_secs(5),
        }
    }
}
