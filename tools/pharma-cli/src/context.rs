//! CLI execution context.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};

use pharma_cache::{Cache, Clock, SystemClock};
use pharma_commerce::cart::{CartStore, RepricePolicy};
use pharma_commerce::dashboard::Dashboard;
use pharma_commerce::orders::OrderService;
use pharma_commerce::remote::Remote;
use pharma_commerce::session::{Actor, CustomerContact, Role};
use pharma_data::{Credentials, FetchClient, RestBackend};

use crate::config::CliConfig;
use crate::output::Output;

/// Config file names looked for, in order, in each directory.
pub const CONFIG_NAMES: [&str; 3] = ["pharma.toml", ".pharma.toml", "pharma.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
    clock: Arc<dyn Clock>,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = if let Some(path) = config_path {
            CliConfig::load(path)?
        } else {
            // Try to find config in current directory or parent directories
            Self::find_config(&cwd).unwrap_or_default()
        };

        Ok(Self {
            config: config.with_env(),
            output,
            cwd,
            clock: Arc::new(SystemClock),
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<CliConfig> {
        let path = find_config_path(start)?;
        CliConfig::load(path.to_str()?).ok()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// REST collaborators with the configured tokens.
    pub fn remote(&self) -> Result<Remote> {
        let credentials = Credentials {
            user_token: self.config.api.token.clone(),
            admin_token: self.config.api.admin_token.clone(),
        };
        let client = FetchClient::new(&self.config.api.base_url)
            .context("Failed to build HTTP client")?
            .with_credentials(credentials);
        Ok(Remote::from_backend(Arc::new(RestBackend::new(client))))
    }

    /// The durable cart.
    pub fn cart(&self, remote: &Remote) -> Result<CartStore> {
        let dir = self.cart_dir();
        let cache = Cache::open(&dir)
            .with_context(|| format!("Failed to open cart store at {}", dir.display()))?;
        let policy = if self.config.cart.reprice_on_add {
            RepricePolicy::OnAdd
        } else {
            RepricePolicy::Snapshot
        };
        Ok(
            CartStore::new(cache, self.config.cart.key.clone(), remote.catalog.clone(), self.clock())
                .with_policy(policy),
        )
    }

    pub fn orders(&self, remote: &Remote) -> OrderService {
        OrderService::new(remote.orders.clone())
    }

    /// The back-office dashboard for the configured admin.
    pub fn dashboard(&self, remote: Remote) -> Result<Dashboard> {
        let ttl = Duration::from_secs(self.config.dashboard.ttl_secs);
        Ok(Dashboard::with_ttl(self.admin()?, remote, self.clock(), ttl)?)
    }

    /// The signed-in customer, if any.
    pub fn actor(&self) -> Result<Option<Actor>> {
        let session = &self.config.session;
        let Some(user_id) = session.user_id.as_deref().filter(|id| !id.trim().is_empty()) else {
            return Ok(None);
        };
        let role = match session.role.as_deref() {
            Some(role) => Role::from_str(role)?,
            None => Role::Customer,
        };
        Ok(Some(Actor {
            user_id: user_id.trim().into(),
            role,
        }))
    }

    /// The signed-in customer, or an error telling the user how to sign in.
    pub fn customer(&self) -> Result<Actor> {
        match self.actor()? {
            Some(actor) => Ok(actor),
            None => bail!("No session. Set session.user_id in pharma.toml."),
        }
    }

    /// The admin acting on the dashboard.
    pub fn admin(&self) -> Result<Actor> {
        if let Some(admin_id) = self.config.session.admin_id.as_deref() {
            return Ok(Actor::admin(admin_id.trim()));
        }
        match self.actor()? {
            Some(actor) if actor.is_admin() => Ok(actor),
            _ => bail!("No admin session. Set session.admin_id in pharma.toml."),
        }
    }

    /// Contact details copied into new orders.
    pub fn contact(&self) -> CustomerContact {
        let session = &self.config.session;
        CustomerContact {
            name: session.name.clone(),
            phone: session.phone.clone(),
            email: session.email.clone(),
        }
    }

    pub fn cart_dir(&self) -> PathBuf {
        match &self.config.cart.store_dir {
            Some(dir) => self.resolve_path(dir),
            None => dirs_path().join("pharma").join("cart"),
        }
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// The first config file found walking up from `start`.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Get the platform-specific data directory.
fn dirs_path() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        PathBuf::from("/tmp")
    }
}
