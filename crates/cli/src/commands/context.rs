//! Per-invocation state shared by the drive commands

use pan_core::{
    BatchCoordinator, Config, ConfigManager, Entity, PathResolver, RemotePath, Result, Scope,
    parse_path,
};
use pan_http::PanClient;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

pub(crate) struct Context {
    pub manager: ConfigManager,
    pub config: Config,
    pub scope: Scope,
    pub client: PanClient,
}

impl Context {
    pub fn load(family_id: i64) -> Result<Self> {
        let manager = ConfigManager::new()?;
        let config = manager.load()?;
        let client = PanClient::from_config(&config)?;
        let scope = Scope::from_family_id(family_id);
        tracing::debug!("Using the {} drive", scope);
        Ok(Self {
            manager,
            config,
            scope,
            client,
        })
    }

    /// Load the context or report why it failed
    pub fn load_or_report(
        family_id: i64,
        formatter: &Formatter,
    ) -> std::result::Result<Self, ExitCode> {
        Self::load(family_id).map_err(|e| {
            formatter.error(&format!("Failed to initialize: {e}"));
            ExitCode::from(&e)
        })
    }

    pub fn workdir(&self) -> &str {
        self.config.workdir_for(self.scope)
    }

    /// User input made absolute against the working directory
    pub fn absolute(&self, input: &str) -> Result<RemotePath> {
        parse_path(self.workdir(), input)
    }

    pub fn resolver(&self) -> PathResolver<'_, PanClient> {
        PathResolver::new(&self.client).with_policy(self.config.match_policy)
    }

    pub fn coordinator(&self) -> BatchCoordinator<'_, PanClient> {
        BatchCoordinator::new(&self.client)
            .with_match_policy(self.config.match_policy)
            .with_poll_policy(self.config.poll.to_policy())
            .with_concurrency(self.config.resolve_concurrency)
    }

    /// Make `input` absolute and resolve it
    pub async fn resolve(&self, input: &str) -> Result<(RemotePath, Entity)> {
        let path = self.absolute(input)?;
        let entity = self.resolver().resolve(path.as_str(), self.scope).await?;
        Ok((path, entity))
    }
}
