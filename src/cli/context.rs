use std::sync::Arc;

use crate::client::PortalClient;
use crate::config::AppConfig;
use crate::gateway::Gateway;
use crate::notify::{NotificationSink, TracingSink};
use crate::redirector::NavigationRedirector;
use crate::session::{FileSessionStore, SessionStore};

/// Everything a command needs, wired from configuration
pub struct CliContext {
    pub store: Arc<dyn SessionStore>,
    pub client: PortalClient,
    pub redirector: NavigationRedirector,
}

impl CliContext {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let dir = config.session.resolve_dir()?;
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::open(&dir)?);
        let sink: Arc<dyn NotificationSink> = Arc::new(TracingSink);

        let gateway = Gateway::new(
            &config.api.base_url,
            config.api.request_timeout(),
            Arc::clone(&store),
            Some(sink),
        )?;

        Ok(Self {
            store,
            client: PortalClient::new(gateway),
            redirector: NavigationRedirector::new(config.routing),
        })
    }

    pub fn gateway(&self) -> &Gateway {
        self.client.gateway()
    }
}
