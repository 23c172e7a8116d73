//! The wallet session service.
//!
//! [`WalletSession`] mediates all access to the wallet provider and keeps one
//! consistent snapshot of account, chain and contract handle. Operations that
//! wait on the wallet run on their own task: dropping the returned future
//! stops waiting for the result but not the state update.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Address, ChainId, Session, SessionConfig, SessionState, SessionStore};
use crate::contract::DnaIdentityContract;
use crate::error::DnaIdentityError;
use crate::provider::{ProviderEvent, WalletProvider};
use crate::Result;

struct Inner {
    config: SessionConfig,
    provider: Option<Arc<dyn WalletProvider>>,
    store: SessionStore,
}

impl Inner {
    fn required(&self) -> ChainId {
        self.config.required_chain_id()
    }

    fn provider(&self) -> Result<Arc<dyn WalletProvider>> {
        self.provider
            .clone()
            .ok_or(DnaIdentityError::ProviderUnavailable)
    }

    fn resolve(
        &self,
        provider: &Arc<dyn WalletProvider>,
        account: Address,
        chain_id: ChainId,
    ) -> Result<()> {
        let epoch = self.store.next_epoch();
        let contract = DnaIdentityContract::new(
            self.config.contract_address,
            account,
            chain_id,
            epoch,
            Arc::clone(provider),
        )
        .with_poll_interval(self.config.receipt_poll_interval);

        let session = Session::resolved(account, chain_id, self.required(), contract, epoch);
        debug!(%account, %chain_id, epoch, state = ?session.state(), "session resolved");
        self.store.replace(session)
    }

    async fn initialize(&self) -> Result<Session> {
        let Some(provider) = self.provider.clone() else {
            debug!("no wallet provider, skipping initialize");
            return Ok(self.store.snapshot());
        };

        let accounts = provider.accounts().await.map_err(|e| {
            warn!(error = %e, "failed to list authorized accounts");
            DnaIdentityError::from(e)
        })?;

        match accounts.first() {
            None => {
                let epoch = self.store.next_epoch();
                let required = self.required();
                self.store.replace_if(|current| {
                    current
                        .is_connected()
                        .then(|| Session::disconnected(required, epoch))
                })?;
            }
            Some(&account) => {
                let chain_id = provider.chain_id().await.map_err(|e| {
                    warn!(error = %e, "failed to read chain id");
                    DnaIdentityError::from(e)
                })?;
                self.resolve(&provider, account, chain_id)?;
            }
        }

        Ok(self.store.snapshot())
    }

    async fn connect(&self) -> Result<Session> {
        let provider = self.provider()?;
        let prior = self.store.snapshot();

        let epoch = self.store.next_epoch();
        let required = self.required();
        let prompting = self.store.replace_if(|current| {
            (current.state() == SessionState::Disconnected)
                .then(|| Session::connecting(required, epoch))
        })?;

        let resolved = async {
            let accounts = provider.request_accounts().await?;
            let account = accounts.first().copied().ok_or_else(|| {
                DnaIdentityError::Provider("wallet returned no accounts".to_string())
            })?;
            let chain_id = provider.chain_id().await?;
            Ok::<_, DnaIdentityError>((account, chain_id))
        }
        .await;

        match resolved {
            Ok((account, chain_id)) => {
                self.resolve(&provider, account, chain_id)?;
                let session = self.store.snapshot();
                info!(%account, %chain_id, state = ?session.state(), "wallet connected");
                Ok(session)
            }
            Err(err) => {
                if prompting {
                    self.store.replace_if(|current| {
                        (current.state() == SessionState::Connecting).then(|| prior.clone())
                    })?;
                }
                match &err {
                    DnaIdentityError::UserRejected(_) => info!("wallet connection rejected"),
                    _ => warn!(error = %err, "wallet connection failed"),
                }
                Err(err)
            }
        }
    }

    fn disconnect(&self) -> Result<Session> {
        let session = Session::disconnected(self.required(), self.store.next_epoch());
        self.store.replace(session.clone())?;
        info!("wallet disconnected");
        Ok(session)
    }

    async fn switch_network(&self) -> Result<Session> {
        let provider = self.provider()?;
        let required = self.required();

        match provider.switch_chain(required).await {
            Ok(()) => {}
            Err(err) if err.is_unrecognized_chain() => {
                info!(chain_id = %required, "required chain unknown to wallet, adding it");
                provider.add_chain(&self.config.network).await.map_err(|e| {
                    warn!(error = %e, "failed to add network");
                    DnaIdentityError::from(e)
                })?;
                provider.switch_chain(required).await.map_err(|e| {
                    warn!(error = %e, "switch after adding network failed");
                    if e.is_unrecognized_chain() {
                        DnaIdentityError::UnrecognizedChain(required)
                    } else {
                        DnaIdentityError::from(e)
                    }
                })?;
            }
            Err(err) => {
                warn!(error = %err, "failed to switch network");
                return Err(err.into());
            }
        }

        info!(chain_id = %required, "switched network");
        self.initialize().await
    }

    async fn handle_event(&self, event: ProviderEvent) {
        let result = match event {
            ProviderEvent::AccountsChanged { accounts } => match accounts.first() {
                None => self.disconnect().map(|_| ()),
                Some(account) if Some(*account) != self.store.snapshot().account() => {
                    debug!(%account, "active account changed");
                    self.initialize().await.map(|_| ())
                }
                Some(_) => Ok(()),
            },
            ProviderEvent::ChainChanged { chain_id } => {
                debug!(%chain_id, "chain changed, resyncing");
                self.initialize().await.map(|_| ())
            }
        };

        if let Err(e) = result {
            warn!(error = %e, "failed to apply provider event");
        }
    }
}

/// Keeps the session subscribed to provider events.
///
/// Dropping the listener aborts its task, which releases the subscription.
#[derive(Debug)]
pub struct ProviderListener {
    task: JoinHandle<()>,
}

impl ProviderListener {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop listening.
    pub fn stop(self) {}
}

impl Drop for ProviderListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Handle to the process-wide wallet session. Cheap to clone.
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<Inner>,
}

impl WalletSession {
    /// Create a disconnected session. `provider` is `None` when no wallet
    /// is present in the host.
    pub fn new(config: SessionConfig, provider: Option<Arc<dyn WalletProvider>>) -> Self {
        let store = SessionStore::new(config.required_chain_id());
        Self {
            inner: Arc::new(Inner {
                config,
                provider,
                store,
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn has_provider(&self) -> bool {
        self.inner.provider.is_some()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Session {
        self.inner.store.snapshot()
    }

    /// Receiver notified on every snapshot replacement.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.store.subscribe()
    }

    /// Silently resync with accounts the wallet already authorized.
    pub async fn initialize(&self) -> Result<Session> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.initialize().await }).await?
    }

    /// Ask the wallet to authorize an account. May wait on a user prompt
    /// indefinitely.
    pub async fn connect(&self) -> Result<Session> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.connect().await }).await?
    }

    /// Forget the resolved account. The wallet's own authorization is untouched.
    pub fn disconnect(&self) -> Result<Session> {
        self.inner.disconnect()
    }

    /// Move the wallet to the required chain, adding the chain once if the
    /// wallet does not know it.
    pub async fn switch_network(&self) -> Result<Session> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.switch_network().await }).await?
    }

    /// Start reacting to provider events. `None` without a provider.
    pub fn listen(&self) -> Option<ProviderListener> {
        let provider = self.inner.provider.as_ref()?;
        let mut subscription = provider.subscribe();
        let inner = Arc::clone(&self.inner);

        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                inner.handle_event(event).await;
            }
            debug!("provider event stream closed");
        });

        Some(ProviderListener { task })
    }

    /// Contract handle for the current account on the required chain.
    pub fn contract(&self) -> Result<DnaIdentityContract> {
        let session = self.snapshot();
        match (session.state(), session.contract()) {
            (state, Some(contract)) if state.can_transact() => Ok(contract.clone()),
            (SessionState::WrongNetwork, _) => Err(DnaIdentityError::WrongNetwork {
                current: session.chain_id(),
                required: session.required_chain_id(),
            }),
            _ => Err(DnaIdentityError::NotConnected),
        }
    }

    /// Whether `handle` was issued under the current snapshot.
    pub fn is_current(&self, handle: &DnaIdentityContract) -> bool {
        handle.epoch() == self.snapshot().epoch()
    }
}
