use ps_core::ids::UserId;
use ps_core::ports::AuthSignalPort;
use tokio::sync::watch;
use tracing::info;

/// Auth signal driven by the host (sign-in / sign-out calls).
pub struct ManualAuthSignal {
    tx: watch::Sender<Option<UserId>>,
}

impl ManualAuthSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn sign_in(&self, user_id: impl Into<UserId>) {
        let user_id = user_id.into();
        info!(user_id = %user_id, "user signed in");
        self.tx.send_replace(Some(user_id));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            info!("user signed out");
        }
    }
}

impl Default for ManualAuthSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSignalPort for ManualAuthSignal {
    fn current_user(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}
