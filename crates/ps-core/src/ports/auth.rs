use tokio::sync::watch;

use crate::identity::Identity;
use crate::ids::UserId;

/// Authentication signal. Only the signal is consumed, never the provider.
pub trait AuthSignalPort: Send + Sync {
    fn current_user(&self) -> Option<UserId>;

    /// Receiver that observes every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;

    fn current_identity(&self) -> Identity {
        Identity::from(self.current_user())
    }
}
