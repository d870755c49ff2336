mod manual_auth_signal;

pub use manual_auth_signal::ManualAuthSignal;
