// # Notifier Implementations
//
// Built-in Notifier implementations. Provider-backed notifiers live in
// their own crates (e.g. `devtrack-notify-sendgrid`).

pub mod log;

pub use log::LogNotifier;
