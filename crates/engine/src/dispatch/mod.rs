mod channel;
mod coordinator;
mod discord;
mod email;
mod inapp;
mod result;
mod slack;
mod webhook;

pub use channel::ChannelDispatcher;
pub use coordinator::{CoordinatorConfig, DispatchCoordinator, DispatchError};
pub use discord::DiscordDispatcher;
pub use email::{EmailDispatcher, EmailMessage, MailError, MailTransport, SmtpMailTransport};
pub use inapp::InAppDispatcher;
pub use result::{ChannelResult, DispatchIntent, DispatchResult};
pub use slack::SlackDispatcher;
pub use webhook::WebhookDispatcher;
