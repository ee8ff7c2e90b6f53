//! Outbound ports - Interfaces that the application requires from the host

mod actor_repository_port;
mod advancement_host_port;
mod approval_channel_port;
mod compendium_port;
mod draft_port;
mod notification_port;
mod settings_port;
mod user_directory_port;

pub use actor_repository_port::{ActorRepositoryPort, ActorStoreError};
pub use advancement_host_port::{AdvancementHostError, AdvancementHostPort, AdvancementWorkflow};
pub use approval_channel_port::{ApprovalChannelPort, ChannelError};
pub use compendium_port::{CompendiumError, CompendiumPort};
pub use draft_port::DraftRepositoryPort;
pub use notification_port::{ChatMessage, Notification, NotificationLevel, NotificationPort};
pub use settings_port::{SettingsError, SettingsRepositoryPort};
pub use user_directory_port::{UserDirectoryError, UserDirectoryPort};
