use std::sync::Arc;

/// Progression events worth telling the user about. Delivery transport
/// (push, SSE, whatever the gateway does) lives outside this service.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    LevelUp {
        level: i64,
    },
    AchievementUnlocked {
        achievement_id: String,
        name: String,
        xp_reward: i64,
    },
}

/// Fire-and-forget dispatch. Implementations must swallow their own
/// failures; a lost notification never affects the operation that raised it.
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: &str, event: NotificationEvent);
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// Default notifier: structured log lines, picked up by whatever ships them.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, user_id: &str, event: NotificationEvent) {
        match event {
            NotificationEvent::LevelUp { level } => {
                tracing::info!(user_id, level, "user leveled up");
            }
            NotificationEvent::AchievementUnlocked {
                achievement_id,
                name,
                xp_reward,
            } => {
                tracing::info!(
                    user_id,
                    achievement_id = %achievement_id,
                    name = %name,
                    xp_reward,
                    "achievement unlocked"
                );
            }
        }
    }
}
