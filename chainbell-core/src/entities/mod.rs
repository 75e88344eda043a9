pub mod delivery_log;
pub mod subscription;

pub use delivery_log::{DeliveryAttempt, InsertDeliveryLog};
pub use subscription::{GetSubscriptionsByAddress, Subscription};
