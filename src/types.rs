pub mod delivery;
pub mod notification;
pub mod subscription;
pub mod vapid;
