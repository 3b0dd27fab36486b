//! Value objects - Immutable objects defined by their attributes

mod membership_role;
mod password;
mod room_code;
mod room_name;
mod room_settings;
mod room_status;

pub use membership_role::{MemberRole, Visibility};
pub use password::{PasswordHash, RoomPassword};
pub use room_code::{RoomCode, DEFAULT_CODE_CHARSET, DEFAULT_CODE_LENGTH};
pub use room_name::RoomName;
pub use room_settings::{
    RoomSettings, SettingsPatch, TIME_FOR_ANSWER_RANGE, TIME_FOR_CHOICE_RANGE,
};
pub use room_status::RoomStatus;
