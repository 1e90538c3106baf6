//! UI components for the chat view

mod input_bar;
mod message_item;
mod utility_bar;

pub use input_bar::{InputBar, SEND_LABEL};
pub use message_item::{
    MessageActions, MessageItem, REFRESH_LABEL, REMOVE_LABEL, SPEAK_LABEL, STOP_LABEL,
};
pub use utility_bar::{
    MountGate, UtilityBar, UtilityBarOutput, REPOSITORY_LABEL, TOGGLE_THEME_LABEL,
};
