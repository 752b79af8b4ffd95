pub mod templates;
pub mod whatsapp;

pub use templates::Message;
pub use whatsapp::{click_to_chat_link, normalize_phone, PhoneError};
