pub mod chat;
pub mod diary;
pub mod emotions;
pub mod health;
