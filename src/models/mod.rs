pub mod course;
pub mod gamification;
pub mod gps;
pub mod match_model;
pub mod notification;
pub mod patch;
pub mod performance;
pub mod player;
pub mod skill;
pub mod tactics;
pub mod team;
pub mod user;
pub mod video;
