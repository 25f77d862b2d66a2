pub mod activity;
pub mod directory;
pub mod dominance;
pub mod events;
pub mod naming;
pub mod rename_controller;
