pub mod master_mute;
pub mod read;
pub mod reboot;
pub mod write;
