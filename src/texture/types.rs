//! Texture loading data types and communication structures

use bevy::prelude::*;
use std::sync::{
    Arc, Mutex,
    mpsc::{Receiver, Sender},
};

/// Commands for the texture worker thread
#[derive(Debug)]
pub enum TextureCommand {
    /// Read and decode one texture identifier.
    Load { id: String },
}

/// Results from the texture worker thread
pub enum TextureResultMsg {
    Loaded { id: String, image: Image },
    Failed { id: String, error: String },
}

/// Resource containing channels for communicating with the texture worker thread
#[derive(Resource)]
pub struct TextureChannels {
    pub cmd_tx: Sender<TextureCommand>,
    pub res_rx: Arc<Mutex<Receiver<TextureResultMsg>>>,
}
