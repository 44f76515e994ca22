//! SuCOS scoring of candidate molecules against clustered reference fragment hits:
//! pharmacophore feature extraction, feature-map comparison, grid shape overlap, and the
//! batch screening driver that ties them together over SDF files.

pub mod element;
pub mod feature_map;
pub mod file_io;
pub mod mol_features;
pub mod molecule;
pub mod scoring;
pub mod screen;
pub mod shape;
