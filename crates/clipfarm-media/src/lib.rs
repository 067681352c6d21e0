#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and media acquisition for ClipFarm.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Timeout and cancellation support via tokio
//! - Streaming HTTP download of clip media
//! - The fade-and-concatenate compilation engine

pub mod command;
pub mod compile;
pub mod download;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod progress;

pub use command::{check_ffmpeg, wait_for_cancel, FfmpegCommand, FfmpegRunner};
pub use compile::{CompilationEngine, CompileOptions, Compiler};
pub use download::{HttpDownloader, MediaDownloader};
pub use error::{MediaError, MediaResult};
pub use filters::FadePlan;
pub use fs_utils::{move_file, remove_dir_if_exists};
pub use progress::FfmpegProgress;
