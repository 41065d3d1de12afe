//! Saved machine images.
//!
//! An image is a [`StorageImage`] written as JSON: every installed bank,
//! every register, the interrupt lock, the pending interrupts, run/stop and
//! the console switches. Words are stored as plain numbers.

use crate::storage::StorageImage;
use std::path::Path;
use thiserror::Error;

/// Serialize an image.
pub fn image_to_json(image: &StorageImage) -> Result<String, ImageError> {
    Ok(serde_json::to_string(image)?)
}

/// Parse an image.
pub fn image_from_json(json: &str) -> Result<StorageImage, ImageError> {
    Ok(serde_json::from_str(json)?)
}

/// Load an image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<StorageImage, ImageError> {
    let json = std::fs::read_to_string(path.as_ref())?;
    image_from_json(&json)
}

/// Save an image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, image: &StorageImage) -> Result<(), ImageError> {
    std::fs::write(path.as_ref(), image_to_json(image)?)?;
    Ok(())
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed image: {0}")]
    Format(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InterruptLock, Storage};
    use crate::word::Word;

    #[test]
    fn test_image_json_roundtrip() {
        let mut storage = Storage::new();
        storage.write_absolute(5, 0o1234, 0o7070).unwrap();
        storage.set_accumulator(0o4000);
        storage.set_relative_bank(5);
        storage.request_interrupt(0o20).unwrap();
        storage.set_interrupt_lock(InterruptLock::Locked);
        let image = storage.snapshot();

        let json = image_to_json(&image).unwrap();
        assert_eq!(image_from_json(&json).unwrap(), image);
    }

    #[test]
    fn test_image_file_roundtrip() {
        let mut storage = Storage::new();
        storage.write_absolute(0, 0o100, 0o7700).unwrap();
        storage.set_program_counter(0o100);
        let image = storage.snapshot();

        let path = std::env::temp_dir().join(format!("cdc160a-image-{}.json", std::process::id()));
        save_image(&path, &image).unwrap();
        let loaded = load_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let mut restored = Storage::new();
        restored.restore(&loaded).unwrap();
        assert_eq!(restored.read_absolute(0, 0o100).unwrap(), Word::new(0o7700));
        assert_eq!(restored.get_program_counter(), Word::new(0o100));
    }

    #[test]
    fn test_rejects_bad_levels_and_shapes() {
        let image = Storage::new().snapshot();
        let mut value = serde_json::to_value(&image).unwrap();
        value["pending_interrupts"] = serde_json::json!([9]);
        assert!(matches!(
            image_from_json(&value.to_string()),
            Err(ImageError::Format(_))
        ));

        let mut value = serde_json::to_value(&image).unwrap();
        value["memory"]["banks"][0] = serde_json::json!([1, 2, 3]);
        let image = image_from_json(&value.to_string()).unwrap();
        assert!(Storage::new().restore(&image).is_err());
        assert!(load_image("/nonexistent/cdc160a.json").is_err());
    }
}
